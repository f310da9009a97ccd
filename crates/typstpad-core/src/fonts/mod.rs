//! Font asset management.
//!
//! - `catalog`: fonts shipped with the editor
//! - `manager`: installed selection, uploads, merged font sources
//! - `fingerprint`: content hashes used to deduplicate uploads
//! - `metadata`: family/style/weight extraction

mod catalog;
mod fingerprint;
mod manager;
mod metadata;
mod types;

pub use catalog::{
    bundled_font_url, bundled_fonts, default_bundled_ids, find_bundled, is_bundled_id,
    normalize_bundled_ids,
};
pub use fingerprint::{compute_fingerprint, compute_fingerprint_async};
pub use manager::{FontAssetManager, FontSourceProvider};
pub use metadata::{FontMetadataExtractor, OpenTypeExtractor};
pub use types::{BundledFont, FontCategory, FontInfo, FontSourceSet, FontUpload, UploadedFont};
