//! Font data types.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Broad purpose of a bundled font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontCategory {
    Text,
    Math,
    Mono,
}

impl FontCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontCategory::Text => "text",
            FontCategory::Math => "math",
            FontCategory::Mono => "mono",
        }
    }
}

impl std::fmt::Display for FontCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A font shipped with the editor and served from the asset server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundledFont {
    pub id: &'static str,
    pub file_name: &'static str,
    pub family: &'static str,
    /// Style label shown in the font manager (e.g. "Bold Italic").
    pub label: &'static str,
    pub category: FontCategory,
    pub is_default: bool,
}

/// A font uploaded by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFont {
    pub id: String,
    pub file_name: String,
    pub family: String,
    pub data: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u16>,
    /// Upload time in milliseconds since the Unix epoch.
    pub added_at: i64,
    /// Content hash; older records may lack it until it is computed on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

/// A file handed to [`FontAssetManager::add_uploaded_fonts`](super::FontAssetManager::add_uploaded_fonts).
#[derive(Debug, Clone)]
pub struct FontUpload {
    pub file_name: String,
    pub data: Bytes,
}

impl FontUpload {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
        }
    }
}

/// One face described by a metadata extractor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FontInfo {
    pub family: Option<String>,
    pub style: Option<String>,
    pub weight: Option<u16>,
}

/// Everything a compiler instance needs to load its fonts.
#[derive(Debug, Clone, Default)]
pub struct FontSourceSet {
    /// URLs of installed bundled fonts, in catalog order.
    pub urls: Vec<String>,
    /// Uploaded font binaries, newest first.
    pub blobs: Vec<Bytes>,
    /// Family names across both sources.
    pub families: BTreeSet<String>,
}

impl FontSourceSet {
    /// Number of font sources (URLs plus blobs).
    pub fn total_count(&self) -> usize {
        self.urls.len() + self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_count() == 0
    }
}
