//! Font metadata extraction.
//!
//! In the browser the compiler's WASM module reports font info. Native
//! callers use [`OpenTypeExtractor`], which reads the `name` and `OS/2`
//! tables directly.

use super::types::FontInfo;
use crate::error::{PadError, Result};
use async_trait::async_trait;
use ttf_parser::name::name_id;

/// Reads family, style and weight out of a font binary.
#[async_trait]
pub trait FontMetadataExtractor: Send + Sync {
    /// Describe every face in `data`. The first entry is treated as primary.
    async fn font_info(&self, data: &[u8]) -> Result<Vec<FontInfo>>;
}

/// Metadata extractor backed by `ttf-parser`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenTypeExtractor;

impl OpenTypeExtractor {
    pub fn new() -> Self {
        Self
    }

    fn describe_face(data: &[u8], index: u32) -> Result<FontInfo> {
        let face = ttf_parser::Face::parse(data, index).map_err(|e| PadError::Metadata {
            message: format!("face {}: {}", index, e),
        })?;

        let mut family = None;
        let mut typographic_family = None;
        for entry in face.names() {
            let Some(name) = entry.to_string() else {
                continue;
            };
            match entry.name_id {
                name_id::TYPOGRAPHIC_FAMILY if typographic_family.is_none() => {
                    typographic_family = Some(name)
                }
                name_id::FAMILY if family.is_none() => family = Some(name),
                _ => {}
            }
        }

        let style = match face.style() {
            ttf_parser::Style::Normal => "normal",
            ttf_parser::Style::Italic => "italic",
            ttf_parser::Style::Oblique => "oblique",
        };

        Ok(FontInfo {
            family: typographic_family.or(family),
            style: Some(style.to_string()),
            weight: Some(face.weight().to_number()),
        })
    }
}

#[async_trait]
impl FontMetadataExtractor for OpenTypeExtractor {
    async fn font_info(&self, data: &[u8]) -> Result<Vec<FontInfo>> {
        let count = ttf_parser::fonts_in_collection(data).unwrap_or(1);
        (0..count)
            .map(|index| Self::describe_face(data, index))
            .collect()
    }
}
