//! Static catalog of fonts shipped with the editor.

use super::types::{BundledFont, FontCategory};
use crate::config::FontConfig;

macro_rules! bundled {
    ($file:literal, $family:literal, $label:literal, $category:ident, $default:literal) => {
        BundledFont {
            id: $file,
            file_name: $file,
            family: $family,
            label: $label,
            category: FontCategory::$category,
            is_default: $default,
        }
    };
}

static BUNDLED_FONTS: &[BundledFont] = &[
    bundled!("LibertinusSerif-Regular.otf", "Libertinus Serif", "Regular", Text, true),
    bundled!("LibertinusSerif-Italic.otf", "Libertinus Serif", "Italic", Text, true),
    bundled!("LibertinusSerif-Bold.otf", "Libertinus Serif", "Bold", Text, true),
    bundled!("LibertinusSerif-BoldItalic.otf", "Libertinus Serif", "Bold Italic", Text, true),
    bundled!("LibertinusSerif-Semibold.otf", "Libertinus Serif", "Semibold", Text, false),
    bundled!(
        "LibertinusSerif-SemiboldItalic.otf",
        "Libertinus Serif",
        "Semibold Italic",
        Text,
        false
    ),
    bundled!("NewCMMath-Book.otf", "New Computer Modern Math", "Book", Math, true),
    bundled!("NewCMMath-Bold.otf", "New Computer Modern Math", "Bold", Math, true),
    bundled!("NewCMMath-Regular.otf", "New Computer Modern Math", "Regular", Math, false),
    bundled!("NewCM10-Regular.otf", "New Computer Modern", "Regular", Text, false),
    bundled!("NewCM10-Italic.otf", "New Computer Modern", "Italic", Text, false),
    bundled!("NewCM10-Bold.otf", "New Computer Modern", "Bold", Text, false),
    bundled!("NewCM10-BoldItalic.otf", "New Computer Modern", "Bold Italic", Text, false),
    bundled!("DejaVuSansMono.ttf", "DejaVu Sans Mono", "Regular", Mono, false),
    bundled!("DejaVuSansMono-Oblique.ttf", "DejaVu Sans Mono", "Oblique", Mono, false),
    bundled!("DejaVuSansMono-Bold.ttf", "DejaVu Sans Mono", "Bold", Mono, false),
    bundled!("DejaVuSansMono-BoldOblique.ttf", "DejaVu Sans Mono", "Bold Oblique", Mono, false),
];

/// Every bundled font, in display order.
pub fn bundled_fonts() -> &'static [BundledFont] {
    BUNDLED_FONTS
}

/// Look up a bundled font by id.
pub fn find_bundled(id: &str) -> Option<&'static BundledFont> {
    BUNDLED_FONTS.iter().find(|font| font.id == id)
}

/// Whether `id` names a bundled font.
pub fn is_bundled_id(id: &str) -> bool {
    find_bundled(id).is_some()
}

/// Ids of the fonts installed on first run.
pub fn default_bundled_ids() -> Vec<String> {
    BUNDLED_FONTS
        .iter()
        .filter(|font| font.is_default)
        .map(|font| font.id.to_string())
        .collect()
}

/// URL a bundled font is served from.
pub fn bundled_font_url(font: &BundledFont) -> String {
    format!("{}{}", FontConfig::BUNDLED_URL_PREFIX, font.file_name)
}

/// Keep catalog ids only, dropping duplicates but preserving first-seen order.
pub fn normalize_bundled_ids<I, S>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for id in ids {
        let id = id.as_ref();
        if is_bundled_id(id) && !normalized.iter().any(|seen| seen == id) {
            normalized.push(id.to_string());
        }
    }
    normalized
}
