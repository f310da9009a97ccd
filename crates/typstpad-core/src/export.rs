//! Export helpers for compiled SVG output.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Size used when an SVG carries no usable dimensions.
pub const FALLBACK_WIDTH: f64 = 300.0;
pub const FALLBACK_HEIGHT: f64 = 150.0;

// Every `&`, with the entity reference that follows it when there is one.
static AMPERSAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&((?:amp|lt|gt|quot|apos|#\d+|#x[0-9a-fA-F]+);)?").unwrap()
});

static SVG_OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<svg\b[^>]*>").unwrap());

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?").unwrap());

static VIEWBOX_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+|,").unwrap());

/// Escape bare `&` characters so the SVG parses as strict XML.
///
/// Existing entity references are left untouched.
pub fn sanitize_svg_for_xml(svg: &str) -> String {
    AMPERSAND
        .replace_all(svg, |caps: &Captures<'_>| match caps.get(1) {
            Some(_) => caps[0].to_string(),
            None => "&amp;".to_string(),
        })
        .into_owned()
}

/// Intrinsic size of an SVG document in user units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvgDimensions {
    pub width: f64,
    pub height: f64,
}

impl SvgDimensions {
    /// Pixel size of a raster export at `scale`.
    pub fn scaled(&self, scale: f64) -> (u32, u32) {
        (
            (self.width * scale).round().max(1.0) as u32,
            (self.height * scale).round().max(1.0) as u32,
        )
    }
}

/// Read the size from the `width`/`height` attributes, else the `viewBox`,
/// else fall back to 300×150.
pub fn svg_dimensions(svg: &str) -> SvgDimensions {
    let fallback = SvgDimensions {
        width: FALLBACK_WIDTH,
        height: FALLBACK_HEIGHT,
    };
    let Some(tag) = SVG_OPEN_TAG.find(svg) else {
        return fallback;
    };
    let tag = tag.as_str();

    let mut width = attribute(tag, "width")
        .and_then(leading_number)
        .unwrap_or(0.0);
    let mut height = attribute(tag, "height")
        .and_then(leading_number)
        .unwrap_or(0.0);

    if width == 0.0 || height == 0.0 {
        if let Some(view_box) = attribute(tag, "viewBox") {
            let parts: Vec<&str> = VIEWBOX_SEPARATOR.split(view_box.trim()).collect();
            if parts.len() >= 4 {
                width = leading_number(parts[2]).unwrap_or(FALLBACK_WIDTH);
                height = leading_number(parts[3]).unwrap_or(FALLBACK_HEIGHT);
            }
        }
    }

    SvgDimensions {
        width: if width == 0.0 { FALLBACK_WIDTH } else { width },
        height: if height == 0.0 { FALLBACK_HEIGHT } else { height },
    }
}

fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let pattern = format!(r#"\s{}\s*=\s*(?:"([^"]*)"|'([^']*)')"#, regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(tag)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
}

/// Parse a leading number the way CSS-ish attribute values are read ("12.5pt" is 12.5).
fn leading_number(value: &str) -> Option<f64> {
    let m = LEADING_NUMBER.find(value)?;
    m.as_str().trim().parse().ok()
}

/// Sanitized SVG as a percent-encoded `data:` URI.
pub fn svg_to_data_uri(svg: &str) -> String {
    format!(
        "data:image/svg+xml;charset=utf-8,{}",
        urlencoding::encode(&sanitize_svg_for_xml(svg))
    )
}

/// The SVG wrapped in a `formula` div, for pasting into HTML.
pub fn html_snippet(svg: &str) -> String {
    format!(r#"<div class="formula">{}</div>"#, svg)
}

/// A complete HTML page showing the SVG.
pub fn standalone_html(svg: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"UTF-8\"><title>Formula</title></head>\n<body>\n{}\n</body>\n</html>",
        html_snippet(svg)
    )
}
