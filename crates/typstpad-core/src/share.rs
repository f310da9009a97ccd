//! Share links carrying a formula in the query string.
//!
//! The formula is UTF-8 encoded, base64 encoded (standard alphabet, padded)
//! and then percent-encoded into the `formula` query parameter.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Query parameter holding the encoded formula.
pub const SHARE_PARAM: &str = "formula";

/// Encode `code` as a share parameter value.
pub fn encode_formula(code: &str) -> String {
    urlencoding::encode(&STANDARD.encode(code.as_bytes())).into_owned()
}

/// Decode a share parameter value. `None` if it is not valid.
pub fn decode_formula(encoded: &str) -> Option<String> {
    let base64 = urlencoding::decode(encoded).ok()?;
    let bytes = STANDARD.decode(base64.trim().as_bytes()).ok()?;
    String::from_utf8(bytes).ok()
}

/// Build a share link: `base?formula=<encoded>`.
///
/// `base` should be the page URL without a query string.
pub fn share_url(base: &str, code: &str) -> String {
    format!("{}?{}={}", base, SHARE_PARAM, encode_formula(code))
}

/// Extract the shared formula from a query string (with or without the leading `?`)
/// or from a full URL.
pub fn formula_from_query(query: &str) -> Option<String> {
    let query = match query.split_once('?') {
        Some((_, query)) => query,
        None => query,
    };
    let query = query.split('#').next().unwrap_or_default();

    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == SHARE_PARAM)
        .and_then(|(_, value)| decode_formula(value))
}
