//! Normalization of compiler failures into [`DiagnosticInfo`] records.
//!
//! Compilers report failures in two shapes: structured records (JSON objects
//! with `message`, `severity` and `hints`) or a debug-formatted string such
//! as `SourceDiagnostic { severity: Error, message: "...", hints: [...] }`.
//! Anything else becomes a single error carrying the raw text.

use super::runtime::CompilerError;
use super::types::{DiagnosticInfo, Severity};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

const DEBUG_RECORD_MARKER: &str = "SourceDiagnostic";

static MESSAGE_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"message:\s*"((?:[^"\\]|\\.)*)""#).unwrap());

static SEVERITY_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"severity:\s*(\w+)").unwrap());

// Quoted strings are matched whole so a `]` inside a hint does not end the list.
static HINTS_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"hints:\s*\[((?:[^\]"]|"(?:[^"\\]|\\.)*")*)\]"#).unwrap()
});

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)""#).unwrap());

/// Convert a compiler failure into diagnostics. Never returns an empty list.
pub fn extract_diagnostics(error: &CompilerError) -> Vec<DiagnosticInfo> {
    let diagnostics = match error {
        CompilerError::Structured(value) => from_value(value),
        CompilerError::Message(text) => parse_debug_diagnostics(text),
    };

    if diagnostics.is_empty() {
        vec![DiagnosticInfo::error(error.to_string())]
    } else {
        diagnostics
    }
}

fn from_value(value: &Value) -> Vec<DiagnosticInfo> {
    match value {
        Value::Array(items) => items.iter().filter_map(from_record).collect(),
        Value::Object(_) => from_record(value).into_iter().collect(),
        Value::String(text) => parse_debug_diagnostics(text),
        _ => Vec::new(),
    }
}

fn from_record(value: &Value) -> Option<DiagnosticInfo> {
    let message = value.get("message")?.as_str()?;
    if message.is_empty() {
        return None;
    }

    let severity = Severity::from_token(value.get("severity").and_then(Value::as_str));
    let hints = value
        .get("hints")
        .and_then(Value::as_array)
        .map(|hints| {
            hints
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(DiagnosticInfo {
        severity,
        message: message.to_string(),
        hints,
    })
}

/// Parse one or more debug-formatted diagnostic records out of `text`.
///
/// Returns an empty list when no quoted message can be found.
pub fn parse_debug_diagnostics(text: &str) -> Vec<DiagnosticInfo> {
    if !text.contains(DEBUG_RECORD_MARKER) {
        return parse_debug_record(text).into_iter().collect();
    }

    text.split(DEBUG_RECORD_MARKER)
        .skip(1)
        .filter_map(parse_debug_record)
        .collect()
}

fn parse_debug_record(record: &str) -> Option<DiagnosticInfo> {
    let message = MESSAGE_FIELD.captures(record)?.get(1)?.as_str();

    let severity = Severity::from_token(
        SEVERITY_FIELD
            .captures(record)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str()),
    );

    let hints = HINTS_FIELD
        .captures(record)
        .and_then(|caps| caps.get(1))
        .map(|list| {
            QUOTED
                .captures_iter(list.as_str())
                .filter_map(|caps| caps.get(1))
                .map(|hint| unescape(hint.as_str()))
                .collect()
        })
        .unwrap_or_default();

    Some(DiagnosticInfo {
        severity,
        message: unescape(message),
        hints,
    })
}

/// Undo debug-string escaping (`\"`, `\\`, `` \` ``, `\n`, `\u{..}` and friends).
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('u') => {
                let rest = chars.as_str();
                match parse_unicode_escape(rest) {
                    Some((decoded, consumed)) => {
                        out.push(decoded);
                        chars = rest[consumed..].chars();
                    }
                    None => out.push('u'),
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

/// Parse `{XXXX}` at the start of `rest`; returns the char and bytes consumed.
fn parse_unicode_escape(rest: &str) -> Option<(char, usize)> {
    let body = rest.strip_prefix('{')?;
    let end = body.find('}')?;
    let code = u32::from_str_radix(&body[..end], 16).ok()?;
    Some((char::from_u32(code)?, end + 2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_debug_string_with_escaped_hints() {
        let raw = r#"[SourceDiagnostic { severity: Error, span: Span(1234), message: "div by zero", trace: [], hints: ["check `x`", "see \`docs\`"] }]"#;
        let diagnostics = extract_diagnostics(&CompilerError::Message(raw.to_string()));

        assert_eq!(
            diagnostics,
            vec![DiagnosticInfo {
                severity: Severity::Error,
                message: "div by zero".into(),
                hints: vec!["check `x`".into(), "see `docs`".into()],
            }]
        );
    }

    #[test]
    fn test_debug_string_without_marker() {
        let raw = r#"message: "unknown variable: y", hints: []"#;
        let diagnostics = extract_diagnostics(&CompilerError::Message(raw.to_string()));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "unknown variable: y");
        assert!(diagnostics[0].hints.is_empty());
    }

    #[test]
    fn test_debug_string_multiple_records() {
        let raw = r#"[SourceDiagnostic { severity: Warning, message: "unused", hints: [] }, SourceDiagnostic { severity: Error, message: "expected \"(\"", hints: ["try \"a]b\""] }]"#;
        let diagnostics = parse_debug_diagnostics(raw);

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].message, "unused");
        assert_eq!(diagnostics[1].severity, Severity::Error);
        assert_eq!(diagnostics[1].message, "expected \"(\"");
        assert_eq!(diagnostics[1].hints, vec!["try \"a]b\"".to_string()]);
    }

    #[test]
    fn test_unknown_severity_is_error() {
        let raw = r#"SourceDiagnostic { severity: Hint, message: "m", hints: [] }"#;
        assert_eq!(parse_debug_diagnostics(raw)[0].severity, Severity::Error);
    }

    #[test]
    fn test_structured_records() {
        let value = json!([
            { "severity": "warning", "message": "shadowed", "hints": ["rename it"] },
            { "message": "" },
            { "severity": "error", "message": "boom" },
            "stray"
        ]);
        let diagnostics = extract_diagnostics(&CompilerError::Structured(value));

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].hints, vec!["rename it".to_string()]);
        assert_eq!(diagnostics[1].message, "boom");
        assert!(diagnostics[1].hints.is_empty());
    }

    #[test]
    fn test_structured_single_object() {
        let value = json!({ "message": "missing argument", "severity": "Error" });
        let diagnostics = extract_diagnostics(&CompilerError::Structured(value));
        assert_eq!(diagnostics, vec![DiagnosticInfo::error("missing argument")]);
    }

    #[test]
    fn test_fallback_keeps_raw_text() {
        let diagnostics =
            extract_diagnostics(&CompilerError::Message("RuntimeError: unreachable".into()));
        assert_eq!(
            diagnostics,
            vec![DiagnosticInfo::error("RuntimeError: unreachable")]
        );

        let diagnostics = extract_diagnostics(&CompilerError::Structured(json!({ "code": 7 })));
        assert_eq!(diagnostics[0].message, r#"{"code":7}"#);
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r#"a\"b\\c\`d\ne"#), "a\"b\\c`d\ne");
        assert_eq!(unescape(r"\u{3b1}"), "α");
        assert_eq!(unescape(r"\u{zz}"), "u{zz}");
        assert_eq!(unescape("trailing\\"), "trailing\\");
    }
}
