//! Source preparation before compilation.

use super::types::CompileOptions;
use crate::config::CompileConfig;

/// Wrap plain formula text as a single math block.
///
/// Surrounding whitespace is trimmed and every live `$` is escaped so the
/// content cannot close the math block early. A `$` already preceded by an
/// odd number of backslashes is left alone.
pub fn simplified_formula(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    format!("$ {} $", escape_delimiters(trimmed))
}

fn escape_delimiters(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 8);
    let mut backslashes = 0usize;
    for ch in text.chars() {
        match ch {
            '\\' => backslashes += 1,
            '$' => {
                if backslashes % 2 == 0 {
                    escaped.push('\\');
                }
                backslashes = 0;
            }
            _ => backslashes = 0,
        }
        escaped.push(ch);
    }
    escaped
}

/// Prepend the page preamble to a document body.
pub fn wrap_document(body: &str) -> String {
    let mut source = String::with_capacity(CompileConfig::PAGE_PREAMBLE.len() + body.len());
    source.push_str(CompileConfig::PAGE_PREAMBLE);
    source.push_str(body);
    source
}

/// Build the full source handed to the compiler.
pub fn prepare_source(text: &str, options: CompileOptions) -> String {
    if options.simplified_formula_mode {
        wrap_document(&simplified_formula(text))
    } else {
        wrap_document(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simplified_escapes_dollars() {
        assert_eq!(simplified_formula("  a $ b  "), r"$ a \$ b $");
        assert_eq!(simplified_formula("$x$"), r"$ \$x\$ $");
    }

    /// Count `$` characters not preceded by an odd run of backslashes.
    fn live_delimiters(source: &str) -> usize {
        let mut backslashes = 0usize;
        let mut live = 0;
        for ch in source.chars() {
            match ch {
                '\\' => backslashes += 1,
                '$' => {
                    if backslashes % 2 == 0 {
                        live += 1;
                    }
                    backslashes = 0;
                }
                _ => backslashes = 0,
            }
        }
        live
    }

    #[test]
    fn test_simplified_keeps_escaped_dollars() {
        let output = simplified_formula(r"cost \$5");
        assert_eq!(output, r"$ cost \$5 $");
        assert_eq!(live_delimiters(&output), 2);
    }

    #[test]
    fn test_simplified_escapes_dollar_after_escaped_backslash() {
        // `\\` is a literal backslash, so the `$` after it is live.
        let output = simplified_formula(r"a \\$ b");
        assert_eq!(output, r"$ a \\\$ b $");
        assert_eq!(live_delimiters(&output), 2);
    }

    #[test]
    fn test_simplified_output_has_one_pair_of_delimiters() {
        for input in ["$x$", r"\$x$", r"$$ \\$ \$", "a $ b $ c"] {
            assert_eq!(live_delimiters(&simplified_formula(input)), 2, "{input}");
        }
    }

    #[test]
    fn test_simplified_empty() {
        assert_eq!(simplified_formula("   \n"), "");
    }

    #[test]
    fn test_prepare_source_prepends_preamble() {
        let source = prepare_source("x^2", CompileOptions::default());
        assert!(source.starts_with(CompileConfig::PAGE_PREAMBLE));
        assert!(source.ends_with("x^2"));

        let source = prepare_source(" x^2 ", CompileOptions::simplified());
        assert_eq!(
            source,
            format!("{}$ x^2 $", CompileConfig::PAGE_PREAMBLE)
        );
    }
}
