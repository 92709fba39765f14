//! Tab-separated report dialect.
//!
//! Tab delimited, `\n` terminated, no doubled quotes, `\` as escape
//! character. Numeric cells are wrapped in `"`, everything else is written
//! bare with its whitespace runs collapsed to one space.

use std::io::Write;

use csv::{QuoteStyle, Terminator, WriterBuilder};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Written for fields a record never received.
pub const MISSING: &str = "NA";

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is a valid regex"));

pub fn writer<W: Write>(inner: W) -> csv::Writer<W> {
    // Quoting and escaping are done per cell in `render`.
    WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(Terminator::Any(b'\n'))
        .quote_style(QuoteStyle::Never)
        .double_quote(false)
        .escape(b'\\')
        .flexible(false)
        .from_writer(inner)
}

pub fn render(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => MISSING.to_string(),
        Some(Value::Number(number)) => format!("\"{number}\""),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(Value::String(text)) => escape(&normalize_whitespace(text)),
        Some(other) => escape(&normalize_whitespace(&other.to_string())),
    }
}

pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").into_owned()
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '"' | '\t' | '\n' | '\r') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_are_quoted() {
        assert_eq!(render(Some(&json!(42))), "\"42\"");
        assert_eq!(render(Some(&json!(1.5))), "\"1.5\"");
    }

    #[test]
    fn test_missing_and_null_are_na() {
        assert_eq!(render(None), "NA");
        assert_eq!(render(Some(&Value::Null)), "NA");
    }

    #[test]
    fn test_strings_are_collapsed_and_escaped() {
        assert_eq!(render(Some(&json!("a \t b\n\nc"))), "a b c");
        assert_eq!(render(Some(&json!("say \"hi\""))), "say \\\"hi\\\"");
        assert_eq!(render(Some(&json!("C:\\x"))), "C:\\\\x");
    }
}
