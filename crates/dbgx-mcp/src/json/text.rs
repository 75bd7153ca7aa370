//! String helpers used when emitting JSON text by hand.

use super::scanner::is_json_space;

/// Escapes `text` for embedding inside a JSON string literal.
///
/// Quotes, backslashes and the short-form control characters use their
/// two-character escapes; other bytes below 0x20 become `\u00XX` with
/// uppercase hex.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\u{08}' => escaped.push_str("\\b"),
            '\u{0C}' => escaped.push_str("\\f"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            control if u32::from(control) < 0x20 => {
                let code = u32::from(control);
                escaped.push_str("\\u00");
                for nibble in [code >> 4, code & 0x0F] {
                    if let Some(digit) = char::from_digit(nibble, 16) {
                        escaped.push(digit.to_ascii_uppercase());
                    }
                }
            }
            other => escaped.push(other),
        }
    }
    escaped
}

/// Strips leading and trailing ASCII whitespace.
#[must_use]
pub fn trim(value: &str) -> &str {
    value.trim_matches(|ch: char| u8::try_from(ch).is_ok_and(is_json_space))
}

/// Reports whether `value` is the literal `null`, ignoring surrounding
/// whitespace.
#[must_use]
pub fn is_null(value: &str) -> bool {
    trim(value) == "null"
}
