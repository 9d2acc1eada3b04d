/*
 * text.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Byte-level string helpers shared by the scanners.

/// Strip ASCII whitespace from both ends of a byte slice.
pub fn trimmed(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

/// Strip ASCII whitespace from both ends of a string.
pub fn trim(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_ascii_whitespace())
}

/// Decode bytes as UTF-8, replacing invalid sequences.
pub fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Whether `c` may start a symbol name.
pub fn is_symbol_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

/// Whether `c` may continue a symbol name.
pub fn is_symbol_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// Parse a leading integer the way C `atoi` does.
///
/// Leading whitespace and one optional sign are accepted, then decimal
/// digits up to the first non-digit. No digits yields 0. Overflow saturates.
pub fn parse_int_prefix(text: &str) -> i64 {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    let negative = match bytes.get(i) {
        Some(b'-') => {
            i += 1;
            true
        }
        Some(b'+') => {
            i += 1;
            false
        }
        _ => false,
    };
    let mut value: i64 = 0;
    while let Some(d) = bytes.get(i).filter(|b| b.is_ascii_digit()) {
        let digit = i64::from(d - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(digit)
        } else {
            value.saturating_mul(10).saturating_add(digit)
        };
        i += 1;
    }
    value
}

/// Length of the line terminator (CR, CRLF or LF) starting at `pos`.
pub fn line_terminator_len(bytes: &[u8], pos: usize) -> usize {
    match (bytes.get(pos), bytes.get(pos + 1)) {
        (Some(b'\r'), Some(b'\n')) => 2,
        (Some(b'\r' | b'\n'), _) => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_trimmed() {
        assert_eq!(trimmed(b"  abc \r\n"), b"abc");
        assert_eq!(trimmed(b"   "), b"");
        assert_eq!(trimmed(b""), b"");
        assert_eq!(trimmed(b"a b"), b"a b");
    }

    #[test]
    fn test_symbol_classes() {
        assert!(is_symbol_start(b'_'));
        assert!(is_symbol_start(b'x'));
        assert!(!is_symbol_start(b'1'));
        assert!(is_symbol_char(b'1'));
        assert!(!is_symbol_char(b'-'));
    }

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int_prefix("1"), 1);
        assert_eq!(parse_int_prefix("  -42abc"), -42);
        assert_eq!(parse_int_prefix("+7"), 7);
        assert_eq!(parse_int_prefix("abc"), 0);
        assert_eq!(parse_int_prefix(""), 0);
        assert_eq!(parse_int_prefix("99999999999999999999999"), i64::MAX);
        assert_eq!(parse_int_prefix("-99999999999999999999999"), i64::MIN);
    }

    #[test]
    fn test_line_terminator_len() {
        assert_eq!(line_terminator_len(b"\r\nx", 0), 2);
        assert_eq!(line_terminator_len(b"\rx", 0), 1);
        assert_eq!(line_terminator_len(b"\nx", 0), 1);
        assert_eq!(line_terminator_len(b"x\n", 0), 0);
        assert_eq!(line_terminator_len(b"x", 5), 0);
    }
}
