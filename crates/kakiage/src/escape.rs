/*
 * escape.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! HTML and URL escaping of generated text.
//!
//! All four functions operate on bytes. With `lazy_utf8` set, bytes at or
//! above 0x80 pass through untouched so multi-byte UTF-8 sequences survive;
//! otherwise each such byte is numerically escaped.

/// HTML-escape `text`.
///
/// ```
/// use kakiage::escape::html_encode;
///
/// assert_eq!(html_encode("<a href='x'>&</a>", true), "&lt;a href=&apos;x&apos;&gt;&amp;&lt;/a&gt;");
/// ```
pub fn html_encode(text: &str, lazy_utf8: bool) -> String {
    let mut out = Vec::with_capacity(text.len() * 2);
    for &c in text.as_bytes() {
        match c {
            b'&' => out.extend_from_slice(b"&amp;"),
            b'<' => out.extend_from_slice(b"&lt;"),
            b'>' => out.extend_from_slice(b"&gt;"),
            b'"' => out.extend_from_slice(b"&quot;"),
            b'\'' => out.extend_from_slice(b"&apos;"),
            b'\t' | b'\n' => out.push(c),
            c if c < 0x20 || (c >= 0x80 && !lazy_utf8) => {
                out.extend_from_slice(format!("&#{};", c).as_bytes());
            }
            c => out.push(c),
        }
    }
    bytes_to_string(out)
}

/// Reverse of [`html_encode`]: numeric references and the five named entities.
///
/// Decoding stops at an `&` with no `;` after it. Unknown entity names are
/// dropped.
pub fn html_decode(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        i += 1;
        if c != b'&' {
            out.push(c);
            continue;
        }
        let Some(semi) = bytes[i..].iter().position(|&b| b == b';') else {
            break;
        };
        let entity = &bytes[i..i + semi];
        match entity {
            [b'#', digits @ ..] => {
                let digits = String::from_utf8_lossy(digits);
                let code = crate::text::parse_int_prefix(&digits);
                // Numeric references encode single bytes, matching the encoder.
                out.push((code & 0xff) as u8);
            }
            b"amp" => out.push(b'&'),
            b"lt" => out.push(b'<'),
            b"gt" => out.push(b'>'),
            b"quot" => out.push(b'"'),
            b"apos" => out.push(b'\''),
            _ => {}
        }
        i += semi + 1;
    }
    bytes_to_string(out)
}

/// URL-encode `text` (form encoding: space becomes `+`).
///
/// ```
/// use kakiage::escape::url_encode;
///
/// assert_eq!(url_encode("a b/c~", true), "a+b%2Fc~");
/// ```
pub fn url_encode(text: &str, lazy_utf8: bool) -> String {
    let mut out = String::with_capacity(text.len() + 10);
    let mut pending = Vec::new();
    for &c in text.as_bytes() {
        if c.is_ascii_alphanumeric() || b"_.-~".contains(&c) {
            flush_utf8(&mut pending, &mut out);
            out.push(char::from(c));
        } else if lazy_utf8 && c >= 0x80 {
            pending.push(c);
        } else if c == b' ' {
            flush_utf8(&mut pending, &mut out);
            out.push('+');
        } else {
            flush_utf8(&mut pending, &mut out);
            out.push_str(&format!("%{:02X}", c));
        }
    }
    flush_utf8(&mut pending, &mut out);
    out
}

/// Reverse of [`url_encode`]: `+` becomes space and `%XX` is decoded.
pub fn url_decode(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        i += 1;
        match c {
            b'+' => out.push(b' '),
            b'%' => match (hex_value(bytes.get(i)), hex_value(bytes.get(i + 1))) {
                (Some(hi), Some(lo)) => {
                    out.push((hi << 4) | lo);
                    i += 2;
                }
                _ => out.push(c),
            },
            _ => out.push(c),
        }
    }
    bytes_to_string(out)
}

fn hex_value(byte: Option<&u8>) -> Option<u8> {
    let c = *byte?;
    char::from(c).to_digit(16).and_then(|d| u8::try_from(d).ok())
}

// Lazily passed-through bytes are always whole UTF-8 sequences of `text`.
fn flush_utf8(pending: &mut Vec<u8>, out: &mut String) {
    if !pending.is_empty() {
        out.push_str(&String::from_utf8_lossy(pending));
        pending.clear();
    }
}

fn bytes_to_string(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}
