/*
 * literal.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Quoted literal scanning.

/// Decode a quoted span starting at `pos`, stopping before `stop` or `end`.
///
/// Backslash escapes `\n`, `\r`, `\t`, `\"`, `\'` and `\\` are translated; any
/// other escaped byte stands for itself. Returns the decoded bytes and the
/// cursor, which sits on the terminator (or equals `end` when none was found).
pub fn scan_literal(src: &[u8], pos: usize, end: usize, stop: u8) -> (Vec<u8>, usize) {
    let end = end.min(src.len());
    let mut out = Vec::new();
    let mut i = pos;
    while i < end {
        let c = src[i];
        if c == stop {
            break;
        }
        if c == b'\\' {
            i += 1;
            if i < end {
                out.push(match src[i] {
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    other => other,
                });
            }
        } else {
            out.push(c);
        }
        i += 1;
    }
    (out, i.min(end))
}
