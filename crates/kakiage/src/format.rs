/*
 * format.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! printf-style formatting for `%(fmt, args...)` substitutions.
//!
//! Arguments are always strings; numeric conversions parse them (integers
//! with C `atoi` rules, floats with [`str::parse`]) and use zero when that
//! fails. Missing arguments format as an empty string or zero. Field
//! widths and precisions are clamped to [`MAX_FIELD`].

use crate::text::{parse_int_prefix, trim};

/// Largest width or precision a conversion honors.
pub const MAX_FIELD: usize = 4096;

#[derive(Debug, Default, Clone, Copy)]
struct Spec {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    alt: bool,
    width: usize,
    precision: Option<usize>,
}

/// Format `fmt` with positional string arguments.
///
/// ```
/// use kakiage::format::sprintf;
///
/// assert_eq!(sprintf("%s is %03d", &["age", "7"]), "age is 007");
/// ```
pub fn sprintf<S: AsRef<str>>(fmt: &str, args: &[S]) -> String {
    let mut out = String::with_capacity(fmt.len() + 16);
    let mut args = args.iter().map(AsRef::as_ref);
    let mut chars = fmt.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut spec = Spec::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => spec.left = true,
                '+' => spec.plus = true,
                ' ' => spec.space = true,
                '0' => spec.zero = true,
                '#' => spec.alt = true,
                _ => break,
            }
            chars.next();
        }
        spec.width = take_number(&mut chars).unwrap_or(0);
        if chars.peek() == Some(&'.') {
            chars.next();
            spec.precision = Some(take_number(&mut chars).unwrap_or(0));
        }
        // Length modifiers carry no meaning for string arguments.
        while matches!(chars.peek(), Some('l' | 'h' | 'z' | 'j' | 't' | 'L' | 'q')) {
            chars.next();
        }

        let Some(conv) = chars.next() else {
            out.push('%');
            break;
        };
        let body = match conv {
            '%' => {
                out.push('%');
                continue;
            }
            's' => {
                let s = args.next().unwrap_or("");
                match spec.precision {
                    Some(p) => s.chars().take(p).collect(),
                    None => s.to_string(),
                }
            }
            'c' => args
                .next()
                .and_then(|s| s.chars().next())
                .map(String::from)
                .unwrap_or_default(),
            'd' | 'i' => {
                let v = int_arg(args.next());
                signed(v < 0, &digits(v.unsigned_abs(), 10, false, spec.precision), &spec)
            }
            'u' => {
                let v = int_arg(args.next());
                digits(v as u64, 10, false, spec.precision)
            }
            'x' | 'X' | 'o' => {
                let v = int_arg(args.next()) as u64;
                let (radix, upper) = match conv {
                    'x' => (16, false),
                    'X' => (16, true),
                    _ => (8, false),
                };
                let body = digits(v, radix, upper, spec.precision);
                match (spec.alt && v != 0, conv) {
                    (true, 'x') => format!("0x{}", body),
                    (true, 'X') => format!("0X{}", body),
                    (true, _) if !body.starts_with('0') => format!("0{}", body),
                    _ => body,
                }
            }
            'f' | 'F' | 'e' | 'E' | 'g' | 'G' => {
                let v = float_arg(args.next());
                let p = spec.precision.unwrap_or(6);
                let body = match conv {
                    'f' | 'F' => format!("{:.*}", p, v.abs()),
                    'e' => exponent(v.abs(), p, false),
                    'E' => exponent(v.abs(), p, true),
                    _ => general(v.abs(), p, conv == 'G', spec.alt),
                };
                signed(v.is_sign_negative() && v != 0.0, &body, &spec)
            }
            other => {
                // Unknown conversion: emit it untouched.
                out.push('%');
                out.push(other);
                continue;
            }
        };
        pad(&mut out, &body, &spec, conv);
    }
    out
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<usize> {
    let mut value: Option<usize> = None;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(d as usize));
        chars.next();
    }
    value.map(|v| v.min(MAX_FIELD))
}

fn int_arg(arg: Option<&str>) -> i64 {
    arg.map_or(0, parse_int_prefix)
}

fn float_arg(arg: Option<&str>) -> f64 {
    arg.and_then(|s| trim(s).parse::<f64>().ok()).unwrap_or(0.0)
}

fn digits(v: u64, radix: u32, upper: bool, precision: Option<usize>) -> String {
    let body = match (radix, upper) {
        (16, true) => format!("{:X}", v),
        (16, false) => format!("{:x}", v),
        (8, _) => format!("{:o}", v),
        _ => v.to_string(),
    };
    match precision {
        Some(0) if v == 0 => String::new(),
        Some(p) if body.len() < p => format!("{}{}", "0".repeat(p - body.len()), body),
        _ => body,
    }
}

fn signed(negative: bool, body: &str, spec: &Spec) -> String {
    let sign = if negative {
        "-"
    } else if spec.plus {
        "+"
    } else if spec.space {
        " "
    } else {
        ""
    };
    format!("{}{}", sign, body)
}

fn exponent(v: f64, precision: usize, upper: bool) -> String {
    let formatted = format!("{:.*e}", precision, v);
    // Rust prints `1.5e2`; C prints `1.5e+02`.
    let (mantissa, exp) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let marker = if upper { 'E' } else { 'e' };
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{}{}{}{:02}", mantissa, marker, sign, exp.abs())
}

fn general(v: f64, precision: usize, upper: bool, alt: bool) -> String {
    let p = precision.max(1);
    if v == 0.0 {
        return "0".to_string();
    }
    // The exponent decision uses the value as rounded to `p` significant digits.
    let sci = format!("{:.*e}", p - 1, v);
    let exp: i32 = sci
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);
    let p_i32 = i32::try_from(p).unwrap_or(i32::MAX);
    let body = if exp < -4 || exp >= p_i32 {
        exponent(v, p - 1, upper)
    } else {
        let decimals = usize::try_from(p_i32 - 1 - exp).unwrap_or(0);
        format!("{:.*}", decimals, v)
    };
    if alt {
        return body;
    }
    strip_trailing_zeros(&body)
}

fn strip_trailing_zeros(body: &str) -> String {
    let (mantissa, rest) = match body.find(['e', 'E']) {
        Some(i) => body.split_at(i),
        None => (body, ""),
    };
    if !mantissa.contains('.') {
        return body.to_string();
    }
    let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
    format!("{}{}", mantissa, rest)
}

fn pad(out: &mut String, body: &str, spec: &Spec, conv: char) {
    let len = body.chars().count();
    if len >= spec.width {
        out.push_str(body);
        return;
    }
    let fill = spec.width - len;
    let numeric = !matches!(conv, 's' | 'c');
    let int_with_precision =
        matches!(conv, 'd' | 'i' | 'u' | 'x' | 'X' | 'o') && spec.precision.is_some();
    if spec.left {
        out.push_str(body);
        out.extend(std::iter::repeat_n(' ', fill));
    } else if spec.zero && numeric && !int_with_precision {
        // Zeros go between the sign or radix prefix and the digits.
        let mut prefix_len = body.strip_prefix(['-', '+', ' ']).map_or(0, |_| 1);
        if body[prefix_len..].starts_with("0x") || body[prefix_len..].starts_with("0X") {
            prefix_len += 2;
        }
        out.push_str(&body[..prefix_len]);
        out.extend(std::iter::repeat_n('0', fill));
        out.push_str(&body[prefix_len..]);
    } else {
        out.extend(std::iter::repeat_n(' ', fill));
        out.push_str(body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strings() {
        assert_eq!(sprintf("[%s]", &["abc"]), "[abc]");
        assert_eq!(sprintf("[%5s]", &["abc"]), "[  abc]");
        assert_eq!(sprintf("[%-5s]", &["abc"]), "[abc  ]");
        assert_eq!(sprintf("[%.2s]", &["abc"]), "[ab]");
        assert_eq!(sprintf("[%c]", &["xyz"]), "[x]");
    }

    #[test]
    fn test_integers() {
        assert_eq!(sprintf("%d", &["42"]), "42");
        assert_eq!(sprintf("%+d", &["42"]), "+42");
        assert_eq!(sprintf("%05d", &["-42"]), "-0042");
        assert_eq!(sprintf("%.3d", &["7"]), "007");
        assert_eq!(sprintf("%x %X %o", &["255", "255", "8"]), "ff FF 10");
        assert_eq!(sprintf("%#x %#o", &["255", "8"]), "0xff 010");
        assert_eq!(sprintf("%#06x", &["255"]), "0x00ff");
        assert_eq!(sprintf("%d", &["abc"]), "0");
    }

    #[test]
    fn test_floats() {
        assert_eq!(sprintf("%f", &["1.5"]), "1.500000");
        assert_eq!(sprintf("%.2f", &["3.14159"]), "3.14");
        assert_eq!(sprintf("%8.2f", &["-3.14159"]), "   -3.14");
        assert_eq!(sprintf("%e", &["1500"]), "1.500000e+03");
        assert_eq!(sprintf("%.1E", &["0.00015"]), "1.5E-04");
        assert_eq!(sprintf("%g", &["0.0001"]), "0.0001");
        assert_eq!(sprintf("%g", &["100000"]), "100000");
        assert_eq!(sprintf("%g", &["1000000"]), "1e+06");
        assert_eq!(sprintf("%g", &["2.50"]), "2.5");
    }

    #[test]
    fn test_percent_and_missing_arguments() {
        assert_eq!(sprintf("100%%", &[] as &[&str]), "100%");
        assert_eq!(sprintf("[%s][%d]", &[] as &[&str]), "[][0]");
        assert_eq!(sprintf("trailing %", &[] as &[&str]), "trailing %");
        assert_eq!(sprintf("%y", &["1"]), "%y");
    }

    #[test]
    fn test_oversized_fields_are_clamped() {
        let zeros = sprintf("%.99999999999999999999d", &["1"]);
        assert_eq!(zeros.len(), MAX_FIELD);
        assert!(zeros.ends_with("01"));

        let padded = sprintf("%99999999999s|", &["x"]);
        assert_eq!(padded.len(), MAX_FIELD + 1);
        assert!(padded.ends_with("x|"));

        let fixed = sprintf("%.18446744073709551616f", &["0.5"]);
        assert_eq!(fixed.len(), MAX_FIELD + 2);
        assert!(fixed.starts_with("0.5000"));

        assert_eq!(sprintf("%.99999999999999999999g", &["2.5"]), "2.5");
    }

    #[test]
    fn test_owned_arguments() {
        let args = vec!["a".to_string(), "2".to_string()];
        assert_eq!(sprintf("%s=%d", &args), "a=2");
    }
}
