/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Definition files and `-D` arguments.
//!
//! A definition file holds one `NAME=VALUE` per line; lines end in CR,
//! CRLF or LF. `#` or `;` starts a comment that runs to the end of the
//! line; blank lines are ignored. A non-blank line without `=` is not
//! fatal: it is returned as a [`SyntaxWarning`] and the rest of the file
//! still loads.

use kakiage::Values;
use kakiage::text::line_terminator_len;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read definition file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Definition `{0}` is not of the form NAME=VALUE")]
    Definition(String),
}

/// A line of a definition file that is neither blank nor `NAME=VALUE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxWarning {
    /// 1-based line number.
    pub line: usize,
    pub text: String,
}

/// Parse definition file text into `values`, later lines replacing earlier
/// ones.
pub fn parse_definitions(text: &str, values: &mut Values) -> Vec<SyntaxWarning> {
    let mut warnings = Vec::new();
    for (index, line) in lines(text).into_iter().enumerate() {
        let content = match line.find(['#', ';']) {
            Some(comment) => &line[..comment],
            None => line,
        };
        let content = content.trim();
        if content.is_empty() {
            continue;
        }
        match content.split_once('=') {
            Some((name, value)) => values.insert(name.trim(), value.trim()),
            None => warnings.push(SyntaxWarning {
                line: index + 1,
                text: line.to_string(),
            }),
        }
    }
    warnings
}

fn lines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut pos = 0;
    while pos < bytes.len() {
        match line_terminator_len(bytes, pos) {
            0 => pos += 1,
            len => {
                lines.push(&text[start..pos]);
                pos += len;
                start = pos;
            }
        }
    }
    if start < bytes.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// Read and parse one definition file.
pub fn load_definitions(path: &Path, values: &mut Values) -> Result<Vec<SyntaxWarning>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let warnings = parse_definitions(&text, values);
    tracing::debug!(path = %path.display(), warnings = warnings.len(), "loaded definitions");
    Ok(warnings)
}

/// Split a `-D NAME=VALUE` argument. The value is kept verbatim.
pub fn parse_define(arg: &str) -> Result<(String, String), ConfigError> {
    match arg.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(ConfigError::Definition(arg.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_definitions() {
        let text = "# site settings\nname = Taro\nage=24 ; years\n\n  url=http://example.com/#top\n";
        let mut values = Values::new();
        let warnings = parse_definitions(text, &mut values);

        assert!(warnings.is_empty());
        assert_eq!(values.get("name"), Some("Taro"));
        assert_eq!(values.get("age"), Some("24"));
        // the comment marker cuts the value short
        assert_eq!(values.get("url"), Some("http://example.com/"));
    }

    #[test]
    fn test_parse_definitions_reports_bad_lines() {
        let text = "a=1\nno equals here\r\nb=2\n#=commented\nc#=3\n";
        let mut values = Values::new();
        let warnings = parse_definitions(text, &mut values);

        assert_eq!(
            warnings,
            vec![
                SyntaxWarning {
                    line: 2,
                    text: "no equals here".to_string()
                },
                SyntaxWarning {
                    line: 5,
                    text: "c#=3".to_string()
                },
            ]
        );
        assert_eq!(values.get("a"), Some("1"));
        assert_eq!(values.get("b"), Some("2"));
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_carriage_return_line_endings() {
        let text = "a=1\rb=2\r\nc=3\n\rbad line\rd=4";
        let mut values = Values::new();
        let warnings = parse_definitions(text, &mut values);

        assert_eq!(
            warnings,
            vec![SyntaxWarning {
                line: 5,
                text: "bad line".to_string()
            }]
        );
        assert_eq!(values.get("a"), Some("1"));
        assert_eq!(values.get("b"), Some("2"));
        assert_eq!(values.get("c"), Some("3"));
        assert_eq!(values.get("d"), Some("4"));
    }

    #[test]
    fn test_later_lines_win() {
        let mut values = Values::new();
        parse_definitions("x=1\nx=2", &mut values);
        assert_eq!(values.get("x"), Some("2"));
    }

    #[test]
    fn test_load_definitions_missing_file() {
        let mut values = Values::new();
        let err = load_definitions(Path::new("/no/such/file.ka"), &mut values).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/no/such/file.ka"));
    }

    #[test]
    fn test_parse_define() {
        assert_eq!(
            parse_define("name=Taro Yamada").unwrap(),
            ("name".to_string(), "Taro Yamada".to_string())
        );
        assert_eq!(
            parse_define("empty=").unwrap(),
            ("empty".to_string(), String::new())
        );
        assert_eq!(
            parse_define("expr=a=b").unwrap(),
            ("expr".to_string(), "a=b".to_string())
        );
        assert!(parse_define("novalue").is_err());
        assert!(parse_define("=x").is_err());
    }
}
