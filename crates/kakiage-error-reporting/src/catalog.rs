//! Error code catalog and lookup.
//!
//! Maps error codes (like "K-1-1") to their metadata. The catalog lives in
//! `error_catalog.json` and is embedded at compile time.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata for an error code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorCodeInfo {
    /// Subsystem name (e.g., "lookup", "external", "syntax")
    pub subsystem: String,

    /// Short title for the error
    pub title: String,

    /// Default message template (may include `{placeholders}`)
    pub message_template: String,

    /// Documentation link, relative to the repository root (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,

    /// When this error was introduced (version)
    pub since_version: String,
}

/// Global error catalog, loaded lazily from the embedded JSON.
///
/// # Panics
///
/// Panics if the embedded JSON is invalid, which can only happen if
/// `error_catalog.json` is edited into an unparsable state.
pub static ERROR_CATALOG: Lazy<HashMap<String, ErrorCodeInfo>> = Lazy::new(|| {
    let json_data = include_str!("../error_catalog.json");
    serde_json::from_str(json_data).expect("Invalid error catalog JSON - this is a bug in kakiage")
});

/// Look up error code information.
///
/// ```
/// use kakiage_error_reporting::catalog::get_error_info;
///
/// let info = get_error_info("K-1-1").unwrap();
/// assert_eq!(info.title, "Undefined Symbol");
/// ```
pub fn get_error_info(code: &str) -> Option<&ErrorCodeInfo> {
    ERROR_CATALOG.get(code)
}

/// Get documentation URL for an error code.
pub fn get_docs_url(code: &str) -> Option<&str> {
    ERROR_CATALOG
        .get(code)
        .and_then(|info| info.docs_url.as_deref())
}

/// Get the subsystem name for an error code.
pub fn get_subsystem(code: &str) -> Option<&str> {
    ERROR_CATALOG.get(code).map(|info| info.subsystem.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        assert!(!ERROR_CATALOG.is_empty());
    }

    #[test]
    fn test_every_entry_has_docs_url() {
        for (code, info) in ERROR_CATALOG.iter() {
            let url = info.docs_url.as_deref().unwrap_or("");
            assert!(url.ends_with(code.as_str()), "bad docs url for {}", code);
        }
    }

    #[test]
    fn test_get_subsystem() {
        assert_eq!(get_subsystem("K-1-1"), Some("lookup"));
        assert_eq!(get_subsystem("K-2-3"), Some("external"));
        assert_eq!(get_subsystem("K-3-1"), Some("syntax"));
        assert_eq!(get_subsystem("K-999-999"), None);
    }

    #[test]
    fn test_nonexistent_code() {
        assert!(get_error_info("K-999-999").is_none());
        assert!(get_docs_url("K-999-999").is_none());
    }
}
