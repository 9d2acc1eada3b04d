/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for loading templates.
//!
//! Expansion itself never fails; problems inside a template become
//! diagnostics. These errors cover getting the template text in the first
//! place.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur before expansion starts.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template file could not be read.
    #[error("Failed to read template {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;
