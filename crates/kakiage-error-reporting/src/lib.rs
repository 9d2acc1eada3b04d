/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Diagnostic messages for the kakiage template expander.
//!
//! Expansion never aborts: every unresolved reference, failed collaborator
//! call, or malformed directive becomes a [`DiagnosticMessage`] that travels
//! next to the generated text. This crate provides:
//!
//! - [`DiagnosticMessage`]: the message structure (code, title, problem,
//!   details, hints, source span)
//! - [`DiagnosticMessageBuilder`]: tidyverse-style builder API
//! - [`ERROR_CATALOG`]: the `K-<group>-<n>` error-code catalog, embedded from
//!   `error_catalog.json`
//! - Text rendering (with `ariadne` source snippets) and JSON rendering
//!
//! # Example
//!
//! ```
//! use kakiage_error_reporting::{DiagnosticMessageBuilder, SourceSpan};
//!
//! let msg = DiagnosticMessageBuilder::warning("Undefined symbol")
//!     .with_code("K-1-1")
//!     .problem("Symbol `name` is not present in the value map")
//!     .with_location(SourceSpan::new(7, 17))
//!     .build();
//!
//! assert!(msg.to_text(None).contains("[K-1-1]"));
//! ```

pub mod builder;
pub mod catalog;
pub mod diagnostic;

pub use builder::DiagnosticMessageBuilder;
pub use catalog::{ERROR_CATALOG, ErrorCodeInfo, get_docs_url, get_error_info, get_subsystem};
pub use diagnostic::{
    DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage, SourceSpan, SourceText,
};
