/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! A recursive-descent text template expander.
//!
//! Templates are plain text with `{{`-led directives, expanded in a single
//! pass against a caller-supplied value map. It supports:
//!
//! - Value substitution: `{{.name}}`, HTML-escaped in HTML mode
//! - Keyword directives: `{{.#raw.name}}`, `{{.#html(...)}}`, `{{.#url(...)}}`
//! - Macros: `{{.#define.name=body}}` and `{{.#put.name(args)}}`
//! - Conditionals: `{{.#if.x}}...{{.#elif.y}}...{{.#else}}...{{.#end}}`
//! - Includes: `{{.<file>}}`, `{{.#include('file')}}`, `{{.#jsx('file', 'var')}}`
//! - Argument forms: quoted literals, `` `command` ``, `<file>`, `$(ENV)`,
//!   `%(fmt, args...)`
//! - Nesting comments: `{{.; ... }}`
//! - Literal escapes: `&{{;` emits `{{`
//!
//! # Architecture
//!
//! The engine performs no I/O of its own. File includes, macro evaluation,
//! shell commands and environment lookups go through the traits in
//! [`hooks`], so the same engine can run against the file system, an
//! in-memory bundle, or test doubles.
//!
//! Expansion never fails. Problems become diagnostics from
//! `kakiage-error-reporting`, returned alongside the text by
//! [`Kakiage::expand`].
//!
//! # Example
//!
//! ```
//! use kakiage::{Kakiage, MemoryIncluder, Values};
//!
//! let includer = MemoryIncluder::with_files([("footer", "(c) {{.year}}\n")]);
//! let engine = Kakiage::new().with_includer(includer);
//!
//! let values: Values = [("title", "News"), ("year", "2025")].into_iter().collect();
//! let expansion = engine.expand("<h1>{{.title}}</h1>{{.<footer>}}", &values);
//!
//! assert_eq!(expansion.text, "<h1>News</h1>(c) 2025");
//! assert!(expansion.diagnostics.is_empty());
//! ```

pub mod args;
pub mod condition;
pub mod engine;
pub mod error;
pub mod escape;
pub mod eval_context;
pub mod format;
pub mod hooks;
pub mod literal;
pub mod output;
pub mod scope;
pub mod text;
pub mod values;

// Re-export main types at crate root
pub use engine::{Expansion, Kakiage};
pub use error::{TemplateError, TemplateResult};
pub use eval_context::{DiagnosticCollector, EvalContext};
pub use hooks::{
    CommandRunner, Environment, FileSystemIncluder, Includer, MacroEvaluator, MemoryEnvironment,
    MemoryIncluder, NullEvaluator, NullIncluder, NullRunner, ProcessEnvironment, ShellRunner,
};
pub use values::Values;
