/*
 * eval_context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Evaluation context for template expansion.
//!
//! This module provides [`EvalContext`], which is threaded through one
//! top-level expansion and every nested expansion it triggers, to support:
//!
//! 1. **Diagnostics**: Collect errors and warnings with source spans
//! 2. **State tracking**: Macro scopes and macro nesting depth
//! 3. **Configuration**: Strict mode for treating warnings as errors

use crate::scope::ScopeStack;
use kakiage_error_reporting::{
    DiagnosticKind, DiagnosticMessage, DiagnosticMessageBuilder, SourceSpan,
};
use std::ops::{Deref, DerefMut};

/// Collector for diagnostic messages during expansion.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<DiagnosticMessage>,
}

impl DiagnosticCollector {
    /// Create a new empty diagnostic collector.
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    /// Add a diagnostic message.
    pub fn add(&mut self, diagnostic: DiagnosticMessage) {
        tracing::debug!(
            code = diagnostic.code.as_deref().unwrap_or(""),
            kind = ?diagnostic.kind,
            "{}",
            diagnostic.problem.as_deref().unwrap_or(&diagnostic.title)
        );
        self.diagnostics.push(diagnostic);
    }

    /// Add an error message with error code and source span.
    pub fn error_with_code(&mut self, code: &str, problem: impl Into<String>, location: SourceSpan) {
        self.add(coded(DiagnosticMessageBuilder::error(title_for(code)), code, problem, location));
    }

    /// Add a warning message with error code and source span.
    pub fn warn_with_code(&mut self, code: &str, problem: impl Into<String>, location: SourceSpan) {
        self.add(coded(DiagnosticMessageBuilder::warning(title_for(code)), code, problem, location));
    }

    /// Check if any errors were collected (warnings don't count).
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::Error)
    }

    /// Get a reference to the collected diagnostics.
    pub fn diagnostics(&self) -> &[DiagnosticMessage] {
        &self.diagnostics
    }

    /// Consume the collector and return the diagnostics, sorted by source location.
    pub fn into_diagnostics(mut self) -> Vec<DiagnosticMessage> {
        self.diagnostics
            .sort_by_key(|diag| diag.location.map_or(0, |loc| loc.start));
        self.diagnostics
    }

    /// Check if the collector is empty.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

fn title_for(code: &str) -> String {
    kakiage_error_reporting::get_error_info(code)
        .map_or_else(|| code.to_string(), |info| info.title.clone())
}

fn coded(
    builder: DiagnosticMessageBuilder,
    code: &str,
    problem: impl Into<String>,
    location: SourceSpan,
) -> DiagnosticMessage {
    builder
        .with_code(code)
        .problem(problem)
        .with_location(location)
        .build()
}

/// Context for one top-level expansion.
///
/// Nested expansions (`include`, `put`, `jsx`) share it, so macro scopes
/// and diagnostics flow through the whole call chain. Spans always refer
/// to the top-level source: while a nested expansion runs, every
/// diagnostic points at the directive that started it.
#[derive(Debug)]
pub struct EvalContext {
    /// Diagnostic collector for errors and warnings.
    pub diagnostics: DiagnosticCollector,

    /// Macro definitions, one frame per running expansion.
    pub scopes: ScopeStack,

    /// Current `put` nesting depth (for recursion protection).
    pub macro_depth: usize,

    /// Maximum `put` nesting depth before error.
    pub max_macro_depth: usize,

    /// Maximum include nesting depth before error.
    pub max_include_depth: usize,

    /// Strict mode: treat warnings (e.g., undefined symbols) as errors.
    pub strict_mode: bool,

    anchor: Option<SourceSpan>,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EvalContext {
    pub fn new() -> Self {
        Self {
            diagnostics: DiagnosticCollector::new(),
            scopes: ScopeStack::new(),
            macro_depth: 0,
            max_macro_depth: 64,
            max_include_depth: 10,
            strict_mode: false,
            anchor: None,
        }
    }

    /// Enable or disable strict mode.
    ///
    /// In strict mode, warnings (like undefined symbols) are treated as errors.
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    pub fn with_max_macro_depth(mut self, depth: usize) -> Self {
        self.max_macro_depth = depth;
        self
    }

    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// Open a macro frame for the duration of the returned guard.
    pub fn enter_frame(&mut self) -> FrameGuard<'_> {
        self.scopes.push_frame();
        tracing::trace!(depth = self.scopes.depth(), "entered macro frame");
        FrameGuard { ctx: self }
    }

    /// Attribute diagnostics to `span` until [`EvalContext::leave_nested`].
    ///
    /// Only the outermost call takes effect; returns the previous anchor.
    pub fn enter_nested(&mut self, span: SourceSpan) -> Option<SourceSpan> {
        let previous = self.anchor;
        if previous.is_none() {
            self.anchor = Some(span);
        }
        previous
    }

    pub fn leave_nested(&mut self, previous: Option<SourceSpan>) {
        self.anchor = previous;
    }

    /// Map a span in the source being expanded to a span in the top-level source.
    pub fn span(&self, start: usize, end: usize) -> SourceSpan {
        self.anchor.unwrap_or_else(|| SourceSpan::new(start, end))
    }

    /// Add an error with error code.
    pub fn error_with_code(&mut self, code: &str, problem: impl Into<String>, location: SourceSpan) {
        self.diagnostics.error_with_code(code, problem, location);
    }

    /// Add a warning with error code.
    pub fn warn_with_code(&mut self, code: &str, problem: impl Into<String>, location: SourceSpan) {
        self.diagnostics.warn_with_code(code, problem, location);
    }

    /// Add an error or warning with error code depending on strict mode.
    ///
    /// In strict mode, this adds an error. Otherwise, it adds a warning.
    pub fn warn_or_error_with_code(
        &mut self,
        code: &str,
        problem: impl Into<String>,
        location: SourceSpan,
    ) {
        if self.strict_mode {
            self.error_with_code(code, problem, location);
        } else {
            self.warn_with_code(code, problem, location);
        }
    }

    /// Check if any errors have been collected.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// Consume the context and return collected diagnostics.
    pub fn into_diagnostics(self) -> Vec<DiagnosticMessage> {
        self.diagnostics.into_diagnostics()
    }
}

/// Keeps one macro frame open; the frame is popped on drop.
pub struct FrameGuard<'a> {
    ctx: &'a mut EvalContext,
}

impl Deref for FrameGuard<'_> {
    type Target = EvalContext;

    fn deref(&self) -> &EvalContext {
        self.ctx
    }
}

impl DerefMut for FrameGuard<'_> {
    fn deref_mut(&mut self) -> &mut EvalContext {
        self.ctx
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.ctx.scopes.pop_frame();
    }
}
