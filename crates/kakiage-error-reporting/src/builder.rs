//! Builder API for diagnostic messages.
//!
//! The builder encodes the tidyverse-style structure: a short title, one
//! problem statement, then bulleted details and hints.

use crate::diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage, SourceSpan};

/// Builder for [`DiagnosticMessage`].
///
/// ```
/// use kakiage_error_reporting::DiagnosticMessageBuilder;
///
/// let msg = DiagnosticMessageBuilder::error("Command failed")
///     .with_code("K-2-1")
///     .problem("Command `false` exited unsuccessfully")
///     .add_hint("Run the command in a shell to see its output?")
///     .build();
///
/// assert_eq!(msg.code.as_deref(), Some("K-2-1"));
/// assert_eq!(msg.hints.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct DiagnosticMessageBuilder {
    message: DiagnosticMessage,
}

impl DiagnosticMessageBuilder {
    pub fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            message: DiagnosticMessage::new(kind, title),
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, title)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Info, title)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.message.code = Some(code.into());
        self
    }

    /// Set the problem statement. Calling it twice keeps the last one.
    pub fn problem(mut self, problem: impl Into<String>) -> Self {
        self.message.problem = Some(problem.into());
        self
    }

    /// Add an error detail (✖ bullet).
    pub fn add_detail(self, detail: impl Into<String>) -> Self {
        self.push_detail(DetailKind::Error, detail)
    }

    /// Add an info detail (ℹ bullet).
    pub fn add_info(self, info: impl Into<String>) -> Self {
        self.push_detail(DetailKind::Info, info)
    }

    /// Add a note detail (• bullet).
    pub fn add_note(self, note: impl Into<String>) -> Self {
        self.push_detail(DetailKind::Note, note)
    }

    pub fn add_hint(mut self, hint: impl Into<String>) -> Self {
        self.message.hints.push(hint.into());
        self
    }

    pub fn with_location(mut self, span: SourceSpan) -> Self {
        self.message.location = Some(span);
        self
    }

    pub fn build(self) -> DiagnosticMessage {
        self.message
    }

    fn push_detail(mut self, kind: DetailKind, content: impl Into<String>) -> Self {
        self.message.details.push(DetailItem {
            kind,
            content: content.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builder_minimal() {
        let msg = DiagnosticMessageBuilder::warning("Unclosed conditional").build();
        assert_eq!(msg, DiagnosticMessage::warning("Unclosed conditional"));
    }

    #[test]
    fn test_builder_detail_order_is_preserved() {
        let msg = DiagnosticMessageBuilder::error("Include not found")
            .add_detail("first")
            .add_info("second")
            .add_note("third")
            .build();

        let kinds: Vec<DetailKind> = msg.details.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![DetailKind::Error, DetailKind::Info, DetailKind::Note]
        );
        assert_eq!(msg.details[2].content, "third");
    }

    #[test]
    fn test_builder_problem_last_wins() {
        let msg = DiagnosticMessageBuilder::info("Note")
            .problem("one")
            .problem("two")
            .build();
        assert_eq!(msg.problem.as_deref(), Some("two"));
        assert_eq!(msg.kind, DiagnosticKind::Info);
    }

    #[test]
    fn test_builder_location() {
        let msg = DiagnosticMessageBuilder::error("Unterminated directive")
            .with_code("K-3-6")
            .with_location(SourceSpan::new(4, 9))
            .build();
        assert_eq!(msg.location, Some(SourceSpan::new(4, 9)));
        assert_eq!(msg.code.as_deref(), Some("K-3-6"));
    }
}
