//! Errors and warnings produced while compiling a document.
//!
//! Markdown never fails to parse: malformed input degrades to literal text.
//! The only hard failures are resource exhaustion and an internal invariant
//! violation in the block parser. Everything else that degrades is recorded
//! as a [`Warning`] on the document and does not change the output.

use std::collections::TryReserveError;
use std::fmt;

use thiserror::Error;

use crate::span::Span;

/// A fatal compilation failure. No partial document exists when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The output buffer could not be allocated.
    #[error("allocation of {requested} bytes failed")]
    AllocationFailure {
        /// Number of bytes that were requested.
        requested: usize,
    },

    /// The block parser broke one of its own invariants.
    #[error("internal parser error at line {line}: {message}")]
    Structural {
        /// One-based source line where the parser stalled.
        line: u32,
        message: String,
    },
}

impl CompileError {
    pub(crate) fn allocation(requested: usize, _source: TryReserveError) -> Self {
        Self::AllocationFailure { requested }
    }

    pub(crate) fn structural(line: u32, message: impl Into<String>) -> Self {
        Self::Structural {
            line: line + 1,
            message: message.into(),
        }
    }
}

/// Result type for compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// Categories of graceful degradation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// A fenced code block ran to the end of its container.
    UnclosedFence,
    /// A raw HTML block never closed its opening tag.
    UnclosedHtml,
    /// A table candidate had a separator row that is not `-`, `:` and spaces.
    MalformedTable,
    /// A link reference label was defined more than once.
    DuplicateReference,
    /// A footnote label was defined more than once.
    DuplicateFootnote,
    /// Containers nested deeper than the parser follows.
    NestingTooDeep,
}

impl WarningKind {
    /// Short machine-readable name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UnclosedFence => "unclosed-fence",
            Self::UnclosedHtml => "unclosed-html",
            Self::MalformedTable => "malformed-table",
            Self::DuplicateReference => "duplicate-reference",
            Self::DuplicateFootnote => "duplicate-footnote",
            Self::NestingTooDeep => "nesting-too-deep",
        }
    }
}

/// A recoverable oddity in the input, with its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Human-readable message.
    pub message: String,
    /// Source lines involved.
    pub span: Span,
    /// Warning categorization.
    pub kind: WarningKind,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            kind,
        }
    }

    pub fn unclosed_fence(fence: &str, span: Span) -> Self {
        Self::new(
            WarningKind::UnclosedFence,
            format!("unclosed code fence `{}`", fence),
            span,
        )
    }

    pub fn unclosed_html(tag: &str, span: Span) -> Self {
        Self::new(
            WarningKind::UnclosedHtml,
            format!("<{}> block is never closed", tag),
            span,
        )
    }

    pub fn malformed_table(span: Span) -> Self {
        Self::new(
            WarningKind::MalformedTable,
            "table separator row is malformed, rendering as a paragraph",
            span,
        )
    }

    pub fn duplicate_reference(label: &str, span: Span) -> Self {
        Self::new(
            WarningKind::DuplicateReference,
            format!("link reference [{}] is already defined", label),
            span,
        )
    }

    pub fn duplicate_footnote(label: &str, span: Span) -> Self {
        Self::new(
            WarningKind::DuplicateFootnote,
            format!("footnote [^{}] is already defined", label),
            span,
        )
    }

    pub fn nesting_too_deep(span: Span) -> Self {
        Self::new(
            WarningKind::NestingTooDeep,
            "containers nested too deeply, remaining content kept as text",
            span,
        )
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.span)
    }
}

/// Warnings collected during one compilation, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Warnings {
    warnings: Vec<Warning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
        }
    }

    /// Record a warning and log it.
    pub fn push(&mut self, warning: Warning) {
        tracing::debug!(kind = warning.kind.as_str(), span = %warning.span, "{}", warning.message);
        self.warnings.push(warning);
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.warnings.iter()
    }

    /// Check whether a warning of the given kind was recorded.
    pub fn contains(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }
}

impl IntoIterator for Warnings {
    type Item = Warning;
    type IntoIter = std::vec::IntoIter<Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.warnings.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_error_reports_one_based_line() {
        let err = CompileError::structural(4, "no progress");
        assert_eq!(err.to_string(), "internal parser error at line 5: no progress");
    }

    #[test]
    fn warning_display_includes_lines() {
        let w = Warning::malformed_table(Span::new(0, 2));
        assert_eq!(
            w.to_string(),
            "table separator row is malformed, rendering as a paragraph (lines 1-2)"
        );
    }

    #[test]
    fn warnings_track_kinds() {
        let mut warnings = Warnings::new();
        assert!(warnings.is_empty());
        warnings.push(Warning::duplicate_reference("a", Span::line(3)));
        assert_eq!(warnings.len(), 1);
        assert!(warnings.contains(WarningKind::DuplicateReference));
        assert!(!warnings.contains(WarningKind::UnclosedFence));
    }
}
