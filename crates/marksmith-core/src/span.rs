//! Source location tracking for block nodes.
//!
//! Blocks are built from tab-expanded, prefix-stripped lines, so byte offsets
//! into the original text stop being meaningful once a block is nested inside
//! a quote or a list item. Line numbers survive that stripping, which makes
//! them the unit of every `Span` in the tree.

/// A range of source lines.
///
/// Line numbers are zero-based and the range is half-open: `[start, end)`.
///
/// # Example
///
/// ```rust
/// use marksmith_core::span::Span;
///
/// let span = Span::new(2, 5);
/// assert_eq!(span.len(), 3);
/// assert!(span.contains(4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    /// First line of the range (inclusive).
    pub start: u32,
    /// Line after the last line of the range (exclusive).
    pub end: u32,
}

impl Span {
    /// Create a new span from line numbers.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// A span covering a single line.
    #[inline]
    pub const fn line(number: u32) -> Self {
        Self {
            start: number,
            end: number + 1,
        }
    }

    /// Number of lines covered.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Check if this span contains a line number.
    #[inline]
    pub const fn contains(&self, line: u32) -> bool {
        line >= self.start && line < self.end
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Humans count lines from one.
        if self.len() <= 1 {
            write!(f, "line {}", self.start + 1)
        } else {
            write!(f, "lines {}-{}", self.start + 1, self.end)
        }
    }
}
