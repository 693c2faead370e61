//! Dialect switches.
//!
//! A [`Config`] is built once and shared by reference across every stage of a
//! compile. It deserializes from partial JSON: absent fields keep their
//! defaults.

use serde::{Deserialize, Serialize};

/// Default tab stop width in columns.
pub const DEFAULT_TABSTOP: u8 = 4;

const MIN_TABSTOP: u8 = 1;
const MAX_TABSTOP: u8 = 16;

/// Dialect and output configuration.
///
/// # Example
///
/// ```rust
/// use marksmith_core::Config;
///
/// let config = Config {
///     autolink: true,
///     ..Config::default()
/// };
/// assert!(config.smartypants);
/// assert!(config.strict_mode);
/// assert_eq!(config.tabstop(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Render links as their text only.
    pub remove_links: bool,
    /// Render images as their alt text only.
    pub remove_images: bool,
    /// Curly quotes, dashes, ellipses and symbol entities.
    pub smartypants: bool,
    /// `abbr:`, `class:`, `id:`, `lang:` and `raw:` link targets.
    pub pseudoprotocols: bool,
    /// Leading `%` lines become title, author and date.
    pub pandoc_headers: bool,
    /// Emit `id` attributes on headers.
    pub header_labels: bool,
    /// Escape every piece of literal HTML in the input.
    pub escape_html: bool,
    /// Word-boundary `_` emphasis and no superscript.
    pub strict_mode: bool,
    pub no_tables: bool,
    pub no_strikethrough: bool,
    /// Header ids plus [`Document::table_of_contents`](crate::Document::table_of_contents).
    pub toc: bool,
    /// Link bare URLs.
    pub autolink: bool,
    /// Only link safe URL schemes.
    pub safelink: bool,
    /// Tab expansion width. Read through [`Config::tabstop`].
    pub tabstop: u8,
    /// `[^id]` footnotes.
    pub extra_footnote: bool,
    /// Discount and Markdown Extra definition lists.
    pub definition_lists: bool,
    /// Wrap the output in a CDATA section.
    pub cdata: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remove_links: false,
            remove_images: false,
            smartypants: true,
            pseudoprotocols: false,
            pandoc_headers: false,
            header_labels: false,
            escape_html: false,
            strict_mode: true,
            no_tables: false,
            no_strikethrough: false,
            toc: false,
            autolink: false,
            safelink: false,
            tabstop: DEFAULT_TABSTOP,
            extra_footnote: false,
            definition_lists: false,
            cdata: false,
        }
    }
}

impl Config {
    /// Tab stop width clamped into the supported range.
    #[inline]
    pub fn tabstop(&self) -> usize {
        self.tabstop.clamp(MIN_TABSTOP, MAX_TABSTOP) as usize
    }

    /// Whether headers get `id` attributes.
    #[inline]
    pub fn header_ids(&self) -> bool {
        self.header_labels || self.toc
    }

    #[inline]
    pub fn tables(&self) -> bool {
        !self.no_tables
    }

    #[inline]
    pub fn strikethrough(&self) -> bool {
        !self.no_strikethrough
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dialect() {
        let config = Config::default();
        assert!(config.smartypants);
        assert!(config.strict_mode);
        assert!(config.tables());
        assert!(config.strikethrough());
        assert!(!config.autolink);
        assert!(!config.header_ids());
        assert_eq!(config.tabstop(), 4);
    }

    #[test]
    fn tabstop_is_clamped() {
        let zero = Config {
            tabstop: 0,
            ..Config::default()
        };
        assert_eq!(zero.tabstop(), 1);

        let wide = Config {
            tabstop: 200,
            ..Config::default()
        };
        assert_eq!(wide.tabstop(), 16);
    }

    #[test]
    fn toc_implies_header_ids() {
        let config = Config {
            toc: true,
            ..Config::default()
        };
        assert!(config.header_ids());
    }
}
