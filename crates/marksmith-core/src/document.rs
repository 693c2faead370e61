//! Compiled documents.
//!
//! A [`Document`] owns its normalized source and everything derived from it.
//! It is built in one pass and never mutated afterwards.

use std::borrow::Cow;

use crate::ast::Block;
use crate::config::Config;
use crate::error::{CompileError, CompileResult, Warnings};
use crate::html::{assign_header_ids, table_of_contents, wrap_cdata, HtmlRenderer, Slugs};
use crate::inline::{resolve_blocks, FootnoteState, InlineContext};
use crate::lexer::{Line, Lexer};
use crate::metadata::{self, Metadata};
use crate::parser::{ParseOutput, Parser};
use crate::refs::{FootnoteTable, ReferenceTable};

/// A parsed and inline-resolved Markdown document.
///
/// # Example
///
/// ```rust
/// use marksmith_core::{Config, Document};
///
/// let config = Config {
///     toc: true,
///     ..Config::default()
/// };
/// let doc = Document::compile("# One\n\n## Two\n", &config).unwrap();
/// assert_eq!(doc.blocks().len(), 2);
/// assert_eq!(
///     doc.to_html().unwrap(),
///     "<h1 id=\"one\">One</h1>\n\n<h2 id=\"two\">Two</h2>"
/// );
/// assert!(doc.table_of_contents().unwrap().contains("href=\"#two\""));
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    config: Config,
    blocks: Vec<Block>,
    references: ReferenceTable,
    footnotes: FootnoteTable,
    /// Footnote indices in order of first reference.
    footnote_order: Vec<usize>,
    metadata: Metadata,
    warnings: Warnings,
}

impl Document {
    /// Parse `text` under `config`.
    ///
    /// Fails only when the block parser stops making progress; malformed
    /// Markdown always compiles.
    pub fn compile(text: &str, config: &Config) -> CompileResult<Self> {
        let source = normalize_newlines(text).into_owned();

        let mut lexer = Lexer::new(&source, config);
        let metadata = if config.pandoc_headers {
            metadata::extract(&mut lexer)
        } else {
            Metadata::new()
        };
        let lines: Vec<Line<'_>> = lexer.collect();
        tracing::debug!(lines = lines.len(), bytes = source.len(), "lines scanned");

        let ParseOutput {
            mut blocks,
            references,
            mut footnotes,
            warnings,
        } = Parser::new(config).parse(&lines)?;
        drop(lines);

        let mut footnote_order = Vec::new();
        let mut ctx = InlineContext {
            config,
            references: &references,
            footnotes: config
                .extra_footnote
                .then(|| FootnoteState::new(&footnotes, &mut footnote_order)),
        };
        resolve_blocks(&mut blocks, &mut ctx);

        // Footnote bodies do not number further references.
        let mut ctx = InlineContext {
            config,
            references: &references,
            footnotes: None,
        };
        for def in footnotes.defs_mut() {
            resolve_blocks(&mut def.blocks, &mut ctx);
        }
        tracing::debug!(
            referenced_footnotes = footnote_order.len(),
            warnings = warnings.len(),
            "inline pass finished"
        );

        if config.header_ids() {
            assign_header_ids(&mut blocks, &mut Slugs::new());
        }

        Ok(Self {
            source,
            config: config.clone(),
            blocks,
            references,
            footnotes,
            footnote_order,
            metadata,
            warnings,
        })
    }

    /// Serialize the document to HTML.
    pub fn to_html(&self) -> CompileResult<String> {
        let requested = self.source.len().saturating_add(self.source.len() / 2).max(64);
        let mut html = String::new();
        html.try_reserve(requested)
            .map_err(|e| CompileError::allocation(requested, e))?;

        let mut renderer = HtmlRenderer::new(&self.config, &mut html);
        renderer.render_blocks(&self.blocks);
        renderer.render_footnotes(&self.footnotes, &self.footnote_order);
        tracing::debug!(bytes = html.len(), "html emitted");

        if self.config.cdata {
            return Ok(wrap_cdata(&html));
        }
        Ok(html)
    }

    /// Nested list of links to the document's headings, when `toc` is set.
    pub fn table_of_contents(&self) -> Option<String> {
        self.config
            .toc
            .then(|| table_of_contents(&self.blocks, &self.config))
    }

    /// Top-level blocks.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Recoverable problems found while parsing.
    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Source text after newline normalization.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn references(&self) -> &ReferenceTable {
        &self.references
    }

    pub fn footnotes(&self) -> &FootnoteTable {
        &self.footnotes
    }

    /// Number of footnotes that were referenced and will be rendered.
    pub fn referenced_footnotes(&self) -> usize {
        self.footnote_order.len()
    }
}

/// Drop a byte-order mark and turn CRLF and lone CR into LF.
fn normalize_newlines(text: &str) -> Cow<'_, str> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn document_is_send_and_sync() {
        assert_send_sync::<Document>();
    }

    #[test]
    fn normalizes_line_endings() {
        assert_eq!(normalize_newlines("\u{feff}a\r\nb\rc"), "a\nb\nc");
        assert!(matches!(normalize_newlines("plain\n"), Cow::Borrowed(_)));
    }

    #[test]
    fn forward_references_resolve() {
        let doc = Document::compile("[x][id]\n\n[id]: /url", &Config::default()).unwrap();
        assert_eq!(doc.to_html().unwrap(), "<p><a href=\"/url\">x</a></p>");
        assert_eq!(doc.references().len(), 1);
    }

    #[test]
    fn toc_is_none_unless_enabled() {
        let doc = Document::compile("# A", &Config::default()).unwrap();
        assert_eq!(doc.table_of_contents(), None);
    }

    #[test]
    fn cdata_wraps_output() {
        let config = Config {
            cdata: true,
            ..Config::default()
        };
        let doc = Document::compile("text", &config).unwrap();
        assert_eq!(doc.to_html().unwrap(), "<![CDATA[<p>text</p>]]>");
    }
}
