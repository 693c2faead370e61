//! Syntax tree types for compiled documents.
//!
//! The block parser builds [`Block`] nodes whose text-bearing parts are
//! [`InlineText`] values holding only their raw source. A second pass fills
//! in the parsed [`Inline`] content once every link reference and footnote in
//! the document is known.
//!
//! The tree is:
//!
//! - **Owned**: a [`Document`](crate::Document) keeps it alongside its source
//! - **Span-tracked**: every block records the source lines it came from
//! - **Acyclic**: children are stored by value in document order

use serde::Serialize;

use crate::span::Span;

/// Raw inline source and its parsed form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineText {
    /// Source text, with container prefixes already stripped.
    pub raw: String,
    /// Parsed content. Empty until inline resolution runs.
    pub content: Vec<Inline>,
}

impl InlineText {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            content: Vec::new(),
        }
    }

    /// Rendered text without markup, used for header ids.
    pub fn plain_text(&self) -> String {
        let mut out = String::with_capacity(self.raw.len());
        for inline in &self.content {
            inline.write_plain_text(&mut out);
        }
        out
    }
}

/// Block-level nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Paragraph),
    /// Section heading (levels 1-6).
    Heading(Heading),
    /// Block quotation.
    Quote(Quote),
    /// Ordered or unordered list.
    List(List),
    /// Indented or fenced code.
    CodeBlock(CodeBlock),
    Table(Table),
    /// Horizontal rule.
    Rule(Span),
    /// Raw HTML passed through unchanged.
    Html(HtmlBlock),
    DefinitionList(DefinitionList),
}

impl Block {
    /// Source lines the block came from.
    pub fn span(&self) -> Span {
        match self {
            Block::Paragraph(b) => b.span,
            Block::Heading(b) => b.span,
            Block::Quote(b) => b.span,
            Block::List(b) => b.span,
            Block::CodeBlock(b) => b.span,
            Block::Table(b) => b.span,
            Block::Rule(span) => *span,
            Block::Html(b) => b.span,
            Block::DefinitionList(b) => b.span,
        }
    }

    /// Short lowercase name of the block kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Block::Paragraph(_) => "paragraph",
            Block::Heading(_) => "heading",
            Block::Quote(_) => "quote",
            Block::List(_) => "list",
            Block::CodeBlock(_) => "code",
            Block::Table(_) => "table",
            Block::Rule(_) => "rule",
            Block::Html(_) => "html",
            Block::DefinitionList(_) => "definition-list",
        }
    }
}

/// Text paragraph containing inline elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub text: InlineText,
    pub span: Span,
}

/// How a heading was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingStyle {
    /// `# Title`.
    Atx,
    /// `Title` underlined with `=` or `-`.
    Setext,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Heading level (1-6).
    pub level: u8,
    pub style: HeadingStyle,
    pub text: InlineText,
    /// Unique anchor, assigned when header ids are enabled.
    pub id: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub blocks: Vec<Block>,
    pub span: Span,
}

/// List ordering style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    /// Numbered list (1. 2. 3.).
    Ordered,
    /// Bulleted list (`*`, `+` or `-`).
    Unordered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List {
    pub kind: ListKind,
    /// Number on the first marker of an ordered list.
    pub start: Option<u64>,
    /// Items separated or split by blank lines wrap their paragraphs in `<p>`.
    pub loose: bool,
    pub items: Vec<ListItem>,
    pub span: Span,
}

/// A single list item (may contain nested blocks).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub blocks: Vec<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// First word of a fence's info string.
    pub lang: Option<String>,
    /// Code text, each line ending in a newline.
    pub content: String,
    pub fenced: bool,
    pub span: Span,
}

/// Column alignment from the separator row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

impl Alignment {
    /// Value of the `align` attribute, if any.
    pub fn as_attr(&self) -> Option<&'static str> {
        match self {
            Alignment::None => None,
            Alignment::Left => Some("left"),
            Alignment::Center => Some("center"),
            Alignment::Right => Some("right"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// One entry per column.
    pub alignments: Vec<Alignment>,
    pub header: TableRow,
    pub rows: Vec<TableRow>,
    pub span: Span,
}

/// A table row, always exactly as wide as the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub cells: Vec<InlineText>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlBlock {
    /// Lines of the block joined by newlines.
    pub content: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionList {
    pub items: Vec<DefinitionItem>,
    pub span: Span,
}

/// One or more terms sharing one or more definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionItem {
    pub terms: Vec<InlineText>,
    /// Each definition is its own block sequence.
    pub definitions: Vec<Vec<Block>>,
}

/// A footnote body, hoisted out of the block tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FootnoteDef {
    /// Label as written, without `^`.
    pub label: String,
    pub blocks: Vec<Block>,
    pub span: Span,
}

/// Typographic substitution produced by smartypants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmartKind {
    LeftDoubleQuote,
    RightDoubleQuote,
    LeftSingleQuote,
    RightSingleQuote,
    EnDash,
    EmDash,
    Ellipsis,
    Copyright,
    Registered,
    Trademark,
}

impl SmartKind {
    /// HTML entity emitted for the substitution.
    pub const fn entity(&self) -> &'static str {
        match self {
            SmartKind::LeftDoubleQuote => "&ldquo;",
            SmartKind::RightDoubleQuote => "&rdquo;",
            SmartKind::LeftSingleQuote => "&lsquo;",
            SmartKind::RightSingleQuote => "&rsquo;",
            SmartKind::EnDash => "&ndash;",
            SmartKind::EmDash => "&mdash;",
            SmartKind::Ellipsis => "&hellip;",
            SmartKind::Copyright => "&copy;",
            SmartKind::Registered => "&reg;",
            SmartKind::Trademark => "&trade;",
        }
    }

    /// The character the entity stands for.
    pub const fn as_char(&self) -> char {
        match self {
            SmartKind::LeftDoubleQuote => '\u{201c}',
            SmartKind::RightDoubleQuote => '\u{201d}',
            SmartKind::LeftSingleQuote => '\u{2018}',
            SmartKind::RightSingleQuote => '\u{2019}',
            SmartKind::EnDash => '\u{2013}',
            SmartKind::EmDash => '\u{2014}',
            SmartKind::Ellipsis => '\u{2026}',
            SmartKind::Copyright => '\u{a9}',
            SmartKind::Registered => '\u{ae}',
            SmartKind::Trademark => '\u{2122}',
        }
    }
}

/// Inline-level nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// Literal text, unescaped.
    Text(String),
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Superscript(Vec<Inline>),
    /// Code span content, unescaped.
    Code(String),
    Link(Link),
    Image(Image),
    /// `<url>`, `<email>` or a bare URL.
    AutoLink(AutoLink),
    /// Inline tag or comment passed through.
    Html(String),
    /// Hard line break.
    LineBreak,
    Smart(SmartKind),
    /// Numbered reference to a footnote.
    FootnoteRef(FootnoteRef),
}

impl Inline {
    /// Append the text a reader would see.
    pub fn write_plain_text(&self, out: &mut String) {
        match self {
            Inline::Text(s) | Inline::Code(s) => out.push_str(s),
            Inline::Emphasis(children)
            | Inline::Strong(children)
            | Inline::Strikethrough(children)
            | Inline::Superscript(children) => {
                children.iter().for_each(|c| c.write_plain_text(out));
            }
            Inline::Link(link) => link.children.iter().for_each(|c| c.write_plain_text(out)),
            Inline::Image(image) => out.push_str(&image.alt),
            Inline::AutoLink(link) => out.push_str(&link.text),
            Inline::Html(_) => {}
            Inline::LineBreak => out.push(' '),
            Inline::Smart(kind) => out.push(kind.as_char()),
            Inline::FootnoteRef(r) => out.push_str(&r.number.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub children: Vec<Inline>,
    pub url: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// Alt text, unescaped.
    pub alt: String,
    pub url: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoLink {
    pub url: String,
    /// Displayed text.
    pub text: String,
    /// Whether `url` is a `mailto:` address, rendered entity-encoded.
    pub email: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FootnoteRef {
    pub label: String,
    /// One-based number in order of first reference.
    pub number: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_flattens_markup() {
        let text = InlineText {
            raw: String::new(),
            content: vec![
                Inline::Text("Intro to ".into()),
                Inline::Emphasis(vec![Inline::Text("Rust".into())]),
                Inline::Smart(SmartKind::Ellipsis),
                Inline::Html("<br>".into()),
            ],
        };
        assert_eq!(text.plain_text(), "Intro to Rust\u{2026}");
    }

    #[test]
    fn block_span_and_name() {
        let block = Block::Rule(Span::line(3));
        assert_eq!(block.span(), Span::line(3));
        assert_eq!(block.kind_name(), "rule");
    }
}
