//! Line scanner for the block parser.
//!
//! The scanner splits input into lines, expands tabs to the configured tab
//! stop and classifies each line by the block marker it starts with. It uses
//! `memchr` for newline and tab detection.
//!
//! # Performance
//!
//! - Lines borrow from the input unless a tab forces an expanded copy
//! - SIMD-accelerated newline scanning via `memchr`
//! - Peek/consume API for lookahead without allocations
//!
//! Classification only looks at the line itself. Whether a marker actually
//! starts a block (an indented `#` is code, a list marker only interrupts a
//! paragraph inside a list) is decided by the parser, which also reuses
//! [`classify`] on container content after stripping `>` and list prefixes.

use std::borrow::Cow;

use memchr::memchr;

use crate::config::Config;

/// HTML element names that start a raw HTML block.
const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "canvas",
    "center",
    "dd",
    "del",
    "details",
    "dir",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "frameset",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hgroup",
    "hr",
    "iframe",
    "ins",
    "isindex",
    "main",
    "map",
    "math",
    "menu",
    "nav",
    "noframes",
    "noscript",
    "object",
    "ol",
    "p",
    "pre",
    "script",
    "section",
    "style",
    "summary",
    "table",
    "tbody",
    "td",
    "tfoot",
    "th",
    "thead",
    "tr",
    "ul",
    "video",
];

/// Block marker detected at the start of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Empty or whitespace only.
    Blank,
    /// `#` to `######`.
    AtxHeader { level: u8 },
    /// Three or more backticks or tildes.
    Fence { ch: u8, len: usize },
    /// Three or more `*`, `-` or `_`, optionally spaced.
    Rule,
    /// A run of `=` or a short run of `-`.
    SetextUnderline { level: u8 },
    /// `*`, `+`, `-` or `N.` followed by whitespace.
    ListMarker {
        ordered: bool,
        start: u64,
        /// Columns from the marker to its content.
        width: usize,
    },
    /// `>`.
    Quote,
    /// An opening block-level tag or an HTML comment.
    HtmlStart,
    /// Cells of `-` and `:` separated by `|`.
    TableSeparator,
    /// `[label]: url`.
    RefDef,
    /// `[^label]: text`.
    FootnoteDef,
    Text,
}

impl LineKind {
    /// Whether the marker ends a lazily continued paragraph.
    #[inline]
    pub fn interrupts_paragraph(&self) -> bool {
        matches!(
            self,
            LineKind::Blank
                | LineKind::AtxHeader { .. }
                | LineKind::Fence { .. }
                | LineKind::Rule
                | LineKind::Quote
        )
    }
}

/// A single classified line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<'a> {
    /// The line text with tabs expanded, without trailing newline.
    pub text: Cow<'a, str>,
    /// Leading spaces in columns.
    pub indent: usize,
    /// Zero-based source line number.
    pub number: u32,
    pub kind: LineKind,
}

impl<'a> Line<'a> {
    /// Build a line from already expanded text.
    pub fn new(text: Cow<'a, str>, number: u32) -> Self {
        let indent = leading_spaces(&text);
        let kind = classify(&text[indent..]);
        Self {
            text,
            indent,
            number,
            kind,
        }
    }

    #[inline(always)]
    pub fn is_blank(&self) -> bool {
        self.kind == LineKind::Blank
    }

    /// Whether the line is indented by at least one tab stop.
    #[inline(always)]
    pub fn is_indented(&self, tabstop: usize) -> bool {
        !self.is_blank() && self.indent >= tabstop
    }

    /// The text after the leading indentation.
    #[inline(always)]
    pub fn content(&self) -> &str {
        &self.text[self.indent..]
    }

    /// Get the line text with leading/trailing whitespace removed.
    #[inline(always)]
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }

    /// Drop the first `byte` bytes and reclassify what remains.
    ///
    /// `byte` is clamped to the line length and moved back to a char boundary.
    pub fn slice_from(&self, byte: usize) -> Line<'a> {
        let mut byte = byte.min(self.text.len());
        while !self.text.is_char_boundary(byte) {
            byte -= 1;
        }
        let text = match &self.text {
            Cow::Borrowed(s) => Cow::Borrowed(&s[byte..]),
            Cow::Owned(s) => Cow::Owned(s[byte..].to_string()),
        };
        Line::new(text, self.number)
    }

    /// Remove up to `columns` leading spaces.
    pub fn outdent(&self, columns: usize) -> Line<'a> {
        self.slice_from(self.indent.min(columns))
    }

    /// Level of a setext underline, if the line is one.
    ///
    /// A `---` line classifies as a rule on its own but still underlines a
    /// preceding paragraph line.
    pub fn setext_level(&self) -> Option<u8> {
        let t = self.trimmed();
        if t.is_empty() {
            return None;
        }
        if t.bytes().all(|b| b == b'=') {
            Some(1)
        } else if t.bytes().all(|b| b == b'-') {
            Some(2)
        } else {
            None
        }
    }
}

/// Line scanner for the block parser.
///
/// Provides peek/consume access to lines and implements [`Iterator`]. The
/// scanner is cheap to clone, so a caller can restart from any point.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    /// The complete input text.
    input: &'a str,
    /// Input as bytes for efficient scanning.
    bytes: &'a [u8],
    /// Current byte offset.
    offset: usize,
    /// Number of the next line to read.
    line: u32,
    tabstop: usize,
    /// Peeked line (for lookahead).
    peeked: Option<Line<'a>>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input, whose line endings are
    /// already plain `\n`.
    #[inline]
    pub fn new(input: &'a str, config: &Config) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            offset: 0,
            line: 0,
            tabstop: config.tabstop(),
            peeked: None,
        }
    }

    /// Peek at the next line without consuming it.
    #[inline]
    pub fn peek_line(&mut self) -> Option<&Line<'a>> {
        if self.peeked.is_none() {
            self.peeked = self.read_line();
        }
        self.peeked.as_ref()
    }

    /// Consume and return the next line.
    #[inline]
    pub fn next_line(&mut self) -> Option<Line<'a>> {
        if let Some(line) = self.peeked.take() {
            return Some(line);
        }
        self.read_line()
    }

    fn read_line(&mut self) -> Option<Line<'a>> {
        if self.offset >= self.bytes.len() {
            return None;
        }

        let start = self.offset;
        let end = match memchr(b'\n', &self.bytes[start..]) {
            Some(pos) => start + pos,
            None => self.bytes.len(),
        };

        self.offset = if end < self.bytes.len() { end + 1 } else { end };

        // `start` and `end` sit next to ASCII newline bytes, so both are char
        // boundaries.
        let raw = &self.input[start..end];
        let number = self.line;
        self.line += 1;

        Some(Line::new(expand_tabs(raw, self.tabstop), number))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line()
    }
}

/// Replace tabs with spaces up to the next multiple of `tabstop`.
pub fn expand_tabs(text: &str, tabstop: usize) -> Cow<'_, str> {
    if memchr(b'\t', text.as_bytes()).is_none() {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + tabstop * 2);
    let mut column = 0;
    for c in text.chars() {
        if c == '\t' {
            let pad = tabstop - (column % tabstop);
            out.extend(std::iter::repeat(' ').take(pad));
            column += pad;
        } else {
            out.push(c);
            column += 1;
        }
    }
    Cow::Owned(out)
}

#[inline]
fn leading_spaces(text: &str) -> usize {
    text.bytes().take_while(|&b| b == b' ').count()
}

/// Classify a line by the marker at its start. `text` has no leading spaces.
pub fn classify(text: &str) -> LineKind {
    let t = text.trim_end();
    let bytes = t.as_bytes();
    let Some(&first) = bytes.first() else {
        return LineKind::Blank;
    };

    match first {
        b'`' | b'~' => {
            if let Some(kind) = classify_fence(t) {
                return kind;
            }
        }
        b'#' => {
            let level = bytes.iter().take_while(|&&b| b == b'#').count().min(6);
            return LineKind::AtxHeader { level: level as u8 };
        }
        b'=' if bytes.iter().all(|&b| b == b'=') => {
            return LineKind::SetextUnderline { level: 1 };
        }
        _ => {}
    }

    if is_rule(t) {
        return LineKind::Rule;
    }
    if bytes.iter().all(|&b| b == b'-') {
        return LineKind::SetextUnderline { level: 2 };
    }
    if let Some(kind) = classify_list_marker(text) {
        return kind;
    }
    if first == b'>' {
        return LineKind::Quote;
    }
    if first == b'[' {
        if let Some(kind) = classify_definition(t) {
            return kind;
        }
    }
    if first == b'<' && is_html_block_start(t) {
        return LineKind::HtmlStart;
    }
    if is_table_separator(t) {
        return LineKind::TableSeparator;
    }

    LineKind::Text
}

fn classify_fence(t: &str) -> Option<LineKind> {
    let ch = t.as_bytes()[0];
    let len = t.bytes().take_while(|&b| b == ch).count();
    if len < 3 {
        return None;
    }
    // Backticks in the info string make this an inline code span.
    if ch == b'`' && memchr(b'`', t[len..].as_bytes()).is_some() {
        return None;
    }
    Some(LineKind::Fence { ch, len })
}

/// Three or more of the same `*`, `-` or `_`, optionally separated by spaces.
pub fn is_rule(t: &str) -> bool {
    let mut marker = None;
    let mut count = 0;
    for b in t.bytes() {
        match b {
            b' ' | b'\t' => {}
            b'*' | b'-' | b'_' => {
                if *marker.get_or_insert(b) != b {
                    return false;
                }
                count += 1;
            }
            _ => return false,
        }
    }
    count >= 3
}

fn classify_list_marker(text: &str) -> Option<LineKind> {
    let bytes = text.as_bytes();
    let (ordered, start, marker_len) = match bytes.first()? {
        b'*' | b'+' | b'-' => (false, 1, 1),
        b'0'..=b'9' => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            if digits > 9 || bytes.get(digits) != Some(&b'.') {
                return None;
            }
            let start = text[..digits].parse().ok()?;
            (true, start, digits + 1)
        }
        _ => return None,
    };

    let spaces = bytes[marker_len..]
        .iter()
        .take_while(|&&b| b == b' ')
        .count();
    if spaces == 0 || marker_len + spaces >= bytes.len() {
        return None;
    }
    // Content indented a full tab stop past the marker is code inside the
    // item; one space belongs to the marker.
    let width = if spaces > 4 {
        marker_len + 1
    } else {
        marker_len + spaces
    };
    Some(LineKind::ListMarker {
        ordered,
        start,
        width,
    })
}

fn classify_definition(t: &str) -> Option<LineKind> {
    let close = t.find("]:")?;
    if close < 2 {
        return None;
    }
    if t.as_bytes()[1] == b'^' {
        if close > 2 {
            return Some(LineKind::FootnoteDef);
        }
        return None;
    }
    if t[close + 2..].trim().is_empty() {
        return None;
    }
    Some(LineKind::RefDef)
}

/// Name of the block-level tag opening the line, lowercased, or `!--` for a
/// comment.
pub fn html_block_tag(t: &str) -> Option<String> {
    let rest = t.strip_prefix('<')?;
    if rest.starts_with("!--") {
        return Some("!--".to_string());
    }
    let name_len = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    if name_len == 0 {
        return None;
    }
    match rest.as_bytes().get(name_len) {
        None | Some(b'>') | Some(b' ') | Some(b'/') => {}
        _ => return None,
    }
    let name = rest[..name_len].to_ascii_lowercase();
    BLOCK_TAGS.contains(&name.as_str()).then_some(name)
}

#[inline]
fn is_html_block_start(t: &str) -> bool {
    html_block_tag(t).is_some()
}

/// Cells of `-` and `:` separated by `|`, each with at least one `-`.
pub fn is_table_separator(t: &str) -> bool {
    if memchr(b'|', t.as_bytes()).is_none() {
        return false;
    }
    let cells = split_row_cells(t);
    !cells.is_empty()
        && cells.iter().all(|cell| {
            let cell = cell.trim();
            !cell.is_empty()
                && cell.bytes().all(|b| b == b'-' || b == b':')
                && cell.contains('-')
        })
}

/// Split a table row on unescaped pipes, ignoring one leading and one
/// trailing pipe.
pub fn split_row_cells(row: &str) -> Vec<&str> {
    let row = row.trim();
    let row = row.strip_prefix('|').unwrap_or(row);
    let row = match row.strip_suffix('|') {
        Some(inner) if !inner.ends_with('\\') => inner,
        _ => row,
    };

    let bytes = row.as_bytes();
    let mut cells = Vec::new();
    let mut cell_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'|' => {
                cells.push(&row[cell_start..i]);
                cell_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    cells.push(&row[cell_start..]);
    cells
}
