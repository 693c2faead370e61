//! Block parser.
//!
//! Turns classified lines into the block tree, collecting link reference
//! definitions and footnote bodies on the way. Container blocks (quotes,
//! list items, footnotes, definitions) strip their prefixes and run the same
//! parser again on what remains.
//!
//! Malformed Markdown never fails here; it degrades to paragraph text and,
//! where it is worth reporting, leaves a [`Warning`] behind. The only error is
//! the parser failing to advance, which would be a bug.

use crate::ast::{
    Alignment, Block, CodeBlock, DefinitionItem, DefinitionList, FootnoteDef, Heading,
    HeadingStyle, HtmlBlock, InlineText, List, ListItem, ListKind, Paragraph, Quote, Table,
    TableRow,
};
use crate::config::Config;
use crate::error::{CompileError, CompileResult, Warning, Warnings};
use crate::lexer::{html_block_tag, split_row_cells, Line, LineKind};
use crate::refs::{parse_definition, FootnoteTable, ReferenceTable};
use crate::span::Span;

/// Containers nested deeper than this keep their content as plain text.
pub const MAX_NESTING: usize = 64;

/// HTML block tags that never have a closing tag.
const VOID_TAGS: &[&str] = &["hr", "isindex"];

/// Everything the block pass produces.
#[derive(Debug, Default)]
pub struct ParseOutput {
    pub blocks: Vec<Block>,
    pub references: ReferenceTable,
    pub footnotes: FootnoteTable,
    pub warnings: Warnings,
}

/// Where a run of lines sits, which decides the constructs it may contain.
#[derive(Debug, Clone, Copy)]
struct Scope {
    /// Reference and footnote definitions are only recognized at the top.
    top: bool,
    /// List markers interrupt paragraphs inside list items.
    in_list: bool,
}

impl Scope {
    const TOP: Scope = Scope {
        top: true,
        in_list: false,
    };
    const NESTED: Scope = Scope {
        top: false,
        in_list: false,
    };
    const LIST_ITEM: Scope = Scope {
        top: false,
        in_list: true,
    };
}

/// Line range of a definition list entry, found before any of it is parsed.
struct DefinitionExtent<'a> {
    terms: Vec<String>,
    bodies: Vec<Vec<Line<'a>>>,
    end: usize,
}

/// Block parser for one document.
pub struct Parser<'c> {
    config: &'c Config,
    tabstop: usize,
    references: ReferenceTable,
    footnotes: FootnoteTable,
    warnings: Warnings,
    nesting_reported: bool,
}

impl<'c> Parser<'c> {
    /// Create a parser for the given configuration.
    #[inline]
    pub fn new(config: &'c Config) -> Self {
        Self {
            config,
            tabstop: config.tabstop(),
            references: ReferenceTable::new(),
            footnotes: FootnoteTable::new(),
            warnings: Warnings::new(),
            nesting_reported: false,
        }
    }

    /// Parse a document's lines into blocks and definition tables.
    pub fn parse(mut self, lines: &[Line<'_>]) -> CompileResult<ParseOutput> {
        let blocks = self.parse_blocks(lines, 0, Scope::TOP)?;
        tracing::debug!(
            blocks = blocks.len(),
            references = self.references.len(),
            footnotes = self.footnotes.len(),
            "block pass finished"
        );
        Ok(ParseOutput {
            blocks,
            references: self.references,
            footnotes: self.footnotes,
            warnings: self.warnings,
        })
    }

    /// Record a warning during parsing.
    #[inline]
    fn record(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    fn parse_blocks(
        &mut self,
        lines: &[Line<'_>],
        depth: usize,
        scope: Scope,
    ) -> CompileResult<Vec<Block>> {
        if depth > MAX_NESTING {
            return Ok(self.flatten(lines));
        }

        let mut blocks = Vec::new();
        let mut i = 0;
        while i < lines.len() {
            let next = self.parse_block(lines, i, depth, scope, &mut blocks)?;
            if next <= i {
                return Err(CompileError::structural(
                    lines[i].number,
                    "block parser made no progress",
                ));
            }
            i = next;
        }
        Ok(blocks)
    }

    /// Parse the block starting at `lines[i]`, returning the index after it.
    fn parse_block(
        &mut self,
        lines: &[Line<'_>],
        i: usize,
        depth: usize,
        scope: Scope,
        blocks: &mut Vec<Block>,
    ) -> CompileResult<usize> {
        let line = &lines[i];
        if line.is_blank() {
            return Ok(i + 1);
        }
        tracing::trace!(line = line.number, kind = ?line.kind, "block start");

        if line.is_indented(self.tabstop) {
            return Ok(self.parse_indented_code(lines, i, blocks));
        }

        match line.kind {
            LineKind::Fence { ch, len } => return Ok(self.parse_fenced_code(lines, i, ch, len, blocks)),
            LineKind::AtxHeader { .. } => {
                blocks.push(parse_atx_heading(line));
                return Ok(i + 1);
            }
            LineKind::Rule => {
                blocks.push(Block::Rule(Span::line(line.number)));
                return Ok(i + 1);
            }
            LineKind::Quote => return self.parse_quote(lines, i, depth, blocks),
            LineKind::ListMarker { .. } => return self.parse_list(lines, i, depth, blocks),
            LineKind::FootnoteDef if scope.top && self.config.extra_footnote => {
                return self.parse_footnote_def(lines, i, depth);
            }
            LineKind::RefDef if scope.top => {
                if let Some(next) = self.parse_reference(lines, i) {
                    return Ok(next);
                }
            }
            LineKind::HtmlStart if !self.config.escape_html => {
                return Ok(self.parse_html_block(lines, i, blocks));
            }
            _ => {}
        }

        if self.config.definition_lists {
            if let Some(next) = self.parse_definition_list(lines, i, depth, blocks)? {
                return Ok(next);
            }
        }
        if self.config.tables() {
            if let Some(next) = self.parse_table(lines, i, blocks) {
                return Ok(next);
            }
        }
        Ok(self.parse_paragraph(lines, i, scope, blocks))
    }

    /// Keep the content of an over-deep container as one paragraph.
    fn flatten(&mut self, lines: &[Line<'_>]) -> Vec<Block> {
        let (Some(first), Some(last)) = (lines.first(), lines.last()) else {
            return Vec::new();
        };
        let span = Span::new(first.number, last.number + 1);
        if !self.nesting_reported {
            self.nesting_reported = true;
            self.record(Warning::nesting_too_deep(span));
        }
        let text = paragraph_text(lines);
        if text.is_empty() {
            return Vec::new();
        }
        vec![Block::Paragraph(Paragraph {
            text: InlineText::new(text),
            span,
        })]
    }

    fn parse_indented_code(&mut self, lines: &[Line<'_>], i: usize, blocks: &mut Vec<Block>) -> usize {
        let tabstop = self.tabstop;
        let mut end = i;
        let mut j = i;
        while j < lines.len() {
            let line = &lines[j];
            if line.is_blank() {
                j += 1;
            } else if line.indent >= tabstop {
                j += 1;
                end = j;
            } else {
                break;
            }
        }

        let mut content = String::new();
        for line in &lines[i..end] {
            content.push_str(&line.text[line.indent.min(tabstop)..]);
            content.push('\n');
        }

        blocks.push(Block::CodeBlock(CodeBlock {
            lang: None,
            content,
            fenced: false,
            span: span_of(&lines[i..end]),
        }));
        end
    }

    fn parse_fenced_code(
        &mut self,
        lines: &[Line<'_>],
        i: usize,
        ch: u8,
        len: usize,
        blocks: &mut Vec<Block>,
    ) -> usize {
        let open = &lines[i];
        let fence_indent = open.indent;
        let info = open.content()[len..].trim();
        let lang = info.split_whitespace().next().map(str::to_string);

        let close = (i + 1..lines.len()).find(|&j| {
            let line = &lines[j];
            matches!(line.kind, LineKind::Fence { ch: c, len: n } if c == ch && n >= len)
                && !line.is_indented(self.tabstop)
                && line.content().trim_end().bytes().all(|b| b == ch)
        });
        let body_end = close.unwrap_or(lines.len());

        let mut content = String::new();
        for line in &lines[i + 1..body_end] {
            content.push_str(&line.text[line.indent.min(fence_indent)..]);
            content.push('\n');
        }

        let end = close.map_or(lines.len(), |c| c + 1);
        let span = span_of(&lines[i..end]);
        if close.is_none() {
            let fence = char::from(ch).to_string().repeat(len);
            self.record(Warning::unclosed_fence(&fence, span));
        }

        blocks.push(Block::CodeBlock(CodeBlock {
            lang,
            content,
            fenced: true,
            span,
        }));
        end
    }

    fn parse_quote(
        &mut self,
        lines: &[Line<'_>],
        i: usize,
        depth: usize,
        blocks: &mut Vec<Block>,
    ) -> CompileResult<usize> {
        let mut inner = Vec::new();
        let mut j = i;
        while j < lines.len() {
            let line = &lines[j];
            if line.kind == LineKind::Quote && !line.is_indented(self.tabstop) {
                inner.push(strip_quote_marker(line));
                j += 1;
            } else if line.is_blank() {
                // A blank line only continues the quote when another `>` follows.
                let k = next_non_blank(lines, j);
                match lines.get(k) {
                    Some(next) if next.kind == LineKind::Quote && !next.is_indented(self.tabstop) => {
                        inner.extend(lines[j..k].iter().cloned());
                        j = k;
                    }
                    _ => break,
                }
            } else {
                // Lazy continuation.
                inner.push(line.clone());
                j += 1;
            }
        }

        let children = self.parse_blocks(&inner, depth + 1, Scope::NESTED)?;
        blocks.push(Block::Quote(Quote {
            blocks: children,
            span: span_of(&lines[i..j]),
        }));
        Ok(j)
    }

    fn parse_list(
        &mut self,
        lines: &[Line<'_>],
        i: usize,
        depth: usize,
        blocks: &mut Vec<Block>,
    ) -> CompileResult<usize> {
        let first = &lines[i];
        let LineKind::ListMarker {
            ordered,
            start,
            width,
        } = first.kind
        else {
            return Err(CompileError::structural(first.number, "list without a marker"));
        };

        let marker_indent = first.indent;
        let mut content_offset = marker_indent + width;
        let mut loose = false;
        let mut items: Vec<Vec<Line<'_>>> = Vec::new();
        let mut current = vec![first.slice_from(content_offset)];
        let mut j = i + 1;

        while j < lines.len() {
            let line = &lines[j];

            if line.is_blank() {
                let k = next_non_blank(lines, j);
                let Some(next) = lines.get(k) else {
                    break;
                };
                if is_sibling_marker(next, marker_indent, ordered) {
                    loose = true;
                    j = k;
                } else if next.indent > marker_indent {
                    loose = true;
                    current.extend(lines[j..k].iter().cloned());
                    j = k;
                } else {
                    break;
                }
                continue;
            }

            if let LineKind::ListMarker {
                ordered: next_ordered,
                width: next_width,
                ..
            } = line.kind
            {
                if line.indent <= marker_indent {
                    if next_ordered != ordered {
                        break;
                    }
                    items.push(std::mem::take(&mut current));
                    content_offset = line.indent + next_width;
                    current.push(line.slice_from(content_offset));
                    j += 1;
                    continue;
                }
            }

            if line.indent > marker_indent {
                current.push(line.outdent(content_offset));
            } else if line.kind.interrupts_paragraph()
                || matches!(line.kind, LineKind::SetextUnderline { .. })
            {
                break;
            } else {
                // Lazy continuation of the item's last paragraph.
                current.push(line.clone());
            }
            j += 1;
        }
        items.push(current);

        let mut list_items = Vec::with_capacity(items.len());
        for item_lines in &items {
            let span = span_of(item_lines);
            let blocks = self.parse_blocks(item_lines, depth + 1, Scope::LIST_ITEM)?;
            list_items.push(ListItem { blocks, span });
        }

        let span = Span::new(
            first.number,
            list_items.last().map_or(first.number + 1, |item| item.span.end),
        );
        blocks.push(Block::List(List {
            kind: if ordered {
                ListKind::Ordered
            } else {
                ListKind::Unordered
            },
            start: ordered.then_some(start),
            loose,
            items: list_items,
            span,
        }));
        Ok(j)
    }

    /// Parse `[label]: url "title"` into the reference table.
    fn parse_reference(&mut self, lines: &[Line<'_>], i: usize) -> Option<usize> {
        let line = &lines[i];
        let next = lines
            .get(i + 1)
            .filter(|n| !n.is_blank())
            .map(|n| n.text.as_ref());
        let parsed = parse_definition(line.content(), next)?;
        let consumed = if parsed.used_next_line { 2 } else { 1 };

        if !self.references.insert(&parsed.label, parsed.def) {
            self.record(Warning::duplicate_reference(
                &parsed.label,
                Span::new(line.number, line.number + consumed as u32),
            ));
        }
        Some(i + consumed)
    }

    fn parse_footnote_def(&mut self, lines: &[Line<'_>], i: usize, depth: usize) -> CompileResult<usize> {
        let line = &lines[i];
        let content = line.content();
        let Some(close) = content.find("]:") else {
            return Err(CompileError::structural(line.number, "footnote definition without label"));
        };
        let label = content[2..close].to_string();

        let mut body = vec![line.slice_from(line.indent + close + 2).outdent(usize::MAX)];
        let mut j = i + 1;
        while j < lines.len()
            && !lines[j].is_blank()
            && !matches!(lines[j].kind, LineKind::FootnoteDef | LineKind::RefDef)
        {
            body.push(lines[j].outdent(self.tabstop));
            j += 1;
        }
        let j = self.collect_indented(lines, j, &mut body);

        let span = span_of(&lines[i..j]);
        let blocks = self.parse_blocks(&body, depth + 1, Scope::NESTED)?;
        let def = FootnoteDef {
            label: label.clone(),
            blocks,
            span,
        };
        if !self.footnotes.insert(def) {
            self.record(Warning::duplicate_footnote(&label, span));
        }
        Ok(j)
    }

    /// Append indented lines starting at `j`, outdented by one tab stop,
    /// along with blank lines that are followed by more indented lines.
    fn collect_indented<'a>(&self, lines: &[Line<'a>], mut j: usize, out: &mut Vec<Line<'a>>) -> usize {
        while j < lines.len() {
            let line = &lines[j];
            if line.is_indented(self.tabstop) {
                out.push(line.outdent(self.tabstop));
                j += 1;
            } else if line.is_blank() {
                let k = next_non_blank(lines, j);
                match lines.get(k) {
                    Some(next) if next.is_indented(self.tabstop) => {
                        out.extend(lines[j..k].iter().cloned());
                        j = k;
                    }
                    _ => break,
                }
            } else {
                break;
            }
        }
        j
    }

    fn parse_html_block(&mut self, lines: &[Line<'_>], i: usize, blocks: &mut Vec<Block>) -> usize {
        let open = &lines[i];
        let tag = html_block_tag(open.content()).unwrap_or_default();
        let void = VOID_TAGS.contains(&tag.as_str()) || open.content().trim_end().ends_with("/>");

        let close = if tag == "!--" {
            (i..lines.len()).find(|&j| {
                let text: &str = if j == i {
                    &open.content()[4..]
                } else {
                    &lines[j].text
                };
                text.contains("-->")
            })
        } else if void {
            None
        } else {
            find_closing_tag(lines, i, &tag)
        };

        let end = match close {
            Some(c) => c + 1,
            None => {
                let end = (i..lines.len())
                    .find(|&j| lines[j].is_blank())
                    .unwrap_or(lines.len());
                if !void {
                    self.record(Warning::unclosed_html(&tag, span_of(&lines[i..end])));
                }
                end
            }
        };

        let content = lines[i..end]
            .iter()
            .map(|l| l.text.as_ref())
            .collect::<Vec<_>>()
            .join("\n");
        blocks.push(Block::Html(HtmlBlock {
            content: content.trim_end().to_string(),
            span: span_of(&lines[i..end]),
        }));
        end
    }

    fn parse_table(&mut self, lines: &[Line<'_>], i: usize, blocks: &mut Vec<Block>) -> Option<usize> {
        let header = &lines[i];
        if !header.text.contains('|') {
            return None;
        }
        let separator = lines.get(i + 1)?;
        if separator.kind != LineKind::TableSeparator || separator.is_indented(self.tabstop) {
            if looks_like_separator(separator) {
                self.record(Warning::malformed_table(span_of(&lines[i..i + 2])));
            }
            return None;
        }

        let alignments: Vec<Alignment> = split_row_cells(separator.content())
            .into_iter()
            .map(column_alignment)
            .collect();
        let columns = alignments.len();

        let mut rows = Vec::new();
        let mut j = i + 2;
        while let Some(line) = lines.get(j) {
            if line.is_blank() || line.is_indented(self.tabstop) || !line.text.contains('|') {
                break;
            }
            rows.push(table_row(line.content(), columns));
            j += 1;
        }

        blocks.push(Block::Table(Table {
            alignments,
            header: table_row(header.content(), columns),
            rows,
            span: span_of(&lines[i..j]),
        }));
        Some(j)
    }

    fn parse_definition_list(
        &mut self,
        lines: &[Line<'_>],
        i: usize,
        depth: usize,
        blocks: &mut Vec<Block>,
    ) -> CompileResult<Option<usize>> {
        let Some(mut extent) = self.definition_extent(lines, i) else {
            return Ok(None);
        };

        let mut items = Vec::new();
        let end = loop {
            let mut definitions = Vec::with_capacity(extent.bodies.len());
            for body in &extent.bodies {
                definitions.push(self.parse_blocks(body, depth + 1, Scope::NESTED)?);
            }
            items.push(DefinitionItem {
                terms: extent.terms.into_iter().map(InlineText::new).collect(),
                definitions,
            });

            let end = extent.end;
            match self.definition_extent(lines, next_non_blank(lines, end)) {
                Some(next) => extent = next,
                None => break end,
            }
        };

        blocks.push(Block::DefinitionList(DefinitionList {
            items,
            span: span_of(&lines[i..end]),
        }));
        Ok(Some(end))
    }

    /// Locate one definition list entry at `i` in either the `=term=` or the
    /// `term` / `: definition` style.
    fn definition_extent<'a>(&self, lines: &[Line<'a>], i: usize) -> Option<DefinitionExtent<'a>> {
        let first = lines.get(i)?;
        if first.is_blank() || first.is_indented(self.tabstop) {
            return None;
        }

        if discount_term(first).is_some() {
            let mut terms = Vec::new();
            let mut j = i;
            while let Some(term) = lines.get(j).and_then(discount_term) {
                terms.push(term.to_string());
                j += 1;
            }
            if !lines.get(j).is_some_and(|l| l.is_indented(self.tabstop)) {
                return None;
            }
            let mut body = Vec::new();
            let end = self.collect_indented(lines, j, &mut body);
            return Some(DefinitionExtent {
                terms,
                bodies: vec![body],
                end,
            });
        }

        let mut j = i;
        while let Some(line) = lines.get(j) {
            if line.kind != LineKind::Text || line.is_indented(self.tabstop) || self.is_extra_definition(line) {
                break;
            }
            j += 1;
        }
        if j == i || !lines.get(j).is_some_and(|l| self.is_extra_definition(l)) {
            return None;
        }
        let terms = lines[i..j].iter().map(|l| l.trimmed().to_string()).collect();

        let mut bodies = Vec::new();
        loop {
            let marker = &lines[j];
            let mut body = vec![marker.slice_from(marker.indent + 1).outdent(usize::MAX)];
            j += 1;
            while let Some(line) = lines.get(j) {
                if line.is_blank() || self.is_extra_definition(line) {
                    break;
                }
                body.push(line.outdent(self.tabstop));
                j += 1;
            }
            j = self.collect_indented(lines, j, &mut body);
            bodies.push(body);

            let k = next_non_blank(lines, j);
            match lines.get(k) {
                Some(next) if self.is_extra_definition(next) => j = k,
                _ => break,
            }
        }

        Some(DefinitionExtent {
            terms,
            bodies,
            end: j,
        })
    }

    /// A `: definition` line.
    fn is_extra_definition(&self, line: &Line<'_>) -> bool {
        !line.is_indented(self.tabstop) && line.content().starts_with(": ")
    }

    fn parse_paragraph(&mut self, lines: &[Line<'_>], i: usize, scope: Scope, blocks: &mut Vec<Block>) -> usize {
        let mut j = i + 1;
        while j < lines.len() {
            let line = &lines[j];
            if !line.is_indented(self.tabstop) {
                if let Some(level) = line.setext_level() {
                    // Only the last line is underlined; the rest stays a paragraph.
                    if j - 1 > i {
                        blocks.push(paragraph(&lines[i..j - 1]));
                    }
                    let title = &lines[j - 1];
                    blocks.push(Block::Heading(Heading {
                        level,
                        style: HeadingStyle::Setext,
                        text: InlineText::new(title.trimmed()),
                        id: None,
                        span: Span::new(title.number, line.number + 1),
                    }));
                    return j + 1;
                }
            }
            if self.ends_paragraph(lines, j, scope) {
                break;
            }
            j += 1;
        }
        blocks.push(paragraph(&lines[i..j]));
        j
    }

    fn ends_paragraph(&self, lines: &[Line<'_>], j: usize, scope: Scope) -> bool {
        let line = &lines[j];
        if line.is_indented(self.tabstop) {
            return false;
        }
        if line.kind.interrupts_paragraph() {
            return true;
        }
        match line.kind {
            LineKind::ListMarker { .. } => scope.in_list,
            LineKind::FootnoteDef => scope.top && self.config.extra_footnote,
            LineKind::RefDef => {
                let next = lines.get(j + 1).map(|n| n.text.as_ref());
                scope.top && parse_definition(line.content(), next).is_some()
            }
            _ => {
                self.config.tables()
                    && line.text.contains('|')
                    && lines
                        .get(j + 1)
                        .is_some_and(|n| n.kind == LineKind::TableSeparator)
            }
        }
    }
}

fn parse_atx_heading(line: &Line<'_>) -> Block {
    let content = line.content();
    let hashes = content.bytes().take_while(|&b| b == b'#').count();
    let level = hashes.min(6);
    let text = content[level..].trim();

    // Closing hashes are stripped when they stand apart from the title.
    let without_closing = text.trim_end_matches('#');
    let text = if without_closing.is_empty() || without_closing.ends_with(' ') {
        without_closing.trim_end()
    } else {
        text
    };

    Block::Heading(Heading {
        level: level as u8,
        style: HeadingStyle::Atx,
        text: InlineText::new(text),
        id: None,
        span: Span::line(line.number),
    })
}

fn paragraph(lines: &[Line<'_>]) -> Block {
    Block::Paragraph(Paragraph {
        text: InlineText::new(paragraph_text(lines)),
        span: span_of(lines),
    })
}

/// Join lines without their indentation. Trailing spaces are kept on inner
/// lines for hard breaks.
fn paragraph_text(lines: &[Line<'_>]) -> String {
    let mut raw = String::new();
    for (n, line) in lines.iter().filter(|l| !l.is_blank()).enumerate() {
        if n > 0 {
            raw.push('\n');
        }
        raw.push_str(line.text.trim_start());
    }
    let len = raw.trim_end().len();
    raw.truncate(len);
    raw
}

fn span_of(lines: &[Line<'_>]) -> Span {
    match (lines.first(), lines.last()) {
        (Some(first), Some(last)) => Span::new(first.number, last.number + 1),
        _ => Span::default(),
    }
}

fn next_non_blank(lines: &[Line<'_>], mut j: usize) -> usize {
    while j < lines.len() && lines[j].is_blank() {
        j += 1;
    }
    j
}

fn strip_quote_marker<'a>(line: &Line<'a>) -> Line<'a> {
    let mut byte = line.indent + 1;
    if line.text.as_bytes().get(byte) == Some(&b' ') {
        byte += 1;
    }
    line.slice_from(byte)
}

fn is_sibling_marker(line: &Line<'_>, marker_indent: usize, ordered: bool) -> bool {
    matches!(line.kind, LineKind::ListMarker { ordered: o, .. } if o == ordered)
        && line.indent <= marker_indent
}

/// Close index of the outermost `tag` opened on `lines[i]`.
fn find_closing_tag(lines: &[Line<'_>], i: usize, tag: &str) -> Option<usize> {
    let open = format!("<{}", tag);
    let close = format!("</{}", tag);
    let mut depth = 0usize;
    for (j, line) in lines.iter().enumerate().skip(i) {
        let lower = line.text.to_ascii_lowercase();
        depth += count_tag(&lower, &open);
        let closes = count_tag(&lower, &close);
        if closes >= depth {
            return Some(j);
        }
        depth -= closes;
    }
    None
}

/// Occurrences of `prefix` followed by a character that ends a tag name.
fn count_tag(text: &str, prefix: &str) -> usize {
    text.match_indices(prefix)
        .filter(|(pos, _)| {
            matches!(
                text.as_bytes().get(pos + prefix.len()),
                None | Some(b'>') | Some(b' ') | Some(b'/') | Some(b'\t')
            )
        })
        .count()
}

fn looks_like_separator(line: &Line<'_>) -> bool {
    let content = line.content();
    !line.is_blank()
        && line.kind != LineKind::TableSeparator
        && content.contains('|')
        && content.contains('-')
        && content.starts_with(['|', ':', '-'])
}

fn column_alignment(cell: &str) -> Alignment {
    let cell = cell.trim();
    match (cell.starts_with(':'), cell.ends_with(':')) {
        (true, true) => Alignment::Center,
        (true, false) => Alignment::Left,
        (false, true) => Alignment::Right,
        (false, false) => Alignment::None,
    }
}

/// Split a row into exactly `columns` trimmed cells.
fn table_row(text: &str, columns: usize) -> TableRow {
    let mut cells: Vec<InlineText> = split_row_cells(text)
        .into_iter()
        .take(columns)
        .map(|cell| InlineText::new(cell.trim()))
        .collect();
    cells.resize_with(columns, InlineText::default);
    TableRow { cells }
}

/// Term of a `=term=` line.
fn discount_term<'l>(line: &'l Line<'_>) -> Option<&'l str> {
    if line.is_blank() {
        return None;
    }
    let t = line.trimmed();
    let inner = t.strip_prefix('=')?.strip_suffix('=')?.trim();
    if inner.is_empty() || inner.bytes().all(|b| b == b'=') {
        return None;
    }
    Some(inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WarningKind;
    use crate::lexer::Lexer;

    fn parse_with(input: &str, config: &Config) -> ParseOutput {
        let lines: Vec<Line<'_>> = Lexer::new(input, config).collect();
        Parser::new(config).parse(&lines).unwrap()
    }

    fn parse(input: &str) -> ParseOutput {
        parse_with(input, &Config::default())
    }

    fn raw(block: &Block) -> &str {
        match block {
            Block::Paragraph(p) => &p.text.raw,
            Block::Heading(h) => &h.text.raw,
            other => panic!("no text in {:?}", other),
        }
    }

    #[test]
    fn test_paragraphs_split_on_blank_lines() {
        let out = parse("one\ntwo\n\nthree");
        assert_eq!(out.blocks.len(), 2);
        assert_eq!(raw(&out.blocks[0]), "one\ntwo");
        assert_eq!(out.blocks[0].span(), Span::new(0, 2));
        assert_eq!(raw(&out.blocks[1]), "three");
    }

    #[test]
    fn test_atx_heading_strips_closing_hashes() {
        let out = parse("## Title ##\n# C#");
        let Block::Heading(h) = &out.blocks[0] else {
            panic!("expected heading");
        };
        assert_eq!(h.level, 2);
        assert_eq!(h.text.raw, "Title");
        assert_eq!(raw(&out.blocks[1]), "C#");
    }

    #[test]
    fn test_setext_takes_only_last_line() {
        let out = parse("first\nsecond\n---");
        assert_eq!(out.blocks.len(), 2);
        assert_eq!(raw(&out.blocks[0]), "first");
        let Block::Heading(h) = &out.blocks[1] else {
            panic!("expected heading");
        };
        assert_eq!(h.level, 2);
        assert_eq!(h.style, HeadingStyle::Setext);
        assert_eq!(h.text.raw, "second");
    }

    #[test]
    fn test_rule_without_paragraph() {
        let out = parse("* * *\n\n---");
        assert!(matches!(out.blocks[..], [Block::Rule(_), Block::Rule(_)]));
    }

    #[test]
    fn test_indented_code_keeps_inner_blank_lines() {
        let out = parse("    a\n\n      b\n\n\npara");
        let Block::CodeBlock(code) = &out.blocks[0] else {
            panic!("expected code");
        };
        assert_eq!(code.content, "a\n\n  b\n");
        assert!(!code.fenced);
    }

    #[test]
    fn test_unclosed_fence_warns() {
        let out = parse("```rust\nfn main() {}\n");
        let Block::CodeBlock(code) = &out.blocks[0] else {
            panic!("expected code");
        };
        assert_eq!(code.lang.as_deref(), Some("rust"));
        assert_eq!(code.content, "fn main() {}\n");
        assert!(out.warnings.contains(WarningKind::UnclosedFence));
    }

    #[test]
    fn test_quote_continues_across_blank_quote_line() {
        let out = parse("> a\n\n> b\n\nafter");
        assert_eq!(out.blocks.len(), 2);
        let Block::Quote(q) = &out.blocks[0] else {
            panic!("expected quote");
        };
        assert_eq!(q.blocks.len(), 2);
        assert_eq!(q.span, Span::new(0, 3));
    }

    #[test]
    fn test_list_tight_and_loose() {
        let out = parse("* a\n* b\n");
        let Block::List(list) = &out.blocks[0] else {
            panic!("expected list");
        };
        assert!(!list.loose);
        assert_eq!(list.items.len(), 2);

        let out = parse("* a\n\n* b\n");
        let Block::List(list) = &out.blocks[0] else {
            panic!("expected list");
        };
        assert!(list.loose);
    }

    #[test]
    fn test_nested_list() {
        let out = parse("- a\n  - b\n- c");
        let Block::List(list) = &out.blocks[0] else {
            panic!("expected list");
        };
        assert_eq!(list.items.len(), 2);
        assert!(matches!(
            list.items[0].blocks[..],
            [Block::Paragraph(_), Block::List(_)]
        ));
    }

    #[test]
    fn test_marker_kind_change_ends_list() {
        let out = parse("1. a\n- b");
        assert_eq!(out.blocks.len(), 2);
        let Block::List(first) = &out.blocks[0] else {
            panic!("expected list");
        };
        assert_eq!(first.kind, ListKind::Ordered);
        assert_eq!(first.start, Some(1));
    }

    #[test]
    fn test_list_marker_does_not_interrupt_top_paragraph() {
        let out = parse("text\n- not a list");
        assert_eq!(out.blocks.len(), 1);
    }

    #[test]
    fn test_reference_definitions_are_collected() {
        let out = parse("[a]: /one \"One\"\n[A]: /two\n\ntext");
        assert_eq!(out.blocks.len(), 1);
        assert_eq!(out.references.get("a").map(|d| d.url.as_str()), Some("/one"));
        assert!(out.warnings.contains(WarningKind::DuplicateReference));
    }

    #[test]
    fn test_reference_definition_inside_quote_is_text() {
        let out = parse("> [a]: /one");
        assert!(out.references.is_empty());
    }

    #[test]
    fn test_html_block_to_closing_tag() {
        let out = parse("<div>\n\n*text*\n\n</div>\nafter");
        let Block::Html(html) = &out.blocks[0] else {
            panic!("expected html");
        };
        assert_eq!(html.content, "<div>\n\n*text*\n\n</div>");
        assert_eq!(out.blocks.len(), 2);
    }

    #[test]
    fn test_html_block_nested_same_tag() {
        let out = parse("<div>\n<div>inner</div>\n</div>");
        assert_eq!(out.blocks.len(), 1);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_unclosed_html_block_ends_at_blank() {
        let out = parse("<div>\nopen\n\npara");
        assert_eq!(out.blocks.len(), 2);
        assert!(out.warnings.contains(WarningKind::UnclosedHtml));
    }

    #[test]
    fn test_escape_html_disables_html_blocks() {
        let config = Config {
            escape_html: true,
            ..Config::default()
        };
        let out = parse_with("<div>x</div>", &config);
        assert!(matches!(out.blocks[0], Block::Paragraph(_)));
    }

    #[test]
    fn test_table_pads_and_truncates_rows() {
        let out = parse("a | b\n:-- | --:\n1 |\n1 | 2 | 3");
        let Block::Table(table) = &out.blocks[0] else {
            panic!("expected table");
        };
        assert_eq!(table.alignments, vec![Alignment::Left, Alignment::Right]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].cells.len(), 2);
        assert_eq!(table.rows[0].cells[1].raw, "");
        assert_eq!(table.rows[1].cells.len(), 2);
        assert_eq!(table.rows[1].cells[1].raw, "2");
    }

    #[test]
    fn test_malformed_table_is_paragraph() {
        let out = parse("a | b\n|---|abc|\n");
        assert!(matches!(out.blocks[0], Block::Paragraph(_)));
        assert!(out.warnings.contains(WarningKind::MalformedTable));
    }

    #[test]
    fn test_footnote_definitions_are_hoisted() {
        let config = Config {
            extra_footnote: true,
            ..Config::default()
        };
        let out = parse_with("text[^1]\n\n[^1]: note\n    more\n\n    second para", &config);
        assert_eq!(out.blocks.len(), 1);
        let def = out.footnotes.get(0).unwrap();
        assert_eq!(def.label, "1");
        assert_eq!(def.blocks.len(), 2);
    }

    #[test]
    fn test_definition_list_styles() {
        let config = Config {
            definition_lists: true,
            ..Config::default()
        };
        let out = parse_with("=apple=\n    a fruit\n=orange=\n    a colour", &config);
        let Block::DefinitionList(list) = &out.blocks[0] else {
            panic!("expected definition list");
        };
        assert_eq!(list.items.len(), 2);

        let out = parse_with("Apple\n: Pomaceous fruit\n: A company\n\nOrange\n: Citrus", &config);
        let Block::DefinitionList(list) = &out.blocks[0] else {
            panic!("expected definition list");
        };
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[0].definitions.len(), 2);
        assert_eq!(list.items[0].terms[0].raw, "Apple");
    }

    #[test]
    fn test_deep_nesting_degrades() {
        let input = ">".repeat(200) + " deep";
        let out = parse(&input);
        assert!(out.warnings.contains(WarningKind::NestingTooDeep));
    }
}
