//! HTML serializer.
//!
//! Walks a resolved block tree in document order and appends HTML to a
//! caller-supplied buffer. Top-level blocks are separated by a blank line
//! and the output carries no trailing newline.

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::ast::{
    Block, CodeBlock, DefinitionList, Heading, Inline, List, ListKind, Table, TableRow,
};
use crate::config::Config;
use crate::inline::PSEUDO_PROTOCOLS;
use crate::refs::FootnoteTable;

/// Append `text` with `&`, `<`, `>` and `"` escaped. An `&` that already
/// starts an entity is kept as is.
pub fn escape_into(out: &mut String, text: &str) {
    let bytes = text.as_bytes();
    let mut last = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let replacement = match b {
            b'&' if !starts_entity(&bytes[i + 1..]) => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'"' => "&quot;",
            _ => continue,
        };
        out.push_str(&text[last..i]);
        out.push_str(replacement);
        last = i + 1;
    }
    out.push_str(&text[last..]);
}

/// Escaped copy of `text`.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_into(&mut out, text);
    out
}

/// Whether the bytes after an `&` form `name;`, `#123;` or `#x1F;`.
fn starts_entity(rest: &[u8]) -> bool {
    let (start, valid): (usize, fn(&u8) -> bool) = match rest.first() {
        Some(b'#') => match rest.get(1) {
            Some(b'x') | Some(b'X') => (2, u8::is_ascii_hexdigit),
            _ => (1, u8::is_ascii_digit),
        },
        Some(c) if c.is_ascii_alphabetic() => (0, u8::is_ascii_alphanumeric),
        _ => return false,
    };
    let len = rest[start..].iter().take_while(|b| valid(b)).count();
    len > 0 && rest.get(start + len) == Some(&b';')
}

/// Encode every character of `text` as a numeric entity, alternating
/// decimal and hexadecimal forms.
pub fn obfuscate_into(out: &mut String, text: &str) {
    for (i, c) in text.chars().enumerate() {
        let _ = if i % 2 == 0 {
            write!(out, "&#{};", c as u32)
        } else {
            write!(out, "&#x{:x};", c as u32)
        };
    }
}

/// Wrap `html` in a CDATA section, splitting any `]]>` it contains.
pub fn wrap_cdata(html: &str) -> String {
    let mut out = String::with_capacity(html.len() + 12);
    out.push_str("<![CDATA[");
    out.push_str(&html.replace("]]>", "]]]]><![CDATA[>"));
    out.push_str("]]>");
    out
}

/// Anchor slug for a header's text.
///
/// Lowercase alphanumerics are kept, every other run of characters becomes
/// one hyphen, and leading or trailing hyphens are dropped. Text with no
/// alphanumerics yields `section`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("section");
    }
    slug
}

/// Hands out slugs unique within one document.
#[derive(Debug, Default)]
pub struct Slugs {
    used: HashSet<String>,
}

impl Slugs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slug for `text`, suffixed `-1`, `-2`, ... when already taken.
    pub fn unique(&mut self, text: &str) -> String {
        let base = slugify(text);
        if self.used.insert(base.clone()) {
            return base;
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}-{}", base, n);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Give every heading an id, in document order.
pub fn assign_header_ids(blocks: &mut [Block], slugs: &mut Slugs) {
    for block in blocks {
        match block {
            Block::Heading(h) => h.id = Some(slugs.unique(&h.text.plain_text())),
            Block::Quote(q) => assign_header_ids(&mut q.blocks, slugs),
            Block::List(list) => {
                for item in &mut list.items {
                    assign_header_ids(&mut item.blocks, slugs);
                }
            }
            Block::DefinitionList(list) => {
                for definition in list.items.iter_mut().flat_map(|i| i.definitions.iter_mut()) {
                    assign_header_ids(definition, slugs);
                }
            }
            _ => {}
        }
    }
}

/// Appends HTML for blocks and inlines to a buffer.
pub struct HtmlRenderer<'a> {
    config: &'a Config,
    out: &'a mut String,
}

impl<'a> HtmlRenderer<'a> {
    pub fn new(config: &'a Config, out: &'a mut String) -> Self {
        Self { config, out }
    }

    /// Render a top-level block sequence.
    pub fn render_blocks(&mut self, blocks: &[Block]) {
        self.blocks(blocks, "\n\n");
    }

    /// Render the footnote section for the definitions in `order`, a list
    /// of indices into `table` in order of first reference.
    pub fn render_footnotes(&mut self, table: &FootnoteTable, order: &[usize]) {
        if order.is_empty() {
            return;
        }
        if !self.out.is_empty() {
            self.out.push_str("\n\n");
        }
        self.out.push_str("<div class=\"footnotes\">\n<hr/>\n<ol>\n");
        for (i, def) in order.iter().filter_map(|&idx| table.get(idx)).enumerate() {
            let number = i + 1;
            let _ = write!(self.out, "<li id=\"fn:{}\">\n", number);
            let backref = format!("<a href=\"#fnref:{}\" rev=\"footnote\">&#8617;</a>", number);

            match def.blocks.split_last() {
                Some((Block::Paragraph(last), rest)) => {
                    self.blocks(rest, "\n\n");
                    if !rest.is_empty() {
                        self.out.push_str("\n\n");
                    }
                    self.out.push_str("<p>");
                    self.inlines(&last.text.content);
                    self.out.push_str(&backref);
                    self.out.push_str("</p>");
                }
                Some(_) => {
                    self.blocks(&def.blocks, "\n\n");
                    self.out.push_str(&backref);
                }
                None => self.out.push_str(&backref),
            }
            self.out.push_str("</li>\n");
        }
        self.out.push_str("</ol>\n</div>");
    }

    fn blocks(&mut self, blocks: &[Block], separator: &str) {
        for (i, block) in blocks.iter().enumerate() {
            if i > 0 {
                self.out.push_str(separator);
            }
            self.block(block);
        }
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Paragraph(p) => {
                self.out.push_str("<p>");
                self.inlines(&p.text.content);
                self.out.push_str("</p>");
            }
            Block::Heading(h) => self.heading(h),
            Block::Quote(q) => {
                self.out.push_str("<blockquote>");
                self.blocks(&q.blocks, "\n\n");
                self.out.push_str("</blockquote>");
            }
            Block::List(list) => self.list(list),
            Block::CodeBlock(code) => self.code_block(code),
            Block::Table(table) => self.table(table),
            Block::Rule(_) => self.out.push_str("<hr />"),
            Block::Html(html) => {
                if self.config.escape_html {
                    escape_into(self.out, &html.content);
                } else {
                    self.out.push_str(&html.content);
                }
            }
            Block::DefinitionList(list) => self.definition_list(list),
        }
    }

    fn heading(&mut self, heading: &Heading) {
        let _ = write!(self.out, "<h{}", heading.level);
        if let Some(id) = &heading.id {
            self.out.push_str(" id=\"");
            escape_into(self.out, id);
            self.out.push('"');
        }
        self.out.push('>');
        self.inlines(&heading.text.content);
        let _ = write!(self.out, "</h{}>", heading.level);
    }

    fn list(&mut self, list: &List) {
        match (list.kind, list.start) {
            (ListKind::Unordered, _) => self.out.push_str("<ul>\n"),
            (ListKind::Ordered, Some(start)) if start != 1 => {
                let _ = write!(self.out, "<ol start=\"{}\">\n", start);
            }
            (ListKind::Ordered, _) => self.out.push_str("<ol>\n"),
        }

        for item in &list.items {
            self.out.push_str("<li>");
            if list.loose {
                self.blocks(&item.blocks, "\n\n");
            } else {
                self.tight_blocks(&item.blocks);
            }
            self.out.push_str("</li>\n");
        }

        self.out.push_str(match list.kind {
            ListKind::Unordered => "</ul>",
            ListKind::Ordered => "</ol>",
        });
    }

    /// Blocks of a tight list item: paragraphs lose their `<p>` wrapper.
    fn tight_blocks(&mut self, blocks: &[Block]) {
        for (i, block) in blocks.iter().enumerate() {
            if i > 0 {
                self.out.push('\n');
            }
            match block {
                Block::Paragraph(p) => self.inlines(&p.text.content),
                other => self.block(other),
            }
        }
    }

    fn code_block(&mut self, code: &CodeBlock) {
        self.out.push_str("<pre><code");
        if let Some(lang) = &code.lang {
            self.out.push_str(" class=\"");
            html_escape::encode_double_quoted_attribute_to_string(lang, self.out);
            self.out.push('"');
        }
        self.out.push('>');
        html_escape::encode_text_to_string(&code.content, self.out);
        self.out.push_str("</code></pre>");
    }

    fn table(&mut self, table: &Table) {
        self.out.push_str("<table>\n<thead>\n");
        self.table_row(&table.header, table, "th");
        self.out.push_str("</thead>\n<tbody>\n");
        for row in &table.rows {
            self.table_row(row, table, "td");
        }
        self.out.push_str("</tbody>\n</table>");
    }

    fn table_row(&mut self, row: &TableRow, table: &Table, tag: &str) {
        self.out.push_str("<tr>\n");
        for (i, cell) in row.cells.iter().enumerate() {
            let align = table.alignments.get(i).and_then(|a| a.as_attr());
            match align {
                Some(align) => {
                    let _ = write!(self.out, "<{} align=\"{}\">", tag, align);
                }
                None => {
                    let _ = write!(self.out, "<{}>", tag);
                }
            }
            self.inlines(&cell.content);
            let _ = write!(self.out, "</{}>\n", tag);
        }
        self.out.push_str("</tr>\n");
    }

    fn definition_list(&mut self, list: &DefinitionList) {
        self.out.push_str("<dl>\n");
        for item in &list.items {
            for term in &item.terms {
                self.out.push_str("<dt>");
                self.inlines(&term.content);
                self.out.push_str("</dt>\n");
            }
            for definition in &item.definitions {
                self.out.push_str("<dd>");
                match definition.as_slice() {
                    [Block::Paragraph(p)] => self.inlines(&p.text.content),
                    blocks => self.blocks(blocks, "\n\n"),
                }
                self.out.push_str("</dd>\n");
            }
        }
        self.out.push_str("</dl>");
    }

    fn inlines(&mut self, inlines: &[Inline]) {
        for inline in inlines {
            self.inline(inline);
        }
    }

    fn wrapped(&mut self, tag: &str, children: &[Inline]) {
        let _ = write!(self.out, "<{}>", tag);
        self.inlines(children);
        let _ = write!(self.out, "</{}>", tag);
    }

    fn inline(&mut self, inline: &Inline) {
        match inline {
            Inline::Text(text) => escape_into(self.out, text),
            Inline::Emphasis(children) => self.wrapped("em", children),
            Inline::Strong(children) => self.wrapped("strong", children),
            Inline::Strikethrough(children) => self.wrapped("del", children),
            Inline::Superscript(children) => self.wrapped("sup", children),
            Inline::Code(code) => {
                self.out.push_str("<code>");
                html_escape::encode_text_to_string(code, self.out);
                self.out.push_str("</code>");
            }
            Inline::Link(link) => {
                if self.config.remove_links {
                    self.inlines(&link.children);
                    return;
                }
                if self.config.pseudoprotocols && self.pseudo_link(&link.url, &link.children) {
                    return;
                }
                self.out.push_str("<a href=\"");
                escape_into(self.out, &link.url);
                self.out.push('"');
                self.title(link.title.as_deref());
                self.out.push('>');
                self.inlines(&link.children);
                self.out.push_str("</a>");
            }
            Inline::Image(image) => {
                if self.config.remove_images {
                    escape_into(self.out, &image.alt);
                    return;
                }
                self.out.push_str("<img src=\"");
                escape_into(self.out, &image.url);
                self.out.push('"');
                self.title(image.title.as_deref());
                self.out.push_str(" alt=\"");
                escape_into(self.out, &image.alt);
                self.out.push_str("\" />");
            }
            Inline::AutoLink(link) => {
                if self.config.remove_links {
                    escape_into(self.out, &link.text);
                } else if link.email {
                    self.out.push_str("<a href=\"");
                    obfuscate_into(self.out, &link.url);
                    self.out.push_str("\">");
                    obfuscate_into(self.out, &link.text);
                    self.out.push_str("</a>");
                } else {
                    self.out.push_str("<a href=\"");
                    escape_into(self.out, &link.url);
                    self.out.push_str("\">");
                    escape_into(self.out, &link.text);
                    self.out.push_str("</a>");
                }
            }
            Inline::Html(html) => self.out.push_str(html),
            Inline::LineBreak => self.out.push_str("<br/>"),
            Inline::Smart(kind) => self.out.push_str(kind.entity()),
            Inline::FootnoteRef(r) => {
                let _ = write!(
                    self.out,
                    "<sup id=\"fnref:{n}\"><a href=\"#fn:{n}\" rel=\"footnote\">{n}</a></sup>",
                    n = r.number
                );
            }
        }
    }

    fn title(&mut self, title: Option<&str>) {
        if let Some(title) = title {
            self.out.push_str(" title=\"");
            escape_into(self.out, title);
            self.out.push('"');
        }
    }

    /// Render `abbr:`, `class:`, `id:`, `lang:` and `raw:` targets. Returns
    /// `false` when `url` is an ordinary link.
    fn pseudo_link(&mut self, url: &str, children: &[Inline]) -> bool {
        let Some(protocol) = PSEUDO_PROTOCOLS.iter().find(|p| url.starts_with(**p)) else {
            return false;
        };
        let value = &url[protocol.len()..];
        let (tag, attr) = match *protocol {
            "raw:" => {
                if self.config.escape_html {
                    escape_into(self.out, value);
                } else {
                    self.out.push_str(value);
                }
                return true;
            }
            "abbr:" => ("abbr", "title"),
            "class:" => ("span", "class"),
            "id:" => ("span", "id"),
            _ => ("span", "lang"),
        };
        let _ = write!(self.out, "<{} {}=\"", tag, attr);
        escape_into(self.out, value);
        self.out.push_str("\">");
        self.inlines(children);
        let _ = write!(self.out, "</{}>", tag);
        true
    }
}

/// Headings with an id in document order, including those inside quotes,
/// lists and definitions.
fn collect_headings<'b>(blocks: &'b [Block], out: &mut Vec<&'b Heading>) {
    for block in blocks {
        match block {
            Block::Heading(h) if h.id.is_some() => out.push(h),
            Block::Quote(q) => collect_headings(&q.blocks, out),
            Block::List(list) => {
                for item in &list.items {
                    collect_headings(&item.blocks, out);
                }
            }
            Block::DefinitionList(list) => {
                for definition in list.items.iter().flat_map(|i| i.definitions.iter()) {
                    collect_headings(definition, out);
                }
            }
            _ => {}
        }
    }
}

/// Nested `<ul>` of links to every heading that has an id.
pub fn table_of_contents(blocks: &[Block], config: &Config) -> String {
    let mut out = String::new();
    let mut levels: Vec<u8> = Vec::new();
    let mut headings = Vec::new();
    collect_headings(blocks, &mut headings);

    for heading in headings {
        let level = heading.level;
        match levels.last().copied() {
            None => {
                out.push_str("<ul>\n<li>");
                levels.push(level);
            }
            Some(last) if level > last => {
                out.push_str("\n<ul>\n<li>");
                levels.push(level);
            }
            Some(_) => {
                out.push_str("</li>\n");
                while levels.len() > 1 && levels[levels.len() - 2] >= level {
                    levels.pop();
                    out.push_str("</ul>\n</li>\n");
                }
                if let Some(top) = levels.last_mut() {
                    *top = (*top).min(level);
                }
                out.push_str("<li>");
            }
        }

        out.push_str("<a href=\"#");
        escape_into(&mut out, heading.id.as_deref().unwrap_or_default());
        out.push_str("\">");
        HtmlRenderer::new(config, &mut out).inlines(&heading.text.content);
        out.push_str("</a>");
    }

    while levels.pop().is_some() {
        out.push_str("</li>\n</ul>");
        if !levels.is_empty() {
            out.push('\n');
        }
    }
    out
}
