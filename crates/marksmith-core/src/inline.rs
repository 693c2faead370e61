//! Inline parser.
//!
//! Greedy, left-to-right scanning over a block's raw text. Constructs with a
//! fixed closer (code spans, links, autolinks, strikethrough) are matched by
//! searching forward from the opener; emphasis delimiters are collected as
//! tokens and paired afterwards on a delimiter stack.
//!
//! Unresolved constructs are never errors: the opening character stays in the
//! output as literal text and scanning resumes right after it.

use memchr::memchr;

use crate::ast::{AutoLink, Block, FootnoteRef, Image, Inline, InlineText, Link, SmartKind};
use crate::config::Config;
use crate::refs::{FootnoteTable, ReferenceTable};

/// Link texts and emphasis nested deeper than this are kept as literal text.
const MAX_DEPTH: usize = 32;

/// Reference labels longer than this are never looked up.
const MAX_LABEL: usize = 999;

/// Characters a backslash makes literal.
const ESCAPABLE: &[u8] = b"\\`*_{}[]()#+-.!><~^|\"'";

/// URL schemes allowed under safelink and linked as bare URLs.
const SAFE_SCHEMES: &[&str] = &["http", "https", "ftp", "ftps", "mailto", "news"];

/// Link targets that expand to markup instead of an anchor.
pub const PSEUDO_PROTOCOLS: &[&str] = &["abbr:", "class:", "id:", "lang:", "raw:"];

static SPECIAL: [bool; 256] = {
    let mut table = [false; 256];
    let chars = b"\\`*_[!<~^\n\"'-.(:";
    let mut i = 0;
    while i < chars.len() {
        table[chars[i] as usize] = true;
        i += 1;
    }
    table
};

/// Numbering state for footnote references.
#[derive(Debug)]
pub struct FootnoteState<'c> {
    table: &'c FootnoteTable,
    /// Definition indices in order of first reference.
    used: &'c mut Vec<usize>,
}

impl<'c> FootnoteState<'c> {
    pub fn new(table: &'c FootnoteTable, used: &'c mut Vec<usize>) -> Self {
        Self { table, used }
    }

    /// Number for a first reference to `label`. Undefined labels and repeat
    /// references get `None`.
    fn reference(&mut self, label: &str) -> Option<usize> {
        let index = self.table.index_of(label)?;
        if self.used.contains(&index) {
            return None;
        }
        self.used.push(index);
        Some(self.used.len())
    }
}

/// Everything inline parsing reads, plus footnote numbering.
#[derive(Debug)]
pub struct InlineContext<'c> {
    pub config: &'c Config,
    pub references: &'c ReferenceTable,
    /// `None` when footnote references are not recognized.
    pub footnotes: Option<FootnoteState<'c>>,
}

/// Fill in the parsed content of every text-bearing block.
pub fn resolve_blocks(blocks: &mut [Block], ctx: &mut InlineContext<'_>) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => resolve_text(&mut p.text, ctx),
            Block::Heading(h) => resolve_text(&mut h.text, ctx),
            Block::Quote(q) => resolve_blocks(&mut q.blocks, ctx),
            Block::List(list) => {
                for item in &mut list.items {
                    resolve_blocks(&mut item.blocks, ctx);
                }
            }
            Block::Table(table) => {
                for cell in &mut table.header.cells {
                    resolve_text(cell, ctx);
                }
                for row in &mut table.rows {
                    for cell in &mut row.cells {
                        resolve_text(cell, ctx);
                    }
                }
            }
            Block::DefinitionList(list) => {
                for item in &mut list.items {
                    for term in &mut item.terms {
                        resolve_text(term, ctx);
                    }
                    for definition in &mut item.definitions {
                        resolve_blocks(definition, ctx);
                    }
                }
            }
            Block::CodeBlock(_) | Block::Rule(_) | Block::Html(_) => {}
        }
    }
}

#[inline]
fn resolve_text(text: &mut InlineText, ctx: &mut InlineContext<'_>) {
    text.content = parse_inlines(&text.raw, ctx);
}

/// Parse inline elements from a block's raw text.
pub fn parse_inlines(text: &str, ctx: &mut InlineContext<'_>) -> Vec<Inline> {
    if text.is_empty() {
        return Vec::new();
    }
    InlineParser::new(text, ctx, 0, false).parse()
}

/// Remove backslashes in front of escapable characters.
pub fn unescape(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'\\' && ESCAPABLE.contains(&bytes[i + 1]) {
            out.push_str(&text[last..i]);
            last = i + 1;
            i += 2;
        } else {
            i += 1;
        }
    }
    out.push_str(&text[last..]);
    out
}

/// Scheme of `url`, if it has one.
fn scheme(url: &str) -> Option<&str> {
    let colon = url.find(':')?;
    let candidate = &url[..colon];
    let mut chars = candidate.chars();
    let first = chars.next()?;
    (first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')))
    .then_some(candidate)
}

/// Whether `url` may be linked under safelink.
pub fn is_safe_url(url: &str, config: &Config) -> bool {
    match scheme(url) {
        None => true,
        Some(s) => {
            let s = s.to_ascii_lowercase();
            SAFE_SCHEMES.contains(&s.as_str())
                || (config.pseudoprotocols
                    && PSEUDO_PROTOCOLS.iter().any(|p| p[..p.len() - 1] == s))
        }
    }
}

/// A delimiter run waiting to be paired.
#[derive(Debug, Clone, Copy)]
struct Delim {
    ch: u8,
    count: usize,
    can_open: bool,
    can_close: bool,
}

impl Delim {
    fn literal(&self) -> Inline {
        Inline::Text(char::from(self.ch).to_string().repeat(self.count))
    }
}

#[derive(Debug)]
enum Tok {
    Node(Inline),
    Delim(Delim),
}

/// Append, merging adjacent text.
fn push_inline(out: &mut Vec<Inline>, node: Inline) {
    if let Inline::Text(next) = &node {
        if let Some(Inline::Text(prev)) = out.last_mut() {
            prev.push_str(next);
            return;
        }
    }
    out.push(node);
}

type Frame = (Delim, Vec<Inline>);

fn top<'v>(stack: &'v mut Vec<Frame>, root: &'v mut Vec<Inline>) -> &'v mut Vec<Inline> {
    match stack.last_mut() {
        Some((_, children)) => children,
        None => root,
    }
}

/// Pop every frame above `keep`, turning its opener back into text.
fn unwind(stack: &mut Vec<Frame>, root: &mut Vec<Inline>, keep: usize) {
    while stack.len() > keep {
        let Some((delim, children)) = stack.pop() else {
            break;
        };
        let target = top(stack, root);
        push_inline(target, delim.literal());
        for child in children {
            push_inline(target, child);
        }
    }
}

/// Pair `*` and `_` runs into emphasis. Runs of two or more on both sides
/// make strong emphasis; what is left over stays literal, as does any
/// opener past `MAX_DEPTH` open frames.
fn resolve_emphasis(tokens: Vec<Tok>) -> Vec<Inline> {
    let mut root = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    for token in tokens {
        match token {
            Tok::Node(node) => push_inline(top(&mut stack, &mut root), node),
            Tok::Delim(mut closer) => {
                while closer.can_close && closer.count > 0 {
                    let Some(index) = stack.iter().rposition(|(d, _)| d.ch == closer.ch) else {
                        break;
                    };
                    unwind(&mut stack, &mut root, index + 1);
                    let Some((mut opener, children)) = stack.pop() else {
                        break;
                    };

                    let used = if opener.count >= 2 && closer.count >= 2 { 2 } else { 1 };
                    opener.count -= used;
                    closer.count -= used;
                    let node = if used == 2 {
                        Inline::Strong(children)
                    } else {
                        Inline::Emphasis(children)
                    };

                    if opener.count > 0 {
                        stack.push((opener, vec![node]));
                    } else {
                        push_inline(top(&mut stack, &mut root), node);
                    }
                }

                if closer.count > 0 {
                    if closer.can_open && stack.len() < MAX_DEPTH {
                        stack.push((closer, Vec::new()));
                    } else {
                        push_inline(top(&mut stack, &mut root), closer.literal());
                    }
                }
            }
        }
    }

    unwind(&mut stack, &mut root, 0);
    root
}

struct InlineParser<'t, 'x, 'c> {
    text: &'t str,
    bytes: &'t [u8],
    pos: usize,
    /// Start of pending literal text.
    text_start: usize,
    depth: usize,
    /// Inside link text, where bare URLs are not linked again.
    in_link: bool,
    ctx: &'x mut InlineContext<'c>,
    tokens: Vec<Tok>,
    /// Matched `[`/`]` offsets, sorted by opener.
    brackets: Vec<(usize, usize)>,
}

impl<'t, 'x, 'c> InlineParser<'t, 'x, 'c> {
    fn new(text: &'t str, ctx: &'x mut InlineContext<'c>, depth: usize, in_link: bool) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            text_start: 0,
            depth,
            in_link,
            ctx,
            tokens: Vec::with_capacity(8),
            brackets: match_brackets(text.as_bytes()),
        }
    }

    fn parse(mut self) -> Vec<Inline> {
        while self.pos < self.bytes.len() {
            let next_special = self.find_next_special();
            if next_special >= self.bytes.len() {
                break;
            }

            self.pos = next_special;
            let config = self.ctx.config;
            let parsed = match self.bytes[self.pos] {
                b'\\' => self.try_parse_escape(),
                b'`' => self.try_parse_code_span(),
                b'*' | b'_' => self.try_parse_delimiter(),
                b'[' => self.try_parse_bracket(),
                b'!' => self.try_parse_image(),
                b'<' => self.try_parse_angle(),
                b'~' if config.strikethrough() => self.try_parse_strikethrough(),
                b'^' if !config.strict_mode => self.try_parse_superscript(),
                b'\n' => self.try_parse_line_break(),
                b':' if config.autolink && !self.in_link => self.try_parse_bare_url(),
                b'"' | b'\'' if config.smartypants => self.try_parse_quote(),
                b'-' if config.smartypants => self.try_parse_dash(),
                b'.' if config.smartypants => self.try_parse_ellipsis(),
                b'(' if config.smartypants => self.try_parse_symbol(),
                _ => false,
            };

            if !parsed {
                self.pos += 1;
            }
        }

        self.pos = self.bytes.len();
        self.flush_text();
        resolve_emphasis(self.tokens)
    }

    #[inline(always)]
    fn find_next_special(&self) -> usize {
        self.bytes[self.pos..]
            .iter()
            .position(|&b| SPECIAL[b as usize])
            .map_or(self.bytes.len(), |offset| self.pos + offset)
    }

    #[inline]
    fn flush_text(&mut self) {
        if self.text_start < self.pos {
            let text = self.text[self.text_start..self.pos].to_string();
            self.tokens.push(Tok::Node(Inline::Text(text)));
        }
        self.text_start = self.pos;
    }

    /// Emit `node` for the source ending at `end`.
    #[inline]
    fn push_node(&mut self, node: Inline, end: usize) {
        self.flush_text();
        self.tokens.push(Tok::Node(node));
        self.pos = end;
        self.text_start = end;
    }

    /// Parse a nested run of text, such as link text.
    fn parse_nested(&mut self, text: &str, in_link: bool) -> Vec<Inline> {
        if self.depth >= MAX_DEPTH {
            return vec![Inline::Text(text.to_string())];
        }
        InlineParser::new(text, self.ctx, self.depth + 1, in_link || self.in_link).parse()
    }

    #[inline]
    fn prev_char(&self, pos: usize) -> Option<char> {
        self.text[..pos].chars().next_back()
    }

    #[inline]
    fn next_char(&self, pos: usize) -> Option<char> {
        self.text.get(pos..).and_then(|s| s.chars().next())
    }

    fn run_length(&self, pos: usize, ch: u8) -> usize {
        self.bytes[pos..].iter().take_while(|&&b| b == ch).count()
    }

    fn try_parse_escape(&mut self) -> bool {
        match self.bytes.get(self.pos + 1) {
            Some(&b) if ESCAPABLE.contains(&b) => {
                let literal = Inline::Text(char::from(b).to_string());
                self.push_node(literal, self.pos + 2);
                true
            }
            _ => false,
        }
    }

    fn try_parse_code_span(&mut self) -> bool {
        let start = self.pos;
        let run = self.run_length(start, b'`');
        let mut search = start + run;

        while let Some(offset) = memchr(b'`', &self.bytes[search..]) {
            let close = search + offset;
            let close_run = self.run_length(close, b'`');
            if close_run == run {
                let content = self.text[start + run..close].trim().to_string();
                self.push_node(Inline::Code(content), close + run);
                return true;
            }
            search = close + close_run;
        }

        // An unmatched run stays literal as a whole.
        self.pos += run;
        true
    }

    fn try_parse_delimiter(&mut self) -> bool {
        let ch = self.bytes[self.pos];
        let count = self.run_length(self.pos, ch);
        let prev = self.prev_char(self.pos);
        let next = self.next_char(self.pos + count);

        let mut can_open = next.is_some_and(|c| !c.is_whitespace());
        let mut can_close = prev.is_some_and(|c| !c.is_whitespace());
        if ch == b'_' && self.ctx.config.strict_mode {
            can_open &= !prev.is_some_and(char::is_alphanumeric);
            can_close &= !next.is_some_and(char::is_alphanumeric);
        }

        if !can_open && !can_close {
            self.pos += count;
            return true;
        }

        self.flush_text();
        self.tokens.push(Tok::Delim(Delim {
            ch,
            count,
            can_open,
            can_close,
        }));
        self.pos += count;
        self.text_start = self.pos;
        true
    }

    /// Index of the `]` matching the `[` at `open`.
    fn find_matching_bracket(&self, open: usize) -> Option<usize> {
        self.brackets
            .binary_search_by_key(&open, |&(start, _)| start)
            .ok()
            .map(|index| self.brackets[index].1)
    }

    fn try_parse_bracket(&mut self) -> bool {
        if self.bytes.get(self.pos + 1) == Some(&b'^') && self.try_parse_footnote_ref() {
            return true;
        }
        self.try_parse_link(false)
    }

    fn try_parse_image(&mut self) -> bool {
        if self.bytes.get(self.pos + 1) != Some(&b'[') {
            return false;
        }
        self.pos += 1;
        if self.try_parse_link(true) {
            return true;
        }
        self.pos -= 1;
        false
    }

    fn try_parse_footnote_ref(&mut self) -> bool {
        let start = self.pos;
        let Some(close) = self.find_matching_bracket(start) else {
            return false;
        };
        let label = &self.text[start + 2..close];
        if label.is_empty() || label.contains(|c: char| c.is_whitespace() || c == '[') {
            return false;
        }

        let Some(footnotes) = self.ctx.footnotes.as_mut() else {
            return false;
        };
        let Some(number) = footnotes.reference(label) else {
            return false;
        };
        let node = Inline::FootnoteRef(FootnoteRef {
            label: label.to_string(),
            number,
        });
        self.push_node(node, close + 1);
        true
    }

    /// Parse `[text](url "title")` or one of the reference forms with the
    /// `[` at `self.pos`. An `!` before it has already been consumed when
    /// `image` is set.
    fn try_parse_link(&mut self, image: bool) -> bool {
        let source = self.text;
        let open = self.pos;
        let Some(close) = self.find_matching_bracket(open) else {
            return false;
        };
        let text = &source[open + 1..close];

        let target = if self.bytes.get(close + 1) == Some(&b'(') {
            self.parse_inline_target(close + 1)
        } else {
            None
        };
        let (url, title, end) = match target {
            Some(target) => target,
            None => match self.parse_reference_target(text, close) {
                Some(target) => target,
                None => return false,
            },
        };

        if self.ctx.config.safelink && !is_safe_url(&url, self.ctx.config) {
            return false;
        }

        let start = if image { open - 1 } else { open };
        let node = if image {
            Inline::Image(Image {
                alt: unescape(text),
                url,
                title,
            })
        } else {
            let children = self.parse_nested(text, true);
            Inline::Link(Link {
                children,
                url,
                title,
            })
        };

        self.pos = start;
        self.push_node(node, end);
        true
    }

    /// `(url "title")` starting at the `(` at `paren`.
    fn parse_inline_target(&self, paren: usize) -> Option<(String, Option<String>, usize)> {
        let bytes = self.bytes;
        let mut i = paren + 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let url = if bytes.get(i) == Some(&b'<') {
            let end = i + 1 + memchr(b'>', &bytes[i + 1..])?;
            let url = &self.text[i + 1..end];
            i = end + 1;
            url
        } else {
            let start = i;
            while i < bytes.len() {
                match bytes[i] {
                    b'\\' => i += 1,
                    b')' => break,
                    b if b.is_ascii_whitespace() => break,
                    _ => {}
                }
                i += 1;
            }
            &self.text[start..i.min(bytes.len())]
        };

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        match *bytes.get(i)? {
            b')' => Some((unescape(url), None, i + 1)),
            quote @ (b'"' | b'\'' | b'(') => {
                let closer = if quote == b'(' { b')' } else { quote };
                let title_start = i + 1;
                let mut j = title_start;
                while j < bytes.len() {
                    if bytes[j] == closer {
                        let mut k = j + 1;
                        while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                            k += 1;
                        }
                        if bytes.get(k) == Some(&b')') {
                            let title = unescape(&self.text[title_start..j]);
                            return Some((unescape(url), Some(title), k + 1));
                        }
                    }
                    j += 1;
                }
                None
            }
            _ => None,
        }
    }

    /// `[label]`, `[]` or nothing after the link text at `close`.
    fn parse_reference_target(&self, text: &str, close: usize) -> Option<(String, Option<String>, usize)> {
        let mut label_open = close + 1;
        if matches!(self.bytes.get(label_open), Some(b' ') | Some(b'\n'))
            && self.bytes.get(label_open + 1) == Some(&b'[')
        {
            label_open += 1;
        }

        let (label, end) = if self.bytes.get(label_open) == Some(&b'[') {
            match self.find_matching_bracket(label_open) {
                Some(label_close) => {
                    let label = &self.text[label_open + 1..label_close];
                    let label = if label.trim().is_empty() { text } else { label };
                    (label, label_close + 1)
                }
                None => (text, close + 1),
            }
        } else {
            (text, close + 1)
        };

        if label.len() > MAX_LABEL || self.ctx.references.is_empty() {
            return None;
        }
        let def = self.ctx.references.get(label)?;
        Some((def.url.clone(), def.title.clone(), end))
    }

    fn try_parse_angle(&mut self) -> bool {
        let start = self.pos;
        let rest = &self.text[start + 1..];
        let config = self.ctx.config;

        if rest.starts_with("!--") {
            if config.escape_html {
                return false;
            }
            let Some(offset) = rest[3..].find("-->") else {
                return false;
            };
            let end = start + 1 + 3 + offset + 3;
            let raw = self.text[start..end].to_string();
            self.push_node(Inline::Html(raw), end);
            return true;
        }

        let Some(close) = memchr(b'>', rest.as_bytes()) else {
            return false;
        };
        let inner = &rest[..close];
        let end = start + 1 + close + 1;

        if !inner.is_empty() && !inner.contains(|c: char| c.is_whitespace() || c == '<') {
            if let Some(scheme) = scheme(inner) {
                if inner.len() > scheme.len() + 1 {
                    if config.safelink && !is_safe_url(inner, config) {
                        return false;
                    }
                    let email = scheme.eq_ignore_ascii_case("mailto");
                    let text = if email { &inner[scheme.len() + 1..] } else { inner };
                    let node = Inline::AutoLink(AutoLink {
                        url: inner.to_string(),
                        text: text.to_string(),
                        email,
                    });
                    self.push_node(node, end);
                    return true;
                }
            } else if is_email(inner) {
                let node = Inline::AutoLink(AutoLink {
                    url: format!("mailto:{}", inner),
                    text: inner.to_string(),
                    email: true,
                });
                self.push_node(node, end);
                return true;
            }
        }

        if config.escape_html {
            return false;
        }
        let name = tag_name(inner);
        if name.is_empty()
            || (config.remove_links && name.eq_ignore_ascii_case("a"))
            || (config.remove_images && name.eq_ignore_ascii_case("img"))
        {
            return false;
        }
        let raw = self.text[start..end].to_string();
        self.push_node(Inline::Html(raw), end);
        true
    }

    fn try_parse_strikethrough(&mut self) -> bool {
        let source = self.text;
        let start = self.pos;
        let run = self.run_length(start, b'~');
        if run < 2 {
            return false;
        }

        let mut search = start + run;
        while let Some(offset) = memchr(b'~', &self.bytes[search..]) {
            let close = search + offset;
            let close_run = self.run_length(close, b'~');
            let after_space = self.prev_char(close).is_some_and(char::is_whitespace);
            if close_run >= 2 && !after_space {
                let used = run.min(close_run);
                let inner = &source[start + used..close];
                let children = self.parse_nested(inner, false);
                self.push_node(Inline::Strikethrough(children), close + used);
                return true;
            }
            search = close + close_run;
        }

        self.pos += run;
        true
    }

    fn try_parse_superscript(&mut self) -> bool {
        let source = self.text;
        let start = self.pos;
        if !self.prev_char(start).is_some_and(|c| !c.is_whitespace()) {
            return false;
        }

        let (inner, end) = if self.bytes.get(start + 1) == Some(&b'(') {
            let mut depth = 0usize;
            let mut close = None;
            for (i, &b) in self.bytes.iter().enumerate().skip(start + 1) {
                match b {
                    b'(' => depth += 1,
                    b')' => {
                        depth -= 1;
                        if depth == 0 {
                            close = Some(i);
                            break;
                        }
                    }
                    _ => {}
                }
            }
            let Some(close) = close else {
                return false;
            };
            (&source[start + 2..close], close + 1)
        } else {
            let rest = &source[start + 1..];
            let len = rest
                .char_indices()
                .find(|(_, c)| !c.is_alphanumeric())
                .map_or(rest.len(), |(i, _)| i);
            (&rest[..len], start + 1 + len)
        };

        if inner.trim().is_empty() {
            return false;
        }
        let children = self.parse_nested(inner, false);
        self.push_node(Inline::Superscript(children), end);
        true
    }

    fn try_parse_line_break(&mut self) -> bool {
        let newline = self.pos;
        let spaces = self.bytes[self.text_start..newline]
            .iter()
            .rev()
            .take_while(|&&b| b == b' ')
            .count();
        if spaces < 2 {
            return false;
        }

        self.pos = newline - spaces;
        self.flush_text();
        self.tokens.push(Tok::Node(Inline::LineBreak));
        // The newline itself stays in the text.
        self.text_start = newline;
        self.pos = newline + 1;
        true
    }

    /// Link a bare `scheme:` URL whose scheme letters end at the `:`.
    fn try_parse_bare_url(&mut self) -> bool {
        let colon = self.pos;
        let scheme_start = self.bytes[self.text_start..colon]
            .iter()
            .rev()
            .take_while(|b| b.is_ascii_alphabetic())
            .count();
        let scheme_start = colon - scheme_start;
        let scheme = self.text[scheme_start..colon].to_ascii_lowercase();
        if !SAFE_SCHEMES.contains(&scheme.as_str())
            || self.prev_char(scheme_start).is_some_and(char::is_alphanumeric)
        {
            return false;
        }

        let rest = &self.text[colon + 1..];
        let body_len = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '<' | '>' | '"'))
            .unwrap_or(rest.len());
        let mut body = &rest[..body_len];
        while let Some(last) = body.chars().last() {
            let unbalanced_paren = last == ')' && !body.contains('(');
            if matches!(last, '.' | ',' | ';' | ':' | '!' | '?' | '\'' | '"') || unbalanced_paren {
                body = &body[..body.len() - 1];
            } else {
                break;
            }
        }

        let needs_slashes = !matches!(scheme.as_str(), "mailto" | "news");
        let valid = if needs_slashes {
            body.len() > 2 && body.starts_with("//")
        } else {
            !body.is_empty()
        };
        if !valid {
            return false;
        }

        let end = colon + 1 + body.len();
        let url = self.text[scheme_start..end].to_string();
        self.pos = scheme_start;
        let node = Inline::AutoLink(AutoLink {
            text: url.clone(),
            url,
            email: false,
        });
        self.push_node(node, end);
        true
    }

    fn try_parse_quote(&mut self) -> bool {
        let quote = self.bytes[self.pos];
        let prev = self.prev_char(self.pos);
        let next = self.next_char(self.pos + 1);

        // An emphasis or strike run in front is judged by what precedes it.
        let mut context = self.pos;
        while context > 0 && matches!(self.bytes[context - 1], b'*' | b'_' | b'~') {
            context -= 1;
        }
        let opens_after = |c: char| c.is_whitespace() || "([{<-\u{2013}\u{2014}".contains(c);
        let opening = self.prev_char(context).map_or(true, opens_after);

        let kind = if quote == b'\''
            && prev.is_some_and(char::is_alphanumeric)
            && next.is_some_and(char::is_alphanumeric)
        {
            SmartKind::RightSingleQuote
        } else if opening && next.is_some_and(|c| !c.is_whitespace()) {
            if quote == b'"' {
                SmartKind::LeftDoubleQuote
            } else {
                SmartKind::LeftSingleQuote
            }
        } else if quote == b'"' {
            SmartKind::RightDoubleQuote
        } else {
            SmartKind::RightSingleQuote
        };

        self.push_node(Inline::Smart(kind), self.pos + 1);
        true
    }

    fn try_parse_dash(&mut self) -> bool {
        let run = self.run_length(self.pos, b'-');
        let kind = match run {
            2 => SmartKind::EnDash,
            3 => SmartKind::EmDash,
            _ => {
                self.pos += run;
                return true;
            }
        };
        self.push_node(Inline::Smart(kind), self.pos + run);
        true
    }

    fn try_parse_ellipsis(&mut self) -> bool {
        let rest = &self.text[self.pos..];
        let len = if rest.starts_with("...") {
            3
        } else if rest.starts_with(". . .") {
            5
        } else {
            return false;
        };
        self.push_node(Inline::Smart(SmartKind::Ellipsis), self.pos + len);
        true
    }

    fn try_parse_symbol(&mut self) -> bool {
        let rest = self.text[self.pos..].as_bytes();
        let matches = |pattern: &[u8]| {
            rest.len() >= pattern.len() && rest[..pattern.len()].eq_ignore_ascii_case(pattern)
        };
        let (kind, len) = if matches(b"(c)") {
            (SmartKind::Copyright, 3)
        } else if matches(b"(r)") {
            (SmartKind::Registered, 3)
        } else if matches(b"(tm)") {
            (SmartKind::Trademark, 4)
        } else {
            return false;
        };
        self.push_node(Inline::Smart(kind), self.pos + len);
        true
    }
}

/// Pair every unescaped `[` with its `]` in one pass.
fn match_brackets(bytes: &[u8]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    if memchr(b'[', bytes).is_none() {
        return pairs;
    }

    let mut open = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'[' => open.push(i),
            b']' => {
                if let Some(start) = open.pop() {
                    pairs.push((start, i));
                }
            }
            _ => {}
        }
        i += 1;
    }
    pairs.sort_unstable();
    pairs
}

/// `user@host.tld` with no scheme.
fn is_email(text: &str) -> bool {
    let Some((user, host)) = text.split_once('@') else {
        return false;
    };
    !user.is_empty()
        && host.contains('.')
        && !host.starts_with('.')
        && !host.ends_with('.')
        && !host.contains('@')
}

/// Name of an opening or closing tag body such as `span class="x"` or `/em`.
fn tag_name(inner: &str) -> &str {
    let body = inner.strip_prefix('/').unwrap_or(inner);
    if !body.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return "";
    }
    let len = body
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'-')
        .count();
    &body[..len]
}
