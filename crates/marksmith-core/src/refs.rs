//! Link reference and footnote tables.
//!
//! Both tables are filled by the block parser and frozen before inline
//! resolution starts, so a reference may appear before its definition.

use std::collections::HashMap;

use crate::ast::FootnoteDef;

/// Target of a `[label]: url "title"` definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDef {
    pub url: String,
    pub title: Option<String>,
}

/// Case-insensitive label lookup. Lowercases and collapses runs of
/// whitespace to one space.
pub fn normalize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for word in label.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.extend(word.chars().flat_map(char::to_lowercase));
    }
    out
}

/// Link reference definitions, keyed by normalized label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceTable {
    defs: HashMap<String, LinkDef>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition. The first definition of a label wins; returns
    /// `false` when the label was already taken.
    pub fn insert(&mut self, label: &str, def: LinkDef) -> bool {
        let key = normalize_label(label);
        if self.defs.contains_key(&key) {
            return false;
        }
        self.defs.insert(key, def);
        true
    }

    pub fn get(&self, label: &str) -> Option<&LinkDef> {
        self.defs.get(&normalize_label(label))
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// Footnote bodies in definition order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FootnoteTable {
    defs: Vec<FootnoteDef>,
    by_label: HashMap<String, usize>,
}

impl FootnoteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition unless its label is taken. Returns `false` on a
    /// duplicate.
    pub fn insert(&mut self, def: FootnoteDef) -> bool {
        let key = normalize_label(&def.label);
        if self.by_label.contains_key(&key) {
            return false;
        }
        self.by_label.insert(key, self.defs.len());
        self.defs.push(def);
        true
    }

    /// Index of the definition for `label`.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.by_label.get(&normalize_label(label)).copied()
    }

    pub fn get(&self, index: usize) -> Option<&FootnoteDef> {
        self.defs.get(index)
    }

    pub(crate) fn defs_mut(&mut self) -> impl Iterator<Item = &mut FootnoteDef> {
        self.defs.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// A parsed reference definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDefinition {
    pub label: String,
    pub def: LinkDef,
    /// Whether the title was taken from the following line.
    pub used_next_line: bool,
}

/// Parse `[label]: url "title"` from `line`, looking at `next` for a title
/// written on its own line.
pub fn parse_definition(line: &str, next: Option<&str>) -> Option<ParsedDefinition> {
    let line = line.trim();
    let rest = line.strip_prefix('[')?;
    let close = rest.find("]:")?;
    let label = &rest[..close];
    if label.trim().is_empty() || label.starts_with('^') {
        return None;
    }

    let rest = rest[close + 2..].trim_start();
    let (url, rest) = split_url(rest)?;

    let rest = rest.trim();
    if !rest.is_empty() {
        let title = parse_title(rest)?;
        return Some(ParsedDefinition {
            label: label.to_string(),
            def: LinkDef {
                url: url.to_string(),
                title: Some(title.to_string()),
            },
            used_next_line: false,
        });
    }

    let next_title = next.and_then(|n| parse_title(n.trim()));
    Some(ParsedDefinition {
        label: label.to_string(),
        def: LinkDef {
            url: url.to_string(),
            title: next_title.map(str::to_string),
        },
        used_next_line: next_title.is_some(),
    })
}

fn split_url(s: &str) -> Option<(&str, &str)> {
    if let Some(inner) = s.strip_prefix('<') {
        let end = inner.find('>')?;
        return Some((&inner[..end], &inner[end + 1..]));
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    Some((&s[..end], &s[end..]))
}

/// `"title"`, `'title'` or `(title)`, spanning the whole of `s`.
fn parse_title(s: &str) -> Option<&str> {
    let close = match s.as_bytes().first()? {
        b'"' => '"',
        b'\'' => '\'',
        b'(' => ')',
        _ => return None,
    };
    if s.len() < 2 || !s.ends_with(close) {
        return None;
    }
    Some(&s[1..s.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    #[test]
    fn labels_fold_case_and_space() {
        assert_eq!(normalize_label("  Foo   Bar\nBaz "), "foo bar baz");
    }

    #[test]
    fn first_definition_wins() {
        let mut table = ReferenceTable::new();
        let first = LinkDef {
            url: "url1".into(),
            title: None,
        };
        let second = LinkDef {
            url: "url2".into(),
            title: None,
        };
        assert!(table.insert("A", first));
        assert!(!table.insert("a", second));
        assert_eq!(table.get("a").map(|d| d.url.as_str()), Some("url1"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn parses_definition_forms() {
        let parsed = parse_definition("[id]: http://example.com/  \"Optional Title\"", None).unwrap();
        assert_eq!(parsed.label, "id");
        assert_eq!(parsed.def.url, "http://example.com/");
        assert_eq!(parsed.def.title.as_deref(), Some("Optional Title"));

        let parsed = parse_definition("[id]: <http://example.com/> (Paren)", None).unwrap();
        assert_eq!(parsed.def.url, "http://example.com/");
        assert_eq!(parsed.def.title.as_deref(), Some("Paren"));

        let parsed = parse_definition("[id]: /path", Some("   'Next line'")).unwrap();
        assert_eq!(parsed.def.title.as_deref(), Some("Next line"));
        assert!(parsed.used_next_line);

        let parsed = parse_definition("[id]: /path", Some("plain text")).unwrap();
        assert_eq!(parsed.def.title, None);
        assert!(!parsed.used_next_line);
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse_definition("[id]: /path not a title", None).is_none());
        assert!(parse_definition("[^1]: note", None).is_none());
    }

    #[test]
    fn footnotes_keep_first() {
        let mut table = FootnoteTable::new();
        let def = |label: &str| FootnoteDef {
            label: label.into(),
            blocks: Vec::new(),
            span: Span::line(0),
        };
        assert!(table.insert(def("One")));
        assert!(!table.insert(def("one")));
        assert_eq!(table.index_of("ONE"), Some(0));
        assert_eq!(table.index_of("two"), None);
    }
}
