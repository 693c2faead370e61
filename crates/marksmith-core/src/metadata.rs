//! Pandoc-style document headers.
//!
//! With `pandoc_headers` set, up to three leading lines that start with `%`
//! give the title, author and date, in that order. They are removed from the
//! body before block parsing.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::lexer::Lexer;

/// Metadata field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataKey {
    Title,
    Author,
    Date,
}

impl MetadataKey {
    const ORDER: [MetadataKey; 3] = [MetadataKey::Title, MetadataKey::Author, MetadataKey::Date];

    pub const fn as_str(&self) -> &'static str {
        match self {
            MetadataKey::Title => "title",
            MetadataKey::Author => "author",
            MetadataKey::Date => "date",
        }
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header values keyed by field. Absent fields are absent, never empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Metadata {
    entries: BTreeMap<MetadataKey, String>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: MetadataKey) -> Option<&str> {
        self.entries.get(&key).map(String::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.get(MetadataKey::Title)
    }

    pub fn author(&self) -> Option<&str> {
        self.get(MetadataKey::Author)
    }

    pub fn date(&self) -> Option<&str> {
        self.get(MetadataKey::Date)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetadataKey, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// Consume leading `%` lines from `lexer` and return their values.
///
/// A `%` line with nothing after it still occupies its position but
/// records no value.
pub fn extract(lexer: &mut Lexer<'_>) -> Metadata {
    let mut metadata = Metadata::new();
    for key in MetadataKey::ORDER {
        let value = match lexer.peek_line() {
            Some(line) if line.indent == 0 && line.text.starts_with('%') => {
                line.text[1..].trim().to_string()
            }
            _ => break,
        };
        lexer.next_line();
        if !value.is_empty() {
            metadata.entries.insert(key, value);
        }
    }
    tracing::debug!(fields = metadata.len(), "pandoc headers extracted");
    metadata
}
