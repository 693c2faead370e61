//! # Marksmith Core
//!
//! A Markdown to HTML compiler for the Discount dialect.
//!
//! Beyond classic Markdown the dialect supports tables, footnotes,
//! definition lists, strikethrough, superscript, smart typography,
//! pseudo-protocol links and pandoc-style `%` title headers. Every feature is
//! a switch on [`Config`].
//!
//! ## Quick Start
//!
//! ```rust
//! use marksmith_core::{compile, Config};
//!
//! let html = compile("# Hello\n\nThis is *Markdown*.", &Config::default()).unwrap();
//! assert_eq!(html, "<h1>Hello</h1>\n\n<p>This is <em>Markdown</em>.</p>");
//! ```
//!
//! ## Documents and Headers
//!
//! Compiling to a [`Document`] keeps the tree, the pandoc headers and any
//! warnings around:
//!
//! ```rust
//! use marksmith_core::{extract_headers, Config, Document};
//!
//! let config = Config {
//!     pandoc_headers: true,
//!     ..Config::default()
//! };
//! let doc = Document::compile("% Title\n% Author\n\nBody", &config).unwrap();
//! assert_eq!(extract_headers(&doc).title(), Some("Title"));
//! assert!(doc.warnings().is_empty());
//! ```
//!
//! ## Graceful Degradation
//!
//! Malformed Markdown never fails. It renders as literal text and leaves a
//! [`Warning`] on the document where that is worth knowing:
//!
//! ```rust
//! use marksmith_core::{Config, Document, WarningKind};
//!
//! let doc = Document::compile("```\nnever closed", &Config::default()).unwrap();
//! assert!(doc.warnings().contains(WarningKind::UnclosedFence));
//! ```

pub mod ast;
pub mod config;
pub mod document;
pub mod error;
pub mod html;
pub mod inline;
pub mod lexer;
pub mod metadata;
pub mod parser;
pub mod refs;
pub mod span;

pub use ast::{Block, Inline};
pub use config::Config;
pub use document::Document;
pub use error::{CompileError, CompileResult, Warning, WarningKind, Warnings};
pub use metadata::{Metadata, MetadataKey};
pub use span::Span;

/// Compile Markdown `text` to HTML.
pub fn compile(text: &str, config: &Config) -> CompileResult<String> {
    Document::compile(text, config)?.to_html()
}

/// The pandoc `%` headers of a compiled document. Empty unless the document
/// was compiled with `pandoc_headers`.
#[inline]
pub fn extract_headers(doc: &Document) -> &Metadata {
    doc.metadata()
}
