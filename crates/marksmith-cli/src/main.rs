//! Marksmith CLI - compile Markdown documents to HTML
//!
//! Usage:
//!   marksmith [OPTIONS] [FILE]
//!
//! Commands:
//!   render    Print the document as HTML (default)
//!   headers   Print the pandoc `%` headers
//!   check     List warnings, failing when there are any
//!   stats     Show document statistics

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use marksmith_core::{extract_headers, Block, Config, Document};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "marksmith")]
#[command(version, about = "Compile Markdown to HTML", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Input file, `-` or nothing for stdin
    file: Option<PathBuf>,

    #[command(flatten)]
    dialect: DialectArgs,

    /// Print machine readable JSON where supported
    #[arg(short, long, global = true)]
    json: bool,

    /// Log compile phases to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the document as HTML
    Render {
        /// Input file, `-` or nothing for stdin
        file: Option<PathBuf>,

        /// Write HTML to FILE instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the pandoc `%` title, author and date headers
    Headers {
        /// Input file, `-` or nothing for stdin
        file: Option<PathBuf>,
    },
    /// List recoverable problems; exits with status 1 when there are any
    Check {
        /// Input file, `-` or nothing for stdin
        file: Option<PathBuf>,
    },
    /// Show block and size statistics
    Stats {
        /// Input file, `-` or nothing for stdin
        file: Option<PathBuf>,
    },
}

/// Dialect switches, applied on top of `--config`.
#[derive(Debug, Default, Args)]
struct DialectArgs {
    /// JSON file with `Config` fields
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Render links as plain text
    #[arg(long, global = true)]
    remove_links: bool,
    /// Render images as their alt text
    #[arg(long, global = true)]
    remove_images: bool,
    /// Keep straight quotes, dashes and dots
    #[arg(long, global = true)]
    no_smartypants: bool,
    /// Enable abbr:, class:, id:, lang: and raw: link targets
    #[arg(long, global = true)]
    pseudoprotocols: bool,
    /// Read leading `%` title, author and date lines
    #[arg(long, global = true)]
    pandoc_headers: bool,
    /// Add id attributes to headers
    #[arg(long, global = true)]
    header_labels: bool,
    /// Escape all HTML in the input
    #[arg(long, global = true)]
    escape_html: bool,
    /// Relaxed emphasis and superscript
    #[arg(long, global = true)]
    relaxed: bool,
    #[arg(long, global = true)]
    no_tables: bool,
    #[arg(long, global = true)]
    no_strikethrough: bool,
    /// Print a table of contents before the document
    #[arg(long, global = true)]
    toc: bool,
    /// Link bare URLs
    #[arg(long, global = true)]
    autolink: bool,
    /// Only link safe URL schemes
    #[arg(long, global = true)]
    safelink: bool,
    /// Enable `[^id]` footnotes
    #[arg(long, global = true)]
    footnotes: bool,
    /// Enable definition lists
    #[arg(long, global = true)]
    definition_lists: bool,
    /// Wrap the output in a CDATA section
    #[arg(long, global = true)]
    cdata: bool,
    /// Tab stop width
    #[arg(long, global = true, value_name = "N")]
    tabstop: Option<u8>,
}

impl DialectArgs {
    fn load(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config '{}'", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("invalid config '{}'", path.display()))?
            }
            None => Config::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    /// Flags only ever switch a feature away from its default.
    fn apply(&self, config: &mut Config) {
        config.remove_links |= self.remove_links;
        config.remove_images |= self.remove_images;
        config.smartypants &= !self.no_smartypants;
        config.pseudoprotocols |= self.pseudoprotocols;
        config.pandoc_headers |= self.pandoc_headers;
        config.header_labels |= self.header_labels;
        config.escape_html |= self.escape_html;
        config.strict_mode &= !self.relaxed;
        config.no_tables |= self.no_tables;
        config.no_strikethrough |= self.no_strikethrough;
        config.toc |= self.toc;
        config.autolink |= self.autolink;
        config.safelink |= self.safelink;
        config.extra_footnote |= self.footnotes;
        config.definition_lists |= self.definition_lists;
        config.cdata |= self.cdata;
        if let Some(tabstop) = self.tabstop {
            config.tabstop = tabstop;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "marksmith_core=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let mut config = cli.dialect.load()?;

    match cli.command {
        None => cmd_render(cli.file.as_deref(), None, &config),
        Some(Command::Render { file, output }) => {
            cmd_render(file.as_deref(), output.as_deref(), &config)
        }
        Some(Command::Headers { file }) => {
            config.pandoc_headers = true;
            cmd_headers(file.as_deref(), &config, cli.json)
        }
        Some(Command::Check { file }) => cmd_check(file.as_deref(), &config, cli.json),
        Some(Command::Stats { file }) => cmd_stats(file.as_deref(), &config, cli.json),
    }
}

/// Read `path`, or stdin when it is absent or `-`.
fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path.display())),
        _ => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("failed to read stdin")?;
            Ok(input)
        }
    }
}

fn compile(path: Option<&Path>, config: &Config) -> Result<Document> {
    let input = read_input(path)?;
    let doc = Document::compile(&input, config).context("failed to compile document")?;
    for warning in doc.warnings().iter() {
        tracing::warn!(kind = warning.kind.as_str(), "{}", warning);
    }
    Ok(doc)
}

// =============================================================================
// Render Command
// =============================================================================

fn cmd_render(path: Option<&Path>, output: Option<&Path>, config: &Config) -> Result<()> {
    let doc = compile(path, config)?;
    let mut html = String::new();
    if let Some(toc) = doc.table_of_contents().filter(|toc| !toc.is_empty()) {
        html.push_str(&toc);
        html.push_str("\n\n");
    }
    html.push_str(&doc.to_html()?);
    html.push('\n');

    match output {
        Some(out) => fs::write(out, html)
            .with_context(|| format!("failed to write '{}'", out.display()))?,
        None => io::stdout()
            .write_all(html.as_bytes())
            .context("failed to write stdout")?,
    }
    Ok(())
}

// =============================================================================
// Headers Command
// =============================================================================

fn cmd_headers(path: Option<&Path>, config: &Config, json: bool) -> Result<()> {
    let doc = compile(path, config)?;
    let metadata = extract_headers(&doc);

    if json {
        println!("{}", serde_json::to_string_pretty(metadata)?);
    } else {
        for (key, value) in metadata.iter() {
            println!("{}: {}", key, value);
        }
    }
    Ok(())
}

// =============================================================================
// Check Command
// =============================================================================

#[derive(Serialize)]
struct JsonWarning<'a> {
    kind: &'static str,
    message: &'a str,
    /// One-based first line.
    line: u32,
}

fn cmd_check(path: Option<&Path>, config: &Config, json: bool) -> Result<()> {
    let doc = compile(path, config)?;
    let warnings = doc.warnings();

    if json {
        let list: Vec<JsonWarning<'_>> = warnings
            .iter()
            .map(|w| JsonWarning {
                kind: w.kind.as_str(),
                message: &w.message,
                line: w.span.start + 1,
            })
            .collect();
        println!(
            "{}",
            serde_json::json!({ "valid": list.is_empty(), "warnings": list })
        );
    } else if warnings.is_empty() {
        println!("OK: no warnings");
    } else {
        eprintln!("{} warning(s):", warnings.len());
        for warning in warnings.iter() {
            eprintln!("  - {}", warning);
        }
    }

    if !warnings.is_empty() {
        bail!("{} warning(s) found", warnings.len());
    }
    Ok(())
}

// =============================================================================
// Stats Command
// =============================================================================

fn cmd_stats(path: Option<&Path>, config: &Config, json: bool) -> Result<()> {
    let doc = compile(path, config)?;
    let stats = DocumentStats::from_document(&doc);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Document Statistics");
    println!("-------------------");
    println!("Content:");
    println!("  Total blocks:     {}", stats.total_blocks);
    println!("  Headings:         {}", stats.headings);
    println!("  Paragraphs:       {}", stats.paragraphs);
    println!("  Code blocks:      {}", stats.code_blocks);
    println!("  Lists:            {}", stats.lists);
    println!("  List items:       {}", stats.list_items);
    println!("  Quotes:           {}", stats.quotes);
    println!("  Tables:           {}", stats.tables);
    println!("  HTML blocks:      {}", stats.html_blocks);
    println!("  Rules:            {}", stats.rules);
    println!("  Definition lists: {}", stats.definition_lists);
    println!();
    println!("Definitions:");
    println!("  References:       {}", stats.references);
    println!("  Footnotes:        {}", stats.footnotes);
    println!();
    println!("Size:");
    println!("  Characters:       {}", stats.chars);
    println!("  Words (est.):     {}", stats.words);
    println!("  Lines:            {}", stats.lines);
    println!();
    println!("Warnings:           {}", stats.warnings);
    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
struct DocumentStats {
    total_blocks: usize,
    headings: usize,
    paragraphs: usize,
    code_blocks: usize,
    lists: usize,
    list_items: usize,
    quotes: usize,
    tables: usize,
    html_blocks: usize,
    rules: usize,
    definition_lists: usize,
    references: usize,
    footnotes: usize,
    warnings: usize,
    chars: usize,
    words: usize,
    lines: usize,
}

impl DocumentStats {
    fn from_document(doc: &Document) -> Self {
        let source = doc.source();
        let mut stats = Self {
            references: doc.references().len(),
            footnotes: doc.footnotes().len(),
            warnings: doc.warnings().len(),
            chars: source.chars().count(),
            words: source.split_whitespace().count(),
            lines: source.lines().count(),
            ..Self::default()
        };
        stats.count_blocks(doc.blocks());
        stats
    }

    fn count_blocks(&mut self, blocks: &[Block]) {
        for block in blocks {
            self.total_blocks += 1;
            match block {
                Block::Heading(_) => self.headings += 1,
                Block::Paragraph(_) => self.paragraphs += 1,
                Block::CodeBlock(_) => self.code_blocks += 1,
                Block::List(l) => {
                    self.lists += 1;
                    self.list_items += l.items.len();
                    for item in &l.items {
                        self.count_blocks(&item.blocks);
                    }
                }
                Block::Quote(q) => {
                    self.quotes += 1;
                    self.count_blocks(&q.blocks);
                }
                Block::Table(_) => self.tables += 1,
                Block::Html(_) => self.html_blocks += 1,
                Block::Rule(_) => self.rules += 1,
                Block::DefinitionList(d) => {
                    self.definition_lists += 1;
                    for definition in d.items.iter().flat_map(|i| &i.definitions) {
                        self.count_blocks(definition);
                    }
                }
            }
        }
    }
}
