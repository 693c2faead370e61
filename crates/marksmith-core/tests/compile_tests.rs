//! Integration tests for Markdown compilation

use marksmith_core::{compile, extract_headers, Block, Config, Document, WarningKind};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn html(input: &str) -> String {
    compile(input, &Config::default()).unwrap()
}

fn html_with(input: &str, config: Config) -> String {
    compile(input, &config).unwrap()
}

fn plain() -> Config {
    Config {
        smartypants: false,
        ..Config::default()
    }
}

// ============================================================================
// Block Structure Tests
// ============================================================================

#[rstest]
#[case::paragraphs("one\ntwo\n\nthree", "<p>one\ntwo</p>\n\n<p>three</p>")]
#[case::atx_heading("## Second level ##", "<h2>Second level</h2>")]
#[case::setext_h1("Title\n=====", "<h1>Title</h1>")]
#[case::setext_h2("Title\n-----", "<h2>Title</h2>")]
#[case::rule("* * *", "<hr />")]
#[case::indented_code("    let x = 1;\n    x < 2", "<pre><code>let x = 1;\nx &lt; 2\n</code></pre>")]
#[case::fenced_code(
    "```rust\nfn main() {}\n```",
    "<pre><code class=\"rust\">fn main() {}\n</code></pre>"
)]
#[case::blockquote("> quoted *text*", "<blockquote><p>quoted <em>text</em></p></blockquote>")]
#[case::lazy_quote("> one\ntwo", "<blockquote><p>one\ntwo</p></blockquote>")]
#[case::html_block("<div>\n*raw*\n</div>", "<div>\n*raw*\n</div>")]
fn test_blocks(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(html(input), expected);
}

#[test]
fn test_tight_list() {
    assert_eq!(html("* a\n* b"), "<ul>\n<li>a</li>\n<li>b</li>\n</ul>");
}

#[test]
fn test_loose_list() {
    assert_eq!(
        html("* a\n\n* b"),
        "<ul>\n<li><p>a</p></li>\n<li><p>b</p></li>\n</ul>"
    );
}

#[test]
fn test_ordered_list_start() {
    assert_eq!(
        html("3. x\n4. y"),
        "<ol start=\"3\">\n<li>x</li>\n<li>y</li>\n</ol>"
    );
    assert_eq!(html("1. x"), "<ol>\n<li>x</li>\n</ol>");
}

#[test]
fn test_nested_list() {
    assert_eq!(
        html("- a\n  - b\n- c"),
        "<ul>\n<li>a\n<ul>\n<li>b</li>\n</ul></li>\n<li>c</li>\n</ul>"
    );
}

#[test]
fn test_unclosed_fence_still_renders() {
    let doc = Document::compile("```\ncode", &Config::default()).unwrap();
    assert_eq!(doc.to_html().unwrap(), "<pre><code>code\n</code></pre>");
    assert!(doc.warnings().contains(WarningKind::UnclosedFence));
}

#[test]
fn test_crlf_input() {
    assert_eq!(html("# A\r\n\r\ntext\r\n"), "<h1>A</h1>\n\n<p>text</p>");
}

// ============================================================================
// Inline Tests
// ============================================================================

#[rstest]
#[case::emphasis("*foo*", "<p><em>foo</em></p>")]
#[case::strong("**foo**", "<p><strong>foo</strong></p>")]
#[case::underscore_strong("__foo__", "<p><strong>foo</strong></p>")]
#[case::code_span("`a < b`", "<p><code>a &lt; b</code></p>")]
#[case::hard_break("one  \ntwo", "<p>one<br/>\ntwo</p>")]
#[case::escaped_period("1986\\. What a great season.", "<p>1986. What a great season.</p>")]
#[case::strikethrough("~~gone~~", "<p><del>gone</del></p>")]
#[case::strikethrough_runs("~~~x~~", "<p><del>~x</del></p>")]
#[case::inline_html("a <span>b</span>", "<p>a <span>b</span></p>")]
fn test_inlines(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(html(input), expected);
}

#[test]
fn test_underscore_is_word_bound_in_strict_mode() {
    assert_eq!(html("foo_bar_baz"), "<p>foo_bar_baz</p>");

    let relaxed = Config {
        strict_mode: false,
        ..Config::default()
    };
    assert_eq!(
        html_with("foo_bar_baz", relaxed),
        "<p>foo<em>bar</em>baz</p>"
    );
}

#[test]
fn test_superscript_needs_relaxed_mode() {
    assert_eq!(html("x^2"), "<p>x^2</p>");
    let relaxed = Config {
        strict_mode: false,
        ..Config::default()
    };
    assert_eq!(html_with("x^2", relaxed), "<p>x<sup>2</sup></p>");
}

#[test]
fn test_no_strikethrough() {
    let config = Config {
        no_strikethrough: true,
        ..Config::default()
    };
    assert_eq!(html_with("~~gone~~", config), "<p>~~gone~~</p>");
}

// ============================================================================
// Escaping Tests
// ============================================================================

#[test]
fn test_special_characters_are_escaped() {
    assert_eq!(
        html_with("AT&T <3 \"x\"", plain()),
        "<p>AT&amp;T &lt;3 &quot;x&quot;</p>"
    );
}

#[test]
fn test_entities_are_not_double_escaped() {
    assert_eq!(html("&copy; &amp; &#8212;"), "<p>&copy; &amp; &#8212;</p>");
}

#[test]
fn test_escape_html() {
    let config = Config {
        escape_html: true,
        ..Config::default()
    };
    assert_eq!(
        html_with("<div>hi</div>", config),
        "<p>&lt;div&gt;hi&lt;/div&gt;</p>"
    );
}

// ============================================================================
// Link Tests
// ============================================================================

#[test]
fn test_inline_link() {
    assert_eq!(
        html("[an example](http://example.com/ \"Title\")"),
        "<p><a href=\"http://example.com/\" title=\"Title\">an example</a></p>"
    );
}

#[test]
fn test_reference_link_with_title() {
    assert_eq!(
        html("[x][1]\n\n[1]: http://a.b \"T\""),
        "<p><a href=\"http://a.b\" title=\"T\">x</a></p>"
    );
}

#[test]
fn test_duplicate_reference_first_wins() {
    let doc = Document::compile("[a]: url1\n[a]: url2\n\n[text][a]", &Config::default()).unwrap();
    assert_eq!(doc.to_html().unwrap(), "<p><a href=\"url1\">text</a></p>");
    assert!(doc.warnings().contains(WarningKind::DuplicateReference));
}

#[test]
fn test_unresolved_reference_is_literal() {
    assert_eq!(html("[x][nope]"), "<p>[x][nope]</p>");
}

#[test]
fn test_image() {
    assert_eq!(
        html("![alt](/img.png \"Title\")"),
        "<p><img src=\"/img.png\" title=\"Title\" alt=\"alt\" /></p>"
    );
}

#[test]
fn test_url_autolink() {
    assert_eq!(
        html("<http://example.com/>"),
        "<p><a href=\"http://example.com/\">http://example.com/</a></p>"
    );
}

#[test]
fn test_email_autolink_is_encoded() {
    let out = html("<me@x.io>");
    assert!(out.starts_with("<p><a href=\"&#109;&#x61;&#105;&#x6c;&#116;&#x6f;&#58;"));
    assert!(!out.contains("me@x.io"));
}

#[test]
fn test_bare_urls_need_autolink() {
    assert_eq!(
        html("Visit http://example.com."),
        "<p>Visit http://example.com.</p>"
    );
    let config = Config {
        autolink: true,
        ..Config::default()
    };
    assert_eq!(
        html_with("Visit http://example.com.", config),
        "<p>Visit <a href=\"http://example.com\">http://example.com</a>.</p>"
    );
}

#[test]
fn test_safelink() {
    let input = "[x](javascript:alert(1))";
    assert_eq!(
        html(input),
        "<p><a href=\"javascript:alert(1\">x</a>)</p>"
    );

    let config = Config {
        safelink: true,
        ..Config::default()
    };
    assert_eq!(html_with(input, config.clone()), "<p>[x](javascript:alert(1))</p>");
    assert_eq!(
        html_with("[ok](/relative)", config),
        "<p><a href=\"/relative\">ok</a></p>"
    );
}

#[test]
fn test_remove_links_and_images() {
    let config = Config {
        remove_links: true,
        remove_images: true,
        ..Config::default()
    };
    assert_eq!(
        html_with("[a](/b) and <http://c.d> ![alt](/i.png)", config),
        "<p>a and http://c.d alt</p>"
    );
}

#[rstest]
#[case::abbr("[ABC](abbr:Alphabet)", "<p><abbr title=\"Alphabet\">ABC</abbr></p>")]
#[case::class("[text](class:warn)", "<p><span class=\"warn\">text</span></p>")]
#[case::id("[text](id:here)", "<p><span id=\"here\">text</span></p>")]
#[case::lang("[text](lang:fr)", "<p><span lang=\"fr\">text</span></p>")]
#[case::raw("[x](raw:<b>y</b>)", "<p><b>y</b></p>")]
fn test_pseudo_protocols(#[case] input: &str, #[case] expected: &str) {
    let config = Config {
        pseudoprotocols: true,
        ..Config::default()
    };
    assert_eq!(html_with(input, config), expected);
}

#[test]
fn test_raw_pseudo_protocol_honors_escape_html() {
    let config = Config {
        pseudoprotocols: true,
        escape_html: true,
        ..Config::default()
    };
    assert_eq!(
        html_with("[x](raw:<script>alert.1</script>)", config),
        "<p>&lt;script&gt;alert.1&lt;/script&gt;</p>"
    );
}

#[test]
fn test_pseudo_protocols_disabled() {
    assert_eq!(
        html("[ABC](abbr:Alphabet)"),
        "<p><a href=\"abbr:Alphabet\">ABC</a></p>"
    );
}

// ============================================================================
// Smartypants Tests
// ============================================================================

#[test]
fn test_smartypants() {
    let input = "\"hello\" -- world...";
    assert_eq!(html(input), "<p>&ldquo;hello&rdquo; &ndash; world&hellip;</p>");
    assert_eq!(
        html_with(input, plain()),
        "<p>&quot;hello&quot; -- world...</p>"
    );
}

#[rstest]
#[case::em_dash("a---b", "<p>a&mdash;b</p>")]
#[case::apostrophe("it's", "<p>it&rsquo;s</p>")]
#[case::single_quotes("'hi'", "<p>&lsquo;hi&rsquo;</p>")]
#[case::spaced_ellipsis("wait. . .", "<p>wait&hellip;</p>")]
#[case::symbols("(c) (r) (tm)", "<p>&copy; &reg; &trade;</p>")]
#[case::quoted_strong("**\"x\"**", "<p><strong>&ldquo;x&rdquo;</strong></p>")]
#[case::quoted_emphasis("*'x'*", "<p><em>&lsquo;x&rsquo;</em></p>")]
#[case::quoted_strike("~~\"x\"~~", "<p><del>&ldquo;x&rdquo;</del></p>")]
#[case::emphasis_then_apostrophe("*Rust*'s", "<p><em>Rust</em>&rsquo;s</p>")]
#[case::code_untouched("`\"x\" -- y`", "<p><code>\"x\" -- y</code></p>")]
fn test_smart_substitutions(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(html(input), expected);
}

// ============================================================================
// Table Tests
// ============================================================================

#[test]
fn test_table_with_alignment() {
    assert_eq!(
        html("| a | b |\n|:--|--:|\n| 1 | 2 |"),
        "<table>\n<thead>\n<tr>\n<th align=\"left\">a</th>\n<th align=\"right\">b</th>\n</tr>\n\
         </thead>\n<tbody>\n<tr>\n<td align=\"left\">1</td>\n<td align=\"right\">2</td>\n</tr>\n\
         </tbody>\n</table>"
    );
}

#[test]
fn test_table_without_edge_pipes() {
    assert_eq!(
        html("a | b\n--- | :-:\n1 | 2"),
        "<table>\n<thead>\n<tr>\n<th>a</th>\n<th align=\"center\">b</th>\n</tr>\n\
         </thead>\n<tbody>\n<tr>\n<td>1</td>\n<td align=\"center\">2</td>\n</tr>\n\
         </tbody>\n</table>"
    );
}

#[test]
fn test_malformed_table_is_paragraph() {
    let doc = Document::compile("a | b\n--- | x", &plain()).unwrap();
    assert_eq!(doc.to_html().unwrap(), "<p>a | b\n--- | x</p>");
    assert!(doc.warnings().contains(WarningKind::MalformedTable));
}

#[test]
fn test_no_tables() {
    let config = Config {
        no_tables: true,
        ..plain()
    };
    assert_eq!(html_with("a | b\n--- | ---", config), "<p>a | b\n--- | ---</p>");
}

// ============================================================================
// Header Id and TOC Tests
// ============================================================================

#[test]
fn test_repeated_headers_get_unique_ids() {
    let config = Config {
        header_labels: true,
        ..Config::default()
    };
    assert_eq!(
        html_with("# Intro\n\n# Intro", config),
        "<h1 id=\"intro\">Intro</h1>\n\n<h1 id=\"intro-1\">Intro</h1>"
    );
}

#[test]
fn test_header_ids_off_by_default() {
    assert_eq!(html("# Intro"), "<h1>Intro</h1>");
}

#[test]
fn test_table_of_contents_includes_nested_headings() {
    let config = Config {
        toc: true,
        ..Config::default()
    };
    let doc = Document::compile("# A\n\n> ## Quoted\n\n- ### Listed", &config).unwrap();
    assert_eq!(
        doc.table_of_contents().unwrap(),
        "<ul>\n<li><a href=\"#a\">A</a>\n<ul>\n<li><a href=\"#quoted\">Quoted</a>\n<ul>\n\
         <li><a href=\"#listed\">Listed</a></li>\n</ul>\n</li>\n</ul>\n</li>\n</ul>"
    );
}

#[test]
fn test_table_of_contents() {
    let config = Config {
        toc: true,
        ..Config::default()
    };
    let doc = Document::compile("# A\n\n## B", &config).unwrap();
    assert_eq!(
        doc.table_of_contents().unwrap(),
        "<ul>\n<li><a href=\"#a\">A</a>\n<ul>\n<li><a href=\"#b\">B</a></li>\n</ul>\n</li>\n</ul>"
    );
}

// ============================================================================
// Footnote Tests
// ============================================================================

fn footnotes() -> Config {
    Config {
        extra_footnote: true,
        ..Config::default()
    }
}

#[test]
fn test_footnote_section() {
    assert_eq!(
        html_with("Text[^1].\n\n[^1]: The note.", footnotes()),
        "<p>Text<sup id=\"fnref:1\"><a href=\"#fn:1\" rel=\"footnote\">1</a></sup>.</p>\n\n\
         <div class=\"footnotes\">\n<hr/>\n<ol>\n<li id=\"fn:1\">\n\
         <p>The note.<a href=\"#fnref:1\" rev=\"footnote\">&#8617;</a></p></li>\n</ol>\n</div>"
    );
}

#[test]
fn test_footnotes_numbered_by_first_use() {
    let out = html_with(
        "A[^x] B[^y]\n\n[^y]: Why.\n[^x]: Ex.",
        footnotes(),
    );
    assert!(out.contains("<li id=\"fn:1\">\n<p>Ex."));
    assert!(out.contains("<li id=\"fn:2\">\n<p>Why."));
}

#[test]
fn test_unreferenced_footnote_is_dropped() {
    assert_eq!(html_with("Text.\n\n[^1]: unused", footnotes()), "<p>Text.</p>");
}

#[test]
fn test_footnotes_disabled() {
    assert_eq!(html("Text[^1]"), "<p>Text[^1]</p>");
}

// ============================================================================
// Definition List Tests
// ============================================================================

fn definitions() -> Config {
    Config {
        definition_lists: true,
        ..Config::default()
    }
}

#[test]
fn test_extra_definition_list() {
    assert_eq!(
        html_with("Apple\n: A fruit.\n\nOrange\n: Another fruit.", definitions()),
        "<dl>\n<dt>Apple</dt>\n<dd>A fruit.</dd>\n<dt>Orange</dt>\n<dd>Another fruit.</dd>\n</dl>"
    );
}

#[test]
fn test_discount_definition_list() {
    assert_eq!(
        html_with("=Apple=\n    A fruit.", definitions()),
        "<dl>\n<dt>Apple</dt>\n<dd>A fruit.</dd>\n</dl>"
    );
}

// ============================================================================
// Metadata and Output Tests
// ============================================================================

#[test]
fn test_pandoc_headers() {
    let config = Config {
        pandoc_headers: true,
        ..Config::default()
    };
    let doc = Document::compile("% My Title\n% Me\n% 2024\n\nBody", &config).unwrap();
    let headers = extract_headers(&doc);
    assert_eq!(headers.title(), Some("My Title"));
    assert_eq!(headers.author(), Some("Me"));
    assert_eq!(headers.date(), Some("2024"));
    assert_eq!(doc.to_html().unwrap(), "<p>Body</p>");
}

#[test]
fn test_pandoc_headers_off_keeps_lines() {
    let doc = Document::compile("% Title\n\nBody", &Config::default()).unwrap();
    assert!(extract_headers(&doc).is_empty());
    assert_eq!(doc.blocks().len(), 2);
}

#[test]
fn test_cdata() {
    let config = Config {
        cdata: true,
        ..Config::default()
    };
    assert_eq!(html_with("*x*", config), "<![CDATA[<p><em>x</em></p>]]>");
}

#[test]
fn test_block_spans() {
    let doc = Document::compile("para\n\n# H\n\n* a\n* b", &Config::default()).unwrap();
    let spans: Vec<_> = doc.blocks().iter().map(|b| (b.kind_name(), b.span().start)).collect();
    assert_eq!(spans, vec![("paragraph", 0), ("heading", 2), ("list", 4)]);
    assert!(matches!(doc.blocks()[2], Block::List(_)));
}

#[test]
fn test_config_from_partial_json() {
    let config: Config = serde_json::from_str(r#"{"autolink": true, "tabstop": 8}"#).unwrap();
    assert!(config.autolink);
    assert!(config.smartypants);
    assert_eq!(config.tabstop(), 8);
}
