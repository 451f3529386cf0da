//! Fenced code block highlighting.
//!
//! The fence info string is `lang` plus optional options, either
//! brace-delimited (`python {linenums="1" hl_lines="2 4" title="x.py"}`)
//! or bare (`python linenums="1"`). Options reuse the attribute lexer.
//!
//! Blocks without a language, and languages the syntax set does not
//! know, fall back to an escaped plain `<pre><code>` block; highlighting
//! never fails a render.

use std::collections::HashSet;
use std::fmt::Write;

use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{IncludeBackground, styled_line_to_highlighted_html};
use syntect::parsing::SyntaxSet;

use crate::attrs::AttrList;
use crate::text::escape_html;

/// Syntax highlighter with a fixed theme, shared across documents.
pub struct Highlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
}

impl Default for Highlighter {
    fn default() -> Self {
        let themes = ThemeSet::load_defaults();
        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            theme: themes
                .themes
                .get("InspiredGitHub")
                .cloned()
                .unwrap_or_default(),
        }
    }
}

impl Highlighter {
    /// Create a highlighter with the default syntax set and theme.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Render one fenced code block.
    pub fn render(&self, info: &str, code: &str) -> String {
        let (lang, options) = parse_info(info.trim());
        if lang.is_empty() {
            return plain_block(code);
        }
        let Some(syntax) = self.syntaxes.find_syntax_by_token(&lang) else {
            return plain_block(code);
        };

        let linenums = options.get_str("linenums").and_then(first_number);
        let hl_lines = options.get_str("hl_lines").map(parse_numbers).unwrap_or_default();
        let title = options.get_str("title");

        let mut out = format!("<div class=\"highlight lang-{}\">", escape_html(&lang));
        if let Some(title) = title {
            let _ = write!(out, "<span class=\"filename\">{}</span>", escape_html(title));
        }
        out.push_str("<pre><code>");

        let mut highlighter = HighlightLines::new(syntax, &self.theme);
        for (idx, line) in code.lines().enumerate() {
            let with_newline = format!("{line}\n");
            let line_html = highlighter
                .highlight_line(&with_newline, &self.syntaxes)
                .ok()
                .and_then(|regions| {
                    styled_line_to_highlighted_html(&regions[..], IncludeBackground::No).ok()
                })
                .unwrap_or_else(|| escape_html(&with_newline));

            let mut rendered = String::new();
            if let Some(start) = linenums {
                let _ = write!(rendered, "<span data-linenos=\"{}\"></span>", start + idx);
            }
            rendered.push_str(&line_html);

            if hl_lines.contains(&(idx + 1)) {
                let _ = write!(out, "<span class=\"hll\">{rendered}</span>");
            } else {
                out.push_str(&rendered);
            }
        }

        out.push_str("</code></pre></div>\n");
        out
    }
}

fn plain_block(code: &str) -> String {
    format!("<pre><code>{}</code></pre>\n", escape_html(code))
}

/// Split a fence info string into language and options.
fn parse_info(info: &str) -> (String, AttrList) {
    let mut parts = info.splitn(2, char::is_whitespace);
    let lang = parts.next().unwrap_or("").to_owned();
    let rest = parts.next().unwrap_or("").trim();
    let rest = rest
        .strip_prefix('{')
        .and_then(|r| r.strip_suffix('}'))
        .unwrap_or(rest);
    (lang, AttrList::parse(rest))
}

/// First whitespace-separated number of a multi-value option.
///
/// `linenums` accepts a single start value; extra values are ignored.
fn first_number(value: &str) -> Option<usize> {
    value.split_whitespace().next()?.parse().ok()
}

fn parse_numbers(value: &str) -> HashSet<usize> {
    value
        .split_whitespace()
        .filter_map(|n| n.parse().ok())
        .collect()
}
