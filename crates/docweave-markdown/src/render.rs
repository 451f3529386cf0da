//! Token tree to HTML rendering.
//!
//! One exhaustive match maps every token kind to its HTML template.
//! Attribute lists serialize through [`AttrList::render`]; headings get
//! stable, collision-free ids and feed the TOC collection.

use std::fmt::Write;

use crate::attrs::AttrList;
use crate::compiler::{CompilerOptions, Environment};
use crate::highlight::Highlighter;
use crate::text::{escape_html, slugify};
use crate::toc::{TOC_MARKER, TocEntry};
use crate::token::{CellAlign, TabSetToken, Token, plain_text};

/// Render a document's tokens, consuming the tree.
pub(crate) fn render_document(
    tokens: Vec<Token>,
    env: &mut Environment,
    options: &CompilerOptions,
    highlighter: &Highlighter,
) -> String {
    let mut renderer = HtmlRenderer {
        env,
        options,
        highlighter,
        out: String::with_capacity(4096),
    };
    renderer.render_tokens(tokens);
    renderer.out
}

struct HtmlRenderer<'a> {
    env: &'a mut Environment,
    options: &'a CompilerOptions,
    highlighter: &'a Highlighter,
    out: String,
}

impl HtmlRenderer<'_> {
    fn render_tokens(&mut self, tokens: Vec<Token>) {
        for token in tokens {
            self.render_token(token);
        }
    }

    /// Render children into a detached buffer.
    fn capture(&mut self, tokens: Vec<Token>) -> String {
        let saved = std::mem::take(&mut self.out);
        self.render_tokens(tokens);
        std::mem::replace(&mut self.out, saved)
    }

    #[allow(clippy::too_many_lines)]
    fn render_token(&mut self, token: Token) {
        match token {
            Token::Paragraph { children, attrs } => {
                if children.is_empty() && attrs.is_empty() {
                    return;
                }
                let _ = write!(self.out, "<p{}>", attrs.render());
                self.render_tokens(children);
                self.out.push_str("</p>\n");
            }
            Token::Heading {
                level,
                children,
                attrs,
            } => self.heading(level, children, attrs),
            Token::BlockQuote { children } => {
                self.out.push_str("<blockquote>");
                self.render_tokens(children);
                self.out.push_str("</blockquote>\n");
            }
            Token::CodeBlock { info, code } => {
                let html = self.highlighter.render(&info, &code);
                self.out.push_str(&html);
            }
            Token::List { start, items } => {
                let ordered = start.is_some();
                match start {
                    None => self.out.push_str("<ul>\n"),
                    Some(1) => self.out.push_str("<ol>\n"),
                    Some(n) => {
                        let _ = write!(self.out, "<ol start=\"{n}\">\n");
                    }
                }
                self.render_tokens(items);
                self.out.push_str(if ordered { "</ol>\n" } else { "</ul>\n" });
            }
            Token::Item { children } => {
                self.out.push_str("<li>");
                self.render_tokens(children);
                self.out.push_str("</li>\n");
            }
            Token::DefinitionList { children } => {
                self.out.push_str("<dl>\n");
                self.render_tokens(children);
                self.out.push_str("</dl>\n");
            }
            Token::DefinitionTitle { children } => {
                self.out.push_str("<dt>");
                self.render_tokens(children);
                self.out.push_str("</dt>\n");
            }
            Token::DefinitionDetails { children } => {
                self.out.push_str("<dd>");
                self.render_tokens(children);
                self.out.push_str("</dd>\n");
            }
            Token::Table(table) => self.table(table),
            Token::HtmlBlock(raw) => self.out.push_str(&raw),
            Token::Component(raw) => {
                self.out.push_str(&raw);
                self.out.push('\n');
            }
            Token::Rule { attrs } => {
                let _ = write!(self.out, "<hr{}/>\n", attrs.render());
            }
            Token::Admonition(admonition) => {
                let class = admonition
                    .class
                    .map_or_else(String::new, |c| format!(" {c}"));
                let title = escape_html(&admonition.title);
                if admonition.collapsible {
                    let open = if admonition.open { " open" } else { "" };
                    let _ = write!(
                        self.out,
                        "<details class=\"admonition {}{}\"{}>\n",
                        admonition.name, class, open
                    );
                    let _ = write!(
                        self.out,
                        "<summary class=\"admonition-title\">{title}</summary>\n"
                    );
                    self.render_tokens(admonition.body);
                    self.out.push_str("</details>\n");
                } else {
                    let _ = write!(
                        self.out,
                        "<section class=\"admonition {}{}\">\n",
                        admonition.name, class
                    );
                    let _ = write!(self.out, "<p class=\"admonition-title\">{title}</p>\n");
                    self.render_tokens(admonition.body);
                    self.out.push_str("</section>\n");
                }
            }
            Token::Tab(tab) => {
                // An ungrouped tab only occurs if the grouping pass was
                // bypassed; render it as a single-tab set.
                self.env.tab_sets += 1;
                let set = TabSetToken {
                    group: self.env.tab_sets,
                    tabs: vec![crate::token::TabEntry {
                        label: tab.label,
                        body: tab.body,
                        selected: true,
                    }],
                };
                self.tab_set(set);
            }
            Token::TabSet(set) => self.tab_set(set),
            Token::Container { classes, children } => {
                if classes.is_empty() {
                    self.out.push_str("<div>\n");
                } else {
                    let _ = write!(self.out, "<div class=\"{}\">\n", classes.join(" "));
                }
                self.render_tokens(children);
                self.out.push_str("</div>\n");
            }
            Token::TocMarker => self.out.push_str(TOC_MARKER),
            Token::IncludeError { path } => {
                let _ = write!(
                    self.out,
                    "<div class=\"error\"><pre>Could not find file: {}</pre></div>\n",
                    escape_html(&path)
                );
            }
            Token::Text(text) => self.out.push_str(&escape_html(&text)),
            Token::CodeSpan { text, attrs } => {
                let _ = write!(
                    self.out,
                    "<code{}>{}</code>",
                    attrs.render(),
                    escape_html(&text)
                );
            }
            Token::Emphasis { children, attrs } => self.inline_tag("em", children, &attrs),
            Token::Strong { children, attrs } => self.inline_tag("strong", children, &attrs),
            Token::Strikethrough { children, attrs } => self.inline_tag("del", children, &attrs),
            Token::Superscript { children, attrs } => self.inline_tag("sup", children, &attrs),
            Token::Subscript { children, attrs } => self.inline_tag("sub", children, &attrs),
            Token::Link { children, attrs } => self.inline_tag("a", children, &attrs),
            Token::Image { attrs } => {
                let _ = write!(self.out, "<img{} />", attrs.render());
            }
            Token::InlineHtml(raw) => self.out.push_str(&raw),
            Token::TaskMarker(checked) => {
                self.out.push_str(if checked {
                    "<input type=\"checkbox\" checked disabled> "
                } else {
                    "<input type=\"checkbox\" disabled> "
                });
            }
            Token::SoftBreak => self.out.push('\n'),
            Token::HardBreak => self.out.push_str("<br />\n"),
        }
    }

    fn inline_tag(&mut self, tag: &str, children: Vec<Token>, attrs: &AttrList) {
        let _ = write!(self.out, "<{tag}{}>", attrs.render());
        self.render_tokens(children);
        let _ = write!(self.out, "</{tag}>");
    }

    fn heading(&mut self, level: u8, children: Vec<Token>, mut attrs: AttrList) {
        let name = collapse_ws(plain_text(&children).trim());
        let inner = self.capture(children);
        let inner = inner.trim();
        let skip = attrs.has("skip-toc");

        if attrs.get_str("id").is_none() && !skip {
            let base = slugify(&name, self.options.slug_separator);
            let base = if base.is_empty() {
                "section".to_owned()
            } else {
                base
            };
            let id = self.env.unique_id(&base);
            attrs.set_str("id", id);
        }

        if !skip && self.options.toc_depth.contains(&level) {
            if let Some(id) = attrs.get_str("id") {
                self.env.toc.push(TocEntry {
                    level,
                    id: id.to_owned(),
                    name: name.clone(),
                    html: inner.to_owned(),
                    children: Vec::new(),
                });
            }
        }

        let _ = write!(
            self.out,
            "<h{level}{}>{}</h{level}>\n",
            attrs.render(),
            inner
        );
    }

    fn table(&mut self, table: crate::token::TableToken) {
        self.out.push_str("<table>\n<thead>\n<tr>\n");
        for (idx, cell) in table.head.into_iter().enumerate() {
            let align = alignment_style(table.alignments.get(idx).copied());
            let _ = write!(self.out, "  <th{align}>");
            self.render_tokens(cell);
            self.out.push_str("</th>\n");
        }
        self.out.push_str("</tr>\n</thead>\n<tbody>\n");
        for row in table.rows {
            self.out.push_str("<tr>\n");
            for (idx, cell) in row.into_iter().enumerate() {
                let align = alignment_style(table.alignments.get(idx).copied());
                let _ = write!(self.out, "  <td{align}>");
                self.render_tokens(cell);
                self.out.push_str("</td>\n");
            }
            self.out.push_str("</tr>\n");
        }
        self.out.push_str("</tbody>\n</table>\n");
    }

    fn tab_set(&mut self, set: TabSetToken) {
        let group = set.group;
        let mut tabs = Vec::with_capacity(set.tabs.len());
        for (idx, tab) in set.tabs.into_iter().enumerate() {
            let label = if tab.label.is_empty() {
                (idx + 1).to_string()
            } else {
                self.capture(tab.label)
            };
            let body = self.capture(tab.body);
            tabs.push((tab.selected, label, body));
        }

        self.out.push_str("<div class=\"tabbed-set\">\n");
        for (idx, (selected, _, _)) in tabs.iter().enumerate() {
            let checked = if *selected { " checked" } else { "" };
            let _ = write!(
                self.out,
                "<input id=\"__tabbed_{group}_{}\" name=\"__tabbed_{group}\" type=\"radio\"{checked}>\n",
                idx + 1
            );
        }
        self.out.push_str("<div class=\"tabbed-labels\">\n");
        for (idx, (_, label, _)) in tabs.iter().enumerate() {
            let _ = write!(
                self.out,
                "<label for=\"__tabbed_{group}_{}\">{}</label>\n",
                idx + 1,
                label.trim()
            );
        }
        self.out.push_str("</div>\n<div class=\"tabbed-panels\">\n");
        for (_, _, body) in &tabs {
            self.out.push_str("<div class=\"tabbed-panel\">\n");
            self.out.push_str(body);
            self.out.push_str("</div>\n");
        }
        self.out.push_str("</div>\n</div>\n");
    }
}

fn alignment_style(align: Option<CellAlign>) -> &'static str {
    match align {
        Some(CellAlign::Left) => " style=\"text-align:left\"",
        Some(CellAlign::Center) => " style=\"text-align:center\"",
        Some(CellAlign::Right) => " style=\"text-align:right\"",
        Some(CellAlign::None) | None => "",
    }
}

/// Collapse whitespace runs to single spaces.
fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_ws() {
        assert_eq!(collapse_ws("a  b\nc"), "a b c");
        assert_eq!(collapse_ws("  "), "");
    }

    #[test]
    fn test_alignment_style() {
        assert_eq!(
            alignment_style(Some(CellAlign::Left)),
            " style=\"text-align:left\""
        );
        assert_eq!(alignment_style(None), "");
    }
}
