//! Base-parser bridge: pulldown-cmark events to the token tree.
//!
//! The base block/inline grammar is pulldown-cmark's; this module only
//! reifies its event stream into [`Token`] values and then runs the
//! trailing-attribute-capture pass that attaches `{...}` fragments to the
//! token they follow.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::attrs::AttrList;
use crate::text::escape_html;
use crate::token::{CellAlign, TableToken, Token, plain_text};

/// Parse a markdown run into tokens and attach trailing attributes.
pub(crate) fn build_tokens(markdown: &str, options: Options) -> Vec<Token> {
    let parser = Parser::new_ext(markdown, options);
    let mut builder = TreeBuilder::default();
    for event in parser {
        builder.event(event);
    }
    let mut tokens = builder.finish();
    attach_attributes(&mut tokens);
    tokens
}

/// Parse a single-line markdown fragment and return its inline tokens.
///
/// Used for directive labels that may carry inline formatting.
pub(crate) fn build_inline_tokens(markdown: &str, options: Options) -> Vec<Token> {
    let tokens = build_tokens(markdown, options);
    match tokens.into_iter().next() {
        Some(Token::Paragraph { children, .. }) => children,
        Some(other) => vec![other],
        None => Vec::new(),
    }
}

/// An open container on the builder stack.
struct Frame {
    kind: FrameKind,
    children: Vec<Token>,
}

enum FrameKind {
    Paragraph,
    Heading(u8),
    BlockQuote,
    List(Option<u64>),
    Item,
    DefinitionList,
    DefinitionTitle,
    DefinitionDetails,
    Emphasis,
    Strong,
    Strikethrough,
    Superscript,
    Subscript,
    Link { href: String, title: String },
    Image { src: String, title: String },
    CodeBlock { info: String, code: String },
    HtmlBlock { raw: String },
    Table { alignments: Vec<CellAlign> },
    TableHead { cells: Vec<Vec<Token>> },
    TableRow { cells: Vec<Vec<Token>> },
    TableCell,
    /// Containers whose children splice into the parent (footnote
    /// definitions, metadata blocks).
    Transparent,
}

#[derive(Default)]
struct TreeBuilder {
    root: Vec<Token>,
    stack: Vec<Frame>,
    /// Completed table parts waiting for their enclosing frame.
    table_head: Vec<Vec<Vec<Token>>>,
    table_rows: Vec<Vec<Vec<Vec<Token>>>>,
}

impl TreeBuilder {
    fn finish(mut self) -> Vec<Token> {
        // Unterminated containers (should not happen with a well-formed
        // event stream): close them in order.
        while let Some(frame) = self.stack.pop() {
            self.close_frame(frame);
        }
        self.root
    }

    fn push_token(&mut self, token: Token) {
        match self.stack.last_mut() {
            Some(frame) => frame.children.push(token),
            None => self.root.push(token),
        }
    }

    fn open(&mut self, kind: FrameKind) {
        self.stack.push(Frame {
            kind,
            children: Vec::new(),
        });
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.push_token(Token::CodeSpan {
                text: code.to_string(),
                attrs: AttrList::new(),
            }),
            Event::Html(html) => self.block_html(&html),
            Event::InlineHtml(html) => self.push_token(Token::InlineHtml(html.to_string())),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => self.push_token(Token::HardBreak),
            Event::Rule => self.push_token(Token::Rule {
                attrs: AttrList::new(),
            }),
            Event::TaskListMarker(checked) => self.push_token(Token::TaskMarker(checked)),
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not supported
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.open(FrameKind::Paragraph),
            Tag::Heading { level, .. } => {
                self.open(FrameKind::Heading(heading_level_to_num(level)));
            }
            Tag::BlockQuote(_) => self.open(FrameKind::BlockQuote),
            Tag::CodeBlock(kind) => {
                let info = match kind {
                    CodeBlockKind::Fenced(info) => info.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                self.open(FrameKind::CodeBlock {
                    info,
                    code: String::new(),
                });
            }
            Tag::HtmlBlock => self.open(FrameKind::HtmlBlock { raw: String::new() }),
            Tag::List(start) => self.open(FrameKind::List(start)),
            Tag::Item => self.open(FrameKind::Item),
            Tag::DefinitionList => self.open(FrameKind::DefinitionList),
            Tag::DefinitionListTitle => self.open(FrameKind::DefinitionTitle),
            Tag::DefinitionListDefinition => self.open(FrameKind::DefinitionDetails),
            Tag::Table(alignments) => {
                let alignments = alignments.iter().map(|a| convert_alignment(*a)).collect();
                self.table_head.push(Vec::new());
                self.table_rows.push(Vec::new());
                self.open(FrameKind::Table { alignments });
            }
            Tag::TableHead => self.open(FrameKind::TableHead { cells: Vec::new() }),
            Tag::TableRow => self.open(FrameKind::TableRow { cells: Vec::new() }),
            Tag::TableCell => self.open(FrameKind::TableCell),
            Tag::Emphasis => self.open(FrameKind::Emphasis),
            Tag::Strong => self.open(FrameKind::Strong),
            Tag::Strikethrough => self.open(FrameKind::Strikethrough),
            Tag::Superscript => self.open(FrameKind::Superscript),
            Tag::Subscript => self.open(FrameKind::Subscript),
            Tag::Link {
                dest_url, title, ..
            } => self.open(FrameKind::Link {
                href: dest_url.to_string(),
                title: title.to_string(),
            }),
            Tag::Image {
                dest_url, title, ..
            } => self.open(FrameKind::Image {
                src: dest_url.to_string(),
                title: title.to_string(),
            }),
            Tag::FootnoteDefinition(_) | Tag::MetadataBlock(_) => {
                self.open(FrameKind::Transparent);
            }
        }
    }

    fn end_tag(&mut self, _tag: TagEnd) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        self.close_frame(frame);
    }

    #[allow(clippy::too_many_lines)]
    fn close_frame(&mut self, frame: Frame) {
        let children = frame.children;
        match frame.kind {
            FrameKind::Paragraph => self.push_token(Token::Paragraph {
                children,
                attrs: AttrList::new(),
            }),
            FrameKind::Heading(level) => self.push_token(Token::Heading {
                level,
                children,
                attrs: AttrList::new(),
            }),
            FrameKind::BlockQuote => self.push_token(Token::BlockQuote { children }),
            FrameKind::List(start) => self.push_token(Token::List {
                start,
                items: children,
            }),
            FrameKind::Item => self.push_token(Token::Item { children }),
            FrameKind::DefinitionList => self.push_token(Token::DefinitionList { children }),
            FrameKind::DefinitionTitle => self.push_token(Token::DefinitionTitle { children }),
            FrameKind::DefinitionDetails => self.push_token(Token::DefinitionDetails { children }),
            FrameKind::Emphasis => self.push_token(Token::Emphasis {
                children,
                attrs: AttrList::new(),
            }),
            FrameKind::Strong => self.push_token(Token::Strong {
                children,
                attrs: AttrList::new(),
            }),
            FrameKind::Strikethrough => self.push_token(Token::Strikethrough {
                children,
                attrs: AttrList::new(),
            }),
            FrameKind::Superscript => self.push_token(Token::Superscript {
                children,
                attrs: AttrList::new(),
            }),
            FrameKind::Subscript => self.push_token(Token::Subscript {
                children,
                attrs: AttrList::new(),
            }),
            FrameKind::Link { href, title } => {
                let mut attrs = AttrList::new();
                attrs.set_str("href", href);
                if !title.is_empty() {
                    attrs.set_str("title", title);
                }
                self.push_token(Token::Link { children, attrs });
            }
            FrameKind::Image { src, title } => {
                let alt = plain_text(&children);
                let mut attrs = AttrList::new();
                attrs.set_str("src", src);
                if !title.is_empty() {
                    attrs.set_str("title", title);
                }
                attrs.set_str("alt", escape_html(&alt));
                self.push_token(Token::Image { attrs });
            }
            FrameKind::CodeBlock { info, code } => {
                self.push_token(Token::CodeBlock { info, code });
            }
            FrameKind::HtmlBlock { raw } => self.push_token(Token::HtmlBlock(raw)),
            FrameKind::Table { alignments } => {
                let head = self.table_head.pop().unwrap_or_default();
                let rows = self.table_rows.pop().unwrap_or_default();
                self.push_token(Token::Table(TableToken {
                    alignments,
                    head,
                    rows,
                }));
            }
            FrameKind::TableHead { cells } => {
                if let Some(head) = self.table_head.last_mut() {
                    *head = cells;
                }
            }
            FrameKind::TableRow { cells } => {
                if let Some(rows) = self.table_rows.last_mut() {
                    rows.push(cells);
                }
            }
            FrameKind::TableCell => {
                // A cell closes into the nearest row or head frame.
                if let Some(parent) = self.stack.last_mut() {
                    match &mut parent.kind {
                        FrameKind::TableHead { cells } | FrameKind::TableRow { cells } => {
                            cells.push(children);
                        }
                        _ => parent.children.extend(children),
                    }
                }
            }
            FrameKind::Transparent => {
                for child in children {
                    self.push_token(child);
                }
            }
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(frame) = self.stack.last_mut() {
            match &mut frame.kind {
                FrameKind::CodeBlock { code, .. } => {
                    code.push_str(text);
                    return;
                }
                FrameKind::HtmlBlock { raw } => {
                    raw.push_str(text);
                    return;
                }
                _ => {}
            }
        }
        self.push_token(Token::Text(text.to_owned()));
    }

    fn block_html(&mut self, html: &str) {
        if let Some(frame) = self.stack.last_mut() {
            if let FrameKind::HtmlBlock { raw } = &mut frame.kind {
                raw.push_str(html);
                return;
            }
        }
        self.push_token(Token::HtmlBlock(html.to_owned()));
    }

    fn soft_break(&mut self) {
        if let Some(frame) = self.stack.last_mut() {
            if let FrameKind::CodeBlock { code, .. } = &mut frame.kind {
                code.push('\n');
                return;
            }
        }
        self.push_token(Token::SoftBreak);
    }
}

/// Convert a heading level enum to a number (1-6).
fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn convert_alignment(alignment: pulldown_cmark::Alignment) -> CellAlign {
    match alignment {
        pulldown_cmark::Alignment::None => CellAlign::None,
        pulldown_cmark::Alignment::Left => CellAlign::Left,
        pulldown_cmark::Alignment::Center => CellAlign::Center,
        pulldown_cmark::Alignment::Right => CellAlign::Right,
    }
}

/// Attach trailing `{...}` attribute fragments throughout a token list.
///
/// Three attachment sites, checked in order:
/// 1. a fragment standing alone on the final line of a block attaches to
///    the block itself;
/// 2. a fragment at the start of a text run immediately following an
///    inline token attaches to that token;
/// 3. a fragment at the end of a text run is consumed without effect
///    (plain text holds no attributes).
///
/// A paragraph consisting solely of a fragment attaches to its preceding
/// sibling block and disappears. Malformed fragments stay literal.
pub(crate) fn attach_attributes(tokens: &mut Vec<Token>) {
    for token in tokens.iter_mut() {
        attach_in_token(token);
    }
    attach_sibling_attrs(tokens);
}

fn attach_in_token(token: &mut Token) {
    match token {
        Token::Paragraph { children, attrs } | Token::Heading { children, attrs, .. } => {
            process_inline_run(children, Some(attrs));
        }
        Token::Emphasis { children, .. }
        | Token::Strong { children, .. }
        | Token::Strikethrough { children, .. }
        | Token::Superscript { children, .. }
        | Token::Subscript { children, .. }
        | Token::Link { children, .. }
        | Token::DefinitionTitle { children }
        | Token::DefinitionDetails { children } => process_inline_run(children, None),
        // Items and quotes hold either inline runs (tight lists) or
        // blocks; the inline pass recurses into block children itself.
        Token::BlockQuote { children } | Token::Item { children } => {
            process_inline_run(children, None);
            attach_sibling_attrs(children);
        }
        Token::DefinitionList { children } => attach_attributes(children),
        Token::List { items, .. } => attach_attributes(items),
        Token::Table(table) => {
            for cell in table.head.iter_mut().chain(table.rows.iter_mut().flatten()) {
                process_inline_run(cell, None);
            }
        }
        _ => {}
    }
}

fn process_inline_run(children: &mut Vec<Token>, mut block_attrs: Option<&mut AttrList>) {
    let mut i = 0;
    while i < children.len() {
        let Token::Text(text) = &children[i] else {
            attach_in_token(&mut children[i]);
            i += 1;
            continue;
        };
        let text = text.clone();

        if let Some(inner) = whole_fragment(&text) {
            let after_softbreak = i > 0 && matches!(children[i - 1], Token::SoftBreak);
            let is_last = i + 1 == children.len();
            if after_softbreak && is_last {
                // Fragment alone on the block's final line.
                let attrs = AttrList::parse(inner);
                if let Some(block) = block_attrs.as_deref_mut() {
                    block.merge(attrs);
                }
                children.truncate(i - 1);
                break;
            }
            if i > 0 && !after_softbreak {
                let attrs = AttrList::parse(inner);
                if let Some(target) = children[i - 1].attrs_mut() {
                    target.merge(attrs);
                }
                children.remove(i);
                continue;
            }
            i += 1;
            continue;
        }

        if text.starts_with('{')
            && i > 0
            && !matches!(children[i - 1], Token::SoftBreak | Token::HardBreak)
        {
            if let Some((inner, rest)) = leading_fragment(&text) {
                let attrs = AttrList::parse(inner);
                if let Some(target) = children[i - 1].attrs_mut() {
                    target.merge(attrs);
                }
                if rest.is_empty() {
                    children.remove(i);
                } else {
                    children[i] = Token::Text(rest.to_owned());
                }
                continue;
            }
        }

        if let Some((head, _inner)) = trailing_fragment(&text) {
            // Trailing fragment after a plain text run: consumed, no
            // rendered effect.
            children[i] = Token::Text(head.to_owned());
        }
        i += 1;
    }
}

fn attach_sibling_attrs(tokens: &mut Vec<Token>) {
    let mut i = 0;
    while i < tokens.len() {
        let fragment = match &tokens[i] {
            Token::Paragraph { children, .. } if children.len() == 1 => match &children[0] {
                Token::Text(t) => whole_fragment(t).map(ToOwned::to_owned),
                _ => None,
            },
            _ => None,
        };
        if let Some(inner) = fragment {
            if i > 0 {
                let attrs = AttrList::parse(&inner);
                if let Some(target) = tokens[i - 1].attrs_mut() {
                    target.merge(attrs);
                }
                tokens.remove(i);
                continue;
            }
        }
        i += 1;
    }
}

/// The entire string is one `{...}` fragment.
fn whole_fragment(s: &str) -> Option<&str> {
    let inner = s.strip_prefix('{')?.strip_suffix('}')?;
    if inner.is_empty() || inner.contains('}') {
        return None;
    }
    Some(inner)
}

/// A `{...}` fragment at the start of the string; returns (inner, rest).
fn leading_fragment(s: &str) -> Option<(&str, &str)> {
    let after_brace = s.strip_prefix('{')?;
    let close = after_brace.find('}')?;
    if close == 0 {
        return None;
    }
    Some((&after_brace[..close], &after_brace[close + 1..]))
}

/// A `{...}` fragment at the end of the string; returns (head, inner).
fn trailing_fragment(s: &str) -> Option<(&str, &str)> {
    let before_brace = s.strip_suffix('}')?;
    let open = before_brace.rfind('{')?;
    if open == 0 || open + 1 == before_brace.len() {
        return None;
    }
    Some((&before_brace[..open], &before_brace[open + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Options {
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
    }

    #[test]
    fn test_paragraph() {
        let tokens = build_tokens("Hello, world!", options());
        assert_eq!(tokens.len(), 1);
        match &tokens[0] {
            Token::Paragraph { children, .. } => {
                assert_eq!(children, &[Token::Text("Hello, world!".to_owned())]);
            }
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    #[test]
    fn test_emphasis_attr_attachment() {
        let tokens = build_tokens("a *b*{ .bla } c", options());
        let Token::Paragraph { children, .. } = &tokens[0] else {
            panic!("expected paragraph");
        };
        let Token::Emphasis { attrs, .. } = &children[1] else {
            panic!("expected emphasis, got {:?}", children[1]);
        };
        assert_eq!(attrs.get_str("class"), Some("bla"));
        assert_eq!(children[2], Token::Text(" c".to_owned()));
    }

    #[test]
    fn test_image_attr_attachment() {
        let tokens = build_tokens("![Nav A](/x.png){ .only-light .right }", options());
        let Token::Paragraph { children, .. } = &tokens[0] else {
            panic!("expected paragraph");
        };
        let Token::Image { attrs } = &children[0] else {
            panic!("expected image, got {:?}", children[0]);
        };
        assert_eq!(attrs.get_str("class"), Some("only-light right"));
        assert_eq!(attrs.get_str("alt"), Some("Nav A"));
        assert_eq!(children.len(), 1);
    }

    #[test]
    fn test_paragraph_own_line_attrs() {
        let tokens = build_tokens("lorem ipsum\n{ .fancy }", options());
        let Token::Paragraph { children, attrs } = &tokens[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(attrs.get_str("class"), Some("fancy"));
        assert_eq!(children, &[Token::Text("lorem ipsum".to_owned())]);
    }

    #[test]
    fn test_heading_sibling_attrs() {
        let tokens = build_tokens("# Heading 1\n{ .fancy }", options());
        assert_eq!(tokens.len(), 1);
        let Token::Heading { attrs, .. } = &tokens[0] else {
            panic!("expected heading");
        };
        assert_eq!(attrs.get_str("class"), Some("fancy"));
    }

    #[test]
    fn test_heading_custom_id() {
        let tokens = build_tokens("## Hello\n{ #world }", options());
        let Token::Heading { attrs, .. } = &tokens[0] else {
            panic!("expected heading");
        };
        assert_eq!(attrs.get_str("id"), Some("world"));
    }

    #[test]
    fn test_rule_sibling_attrs() {
        let tokens = build_tokens("----\n\n{ .fancy }", options());
        assert_eq!(tokens.len(), 1);
        let Token::Rule { attrs } = &tokens[0] else {
            panic!("expected rule, got {:?}", tokens[0]);
        };
        assert_eq!(attrs.get_str("class"), Some("fancy"));
    }

    #[test]
    fn test_trailing_fragment_after_text_consumed() {
        let tokens = build_tokens("- One\n- Two{ .fancy }\n- Three", options());
        let Token::List { items, .. } = &tokens[0] else {
            panic!("expected list");
        };
        let Token::Item { children } = &items[1] else {
            panic!("expected item");
        };
        assert_eq!(children, &[Token::Text("Two".to_owned())]);
    }

    #[test]
    fn test_malformed_fragment_stays_literal() {
        let tokens = build_tokens("a *b*{ unclosed c", options());
        let Token::Paragraph { children, .. } = &tokens[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(children[2], Token::Text("{ unclosed c".to_owned()));
    }

    #[test]
    fn test_codespan_attr_attachment() {
        let tokens = build_tokens("a `b`{ .bla } c", options());
        let Token::Paragraph { children, .. } = &tokens[0] else {
            panic!("expected paragraph");
        };
        let Token::CodeSpan { attrs, .. } = &children[1] else {
            panic!("expected code span");
        };
        assert_eq!(attrs.get_str("class"), Some("bla"));
    }

    #[test]
    fn test_link_attrs_merge_with_href() {
        let tokens = build_tokens("[Meh](#meh){ #green }", options());
        let Token::Paragraph { children, .. } = &tokens[0] else {
            panic!("expected paragraph");
        };
        let Token::Link { attrs, .. } = &children[0] else {
            panic!("expected link");
        };
        assert_eq!(attrs.get_str("href"), Some("#meh"));
        assert_eq!(attrs.get_str("id"), Some("green"));
    }

    #[test]
    fn test_code_block_collects_text() {
        let tokens = build_tokens("```rust\nfn main() {}\n```", options());
        let Token::CodeBlock { info, code } = &tokens[0] else {
            panic!("expected code block");
        };
        assert_eq!(info, "rust");
        assert_eq!(code, "fn main() {}\n");
    }

    #[test]
    fn test_table_structure() {
        let tokens = build_tokens("| A | B |\n|---|---|\n| 1 | 2 |", options());
        let Token::Table(table) = &tokens[0] else {
            panic!("expected table, got {:?}", tokens[0]);
        };
        assert_eq!(table.head.len(), 2);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].len(), 2);
    }

    #[test]
    fn test_task_list_markers() {
        let tokens = build_tokens("- [x] done\n- [ ] open", options());
        let Token::List { items, .. } = &tokens[0] else {
            panic!("expected list");
        };
        let Token::Item { children } = &items[0] else {
            panic!("expected item");
        };
        assert_eq!(children[0], Token::TaskMarker(true));
    }

    #[test]
    fn test_inline_component_tag_passes_through() {
        let tokens = build_tokens("The <Test title=\"meh\">_HTML_</Test> spec", options());
        let Token::Paragraph { children, .. } = &tokens[0] else {
            panic!("expected paragraph");
        };
        assert!(
            children
                .iter()
                .any(|t| matches!(t, Token::InlineHtml(h) if h.contains("<Test"))),
            "inline component tag should flow through as inline html: {children:?}"
        );
        assert!(
            children
                .iter()
                .any(|t| matches!(t, Token::Emphasis { .. })),
            "interior markdown should still be processed"
        );
    }

    #[test]
    fn test_build_inline_tokens() {
        let tokens = build_inline_tokens("**Bold** Label", options());
        assert!(matches!(tokens[0], Token::Strong { .. }));
        assert_eq!(tokens[1], Token::Text(" Label".to_owned()));
    }
}
