//! The compiler's token model.
//!
//! Parsing produces a tree of [`Token`] values, one variant per construct,
//! each carrying only the fields relevant to that construct. Children are
//! owned exclusively by their parent; the tree is acyclic and dropped once
//! rendering completes. The renderer dispatches with a single exhaustive
//! match, so adding a variant is a compile error until it renders.

use crate::attrs::AttrList;

/// Column alignment for table cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellAlign {
    None,
    Left,
    Center,
    Right,
}

/// A parsed table: header cells, body rows, per-column alignment.
#[derive(Clone, Debug, PartialEq)]
pub struct TableToken {
    pub alignments: Vec<CellAlign>,
    /// Header row cells, each a list of inline tokens.
    pub head: Vec<Vec<Token>>,
    /// Body rows, each a list of cells.
    pub rows: Vec<Vec<Vec<Token>>>,
}

/// A parsed admonition directive.
#[derive(Clone, Debug, PartialEq)]
pub struct AdmonitionToken {
    /// Directive name: `note`, `tip`, `warning`, `error`, `new`, ...
    pub name: String,
    /// Title text; defaults to the capitalized name.
    pub title: String,
    /// Extra classes from the `:class:` option.
    pub class: Option<String>,
    /// Render as a disclosure element.
    pub collapsible: bool,
    /// Disclosure open by default.
    pub open: bool,
    /// Recursively parsed body.
    pub body: Vec<Token>,
}

/// A single `tab` directive before grouping.
#[derive(Clone, Debug, PartialEq)]
pub struct TabToken {
    /// Inline-parsed label; empty means "use the tab index".
    pub label: Vec<Token>,
    /// Recursively parsed body.
    pub body: Vec<Token>,
    /// `:new: true` forces this tab to start a new group.
    pub new_group: bool,
    /// `:select: true` makes this tab the group's default selection.
    pub select: bool,
}

/// One tab inside a grouped tab set.
#[derive(Clone, Debug, PartialEq)]
pub struct TabEntry {
    pub label: Vec<Token>,
    pub body: Vec<Token>,
    pub selected: bool,
}

/// A grouped run of adjacent tabs sharing one radio group.
#[derive(Clone, Debug, PartialEq)]
pub struct TabSetToken {
    /// Document-scoped 1-based group number.
    pub group: usize,
    pub tabs: Vec<TabEntry>,
}

/// A node in the parsed document tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    // Block-level.
    Paragraph {
        children: Vec<Token>,
        attrs: AttrList,
    },
    Heading {
        level: u8,
        children: Vec<Token>,
        attrs: AttrList,
    },
    BlockQuote {
        children: Vec<Token>,
    },
    /// Fenced or indented code, with the raw fence info string.
    CodeBlock {
        info: String,
        code: String,
    },
    List {
        /// Start number for ordered lists, `None` for bullet lists.
        start: Option<u64>,
        items: Vec<Token>,
    },
    Item {
        children: Vec<Token>,
    },
    DefinitionList {
        children: Vec<Token>,
    },
    DefinitionTitle {
        children: Vec<Token>,
    },
    DefinitionDetails {
        children: Vec<Token>,
    },
    Table(TableToken),
    /// Raw block HTML from the base parser, emitted verbatim.
    HtmlBlock(String),
    /// An opaque custom-component span (`<Tag ...>...</Tag>`), preserved
    /// byte-for-byte with no markdown processing of its interior.
    Component(String),
    Rule {
        attrs: AttrList,
    },

    // Directive-produced.
    Admonition(AdmonitionToken),
    Tab(TabToken),
    TabSet(TabSetToken),
    /// Generic container from the `div` directive.
    Container {
        classes: Vec<String>,
        children: Vec<Token>,
    },
    /// Placeholder replaced by the rendered table of contents.
    TocMarker,
    /// Visible error block for an unresolvable include path.
    IncludeError {
        path: String,
    },

    // Inline-level.
    Text(String),
    CodeSpan {
        text: String,
        attrs: AttrList,
    },
    Emphasis {
        children: Vec<Token>,
        attrs: AttrList,
    },
    Strong {
        children: Vec<Token>,
        attrs: AttrList,
    },
    Strikethrough {
        children: Vec<Token>,
        attrs: AttrList,
    },
    Superscript {
        children: Vec<Token>,
        attrs: AttrList,
    },
    Subscript {
        children: Vec<Token>,
        attrs: AttrList,
    },
    Link {
        children: Vec<Token>,
        attrs: AttrList,
    },
    Image {
        attrs: AttrList,
    },
    /// Raw inline HTML, emitted verbatim.
    InlineHtml(String),
    TaskMarker(bool),
    SoftBreak,
    HardBreak,
}

impl Token {
    /// Mutable access to the attribute list, for variants that carry one.
    ///
    /// Attribute attachment targets that cannot hold attributes (plain
    /// text, raw HTML, containers that ignore them) return `None`; the
    /// fragment is still consumed, it just has no rendered effect.
    pub(crate) fn attrs_mut(&mut self) -> Option<&mut AttrList> {
        match self {
            Token::Paragraph { attrs, .. }
            | Token::Heading { attrs, .. }
            | Token::Rule { attrs }
            | Token::CodeSpan { attrs, .. }
            | Token::Emphasis { attrs, .. }
            | Token::Strong { attrs, .. }
            | Token::Strikethrough { attrs, .. }
            | Token::Superscript { attrs, .. }
            | Token::Subscript { attrs, .. }
            | Token::Link { attrs, .. }
            | Token::Image { attrs } => Some(attrs),
            _ => None,
        }
    }

    /// Explicit id attribute, if any.
    pub(crate) fn id_attr(&self) -> Option<&str> {
        match self {
            Token::Paragraph { attrs, .. }
            | Token::Heading { attrs, .. }
            | Token::Rule { attrs }
            | Token::CodeSpan { attrs, .. }
            | Token::Emphasis { attrs, .. }
            | Token::Strong { attrs, .. }
            | Token::Strikethrough { attrs, .. }
            | Token::Superscript { attrs, .. }
            | Token::Subscript { attrs, .. }
            | Token::Link { attrs, .. }
            | Token::Image { attrs } => attrs.get_str("id"),
            _ => None,
        }
    }
}

/// Concatenate the visible text of a token list, tags stripped.
///
/// Used for heading slugs, TOC display names and image alt text.
#[must_use]
pub(crate) fn plain_text(tokens: &[Token]) -> String {
    let mut out = String::new();
    collect_plain_text(tokens, &mut out);
    out
}

fn collect_plain_text(tokens: &[Token], out: &mut String) {
    for token in tokens {
        match token {
            Token::Text(s) | Token::CodeSpan { text: s, .. } => out.push_str(s),
            Token::SoftBreak => out.push('\n'),
            Token::Emphasis { children, .. }
            | Token::Strong { children, .. }
            | Token::Strikethrough { children, .. }
            | Token::Superscript { children, .. }
            | Token::Subscript { children, .. }
            | Token::Link { children, .. }
            | Token::Paragraph { children, .. }
            | Token::Heading { children, .. } => collect_plain_text(children, out),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_strips_formatting() {
        let tokens = vec![
            Token::Text("Install ".to_owned()),
            Token::CodeSpan {
                text: "npm".to_owned(),
                attrs: AttrList::new(),
            },
            Token::Emphasis {
                children: vec![Token::Text(" now".to_owned())],
                attrs: AttrList::new(),
            },
        ];
        assert_eq!(plain_text(&tokens), "Install npm now");
    }

    #[test]
    fn test_attrs_mut_on_text_is_none() {
        let mut token = Token::Text("plain".to_owned());
        assert!(token.attrs_mut().is_none());
    }
}
