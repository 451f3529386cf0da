//! Table of contents collection and rendering.

use std::fmt::Write;

/// One table-of-contents entry.
///
/// Entries nest: a heading becomes a child of the nearest preceding
/// heading with a strictly smaller level.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    /// Anchor id for deep links.
    pub id: String,
    /// Tag-stripped display name.
    pub name: String,
    /// Rendered inner HTML of the heading.
    pub html: String,
    /// Entries nested under this one.
    pub children: Vec<TocEntry>,
}

/// Placeholder written by the `toc` directive, replaced after rendering.
pub(crate) const TOC_MARKER: &str = "<!--docweave-toc-->";

/// Nest a flat, document-ordered entry list by heading level.
pub(crate) fn nest_entries(flat: Vec<TocEntry>) -> Vec<TocEntry> {
    let mut root: Vec<TocEntry> = Vec::new();
    let mut stack: Vec<TocEntry> = Vec::new();

    for entry in flat {
        close_until(&mut stack, &mut root, entry.level);
        stack.push(entry);
    }
    close_until(&mut stack, &mut root, 0);

    root
}

/// Pop entries at or below `level`, attaching each to its parent.
fn close_until(stack: &mut Vec<TocEntry>, root: &mut Vec<TocEntry>, level: u8) {
    while stack.last().is_some_and(|top| level <= top.level) {
        let done = stack.pop().expect("stack checked non-empty");
        match stack.last_mut() {
            Some(parent) => parent.children.push(done),
            None => root.push(done),
        }
    }
}

/// Render nested entries as the TOC's HTML list.
pub(crate) fn render_toc(entries: &[TocEntry]) -> String {
    let mut out = String::from("<div class=\"toc\">\n");
    if !entries.is_empty() {
        render_level(entries, &mut out);
    }
    out.push_str("</div>\n");
    out
}

fn render_level(entries: &[TocEntry], out: &mut String) {
    out.push_str("<ul>\n");
    for entry in entries {
        let _ = write!(out, "<li><a href=\"#{}\">{}</a>", entry.id, entry.html);
        if !entry.children.is_empty() {
            out.push('\n');
            render_level(&entry.children, out);
        }
        out.push_str("</li>\n");
    }
    out.push_str("</ul>\n");
}
