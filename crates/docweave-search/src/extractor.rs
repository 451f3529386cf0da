//! Streaming text extraction from rendered HTML.
//!
//! A single forward pass over the markup, no DOM: visible text
//! accumulates into a buffer that is flushed into fragments whenever it
//! exceeds the configured size, carrying a small tail of the previous
//! fragment into the next so a search hit near a boundary keeps its
//! context.

use std::collections::BTreeMap;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::entities::decode_entity;
use crate::{PageRef, SearchFragment};

/// Elements whose entire subtree is invisible to search.
const IGNORED_ELEMENTS: &[&str] = &[
    "button", "dialog", "form", "iframe", "input", "nav", "script", "select", "style", "svg",
    "template", "textarea", "video",
];

/// Heading elements that update the current anchor and fragment title.
const HEADER_ELEMENTS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Block-level elements; their close inserts a word boundary.
const BLOCK_ELEMENTS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "canvas",
    "dd",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "main",
    "nav",
    "noscript",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tfoot",
    "ul",
    "video",
];

/// HTML void elements: they never open a subtree.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Walk one page's HTML and collect its fragments.
pub(crate) fn extract(
    page: &PageRef<'_>,
    html: &str,
    fragment_size: usize,
    overlap_size: usize,
) -> BTreeMap<String, SearchFragment> {
    let mut reader = Reader::from_str(html);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;

    let mut extractor = Extractor::new(page, fragment_size, overlap_size);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let tag = tag_name(e.name().as_ref());
                let id = element_id(&e);
                extractor.handle_start(&tag, id);
            }
            Ok(Event::Empty(e)) => {
                let tag = tag_name(e.name().as_ref());
                extractor.handle_empty(&tag);
            }
            Ok(Event::End(e)) => {
                let tag = tag_name(e.name().as_ref());
                extractor.handle_end(&tag);
            }
            Ok(Event::Text(e)) => match reader.decoder().decode(&e) {
                Ok(text) => extractor.append_text(&text),
                Err(err) => {
                    tracing::warn!(page = page.id, error = %err, "undecodable text run");
                }
            },
            Ok(Event::GeneralRef(e)) => {
                if let Ok(name) = reader.decoder().decode(&e) {
                    extractor.append_text(&decode_entity(&name));
                }
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                extractor.append_text(&text);
            }
            Ok(Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_)) => {}
            Ok(Event::Eof) => break,
            Err(err) => {
                // Degrade: index what was seen so far, never fail a build.
                tracing::warn!(page = page.id, error = %err, "stopped walking page html");
                break;
            }
        }
    }

    extractor.finish()
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

fn element_id(e: &quick_xml::events::BytesStart<'_>) -> Option<String> {
    e.html_attributes().flatten().find_map(|attr| {
        if attr.key.as_ref() == b"id" {
            Some(
                attr.unescape_value()
                    .map_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned(), |v| {
                        v.into_owned()
                    }),
            )
        } else {
            None
        }
    })
}

struct Extractor<'a> {
    page: &'a PageRef<'a>,
    fragment_size: usize,
    overlap_size: usize,
    docs: BTreeMap<String, SearchFragment>,
    /// Whitespace-collapsed content buffer.
    content: String,
    /// Buffer length in characters.
    content_len: usize,
    /// Current fragment title (nearest preceding heading).
    title: String,
    /// Text capture while inside a heading element.
    heading_buf: Option<String>,
    /// Most recent heading id.
    anchor: String,
    /// Next fragment sequence number.
    seq: usize,
    /// Open (non-void) element depth.
    depth: usize,
    /// Depth at which an ignored element suspended capture.
    suspended: Option<usize>,
}

impl<'a> Extractor<'a> {
    fn new(page: &'a PageRef<'a>, fragment_size: usize, overlap_size: usize) -> Self {
        Self {
            page,
            fragment_size,
            overlap_size,
            docs: BTreeMap::new(),
            content: String::new(),
            content_len: 0,
            title: String::new(),
            heading_buf: None,
            anchor: String::new(),
            seq: 1,
            depth: 0,
            suspended: None,
        }
    }

    fn capturing(&self) -> bool {
        self.suspended.is_none()
    }

    fn handle_start(&mut self, tag: &str, id: Option<String>) {
        let is_void = VOID_ELEMENTS.contains(&tag);
        if !self.capturing() {
            if !is_void {
                self.depth += 1;
            }
            return;
        }

        if IGNORED_ELEMENTS.contains(&tag) && !is_void {
            self.suspended = Some(self.depth);
            self.depth += 1;
            return;
        }

        if HEADER_ELEMENTS.contains(&tag) {
            self.heading_buf = Some(String::new());
            if let Some(id) = id {
                self.anchor = id;
            }
        }

        if !is_void {
            self.depth += 1;
        }
    }

    fn handle_end(&mut self, tag: &str) {
        if VOID_ELEMENTS.contains(&tag) {
            return;
        }
        if self.depth > 0 {
            self.depth -= 1;
        }

        if let Some(limit) = self.suspended {
            // Capture resumes at the close of the element that
            // suspended it; its dropped subtree leaves no trace.
            if self.depth <= limit {
                self.suspended = None;
            }
            return;
        }

        if HEADER_ELEMENTS.contains(&tag) {
            if let Some(buf) = self.heading_buf.take() {
                let collapsed = collapse(&buf);
                if !collapsed.is_empty() {
                    self.title = collapsed;
                }
            }
        }

        if BLOCK_ELEMENTS.contains(&tag) {
            self.push_space();
        }
    }

    fn handle_empty(&mut self, tag: &str) {
        if self.capturing() && BLOCK_ELEMENTS.contains(&tag) {
            self.push_space();
        }
    }

    fn append_text(&mut self, text: &str) {
        if !self.capturing() {
            return;
        }
        let cleaned = clean_text(text);
        if cleaned.is_empty() {
            return;
        }
        if let Some(buf) = &mut self.heading_buf {
            buf.push_str(&cleaned);
        }

        // Feed word by word so one oversized text run cannot blow past
        // the fragment size by more than a word.
        if cleaned.starts_with(' ') {
            self.push_space();
        }
        let mut words = cleaned.split_whitespace().peekable();
        while let Some(word) = words.next() {
            self.push_word(word);
            if words.peek().is_some() {
                self.push_space();
            }
            if self.content_len > self.fragment_size {
                self.save_fragment();
            }
        }
        if cleaned.ends_with(' ') {
            self.push_space();
        }
    }

    fn push_space(&mut self) {
        if !self.content.is_empty() && !self.content.ends_with(' ') {
            self.content.push(' ');
            self.content_len += 1;
        }
    }

    fn push_word(&mut self, word: &str) {
        self.content.push_str(word);
        self.content_len += word.chars().count();
    }

    /// Emit the buffered content as a fragment and seed the next buffer
    /// with the trailing overlap (minus its leading partial word).
    fn save_fragment(&mut self) {
        let content = self.content.trim();
        if content.is_empty() || content.chars().count() <= self.overlap_size {
            return;
        }

        let title = if self.title.is_empty() {
            self.page.title.to_owned()
        } else {
            self.title.clone()
        };
        let url = if self.anchor.is_empty() {
            self.page.url.to_owned()
        } else {
            format!("{}#{}", self.page.url, self.anchor)
        };
        self.docs.insert(
            format!("{}-{}", self.page.id, self.seq),
            SearchFragment {
                title,
                content: content.to_owned(),
                section: self.page.url.to_owned(),
                url,
            },
        );
        self.seq += 1;

        let seeded = overlap_seed(content, self.overlap_size);
        self.content_len = seeded.chars().count();
        self.content = seeded;
    }

    fn finish(mut self) -> BTreeMap<String, SearchFragment> {
        if !self.content.trim().is_empty() {
            self.save_fragment();
        }
        self.docs
    }
}

/// The seed carried from one fragment into the next: the final
/// `overlap_size` characters, minus the leading word the cut truncated.
fn overlap_seed(content: &str, overlap_size: usize) -> String {
    let chars: Vec<char> = content.chars().collect();
    let tail_start = chars.len().saturating_sub(overlap_size);
    let tail: String = chars[tail_start..].iter().collect();

    let mut seeded = String::new();
    for word in tail.split(' ').skip(1) {
        if word.is_empty() {
            continue;
        }
        seeded.push_str(word);
        seeded.push(' ');
    }
    seeded
}

/// Strip newlines and pilcrow markers, collapse whitespace runs.
fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = false;
    for c in text.chars() {
        match c {
            '\n' | '\r' | '¶' => {}
            c if c.is_whitespace() => {
                if !last_space {
                    out.push(' ');
                    last_space = true;
                }
            }
            c => {
                out.push(c);
                last_space = false;
            }
        }
    }
    out
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: PageRef<'static> = PageRef {
        id: "page",
        title: "Page Title",
        url: "/docs/page/",
    };

    fn index(html: &str, fragment_size: usize, overlap_size: usize) -> BTreeMap<String, SearchFragment> {
        extract(&PAGE, html, fragment_size, overlap_size)
    }

    #[test]
    fn test_single_fragment() {
        let docs = index("<p>Install the tool and run it once.</p>", 60, 3);
        assert_eq!(docs.len(), 1);
        let fragment = &docs["page-1"];
        assert_eq!(fragment.content, "Install the tool and run it once.");
        assert_eq!(fragment.title, "Page Title");
        assert_eq!(fragment.section, "/docs/page/");
        assert_eq!(fragment.url, "/docs/page/");
    }

    #[test]
    fn test_short_remainder_dropped() {
        // Content no longer than the overlap is too small to index.
        let docs = index("<p>tiny</p>", 60, 4);
        assert!(docs.is_empty());
    }

    #[test]
    fn test_heading_sets_title_and_anchor() {
        let docs = index(
            "<h2 id=\"setup\">Setup</h2><p>Install the tool and run it once to verify.</p>",
            200,
            4,
        );
        let fragment = &docs["page-1"];
        assert_eq!(fragment.title, "Setup");
        assert_eq!(fragment.url, "/docs/page/#setup");
        assert!(fragment.content.starts_with("Setup Install the tool"));
    }

    #[test]
    fn test_ignored_subtree_dropped_and_capture_resumes() {
        let docs = index(
            "<p>before</p><script>var hidden = \"secret\";</script><p>after the script</p>",
            200,
            3,
        );
        let fragment = &docs["page-1"];
        assert_eq!(fragment.content, "before after the script");
    }

    #[test]
    fn test_nested_ignored_elements() {
        let docs = index(
            "<p>start</p><nav><ul><li>menu entry</li><svg><text>icon</text></svg></ul></nav><p>end of page</p>",
            200,
            3,
        );
        assert_eq!(docs["page-1"].content, "start end of page");
    }

    #[test]
    fn test_void_input_does_not_suspend() {
        // <input> is in the ignored set but is void: it has no subtree
        // and must not swallow the rest of the page.
        let docs = index(
            "<input id=\"__tabbed_1_1\" name=\"__tabbed_1\" type=\"radio\" checked><p>visible content here</p>",
            200,
            3,
        );
        assert_eq!(docs["page-1"].content, "visible content here");
    }

    #[test]
    fn test_block_boundary_inserts_space() {
        let docs = index("<p>alpha</p><p>beta</p><div>gamma</div>", 200, 2);
        assert_eq!(docs["page-1"].content, "alpha beta gamma");
    }

    #[test]
    fn test_inline_boundary_does_not_insert_space() {
        let docs = index("<p>re<em>mark</em>able words</p>", 200, 2);
        assert_eq!(docs["page-1"].content, "remarkable words");
    }

    #[test]
    fn test_entities_decoded() {
        let docs = index("<p>AT&amp;T &lt;tags&gt; and&nbsp;more</p>", 200, 2);
        assert_eq!(docs["page-1"].content, "AT&T <tags> and more");
    }

    #[test]
    fn test_newlines_stripped_and_whitespace_collapsed() {
        let docs = index("<p>one\ntwo   three\t four</p>", 200, 2);
        assert_eq!(docs["page-1"].content, "onetwo three four");
    }

    #[test]
    fn test_fragment_ids_sequential() {
        let words: Vec<String> = (0..40).map(|n| format!("word{n:02}")).collect();
        let html = format!("<p>{}</p>", words.join(" "));
        let docs = index(&html, 60, 3);
        assert!(docs.len() > 1);
        for n in 1..=docs.len() {
            assert!(docs.contains_key(&format!("page-{n}")));
        }
    }

    #[test]
    fn test_fragment_size_bound() {
        let words: Vec<String> = (0..80).map(|n| format!("word{n:02}")).collect();
        let html = format!("<p>{}</p>", words.join(" "));
        let fragment_size = 50;
        let docs = index(&html, fragment_size, 2);
        for fragment in docs.values() {
            // One word of tolerance past the threshold.
            assert!(fragment.content.chars().count() <= fragment_size + 7);
        }
    }

    #[test]
    fn test_overlap_carried_into_next_fragment() {
        let words: Vec<String> = (0..40).map(|n| format!("word{n:02}")).collect();
        let html = format!("<p>{}</p>", words.join(" "));
        let overlap = 12;
        let docs = index(&html, 80, overlap);
        assert!(docs.len() > 1);

        let first = &docs["page-1"].content;
        let second = &docs["page-2"].content;
        let seed = overlap_seed(first, overlap);
        assert!(!seed.is_empty());
        assert!(
            second.starts_with(seed.trim_end()),
            "second fragment {second:?} should start with seed {seed:?}"
        );
    }

    #[test]
    fn test_fragments_reconstruct_page_text() {
        let words: Vec<String> = (0..60).map(|n| format!("word{n:02}")).collect();
        let full_text = words.join(" ");
        let html = format!("<p>{full_text}</p>");
        let overlap = 12;
        let docs = index(&html, 70, overlap);
        assert!(docs.len() > 1);

        let mut reconstructed = String::new();
        for n in 1..=docs.len() {
            let content = &docs[&format!("page-{n}")].content;
            if n == 1 {
                reconstructed.push_str(content);
            } else {
                let seed = overlap_seed(&docs[&format!("page-{}", n - 1)].content, overlap);
                let stripped = content
                    .strip_prefix(seed.trim_end())
                    .unwrap_or(content)
                    .trim_start();
                reconstructed.push(' ');
                reconstructed.push_str(stripped);
            }
        }
        assert_eq!(reconstructed, full_text);
    }

    #[test]
    fn test_title_follows_latest_heading() {
        let words: Vec<String> = (0..30).map(|n| format!("word{n:02}")).collect();
        let html = format!(
            "<h2 id=\"first\">First</h2><p>{}</p><h2 id=\"second\">Second</h2><p>{}</p>",
            words.join(" "),
            words.join(" ")
        );
        let docs = index(&html, 120, 4);
        assert!(docs.len() >= 2);
        assert_eq!(docs["page-1"].title, "First");
        assert_eq!(docs["page-1"].url, "/docs/page/#first");
        let last = &docs[&format!("page-{}", docs.len())];
        assert_eq!(last.title, "Second");
        assert_eq!(last.url, "/docs/page/#second");
    }

    #[test]
    fn test_malformed_html_degrades() {
        // An unclosed element and a stray close tag must not panic or
        // lose the text seen before them.
        let docs = index("<p>seen text before the mess</div><p>rest", 200, 3);
        assert!(!docs.is_empty());
        assert!(docs["page-1"].content.contains("seen text"));
    }

    #[test]
    fn test_uppercase_component_tags_are_plain_elements() {
        let docs = index("<Test data-x=\"1\">component body text</Test>", 200, 3);
        assert_eq!(docs["page-1"].content, "component body text");
    }
}
