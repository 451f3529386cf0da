//! Attribute list parsing and serialization.
//!
//! Parses the curly-brace attribute syntax that can trail inline and block
//! constructs: `{ .class #id key="value" flag }`. The scanner is an explicit
//! character-driven lexer rather than a pile of regex alternatives, so the
//! quoting rules stay auditable.

/// A single attribute value.
///
/// Values are either bare flags (rendered as boolean properties) or strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrValue {
    /// Presence-only flag, e.g. `collapsible`.
    Flag(bool),
    /// String value, e.g. `title="..."`.
    Str(String),
}

impl AttrValue {
    /// String form of the value, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Flag(_) => None,
        }
    }
}

/// An ordered attribute mapping.
///
/// Keys are case-sensitive. Insertion order is preserved so that
/// last-writer-wins conflicts resolve deterministically; serialization
/// sorts, so ordering never leaks into output.
///
/// # Example
///
/// ```
/// use docweave_markdown::AttrList;
///
/// let attrs = AttrList::parse(r#".right class="only-light" title="Nav""#);
/// assert_eq!(attrs.get_str("class"), Some("only-light right"));
/// assert_eq!(attrs.render(), r#" class="only-light right" title="Nav""#);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttrList {
    entries: Vec<(String, AttrValue)>,
}

/// One token produced by the attribute scanner.
enum Scanned {
    Class(String),
    Id(String),
    KeyValue(String, String),
    Flag(String),
}

impl AttrList {
    /// Create an empty attribute list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an attribute fragment, without its enclosing braces.
    ///
    /// Tokens are scanned left to right: `key="value"`, `key='value'`,
    /// `key=bare`, `.class`, `#id`, and barewords (boolean-true flags).
    /// A token that matches no rule ends processing; the remainder is
    /// dropped rather than reported.
    ///
    /// Classes collected from `.shortcut` tokens are deduplicated in
    /// encounter order and appended after any explicit `class="..."`
    /// value. For every other key the last occurrence wins.
    #[must_use]
    pub fn parse(fragment: &str) -> Self {
        let mut list = Self::new();
        let mut classes: Vec<String> = Vec::new();

        for token in scan(fragment.trim()) {
            match token {
                Scanned::Class(c) => {
                    if !classes.contains(&c) {
                        classes.push(c);
                    }
                }
                Scanned::Id(v) => list.set("id", AttrValue::Str(v)),
                Scanned::KeyValue(k, v) => list.set(&k, AttrValue::Str(v)),
                Scanned::Flag(w) => list.set(&w, AttrValue::Flag(true)),
            }
        }

        if !classes.is_empty() {
            let joined = classes.join(" ");
            match list.entries.iter().position(|(k, _)| k == "class") {
                Some(index) => match &mut list.entries[index].1 {
                    AttrValue::Str(existing) => {
                        existing.push(' ');
                        existing.push_str(&joined);
                    }
                    slot @ AttrValue::Flag(_) => *slot = AttrValue::Str(joined),
                },
                None => list
                    .entries
                    .push(("class".to_owned(), AttrValue::Str(joined))),
            }
        }

        list
    }

    /// Whether the list has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Look up a string value by key.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttrValue::as_str)
    }

    /// Whether a key is present at all (flag or string).
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut AttrValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Set a key, overwriting any existing value in place.
    ///
    /// `class` is the exception: setting it onto an existing class value
    /// appends (space-joined) instead of overwriting, so classes
    /// accumulate across attachment sites.
    pub fn set(&mut self, key: &str, value: AttrValue) {
        if key == "class" {
            if let AttrValue::Str(new) = &value {
                if let Some(AttrValue::Str(existing)) = self.get_mut("class") {
                    existing.push(' ');
                    existing.push_str(new);
                    return;
                }
            }
        }
        if let Some(index) = self.entries.iter().position(|(k, _)| k == key) {
            self.entries[index].1 = value;
        } else {
            self.entries.push((key.to_owned(), value));
        }
    }

    /// Set a string value.
    pub fn set_str(&mut self, key: &str, value: impl Into<String>) {
        self.set(key, AttrValue::Str(value.into()));
    }

    /// Merge another attribute list into this one.
    ///
    /// Class values accumulate; every other key overwrites.
    pub fn merge(&mut self, other: Self) {
        for (key, value) in other.entries {
            self.set(&key, value);
        }
    }

    /// Serialize to an HTML attribute string.
    ///
    /// Underscores in names become hyphens. Values `false`/`False` drop
    /// the attribute; `true`/`True` and bare flags become properties.
    /// `key="value"` pairs are sorted by key, properties by name, pairs
    /// first. Non-empty output carries a leading space so call sites can
    /// splice directly after a tag name.
    #[must_use]
    pub fn render(&self) -> String {
        let mut pairs: Vec<(String, &str)> = Vec::new();
        let mut props: Vec<String> = Vec::new();

        for (name, value) in &self.entries {
            let name = name.replace('_', "-");
            match value {
                AttrValue::Flag(false) => {}
                AttrValue::Flag(true) => props.push(name),
                AttrValue::Str(s) => match s.as_str() {
                    "false" | "False" => {}
                    "true" | "True" => props.push(name),
                    _ => pairs.push((name, s)),
                },
            }
        }

        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        props.sort();

        let mut out = String::new();
        for (name, value) in pairs {
            out.push(' ');
            out.push_str(&name);
            out.push('=');
            out.push_str(&quote_value(value));
        }
        for name in props {
            out.push(' ');
            out.push_str(&name);
        }
        out
    }
}

/// Quote an attribute value.
///
/// Double quotes unless the value contains one; then single quotes, or
/// `&quot;`-escaped double quotes when both quote characters appear.
fn quote_value(value: &str) -> String {
    if value.contains('"') {
        if value.contains('\'') {
            format!("\"{}\"", value.replace('"', "&quot;"))
        } else {
            format!("'{value}'")
        }
    } else {
        format!("\"{value}\"")
    }
}

/// Scan an attribute fragment into tokens.
///
/// Stops at the first position where no rule applies; the unscanned
/// remainder is discarded.
fn scan(input: &str) -> Vec<Scanned> {
    let mut out = Vec::new();
    let mut rest = input;

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }

        // A word runs until whitespace or '='.
        let word_end = rest
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(rest.len());
        if word_end == 0 {
            break; // stray '='
        }
        let word = &rest[..word_end];
        let after = &rest[word_end..];

        if let Some(value_part) = after.strip_prefix('=') {
            let Some((value, tail)) = scan_value(value_part) else {
                break; // unterminated quote or empty bare value
            };
            out.push(Scanned::KeyValue(word.to_owned(), value));
            rest = tail;
        } else {
            if let Some(class) = word.strip_prefix('.') {
                out.push(Scanned::Class(class.to_owned()));
            } else if let Some(id) = word.strip_prefix('#') {
                out.push(Scanned::Id(id.to_owned()));
            } else {
                out.push(Scanned::Flag(word.to_owned()));
            }
            rest = after;
        }
    }

    out
}

/// Scan a value after `=`: double-quoted, single-quoted, or bare.
fn scan_value(input: &str) -> Option<(String, &str)> {
    if let Some(stripped) = input.strip_prefix('"') {
        let end = stripped.find('"')?;
        Some((stripped[..end].to_owned(), &stripped[end + 1..]))
    } else if let Some(stripped) = input.strip_prefix('\'') {
        let end = stripped.find('\'')?;
        Some((stripped[..end].to_owned(), &stripped[end + 1..]))
    } else {
        let end = input
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(input.len());
        if end == 0 {
            return None;
        }
        Some((input[..end].to_owned(), &input[end..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let attrs = AttrList::parse("");
        assert!(attrs.is_empty());
        assert_eq!(attrs.render(), "");
    }

    #[test]
    fn test_class_shortcuts() {
        let attrs = AttrList::parse(".only-light .right");
        assert_eq!(attrs.get_str("class"), Some("only-light right"));
        assert_eq!(attrs.render(), r#" class="only-light right""#);
    }

    #[test]
    fn test_class_shortcut_after_explicit() {
        // Explicit class value comes first, shortcuts append after it.
        let attrs = AttrList::parse(r#".right class="only-light""#);
        assert_eq!(attrs.get_str("class"), Some("only-light right"));
    }

    #[test]
    fn test_duplicate_shortcut_appears_once() {
        let attrs = AttrList::parse(".a .b .a");
        assert_eq!(attrs.get_str("class"), Some("a b"));
    }

    #[test]
    fn test_id_shortcut() {
        let attrs = AttrList::parse("#green");
        assert_eq!(attrs.get_str("id"), Some("green"));
    }

    #[test]
    fn test_id_shortcut_overwritten_by_explicit() {
        let attrs = AttrList::parse(r#"#green id="red""#);
        assert_eq!(attrs.get_str("id"), Some("red"));
    }

    #[test]
    fn test_explicit_id_overwritten_by_shortcut() {
        let attrs = AttrList::parse(r#"id="red" #green"#);
        assert_eq!(attrs.get_str("id"), Some("green"));
    }

    #[test]
    fn test_double_quoted_value() {
        let attrs = AttrList::parse(r#"title="Hello World""#);
        assert_eq!(attrs.get_str("title"), Some("Hello World"));
    }

    #[test]
    fn test_single_quoted_value() {
        let attrs = AttrList::parse("title='Hello World'");
        assert_eq!(attrs.get_str("title"), Some("Hello World"));
    }

    #[test]
    fn test_bare_value() {
        let attrs = AttrList::parse("width=560");
        assert_eq!(attrs.get_str("width"), Some("560"));
    }

    #[test]
    fn test_bareword_flag() {
        let attrs = AttrList::parse("collapsible");
        assert_eq!(attrs.get("collapsible"), Some(&AttrValue::Flag(true)));
        assert_eq!(attrs.render(), " collapsible");
    }

    #[test]
    fn test_unterminated_quote_drops_remainder() {
        let attrs = AttrList::parse(r#".ok title="unterminated"#);
        assert_eq!(attrs.get_str("class"), Some("ok"));
        assert!(attrs.get("title").is_none());
    }

    #[test]
    fn test_mixed() {
        let attrs = AttrList::parse(r#"#my-id .foo lang="en" width=100"#);
        assert_eq!(attrs.get_str("id"), Some("my-id"));
        assert_eq!(attrs.get_str("class"), Some("foo"));
        assert_eq!(attrs.get_str("lang"), Some("en"));
        assert_eq!(attrs.get_str("width"), Some("100"));
    }

    #[test]
    fn test_render_sorts_pairs_then_props() {
        let mut attrs = AttrList::new();
        attrs.set_str("src", "x.png");
        attrs.set_str("alt", "Nav A");
        attrs.set("right", AttrValue::Flag(true));
        attrs.set("light", AttrValue::Flag(true));
        assert_eq!(attrs.render(), r#" alt="Nav A" src="x.png" light right"#);
    }

    #[test]
    fn test_render_truthy_sentinel_becomes_property() {
        let attrs = AttrList::parse("open=true");
        assert_eq!(attrs.render(), " open");
    }

    #[test]
    fn test_render_falsy_sentinel_dropped() {
        let attrs = AttrList::parse("open=false hidden=False");
        assert_eq!(attrs.render(), "");
    }

    #[test]
    fn test_render_underscore_to_hyphen() {
        let attrs = AttrList::parse(r#"data_expr="a""#);
        assert_eq!(attrs.render(), r#" data-expr="a""#);
    }

    #[test]
    fn test_render_quote_fallback() {
        let mut attrs = AttrList::new();
        attrs.set_str("title", r#"say "hi""#);
        assert_eq!(attrs.render(), r#" title='say "hi"'"#);

        let mut attrs = AttrList::new();
        attrs.set_str("title", r#"it's "fine""#);
        assert_eq!(attrs.render(), r#" title="it's &quot;fine&quot;""#);
    }

    #[test]
    fn test_merge_class_accumulates() {
        let mut base = AttrList::new();
        base.set_str("href", "#meh");
        base.set_str("class", "link");
        base.merge(AttrList::parse(".extra id=x"));
        assert_eq!(base.get_str("class"), Some("link extra"));
        assert_eq!(base.get_str("id"), Some("x"));
        assert_eq!(base.get_str("href"), Some("#meh"));
    }

    #[test]
    fn test_last_writer_wins_keeps_position() {
        let attrs = AttrList::parse(r#"a="1" b="2" a="3""#);
        assert_eq!(attrs.get_str("a"), Some("3"));
        assert_eq!(attrs.render(), r#" a="3" b="2""#);
    }
}
