//! Custom-component raw block scanning.
//!
//! Recognizes component-style tags whose name starts with an uppercase
//! letter (`<Card>`, `<Test ... />`) when they open a block: the whole
//! span, markup included, is captured as one opaque raw block and exempt
//! from markdown processing. A later templating stage expands these tags;
//! the compiler's responsibility ends at preserving the span intact.
//!
//! Same-named nested pairs are not supported: the first matching close
//! tag terminates the block. Attribute values may contain `>` inside
//! single or double quotes; the scanner skips quoted runs when locating
//! the end of the opening tag.

/// Cheap pre-check: could this line open a component block?
///
/// Up to three leading spaces, then `<` followed by an uppercase ASCII
/// letter.
pub(crate) fn line_may_open_component(line: &str) -> bool {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return false;
    }
    let mut chars = trimmed.chars();
    chars.next() == Some('<') && chars.next().is_some_and(|c| c.is_ascii_uppercase())
}

/// Scan a component block starting at `lines[0]`.
///
/// Returns the raw span and the number of lines consumed, or `None` when
/// no well-formed component block starts here (the caller falls back to
/// normal markdown handling).
pub(crate) fn scan_component(lines: &[&str]) -> Option<(String, usize)> {
    let first = lines.first()?;
    let trimmed = first.trim_start_matches(' ');
    let indent = first.len() - trimmed.len();
    if indent > 3 {
        return None;
    }

    let name = tag_name(trimmed)?;

    // Locate the unquoted '>' that ends the opening tag. The attribute
    // region may span lines.
    let (gt_line, gt_col, self_closing) = find_tag_end(lines, 0, indent + 1 + name.len())?;

    if self_closing {
        // `<Tag ... />` must end its line.
        let tail = &lines[gt_line][gt_col + 1..];
        if !tail.chars().all(|c| c == ' ' || c == '\t') {
            return None;
        }
        let raw = lines[..=gt_line].join("\n");
        return Some((raw, gt_line + 1));
    }

    // Paired form: the first `</Name>` that ends its line closes the span.
    let close_marker = format!("</{name}>");
    let mut search_col = gt_col + 1;
    for (idx, line) in lines.iter().enumerate().skip(gt_line) {
        let from = if idx == gt_line { search_col } else { 0 };
        let mut offset = from;
        while let Some(pos) = line.get(offset..).and_then(|s| s.find(&close_marker)) {
            let end = offset + pos + close_marker.len();
            let tail = &line[end..];
            if tail.chars().all(|c| c == ' ' || c == '\t') {
                let raw = lines[..=idx].join("\n");
                return Some((raw, idx + 1));
            }
            offset = end;
        }
        search_col = 0;
    }

    None
}

/// Extract a component tag name (`[A-Z][A-Za-z0-9]*`) after a `<`.
fn tag_name(trimmed: &str) -> Option<&str> {
    let rest = trimmed.strip_prefix('<')?;
    let first = rest.chars().next()?;
    if !first.is_ascii_uppercase() {
        return None;
    }
    let end = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Find the unquoted `>` closing the opening tag.
///
/// Returns `(line index, byte column, self_closing)`. Scanning starts on
/// `lines[start_line]` at byte `start_col` and may continue onto later
/// lines for multi-line opening tags.
fn find_tag_end(
    lines: &[&str],
    start_line: usize,
    start_col: usize,
) -> Option<(usize, usize, bool)> {
    let mut quote: Option<char> = None;
    let mut prev_char: Option<char> = None;

    for (idx, line) in lines.iter().enumerate().skip(start_line) {
        let from = if idx == start_line { start_col } else { 0 };
        for (col, c) in line[from..].char_indices() {
            match quote {
                Some(q) => {
                    if c == q {
                        quote = None;
                    }
                }
                None => match c {
                    '"' | '\'' => quote = Some(c),
                    '>' => {
                        return Some((idx, from + col, prev_char == Some('/')));
                    }
                    _ => {}
                },
            }
            prev_char = Some(c);
        }
        prev_char = None; // '>' after a line break is not self-closing via '/'
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_paired_block() {
        let lines = vec!["<Test>Hello **World**</Test>"];
        let (raw, consumed) = scan_component(&lines).unwrap();
        assert_eq!(raw, "<Test>Hello **World**</Test>");
        assert_eq!(consumed, 1);
    }

    #[test]
    fn test_multiline_paired_block() {
        let lines = vec!["<Card title=\"x\">", "Some *content*", "</Card>", "after"];
        let (raw, consumed) = scan_component(&lines).unwrap();
        assert_eq!(raw, "<Card title=\"x\">\nSome *content*\n</Card>");
        assert_eq!(consumed, 3);
    }

    #[test]
    fn test_self_closing() {
        let lines = vec!["<Test class=\"hi\" />"];
        let (raw, consumed) = scan_component(&lines).unwrap();
        assert_eq!(raw, "<Test class=\"hi\" />");
        assert_eq!(consumed, 1);
    }

    #[test]
    fn test_gt_inside_quoted_attribute() {
        let lines = vec!["<Test data-expr=\"a > b\">Content</Test>"];
        let (raw, _) = scan_component(&lines).unwrap();
        assert_eq!(raw, "<Test data-expr=\"a > b\">Content</Test>");

        let lines = vec!["<Test data-expr='x > y' />"];
        let (raw, _) = scan_component(&lines).unwrap();
        assert_eq!(raw, "<Test data-expr='x > y' />");
    }

    #[test]
    fn test_lowercase_tag_declined() {
        assert!(!line_may_open_component("<h2>Hello</h2>"));
        assert!(scan_component(&["<h2>Hello</h2>"]).is_none());
    }

    #[test]
    fn test_unclosed_declined() {
        assert!(scan_component(&["<Test>", "no close tag here"]).is_none());
    }

    #[test]
    fn test_close_must_end_line() {
        // A close tag followed by more text keeps searching for a later
        // line-final close.
        let lines = vec!["<Test>", "inner </Test> trailing", "</Test>"];
        let (raw, consumed) = scan_component(&lines).unwrap();
        assert_eq!(consumed, 3);
        assert!(raw.ends_with("</Test>"));
        assert!(raw.contains("inner </Test> trailing"));
    }

    #[test]
    fn test_same_named_nesting_unsupported() {
        // The first line-final close wins; the outer close is left behind.
        let lines = vec!["<Test><Test>inner</Test>", "</Test>"];
        let (raw, consumed) = scan_component(&lines).unwrap();
        assert_eq!(raw, "<Test><Test>inner</Test>");
        assert_eq!(consumed, 1);
    }

    #[test]
    fn test_indent_limit() {
        assert!(line_may_open_component("   <Test />"));
        assert!(!line_may_open_component("    <Test />"));
        assert!(scan_component(&["    <Test />"]).is_none());
    }

    #[test]
    fn test_leading_spaces_preserved_in_raw() {
        let lines = vec!["  <Note />"];
        let (raw, _) = scan_component(&lines).unwrap();
        assert_eq!(raw, "  <Note />");
    }

    #[test]
    fn test_digit_in_tag_name() {
        let lines = vec!["<Col2>x</Col2>"];
        let (raw, _) = scan_component(&lines).unwrap();
        assert_eq!(raw, "<Col2>x</Col2>");
    }
}
