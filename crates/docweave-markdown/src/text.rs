//! Text helpers shared across parsing and rendering.

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Convert heading text to a URL-safe slug.
///
/// Lowercases, keeps Unicode word characters, collapses runs of
/// whitespace and separators into a single separator, and drops
/// everything else. Slugifying the same text twice yields the same slug;
/// collision suffixes are the caller's concern.
#[must_use]
pub fn slugify(text: &str, separator: char) -> String {
    let mut result = String::with_capacity(text.len());
    let mut pending_sep = false;

    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            if pending_sep && !result.is_empty() {
                result.push(separator);
            }
            pending_sep = false;
            for lower in c.to_lowercase() {
                result.push(lower);
            }
        } else if c.is_whitespace() || c == separator || c == '-' || c == '_' {
            pending_sep = true;
        }
        // Other punctuation is dropped without forcing a separator.
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html(r#""quoted""#), "&quot;quoted&quot;");
        assert_eq!(escape_html("it's"), "it&#x27;s");
    }

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello World", '-'), "hello-world");
        assert_eq!(slugify("Heading 1", '-'), "heading-1");
        assert_eq!(slugify("  Spaces  ", '-'), "spaces");
        assert_eq!(slugify("Multiple   Spaces", '-'), "multiple-spaces");
    }

    #[test]
    fn test_slugify_punctuation_dropped() {
        assert_eq!(slugify("What's New?", '-'), "whats-new");
        assert_eq!(slugify("Install `npm`", '-'), "install-npm");
    }

    #[test]
    fn test_slugify_separators_collapse() {
        assert_eq!(slugify("kebab-case", '-'), "kebab-case");
        assert_eq!(slugify("snake_case", '-'), "snake-case");
        assert_eq!(slugify("a -- b", '-'), "a-b");
    }

    #[test]
    fn test_slugify_unicode_preserved() {
        assert_eq!(slugify("žlutý kůň", '-'), "žlutý-kůň");
    }

    #[test]
    fn test_slugify_idempotent() {
        let once = slugify("Some Long Heading!", '-');
        assert_eq!(slugify(&once, '-'), once);
    }
}
