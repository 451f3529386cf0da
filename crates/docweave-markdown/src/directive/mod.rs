//! Fenced directive framework.
//!
//! A directive is a fenced block construct:
//!
//! ```markdown
//! ::: note Custom Title
//! :collapsible: true
//!
//! Body content, parsed recursively as markdown.
//! :::
//! ```
//!
//! Dispatch is by name through a registry of [`BlockDirective`] handlers;
//! adding a directive means adding a registry entry. Handlers receive the
//! parsed title, options and body plus a [`DirectiveContext`] for
//! recursive parsing, include-path resolution and warning collection, and
//! return tokens spliced into the surrounding document.

mod admonition;
mod container;
mod include;
mod tabs;
mod toc;

pub use admonition::AdmonitionDirective;
pub use container::DivDirective;
pub use include::IncludeDirective;
pub use tabs::TabDirective;
pub use toc::TocDirective;

use std::io;
use std::path::{Path, PathBuf};

use crate::builder::build_inline_tokens;
use crate::compiler::{Compiler, Environment};
use crate::token::Token;

/// Options parsed from the `:key: value` lines of a directive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirectiveOptions {
    entries: Vec<(String, String)>,
}

impl DirectiveOptions {
    /// Look up an option value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the option is present at all.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Whether the option is present with a truthy value.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> bool {
        matches!(self.get(key), Some("true" | "True"))
    }
}

/// A parsed directive invocation, handed to the registered handler.
#[derive(Clone, Debug)]
pub struct DirectiveInvocation<'a> {
    /// Directive name from the opening fence.
    pub name: &'a str,
    /// Single-line title/argument after the name (may be empty).
    pub title: &'a str,
    /// `:key: value` option lines.
    pub options: DirectiveOptions,
    /// Raw body source, options stripped.
    pub body: String,
}

/// Handler interface for fenced directives.
///
/// Handlers are stateless (`&self`); all per-document state lives in the
/// compile environment, so one compiler instance can render documents
/// concurrently.
pub trait BlockDirective: Send + Sync {
    /// The directive names this handler responds to.
    fn names(&self) -> &'static [&'static str];

    /// Produce tokens for one invocation.
    fn parse(
        &self,
        invocation: &DirectiveInvocation<'_>,
        ctx: &mut DirectiveContext<'_, '_>,
    ) -> Vec<Token>;
}

/// Context handed to directive handlers.
pub struct DirectiveContext<'c, 'e> {
    pub(crate) compiler: &'c Compiler,
    pub(crate) env: &'e mut Environment,
    pub(crate) depth: usize,
    pub(crate) line: usize,
}

impl DirectiveContext<'_, '_> {
    /// Line number of the opening fence (1-indexed).
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Base directory for resolving include paths.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        self.compiler.base_dir()
    }

    /// Resolve a relative path against the base directory.
    #[must_use]
    pub fn resolve_path(&self, relative: &str) -> PathBuf {
        self.base_dir().join(relative)
    }

    /// Read a file through the compiler's read callback.
    pub fn read(&self, path: &Path) -> io::Result<String> {
        self.compiler.read_file(path)
    }

    /// Record a warning on the compile result.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.env.warnings.push(message.into());
    }

    /// Recursively parse markdown in the same document context.
    ///
    /// Headings inside participate in the host document's id-uniqueness
    /// and TOC pass; tab groups continue the document-scoped counters.
    /// Recursion past the configured include depth returns nothing and
    /// records a warning.
    pub fn parse_markdown(&mut self, source: &str) -> Vec<Token> {
        if self.depth >= self.compiler.max_include_depth() {
            self.env.warnings.push(format!(
                "line {}: maximum include depth ({}) exceeded",
                self.line,
                self.compiler.max_include_depth()
            ));
            return Vec::new();
        }
        self.compiler.parse_blocks(source, self.env, self.depth + 1)
    }

    /// Parse a one-line markdown fragment into inline tokens.
    #[must_use]
    pub fn parse_inline(&self, source: &str) -> Vec<Token> {
        build_inline_tokens(source, self.compiler.parser_options())
    }
}

/// Registry mapping directive names to handlers.
#[derive(Default)]
pub(crate) struct DirectiveRegistry {
    handlers: Vec<Box<dyn BlockDirective>>,
}

impl DirectiveRegistry {
    pub(crate) fn register<D: BlockDirective + 'static>(&mut self, handler: D) {
        self.handlers.push(Box::new(handler));
    }

    pub(crate) fn find(&self, name: &str) -> Option<&dyn BlockDirective> {
        self.handlers
            .iter()
            .find(|handler| handler.names().contains(&name))
            .map(|handler| &**handler)
    }
}

/// Split a directive body into leading `:key: value` options and content.
///
/// Options end at the first line that is not option-shaped; a blank
/// separator line after the options is swallowed.
pub(crate) fn split_options(body: &str) -> (DirectiveOptions, String) {
    let lines: Vec<&str> = body.lines().collect();
    let mut entries = Vec::new();
    let mut idx = 0;

    while idx < lines.len() {
        match parse_option_line(lines[idx]) {
            Some((key, value)) => {
                entries.push((key, value));
                idx += 1;
            }
            None => break,
        }
    }

    while idx < lines.len() && lines[idx].trim().is_empty() {
        idx += 1;
    }

    (DirectiveOptions { entries }, lines[idx..].join("\n"))
}

/// Parse one `:key: value` option line.
fn parse_option_line(line: &str) -> Option<(String, String)> {
    let rest = line.strip_prefix(':')?;
    let colon = rest.find(':')?;
    let key = &rest[..colon];
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return None;
    }
    let value = rest[colon + 1..].trim();
    Some((key.to_owned(), value.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_options_basic() {
        let (options, body) = split_options(":open: true\n\nBody text");
        assert!(options.get_bool("open"));
        assert_eq!(body, "Body text");
    }

    #[test]
    fn test_split_options_none() {
        let (options, body) = split_options("Just body content");
        assert!(options.entries.is_empty());
        assert_eq!(body, "Just body content");
    }

    #[test]
    fn test_split_options_multiple() {
        let (options, body) = split_options(":new: true\n:select: true\n\nContent");
        assert!(options.get_bool("new"));
        assert!(options.get_bool("select"));
        assert_eq!(body, "Content");
    }

    #[test]
    fn test_option_false_value() {
        let (options, _) = split_options(":open: false\n\nContent");
        assert!(options.has("open"));
        assert!(!options.get_bool("open"));
    }

    #[test]
    fn test_non_option_colon_line_is_body() {
        let (options, body) = split_options(":) smile\nrest");
        assert!(options.entries.is_empty());
        assert_eq!(body, ":) smile\nrest");
    }

    #[test]
    fn test_option_line_shapes() {
        assert_eq!(
            parse_option_line(":class: fancy pants"),
            Some(("class".to_owned(), "fancy pants".to_owned()))
        );
        assert!(parse_option_line("no options here").is_none());
        assert!(parse_option_line("::").is_none());
    }
}
