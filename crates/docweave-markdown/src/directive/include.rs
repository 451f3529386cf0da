//! The `include` directive.
//!
//! Embeds another file. Markdown files are recursively parsed and their
//! tokens spliced into the including document, so included headings join
//! the host's TOC and id-uniqueness pass. Any other file is embedded
//! verbatim as an opaque block. An unreadable path degrades to a visible
//! in-page error block; it never aborts the surrounding render.

use std::path::Path;

use super::{BlockDirective, DirectiveContext, DirectiveInvocation};
use crate::token::Token;

/// Handler for file includes.
pub struct IncludeDirective;

impl BlockDirective for IncludeDirective {
    fn names(&self) -> &'static [&'static str] {
        &["include"]
    }

    fn parse(
        &self,
        invocation: &DirectiveInvocation<'_>,
        ctx: &mut DirectiveContext<'_, '_>,
    ) -> Vec<Token> {
        let path = invocation.title.trim();
        if path.is_empty() {
            let line = ctx.line();
            ctx.warn(format!("line {line}: include directive without a path"));
            return Vec::new();
        }

        let resolved = ctx.resolve_path(path);
        match ctx.read(&resolved) {
            Ok(contents) => {
                if is_markdown_path(&resolved) {
                    ctx.parse_markdown(&contents)
                } else {
                    vec![Token::HtmlBlock(contents)]
                }
            }
            Err(err) => {
                tracing::warn!(path = %resolved.display(), error = %err, "include failed");
                let line = ctx.line();
                ctx.warn(format!("line {line}: could not include '{path}': {err}"));
                vec![Token::IncludeError {
                    path: path.to_owned(),
                }]
            }
        }
    }
}

fn is_markdown_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_markdown_path() {
        assert!(is_markdown_path(Path::new("snippet.md")));
        assert!(is_markdown_path(Path::new("SNIPPET.MD")));
        assert!(is_markdown_path(Path::new("a/b/guide.markdown")));
        assert!(!is_markdown_path(Path::new("fragment.html")));
        assert!(!is_markdown_path(Path::new("no_extension")));
    }
}
