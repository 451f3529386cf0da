//! The `toc` directive.
//!
//! Emits a placeholder token; the compiler replaces it after the full
//! document has rendered, so headings following the marker are included.

use super::{BlockDirective, DirectiveContext, DirectiveInvocation};
use crate::token::Token;

/// Handler emitting the table-of-contents placeholder.
pub struct TocDirective;

impl BlockDirective for TocDirective {
    fn names(&self) -> &'static [&'static str] {
        &["toc"]
    }

    fn parse(
        &self,
        _invocation: &DirectiveInvocation<'_>,
        _ctx: &mut DirectiveContext<'_, '_>,
    ) -> Vec<Token> {
        vec![Token::TocMarker]
    }
}
