//! The `div` directive: a generic container.

use super::{BlockDirective, DirectiveContext, DirectiveInvocation};
use crate::token::Token;

/// Wraps its body in a `<div>` whose classes come from the title words.
///
/// ```markdown
/// ::: div grid
/// This is *inside* a container.
/// :::
/// ```
pub struct DivDirective;

impl BlockDirective for DivDirective {
    fn names(&self) -> &'static [&'static str] {
        &["div"]
    }

    fn parse(
        &self,
        invocation: &DirectiveInvocation<'_>,
        ctx: &mut DirectiveContext<'_, '_>,
    ) -> Vec<Token> {
        let classes = invocation
            .title
            .split_whitespace()
            .map(ToOwned::to_owned)
            .collect();
        let children = ctx.parse_markdown(&invocation.body);
        vec![Token::Container { classes, children }]
    }
}
