//! The `tab` directive.
//!
//! Each invocation is a single tab. Adjacent tab tokens (nothing but
//! blank lines between the directives) are merged into tab sets by the
//! grouping pass after parsing; see the compiler. A `:new: true` option
//! forces a new group, `:select: true` makes the tab the group's default
//! selection (last explicit selection wins).

use super::{BlockDirective, DirectiveContext, DirectiveInvocation};
use crate::token::{TabToken, Token};

/// Handler producing one ungrouped tab per invocation.
pub struct TabDirective;

impl BlockDirective for TabDirective {
    fn names(&self) -> &'static [&'static str] {
        &["tab"]
    }

    fn parse(
        &self,
        invocation: &DirectiveInvocation<'_>,
        ctx: &mut DirectiveContext<'_, '_>,
    ) -> Vec<Token> {
        // Label syntax: `::: tab | Label text`. The pipe is optional; a
        // missing label falls back to the tab's index at render time.
        let mut label_src = invocation.title.trim();
        if let Some(rest) = label_src.strip_prefix('|') {
            label_src = rest.trim();
        }
        let label = if label_src.is_empty() {
            Vec::new()
        } else {
            ctx.parse_inline(label_src)
        };

        let new_group = invocation.options.get_bool("new");
        let select = invocation.options.get_bool("select");
        let body = ctx.parse_markdown(&invocation.body);

        vec![Token::Tab(TabToken {
            label,
            body,
            new_group,
            select,
        })]
    }
}
