//! Admonition directives: `note`, `tip`, `warning`, `error`, `new`.

use super::{BlockDirective, DirectiveContext, DirectiveInvocation};
use crate::token::{AdmonitionToken, Token};

/// Handler for callout-style admonition blocks.
///
/// The title defaults to the capitalized directive name. A `:class:`
/// option adds extra classes. The block renders as a disclosure element
/// when a `collapsible` or `open` option is present; it is open by
/// default only when `open` is explicitly true.
pub struct AdmonitionDirective;

const NAMES: &[&str] = &["note", "tip", "warning", "error", "new"];

impl BlockDirective for AdmonitionDirective {
    fn names(&self) -> &'static [&'static str] {
        NAMES
    }

    fn parse(
        &self,
        invocation: &DirectiveInvocation<'_>,
        ctx: &mut DirectiveContext<'_, '_>,
    ) -> Vec<Token> {
        let title = match invocation.title.trim() {
            "" => capitalize(invocation.name),
            custom => custom.to_owned(),
        };
        let collapsible = invocation.options.has("collapsible") || invocation.options.has("open");
        let open = invocation.options.get_bool("open");
        let class = invocation.options.get("class").map(ToOwned::to_owned);
        let body = ctx.parse_markdown(&invocation.body);

        vec![Token::Admonition(AdmonitionToken {
            name: invocation.name.to_owned(),
            title,
            class,
            collapsible,
            open,
            body,
        })]
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("note"), "Note");
        assert_eq!(capitalize("warning"), "Warning");
        assert_eq!(capitalize(""), "");
    }
}
