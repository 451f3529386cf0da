//! Extensible markdown compiler for documentation sites.
//!
//! Layers a set of composable extensions over a conformant base
//! block/inline parser (pulldown-cmark):
//!
//! - **Fenced directives** (`::: name` ... `:::`): admonitions, tabbed
//!   content, generic containers, file includes and table-of-contents
//!   emission, dispatched through a pluggable [`directive`] registry.
//! - **Attribute lists**: a trailing `{ .class #id key="value" }`
//!   fragment attaches to the inline or block construct it follows.
//! - **Custom-component raw blocks**: tags starting with an uppercase
//!   letter (`<Card>...</Card>`) are preserved byte-for-byte for a later
//!   templating stage.
//! - **Heading ids and TOC**: headings are slugified into stable,
//!   collision-free ids and collected into a nested table of contents.
//! - **Code highlighting**: fenced blocks with line numbers, highlighted
//!   lines and a filename label, falling back to escaped plain text.
//!
//! # Example
//!
//! ```
//! use docweave_markdown::Compiler;
//!
//! let compiler = Compiler::new();
//! let result = compiler.compile("::: note\nThis is a note admonition\n:::\n");
//! assert!(result.html.contains("<section class=\"admonition note\">"));
//! ```
//!
//! Compilation is synchronous and re-entrant per document: every
//! [`Compiler::compile`] call owns its own token tree, id set and tab
//! counters, so documents can be rendered concurrently from one
//! compiler. Malformed input degrades to literal text; failures inside
//! directives are contained to their own span of output.

mod attrs;
mod builder;
mod compiler;
mod component;
pub mod directive;
mod fence;
mod highlight;
mod render;
mod text;
mod toc;
mod token;

pub use attrs::{AttrList, AttrValue};
pub use compiler::{CompileResult, Compiler, CompilerOptions, ReadFileFn};
pub use highlight::Highlighter;
pub use text::{escape_html, slugify};
pub use toc::TocEntry;
pub use token::{
    AdmonitionToken, CellAlign, TabEntry, TabSetToken, TabToken, TableToken, Token,
};
