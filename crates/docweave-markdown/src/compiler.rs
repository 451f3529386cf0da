//! The markdown compiler: line segmentation, directive dispatch, tab
//! grouping and the compile entry point.
//!
//! Each [`Compiler::compile`] call owns its document state (id set, TOC,
//! tab counters), so one compiler instance is re-entrant: concurrent
//! documents just call `compile` independently.

use std::collections::{HashMap, HashSet};
use std::io;
use std::mem;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use pulldown_cmark::Options;

use crate::builder::{attach_attributes, build_tokens};
use crate::component::{line_may_open_component, scan_component};
use crate::directive::{
    AdmonitionDirective, BlockDirective, DirectiveContext, DirectiveInvocation, DirectiveRegistry,
    DivDirective, IncludeDirective, TabDirective, TocDirective, split_options,
};
use crate::fence::FenceTracker;
use crate::highlight::Highlighter;
use crate::render::render_document;
use crate::toc::{TOC_MARKER, TocEntry, nest_entries, render_toc};
use crate::token::{TabEntry, TabSetToken, TabToken, Token};

/// Type alias for the file reading callback used by `::: include`.
pub type ReadFileFn = dyn Fn(&Path) -> io::Result<String> + Send + Sync;

/// Compiler configuration.
pub struct CompilerOptions {
    /// Base directory for resolving `include` paths.
    pub base_dir: PathBuf,
    /// Heading levels collected into the table of contents (inclusive).
    pub toc_depth: RangeInclusive<u8>,
    /// Maximum include/directive recursion depth.
    pub max_include_depth: usize,
    /// Separator used when slugifying heading ids.
    pub slug_separator: char,
    /// Callback to read files from the file system.
    ///
    /// Default: `std::fs::read_to_string`.
    pub(crate) read_file: Option<Box<ReadFileFn>>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilerOptions {
    /// Create options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            toc_depth: 1..=6,
            max_include_depth: 10,
            slug_separator: '-',
            read_file: None,
        }
    }

    /// Set the base directory for resolving include paths.
    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Set the heading-level bounds for TOC collection.
    #[must_use]
    pub fn with_toc_depth(mut self, toc_depth: RangeInclusive<u8>) -> Self {
        self.toc_depth = toc_depth;
        self
    }

    /// Set the maximum include recursion depth.
    #[must_use]
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// Set the file reading callback.
    #[must_use]
    pub fn with_read_file<F>(mut self, read_file: F) -> Self
    where
        F: Fn(&Path) -> io::Result<String> + Send + Sync + 'static,
    {
        self.read_file = Some(Box::new(read_file));
        self
    }
}

/// Per-document state threaded through parsing and rendering.
///
/// Owned by one `compile` call; nothing here is shared across documents,
/// which keeps tab-group numbering and id uniqueness per page.
#[derive(Default)]
pub(crate) struct Environment {
    pub(crate) used_ids: HashSet<String>,
    pub(crate) id_counts: HashMap<String, usize>,
    pub(crate) toc: Vec<TocEntry>,
    pub(crate) tab_sets: usize,
    pub(crate) warnings: Vec<String>,
}

impl Environment {
    /// Claim a document-unique id derived from `base`.
    ///
    /// The first use of a base takes it verbatim; collisions (including
    /// collisions with explicit ids registered up front) append `-1`,
    /// `-2`, ... deterministically in document order.
    pub(crate) fn unique_id(&mut self, base: &str) -> String {
        let mut n = self.id_counts.get(base).copied().unwrap_or(0);
        loop {
            let candidate = if n == 0 {
                base.to_owned()
            } else {
                format!("{base}-{n}")
            };
            n += 1;
            if self.used_ids.insert(candidate.clone()) {
                self.id_counts.insert(base.to_owned(), n);
                return candidate;
            }
        }
    }
}

/// Result of compiling one document.
#[derive(Clone, Debug)]
pub struct CompileResult {
    /// Rendered HTML.
    pub html: String,
    /// Nested table-of-contents tree.
    pub toc: Vec<TocEntry>,
    /// Number of tab groups in the document.
    pub tab_sets: usize,
    /// Warnings generated during compilation (unterminated directives,
    /// failed includes, depth limits). Never fatal.
    pub warnings: Vec<String>,
}

/// The markdown compiler.
///
/// # Example
///
/// ```
/// use docweave_markdown::Compiler;
///
/// let compiler = Compiler::new();
/// let result = compiler.compile("# Hello\n\nSome **bold** text.");
/// assert!(result.html.contains("<h1 id=\"hello\">Hello</h1>"));
/// assert_eq!(result.toc[0].id, "hello");
/// ```
pub struct Compiler {
    options: CompilerOptions,
    registry: DirectiveRegistry,
    highlighter: Highlighter,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    /// Create a compiler with default options and the built-in
    /// directives (admonitions, `toc`, `tab`, `div`, `include`).
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(CompilerOptions::new())
    }

    /// Create a compiler with custom options.
    #[must_use]
    pub fn with_options(options: CompilerOptions) -> Self {
        let mut registry = DirectiveRegistry::default();
        registry.register(AdmonitionDirective);
        registry.register(TocDirective);
        registry.register(TabDirective);
        registry.register(DivDirective);
        registry.register(IncludeDirective);

        Self {
            options,
            registry,
            highlighter: Highlighter::new(),
        }
    }

    /// Register an additional directive handler.
    #[must_use]
    pub fn with_directive<D: BlockDirective + 'static>(mut self, handler: D) -> Self {
        self.registry.register(handler);
        self
    }

    /// Base parser options (GFM-style extensions).
    pub(crate) fn parser_options(&self) -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_DEFINITION_LIST
            | Options::ENABLE_SUPERSCRIPT
            | Options::ENABLE_SUBSCRIPT
    }

    pub(crate) fn base_dir(&self) -> &Path {
        &self.options.base_dir
    }

    pub(crate) fn max_include_depth(&self) -> usize {
        self.options.max_include_depth
    }

    pub(crate) fn read_file(&self, path: &Path) -> io::Result<String> {
        match &self.options.read_file {
            Some(read) => read(path),
            None => std::fs::read_to_string(path),
        }
    }

    /// Compile one markdown document to HTML.
    ///
    /// Malformed constructs degrade to literal text and failures inside
    /// directives are contained to their own span; this never fails.
    #[must_use]
    pub fn compile(&self, source: &str) -> CompileResult {
        let mut env = Environment::default();
        let tokens = self.parse_blocks(source, &mut env, 0);
        collect_ids(&tokens, &mut env);

        let mut html = render_document(tokens, &mut env, &self.options, &self.highlighter);
        let toc = nest_entries(mem::take(&mut env.toc));
        if html.contains(TOC_MARKER) {
            html = html.replace(TOC_MARKER, &render_toc(&toc));
        }

        CompileResult {
            html,
            toc,
            tab_sets: env.tab_sets,
            warnings: mem::take(&mut env.warnings),
        }
    }

    /// Parse source lines into tokens: directives and component blocks
    /// are split out, everything between goes through the base parser.
    pub(crate) fn parse_blocks(
        &self,
        source: &str,
        env: &mut Environment,
        depth: usize,
    ) -> Vec<Token> {
        let lines: Vec<&str> = source.lines().collect();
        let mut tokens: Vec<Token> = Vec::new();
        let mut markdown = String::new();
        let mut fence = FenceTracker::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            let was_fence = fence.update(line);
            if fence.in_fence() || was_fence {
                markdown.push_str(line);
                markdown.push('\n');
                i += 1;
                continue;
            }

            if let Some(open) = parse_directive_open(line) {
                if let Some(handler) = self.registry.find(&open.name) {
                    if let Some(close_idx) = find_directive_close(&lines, i + 1, open.colon_count) {
                        self.flush_markdown(&mut markdown, &mut tokens);
                        let body_src = lines[i + 1..close_idx].join("\n");
                        let (options, body) = split_options(&body_src);
                        let invocation = DirectiveInvocation {
                            name: &open.name,
                            title: &open.title,
                            options,
                            body,
                        };
                        let mut ctx = DirectiveContext {
                            compiler: self,
                            env: &mut *env,
                            depth,
                            line: i + 1,
                        };
                        tokens.extend(handler.parse(&invocation, &mut ctx));
                        i = close_idx + 1;
                        continue;
                    }
                    // No closing fence: degrade to literal text.
                    env.warnings.push(format!(
                        "line {}: unterminated directive :::{}",
                        i + 1,
                        open.name
                    ));
                }
                // Unknown directives pass through unchanged.
            }

            if line_may_open_component(line) {
                if let Some((raw, consumed)) = scan_component(&lines[i..]) {
                    self.flush_markdown(&mut markdown, &mut tokens);
                    tokens.push(Token::Component(raw));
                    i += consumed;
                    continue;
                }
            }

            markdown.push_str(line);
            markdown.push('\n');
            i += 1;
        }

        self.flush_markdown(&mut markdown, &mut tokens);
        attach_attributes(&mut tokens);
        group_tabs(tokens, env)
    }

    fn flush_markdown(&self, markdown: &mut String, tokens: &mut Vec<Token>) {
        if !markdown.trim().is_empty() {
            tokens.extend(build_tokens(markdown, self.parser_options()));
        }
        markdown.clear();
    }
}

/// A parsed directive opening line.
struct DirectiveOpen {
    colon_count: usize,
    name: String,
    title: String,
}

/// Parse a `::: name optional-title` opening line.
fn parse_directive_open(line: &str) -> Option<DirectiveOpen> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 || !trimmed.starts_with(":::") {
        return None;
    }

    let colon_count = trimmed.chars().take_while(|&c| c == ':').count();
    let rest = trimmed[colon_count..].trim();
    if rest.is_empty() {
        return None; // closing fence
    }

    let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let name = &rest[..name_end];
    if !is_valid_directive_name(name) {
        return None;
    }

    Some(DirectiveOpen {
        colon_count,
        name: name.to_owned(),
        title: rest[name_end..].trim().to_owned(),
    })
}

/// Valid names contain only alphanumerics, hyphens and underscores.
fn is_valid_directive_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

/// A line consisting only of three or more colons.
fn close_fence_len(line: &str) -> Option<usize> {
    let trimmed = line.trim();
    if !trimmed.starts_with(":::") {
        return None;
    }
    let count = trimmed.chars().take_while(|&c| c == ':').count();
    if trimmed.len() == count { Some(count) } else { None }
}

/// Find the closing fence for a directive opened before `start`.
///
/// Nested directives are depth-tracked; fenced code inside the body is
/// skipped. Returns the absolute line index of the close, or `None` for
/// an unterminated directive.
fn find_directive_close(lines: &[&str], start: usize, open_count: usize) -> Option<usize> {
    let mut fence = FenceTracker::new();
    let mut depth = 0usize;

    for (idx, line) in lines.iter().enumerate().skip(start) {
        let was_fence = fence.update(line);
        if fence.in_fence() || was_fence {
            continue;
        }
        if let Some(count) = close_fence_len(line) {
            if depth == 0 {
                if count >= open_count {
                    return Some(idx);
                }
            } else {
                depth -= 1;
            }
            continue;
        }
        if parse_directive_open(line).is_some() {
            depth += 1;
        }
    }

    None
}

/// Merge adjacent tab tokens into tab sets.
///
/// A run of consecutive `Tab` tokens (only blank lines between the
/// directives leave no token in between) forms one group; an explicit
/// new-group flag splits a run. Exactly one tab per group ends up
/// selected: the last one marked selected, or the first.
fn group_tabs(tokens: Vec<Token>, env: &mut Environment) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut run: Vec<TabToken> = Vec::new();

    for token in tokens {
        match token {
            Token::Tab(tab) => {
                if tab.new_group && !run.is_empty() {
                    flush_tab_run(&mut run, env, &mut out);
                }
                run.push(tab);
            }
            other => {
                flush_tab_run(&mut run, env, &mut out);
                out.push(other);
            }
        }
    }
    flush_tab_run(&mut run, env, &mut out);

    out
}

fn flush_tab_run(run: &mut Vec<TabToken>, env: &mut Environment, out: &mut Vec<Token>) {
    if run.is_empty() {
        return;
    }
    env.tab_sets += 1;
    let selected = run.iter().rposition(|tab| tab.select).unwrap_or(0);
    let tabs = run
        .drain(..)
        .enumerate()
        .map(|(idx, tab)| TabEntry {
            label: tab.label,
            body: tab.body,
            selected: idx == selected,
        })
        .collect();
    out.push(Token::TabSet(TabSetToken {
        group: env.tab_sets,
        tabs,
    }));
}

/// Register every explicit id in the tree before auto-id assignment.
fn collect_ids(tokens: &[Token], env: &mut Environment) {
    for token in tokens {
        if let Some(id) = token.id_attr() {
            env.used_ids.insert(id.to_owned());
        }
        match token {
            Token::Paragraph { children, .. }
            | Token::Heading { children, .. }
            | Token::BlockQuote { children }
            | Token::Item { children }
            | Token::DefinitionList { children }
            | Token::DefinitionTitle { children }
            | Token::DefinitionDetails { children }
            | Token::Emphasis { children, .. }
            | Token::Strong { children, .. }
            | Token::Strikethrough { children, .. }
            | Token::Superscript { children, .. }
            | Token::Subscript { children, .. }
            | Token::Link { children, .. }
            | Token::Container { children, .. } => collect_ids(children, env),
            Token::List { items, .. } => collect_ids(items, env),
            Token::Table(table) => {
                for cell in table.head.iter().chain(table.rows.iter().flatten()) {
                    collect_ids(cell, env);
                }
            }
            Token::Admonition(admonition) => collect_ids(&admonition.body, env),
            Token::Tab(tab) => {
                collect_ids(&tab.label, env);
                collect_ids(&tab.body, env);
            }
            Token::TabSet(set) => {
                for tab in &set.tabs {
                    collect_ids(&tab.label, env);
                    collect_ids(&tab.body, env);
                }
            }
            _ => {}
        }
    }
}
