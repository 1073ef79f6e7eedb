//! Syntax-aware selector rewriting.
//!
//! Each syntax is parsed with tree-sitter, the nodes that can carry a
//! selector are located, and replacements are recorded as byte-range
//! [`Edit`]s. The edits are then spliced into the original text, so every
//! byte outside a replaced name survives untouched.

pub mod css;
pub mod html;
pub mod javascript;

use std::cell::RefCell;
use std::ops::Range;

use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};

use crate::filter::Syntax;

pub use css::rewrite_css;
pub use html::rewrite_html;
pub use javascript::rewrite_js;

/// Errors while parsing or rewriting a source.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("failed to initialize {syntax} parser")]
    ParserInit { syntax: Syntax },

    #[error("{syntax} parser gave up on the input")]
    Parse { syntax: Syntax },

    #[error("{syntax} syntax error at line {line}, column {column}")]
    Syntax {
        syntax: Syntax,
        line: usize,
        column: usize,
    },
}

// Parsers are cached per thread so rayon workers never share one.
thread_local! {
    static CSS_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
    static HTML_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
    static JS_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
}

fn init_parser(syntax: Syntax) -> Result<Parser, RewriteError> {
    let language = match syntax {
        Syntax::Css => tree_sitter_css::LANGUAGE,
        Syntax::Html => tree_sitter_html::LANGUAGE,
        Syntax::JavaScript => tree_sitter_javascript::LANGUAGE,
    };
    let mut p = Parser::new();
    p.set_language(&language.into())
        .map_err(|_| RewriteError::ParserInit { syntax })?;
    Ok(p)
}

fn with_cached_parser<F, R>(syntax: Syntax, f: F) -> Result<R, RewriteError>
where
    F: FnOnce(&mut Parser) -> R,
{
    let cell = match syntax {
        Syntax::Css => &CSS_PARSER,
        Syntax::Html => &HTML_PARSER,
        Syntax::JavaScript => &JS_PARSER,
    };

    cell.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(init_parser(syntax)?);
        }

        let parser = slot
            .as_mut()
            .ok_or(RewriteError::ParserInit { syntax })?;
        Ok(f(parser))
    })
}

pub(crate) fn parse_tree(syntax: Syntax, source: &str) -> Result<Tree, RewriteError> {
    with_cached_parser(syntax, |parser| parser.parse(source, None))?
        .ok_or(RewriteError::Parse { syntax })
}

fn syntax_error(syntax: Syntax, tree: &Tree) -> Option<RewriteError> {
    let root = tree.root_node();
    if !root.has_error() {
        return None;
    }
    let at = first_error(root).unwrap_or(root).start_position();
    Some(RewriteError::Syntax {
        syntax,
        line: at.row + 1,
        column: at.column + 1,
    })
}

/// Parse `source`, rejecting any tree that contains an error or missing node.
pub(crate) fn parse(syntax: Syntax, source: &str) -> Result<Tree, RewriteError> {
    let tree = parse_tree(syntax, source)?;
    match syntax_error(syntax, &tree) {
        Some(err) => Err(err),
        None => Ok(tree),
    }
}

/// Parse `source`, keeping whatever tree the parser recovered.
///
/// Used for markup, where browsers accept broken documents too.
pub(crate) fn parse_recovering(syntax: Syntax, source: &str) -> Result<Tree, RewriteError> {
    let tree = parse_tree(syntax, source)?;
    if let Some(err) = syntax_error(syntax, &tree) {
        tracing::warn!(error = %err, "malformed input, continuing with recovered tree");
    }
    Ok(tree)
}

fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut found = None;
    for_each_node(root, |node| {
        if found.is_none() && (node.is_error() || node.is_missing()) {
            found = Some(node);
        }
    });
    found
}

/// Visit every node under `root` in document order.
pub(crate) fn for_each_node<'t>(root: Node<'t>, mut f: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        f(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// Find a direct child node by kind.
pub(crate) fn find_child_by_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    node.children(&mut node.walk()).find(|c| c.kind() == kind)
}

/// Borrow a node's text from the source it was parsed from.
pub(crate) fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    &source[node.byte_range()]
}

/// Replace `range` of the source with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Edit {
    pub range: Range<usize>,
    pub replacement: String,
}

impl Edit {
    pub fn new(range: Range<usize>, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }
}

/// Apply non-overlapping edits to `source`.
///
/// Edits may arrive in any order. Overlapping edits indicate a rewriter bug;
/// the later one is dropped rather than corrupting the output.
pub(crate) fn splice(source: &str, mut edits: Vec<Edit>) -> String {
    if edits.is_empty() {
        return source.to_string();
    }
    edits.sort_by_key(|e| e.range.start);

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for edit in edits {
        if edit.range.start < cursor {
            tracing::warn!(range = ?edit.range, "dropping overlapping edit");
            continue;
        }
        out.push_str(&source[cursor..edit.range.start]);
        out.push_str(&edit.replacement);
        cursor = edit.range.end;
    }
    out.push_str(&source[cursor..]);
    out
}

/// Offset every edit by `base`, for sources embedded in a larger document.
pub(crate) fn shift(edits: &mut [Edit], base: usize) {
    for edit in edits {
        edit.range = edit.range.start + base..edit.range.end + base;
    }
}
