//! Stylesheet selector rewriting.
//!
//! A class selector is a `.` followed by an identifier (`class_selector` →
//! `class_name` in the tree-sitter grammar); an id selector is a `#` hash in
//! selector position (`id_selector` → `id_name`). Hashes inside declarations,
//! such as `#fff`, are colour values and never match.
//!
//! Parsing is strict about selectors and lenient about declarations. Legacy
//! hacks such as `*zoom:1` or `filter:progid:...` are not in the grammar, so
//! an error inside a rule body is logged and the recovered tree is used. An
//! error anywhere a selector can appear fails the whole stylesheet.

use std::borrow::Cow;
use std::ops::Range;

use tree_sitter::{Node, Tree};

use super::{find_child_by_kind, for_each_node, node_text, parse_tree, splice, Edit, RewriteError};
use crate::filter::Syntax;
use crate::selectors::{RenameMaps, SelectorKind};

/// A class or id name found in a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorName<'s> {
    pub kind: SelectorKind,
    pub name: &'s str,
    /// Byte range of the name, excluding the `.`/`#`.
    pub range: Range<usize>,
}

/// Blank out top-level `<!--` and `-->` tokens.
///
/// Stylesheets may contain them (old pages wrap `<style>` contents in them),
/// but the grammar does not. Byte offsets are unchanged.
fn mask_comment_delimiters(source: &str) -> Cow<'_, str> {
    let bytes = source.as_bytes();
    let mut ranges = Vec::new();
    let mut depth = 0usize;
    let mut quote = None;
    let mut in_comment = false;
    let mut i = 0;

    while i < bytes.len() {
        let rest = &bytes[i..];
        if in_comment {
            if rest.starts_with(b"*/") {
                in_comment = false;
                i += 1;
            }
        } else if let Some(q) = quote {
            if rest[0] == b'\\' {
                i += 1;
            } else if rest[0] == q {
                quote = None;
            }
        } else {
            match rest[0] {
                b'/' if rest.starts_with(b"/*") => {
                    in_comment = true;
                    i += 1;
                }
                b'"' | b'\'' => quote = Some(rest[0]),
                b'{' | b'(' | b'[' => depth += 1,
                b'}' | b')' | b']' => depth = depth.saturating_sub(1),
                b'<' if depth == 0 && rest.starts_with(b"<!--") => {
                    ranges.push(i..i + 4);
                    i += 3;
                }
                b'-' if depth == 0 && rest.starts_with(b"-->") => {
                    ranges.push(i..i + 3);
                    i += 2;
                }
                _ => {}
            }
        }
        i += 1;
    }

    if ranges.is_empty() {
        return Cow::Borrowed(source);
    }
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for range in ranges {
        out.push_str(&source[cursor..range.start]);
        out.extend(std::iter::repeat(' ').take(range.len()));
        cursor = range.end;
    }
    out.push_str(&source[cursor..]);
    Cow::Owned(out)
}

/// Whether an error node lies in the body of a style rule rather than in a
/// selector prelude.
fn in_rule_body(error: Node<'_>) -> bool {
    let mut in_prelude = false;
    let mut current = error;
    while let Some(parent) = current.parent() {
        match parent.kind() {
            "selectors" => in_prelude = true,
            "rule_set" => {
                in_prelude |= find_child_by_kind(parent, "block")
                    .map_or(true, |block| error.end_byte() <= block.start_byte());
            }
            "block" => {
                let style_rule = parent.parent().is_some_and(|p| p.kind() == "rule_set");
                return style_rule || !in_prelude;
            }
            _ => {}
        }
        current = parent;
    }
    false
}

fn parse_stylesheet(source: &str) -> Result<Tree, RewriteError> {
    let masked = mask_comment_delimiters(source);
    let tree = parse_tree(Syntax::Css, &masked)?;
    if !tree.root_node().has_error() {
        return Ok(tree);
    }

    let mut fatal = None;
    let mut tolerated = Vec::new();
    for_each_node(tree.root_node(), |node| {
        if !(node.is_error() || node.is_missing()) {
            return;
        }
        if in_rule_body(node) {
            tolerated.push(node.start_position());
        } else if fatal.is_none() {
            fatal = Some(node.start_position());
        }
    });

    if let Some(at) = fatal {
        return Err(RewriteError::Syntax {
            syntax: Syntax::Css,
            line: at.row + 1,
            column: at.column + 1,
        });
    }
    for at in tolerated {
        tracing::warn!(
            line = at.row + 1,
            column = at.column + 1,
            "unparseable declaration kept as is"
        );
    }
    Ok(tree)
}

/// Names under a recovered error are not reliable selectors.
fn in_broken_selector(node: Node<'_>) -> bool {
    let mut current = node;
    while let Some(parent) = current.parent() {
        if parent.is_error() || (parent.kind() == "selectors" && parent.has_error()) {
            return true;
        }
        current = parent;
    }
    false
}

/// Every class and id selector in `source`, in document order.
///
/// Includes selectors nested in at-rules (`@media`, `@supports`), in
/// functional pseudo-classes like `:not(.a)`, and in nested rule blocks.
pub fn selector_names(source: &str) -> Result<Vec<SelectorName<'_>>, RewriteError> {
    let tree = parse_stylesheet(source)?;
    let mut names = Vec::new();

    for_each_node(tree.root_node(), |node| {
        let kind = match node.kind() {
            "class_name" => SelectorKind::Class,
            "id_name" => SelectorKind::Id,
            _ => return,
        };
        if in_broken_selector(node) {
            tracing::debug!(range = ?node.byte_range(), "skipping name in malformed selector");
            return;
        }
        let name = node_text(node, source);
        if !name.is_empty() {
            names.push(SelectorName {
                kind,
                name,
                range: node.byte_range(),
            });
        }
    });

    Ok(names)
}

pub(crate) fn css_edits(source: &str, maps: &RenameMaps) -> Result<Vec<Edit>, RewriteError> {
    let edits = selector_names(source)?
        .into_iter()
        .filter_map(|sel| {
            maps.rename(sel.kind, sel.name)
                .map(|renamed| Edit::new(sel.range, renamed))
        })
        .collect();
    Ok(edits)
}

/// Rewrite the class and id selectors of a stylesheet.
///
/// The result differs from `source` only in the renamed identifiers:
/// whitespace, comments, combinators, and declarations are kept byte for byte.
///
/// # Examples
///
/// ```
/// use ruminate::rewrite::rewrite_css;
/// use ruminate::selectors::{RenameMap, RenameMaps};
///
/// let maps = RenameMaps::new(
///     [("foo", "a")].into_iter().collect(),
///     [("bar", "b")].into_iter().collect(),
/// );
/// let out = rewrite_css(".foo{color:red}\n#bar{color:blue}", &maps).unwrap();
/// assert_eq!(out, ".a{color:red}\n#b{color:blue}");
/// ```
pub fn rewrite_css(source: &str, maps: &RenameMaps) -> Result<String, RewriteError> {
    let edits = css_edits(source, maps)?;
    Ok(splice(source, edits))
}
