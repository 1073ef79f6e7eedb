//! JavaScript selector rewriting.
//!
//! Only string literals are considered, and only two shapes of them:
//!
//! - the whole content is a known class or id name: `'foo'`;
//! - the content is a space-separated list of `.class` / `#id` words:
//!   `'.foo #bar'`.
//!
//! Identifiers, object keys, computed property names, template literals, and
//! compound selectors such as `'.a.b'` or `'ul > .item'` are left alone.
//! Selectors built at runtime from variables cannot be found this way and are
//! a known gap rather than something to guess at.

use super::{for_each_node, node_text, parse, splice, Edit, RewriteError};
use crate::filter::Syntax;
use crate::selectors::{is_css_identifier, RenameMaps, SelectorKind, Unlinked};

/// Parents whose string children are module specifiers, not selectors.
const MODULE_SOURCE_PARENTS: &[&str] = &["import_statement", "export_statement"];

/// Rewrite the content of one string literal (quotes excluded).
///
/// Returns `None` when the literal should stay as it is.
fn rewrite_literal(content: &str, maps: &RenameMaps, unlinked: &mut Unlinked) -> Option<String> {
    if content.is_empty() {
        return None;
    }

    if let Some(renamed) = maps
        .rename(SelectorKind::Class, content)
        .or_else(|| maps.rename(SelectorKind::Id, content))
    {
        return Some(renamed.to_string());
    }

    let selector_like = content
        .split(' ')
        .all(|w| w.is_empty() || w.starts_with('.') || w.starts_with('#'));
    if !selector_like {
        return None;
    }

    let mut changed = false;
    let mut out = String::with_capacity(content.len());
    for (i, word) in content.split(' ').enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let split = SelectorKind::split_word(word).filter(|_| word.len() >= 2);
        let Some((kind, name)) = split else {
            out.push_str(word);
            continue;
        };
        match maps.rename(kind, name) {
            Some(renamed) => {
                out.push(kind.sigil());
                out.push_str(renamed);
                changed = true;
            }
            None => {
                if is_css_identifier(name) {
                    unlinked.record(kind, name);
                }
                out.push_str(word);
            }
        }
    }

    changed.then_some(out)
}

pub(crate) fn js_edits(
    source: &str,
    maps: &RenameMaps,
    unlinked: &mut Unlinked,
) -> Result<Vec<Edit>, RewriteError> {
    let tree = parse(Syntax::JavaScript, source)?;
    let mut edits = Vec::new();

    for_each_node(tree.root_node(), |node| {
        if node.kind() != "string" {
            return;
        }
        if node
            .parent()
            .is_some_and(|p| MODULE_SOURCE_PARENTS.contains(&p.kind()))
        {
            return;
        }

        let text = node_text(node, source);
        if text.len() < 2 {
            return;
        }
        let range = node.start_byte() + 1..node.end_byte() - 1;
        let content = &source[range.clone()];

        if let Some(rewritten) = rewrite_literal(content, maps, unlinked) {
            tracing::debug!(from = content, to = %rewritten, "rewrote string literal");
            edits.push(Edit::new(range, rewritten));
        }
    });

    Ok(edits)
}

/// Rewrite selector-like string literals in a script.
///
/// # Examples
///
/// ```
/// use ruminate::rewrite::rewrite_js;
/// use ruminate::selectors::{RenameMaps, Unlinked};
///
/// let maps = RenameMaps::new(
///     [("foo", "a")].into_iter().collect(),
///     [("bar", "a")].into_iter().collect(),
/// );
/// let mut unlinked = Unlinked::default();
/// let out = rewrite_js("var x = '.foo #bar';", &maps, &mut unlinked).unwrap();
/// assert_eq!(out, "var x = '.a #a';");
/// ```
pub fn rewrite_js(
    source: &str,
    maps: &RenameMaps,
    unlinked: &mut Unlinked,
) -> Result<String, RewriteError> {
    let edits = js_edits(source, maps, unlinked)?;
    Ok(splice(source, edits))
}
