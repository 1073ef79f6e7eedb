//! Markup selector rewriting.
//!
//! Attribute values that name classes or ids are rewritten word by word.
//! `<style>` and `<script>` contents are handed to the CSS and JavaScript
//! rewriters and their edits are shifted into document coordinates, so the
//! document is never re-serialized: tag casing, quoting, and whitespace stay
//! exactly as written.
//!
//! Character references in attribute values are not decoded. A word such as
//! `foo&#32;card` is left alone and not reported as unlinked.

use std::ops::Range;

use smallvec::SmallVec;
use tree_sitter::{Node, Tree};

use super::css::css_edits;
use super::javascript::js_edits;
use super::{
    find_child_by_kind, for_each_node, node_text, parse_recovering, shift, splice, Edit,
    RewriteError,
};
use crate::filter::Syntax;
use crate::selectors::{RenameMaps, SelectorKind, Unlinked};

/// `type` values that mark a `<script>` as JavaScript.
const JAVASCRIPT_TYPES: &[&str] = &[
    "",
    "module",
    "text/javascript",
    "application/javascript",
    "application/x-javascript",
    "text/ecmascript",
    "application/ecmascript",
];

/// How an attribute's value refers to selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttributeRole {
    /// Space-separated class names (`class`).
    ClassList,
    /// A single id (`id`, `for`, `list`, `form`, ...).
    IdRef,
    /// Space-separated ids (`aria-labelledby`, `headers`, ...).
    IdRefList,
    /// An in-page link; only `#id` values refer to an id.
    Fragment,
}

pub(crate) fn attribute_role(name: &str) -> Option<AttributeRole> {
    let name = name.to_ascii_lowercase();
    let role = match name.as_str() {
        "class" => AttributeRole::ClassList,
        "id" | "for" | "list" | "form" | "aria-activedescendant" => AttributeRole::IdRef,
        "aria-labelledby" | "aria-describedby" | "aria-controls" | "aria-owns"
        | "aria-flowto" | "headers" => AttributeRole::IdRefList,
        "href" => AttributeRole::Fragment,
        _ => return None,
    };
    Some(role)
}

/// A selector-bearing piece of an HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Fragment<'s> {
    /// A class or id named in an attribute value.
    Name {
        kind: SelectorKind,
        name: &'s str,
        range: Range<usize>,
        /// Whether a missing map entry should be reported as unlinked.
        report: bool,
    },
    /// The contents of a `<style>` element.
    Style { text: &'s str, start: usize },
    /// The contents of a JavaScript `<script>` element.
    Script { text: &'s str, start: usize },
}

/// Split on ASCII whitespace, keeping each word's byte offset.
fn words(value: &str) -> SmallVec<[(usize, &str); 4]> {
    let mut out = SmallVec::new();
    let mut start = None;
    for (i, b) in value.bytes().enumerate() {
        if b.is_ascii_whitespace() {
            if let Some(s) = start.take() {
                out.push((s, &value[s..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        out.push((s, &value[s..]));
    }
    out
}

/// Name and value of an attribute node. The value range excludes quotes;
/// valueless attributes and empty quoted values yield `None`.
fn attribute_parts<'s>(attr: Node<'_>, source: &'s str) -> Option<(&'s str, Range<usize>)> {
    let name = find_child_by_kind(attr, "attribute_name")?;
    let value = match find_child_by_kind(attr, "attribute_value") {
        Some(v) => v,
        None => {
            let quoted = find_child_by_kind(attr, "quoted_attribute_value")?;
            find_child_by_kind(quoted, "attribute_value")?
        }
    };
    Some((node_text(name, source), value.byte_range()))
}

fn attribute_fragments<'s>(attr: Node<'_>, source: &'s str, out: &mut Vec<Fragment<'s>>) {
    let Some((name, value_range)) = attribute_parts(attr, source) else {
        return;
    };
    let Some(role) = attribute_role(name) else {
        return;
    };
    let base = value_range.start;
    let value = &source[value_range];

    let mut push = |kind, offset: usize, word: &'s str, report| {
        if word.contains('&') {
            tracing::debug!(%word, "skipping attribute word with a character reference");
            return;
        }
        out.push(Fragment::Name {
            kind,
            name: word,
            range: base + offset..base + offset + word.len(),
            report,
        });
    };

    match role {
        AttributeRole::ClassList => {
            for (offset, word) in words(value) {
                push(SelectorKind::Class, offset, word, true);
            }
        }
        AttributeRole::IdRef => {
            if let [(offset, word)] = words(value).as_slice() {
                push(SelectorKind::Id, *offset, *word, true);
            }
        }
        AttributeRole::IdRefList => {
            for (offset, word) in words(value) {
                push(SelectorKind::Id, offset, word, true);
            }
        }
        AttributeRole::Fragment => {
            if let Some(id) = value.strip_prefix('#').filter(|id| !id.is_empty()) {
                push(SelectorKind::Id, 1, id, false);
            }
        }
    }
}

fn is_javascript(script: Node<'_>, source: &str) -> bool {
    let Some(tag) = find_child_by_kind(script, "start_tag") else {
        return true;
    };
    let mut cursor = tag.walk();
    for attr in tag.children(&mut cursor).filter(|c| c.kind() == "attribute") {
        let Some(name) = find_child_by_kind(attr, "attribute_name") else {
            continue;
        };
        if !node_text(name, source).eq_ignore_ascii_case("type") {
            continue;
        }
        let ty = attribute_parts(attr, source)
            .map(|(_, range)| source[range].trim().to_ascii_lowercase())
            .unwrap_or_default();
        return JAVASCRIPT_TYPES.contains(&ty.as_str());
    }
    true
}

pub(crate) fn fragments<'s>(tree: &Tree, source: &'s str) -> Vec<Fragment<'s>> {
    let mut out = Vec::new();

    for_each_node(tree.root_node(), |node| match node.kind() {
        "attribute" => attribute_fragments(node, source, &mut out),
        "style_element" => {
            if let Some(raw) = find_child_by_kind(node, "raw_text") {
                out.push(Fragment::Style {
                    text: node_text(raw, source),
                    start: raw.start_byte(),
                });
            }
        }
        "script_element" => {
            if !is_javascript(node, source) {
                tracing::debug!("skipping non-javascript <script> element");
                return;
            }
            if let Some(raw) = find_child_by_kind(node, "raw_text") {
                out.push(Fragment::Script {
                    text: node_text(raw, source),
                    start: raw.start_byte(),
                });
            }
        }
        _ => {}
    });

    out
}

/// Parse a document and list its selector-bearing fragments.
///
/// Malformed markup is not an error; the parser's recovered tree is used.
pub(crate) fn parse_fragments(source: &str) -> Result<Vec<Fragment<'_>>, RewriteError> {
    let tree = parse_recovering(Syntax::Html, source)?;
    Ok(fragments(&tree, source))
}

/// Rewrite the classes and ids of an HTML document.
///
/// Class tokens and id references missing from `maps` are left as they are
/// and recorded in `unlinked`.
///
/// # Examples
///
/// ```
/// use ruminate::rewrite::rewrite_html;
/// use ruminate::selectors::{RenameMap, RenameMaps, Unlinked};
///
/// let maps = RenameMaps::new([("foo", "a")].into_iter().collect(), RenameMap::new());
/// let mut unlinked = Unlinked::default();
/// let out = rewrite_html(r#"<div class="foo bar"></div>"#, &maps, &mut unlinked).unwrap();
/// assert_eq!(out, r#"<div class="a bar"></div>"#);
/// assert!(unlinked.classes.contains("bar"));
/// ```
pub fn rewrite_html(
    source: &str,
    maps: &RenameMaps,
    unlinked: &mut Unlinked,
) -> Result<String, RewriteError> {
    let mut edits = Vec::new();

    for fragment in parse_fragments(source)? {
        match fragment {
            Fragment::Name {
                kind,
                name,
                range,
                report,
            } => match maps.rename(kind, name) {
                Some(renamed) => edits.push(Edit::new(range, renamed)),
                None if report => unlinked.record(kind, name),
                None => {}
            },
            Fragment::Style { text, start } => {
                let mut inner = css_edits(text, maps)?;
                shift(&mut inner, start);
                edits.extend(inner);
            }
            Fragment::Script { text, start } => {
                let mut inner = js_edits(text, maps, unlinked)?;
                shift(&mut inner, start);
                edits.extend(inner);
            }
        }
    }

    Ok(splice(source, edits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::RenameMap;

    fn maps(classes: &[(&str, &str)], ids: &[(&str, &str)]) -> RenameMaps {
        RenameMaps::new(
            classes.iter().copied().collect::<RenameMap>(),
            ids.iter().copied().collect::<RenameMap>(),
        )
    }

    fn rewrite(html: &str, m: &RenameMaps) -> (String, Unlinked) {
        let mut unlinked = Unlinked::default();
        let out = rewrite_html(html, m, &mut unlinked).unwrap();
        (out, unlinked)
    }

    #[test]
    fn test_words_keep_offsets() {
        let w = words("  foo\tbar  baz");
        assert_eq!(w.as_slice(), &[(2, "foo"), (6, "bar"), (11, "baz")]);
        assert!(words("   ").is_empty());
    }

    #[test]
    fn test_class_list_with_unlinked_entry() {
        let m = maps(&[("foo", "a")], &[]);
        let (out, unlinked) = rewrite(r#"<div class="foo bar">x</div>"#, &m);
        assert_eq!(out, r#"<div class="a bar">x</div>"#);
        assert!(unlinked.classes.contains("bar"));
        assert!(unlinked.ids.is_empty());
    }

    #[test]
    fn test_class_whitespace_is_preserved() {
        let m = maps(&[("foo", "a"), ("baz", "b")], &[]);
        let (out, _) = rewrite("<p class=\"  foo\n   baz \">x</p>", &m);
        assert_eq!(out, "<p class=\"  a\n   b \">x</p>");
    }

    #[test]
    fn test_for_uses_the_id_map() {
        let m = maps(&[("email", "a")], &[("email", "b")]);
        let (out, _) = rewrite(
            r#"<label for="email">Email</label><input id="email" class="email">"#,
            &m,
        );
        assert_eq!(
            out,
            r#"<label for="b">Email</label><input id="b" class="a">"#
        );
    }

    #[test]
    fn test_unquoted_and_uppercase_attributes() {
        let m = maps(&[("foo", "a")], &[("main", "b")]);
        let (out, _) = rewrite("<DIV CLASS=foo Id='main'></DIV>", &m);
        assert_eq!(out, "<DIV CLASS=a Id='b'></DIV>");
    }

    #[test]
    fn test_id_references_and_fragments() {
        let m = maps(&[], &[("title", "a"), ("desc", "b"), ("top", "c")]);
        let (out, unlinked) = rewrite(
            r##"<section aria-labelledby="title desc"><a href="#top">up</a><a href="/page#top">x</a><a href="#missing">y</a></section>"##,
            &m,
        );
        assert_eq!(
            out,
            r##"<section aria-labelledby="a b"><a href="#c">up</a><a href="/page#top">x</a><a href="#missing">y</a></section>"##
        );
        // fragment links are not selector declarations
        assert!(!unlinked.ids.contains("missing"));
    }

    #[test]
    fn test_inline_style_and_script() {
        let m = maps(&[("foo", "a")], &[("bar", "b")]);
        let html = "<html><head><style>\n.foo { color: red }\n#bar { color: blue }\n</style></head>\n<body><div class=\"foo\" id=\"bar\"></div>\n<script>\nvar el = document.querySelector('.foo #bar');\n</script></body></html>";
        let (out, _) = rewrite(html, &m);
        assert_eq!(
            out,
            "<html><head><style>\n.a { color: red }\n#b { color: blue }\n</style></head>\n<body><div class=\"a\" id=\"b\"></div>\n<script>\nvar el = document.querySelector('.a #b');\n</script></body></html>"
        );
    }

    #[test]
    fn test_non_javascript_scripts_are_untouched() {
        let m = maps(&[("foo", "a")], &[]);
        let html = "<script type=\"text/template\"><div class='foo'></div></script><script type=\"module\">let c = 'foo';</script>";
        let (out, _) = rewrite(html, &m);
        assert_eq!(
            out,
            "<script type=\"text/template\"><div class='foo'></div></script><script type=\"module\">let c = 'a';</script>"
        );
    }

    #[test]
    fn test_markup_without_selectors_is_identical() {
        let m = maps(&[("foo", "a")], &[("bar", "b")]);
        let html = "<!DOCTYPE html>\n<html lang=\"en\">\n  <body data-foo=\"foo\">\n    <p title=\"foo bar\">foo &amp; bar</p>\n    <input disabled>\n  </body>\n</html>\n";
        let (out, unlinked) = rewrite(html, &m);
        assert_eq!(out, html);
        assert!(unlinked.is_empty());
    }

    #[test]
    fn test_malformed_markup_is_rewritten_best_effort() {
        let m = maps(&[("foo", "a")], &[]);
        let mut unlinked = Unlinked::default();
        let out = rewrite_html("<div class=\"foo\">\n<p <</p></div>", &m, &mut unlinked).unwrap();
        assert!(out.starts_with("<div class=\"a\">\n"));
    }

    #[test]
    fn test_character_references_are_left_alone() {
        let m = maps(&[("foo", "a"), ("card", "b")], &[]);
        let (out, unlinked) = rewrite(r#"<p class="foo&#32;card card"></p>"#, &m);
        assert_eq!(out, r#"<p class="foo&#32;card b"></p>"#);
        assert!(unlinked.is_empty());
    }

    #[test]
    fn test_style_wrapped_in_comment_delimiters() {
        let m = maps(&[("foo", "a")], &[]);
        let (out, _) = rewrite("<style>\n<!--\n.foo{}\n-->\n</style><p class=foo>", &m);
        assert_eq!(out, "<style>\n<!--\n.a{}\n-->\n</style><p class=a>");
    }

    #[test]
    fn test_attribute_roles() {
        assert_eq!(attribute_role("CLASS"), Some(AttributeRole::ClassList));
        assert_eq!(attribute_role("for"), Some(AttributeRole::IdRef));
        assert_eq!(attribute_role("headers"), Some(AttributeRole::IdRefList));
        assert_eq!(attribute_role("href"), Some(AttributeRole::Fragment));
        assert_eq!(attribute_role("data-class"), None);
    }
}
