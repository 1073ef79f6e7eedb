//! Selector sets, rename maps, and the unlinked-selector log.

use std::collections::BTreeSet;

use compact_str::CompactString;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// Class or id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorKind {
    Class,
    Id,
}

impl SelectorKind {
    /// The sigil that introduces this kind in CSS (`.` or `#`).
    pub fn sigil(&self) -> char {
        match self {
            SelectorKind::Class => '.',
            SelectorKind::Id => '#',
        }
    }

    /// Split a sigil-prefixed selector word (`.foo`, `#bar`) into kind and name.
    pub fn split_word(word: &str) -> Option<(SelectorKind, &str)> {
        if let Some(name) = word.strip_prefix('.') {
            Some((SelectorKind::Class, name))
        } else if let Some(name) = word.strip_prefix('#') {
            Some((SelectorKind::Id, name))
        } else {
            None
        }
    }
}

/// Whether `name` is a CSS identifier that can follow `.` or `#` unescaped.
///
/// ```
/// use ruminate::selectors::is_css_identifier;
///
/// assert!(is_css_identifier("nav-item"));
/// assert!(!is_css_identifier("2col"));
/// ```
pub fn is_css_identifier(name: &str) -> bool {
    let is_start = |c: char| c.is_ascii_alphabetic() || c == '_' || !c.is_ascii();
    let is_body = |c: char| is_start(c) || c.is_ascii_digit() || c == '-';

    let body = name.strip_prefix('-').unwrap_or(name);
    let mut chars = body.chars();
    match chars.next() {
        Some('-') => chars.all(is_body),
        Some(c) if is_start(c) => chars.all(is_body),
        _ => false,
    }
}

/// Distinct class and id names, in first-seen order.
///
/// Built by [`crate::collect::Collector`]; read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SelectorSet {
    classes: IndexSet<String>,
    ids: IndexSet<String>,
    ignored: BTreeSet<String>,
    markup_classes: BTreeSet<String>,
    markup_ids: BTreeSet<String>,
}

impl SelectorSet {
    /// Classes declared in stylesheets, in discovery order.
    pub fn classes(&self) -> &IndexSet<String> {
        &self.classes
    }

    /// Ids declared in stylesheets, in discovery order.
    pub fn ids(&self) -> &IndexSet<String> {
        &self.ids
    }

    pub fn get(&self, kind: SelectorKind) -> &IndexSet<String> {
        match kind {
            SelectorKind::Class => &self.classes,
            SelectorKind::Id => &self.ids,
        }
    }

    /// Ignored names that were seen in stylesheets.
    pub fn ignored(&self) -> &BTreeSet<String> {
        &self.ignored
    }

    /// Names that will remain literally in the rewritten output.
    ///
    /// These are the ignored names plus markup names with no stylesheet
    /// counterpart of the same kind. A generated name equal to one of them
    /// would silently attach existing elements to a renamed rule.
    pub fn retained(&self) -> BTreeSet<&str> {
        let markup_only_classes = self
            .markup_classes
            .iter()
            .filter(|c| !self.classes.contains(*c));
        let markup_only_ids = self.markup_ids.iter().filter(|i| !self.ids.contains(*i));
        self.ignored
            .iter()
            .chain(markup_only_classes)
            .chain(markup_only_ids)
            .map(String::as_str)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.ids.is_empty()
    }

    pub(crate) fn insert(&mut self, kind: SelectorKind, name: &str) -> bool {
        let set = match kind {
            SelectorKind::Class => &mut self.classes,
            SelectorKind::Id => &mut self.ids,
        };
        if set.contains(name) {
            return false;
        }
        set.insert(name.to_string())
    }

    pub(crate) fn insert_ignored(&mut self, name: &str) {
        if !self.ignored.contains(name) {
            self.ignored.insert(name.to_string());
        }
    }

    pub(crate) fn insert_markup(&mut self, kind: SelectorKind, name: &str) {
        let set = match kind {
            SelectorKind::Class => &mut self.markup_classes,
            SelectorKind::Id => &mut self.markup_ids,
        };
        if !set.contains(name) {
            set.insert(name.to_string());
        }
    }
}

/// Original name to generated name, in allocation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RenameMap {
    entries: IndexMap<String, CompactString>,
}

impl RenameMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the replacement for an original name.
    pub fn get(&self, original: &str) -> Option<&str> {
        self.entries.get(original).map(CompactString::as_str)
    }

    pub fn contains(&self, original: &str) -> bool {
        self.entries.contains_key(original)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(CompactString::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn insert(&mut self, original: String, generated: CompactString) {
        self.entries.insert(original, generated);
    }
}

impl<K: Into<String>, V: Into<CompactString>> FromIterator<(K, V)> for RenameMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// The class map and the id map, frozen after allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenameMaps {
    pub classes: RenameMap,
    pub ids: RenameMap,
}

impl RenameMaps {
    pub fn new(classes: RenameMap, ids: RenameMap) -> Self {
        Self { classes, ids }
    }

    pub fn get(&self, kind: SelectorKind) -> &RenameMap {
        match kind {
            SelectorKind::Class => &self.classes,
            SelectorKind::Id => &self.ids,
        }
    }

    /// Look up a name in the map for `kind`.
    pub fn rename(&self, kind: SelectorKind, original: &str) -> Option<&str> {
        self.get(kind).get(original)
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.ids.is_empty()
    }
}

/// Selectors seen in markup or scripts with no entry in the rename maps.
///
/// Purely diagnostic. Every per-file rewrite owns one and the caller merges
/// them, so parallel rewriting shares nothing mutable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Unlinked {
    pub classes: BTreeSet<String>,
    pub ids: BTreeSet<String>,
}

impl Unlinked {
    pub fn record(&mut self, kind: SelectorKind, name: &str) {
        let set = match kind {
            SelectorKind::Class => &mut self.classes,
            SelectorKind::Id => &mut self.ids,
        };
        if !set.contains(name) {
            set.insert(name.to_string());
        }
    }

    pub fn merge(&mut self, other: Unlinked) {
        self.classes.extend(other.classes);
        self.ids.extend(other.ids);
    }

    /// Drop names the caller chose not to hear about (the ignore list).
    pub fn forget<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        for name in names {
            self.classes.remove(name);
            self.ids.remove(name);
        }
    }

    pub fn contains(&self, kind: SelectorKind, name: &str) -> bool {
        match kind {
            SelectorKind::Class => self.classes.contains(name),
            SelectorKind::Id => self.ids.contains(name),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_word() {
        assert_eq!(
            SelectorKind::split_word(".foo"),
            Some((SelectorKind::Class, "foo"))
        );
        assert_eq!(SelectorKind::split_word("#bar"), Some((SelectorKind::Id, "bar")));
        assert_eq!(SelectorKind::split_word("baz"), None);
    }

    #[test]
    fn test_css_identifier() {
        assert!(is_css_identifier("foo"));
        assert!(is_css_identifier("-foo"));
        assert!(is_css_identifier("--foo"));
        assert!(is_css_identifier("_x9"));
        assert!(!is_css_identifier(""));
        assert!(!is_css_identifier("-"));
        assert!(!is_css_identifier("1a"));
        assert!(!is_css_identifier("-1a"));
        assert!(!is_css_identifier("/app"));
        assert!(!is_css_identifier("a b"));
    }

    #[test]
    fn test_selector_set_keeps_discovery_order() {
        let mut set = SelectorSet::default();
        set.insert(SelectorKind::Class, "zebra");
        set.insert(SelectorKind::Class, "apple");
        assert!(!set.insert(SelectorKind::Class, "zebra"));
        let order: Vec<_> = set.classes().iter().map(String::as_str).collect();
        assert_eq!(order, ["zebra", "apple"]);
    }

    #[test]
    fn test_retained_excludes_declared_names() {
        let mut set = SelectorSet::default();
        set.insert(SelectorKind::Class, "nav");
        set.insert_markup(SelectorKind::Class, "nav");
        set.insert_markup(SelectorKind::Class, "b");
        set.insert_markup(SelectorKind::Id, "nav");
        set.insert_ignored("keep");

        let retained = set.retained();
        assert!(retained.contains("b"));
        assert!(retained.contains("keep"));
        // declared as a class but used as an id only in markup
        assert!(retained.contains("nav"));

        let mut declared = SelectorSet::default();
        declared.insert(SelectorKind::Class, "nav");
        declared.insert_markup(SelectorKind::Class, "nav");
        assert!(declared.retained().is_empty());
    }

    #[test]
    fn test_rename_map_lookup() {
        let map: RenameMap = [("foo", "a"), ("bar", "b")].into_iter().collect();
        assert_eq!(map.get("foo"), Some("a"));
        assert_eq!(map.get("baz"), None);
        assert_eq!(map.len(), 2);
        let keys: Vec<_> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["foo", "bar"]);
    }

    #[test]
    fn test_unlinked_merge_and_forget() {
        let mut a = Unlinked::default();
        a.record(SelectorKind::Class, "bar");
        let mut b = Unlinked::default();
        b.record(SelectorKind::Id, "main");
        b.record(SelectorKind::Class, "keep");
        a.merge(b);
        a.forget(["keep"]);
        assert!(a.contains(SelectorKind::Class, "bar"));
        assert!(a.contains(SelectorKind::Id, "main"));
        assert!(!a.contains(SelectorKind::Class, "keep"));
    }
}
