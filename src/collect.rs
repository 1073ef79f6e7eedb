//! Selector collection.
//!
//! Stylesheets, standalone or inlined in `<style>` elements, declare the
//! universe of selectors to rename. Markup is also scanned so that names used
//! only in HTML attributes are known before short names are handed out.

use std::collections::BTreeSet;

use crate::rewrite::css::selector_names;
use crate::rewrite::html::{parse_fragments, Fragment};
use crate::rewrite::RewriteError;
use crate::selectors::{SelectorKind, SelectorSet};

/// Accumulates a [`SelectorSet`] across sources.
///
/// # Examples
///
/// ```
/// use ruminate::collect::Collector;
///
/// let mut collector = Collector::new(["keep"]);
/// collector.add_stylesheet(".foo{color:red} .keep{} #bar{}").unwrap();
/// let set = collector.finish();
///
/// assert!(set.classes().contains("foo"));
/// assert!(!set.classes().contains("keep"));
/// assert!(set.ids().contains("bar"));
/// ```
#[derive(Debug, Default)]
pub struct Collector {
    ignore: BTreeSet<String>,
    set: SelectorSet,
}

impl Collector {
    /// Create a collector that drops the given names (case-sensitive).
    pub fn new<I, S>(ignore: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignore: ignore.into_iter().map(Into::into).collect(),
            set: SelectorSet::default(),
        }
    }

    fn add(&mut self, kind: SelectorKind, name: &str) {
        if name.is_empty() {
            return;
        }
        if self.ignore.contains(name) {
            self.set.insert_ignored(name);
            return;
        }
        if self.set.insert(kind, name) {
            tracing::trace!(%name, sigil = %kind.sigil(), "found selector");
        }
    }

    /// Collect the class and id selectors of a stylesheet.
    pub fn add_stylesheet(&mut self, css: &str) -> Result<(), RewriteError> {
        for selector in selector_names(css)? {
            self.add(selector.kind, selector.name);
        }
        Ok(())
    }

    /// Collect from an HTML document.
    ///
    /// `<style>` contents are collected exactly like standalone stylesheets.
    /// Class and id names in attributes are only recorded as markup names.
    pub fn add_document(&mut self, html: &str) -> Result<(), RewriteError> {
        for fragment in parse_fragments(html)? {
            match fragment {
                Fragment::Style { text, .. } => self.add_stylesheet(text)?,
                Fragment::Name { kind, name, .. } => self.set.insert_markup(kind, name),
                Fragment::Script { .. } => {}
            }
        }
        Ok(())
    }

    pub fn finish(self) -> SelectorSet {
        self.set
    }
}

/// Collect selectors from stylesheets and from the inline styles of documents.
pub fn collect<'a>(
    stylesheets: impl IntoIterator<Item = &'a str>,
    documents: impl IntoIterator<Item = &'a str>,
    ignore: &[String],
) -> Result<SelectorSet, RewriteError> {
    let mut collector = Collector::new(ignore.iter().cloned());
    for css in stylesheets {
        collector.add_stylesheet(css)?;
    }
    for html in documents {
        collector.add_document(html)?;
    }
    Ok(collector.finish())
}
