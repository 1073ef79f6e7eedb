//! Short-name allocation.

use std::collections::BTreeSet;

use compact_str::{format_compact, CompactString};

use crate::errors::ConfigError;
use crate::naming::IdentifierSequence;
use crate::selectors::{is_css_identifier, RenameMap, RenameMaps, SelectorSet};

/// Names that are never handed out unless overridden. `ad` trips ad blockers.
pub const DEFAULT_RESERVED: &[&str] = &["ad"];

/// Options for [`allocate`].
#[derive(Debug, Clone)]
pub struct AllocateOptions {
    /// Prepended to every generated name.
    pub prefix: String,
    /// Generated names (prefix included) that must be skipped.
    pub reserved: BTreeSet<String>,
    pub sequence: IdentifierSequence,
}

impl Default for AllocateOptions {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            reserved: DEFAULT_RESERVED.iter().map(|s| s.to_string()).collect(),
            sequence: IdentifierSequence::default(),
        }
    }
}

impl AllocateOptions {
    /// Check that every `prefix + name` is a usable selector.
    ///
    /// Any alphabet character may start a name, so each one must be able to
    /// follow the prefix.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.prefix.is_empty()
            && (self.prefix == "-" || !is_css_identifier(&format!("{}a", self.prefix)))
        {
            return Err(ConfigError::InvalidPrefix {
                prefix: self.prefix.clone(),
            });
        }
        for &ch in self.sequence.alphabet() {
            let name = format!("{}{ch}", self.prefix);
            if !is_css_identifier(&name) {
                return Err(ConfigError::InvalidAlphabetChar { ch, name });
            }
        }
        Ok(())
    }
}

/// Assign a short name to every class and id in `set`.
///
/// Classes and ids draw from one shared sequence: classes first in discovery
/// order, then ids. Reserved names and names that stay literal in the output
/// ([`SelectorSet::retained`]) are skipped, so the maps are injective and
/// never collide with selectors left untouched.
///
/// # Examples
///
/// ```
/// use ruminate::allocate::{allocate, AllocateOptions};
/// use ruminate::collect::collect;
///
/// let set = collect([".foo{color:red}\n#bar{color:blue}"], [], &[]).unwrap();
/// let maps = allocate(&set, &AllocateOptions::default()).unwrap();
///
/// assert_eq!(maps.classes.get("foo"), Some("a"));
/// assert_eq!(maps.ids.get("bar"), Some("b"));
/// ```
pub fn allocate(set: &SelectorSet, options: &AllocateOptions) -> Result<RenameMaps, ConfigError> {
    options.validate()?;

    let retained = set.retained();
    let mut index = 0;
    let mut next_name = || -> CompactString {
        loop {
            let name = options.sequence.nth(index);
            index += 1;
            let candidate = if options.prefix.is_empty() {
                name
            } else {
                format_compact!("{}{}", options.prefix, name)
            };
            if options.reserved.contains(candidate.as_str())
                || retained.contains(candidate.as_str())
            {
                tracing::trace!(%candidate, "skipping unavailable name");
                continue;
            }
            return candidate;
        }
    };

    let mut classes = RenameMap::new();
    for class in set.classes() {
        let short = next_name();
        tracing::debug!(from = %class, to = %short, "mapped class");
        classes.insert(class.clone(), short);
    }

    let mut ids = RenameMap::new();
    for id in set.ids() {
        let short = next_name();
        tracing::debug!(from = %id, to = %short, "mapped id");
        ids.insert(id.clone(), short);
    }

    tracing::info!(
        classes = classes.len(),
        ids = ids.len(),
        "allocated short names"
    );
    Ok(RenameMaps::new(classes, ids))
}
