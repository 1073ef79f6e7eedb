//! Source syntaxes and file filtering.

use std::path::Path;

use glob::Pattern;

use crate::errors::ConfigError;

/// The three syntaxes ruminate rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Syntax {
    Css,
    Html,
    JavaScript,
}

impl Syntax {
    /// Default file extensions for this syntax (without dots).
    ///
    /// Views may be configured with a different extension; see
    /// [`crate::builder::Ruminate::view_extension`].
    pub fn default_extensions(&self) -> &'static [&'static str] {
        match self {
            Syntax::Css => &["css"],
            Syntax::Html => &["html"],
            Syntax::JavaScript => &["js", "mjs", "cjs"],
        }
    }
}

impl std::fmt::Display for Syntax {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Syntax::Css => write!(f, "css"),
            Syntax::Html => write!(f, "html"),
            Syntax::JavaScript => write!(f, "javascript"),
        }
    }
}

/// Check whether `path` ends in one of `extensions` (case-insensitive).
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
}

/// Normalize a user-supplied extension: `.HTML` and `html` both become `html`.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Glob patterns for paths that must never be rewritten.
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
    patterns: Vec<Pattern>,
}

impl ExcludeSet {
    /// Compile glob patterns, failing on the first invalid one.
    pub fn new<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Pattern::new(p).map_err(|source| ConfigError::InvalidExclude {
                    pattern: p.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// True if `relative` (a path relative to its root) matches any pattern.
    pub fn is_excluded(&self, relative: &Path) -> bool {
        let relative = relative.to_string_lossy();
        self.patterns.iter().any(|p| p.matches(&relative))
    }
}
