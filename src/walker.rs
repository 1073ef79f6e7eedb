//! Source discovery.
//!
//! Uses the `ignore` crate to walk each root in file-name order, so the same
//! tree always yields the same files in the same order. Hidden files are
//! skipped and `.gitignore` is not consulted unless asked for; a
//! `.ruminateignore` in a root is always honored.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use thiserror::Error;

use crate::filter::{has_extension, ExcludeSet, Syntax};

/// Name of the per-root ignore file.
pub const IGNORE_FILE: &str = ".ruminateignore";

/// Errors that can occur during discovery.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Options for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Include hidden files and directories.
    pub include_hidden: bool,
    /// Respect .gitignore patterns.
    pub respect_gitignore: bool,
}

impl WalkOptions {
    /// Also skip whatever git would ignore.
    pub fn gitignore(mut self, yes: bool) -> Self {
        self.respect_gitignore = yes;
        self
    }
}

/// File found under a root.
#[derive(Debug, Clone)]
pub struct WalkEntry {
    pub path: PathBuf,
    /// Path relative to the root. For a root that is itself a file, its name.
    pub relative: PathBuf,
}

fn convert_error(err: ignore::Error, path: Option<PathBuf>) -> Option<WalkError> {
    match err {
        ignore::Error::WithPath { path, err } => convert_error(*err, Some(path)),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            convert_error(*err, path)
        }
        ignore::Error::Io(source) => {
            let path = path.unwrap_or_else(|| PathBuf::from("<walk error>"));
            if source.kind() == std::io::ErrorKind::PermissionDenied {
                Some(WalkError::PermissionDenied { path })
            } else {
                Some(WalkError::Io { path, source })
            }
        }
        // Malformed ignore files and the like are not worth failing over.
        _ => None,
    }
}

/// Walk one root, yielding files only.
///
/// # Examples
///
/// ```no_run
/// use ruminate::walker::{walk_with_options, WalkOptions};
/// use std::path::Path;
///
/// for entry in walk_with_options(Path::new("static"), &WalkOptions::default()).flatten() {
///     println!("{}", entry.relative.display());
/// }
/// ```
pub fn walk_with_options(
    root: &Path,
    options: &WalkOptions,
) -> Box<dyn Iterator<Item = Result<WalkEntry, WalkError>>> {
    let root = root.to_path_buf();

    if !root.exists() {
        return Box::new(std::iter::once(Err(WalkError::NotFound { path: root })));
    }

    if root.is_file() {
        let relative = root
            .file_name()
            .map_or_else(|| root.clone(), PathBuf::from);
        return Box::new(std::iter::once(Ok(WalkEntry {
            path: root,
            relative,
        })));
    }

    let mut builder = WalkBuilder::new(&root);
    builder
        .hidden(!options.include_hidden)
        .git_ignore(options.respect_gitignore)
        .git_global(options.respect_gitignore)
        .git_exclude(options.respect_gitignore)
        .sort_by_file_name(|a, b| a.cmp(b));

    let ignore_file = root.join(IGNORE_FILE);
    if ignore_file.exists() {
        builder.add_ignore(&ignore_file);
    }

    Box::new(builder.build().filter_map(move |result| match result {
        Ok(entry) => {
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                return None;
            }
            let path = entry.into_path();
            let relative = path
                .strip_prefix(&root)
                .map_or_else(|_| path.clone(), Path::to_path_buf);
            Some(Ok(WalkEntry { path, relative }))
        }
        Err(e) => convert_error(e, None).map(Err),
    }))
}

/// A file selected for rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the root it was found under.
    pub relative: PathBuf,
    pub syntax: Syntax,
}

/// Files discovered across all roots, in discovery order.
///
/// A path reachable from several roots is kept only the first time.
#[derive(Debug, Default)]
pub struct Discovery {
    files: Vec<SourceFile>,
    missing: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl Discovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk `root` and keep files of `syntax`.
    ///
    /// Files under a directory root must end in one of `extensions`; a root
    /// that names a file is taken as is. A missing root is logged and
    /// remembered rather than treated as an error. Returns the number of new
    /// files.
    pub fn add_root(
        &mut self,
        root: &Path,
        syntax: Syntax,
        extensions: &[String],
        options: &WalkOptions,
        exclude: &ExcludeSet,
    ) -> Result<usize, WalkError> {
        let explicit_file = root.is_file();
        let mut added = 0;

        for entry in walk_with_options(root, options) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(WalkError::NotFound { path }) => {
                    tracing::warn!(root = %path.display(), "{syntax} root does not exist, skipping");
                    self.missing.push(path);
                    return Ok(0);
                }
                Err(e) => return Err(e),
            };

            if !explicit_file && !has_extension(&entry.path, extensions) {
                continue;
            }
            if exclude.is_excluded(&entry.relative) {
                tracing::debug!(path = %entry.path.display(), "excluded");
                continue;
            }

            let key = std::fs::canonicalize(&entry.path).unwrap_or_else(|_| entry.path.clone());
            if !self.seen.insert(key) {
                continue;
            }

            self.files.push(SourceFile {
                path: entry.path,
                relative: entry.relative,
                syntax,
            });
            added += 1;
        }

        tracing::info!(root = %root.display(), files = added, "discovered {syntax} files");
        Ok(added)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The discovered files and the roots that did not exist.
    pub fn into_parts(self) -> (Vec<SourceFile>, Vec<PathBuf>) {
        (self.files, self.missing)
    }
}
