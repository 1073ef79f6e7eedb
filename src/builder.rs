//! Fluent builder API for ruminate.
//!
//! A run has two halves. [`Ruminate::scan`] discovers sources, collects
//! selectors and allocates short names; nothing is written. [`Ruminate::run`]
//! then rewrites every file in parallel and writes the results only once all
//! of them have succeeded.

use std::collections::HashSet;
use std::path::PathBuf;

use rayon::prelude::*;

use crate::allocate::{allocate, AllocateOptions};
use crate::collect::Collector;
use crate::errors::{ConfigError, RuminateError};
use crate::filter::{normalize_extension, ExcludeSet, Syntax};
use crate::naming::IdentifierSequence;
use crate::output::{FileReport, MapReport, RunReport};
use crate::placement::{write_file, OutputTarget};
use crate::rewrite::{rewrite_css, rewrite_html, rewrite_js};
use crate::selectors::{RenameMaps, SelectorSet, Unlinked};
use crate::walker::{Discovery, SourceFile, WalkError, WalkOptions};

/// Builder for minifying the selectors of a site.
///
/// # Examples
///
/// ```no_run
/// use ruminate::builder::Ruminate;
///
/// let report = Ruminate::new()
///     .css(["static/css"])
///     .views(["templates"])
///     .scripts(["static/js"])
///     .ignore(["js-hook"])
///     .run()
///     .unwrap();
///
/// println!("{} files changed", report.files_changed());
/// ```
#[derive(Debug, Clone)]
pub struct Ruminate {
    css: Vec<PathBuf>,
    views: Vec<PathBuf>,
    scripts: Vec<PathBuf>,
    view_extension: String,
    ignore: Vec<String>,
    allocate_options: AllocateOptions,
    alphabet: Option<String>,
    exclude: Vec<String>,
    walk_options: WalkOptions,
    target: OutputTarget,
    dry_run: bool,
}

impl Default for Ruminate {
    fn default() -> Self {
        Self::new()
    }
}

impl Ruminate {
    pub fn new() -> Self {
        Self {
            css: Vec::new(),
            views: Vec::new(),
            scripts: Vec::new(),
            view_extension: "html".to_string(),
            ignore: Vec::new(),
            allocate_options: AllocateOptions::default(),
            alphabet: None,
            exclude: Vec::new(),
            walk_options: WalkOptions::default(),
            target: OutputTarget::InPlace,
            dry_run: false,
        }
    }

    /// Stylesheet roots (files or directories).
    pub fn css<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.css.extend(roots.into_iter().map(Into::into));
        self
    }

    /// View (markup) roots.
    pub fn views<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.views.extend(roots.into_iter().map(Into::into));
        self
    }

    /// Script roots.
    pub fn scripts<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.scripts.extend(roots.into_iter().map(Into::into));
        self
    }

    /// Extension of view files under directory roots (default `html`).
    pub fn view_extension(mut self, ext: &str) -> Self {
        self.view_extension = normalize_extension(ext);
        self
    }

    /// Names to leave alone. A leading `.` or `#` is dropped, so `.nav` and
    /// `nav` are the same entry.
    pub fn ignore<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref().trim();
            let name = name
                .strip_prefix('.')
                .or_else(|| name.strip_prefix('#'))
                .unwrap_or(name);
            if !name.is_empty() {
                self.ignore.push(name.to_string());
            }
        }
        self
    }

    /// Prefix for every generated name.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.allocate_options.prefix = prefix.into();
        self
    }

    /// Replace the set of names that are never generated.
    pub fn reserved<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allocate_options.reserved = names.into_iter().map(Into::into).collect();
        self
    }

    /// Characters generated names are built from (default `a`-`z`).
    pub fn alphabet(mut self, alphabet: impl Into<String>) -> Self {
        self.alphabet = Some(alphabet.into());
        self
    }

    /// Glob patterns, relative to each root, of files to skip.
    pub fn exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Include hidden files.
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.walk_options.include_hidden = include;
        self
    }

    /// Skip files ignored by git.
    pub fn respect_gitignore(mut self, respect: bool) -> Self {
        self.walk_options.respect_gitignore = respect;
        self
    }

    pub fn output(mut self, target: OutputTarget) -> Self {
        self.target = target;
        self
    }

    /// Rewrite in memory and report, but write nothing.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn allocation(&self) -> Result<AllocateOptions, ConfigError> {
        let mut options = self.allocate_options.clone();
        if let Some(alphabet) = &self.alphabet {
            options.sequence = IdentifierSequence::new(alphabet)?;
        }
        options.validate()?;
        Ok(options)
    }

    fn discover(&self) -> Result<Discovery, RuminateError> {
        let exclude = ExcludeSet::new(&self.exclude)?;
        let css_exts = extensions(Syntax::Css.default_extensions());
        let view_exts = vec![self.view_extension.clone()];
        let script_exts = extensions(Syntax::JavaScript.default_extensions());

        let groups = [
            (Syntax::Css, &self.css, &css_exts),
            (Syntax::Html, &self.views, &view_exts),
            (Syntax::JavaScript, &self.scripts, &script_exts),
        ];

        let mut discovery = Discovery::new();
        for (syntax, roots, exts) in groups {
            for root in roots {
                discovery.add_root(root, syntax, exts, &self.walk_options, &exclude)?;
            }
        }

        if discovery.is_empty() {
            return Err(RuminateError::NoFilesFound);
        }
        Ok(discovery)
    }

    /// Discover sources, collect selectors and allocate short names.
    pub fn scan(&self) -> Result<Scan, RuminateError> {
        let options = self.allocation()?;

        let (files, skipped_roots) = self.discover()?.into_parts();
        let sources = files
            .into_iter()
            .map(|file| -> Result<Source, RuminateError> {
                let content = std::fs::read_to_string(&file.path).map_err(|source| WalkError::Io {
                    path: file.path.clone(),
                    source,
                })?;
                Ok(Source { file, content })
            })
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!(files = sources.len(), "loaded sources");

        let mut collector = Collector::new(self.ignore.iter().cloned());
        for source in sources.iter().filter(|s| s.file.syntax == Syntax::Css) {
            collector
                .add_stylesheet(&source.content)
                .map_err(|e| RuminateError::source_file(&source.file.path, e))?;
        }
        for source in sources.iter().filter(|s| s.file.syntax == Syntax::Html) {
            collector
                .add_document(&source.content)
                .map_err(|e| RuminateError::source_file(&source.file.path, e))?;
        }
        let selectors = collector.finish();
        tracing::info!(
            classes = selectors.classes().len(),
            ids = selectors.ids().len(),
            ignored = selectors.ignored().len(),
            "collected selectors"
        );

        let maps = allocate(&selectors, &options)?;

        Ok(Scan {
            sources,
            selectors,
            maps,
            skipped_roots,
        })
    }

    /// Scan only and describe the rename maps.
    pub fn map(&self) -> Result<MapReport, RuminateError> {
        Ok(self.scan()?.report())
    }

    /// Scan, rewrite every source, then write the results.
    pub fn run(self) -> Result<RunReport, RuminateError> {
        let scan = self.scan()?;
        let maps = &scan.maps;

        let rewritten = scan
            .sources
            .par_iter()
            .map(|source| rewrite_source(source, maps))
            .collect::<Result<Vec<_>, RuminateError>>()?;

        let mut unlinked = Unlinked::default();
        let mut files = Vec::with_capacity(rewritten.len());
        let mut written = HashSet::new();

        for (source, (content, file_unlinked)) in scan.sources.iter().zip(rewritten) {
            unlinked.merge(file_unlinked);

            let changed = content != source.content;
            let destination = if self.dry_run {
                None
            } else {
                self.target.destination(&source.file, changed)
            };

            if let Some(dest) = &destination {
                if !written.insert(dest.clone()) {
                    tracing::warn!(path = %dest.display(), "several sources map to the same output file");
                }
                write_file(dest, &content)?;
            }

            files.push(FileReport {
                path: source.file.path.clone(),
                destination,
                syntax: source.file.syntax,
                bytes_before: source.content.len(),
                bytes_after: content.len(),
                changed,
            });
        }

        unlinked.forget(self.ignore.iter().map(String::as_str));

        let report = RunReport {
            classes: scan.selectors.classes().len(),
            ids: scan.selectors.ids().len(),
            maps: scan.maps,
            unlinked,
            skipped_roots: scan.skipped_roots,
            files,
            dry_run: self.dry_run,
        };
        tracing::info!(
            files = report.files.len(),
            changed = report.files_changed(),
            dry_run = self.dry_run,
            "rewrite complete"
        );
        Ok(report)
    }
}

fn extensions(exts: &[&str]) -> Vec<String> {
    exts.iter().map(|e| e.to_string()).collect()
}

fn rewrite_source(source: &Source, maps: &RenameMaps) -> Result<(String, Unlinked), RuminateError> {
    let mut unlinked = Unlinked::default();
    let content = &source.content;
    let result = match source.file.syntax {
        Syntax::Css => rewrite_css(content, maps),
        Syntax::Html => rewrite_html(content, maps, &mut unlinked),
        Syntax::JavaScript => rewrite_js(content, maps, &mut unlinked),
    };
    let rewritten = result.map_err(|e| RuminateError::source_file(&source.file.path, e))?;
    tracing::debug!(path = %source.file.path.display(), "rewrote {}", source.file.syntax);
    Ok((rewritten, unlinked))
}

/// A discovered file and its content.
#[derive(Debug, Clone)]
pub struct Source {
    pub file: SourceFile,
    pub content: String,
}

/// Everything known before any file is rewritten.
#[derive(Debug)]
pub struct Scan {
    pub sources: Vec<Source>,
    pub selectors: SelectorSet,
    pub maps: RenameMaps,
    pub skipped_roots: Vec<PathBuf>,
}

impl Scan {
    pub fn report(&self) -> MapReport {
        MapReport {
            classes: self.selectors.classes().len(),
            ids: self.selectors.ids().len(),
            ignored: self.selectors.ignored().iter().cloned().collect(),
            files: self.sources.len(),
            skipped_roots: self.skipped_roots.clone(),
            maps: self.maps.clone(),
        }
    }
}
