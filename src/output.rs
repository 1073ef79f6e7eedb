//! Run reports.
//!
//! Formats what a run did (rename maps, unlinked selectors, per-file sizes)
//! as plain text for people or JSON for scripts.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::filter::Syntax;
use crate::selectors::{RenameMap, RenameMaps, SelectorKind, Unlinked};

/// Errors that can occur while writing results.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OutputError {
    pub(crate) fn write(path: &Path, source: std::io::Error) -> Self {
        OutputError::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable summary (default).
    #[default]
    Text,
    /// JSON for programmatic access.
    Json,
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    /// Where the result was written; `None` when nothing was written.
    pub destination: Option<PathBuf>,
    pub syntax: Syntax,
    pub bytes_before: usize,
    pub bytes_after: usize,
    pub changed: bool,
}

/// Summary of a full run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub classes: usize,
    pub ids: usize,
    pub maps: RenameMaps,
    pub unlinked: Unlinked,
    /// Roots that did not exist and were skipped.
    pub skipped_roots: Vec<PathBuf>,
    pub files: Vec<FileReport>,
    pub dry_run: bool,
}

impl RunReport {
    /// Number of files whose content changed.
    pub fn files_changed(&self) -> usize {
        self.files.iter().filter(|f| f.changed).count()
    }

    pub fn bytes_before(&self) -> usize {
        self.files.iter().map(|f| f.bytes_before).sum()
    }

    pub fn bytes_after(&self) -> usize {
        self.files.iter().map(|f| f.bytes_after).sum()
    }
}

/// Result of `map`: the selectors found and the names they would get.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MapReport {
    pub classes: usize,
    pub ids: usize,
    /// Ignored names that appeared in stylesheets.
    pub ignored: Vec<String>,
    pub files: usize,
    pub skipped_roots: Vec<PathBuf>,
    pub maps: RenameMaps,
}

/// Format a number with thousands separators.
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{} {}", format_number(n), if n == 1 { one } else { many })
}

fn format_map(output: &mut String, title: &str, kind: SelectorKind, map: &RenameMap) {
    if map.is_empty() {
        return;
    }
    output.push_str(&format!("\n{title}:\n"));
    let sigil = kind.sigil();
    for (from, to) in map.iter() {
        output.push_str(&format!("  {sigil}{from} -> {sigil}{to}\n"));
    }
}

fn format_skipped(output: &mut String, skipped: &[PathBuf]) {
    if skipped.is_empty() {
        return;
    }
    output.push_str("\nSkipped missing roots:\n");
    for root in skipped {
        output.push_str(&format!("  {}\n", root.display()));
    }
}

fn format_bytes(before: usize, after: usize) -> String {
    let delta = if after <= before {
        format!("{} saved", format_number(before - after))
    } else {
        format!("{} added", format_number(after - before))
    };
    format!(
        "Bytes: {} -> {} ({delta})\n",
        format_number(before),
        format_number(after)
    )
}

fn to_json<T: Serialize>(value: &T) -> Result<String, OutputError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Format a run report.
pub fn format_report(report: &RunReport, format: OutputFormat) -> Result<String, OutputError> {
    match format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Text => Ok(format_report_text(report)),
    }
}

fn format_report_text(report: &RunReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Selectors: {}, {}\n",
        plural(report.classes, "class", "classes"),
        plural(report.ids, "id", "ids")
    ));
    format_map(&mut output, "Classes", SelectorKind::Class, &report.maps.classes);
    format_map(&mut output, "Ids", SelectorKind::Id, &report.maps.ids);

    if !report.unlinked.is_empty() {
        output.push_str(&format!(
            "\nUnlinked: {}, {}\n",
            plural(report.unlinked.classes.len(), "class", "classes"),
            plural(report.unlinked.ids.len(), "id", "ids")
        ));
        for class in &report.unlinked.classes {
            output.push_str(&format!("  .{class}\n"));
        }
        for id in &report.unlinked.ids {
            output.push_str(&format!("  #{id}\n"));
        }
    }

    format_skipped(&mut output, &report.skipped_roots);

    output.push('\n');
    let verb = if report.dry_run {
        "would change"
    } else {
        "changed"
    };
    output.push_str(&format!(
        "Files: {} of {} {verb}\n",
        format_number(report.files_changed()),
        format_number(report.files.len())
    ));
    output.push_str(&format_bytes(report.bytes_before(), report.bytes_after()));

    output
}

/// Format the result of `map`.
pub fn format_map_report(report: &MapReport, format: OutputFormat) -> Result<String, OutputError> {
    match format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Text => {
            let mut output = String::new();
            output.push_str(&format!(
                "Selectors: {}, {} in {}\n",
                plural(report.classes, "class", "classes"),
                plural(report.ids, "id", "ids"),
                plural(report.files, "file", "files")
            ));
            if !report.ignored.is_empty() {
                output.push_str(&format!("Ignored: {}\n", report.ignored.join(", ")));
            }
            format_map(&mut output, "Classes", SelectorKind::Class, &report.maps.classes);
            format_map(&mut output, "Ids", SelectorKind::Id, &report.maps.ids);
            format_skipped(&mut output, &report.skipped_roots);
            Ok(output)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RunReport {
        let maps = RenameMaps::new(
            [("foo", "a")].into_iter().collect(),
            [("bar", "b")].into_iter().collect(),
        );
        let mut unlinked = Unlinked::default();
        unlinked.record(SelectorKind::Class, "stray");
        RunReport {
            classes: 1,
            ids: 1,
            maps,
            unlinked,
            skipped_roots: vec![PathBuf::from("missing")],
            files: vec![
                FileReport {
                    path: PathBuf::from("site.css"),
                    destination: Some(PathBuf::from("site.css")),
                    syntax: Syntax::Css,
                    bytes_before: 2_500,
                    bytes_after: 1_200,
                    changed: true,
                },
                FileReport {
                    path: PathBuf::from("app.js"),
                    destination: None,
                    syntax: Syntax::JavaScript,
                    bytes_before: 100,
                    bytes_after: 100,
                    changed: false,
                },
            ],
            dry_run: false,
        }
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn test_text_report() {
        let text = format_report(&sample(), OutputFormat::Text).unwrap();
        assert!(text.starts_with("Selectors: 1 class, 1 id\n"));
        assert!(text.contains("  .foo -> .a\n"));
        assert!(text.contains("  #bar -> #b\n"));
        assert!(text.contains("Unlinked: 1 class, 0 ids\n  .stray\n"));
        assert!(text.contains("Skipped missing roots:\n  missing\n"));
        assert!(text.contains("Files: 1 of 2 changed\n"));
        assert!(text.contains("Bytes: 2,600 -> 1,300 (1,300 saved)\n"));
    }

    #[test]
    fn test_dry_run_wording() {
        let mut report = sample();
        report.dry_run = true;
        let text = format_report(&report, OutputFormat::Text).unwrap();
        assert!(text.contains("Files: 1 of 2 would change\n"));
    }

    #[test]
    fn test_json_report() {
        let json = format_report(&sample(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["maps"]["classes"]["foo"], "a");
        assert_eq!(value["maps"]["ids"]["bar"], "b");
        assert_eq!(value["unlinked"]["classes"][0], "stray");
        assert_eq!(value["files"][0]["syntax"], "css");
        assert_eq!(value["files"][1]["destination"], serde_json::Value::Null);
        assert_eq!(value["files"][1]["syntax"], "javascript");
    }

    #[test]
    fn test_map_report_text() {
        let report = MapReport {
            classes: 1,
            ids: 0,
            ignored: vec!["keep".to_string()],
            files: 3,
            skipped_roots: Vec::new(),
            maps: RenameMaps::new([("foo", "a")].into_iter().collect(), RenameMap::new()),
        };
        let text = format_map_report(&report, OutputFormat::Text).unwrap();
        assert!(text.starts_with("Selectors: 1 class, 0 ids in 3 files\n"));
        assert!(text.contains("Ignored: keep\n"));
        assert!(text.contains("  .foo -> .a\n"));
        assert!(!text.contains("Ids:"));
    }
}
