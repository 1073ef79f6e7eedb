//! Where rewritten files go.

use std::fs;
use std::path::{Path, PathBuf};

use crate::output::OutputError;
use crate::walker::SourceFile;

/// Output placement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputTarget {
    /// Overwrite each source file. Unchanged files are left untouched.
    #[default]
    InPlace,
    /// Write every file under this directory, at its path relative to its
    /// root, so the mirror is complete.
    Mirror(PathBuf),
}

impl OutputTarget {
    /// Where `file` would be written, or `None` if it needs no write.
    pub fn destination(&self, file: &SourceFile, changed: bool) -> Option<PathBuf> {
        match self {
            OutputTarget::InPlace => changed.then(|| file.path.clone()),
            OutputTarget::Mirror(dir) => Some(dir.join(&file.relative)),
        }
    }
}

/// Write `content` to `destination`, creating parent directories.
pub fn write_file(destination: &Path, content: &str) -> Result<(), OutputError> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| OutputError::write(parent, e))?;
        }
    }
    fs::write(destination, content).map_err(|e| OutputError::write(destination, e))?;
    tracing::debug!(path = %destination.display(), bytes = content.len(), "wrote file");
    Ok(())
}
