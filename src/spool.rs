//! The incoming-documents directory.
//!
//! Extracted PDFs land here under their original filename, reduced to a bare
//! file name first so a crafted attachment name cannot escape the directory.
//! A later attachment with the same name overwrites the earlier one.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name used when sanitization leaves nothing of the declared filename.
const FALLBACK_FILENAME: &str = "attachment.pdf";

/// Handle to the directory extracted attachments are written into.
#[derive(Debug, Clone)]
pub struct Spool {
    dir: PathBuf,
}

impl Spool {
    /// Creates a spool rooted at `dir`. Call [`ensure_dir`](Self::ensure_dir)
    /// before the first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the spool directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the spool directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|source| Error::CreateSpoolDir {
            dir: self.dir.clone(),
            source,
        })
    }

    /// Writes an attachment payload under its sanitized filename and returns
    /// the destination path. An existing file with the same name is
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn store(&self, filename: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.dir.join(sanitize_filename(filename));

        tokio::fs::write(&path, data)
            .await
            .map_err(|source| Error::WriteAttachment {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), bytes = data.len(), "Saved attachment");

        Ok(path)
    }
}

/// Reduces a sender-declared filename to a bare file name.
///
/// Path separators (both kinds) are treated as component boundaries and only
/// the final component is kept; `.` and `..` components are discarded.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename
        .split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .next_back()
        .unwrap_or("")
        .trim();

    if name.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        name.to_string()
    }
}
