//! Per-request upload staging
//!
//! An upload is written to its own uniquely named temporary file. The file is
//! owned by [`StagedUpload`] and removed when the guard is dropped, so every
//! exit path (success, error, panic unwinding) releases it.

use std::io::Write;
use std::path::Path;

use tempfile::{Builder, NamedTempFile};

/// Suffix given to every staged upload
pub const STAGED_SUFFIX: &str = ".wav";

const STAGED_PREFIX: &str = "accent-upload-";

/// Uploaded bytes materialized on disk for the lifetime of one request
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
}

impl StagedUpload {
    /// Write `bytes` to a new temporary file in `dir` (system temp dir if `None`)
    pub fn write(bytes: &[u8], dir: Option<&Path>) -> std::io::Result<Self> {
        let mut builder = Builder::new();
        builder.prefix(STAGED_PREFIX).suffix(STAGED_SUFFIX);

        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;

        tracing::debug!(path = %file.path().display(), bytes = bytes.len(), "Staged upload");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Remove the file now, reporting failures instead of ignoring them
    pub fn close(self) -> std::io::Result<()> {
        self.file.close()
    }
}
