//! Built distribution (`.whl`) reader.

use std::fs::File;
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::error::{HarnessError, HarnessResult};

/// A wheel on disk.
#[derive(Debug)]
pub struct WheelArchive {
    path: PathBuf,
    archive: ZipArchive<File>,
}

impl WheelArchive {
    pub fn open(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| HarnessError::io(&path, e))?;
        let archive = ZipArchive::new(file).map_err(|source| HarnessError::Wheel {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, archive })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every member name as stored in the central directory.
    pub fn member_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    /// Immediate children of the archive root, in first-seen order.
    ///
    /// Directories are implied by member paths (`pkg.dist-info/METADATA` yields
    /// `pkg.dist-info`) whether or not the archive stores explicit directory entries.
    pub fn top_level_entries(&self) -> Vec<String> {
        let mut entries: Vec<String> = Vec::new();
        for name in self.archive.file_names() {
            let first = name.split('/').next().unwrap_or("");
            if !first.is_empty() && !entries.iter().any(|e| e == first) {
                entries.push(first.to_string());
            }
        }
        entries
    }
}
