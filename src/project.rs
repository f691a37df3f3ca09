//! The sample project and its output directory.
//!
//! The project tree is read-only input. The only thing the harness ever deletes is
//! `<project>/dist`, which is cleared before each build so artifact lookups see exactly
//! what the current run produced.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::Glob;

use crate::error::{HarnessError, HarnessResult};

/// Output directory name, relative to the project.
pub const DIST_DIR: &str = "dist";

/// Sample project handle
#[derive(Debug, Clone)]
pub struct SampleProject {
    dir: PathBuf,
}

impl SampleProject {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Resolve to an absolute path so subprocesses running elsewhere still find it.
    pub fn canonicalize(&self) -> HarnessResult<Self> {
        let dir = fs::canonicalize(&self.dir).map_err(|e| HarnessError::io(&self.dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn dist_dir(&self) -> PathBuf {
        self.dir.join(DIST_DIR)
    }

    /// Recursively remove the output directory. A missing directory is fine.
    pub fn clear_dist(&self) -> HarnessResult<()> {
        let dist = self.dist_dir();
        match fs::remove_dir_all(&dist) {
            Ok(()) => {
                tracing::debug!(dist = %dist.display(), "cleared output directory");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(HarnessError::io(dist, e)),
        }
    }

    /// Entries of the output directory, sorted by name.
    pub fn dist_entries(&self) -> HarnessResult<Vec<PathBuf>> {
        let dist = self.dist_dir();
        let read = fs::read_dir(&dist).map_err(|e| HarnessError::io(&dist, e))?;
        let mut entries = Vec::new();
        for entry in read {
            entries.push(entry.map_err(|e| HarnessError::io(&dist, e))?.path());
        }
        entries.sort();
        Ok(entries)
    }

    /// The only entry in the output directory.
    pub fn sole_artifact(&self) -> HarnessResult<PathBuf> {
        single(self.dist_entries()?, "*", self.dist_dir())
    }

    /// The only output-directory entry whose file name matches `pattern`.
    pub fn locate(&self, pattern: &str) -> HarnessResult<PathBuf> {
        let matcher = Glob::new(pattern)?.compile_matcher();
        let matches: Vec<PathBuf> = self
            .dist_entries()?
            .into_iter()
            .filter(|p| p.file_name().is_some_and(|n| matcher.is_match(n)))
            .collect();
        single(matches, pattern, self.dist_dir())
    }

    /// Files of the project tree relative to its root (`/`-separated, sorted),
    /// skipping the output directory and hidden entries.
    pub fn source_files(&self) -> HarnessResult<Vec<String>> {
        let mut files = Vec::new();
        collect_files(&self.dir, &self.dir, &mut files)?;
        files.sort();
        Ok(files)
    }
}

fn single(mut found: Vec<PathBuf>, pattern: &str, dir: PathBuf) -> HarnessResult<PathBuf> {
    if found.len() == 1 {
        if let Some(path) = found.pop() {
            return Ok(path);
        }
    }
    Err(HarnessError::ArtifactCount {
        pattern: pattern.to_string(),
        dir,
        found: found.len(),
    })
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) -> HarnessResult<()> {
    let read = fs::read_dir(dir).map_err(|e| HarnessError::io(dir, e))?;
    for entry in read {
        let path = entry.map_err(|e| HarnessError::io(dir, e))?.path();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name.starts_with('.') || (dir == root && (name == DIST_DIR || name == "build")) {
            continue;
        }
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else if let Ok(rel) = path.strip_prefix(root) {
            let parts: Vec<String> = rel.components().map(|c| c.as_os_str().to_string_lossy().to_string()).collect();
            out.push(parts.join("/"));
        }
    }
    Ok(())
}
