//! Source distribution (`.tar.gz`) reader.
//!
//! Each query streams the archive from disk again; sdists of the sample project are a few
//! kilobytes, so there is nothing to cache.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::error::{HarnessError, HarnessResult};

/// A gzip-compressed tar on disk.
#[derive(Debug, Clone)]
pub struct SdistArchive {
    path: PathBuf,
}

/// Member name as `tarfile.getnames()` reports it: raw path, no trailing slash.
fn normalize_member(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim_end_matches('/').to_string()
}

impl SdistArchive {
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn archive(&self) -> HarnessResult<Archive<GzDecoder<File>>> {
        let file = File::open(&self.path).map_err(|e| HarnessError::io(&self.path, e))?;
        Ok(Archive::new(GzDecoder::new(file)))
    }

    fn archive_err(&self, source: std::io::Error) -> HarnessError {
        HarnessError::Archive {
            path: self.path.clone(),
            source,
        }
    }

    /// Member names in archive order.
    pub fn member_names(&self) -> HarnessResult<Vec<String>> {
        let mut archive = self.archive()?;
        let mut names = Vec::new();
        for entry in archive.entries().map_err(|e| self.archive_err(e))? {
            let entry = entry.map_err(|e| self.archive_err(e))?;
            names.push(normalize_member(&entry.path_bytes()));
        }
        Ok(names)
    }

    /// Member names as a set.
    pub fn member_set(&self) -> HarnessResult<BTreeSet<String>> {
        Ok(self.member_names()?.into_iter().collect())
    }

    /// Raw bytes of one member.
    pub fn read_member(&self, member: &str) -> HarnessResult<Vec<u8>> {
        let mut archive = self.archive()?;
        for entry in archive.entries().map_err(|e| self.archive_err(e))? {
            let mut entry = entry.map_err(|e| self.archive_err(e))?;
            if normalize_member(&entry.path_bytes()) == member {
                let mut buf = Vec::new();
                entry.read_to_end(&mut buf).map_err(|e| self.archive_err(e))?;
                return Ok(buf);
            }
        }
        Err(HarnessError::MissingMember {
            path: self.path.clone(),
            member: member.to_string(),
        })
    }

    /// One member decoded as UTF-8.
    pub fn read_member_text(&self, member: &str) -> HarnessResult<String> {
        String::from_utf8(self.read_member(member)?).map_err(|_| HarnessError::Encoding {
            member: member.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;

    fn write_sdist(dir: &Path, members: &[(&str, &[u8])]) -> PathBuf {
        let path = dir.join("pkg-1.0.tar.gz");
        let file = File::create(&path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for (name, data) in members {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
        path
    }

    #[test]
    fn test_member_names_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_sdist(
            tmp.path(),
            &[("pkg-1.0/pyproject.toml", b"[project]\n"), ("pkg-1.0/PKG-INFO", b"Name: pkg\n")],
        );
        let sdist = SdistArchive::open(&path);
        assert_eq!(
            sdist.member_names().unwrap(),
            vec!["pkg-1.0/pyproject.toml", "pkg-1.0/PKG-INFO"]
        );
    }

    #[test]
    fn test_read_member_text() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_sdist(tmp.path(), &[("pkg-1.0/PKG-INFO", b"Name: pkg\n")]);
        let text = SdistArchive::open(&path).read_member_text("pkg-1.0/PKG-INFO").unwrap();
        assert_eq!(text, "Name: pkg\n");
    }

    #[test]
    fn test_read_missing_member() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_sdist(tmp.path(), &[("pkg-1.0/PKG-INFO", b"")]);
        let err = SdistArchive::open(&path).read_member("pkg-1.0/setup.py").unwrap_err();
        assert!(matches!(err, HarnessError::MissingMember { .. }));
    }

    #[test]
    fn test_non_utf8_member() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_sdist(tmp.path(), &[("pkg-1.0/PKG-INFO", &[0xff, 0xfe])]);
        let err = SdistArchive::open(&path).read_member_text("pkg-1.0/PKG-INFO").unwrap_err();
        assert!(matches!(err, HarnessError::Encoding { .. }));
    }

    #[test]
    fn test_not_gzip_is_archive_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.tar.gz");
        std::fs::write(&path, b"definitely not gzip").unwrap();
        let err = SdistArchive::open(&path).member_names().unwrap_err();
        assert!(matches!(err, HarnessError::Archive { .. }));
    }

    #[test]
    fn test_directory_members_lose_trailing_slash() {
        assert_eq!(normalize_member(b"pkg-1.0/"), "pkg-1.0");
        assert_eq!(normalize_member(b"pkg-1.0/src/main.cpp"), "pkg-1.0/src/main.cpp");
    }
}
