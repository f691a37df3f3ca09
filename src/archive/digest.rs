//! Artifact digests.

use std::fs::File;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{HarnessError, HarnessResult};

/// Lowercase hex SHA-256 of a byte slice.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Lowercase hex SHA-256 of a file's contents, streamed.
pub fn sha256_file(path: &Path) -> HarnessResult<String> {
    let mut file = File::open(path).map_err(|e| HarnessError::io(path, e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|e| HarnessError::io(path, e))?;
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sha256_file_matches_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("artifact.bin");
        let payload: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &payload).unwrap();
        assert_eq!(sha256_file(&path).unwrap(), sha256_hex(&payload));
    }

    #[test]
    fn test_sha256_file_missing() {
        let err = sha256_file(Path::new("/nonexistent/artifact.tar.gz")).unwrap_err();
        assert!(matches!(err, HarnessError::Io { .. }));
    }
}
