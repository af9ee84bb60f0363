//! Full-content verification with BLAKE3.
//!
//! The [`FullVerifier`] is the authoritative equality check. It re-reads the
//! size of the opened file and refuses to hash a candidate whose size moved
//! since grouping, then streams the whole file in fixed-size chunks, so
//! memory use is bounded regardless of file size.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use super::{HashError, SizeRaceError};

/// Full-content digest (BLAKE3, 32 bytes).
pub type ContentHash = [u8; 32];

/// Default streaming chunk size.
pub const VERIFY_CHUNK_SIZE: usize = 64 * 1024;

/// Why a candidate could not be verified.
#[derive(thiserror::Error, Debug)]
pub enum VerifyError {
    /// The file could not be read.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// The file changed size after it was grouped.
    #[error(transparent)]
    SizeRace(#[from] SizeRaceError),
}

/// Streams files through BLAKE3 after a size re-check.
#[derive(Debug, Clone)]
pub struct FullVerifier {
    chunk_size: usize,
}

impl Default for FullVerifier {
    fn default() -> Self {
        Self {
            chunk_size: VERIFY_CHUNK_SIZE,
        }
    }
}

impl FullVerifier {
    /// Create a verifier with the default chunk size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different chunk size (minimum 1 byte).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Digest the full content of `path`, which must still be `expected_size` bytes.
    ///
    /// # Errors
    ///
    /// - [`VerifyError::SizeRace`] if the size differs before or during the read
    /// - [`VerifyError::Hash`] if the file cannot be opened or read
    pub fn digest(&self, path: &Path, expected_size: u64) -> Result<ContentHash, VerifyError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let actual = file
            .metadata()
            .map_err(|e| HashError::from_io(path, e))?
            .len();
        if actual != expected_size {
            return Err(SizeRaceError {
                path: path.to_path_buf(),
                expected: expected_size,
                actual,
            }
            .into());
        }

        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; self.chunk_size];
        let mut total: u64 = 0;

        loop {
            let n = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e).into()),
            };
            hasher.update(&buffer[..n]);
            total += n as u64;
        }

        // Truncated or extended while streaming
        if total != expected_size {
            return Err(SizeRaceError {
                path: path.to_path_buf(),
                expected: expected_size,
                actual: total,
            }
            .into());
        }

        Ok(*hasher.finalize().as_bytes())
    }
}

/// Convert a content hash to lowercase hex.
#[must_use]
pub fn hash_to_hex(hash: &ContentHash) -> String {
    blake3::Hash::from(*hash).to_hex().to_string()
}
