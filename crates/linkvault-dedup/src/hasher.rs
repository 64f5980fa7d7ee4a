//! Streaming content hasher.
//!
//! Reads a file in fixed blocks and feeds each into an incremental hash
//! state. Standalone by design: callers decide when hashing is worth the
//! read, this module only computes digests.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use linkvault_core::{ContentHash, HashAlgorithm};

/// Block size for streaming reads: 512 KiB.
pub const HASH_BLOCK_SIZE: usize = 512 * 1024;

/// Compute the content digest of a file.
///
/// Handles zero-length files (digest of empty input) and trailing partial
/// blocks. An unreadable file surfaces as `Err`; the caller decides
/// whether that abandons duplicate detection for the file or aborts.
pub fn hash_file(path: &Path, algorithm: HashAlgorithm) -> std::io::Result<ContentHash> {
    let file = File::open(path)?;
    match algorithm {
        HashAlgorithm::Blake3 => hash_with(file, blake3::Hasher::new()),
        HashAlgorithm::Sha256 => hash_with(file, Sha256::new()),
    }
}

/// Incremental hash state; one impl per supported algorithm.
trait BlockHasher {
    fn consume(&mut self, block: &[u8]);
    fn digest(self) -> [u8; 32];
}

impl BlockHasher for blake3::Hasher {
    fn consume(&mut self, block: &[u8]) {
        self.update(block);
    }

    fn digest(self) -> [u8; 32] {
        *self.finalize().as_bytes()
    }
}

impl BlockHasher for Sha256 {
    fn consume(&mut self, block: &[u8]) {
        self.update(block);
    }

    fn digest(self) -> [u8; 32] {
        self.finalize().into()
    }
}

fn hash_with<H: BlockHasher>(mut file: File, mut state: H) -> std::io::Result<ContentHash> {
    let mut block = vec![0u8; HASH_BLOCK_SIZE];
    loop {
        let read = file.read(&mut block)?;
        if read == 0 {
            break;
        }
        state.consume(&block[..read]);
    }
    Ok(ContentHash::new(state.digest()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn empty_file_digest() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty");
        fs::write(&path, b"").unwrap();

        let digest = hash_file(&path, HashAlgorithm::Blake3).unwrap();
        assert_eq!(digest.0, *blake3::hash(b"").as_bytes());
    }

    #[test]
    fn partial_trailing_block() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("big");
        // One full block plus a partial one.
        let content: Vec<u8> = (0..HASH_BLOCK_SIZE + 12345)
            .map(|i| (i % 251) as u8)
            .collect();
        fs::write(&path, &content).unwrap();

        let digest = hash_file(&path, HashAlgorithm::Blake3).unwrap();
        assert_eq!(digest.0, *blake3::hash(&content).as_bytes());
    }

    #[test]
    fn sha256_matches_one_shot() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("small");
        fs::write(&path, b"some bytes").unwrap();

        let digest = hash_file(&path, HashAlgorithm::Sha256).unwrap();
        let expected: [u8; 32] = <Sha256 as Digest>::digest(b"some bytes").into();
        assert_eq!(digest.0, expected);
    }

    #[test]
    fn algorithms_disagree() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("file");
        fs::write(&path, b"content").unwrap();

        let blake = hash_file(&path, HashAlgorithm::Blake3).unwrap();
        let sha = hash_file(&path, HashAlgorithm::Sha256).unwrap();
        assert_ne!(blake, sha);
    }

    #[test]
    fn missing_file_is_err() {
        let temp = TempDir::new().unwrap();
        assert!(hash_file(&temp.path().join("absent"), HashAlgorithm::Blake3).is_err());
    }
}
