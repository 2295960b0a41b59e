//! Range digests using XXHash3
//!
//! Elements are fed to the hasher as little-endian bytes, so a digest is
//! stable across hosts.

use crate::core::Element;
use crate::error::{CopyError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

/// Elements per hasher update
const DIGEST_BLOCK: usize = 8 * 1024;

/// Ranges at least this long are digested per block in parallel
const PARALLEL_THRESHOLD: usize = 1 << 20;

/// Digest of an element range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeDigest {
    /// Number of elements hashed
    pub elements: usize,
    /// XXHash3-128 as lowercase hex string
    pub hash: String,
}

impl RangeDigest {
    /// Verify against another digest
    pub fn verify(&self, other: &RangeDigest) -> bool {
        self.elements == other.elements && self.hash == other.hash
    }
}

impl std::fmt::Display for RangeDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}

fn hash_block(hasher: &mut Xxh3, block: &[Element]) {
    let mut bytes = Vec::with_capacity(block.len() * std::mem::size_of::<Element>());
    for value in block {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    hasher.update(&bytes);
}

/// Compute the digest of an element range.
///
/// Large ranges are split into blocks hashed in parallel; the block digests
/// are then hashed in order, so the result depends only on the contents.
pub fn digest_elements(elements: &[Element]) -> RangeDigest {
    let mut hasher = Xxh3::new();

    if elements.len() >= PARALLEL_THRESHOLD {
        let block_digests: Vec<u128> = elements
            .par_chunks(DIGEST_BLOCK)
            .map(|block| {
                let mut h = Xxh3::new();
                hash_block(&mut h, block);
                h.digest128()
            })
            .collect();

        for digest in block_digests {
            hasher.update(&digest.to_le_bytes());
        }
    } else {
        for block in elements.chunks(DIGEST_BLOCK) {
            hash_block(&mut hasher, block);
        }
    }

    RangeDigest {
        elements: elements.len(),
        hash: format!("{:032x}", hasher.digest128()),
    }
}

/// Check that two ranges hold the same elements; returns the shared digest
pub fn verify_ranges(expected: &[Element], actual: &[Element]) -> Result<RangeDigest> {
    let expected_digest = digest_elements(expected);
    let actual_digest = digest_elements(actual);

    if expected_digest.verify(&actual_digest) {
        Ok(expected_digest)
    } else {
        Err(CopyError::integrity_mismatch(
            expected_digest.hash,
            actual_digest.hash,
        ))
    }
}
