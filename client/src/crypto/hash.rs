//! # Hashing Utilities
//!
//! One hash function, used everywhere: SHA-256. The verifier recomputes
//! every digest we produce, and the switch contract is SHA-256 end to end
//! (salt hashes, OAEP digests, MGF1). A faster hash that the other side
//! can't check is not faster, it's wrong.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data.
///
/// Returns a 32-byte digest as a `Vec<u8>`. Most callers immediately pass
/// it to an AEAD or a base64 encoder that wants `&[u8]`; the heap
/// allocation is noise compared to the cost of the hash itself.
///
/// # Example
///
/// ```
/// use velo_client::crypto::sha256;
///
/// let hash = sha256(b"velo");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Hash multiple byte slices together without concatenation overhead.
///
/// Feeds the parts sequentially into one hasher; same digest as hashing
/// the concatenation, no temporary buffer. The credential pipeline uses
/// this for `SHA-256(iv || salt)` -- the IV strictly first, then the salt
/// bytes, which is wire contract with the verifier.
pub fn sha256_multi(parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        // SHA-256 of empty string -- the canonical test vector everyone
        // should have memorized by now.
        let hash = sha256(b"");
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(hash, expected);
    }

    #[test]
    fn sha256_deterministic() {
        let a = sha256(b"velo");
        let b = sha256(b"velo");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn test_multi_matches_concatenation() {
        // Feeding parts via update() must equal hashing the concatenation.
        let multi = sha256_multi(&[b"hello", b" world"]);
        let single = sha256(b"hello world");
        assert_eq!(multi, single);
    }

    #[test]
    fn test_multi_part_boundaries_do_not_matter() {
        let a = sha256_multi(&[b"ab", b"cd"]);
        let b = sha256_multi(&[b"a", b"bcd"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_multi_order_matters() {
        // iv || salt and salt || iv are different digests. The verifier
        // hashes IV first; so do we.
        let a = sha256_multi(&[b"iv", b"salt"]);
        let b = sha256_multi(&[b"salt", b"iv"]);
        assert_ne!(a, b);
    }
}
