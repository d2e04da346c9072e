//! SHA-256 over raw archive bytes. Digests are lowercase hex.
//!
//! Records are hashed as received (no canonicalization): the digest identifies
//! the exact dump a derivation ran against.

use sha2::{Digest, Sha256};

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
