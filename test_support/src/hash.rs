//! Hash helpers for tests.
//!
//! These expose the SHA-256 prefixes the generator derives identifiers and
//! names from, so tests can assert them without duplicating hashing logic.
//!
//! # Examples
//!
//! ```rust
//! use test_support::hash::sha256_hex;
//!
//! let digest = sha256_hex(b"xcbazel");
//! assert_eq!(digest.len(), 64);
//! ```
use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest for `data` and return it as a lowercase hex
/// string.
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut key = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(&mut key, "{byte:02x}");
    }
    key
}

/// The uppercase eight-digit salt every identifier of `project` starts with.
///
/// The name is hashed with its `<len>:` prefix.
pub fn gid_salt(project: &str) -> String {
    sha256_hex(format!("{}:{project}", project.len()).as_bytes())
        .chars()
        .take(8)
        .collect::<String>()
        .to_uppercase()
}
