//! Name hashing utilities.
//!
//! [`NameHasher`] computes short, stable SHA-256 digests over sequences of
//! names. Each part is length-prefixed so `["ab", "c"]` and `["a", "bc"]`
//! never collide. The digests salt object identifiers and suffix merged
//! indexer target names.
//!
//! # Examples
//!
//! ```
//! use xcbazel::hasher::NameHasher;
//!
//! let suffix = NameHasher::digest(["Lib", "App"], 8);
//! assert_eq!(suffix.len(), 8);
//! ```

use sha2::{Digest, Sha256};

/// Incremental digest over length-prefixed name parts.
#[derive(Debug, Clone, Default)]
pub struct NameHasher {
    hasher: Sha256,
}

impl NameHasher {
    /// Start an empty digest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one part.
    pub fn update(&mut self, part: &str) -> &mut Self {
        let len = part.len();
        self.hasher.update(format!("{len}:").as_bytes());
        self.hasher.update(part.as_bytes());
        self
    }

    /// Lowercase hex digest truncated to `digits` characters.
    #[must_use]
    pub fn finish(self, digits: usize) -> String {
        format!("{:x}", self.hasher.finalize())
            .chars()
            .take(digits)
            .collect()
    }

    /// Digest of `parts` truncated to `digits` hex characters.
    #[must_use]
    pub fn digest<'a>(parts: impl IntoIterator<Item = &'a str>, digits: usize) -> String {
        let mut hasher = Self::new();
        for part in parts {
            hasher.update(part);
        }
        hasher.finish(digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(vec!["Demo"], "d0df69c0")]
    #[case(vec!["ab", "c"], "430fb1b4")]
    #[case(vec!["a", "bc"], "5310a587")]
    fn digest_is_stable(#[case] parts: Vec<&str>, #[case] expected: &str) {
        assert_eq!(NameHasher::digest(parts, 8), expected);
    }

    #[rstest]
    fn full_digest_has_sixty_four_digits() {
        assert_eq!(NameHasher::digest(["x"], usize::MAX).len(), 64);
    }
}
