//! SQL text canonicalization and fingerprinting

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hex-encoded SHA-256 digest of canonicalized SQL text
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 characters, for terminal output
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(12) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Fingerprint {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Remove every whitespace character from the statement.
///
/// Letter case and comments are left untouched, so statements that differ
/// only by keyword casing or comment text do not share a canonical form.
pub fn canonicalize(sql: &str) -> String {
    sql.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Fingerprint a SQL statement
pub fn fingerprint(sql: &str) -> Fingerprint {
    let digest = Sha256::digest(canonicalize(sql).as_bytes());
    Fingerprint(hex::encode(digest))
}
