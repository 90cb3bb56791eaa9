//! ArtifactId: a 128-bit BLAKE3 digest (32 hex chars) addressing one group or sidecar.
//!
//! Ids are derived from the submitted payload plus the wall clock in
//! nanoseconds plus a process-wide sequence number, so the same bytes
//! uploaded twice in the same instant still get two different addresses.
//! Nothing here is a security boundary; it only has to not collide.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Length of an id in hex characters.
pub const ID_LEN: usize = 32;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Opaque, fixed-length, URL- and filesystem-safe identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactId(String);

/// Errors that can occur when parsing an id.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("invalid id length: expected 32 hex chars, got {0}")]
    InvalidLength(usize),

    #[error("invalid hex character in id")]
    InvalidHex,
}

impl ArtifactId {
    /// Derive a fresh id for `seed`.
    pub fn generate(seed: &[u8]) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);

        let mut hasher = blake3::Hasher::new();
        hasher.update(seed);
        hasher.update(&nanos.to_le_bytes());
        hasher.update(&sequence.to_le_bytes());
        let digest = hasher.finalize();

        Self(hex::encode(&digest.as_bytes()[..ID_LEN / 2]))
    }

    /// Create from an existing id string (validates format).
    pub fn from_str_checked(s: &str) -> Result<Self, IdError> {
        if s.len() != ID_LEN {
            return Err(IdError::InvalidLength(s.len()));
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IdError::InvalidHex);
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// First 2 characters (directory shard).
    pub fn prefix(&self) -> &str {
        &self.0[0..2]
    }

    /// Remainder after the prefix (file stem).
    pub fn remainder(&self) -> &str {
        &self.0[2..]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ArtifactId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_checked(s)
    }
}

impl TryFrom<String> for ArtifactId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str_checked(&value)
    }
}

impl From<ArtifactId> for String {
    fn from(id: ArtifactId) -> Self {
        id.0
    }
}

impl AsRef<str> for ArtifactId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};
    use std::thread;

    #[test]
    fn test_generate_produces_32_hex_chars() {
        let id = ArtifactId::generate(b"Hello, World!");
        assert_eq!(id.as_str().len(), ID_LEN);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id.as_str(), id.as_str().to_ascii_lowercase());
    }

    #[test]
    fn test_same_payload_back_to_back_differs() {
        let a = ArtifactId::generate(b"identical");
        let b = ArtifactId::generate(b"identical");
        assert_ne!(a, b);
    }

    #[test]
    fn test_concurrent_identical_payloads_never_collide() {
        let seen = Arc::new(Mutex::new(HashSet::new()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let seen = seen.clone();
                thread::spawn(move || {
                    for _ in 0..125 {
                        let id = ArtifactId::generate(b"same release, same bytes");
                        seen.lock().unwrap().insert(id);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(seen.lock().unwrap().len(), 1000);
    }

    #[test]
    fn test_prefix_and_remainder() {
        let id = ArtifactId::generate(b"test");
        assert_eq!(id.prefix().len(), 2);
        assert_eq!(id.remainder().len(), 30);
        assert_eq!(format!("{}{}", id.prefix(), id.remainder()), id.as_str());
    }

    #[test]
    fn test_from_str_valid_normalizes_case() {
        let id: ArtifactId = "ABCDEF01234567890123456789abcdef".parse().unwrap();
        assert_eq!(id.as_str(), "abcdef01234567890123456789abcdef");
    }

    #[test]
    fn test_from_str_invalid_length() {
        let result: Result<ArtifactId, _> = "short".parse();
        assert_eq!(result, Err(IdError::InvalidLength(5)));
    }

    #[test]
    fn test_from_str_rejects_path_tricks() {
        let result: Result<ArtifactId, _> = "../../../../etc/passwd0000000000".parse();
        assert_eq!(result, Err(IdError::InvalidHex));
    }

    #[test]
    fn test_serde_rejects_malformed() {
        let good = ArtifactId::generate(b"serde");
        let json = serde_json::to_string(&good).unwrap();
        let restored: ArtifactId = serde_json::from_str(&json).unwrap();
        assert_eq!(good, restored);

        assert!(serde_json::from_str::<ArtifactId>("\"nope\"").is_err());
    }
}
