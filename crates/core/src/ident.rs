//! Case identifiers and sharded-path utilities.
//!
//! CCR stores case records under sharded directories derived from the case
//! id. To keep path derivation deterministic and consistent across the
//! codebase, identifiers use a *canonical* representation: **32 lowercase
//! hexadecimal characters** (no hyphens), the same value produced by
//! `Uuid::new_v4().simple().to_string()`.
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Non-canonical values (uppercase, hyphenated, wrong length, non-hex) are
//! rejected. Externally supplied identifiers (API paths, CLI arguments,
//! ingest requests) must be validated with [`CaseId::parse`].
//!
//! ## Sharded directory layout
//! For a canonical id `u`, case data lives under
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`, which prevents very large fan-out
//! in a single directory as the case library grows.

use crate::error::{CaseError, CaseResult};
use std::path::{Path, PathBuf};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// A clinical case identifier in canonical form (32 lowercase hex characters).
///
/// Once constructed, the contained identifier is guaranteed canonical, so
/// storage paths derived from it are stable. Identifiers serialize as the
/// canonical string and deserialization re-validates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaseId(Uuid);

impl CaseId {
    /// Generates a fresh case identifier.
    ///
    /// Used when the ingest boundary is asked to allocate an id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses an identifier that must already be canonical.
    ///
    /// Other common UUID forms (hyphenated, uppercase) are **not**
    /// normalised; callers must provide the canonical representation.
    ///
    /// # Arguments
    ///
    /// * `input` - Identifier string; must be exactly 32 lowercase hex characters.
    ///
    /// # Errors
    ///
    /// Returns [`CaseError::Validation`] if `input` is not canonical.
    pub fn parse(input: &str) -> CaseResult<Self> {
        if !Self::is_canonical(input) {
            return Err(CaseError::Validation(format!(
                "case id must be 32 lowercase hex characters without hyphens, got: '{}'",
                input
            )));
        }
        let uuid = Uuid::parse_str(input).map_err(|_| {
            CaseError::Validation(format!("case id is not a valid identifier: '{}'", input))
        })?;
        Ok(Self(uuid))
    }

    /// Returns true if `input` is in canonical form.
    ///
    /// Purely syntactic: exactly 32 bytes, lowercase hex only.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns `parent_dir/<s1>/<s2>/<id>/` where `s1`/`s2` are the first
    /// two and next two hex characters of this identifier.
    pub fn sharded_dir(&self, parent_dir: &Path) -> PathBuf {
        let canonical = self.0.simple().to_string();
        let s1 = &canonical[0..2];
        let s2 = &canonical[2..4];
        parent_dir.join(s1).join(s2).join(&canonical)
    }
}

impl Default for CaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for CaseId {
    type Err = CaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaseId::parse(s)
    }
}

impl serde::Serialize for CaseId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for CaseId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        CaseId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_canonical_id() {
        let id = CaseId::new();
        let canonical = id.to_string();

        assert_eq!(canonical.len(), 32);
        assert!(CaseId::is_canonical(&canonical));
    }

    #[test]
    fn parse_accepts_canonical_id() {
        let canonical = "550e8400e29b41d4a716446655440000";
        let id = CaseId::parse(canonical).expect("Should parse canonical id");

        assert_eq!(id.to_string(), canonical);
    }

    #[test]
    fn parse_rejects_hyphenated_id() {
        let result = CaseId::parse("550e8400-e29b-41d4-a716-446655440000");

        match result {
            Err(CaseError::Validation(msg)) => {
                assert!(msg.contains("32 lowercase hex characters"));
            }
            _ => panic!("Expected Validation error"),
        }
    }

    #[test]
    fn parse_rejects_uppercase_id() {
        assert!(CaseId::parse("550E8400E29B41D4A716446655440000").is_err());
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(CaseId::parse("550e8400e29b41d4a71644665544000").is_err());
        assert!(CaseId::parse("550e8400e29b41d4a7164466554400000").is_err());
    }

    #[test]
    fn parse_rejects_invalid_characters() {
        assert!(CaseId::parse("550e8400e29b41d4a716446655440zzz").is_err());
        assert!(CaseId::parse("").is_err());
    }

    #[test]
    fn sharded_dir_structure() {
        let id = CaseId::parse("550e8400e29b41d4a716446655440000").unwrap();
        let sharded = id.sharded_dir(Path::new("/case_data"));

        assert_eq!(
            sharded,
            PathBuf::from("/case_data/55/0e/550e8400e29b41d4a716446655440000")
        );
    }

    #[test]
    fn sharded_dir_differs_per_id() {
        let id1 = CaseId::parse("00112233445566778899aabbccddeeff").unwrap();
        let id2 = CaseId::parse("aabbccddeeff00112233445566778899").unwrap();
        let parent = Path::new("/data");

        assert_eq!(
            id1.sharded_dir(parent),
            PathBuf::from("/data/00/11/00112233445566778899aabbccddeeff")
        );
        assert_eq!(
            id2.sharded_dir(parent),
            PathBuf::from("/data/aa/bb/aabbccddeeff00112233445566778899")
        );
    }

    #[test]
    fn serde_round_trip() {
        let id = CaseId::new();
        let json = serde_json::to_string(&id).expect("Should serialize id");
        let back: CaseId = serde_json::from_str(&json).expect("Should deserialize id");

        assert_eq!(id, back);
    }

    #[test]
    fn deserialization_rejects_non_canonical() {
        let result: Result<CaseId, _> =
            serde_json::from_str("\"550e8400-e29b-41d4-a716-446655440000\"");
        assert!(result.is_err());
    }

    #[test]
    fn from_str_matches_parse() {
        let canonical = "550e8400e29b41d4a716446655440000";
        let id: CaseId = canonical.parse().expect("Should parse via FromStr");
        assert_eq!(id.to_string(), canonical);
    }
}
