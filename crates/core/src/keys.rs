//! Rule keys: the digests that address artifacts in a cache

use crate::constants::MAX_RULE_KEY_LEN;
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// A validated, lowercase hexadecimal digest identifying one build artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RuleKey(String);

impl RuleKey {
    /// Validate and wrap a hex digest. Uppercase input is normalised.
    pub fn new(key: impl AsRef<str>) -> Result<Self> {
        let key = key.as_ref().trim();

        if key.is_empty() {
            return Err(Error::invalid_key(key, "key cannot be empty"));
        }
        if key.len() > MAX_RULE_KEY_LEN {
            return Err(Error::invalid_key(
                format!("{}...", key.chars().take(16).collect::<String>()),
                format!("key exceeds maximum length of {MAX_RULE_KEY_LEN} characters"),
            ));
        }
        if !key.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::invalid_key(key, "key must be a hexadecimal digest"));
        }

        Ok(Self(key.to_ascii_lowercase()))
    }

    /// Derive a key from content with SHA-256
    #[must_use]
    pub fn digest(content: impl AsRef<[u8]>) -> Self {
        Self(hex::encode(Sha256::digest(content.as_ref())))
    }

    /// Two-character prefix used to fan entries out over subdirectories
    #[must_use]
    pub fn shard(&self) -> &str {
        let end = self.0.len().min(2);
        &self.0[..end]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RuleKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for RuleKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<RuleKey> for String {
    fn from(key: RuleKey) -> Self {
        key.0
    }
}

impl AsRef<str> for RuleKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rule_key_validation() {
        assert!(RuleKey::new("deadbeef").is_ok());
        assert_eq!(RuleKey::new("DEADBEEF").unwrap().as_str(), "deadbeef");

        assert!(RuleKey::new("").is_err());
        assert!(RuleKey::new("not-hex").is_err());
        assert!(RuleKey::new("ab/../cd").is_err());
        assert!(RuleKey::new("a".repeat(MAX_RULE_KEY_LEN + 1)).is_err());
    }

    #[test]
    fn test_digest_is_sha256_hex() {
        let key = RuleKey::digest(b"hello");
        assert_eq!(
            key.as_str(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(key.shard(), "2c");
    }

    #[test]
    fn test_short_key_shard() {
        assert_eq!(RuleKey::new("a").unwrap().shard(), "a");
    }

    #[test]
    fn test_serde_rejects_invalid_keys() {
        let parsed: std::result::Result<RuleKey, _> = serde_json::from_str("\"zz\"");
        assert!(parsed.is_err());

        let parsed: RuleKey = serde_json::from_str("\"ABCD\"").unwrap();
        assert_eq!(parsed.as_str(), "abcd");
    }

    proptest! {
        #[test]
        fn prop_digest_keys_are_valid(content in proptest::collection::vec(any::<u8>(), 0..256)) {
            let key = RuleKey::digest(&content);
            prop_assert_eq!(RuleKey::new(key.as_str()).unwrap(), key);
        }
    }
}
