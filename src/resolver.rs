//! # Key Resolution
//!
//! Turns what an operator typed (`--key alice@example.com`,
//! `--key 0x3E6A61D08B3C9949`) into exactly one [`Entity`].
//!
//! The ring is scanned in load order and the first entity that matches
//! wins. For each entity the key IDs are checked first (primary, private,
//! subkeys), then its user IDs in stored order. User IDs compare exactly:
//! there is no case folding and no prefix matching, and a reference that
//! matches nothing is an error rather than a fallback to some other key.
//!
//! Hex-shaped input is ambiguous: `DEADBEEFCAFEF00D` is a valid key ID and
//! also a valid display name. [`KeyRing::resolve`] tries it as an ID first
//! (hex case ignored) and, when no key carries that ID, as a verbatim user
//! ID. The typed [`resolve`] does no such retry.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::error::ResolveError;
use crate::keyring::{Entity, KeyRing};

/// A user-supplied key reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyReference {
    /// 64-bit long key ID, upper-case hex.
    KeyId(String),
    /// Full v4 fingerprint, upper-case hex.
    Fingerprint(String),
    /// User ID string, display name or email address.
    UserId(String),
}

const KEY_ID_HEX_LEN: usize = 16;
const FINGERPRINT_HEX_LEN: usize = 40;

impl KeyReference {
    /// Classify `input`. Hex of key-ID or fingerprint length (optionally
    /// `0x`-prefixed) is an identifier; everything else is a user ID and is
    /// kept verbatim.
    pub fn parse(input: &str) -> Self {
        let hex = input
            .strip_prefix("0x")
            .or_else(|| input.strip_prefix("0X"))
            .unwrap_or(input);

        if hex.chars().all(|c| c.is_ascii_hexdigit()) {
            match hex.len() {
                KEY_ID_HEX_LEN => return Self::KeyId(hex.to_ascii_uppercase()),
                FINGERPRINT_HEX_LEN => return Self::Fingerprint(hex.to_ascii_uppercase()),
                _ => {}
            }
        }

        Self::UserId(input.to_string())
    }

    /// Whether `entity` is the key this reference names.
    pub fn matches(&self, entity: &Entity) -> bool {
        match self {
            Self::KeyId(id) => {
                entity.key_id() == *id
                    || entity.private_key_id().as_deref() == Some(id.as_str())
                    || entity.subkey_ids().iter().any(|subkey| subkey == id)
            }
            Self::Fingerprint(fingerprint) => entity.fingerprint() == *fingerprint,
            Self::UserId(user_id) => entity
                .identities()
                .iter()
                .any(|identity| identity.matches(user_id)),
        }
    }
}

impl fmt::Display for KeyReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyId(id) | Self::Fingerprint(id) => write!(f, "0x{id}"),
            Self::UserId(user_id) => f.write_str(user_id),
        }
    }
}

impl FromStr for KeyReference {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for KeyReference {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

/// First entity in `ring` matching `reference`.
pub fn resolve<'r>(ring: &'r KeyRing, reference: &KeyReference) -> Result<&'r Entity, ResolveError> {
    ring.iter()
        .find(|entity| reference.matches(entity))
        .ok_or_else(|| ResolveError::NotFound {
            reference: reference.to_string(),
            ring: ring.kind(),
        })
}

impl KeyRing {
    /// Parse `reference` and [`resolve`] it against this ring.
    ///
    /// A key ID or fingerprint that names no key is retried as a user ID;
    /// the error still reports the identifier.
    pub fn resolve(&self, reference: &str) -> Result<&Entity, ResolveError> {
        let parsed = KeyReference::parse(reference);
        match resolve(self, &parsed) {
            Err(err) if !matches!(parsed, KeyReference::UserId(_)) => {
                resolve(self, &KeyReference::UserId(reference.to_string())).map_err(|_| err)
            }
            found => found,
        }
    }
}
