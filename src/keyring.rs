//! # Key Rings
//!
//! Loads OpenPGP key material from disk into immutable [`KeyRing`]s.
//!
//! ## Sources
//!
//! - **Public ring**: `gpg --export > pubring.gpg` (binary) or
//!   `gpg --armor --export > pubring.asc` (armored). Required.
//! - **Secret ring**: `gpg --export-secret-keys` in either encoding.
//!   Optional; without it only encryption is possible.
//!
//! GnuPG 2.1+ keeps its own keys in `pubring.kbx` (keybox), which is not an
//! OpenPGP key ring. Export the keys first.
//!
//! ## Paths
//!
//! A leading `~` is replaced with the current user's home directory. The
//! file is read in full and closed before parsing starts.
//!
//! ## Failures
//!
//! Each failure is reported distinctly by [`KeyRingError`]. The same error
//! is fatal for a public ring and soft for a secret ring, see
//! [`KeyRingError::is_soft`].

use std::fmt;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use pgp::composed::{Deserializable, SignedPublicKey, SignedSecretKey};
use pgp::types::{KeyDetails, KeyId};

use crate::error::KeyRingError;

/// Which half of a key pair a ring holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyRingKind {
    Public,
    Secret,
}

impl fmt::Display for KeyRingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => f.write_str("public"),
            Self::Secret => f.write_str("secret"),
        }
    }
}

/// One user ID packet, split the way `Name (Comment) <email>` reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub name: String,
    pub comment: String,
    pub email: String,
}

impl Identity {
    /// Split a raw user ID. Malformed input never fails; the parts that
    /// cannot be recognised are left empty.
    pub fn parse(user_id: &str) -> Self {
        let mut rest = user_id.trim();
        let mut email = String::new();
        let mut comment = String::new();

        if let (Some(open), true) = (rest.rfind('<'), rest.ends_with('>')) {
            email = rest[open + 1..rest.len() - 1].trim().to_string();
            rest = rest[..open].trim_end();
        }

        if let (Some(open), true) = (rest.find('('), rest.ends_with(')')) {
            comment = rest[open + 1..rest.len() - 1].trim().to_string();
            rest = rest[..open].trim_end();
        }

        Self {
            user_id: user_id.to_string(),
            name: rest.to_string(),
            comment,
            email,
        }
    }

    /// Exact match against any of the user-facing parts.
    pub fn matches(&self, reference: &str) -> bool {
        self.user_id == reference
            || (!self.email.is_empty() && self.email == reference)
            || (!self.name.is_empty() && self.name == reference)
    }
}

/// A primary key with its subkeys, user IDs and, for secret rings, the
/// private key material.
#[derive(Debug, Clone)]
pub struct Entity {
    public: SignedPublicKey,
    secret: Option<SignedSecretKey>,
    identities: Vec<Identity>,
}

impl Entity {
    pub fn from_public(public: SignedPublicKey) -> Self {
        let identities = public
            .details
            .users
            .iter()
            .map(|user| Identity::parse(&user_id_string(user.id.id())))
            .collect();

        Self {
            public,
            secret: None,
            identities,
        }
    }

    pub fn from_secret(secret: SignedSecretKey) -> Self {
        let mut entity = Self::from_public(SignedPublicKey::from(secret.clone()));
        entity.secret = Some(secret);
        entity
    }

    pub fn public_key(&self) -> &SignedPublicKey {
        &self.public
    }

    pub fn secret_key(&self) -> Option<&SignedSecretKey> {
        self.secret.as_ref()
    }

    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    pub fn first_identity(&self) -> Option<&Identity> {
        self.identities.first()
    }

    /// Long key ID of the primary key, e.g. `3E6A61D08B3C9949`.
    pub fn key_id(&self) -> String {
        format_key_id(&self.public.primary_key.key_id())
    }

    /// Long key ID of the private primary key, if this entity has one.
    pub fn private_key_id(&self) -> Option<String> {
        self.secret
            .as_ref()
            .map(|secret| format_key_id(&secret.primary_key.key_id()))
    }

    pub fn subkey_ids(&self) -> Vec<String> {
        self.public
            .public_subkeys
            .iter()
            .map(|subkey| format_key_id(&subkey.key.key_id()))
            .collect()
    }

    /// Primary key ID followed by every subkey ID, in packet order.
    pub fn all_key_ids(&self) -> Vec<String> {
        let mut ids = vec![self.key_id()];
        ids.extend(self.subkey_ids());
        ids
    }

    pub fn fingerprint(&self) -> String {
        hex::encode_upper(self.public.primary_key.fingerprint().as_bytes())
    }

    /// `KEYID: first user id`, or the bare key ID for anonymous keys.
    pub fn describe(&self) -> String {
        match self.first_identity() {
            Some(identity) => format!("{}: {}", self.key_id(), identity.user_id),
            None => self.key_id(),
        }
    }
}

/// An ordered, immutable collection of entities loaded from one file.
#[derive(Debug, Clone)]
pub struct KeyRing {
    kind: KeyRingKind,
    path: PathBuf,
    entities: Vec<Entity>,
}

impl KeyRing {
    /// Expand, read and parse the key ring at `path`.
    pub fn load(path: impl AsRef<Path>, kind: KeyRingKind) -> Result<Self, KeyRingError> {
        let path = expand_tilde(path.as_ref())?;
        let bytes = fs::read(&path).map_err(|source| KeyRingError::Open {
            kind,
            path: path.clone(),
            source,
        })?;

        Self::from_bytes(&bytes, kind, path)
    }

    /// Parse key ring data already in memory. `origin` is only used in
    /// error messages.
    pub fn from_bytes(
        bytes: &[u8],
        kind: KeyRingKind,
        origin: impl Into<PathBuf>,
    ) -> Result<Self, KeyRingError> {
        let path = origin.into();
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(KeyRingError::Empty { kind, path });
        }

        let parsed = match kind {
            KeyRingKind::Public => {
                parse_many::<SignedPublicKey>(bytes).map(|keys| {
                    keys.into_iter().map(Entity::from_public).collect::<Vec<_>>()
                })
            }
            KeyRingKind::Secret => {
                parse_many::<SignedSecretKey>(bytes).map(|keys| {
                    keys.into_iter().map(Entity::from_secret).collect::<Vec<_>>()
                })
            }
        };

        let entities = parsed.map_err(|err| KeyRingError::Parse {
            kind,
            path: path.clone(),
            reason: err.to_string(),
        })?;

        if entities.is_empty() {
            return Err(KeyRingError::Empty { kind, path });
        }

        Ok(Self {
            kind,
            path,
            entities,
        })
    }

    pub fn kind(&self) -> KeyRingKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// First entity, in load order, owning `key_id` as primary or subkey.
    pub fn find_by_key_id(&self, key_id: &str) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|entity| entity.all_key_ids().iter().any(|id| id == key_id))
    }
}

impl<'a> IntoIterator for &'a KeyRing {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

/// Replace a leading `~` with the home directory; other paths pass through.
pub fn expand_tilde(path: &Path) -> Result<PathBuf, KeyRingError> {
    let Some(raw) = path.to_str() else {
        return Ok(path.to_path_buf());
    };
    let Some(rest) = raw.strip_prefix('~') else {
        return Ok(path.to_path_buf());
    };

    let home =
        dirs::home_dir().ok_or_else(|| KeyRingError::HomeDirUnavailable(raw.to_string()))?;
    let rest = rest.trim_start_matches(['/', '\\']);
    if rest.is_empty() {
        Ok(home)
    } else {
        Ok(home.join(rest))
    }
}

/// Upper-case hex form of a long key ID.
pub fn format_key_id(key_id: &KeyId) -> String {
    hex::encode_upper(key_id)
}

fn parse_many<T: Deserializable>(bytes: &[u8]) -> pgp::errors::Result<Vec<T>> {
    let (keys, _headers) = T::from_reader_many(Cursor::new(bytes))?;
    keys.collect()
}

fn user_id_string<B: AsRef<[u8]> + ?Sized>(raw: &B) -> String {
    String::from_utf8_lossy(raw.as_ref()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_armored_public_ring() {
        let ring = KeyRing::load(fixture("pubring.asc"), KeyRingKind::Public).unwrap();

        assert_eq!(ring.kind(), KeyRingKind::Public);
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.entities()[0].key_id(), ALICE_KEY_ID);
        assert_eq!(ring.entities()[1].key_id(), BOB_KEY_ID);
        assert!(ring.iter().all(|entity| !entity.has_secret()));
    }

    #[test]
    fn test_load_binary_public_ring() {
        let ring = KeyRing::load(fixture("pubring.gpg"), KeyRingKind::Public).unwrap();

        let ids: Vec<String> = ring.iter().map(Entity::key_id).collect();
        assert_eq!(ids, vec![ALICE_KEY_ID, BOB_KEY_ID]);
    }

    #[test]
    fn test_load_secret_ring() {
        let ring = KeyRing::load(fixture("secring.asc"), KeyRingKind::Secret).unwrap();

        assert_eq!(ring.len(), 2);
        let alice = &ring.entities()[0];
        assert!(alice.has_secret());
        assert_eq!(alice.private_key_id().as_deref(), Some(ALICE_KEY_ID));
    }

    #[test]
    fn test_entity_details() {
        let ring = KeyRing::load(fixture("pubring.asc"), KeyRingKind::Public).unwrap();
        let alice = &ring.entities()[0];

        assert_eq!(alice.fingerprint(), ALICE_FINGERPRINT);
        assert_eq!(alice.subkey_ids(), vec![ALICE_SUBKEY_ID.to_string()]);
        assert_eq!(alice.private_key_id(), None);

        let identity = alice.first_identity().unwrap();
        assert_eq!(identity.user_id, "Alice Example <alice@example.com>");
        assert_eq!(identity.name, "Alice Example");
        assert_eq!(identity.email, "alice@example.com");
        assert_eq!(
            alice.describe(),
            format!("{ALICE_KEY_ID}: Alice Example <alice@example.com>")
        );
    }

    #[test]
    fn test_find_by_key_id_matches_subkeys() {
        let ring = KeyRing::load(fixture("pubring.asc"), KeyRingKind::Public).unwrap();

        assert_eq!(
            ring.find_by_key_id(BOB_SUBKEY_ID).map(Entity::key_id),
            Some(BOB_KEY_ID.to_string())
        );
        assert!(ring.find_by_key_id(CAROL_KEY_ID).is_none());
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let err = KeyRing::load("/nonexistent/pubring.gpg", KeyRingKind::Public).unwrap_err();
        assert!(matches!(err, KeyRingError::Open { .. }));
        assert!(!err.is_soft());
    }

    #[test]
    fn test_missing_secret_ring_is_soft() {
        let err = KeyRing::load("/nonexistent/secring.gpg", KeyRingKind::Secret).unwrap_err();
        assert!(matches!(err, KeyRingError::Open { .. }));
        assert!(err.is_soft());
    }

    #[test]
    fn test_empty_file_is_empty_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pubring.gpg");
        fs::write(&path, b"\n").unwrap();

        let err = KeyRing::load(&path, KeyRingKind::Public).unwrap_err();
        assert!(matches!(err, KeyRingError::Empty { .. }));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pubring.gpg");
        fs::write(&path, b"this is not a key ring").unwrap();

        let err = KeyRing::load(&path, KeyRingKind::Public).unwrap_err();
        assert!(matches!(err, KeyRingError::Parse { .. }));
    }

    #[test]
    fn test_public_keys_are_not_a_secret_ring() {
        let err = KeyRing::load(fixture("pubring.asc"), KeyRingKind::Secret);
        assert!(err.is_err());
    }

    #[test]
    fn test_expand_tilde() {
        let home = dirs::home_dir().unwrap();

        assert_eq!(expand_tilde(Path::new("~")).unwrap(), home);
        assert_eq!(
            expand_tilde(Path::new("~/.gnupg/pubring.gpg")).unwrap(),
            home.join(".gnupg/pubring.gpg")
        );
        assert_eq!(
            expand_tilde(Path::new("/etc/pubring.gpg")).unwrap(),
            PathBuf::from("/etc/pubring.gpg")
        );
        assert_eq!(
            expand_tilde(Path::new("keys/pubring.gpg")).unwrap(),
            PathBuf::from("keys/pubring.gpg")
        );
    }

    #[test]
    fn test_identity_parse() {
        let full = Identity::parse("Salt Master (prod) <salt@example.com>");
        assert_eq!(full.name, "Salt Master");
        assert_eq!(full.comment, "prod");
        assert_eq!(full.email, "salt@example.com");

        let bare = Identity::parse("Bob Example");
        assert_eq!(bare.name, "Bob Example");
        assert_eq!(bare.email, "");

        let email_only = Identity::parse("<ops@example.com>");
        assert_eq!(email_only.name, "");
        assert_eq!(email_only.email, "ops@example.com");
    }

    #[test]
    fn test_identity_matches_exactly() {
        let identity = Identity::parse("Alice Example <alice@example.com>");

        assert!(identity.matches("Alice Example <alice@example.com>"));
        assert!(identity.matches("alice@example.com"));
        assert!(identity.matches("Alice Example"));
        assert!(!identity.matches("alice example"));
        assert!(!identity.matches("Alice"));
        assert!(!identity.matches(""));
    }
}
