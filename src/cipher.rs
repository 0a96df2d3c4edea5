//! # Cipher Engine
//!
//! Public-key encryption and decryption of single pillar values with rPGP.
//!
//! ## Binding
//!
//! A [`CipherEngine`] binds at most one public [`Entity`] (the recipient of
//! everything it encrypts) and at most one private [`Entity`] (the key it
//! decrypts with). A missing binding is reported as
//! [`CipherError::NoPublicKey`] / [`CipherError::NoSecretKey`], never
//! skipped.
//!
//! ## Message Format
//!
//! ```text
//! -----BEGIN PGP MESSAGE-----
//! [PKESK for the recipient's encryption subkey][SEIPD v1, AES-256 [literal data]]
//! -----END PGP MESSAGE-----
//! ```
//!
//! Messages are not signed and have exactly one recipient. Decryption
//! accepts any number of recipients as long as one of them is the bound key,
//! and transparently handles compressed messages as produced by GnuPG.
//!
//! ## Error Classes
//!
//! - **Format** ([`CipherError::is_format`]): bad armor, wrong block type,
//!   unparseable packets, not an encrypted message.
//! - **Cryptographic** ([`CipherError::is_cryptographic`]): not addressed to
//!   the bound key, session key or integrity failure, unreadable body.
//!
//! Everything happens in memory. Partial output is dropped on failure.

use std::fmt;

use pgp::composed::{
    ArmorOptions, Esk, Message, MessageBuilder, SignedPublicKey, SignedPublicSubKey,
};
use pgp::crypto::sym::SymmetricKeyAlgorithm;
use pgp::errors::Error as PgpError;
use pgp::packet::{KeyFlags, PublicKey, PublicSubkey};
use pgp::types::Password;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::armor::ArmoredMessage;
use crate::error::{CipherError, FormatError, LookupError};
use crate::keyring::{format_key_id, Entity, KeyRing};

/// Key ID written into a PKESK by senders hiding the recipient.
const WILDCARD_KEY_ID: &str = "0000000000000000";

/// Encrypt/decrypt seam used by rotation.
pub trait Cipher {
    fn encrypt(&self, plaintext: &str) -> Result<ArmoredMessage, CipherError>;
    fn decrypt(&self, cipher: &ArmoredMessage) -> Result<String, CipherError>;
}

/// One public and one private key binding.
#[derive(Clone, Default)]
pub struct CipherEngine {
    public: Option<Entity>,
    private: Option<Entity>,
    passphrase: Option<Zeroizing<String>>,
}

impl CipherEngine {
    pub fn new(public: Option<Entity>, private: Option<Entity>) -> Self {
        Self {
            public,
            private,
            passphrase: None,
        }
    }

    /// Engine that can only encrypt.
    pub fn encrypt_only(public: Entity) -> Self {
        Self::new(Some(public), None)
    }

    /// Engine that can only decrypt.
    pub fn decrypt_only(private: Entity) -> Self {
        Self::new(None, Some(private))
    }

    /// Passphrase protecting the bound private key.
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(Zeroizing::new(passphrase.into()));
        self
    }

    pub fn public_entity(&self) -> Option<&Entity> {
        self.public.as_ref()
    }

    pub fn private_entity(&self) -> Option<&Entity> {
        self.private.as_ref()
    }

    /// Encrypt `plaintext` to the bound public key.
    pub fn encrypt(&self, plaintext: &str) -> Result<ArmoredMessage, CipherError> {
        let entity = self.public.as_ref().ok_or(CipherError::NoPublicKey)?;
        let recipient = select_recipient_key(entity.public_key());

        let mut rng = OsRng;
        let mut builder = MessageBuilder::from_bytes("", plaintext.as_bytes().to_vec())
            .seipd_v1(&mut rng, SymmetricKeyAlgorithm::AES256);

        match recipient {
            RecipientKey::Primary(pk) => builder.encrypt_to_key(&mut rng, pk),
            RecipientKey::Subkey(subkey) => builder.encrypt_to_key(&mut rng, subkey),
        }
        .map_err(map_encrypt_err)?;

        let armored = builder
            .to_armored_string(&mut rng, ArmorOptions::default())
            .map_err(map_encrypt_err)?;

        ArmoredMessage::parse(&armored).map_err(|err| CipherError::Encryption(err.to_string()))
    }

    /// Decrypt `cipher` with the bound private key.
    pub fn decrypt(&self, cipher: &ArmoredMessage) -> Result<String, CipherError> {
        let entity = self.private.as_ref().ok_or(CipherError::NoSecretKey)?;
        let secret = entity.secret_key().ok_or(CipherError::NoSecretKey)?;

        let message = parse_message(cipher)?;
        let recipients = recipient_key_ids(&message)?;
        if !is_addressed_to(entity, &recipients) {
            return Err(CipherError::NotAddressedToKey {
                key_id: entity.key_id(),
            });
        }

        let password = match &self.passphrase {
            Some(passphrase) => Password::from(passphrase.as_str()),
            None => Password::empty(),
        };

        let mut decrypted = message
            .decrypt(&password, secret)
            .map_err(|err| CipherError::Decryption(err.to_string()))?;
        if decrypted.is_compressed() {
            decrypted = decrypted
                .decompress()
                .map_err(|err| CipherError::BodyRead(err.to_string()))?;
        }

        let body = Zeroizing::new(
            decrypted
                .as_data_vec()
                .map_err(|err| CipherError::BodyRead(err.to_string()))?,
        );

        String::from_utf8(body.to_vec())
            .map_err(|err| CipherError::BodyRead(format!("plaintext is not UTF-8: {err}")))
    }
}

impl Cipher for CipherEngine {
    fn encrypt(&self, plaintext: &str) -> Result<ArmoredMessage, CipherError> {
        CipherEngine::encrypt(self, plaintext)
    }

    fn decrypt(&self, cipher: &ArmoredMessage) -> Result<String, CipherError> {
        CipherEngine::decrypt(self, cipher)
    }
}

impl fmt::Debug for CipherEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherEngine")
            .field("public", &self.public.as_ref().map(Entity::key_id))
            .field("private", &self.private.as_ref().map(Entity::key_id))
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// The key a message was encrypted to, as found in a secret ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyIdentifier {
    /// Recipient key ID from the message (usually an encryption subkey).
    pub key_id: String,
    pub primary_key_id: String,
    pub user_id: Option<String>,
}

impl fmt::Display for KeyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.user_id {
            Some(user_id) => write!(f, "{}: {}", self.key_id, user_id),
            None => f.write_str(&self.key_id),
        }
    }
}

/// Which key in `ring` can open `cipher`.
///
/// Only the recipient list is read; nothing is decrypted. When several
/// entities qualify the first one in load order wins, and within an entity
/// the primary key is checked before subkeys.
pub fn key_used_for(ring: &KeyRing, cipher: &ArmoredMessage) -> Result<KeyIdentifier, LookupError> {
    let recipients = recipients(cipher)?;

    ring.iter()
        .find_map(|entity| {
            entity
                .all_key_ids()
                .into_iter()
                .find(|id| recipients.contains(id))
                .map(|key_id| KeyIdentifier {
                    key_id,
                    primary_key_id: entity.key_id(),
                    user_id: entity.first_identity().map(|id| id.user_id.clone()),
                })
        })
        .ok_or(LookupError::NoMatchingKey { recipients })
}

/// Recipient key IDs of an encrypted message, in packet order.
pub fn recipients(cipher: &ArmoredMessage) -> Result<Vec<String>, FormatError> {
    let message = parse_message(cipher)?;
    recipient_key_ids(&message)
}

fn parse_message(cipher: &ArmoredMessage) -> Result<Message<'_>, FormatError> {
    Message::from_bytes(cipher.packets())
        .map_err(|err| FormatError::UnparseableMessage(err.to_string()))
}

fn recipient_key_ids(message: &Message<'_>) -> Result<Vec<String>, FormatError> {
    match message {
        Message::Encrypted { esk, .. } => Ok(esk
            .iter()
            .filter_map(|esk| match esk {
                Esk::PublicKeyEncryptedSessionKey(pkesk) => pkesk.id().ok().map(format_key_id),
                _ => None,
            })
            .collect()),
        _ => Err(FormatError::NotEncrypted),
    }
}

fn is_addressed_to(entity: &Entity, recipients: &[String]) -> bool {
    let ids = entity.all_key_ids();
    recipients
        .iter()
        .any(|recipient| recipient == WILDCARD_KEY_ID || ids.contains(recipient))
}

enum RecipientKey<'a> {
    Primary(&'a PublicKey),
    Subkey(&'a PublicSubkey),
}

fn select_recipient_key(signed_key: &SignedPublicKey) -> RecipientKey<'_> {
    signed_key
        .public_subkeys
        .iter()
        .find(|subkey| subkey_supports_encryption(subkey))
        .map(|subkey| RecipientKey::Subkey(&subkey.key))
        .unwrap_or(RecipientKey::Primary(&signed_key.primary_key))
}

fn subkey_supports_encryption(subkey: &SignedPublicSubKey) -> bool {
    subkey
        .signatures
        .iter()
        .any(|sig| key_flags_allow_encryption(&sig.key_flags()))
}

fn key_flags_allow_encryption(flags: &KeyFlags) -> bool {
    flags.encrypt_comms() || flags.encrypt_storage()
}

fn map_encrypt_err(err: PgpError) -> CipherError {
    CipherError::Encryption(err.to_string())
}
