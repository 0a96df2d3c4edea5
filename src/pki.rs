//! # Key Infrastructure
//!
//! [`Pki`] owns the loaded key rings and hands out [`CipherEngine`]s bound to
//! the right keys.
//!
//! - The public ring is required. Failing to load it, or failing to find the
//!   configured key in it, is fatal.
//! - The secret ring is optional. If it cannot be opened or parsed the
//!   failure is kept and [`Pki::secret_ring_error`] reports it; encryption
//!   keeps working and decryption fails with [`LookupError::NoSecretRing`].
//!
//! Both rings are read once, when the `Pki` is built.

use zeroize::Zeroizing;

use crate::armor::ArmoredMessage;
use crate::cipher::{key_used_for, CipherEngine, KeyIdentifier};
use crate::config::Settings;
use crate::error::{KeyRingError, LookupError, PillarError, Result};
use crate::keyring::{Entity, KeyRing, KeyRingKind};
use crate::rotation;

pub struct Pki {
    public_ring: KeyRing,
    secret_ring: Option<KeyRing>,
    secret_ring_error: Option<KeyRingError>,
    default_key: Option<Entity>,
    passphrase: Option<Zeroizing<String>>,
}

impl Pki {
    /// Load both rings named by `settings` and resolve `pgp_key_name`.
    pub fn new(settings: &Settings) -> Result<Self> {
        let public_ring = KeyRing::load(&settings.public_key_ring, KeyRingKind::Public)?;

        let (secret_ring, secret_ring_error) =
            match KeyRing::load(&settings.secret_key_ring, KeyRingKind::Secret) {
                Ok(ring) => (Some(ring), None),
                Err(err) if err.is_soft() => (None, Some(err)),
                Err(err) => return Err(err.into()),
            };

        Self::from_rings(
            public_ring,
            secret_ring,
            settings.pgp_key_name.as_deref(),
            settings.passphrase.clone(),
        )
        .map(|mut pki| {
            pki.secret_ring_error = secret_ring_error;
            pki
        })
    }

    /// Build from rings already in memory.
    pub fn from_rings(
        public_ring: KeyRing,
        secret_ring: Option<KeyRing>,
        key_name: Option<&str>,
        passphrase: Option<String>,
    ) -> Result<Self> {
        let default_key = match key_name {
            Some(name) => Some(public_ring.resolve(name)?.clone()),
            None => None,
        };

        Ok(Self {
            public_ring,
            secret_ring,
            secret_ring_error: None,
            default_key,
            passphrase: passphrase.map(Zeroizing::new),
        })
    }

    pub fn public_ring(&self) -> &KeyRing {
        &self.public_ring
    }

    pub fn secret_ring(&self) -> Option<&KeyRing> {
        self.secret_ring.as_ref()
    }

    /// Why the secret ring is absent, if it failed to load.
    pub fn secret_ring_error(&self) -> Option<&KeyRingError> {
        self.secret_ring_error.as_ref()
    }

    /// The entity `pgp_key_name` resolved to.
    pub fn default_key(&self) -> Option<&Entity> {
        self.default_key.as_ref()
    }

    /// Engine bound to the configured key. The matching secret key is bound
    /// too when the secret ring has it.
    pub fn encryption_engine(&self) -> Result<CipherEngine> {
        let public = self.default_key.clone().ok_or(PillarError::MissingKeyName)?;
        Ok(self.bind(public))
    }

    /// Engine bound to whatever `reference` resolves to in the public ring.
    pub fn engine_for(&self, reference: &str) -> Result<CipherEngine> {
        let public = self.public_ring.resolve(reference)?.clone();
        Ok(self.bind(public))
    }

    /// Decrypt-only engine bound to the secret key `cipher` was encrypted to.
    pub fn decryption_engine_for(&self, cipher: &ArmoredMessage) -> Result<CipherEngine> {
        let ring = self.secret_ring.as_ref().ok_or(LookupError::NoSecretRing)?;
        let used = key_used_for(ring, cipher)?;
        let private = ring
            .find_by_key_id(&used.primary_key_id)
            .cloned()
            .ok_or(LookupError::NoMatchingKey {
                recipients: vec![used.key_id],
            })?;

        Ok(self.with_passphrase(CipherEngine::decrypt_only(private)))
    }

    /// Which secret key can open `cipher`.
    pub fn key_used_for(&self, cipher: &ArmoredMessage) -> Result<KeyIdentifier> {
        let ring = self.secret_ring.as_ref().ok_or(LookupError::NoSecretRing)?;
        Ok(key_used_for(ring, cipher)?)
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<ArmoredMessage> {
        Ok(self.encryption_engine()?.encrypt(plaintext)?)
    }

    pub fn decrypt(&self, cipher: &ArmoredMessage) -> Result<String> {
        Ok(self.decryption_engine_for(cipher)?.decrypt(cipher)?)
    }

    /// Re-encrypt `cipher` to the key `new_reference` names, using whichever
    /// secret key can open it now.
    pub fn rotate(&self, cipher: &ArmoredMessage, new_reference: &str) -> Result<ArmoredMessage> {
        let new = self.engine_for(new_reference)?;
        let old = self.decryption_engine_for(cipher)?;
        Ok(rotation::rotate(cipher, &old, &new)?)
    }

    fn bind(&self, public: Entity) -> CipherEngine {
        let private = self
            .secret_ring
            .as_ref()
            .and_then(|ring| ring.find_by_key_id(&public.key_id()))
            .cloned();

        self.with_passphrase(CipherEngine::new(Some(public), private))
    }

    fn with_passphrase(&self, engine: CipherEngine) -> CipherEngine {
        match &self.passphrase {
            Some(passphrase) => engine.with_passphrase(passphrase.as_str()),
            None => engine,
        }
    }
}
