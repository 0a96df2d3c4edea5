//! # secure-pillar
//!
//! PGP encryption of individual configuration values ("pillar" values) that
//! live inside otherwise plain YAML. A value is a complete ASCII-armored PGP
//! message; anyone holding the public key can add or replace one, and only
//! holders of the matching secret key can read it.
//!
//! ## Features
//!
//! - **Key rings**: GnuPG public and secret rings, armored or binary
//! - **Key resolution**: by long key ID, fingerprint, email or display name
//! - **Encryption**: one recipient per value, AES-256 session keys
//! - **Decryption**: picks the secret key from the message's recipient list
//! - **Rotation**: re-encrypts values to a new key, plaintext stays in memory
//! - **Key inventory**: reports which key opens a value, optionally via `gpg`
//!
//! ## Quick Start
//!
//! ```bash
//! # encrypt a value to the configured key
//! echo -n 's3cr3t' | secure-pillar --pubring ~/.gnupg/pubring.gpg encrypt -k "Salt Master"
//!
//! # decrypt it again
//! secure-pillar decrypt -f value.asc
//!
//! # move stored values to a new key, in place
//! secure-pillar rotate -k 0x0DA74B035E2A622E secrets/*.asc
//!
//! # which key opens this value?
//! secure-pillar keys -f value.asc --details
//! ```
//!
//! ## Data Flow
//!
//! **Encryption:**
//! ```text
//! plaintext → resolve key in public ring → encrypt to its encryption subkey → armor
//! ```
//!
//! **Decryption:**
//! ```text
//! armor → recipient key IDs → matching entity in secret ring → decrypt → plaintext
//! ```
//!
//! **Rotation:**
//! ```text
//! armor → decrypt (old key) → plaintext (zeroized on drop) → encrypt (new key) → armor
//! ```
//!
//! ## Module Overview
//!
//! - [`armor`] - Validated ASCII-armored `PGP MESSAGE` values
//! - [`keyring`] - Loading key rings, entities and their identities
//! - [`resolver`] - Turning a key reference into exactly one entity
//! - [`cipher`] - Encrypt/decrypt engine and recipient lookup
//! - [`rotation`] - Decrypt-then-encrypt under a new key
//! - [`pki`] - Loaded rings plus engine construction
//! - [`gpg`] - Key metadata from the system `gpg` binary
//! - [`config`] - Layered settings (file, environment, flags)
//! - [`error`] - Error types and unified error handling
//!
//! ## Configuration
//!
//! Settings come from built-in defaults, then `secure-pillar.toml` (or the
//! file given with `--config`), then `SECURE_PILLAR_*` environment
//! variables, then command-line flags:
//!
//! ```toml
//! public_key_ring = "~/.gnupg/pubring.gpg"
//! secret_key_ring = "~/.gnupg/secring.gpg"
//! pgp_key_name = "Salt Master"
//! ```
//!
//! A missing or unreadable public ring is fatal. A missing secret ring only
//! disables decryption.
//!
//! ## Security Considerations
//!
//! - Values are not signed; this protects confidentiality, not authorship
//! - Decrypted plaintext and passphrases are zeroized when dropped
//! - Rotated files are written to a temporary file and renamed over the
//!   original, so a failed rotation never leaves a half-written value
//!
//! ## Testing
//!
//! Unit tests live next to each module and use the key fixtures in
//! `tests/fixtures`:
//! ```bash
//! cargo test --lib
//! ```
//!
//! End-to-end tests drive the binary:
//! ```bash
//! cargo test --test cli_test
//! ```

pub mod armor;
pub mod cipher;
pub mod config;
pub mod error;
pub mod gpg;
pub mod keyring;
pub mod pki;
pub mod resolver;
pub mod rotation;

#[cfg(test)]
mod test_fixtures;

pub use armor::ArmoredMessage;
pub use cipher::{key_used_for, Cipher, CipherEngine, KeyIdentifier};
pub use config::Settings;
pub use error::{PillarError, Result};
pub use keyring::{Entity, KeyRing, KeyRingKind};
pub use pki::Pki;
pub use resolver::KeyReference;
pub use rotation::rotate;
