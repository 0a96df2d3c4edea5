//! # Key Rotation
//!
//! Re-encrypts a value under a new key without the plaintext ever leaving
//! memory:
//!
//! ```text
//! old ciphertext → old.decrypt → plaintext (zeroized on drop) → new.encrypt → new ciphertext
//! ```
//!
//! [`rotate`] writes nothing. It either returns a complete replacement value
//! or an error, so callers can treat `Ok` as "safe to overwrite" and leave
//! the stored value alone on `Err`. Nothing is retried: a value that the old
//! key cannot open is reported, not tried against other keys.

use zeroize::Zeroizing;

use crate::armor::ArmoredMessage;
use crate::cipher::Cipher;
use crate::error::RotationError;

/// Decrypt `cipher` with `old` and encrypt the result with `new`.
pub fn rotate<O, N>(cipher: &ArmoredMessage, old: &O, new: &N) -> Result<ArmoredMessage, RotationError>
where
    O: Cipher + ?Sized,
    N: Cipher + ?Sized,
{
    let plaintext = Zeroizing::new(old.decrypt(cipher).map_err(RotationError::Decrypt)?);
    new.encrypt(&plaintext).map_err(RotationError::Encrypt)
}
