use std::path::PathBuf;

use thiserror::Error;

use crate::keyring::KeyRingKind;

/// Failure to load a key ring from disk.
#[derive(Error, Debug)]
pub enum KeyRingError {
    #[error("cannot expand '{0}': no home directory for the current user")]
    HomeDirUnavailable(String),

    #[error("cannot open {kind} key ring {path}: {source}")]
    Open {
        kind: KeyRingKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {kind} key ring {path}: {reason}")]
    Parse {
        kind: KeyRingKind,
        path: PathBuf,
        reason: String,
    },

    #[error("{kind} key ring {path} is empty")]
    Empty { kind: KeyRingKind, path: PathBuf },
}

impl KeyRingError {
    /// Whether the caller may continue in a degraded mode after this failure.
    ///
    /// Only open/parse/empty failures of the secret ring are soft; without a
    /// public ring nothing can be done.
    pub fn is_soft(&self) -> bool {
        match self {
            Self::HomeDirUnavailable(_) => false,
            Self::Open { kind, .. } | Self::Parse { kind, .. } | Self::Empty { kind, .. } => {
                *kind == KeyRingKind::Secret
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("unable to find key '{reference}' in the {ring} key ring")]
    NotFound { reference: String, ring: KeyRingKind },
}

/// The input is not a well-formed encrypted PGP message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("malformed PGP armor: {0}")]
    MalformedArmor(String),

    #[error("block type is not PGP MESSAGE: {0}")]
    WrongBlockType(String),

    #[error("message is not encrypted")]
    NotEncrypted,

    #[error("unable to read PGP message: {0}")]
    UnparseableMessage(String),
}

#[derive(Error, Debug)]
pub enum CipherError {
    #[error("no public key bound for encryption")]
    NoPublicKey,

    #[error("no secret key bound for decryption")]
    NoSecretKey,

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("message is not encrypted to key {key_id}")]
    NotAddressedToKey { key_id: String },

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("unable to read message body: {0}")]
    BodyRead(String),

    #[error("encryption failed: {0}")]
    Encryption(String),
}

impl CipherError {
    /// Corrupt or non-PGP input, as opposed to a key problem.
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format(_))
    }

    /// The data looked fine but the bound key could not open it.
    pub fn is_cryptographic(&self) -> bool {
        matches!(
            self,
            Self::NotAddressedToKey { .. } | Self::Decryption(_) | Self::BodyRead(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("no secret key ring loaded")]
    NoSecretRing,

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("none of the recipient keys [{}] are in the secret key ring", .recipients.join(", "))]
    NoMatchingKey { recipients: Vec<String> },
}

/// Rotation has no failure modes of its own; it only says which half failed.
#[derive(Error, Debug)]
pub enum RotationError {
    #[error("rotate: decrypt failed: {0}")]
    Decrypt(#[source] CipherError),

    #[error("rotate: encrypt failed: {0}")]
    Encrypt(#[source] CipherError),
}

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("no gpg or gpg1 executable found on PATH")]
    ToolNotFound,

    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {output}")]
    Failed {
        tool: PathBuf,
        status: String,
        output: String,
    },

    #[error("can't parse pgp key info for {0}")]
    Unparseable(String),
}

#[derive(Error, Debug)]
pub enum PillarError {
    #[error(transparent)]
    KeyRing(#[from] KeyRingError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Rotation(#[from] RotationError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("no PGP key name configured (set pgp_key_name or pass --key)")]
    MissingKeyName,

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PillarError>;
