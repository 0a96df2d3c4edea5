//! Settings for locating key rings and choosing the encryption key.
//!
//! Layers, lowest priority first:
//!
//! 1. built-in defaults (the legacy GnuPG ring locations)
//! 2. `secure-pillar.toml` in the working directory, or an explicit `--config` file
//! 3. `SECURE_PILLAR_*` environment variables
//!
//! Command-line flags are applied on top by the binary.
//!
//! ```toml
//! public_key_ring = "~/.gnupg/pubring.gpg"
//! secret_key_ring = "~/.gnupg/secring.gpg"
//! pgp_key_name = "Salt Master"
//! ```

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::{PillarError, Result};

pub const CONFIG_FILE: &str = "secure-pillar.toml";
pub const ENV_PREFIX: &str = "SECURE_PILLAR_";

pub const DEFAULT_PUBLIC_KEY_RING: &str = "~/.gnupg/pubring.gpg";
pub const DEFAULT_SECRET_KEY_RING: &str = "~/.gnupg/secring.gpg";

#[derive(Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_public_key_ring")]
    pub public_key_ring: PathBuf,
    #[serde(default = "default_secret_key_ring")]
    pub secret_key_ring: PathBuf,
    #[serde(default)]
    pub pgp_key_name: Option<String>,
    #[serde(default, skip_serializing)]
    pub passphrase: Option<String>,
}

fn default_public_key_ring() -> PathBuf {
    PathBuf::from(DEFAULT_PUBLIC_KEY_RING)
}

fn default_secret_key_ring() -> PathBuf {
    PathBuf::from(DEFAULT_SECRET_KEY_RING)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            public_key_ring: default_public_key_ring(),
            secret_key_ring: default_secret_key_ring(),
            pgp_key_name: None,
            passphrase: None,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("public_key_ring", &self.public_key_ring)
            .field("secret_key_ring", &self.secret_key_ring)
            .field("pgp_key_name", &self.pgp_key_name)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Settings {
    /// Load settings. An explicit `config_file` must exist; otherwise
    /// `secure-pillar.toml` in `working_dir` is used when present.
    pub fn load(config_file: Option<&Path>, working_dir: &Path) -> Result<Self> {
        let (path, required) = match config_file {
            Some(path) => (path.to_path_buf(), true),
            None => (working_dir.join(CONFIG_FILE), false),
        };

        let mut settings = if required || path.exists() {
            let file_cfg = Config::builder()
                .add_source(
                    File::new(
                        path.to_str()
                            .ok_or_else(|| PillarError::Other("Invalid config path".into()))?,
                        FileFormat::Toml,
                    )
                    .required(required),
                )
                .build()?;

            file_cfg.try_deserialize::<Settings>()?
        } else {
            Settings::default()
        };

        settings.apply_env();
        Ok(settings)
    }

    /// Override fields from `SECURE_PILLAR_*` variables.
    pub fn apply_env(&mut self) {
        if let Some(path) = env_var("PUBLIC_KEY_RING") {
            self.public_key_ring = PathBuf::from(path);
        }
        if let Some(path) = env_var("SECRET_KEY_RING") {
            self.secret_key_ring = PathBuf::from(path);
        }
        if let Some(name) = env_var("PGP_KEY_NAME") {
            self.pgp_key_name = Some(name);
        }
        if let Some(passphrase) = env_var("PASSPHRASE") {
            self.passphrase = Some(passphrase);
        }
    }

    /// TOML rendering for display; the passphrase is never included.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|err| PillarError::Other(err.to_string()))
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}{name}"))
        .ok()
        .filter(|value| !value.trim().is_empty())
}
