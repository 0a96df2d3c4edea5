use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use secure_pillar::Settings;
use zeroize::Zeroizing;

use super::{open_pki, read_armored};

/// Decrypt an armored value and write the plaintext to stdout
pub fn decrypt(settings: &Settings, file: Option<&Path>) -> Result<()> {
    let cipher = read_armored(file)?;

    let pki = open_pki(settings)?;
    let engine = pki.decryption_engine_for(&cipher)?;
    if let Some(private) = engine.private_entity() {
        info!("decrypting with {}", private.describe());
    }
    let plaintext = Zeroizing::new(engine.decrypt(&cipher)?);

    // written as-is, no trailing newline added
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(plaintext.as_bytes())
        .and_then(|_| stdout.flush())
        .context("cannot write plaintext")?;

    Ok(())
}
