use std::path::Path;

use anyhow::Result;
use log::info;
use secure_pillar::Settings;
use zeroize::Zeroizing;

use super::{open_pki, read_input};

/// Encrypt a file or stdin and print the armored value
pub fn encrypt(settings: &Settings, file: Option<&Path>, key: Option<String>) -> Result<()> {
    let plaintext = Zeroizing::new(read_input(file)?);

    let mut settings = settings.clone();
    if key.is_some() {
        settings.pgp_key_name = key;
    }

    let pki = open_pki(&settings)?;
    let engine = pki.encryption_engine()?;
    let cipher = engine.encrypt(&plaintext)?;

    if let Some(recipient) = engine.public_entity() {
        info!("encrypted {} bytes to {}", plaintext.len(), recipient.describe());
    }

    print!("{cipher}");
    if !cipher.as_str().ends_with('\n') {
        println!();
    }

    Ok(())
}
