pub mod decrypt;
pub mod encrypt;
pub mod keys;
pub mod rotate;
pub mod show_config;

pub use decrypt::decrypt;
pub use encrypt::encrypt;
pub use keys::keys;
pub use rotate::rotate;
pub use show_config::show_config;

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use secure_pillar::{ArmoredMessage, Pki, Settings};

/// Load the key rings, noting a missing secret ring.
fn open_pki(settings: &Settings) -> Result<Pki> {
    let pki = Pki::new(settings)?;

    debug!(
        "loaded {} public keys from {}",
        pki.public_ring().len(),
        pki.public_ring().path().display()
    );
    match (pki.secret_ring(), pki.secret_ring_error()) {
        (Some(ring), _) => debug!(
            "loaded {} secret keys from {}",
            ring.len(),
            ring.path().display()
        ),
        (None, Some(err)) => info!("{err}; decryption unavailable"),
        (None, None) => {}
    }

    Ok(pki)
}

/// Contents of `file`, or all of stdin.
fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display())),
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("cannot read stdin")?;
            Ok(input)
        }
    }
}

fn read_armored(file: Option<&Path>) -> Result<ArmoredMessage> {
    match file {
        Some(path) => Ok(ArmoredMessage::from_file(path)?),
        None => Ok(ArmoredMessage::parse(&read_input(None)?)?),
    }
}
