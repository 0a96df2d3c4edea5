use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use log::{info, warn};
use secure_pillar::{rotate as rotate_value, ArmoredMessage, CipherEngine, Pki, Settings};
use tempfile::NamedTempFile;

use super::open_pki;

/// Re-encrypt each file to `new_key`, replacing it in place.
///
/// A file that fails is left untouched and the rest are still processed.
pub fn rotate(settings: &Settings, new_key: &str, files: &[PathBuf]) -> Result<()> {
    let pki = open_pki(settings)?;
    let new = pki.engine_for(new_key)?;
    if let Some(target) = new.public_entity() {
        info!("rotating {} files to {}", files.len(), target.describe());
    }

    let mut failed = 0;
    for path in files {
        match rotate_file(&pki, &new, path) {
            Ok(()) => println!("Rotated {}", path.display()),
            Err(e) => {
                warn!("skipping {}: {:#}", path.display(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} files could not be rotated", failed, files.len());
    }

    Ok(())
}

fn rotate_file(pki: &Pki, new: &CipherEngine, path: &Path) -> Result<()> {
    let cipher = ArmoredMessage::from_file(path)?;
    let old = pki.decryption_engine_for(&cipher)?;
    let rotated = rotate_value(&cipher, &old, new)?;

    replace_file(path, rotated.as_str())?;
    Ok(())
}

/// Write `contents` next to `path` and rename over it, keeping permissions.
fn replace_file(path: &Path, contents: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    fs::set_permissions(tmp.path(), fs::metadata(path)?.permissions())?;

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
