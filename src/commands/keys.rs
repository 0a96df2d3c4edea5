use std::fmt::Write;
use std::path::Path;

use anyhow::Result;
use secure_pillar::gpg::{GpgCli, KeyInfoProvider};
use secure_pillar::{KeyIdentifier, Settings};

use super::{open_pki, read_armored};

/// Print the secret key an armored value was encrypted to
pub fn keys(settings: &Settings, file: Option<&Path>, details: bool) -> Result<()> {
    let cipher = read_armored(file)?;

    let pki = open_pki(settings)?;
    let used = pki.key_used_for(&cipher)?;

    if details {
        let gpg = GpgCli::locate()?;
        print!("{}", render_details(&used, &gpg)?);
    } else {
        println!("{used}");
    }

    Ok(())
}

fn render_details(used: &KeyIdentifier, provider: &dyn KeyInfoProvider) -> Result<String> {
    let info = provider.list_key_info(&used.primary_key_id)?;

    let mut out = String::new();
    writeln!(out, "{}", info.long_desc)?;
    for uid in info.uids.iter().skip(1) {
        writeln!(out, "  uid {uid}")?;
    }
    for sub_key in &info.sub_keys {
        writeln!(out, "  sub {sub_key}")?;
    }
    if used.key_id != used.primary_key_id {
        writeln!(out, "  encrypted to {}", used.key_id)?;
    }

    Ok(out)
}
