use anyhow::Result;
use secure_pillar::Settings;

/// Print the effective settings as TOML
pub fn show_config(settings: &Settings) -> Result<()> {
    print!("{}", settings.to_toml()?);
    Ok(())
}
