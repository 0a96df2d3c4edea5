//! Key metadata from the system `gpg` binary.
//!
//! Presentation only: nothing here affects which key encrypts or decrypts a
//! value. Callers that want `gpg`'s view of a key (validity, creation date,
//! every user ID) go through [`KeyInfoProvider`], which tests replace with a
//! stub.

use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::InventoryError;

/// Tools tried in order; `gpg1` still reads the legacy ring files directly.
const GPG_TOOLS: [&str; 2] = ["gpg1", "gpg"];

/// `gpg --list-keys` output for one key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyMetadata {
    /// `rsa2048/3E6A61D08B3C9949 2026-10-19 [SC]`, or the requested ID when
    /// gpg printed no `pub` line.
    pub pub_key: String,
    pub uids: Vec<String>,
    pub sub_keys: Vec<String>,
    /// `pub_key: first uid`
    pub long_desc: String,
}

pub trait KeyInfoProvider {
    fn list_key_info(&self, key_id: &str) -> Result<KeyMetadata, InventoryError>;
}

/// Runs `gpg --list-keys --keyid-format long <id>`.
#[derive(Debug, Clone)]
pub struct GpgCli {
    tool: PathBuf,
}

impl GpgCli {
    /// Find `gpg1`, then `gpg`, on `PATH`.
    pub fn locate() -> Result<Self, InventoryError> {
        let path = env::var_os("PATH").ok_or(InventoryError::ToolNotFound)?;
        GPG_TOOLS
            .iter()
            .find_map(|tool| {
                env::split_paths(&path)
                    .map(|dir| dir.join(tool))
                    .find(|candidate| is_executable(candidate))
            })
            .map(|tool| Self { tool })
            .ok_or(InventoryError::ToolNotFound)
    }

    pub fn with_tool(tool: impl Into<PathBuf>) -> Self {
        Self { tool: tool.into() }
    }
}

impl KeyInfoProvider for GpgCli {
    fn list_key_info(&self, key_id: &str) -> Result<KeyMetadata, InventoryError> {
        let output = Command::new(&self.tool)
            .args(["--batch", "--list-keys", "--keyid-format", "long", key_id])
            .stdin(Stdio::null())
            .output()
            .map_err(|source| InventoryError::Spawn {
                tool: self.tool.clone(),
                source,
            })?;

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(InventoryError::Failed {
                tool: self.tool.clone(),
                status: output.status.to_string(),
                output: combined.trim().to_string(),
            });
        }

        parse_list_keys(key_id, &String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse the human-readable `--list-keys --keyid-format long` listing.
pub fn parse_list_keys(key_id: &str, output: &str) -> Result<KeyMetadata, InventoryError> {
    let mut key = KeyMetadata::default();

    for line in output.lines().map(str::trim) {
        if let Some(rest) = record(line, "pub") {
            if key.pub_key.is_empty() {
                key.pub_key = rest.to_string();
            }
        } else if let Some(rest) = record(line, "uid") {
            key.uids.push(strip_validity(rest).to_string());
        } else if let Some(rest) = record(line, "sub") {
            key.sub_keys.push(rest.to_string());
        }
    }

    if key.pub_key.is_empty() && key.uids.is_empty() && key.sub_keys.is_empty() {
        return Err(InventoryError::Unparseable(key_id.to_string()));
    }
    if key.pub_key.is_empty() {
        key.pub_key = key_id.to_string();
    }

    key.long_desc = match key.uids.first() {
        Some(uid) => format!("{}: {}", key.pub_key, uid),
        None => key.pub_key.clone(),
    };

    Ok(key)
}

/// Rest of `line` after a `tag` column, if the line is that record type.
fn record<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(tag)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim();
    (!rest.is_empty()).then_some(rest)
}

/// Drop the `[ultimate]` / `[ unknown]` validity column.
fn strip_validity(uid: &str) -> &str {
    if uid.starts_with('[') {
        if let Some(end) = uid.find(']') {
            return uid[end + 1..].trim_start();
        }
    }
    uid
}

fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        path.metadata()
            .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        path.is_file()
    }
}
