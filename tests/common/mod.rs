use assert_cmd::{cargo::cargo_bin_cmd, Command};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const ALICE_KEY_ID: &str = "3E6A61D08B3C9949";
#[allow(dead_code)]
pub const BOB_KEY_ID: &str = "0DA74B035E2A622E";

const ENV_VARS: [&str; 4] = [
    "SECURE_PILLAR_PUBLIC_KEY_RING",
    "SECURE_PILLAR_SECRET_KEY_RING",
    "SECURE_PILLAR_PGP_KEY_NAME",
    "SECURE_PILLAR_PASSPHRASE",
];

/// Path to a file under `tests/fixtures`.
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Spawn the secure-pillar binary inside `dir` with no inherited settings.
pub fn secure_pillar_cmd(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("secure-pillar");
    cmd.current_dir(dir).env_remove("RUST_LOG");
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

/// Like [`secure_pillar_cmd`], pointed at the alice/bob fixture rings.
pub fn with_rings(dir: &Path) -> Command {
    let mut cmd = secure_pillar_cmd(dir);
    cmd.arg("--pubring")
        .arg(fixture("pubring.gpg"))
        .arg("--secring")
        .arg(fixture("secring.asc"));
    cmd
}

/// Empty scratch directory for one test.
pub fn scratch() -> TempDir {
    TempDir::new().expect("failed to create temp dir")
}

/// Encrypt `plaintext` to `key` through the binary and return the armor.
#[allow(dead_code)]
pub fn encrypt_via_cli(dir: &Path, key: &str, plaintext: &str) -> String {
    let output = with_rings(dir)
        .args(["encrypt", "-k", key])
        .write_stdin(plaintext)
        .output()
        .expect("failed to run encrypt");
    assert!(output.status.success(), "encrypt failed: {:?}", output);
    String::from_utf8(output.stdout).expect("armor is not UTF-8")
}

/// Write `contents` to `dir/name` and return the path.
#[allow(dead_code)]
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("failed to write file");
    path
}
