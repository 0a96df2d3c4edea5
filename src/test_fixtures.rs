//! Paths and key IDs of the OpenPGP fixtures under `tests/fixtures`.

use std::path::PathBuf;

pub const ALICE_KEY_ID: &str = "3E6A61D08B3C9949";
pub const ALICE_SUBKEY_ID: &str = "3D13E51FAF3B74B0";
pub const ALICE_FINGERPRINT: &str = "520E6C518B0E7A4E7FA92B553E6A61D08B3C9949";
pub const BOB_KEY_ID: &str = "0DA74B035E2A622E";
pub const BOB_SUBKEY_ID: &str = "5DED412083306B65";
pub const CAROL_KEY_ID: &str = "CCD15149C758A108";
pub const DAVE_KEY_ID: &str = "DE2E72F9C32D3D64";
pub const DAVE_PASSPHRASE: &str = "correct horse";
pub const HEX_NAME_KEY_ID: &str = "11CC9858BBAF6141";

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
