//! # Armored Messages
//!
//! Pillar values are stored as ASCII-armored OpenPGP messages:
//!
//! ```text
//! -----BEGIN PGP MESSAGE-----
//!
//! hQEMAz0T5R+vO3SwAQf/...
//! -----END PGP MESSAGE-----
//! ```
//!
//! [`ArmoredMessage`] dearmors the text up front: the envelope must be a
//! complete `PGP MESSAGE` block whose body is valid base64. The decoded
//! packets are kept alongside the normalised text. Packet-level parsing
//! happens in [`crate::cipher`].

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use pgp::armor::{BlockType, Dearmor};

use crate::error::{FormatError, Result};

/// ASCII-armored text with a verified `PGP MESSAGE` envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmoredMessage {
    text: String,
    packets: Vec<u8>,
}

impl ArmoredMessage {
    /// Dearmor `text` and check that it holds a `PGP MESSAGE` block.
    pub fn parse(text: &str) -> std::result::Result<Self, FormatError> {
        let text = normalize(text);

        let mut dearmor = Dearmor::new(text.as_bytes());
        let mut packets = Vec::new();
        let read = dearmor.read_to_end(&mut packets);

        match dearmor.typ {
            Some(BlockType::Message) => {}
            Some(other) => return Err(FormatError::WrongBlockType(other.to_string())),
            None => {
                let reason = match read {
                    Err(err) => err.to_string(),
                    Ok(_) => "no armor header line found".to_string(),
                };
                return Err(FormatError::MalformedArmor(reason));
            }
        }

        read.map_err(|err| FormatError::MalformedArmor(err.to_string()))?;
        if packets.is_empty() {
            return Err(FormatError::MalformedArmor("empty armor body".into()));
        }

        Ok(Self { text, packets })
    }

    /// Read a whole file and validate that it is one armored message.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Ok(Self::parse(&text).map_err(crate::error::CipherError::from)?)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Binary OpenPGP packets carried by the armor.
    pub(crate) fn packets(&self) -> &[u8] {
        &self.packets
    }
}

impl fmt::Display for ArmoredMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for ArmoredMessage {
    type Err = FormatError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ArmoredMessage {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// Strip indentation left over from YAML block scalars.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.trim().lines() {
        out.push_str(line.trim());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::fixture;

    const MESSAGE: &str = "-----BEGIN PGP MESSAGE-----\n\nhQEMAz0T5R+vO3SwAQf/\n=abcd\n-----END PGP MESSAGE-----\n";

    #[test]
    fn test_parse_valid_envelope() {
        let msg = ArmoredMessage::parse(MESSAGE).unwrap();
        assert!(msg.as_str().starts_with("-----BEGIN PGP MESSAGE-----"));
        assert!(msg.as_str().ends_with("-----END PGP MESSAGE-----\n"));
    }

    #[test]
    fn test_parse_tolerates_surrounding_whitespace() {
        let indented = format!("\n  {}  \n", MESSAGE.replace('\n', "\n  "));
        let msg = ArmoredMessage::parse(&indented).unwrap();
        assert_eq!(msg.as_str(), MESSAGE);
    }

    #[test]
    fn test_plain_text_is_malformed() {
        let err = ArmoredMessage::parse("db_password: hunter2").unwrap_err();
        assert!(matches!(err, FormatError::MalformedArmor(_)));
    }

    #[test]
    fn test_empty_input_is_malformed() {
        let err = ArmoredMessage::parse("").unwrap_err();
        assert!(matches!(err, FormatError::MalformedArmor(_)));
    }

    #[test]
    fn test_public_key_block_is_wrong_type() {
        let key = "-----BEGIN PGP PUBLIC KEY BLOCK-----\n\nmQENBF\n-----END PGP PUBLIC KEY BLOCK-----\n";
        let err = ArmoredMessage::parse(key).unwrap_err();
        assert_eq!(
            err,
            FormatError::WrongBlockType("PGP PUBLIC KEY BLOCK".into())
        );
    }

    #[test]
    fn test_missing_end_line() {
        let truncated = "-----BEGIN PGP MESSAGE-----\n\nhQEMAz0T5R+vO3SwAQf/\n";
        let err = ArmoredMessage::parse(truncated).unwrap_err();
        assert!(matches!(err, FormatError::MalformedArmor(_)));
    }

    #[test]
    fn test_invalid_base64_is_malformed() {
        let err = ArmoredMessage::parse(
            "-----BEGIN PGP MESSAGE-----\n\n!!!!\n-----END PGP MESSAGE-----\n",
        )
        .unwrap_err();
        assert!(matches!(err, FormatError::MalformedArmor(_)), "unexpected error: {err:?}");
    }

    #[test]
    fn test_mismatched_end_line() {
        let err = ArmoredMessage::parse(
            "-----BEGIN PGP MESSAGE-----\n\nhQEMAz0T5R+vO3SwAQf/\n-----END PGP SIGNATURE-----\n",
        )
        .unwrap_err();
        assert!(matches!(err, FormatError::MalformedArmor(_)));
    }

    #[test]
    fn test_exported_public_key_is_wrong_type() {
        let text = fs::read_to_string(fixture("alice.pub.asc")).unwrap();
        let err = ArmoredMessage::parse(&text).unwrap_err();
        assert_eq!(
            err,
            FormatError::WrongBlockType("PGP PUBLIC KEY BLOCK".into())
        );
    }

    #[test]
    fn test_gnupg_message_keeps_packets() {
        let msg = ArmoredMessage::from_file(fixture("alice_message.asc")).unwrap();
        // first packet is a new-format or old-format packet header
        assert_eq!(msg.packets()[0] & 0x80, 0x80);
    }

    #[test]
    fn test_from_str() {
        let msg: ArmoredMessage = MESSAGE.parse().unwrap();
        assert_eq!(msg.to_string(), MESSAGE);
    }
}
