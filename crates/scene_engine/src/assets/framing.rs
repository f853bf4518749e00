//! Record framing
//!
//! Every persisted record starts with an 8-byte header: a 7-byte magic tag
//! naming the record kind followed by one encoding byte. `\0` marks a binary
//! (bincode) payload; any other byte marks a RON text payload, and writers
//! emit `\n` so text records stay readable in an editor.

use std::fmt;

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::ResourceError;

/// Length of the full header, tag plus encoding byte
pub const HEADER_LEN: usize = 8;

/// Seven-byte tag identifying a record kind
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Magic(pub [u8; 7]);

impl Magic {
    /// Scene records
    pub const SCENE: Self = Self(*b"AEONSCE");

    /// Model records
    pub const MODEL: Self = Self(*b"AEONMDL");

    /// Raw tag bytes
    pub const fn bytes(&self) -> &[u8; 7] {
        &self.0
    }
}

impl fmt::Debug for Magic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Magic({})", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Display for Magic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// Payload encoding selected by the eighth header byte
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Encoding {
    /// bincode payload, header byte `\0`
    #[default]
    Binary,
    /// RON payload, header byte `\n`
    Text,
}

impl Encoding {
    /// Header byte written for this encoding
    pub const fn marker(self) -> u8 {
        match self {
            Self::Binary => b'\0',
            Self::Text => b'\n',
        }
    }

    /// Encoding implied by a header byte
    pub const fn from_marker(marker: u8) -> Self {
        if marker == b'\0' {
            Self::Binary
        } else {
            Self::Text
        }
    }
}

/// Check the header of `buffer` and return the payload encoding and bytes.
pub fn split_header(magic: Magic, buffer: &[u8]) -> Result<(Encoding, &[u8]), ResourceError> {
    if buffer.len() < HEADER_LEN {
        return Err(ResourceError::Truncated {
            expected: HEADER_LEN,
            actual: buffer.len(),
        });
    }
    if buffer[..7] != magic.0 {
        return Err(ResourceError::BadMagic {
            expected: magic.to_string(),
            found: String::from_utf8_lossy(&buffer[..7]).into_owned(),
        });
    }
    Ok((Encoding::from_marker(buffer[7]), &buffer[HEADER_LEN..]))
}

/// Fixed-width little-endian bincode that refuses bytes past the record
fn binary_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Decode a framed record of kind `magic`.
pub fn decode<T: DeserializeOwned>(magic: Magic, buffer: &[u8]) -> Result<T, ResourceError> {
    let (encoding, payload) = split_header(magic, buffer)?;
    match encoding {
        Encoding::Binary => {
            binary_options()
                .deserialize(payload)
                .map_err(|e| ResourceError::Decode(e.to_string()))
        }
        Encoding::Text => {
            let text = std::str::from_utf8(payload)
                .map_err(|e| ResourceError::Decode(format!("text record is not UTF-8: {e}")))?;
            ron::from_str(text).map_err(|e| ResourceError::Decode(e.to_string()))
        }
    }
}

/// Encode `value` as a framed record of kind `magic`.
pub fn encode<T: Serialize>(
    magic: Magic,
    value: &T,
    encoding: Encoding,
) -> Result<Vec<u8>, ResourceError> {
    let mut buffer = Vec::with_capacity(256);
    buffer.extend_from_slice(magic.bytes());
    buffer.push(encoding.marker());

    match encoding {
        Encoding::Binary => binary_options()
            .serialize_into(&mut buffer, value)
            .map_err(|e| ResourceError::Encode(e.to_string()))?,
        Encoding::Text => {
            let text = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
                .map_err(|e| ResourceError::Encode(e.to_string()))?;
            buffer.extend_from_slice(text.as_bytes());
        }
    }

    Ok(buffer)
}
