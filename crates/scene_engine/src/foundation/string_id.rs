//! Hashed string identifiers

use std::fmt;

use super::crc::crc32_str;

/// A name paired with its CRC-32.
///
/// Component types and their properties are identified by `StringId`s. The
/// hash is computed at compile time for constants, and comparisons only look
/// at the hash.
#[derive(Clone, Copy)]
pub struct StringId {
    name: &'static str,
    id: u32,
}

impl StringId {
    /// Hash `name` into an identifier
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            id: crc32_str(name),
        }
    }

    /// Human readable name
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// CRC-32 of the name
    pub const fn id(&self) -> u32 {
        self.id
    }
}

impl PartialEq for StringId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for StringId {}

impl std::hash::Hash for StringId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialEq<u32> for StringId {
    fn eq(&self, other: &u32) -> bool {
        self.id == *other
    }
}

impl fmt::Debug for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StringId({:?}, {:#010x})", self.name, self.id)
    }
}

impl fmt::Display for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
