//! Resource identifiers

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Resource;
use crate::foundation::crc::crc32_str;

/// Stable identifier of a resource: the CRC-32 of its type name and of its
/// source path.
///
/// The path component doubles as the flyweight key the resource is packed
/// under. A zero path id is the empty identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId {
    /// CRC-32 of the resource type name
    pub type_id: u32,

    /// CRC-32 of the resource path
    pub path_id: u32,
}

impl ResourceId {
    /// Build an identifier from precomputed hashes
    pub const fn from_parts(type_id: u32, path_id: u32) -> Self {
        Self { type_id, path_id }
    }

    /// Hash a type name and a path into an identifier
    pub const fn new(type_name: &str, path: &str) -> Self {
        Self {
            type_id: crc32_str(type_name),
            path_id: crc32_str(path),
        }
    }

    /// Identifier for a resource of type `T` loaded from `path`
    pub const fn for_path<T: Resource>(path: &str) -> Self {
        Self {
            type_id: T::TYPE_NAME.id(),
            path_id: crc32_str(path),
        }
    }

    /// Whether this is the empty identifier
    pub const fn is_empty(&self) -> bool {
        self.path_id == 0
    }

    /// Whether this identifier names a resource of type `T`
    pub const fn is_type<T: Resource>(&self) -> bool {
        self.type_id == T::TYPE_NAME.id()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}:{:08x}", self.type_id, self.path_id)
    }
}
