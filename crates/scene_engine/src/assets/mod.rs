//! Asset management system
//!
//! Resources are decoded from framed records (see [`framing`]), packed once
//! into a [`FlyweightRegistry`] under the CRC-32 of their path and shared
//! through by-key [`Handle`]s. Eviction is explicit: nothing is unpacked until
//! a caller asks for it.

pub mod flyweight;
pub mod framing;
pub mod model;
pub mod resource_cache;
pub mod resource_id;

pub use flyweight::{FlyweightError, FlyweightRegistry, Handle};
pub use framing::{Encoding, Magic};
pub use model::{Assembly, Model, ModelRecord};
pub use resource_cache::ResourceCache;
pub use resource_id::ResourceId;

use std::path::PathBuf;

use thiserror::Error;

use crate::foundation::string_id::StringId;

/// A loadable, shareable asset.
///
/// Implementations decode themselves completely from a framed buffer; a
/// failed decode must not produce a partially initialised object.
pub trait Resource: Sized + Send + Sync + 'static {
    /// Type name hashed into [`ResourceId::type_id`]
    const TYPE_NAME: StringId;

    /// Record tag expected at the start of encoded buffers
    const MAGIC: Magic;

    /// Decode a resource from a framed buffer
    fn from_buffer(buffer: &[u8]) -> Result<Self, ResourceError>;
}

/// Resource loading errors
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Reading a resource file failed
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Buffer is shorter than the record header
    #[error("Truncated record: expected at least {expected} bytes, got {actual}")]
    Truncated {
        /// Minimum length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Buffer does not start with the expected record tag
    #[error("Bad magic: expected {expected:?}, found {found:?}")]
    BadMagic {
        /// Expected tag
        expected: String,
        /// Tag found in the buffer
        found: String,
    },

    /// Payload could not be parsed
    #[error("Decode error: {0}")]
    Decode(String),

    /// Value could not be encoded
    #[error("Encode error: {0}")]
    Encode(String),

    /// No resource or known path for the key
    #[error("Resource {0:#010x} not found")]
    NotFound(u32),

    /// Registry rejected the key
    #[error("Flyweight error: {0}")]
    Flyweight(#[from] FlyweightError),
}

impl ResourceError {
    /// Whether the error stems from malformed input rather than IO or keys
    pub const fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::Truncated { .. } | Self::BadMagic { .. } | Self::Decode(_)
        )
    }
}
