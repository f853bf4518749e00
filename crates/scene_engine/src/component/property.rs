//! Component property values

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::assets::ResourceId;

/// Tagged value of a component property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Property {
    /// Single precision float
    Float(f32),
    /// Double precision float
    Double(f64),
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    UInt(u64),
    /// Boolean flag
    Bool(bool),
    /// Text
    String(String),
    /// File system path
    Path(PathBuf),
    /// Reference to a resource
    Resource(ResourceId),
}

impl Property {
    /// Name of the variant, for diagnostics
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Bool(_) => "bool",
            Self::String(_) => "string",
            Self::Path(_) => "path",
            Self::Resource(_) => "resource",
        }
    }

    /// Value if this is a `Float`
    pub const fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Value if this is a `Double`
    pub const fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(value) => Some(*value),
            _ => None,
        }
    }

    /// Value if this is an `Int`
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Value if this is a `UInt`
    pub const fn as_uint(&self) -> Option<u64> {
        match self {
            Self::UInt(value) => Some(*value),
            _ => None,
        }
    }

    /// Value if this is a `Bool`
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Value if this is a `String`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Value if this is a `Resource`
    pub const fn as_resource(&self) -> Option<ResourceId> {
        match self {
            Self::Resource(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<f32> for Property {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for Property {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<i64> for Property {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for Property {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<bool> for Property {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Property {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<ResourceId> for Property {
    fn from(value: ResourceId) -> Self {
        Self::Resource(value)
    }
}
