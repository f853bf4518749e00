//! Model resource
//!
//! A model is a list of assemblies, each pairing a mesh with the pipeline and
//! optional material used to draw it, plus an optional skeleton and the
//! animations it can play. Everything is referenced by [`ResourceId`]; the
//! renderer resolves the ids to GPU objects.

use serde::{Deserialize, Serialize};

use super::{framing, Magic, Resource, ResourceError, ResourceId};
use crate::foundation::string_id::StringId;

/// One drawable part of a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assembly {
    /// Mesh to draw
    pub mesh: Option<ResourceId>,
    /// Pipeline to draw it with, falls back to the model default
    pub pipeline: Option<ResourceId>,
    /// Material, falls back to the model default
    pub material: Option<ResourceId>,
}

/// Serialized model record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRecord {
    /// Pipeline used by assemblies that do not name one
    pub default_pipeline: Option<ResourceId>,
    /// Material used by assemblies that do not name one
    pub default_material: Option<ResourceId>,
    /// Skeleton driving the meshes
    pub skeleton: Option<ResourceId>,
    /// Drawable parts
    pub assemblies: Vec<Assembly>,
    /// Animations the model can play
    pub animations: Vec<ResourceId>,
}

/// Loaded model with defaults already applied to every assembly
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    assemblies: Vec<Assembly>,
    skeleton: Option<ResourceId>,
    animations: Vec<ResourceId>,
}

impl Model {
    /// Build a model from its record, applying the default pipeline and
    /// material to assemblies that leave them unset
    pub fn from_record(record: ModelRecord) -> Self {
        let assemblies = record
            .assemblies
            .into_iter()
            .map(|assembly| Assembly {
                mesh: assembly.mesh,
                pipeline: assembly.pipeline.or(record.default_pipeline),
                material: assembly.material.or(record.default_material),
            })
            .collect();

        Self {
            assemblies,
            skeleton: record.skeleton,
            animations: record.animations,
        }
    }

    /// Drawable parts
    pub fn assemblies(&self) -> &[Assembly] {
        &self.assemblies
    }

    /// Skeleton, if the model is skinned
    pub const fn skeleton(&self) -> Option<&ResourceId> {
        self.skeleton.as_ref()
    }

    /// Animations the model can play
    pub fn animations(&self) -> &[ResourceId] {
        &self.animations
    }
}

impl Resource for Model {
    const TYPE_NAME: StringId = StringId::new("Model");
    const MAGIC: Magic = Magic::MODEL;

    fn from_buffer(buffer: &[u8]) -> Result<Self, ResourceError> {
        let record: ModelRecord = framing::decode(Self::MAGIC, buffer)?;
        Ok(Self::from_record(record))
    }
}
