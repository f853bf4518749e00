//! # Scene Engine
//!
//! Scene-graph, component and resource core of a real-time engine.
//!
//! ## Features
//!
//! - **Scene Graph**: arena-backed node hierarchy with cached local and global
//!   transforms and stack-based traversals
//! - **Components**: dependency-ordered behaviour modules with reflective
//!   properties and a constructor factory
//! - **Resources**: CRC-keyed flyweight cache with by-key handles that detect
//!   unloaded objects
//! - **Persistence**: framed binary or text scene records
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::new(EngineConfig::default());
//!
//!     let scene = engine.scene_mut();
//!     let eye = scene.create_node("eye");
//!     scene.add(eye)?;
//!     scene.graph_mut().add_component(eye, Box::new(Camera::default()))?;
//!     scene.graph_mut().set_local_transform(
//!         eye,
//!         Transform::from_translation(Vec3::new(0.0, 2.0, 10.0)),
//!     )?;
//!     scene.set_camera(Some(eye))?;
//!
//!     engine.update(1.0 / 60.0);
//!     engine.save_scene("level.sce")?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod component;
pub mod config;
pub mod foundation;
pub mod render;
pub mod scene;

mod engine;

pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{Encoding, FlyweightRegistry, Handle, Model, ResourceCache, ResourceId},
        component::{Camera, Component, ComponentFactory, ModelState, PointLight, Property},
        config::{Config, EngineConfig},
        foundation::{
            math::{Mat4, Quat, Transform, Vec3},
            string_id::StringId,
        },
        render::Renderer,
        scene::{NodeFlags, NodeId, Scene, SceneError, SceneGraph, Traversal},
        Engine, EngineError,
    };
}
