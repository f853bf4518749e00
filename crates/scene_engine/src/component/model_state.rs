//! Model component
//!
//! Binds a [`Model`] resource to a node and tracks which of the model's
//! animations is playing and how far into it playback is.

use std::any::Any;
use std::sync::Arc;

use super::{Component, Property};
use crate::assets::{FlyweightRegistry, Handle, Model, ResourceId};
use crate::foundation::string_id::StringId;
use crate::render::Renderer;
use crate::scene::{NodeId, SceneGraph};

/// Model binding and animation playback state.
///
/// The model is held by id only. Every render resolves it through the
/// registry again, so evicting the model simply stops the node from drawing.
pub struct ModelState {
    models: Arc<FlyweightRegistry<Model>>,
    model: ResourceId,
    active_animation: u64,
    animation_delta: f64,
}

impl ModelState {
    /// Component type id
    pub const ID: StringId = StringId::new("Model");

    /// "Model" property, a resource id
    pub const MODEL: StringId = StringId::new("Model");

    /// "Active Animation" property, index into the model's animations
    pub const ACTIVE_ANIMATION: StringId = StringId::new("Active Animation");

    /// "Animation Delta" property, seconds into the active animation
    pub const ANIMATION_DELTA: StringId = StringId::new("Animation Delta");

    const PROPERTIES: [StringId; 3] = [Self::MODEL, Self::ACTIVE_ANIMATION, Self::ANIMATION_DELTA];

    /// Create an unbound model component resolving through `models`
    pub fn new(models: Arc<FlyweightRegistry<Model>>) -> Self {
        Self {
            models,
            model: ResourceId::from_parts(0, 0),
            active_animation: 0,
            animation_delta: 0.0,
        }
    }

    /// Bound model id
    pub const fn model(&self) -> ResourceId {
        self.model
    }

    /// Bind a model; playback restarts
    pub fn set_model(&mut self, model: ResourceId) {
        self.model = model;
        self.animation_delta = 0.0;
    }

    /// Index of the playing animation
    pub const fn active_animation(&self) -> u64 {
        self.active_animation
    }

    /// Select the playing animation
    pub fn set_active_animation(&mut self, index: u64) {
        self.active_animation = index;
    }

    /// Seconds into the active animation
    pub const fn animation_delta(&self) -> f64 {
        self.animation_delta
    }

    /// Seek within the active animation
    pub fn set_animation_delta(&mut self, delta: f64) {
        self.animation_delta = delta;
    }

    /// Handle to the bound model, `None` while unbound
    pub fn handle(&self) -> Option<Handle<Model>> {
        Handle::new(&self.models, self.model.path_id).ok()
    }
}

impl std::fmt::Debug for ModelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelState")
            .field("model", &self.model)
            .field("active_animation", &self.active_animation)
            .field("animation_delta", &self.animation_delta)
            .finish_non_exhaustive()
    }
}

impl Component for ModelState {
    fn id(&self) -> StringId {
        Self::ID
    }

    fn property_info(&self) -> &'static [StringId] {
        &Self::PROPERTIES
    }

    fn property(&self, id: u32) -> Option<Property> {
        match id {
            id if id == Self::MODEL.id() => Some(Property::Resource(self.model)),
            id if id == Self::ACTIVE_ANIMATION.id() => Some(Property::UInt(self.active_animation)),
            id if id == Self::ANIMATION_DELTA.id() => Some(Property::Double(self.animation_delta)),
            _ => None,
        }
    }

    fn set_property(&mut self, id: u32, value: &Property) {
        match (id, value) {
            (id, Property::Resource(model)) if id == Self::MODEL.id() => self.set_model(*model),
            (id, Property::UInt(index)) if id == Self::ACTIVE_ANIMATION.id() => {
                self.set_active_animation(*index);
            }
            (id, Property::Double(delta)) if id == Self::ANIMATION_DELTA.id() => {
                self.set_animation_delta(*delta);
            }
            _ => {}
        }
    }

    fn update(&mut self, _graph: &mut SceneGraph, _node: NodeId, delta: f64) {
        if !self.model.is_empty() {
            self.animation_delta += delta;
        }
    }

    fn render(&self, graph: &SceneGraph, node: NodeId, renderer: &mut dyn Renderer) {
        let Some(model) = self.handle().and_then(|handle| handle.get()) else {
            return;
        };
        let Some(global) = graph.global_transform(node) else {
            return;
        };
        for assembly in model.assemblies() {
            if let (Some(mesh), Some(pipeline)) = (&assembly.mesh, &assembly.pipeline) {
                renderer.render(&global, mesh, pipeline, assembly.material.as_ref(), None);
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
