//! Component factory
//!
//! Maps component type ids to constructors so components can be created by
//! name, for example while deserializing a scene. Applications and plugins
//! register their own kinds next to the built-in ones.

use std::collections::HashMap;
use std::sync::Arc;

use super::{Camera, Component, ModelState, PointLight};
use crate::assets::{FlyweightRegistry, Model};
use crate::foundation::crc::crc32_str;
use crate::foundation::string_id::StringId;

type Constructor = Box<dyn Fn() -> Box<dyn Component> + Send + Sync>;

/// Registry of component constructors keyed by type id
#[derive(Default)]
pub struct ComponentFactory {
    constructors: HashMap<u32, (StringId, Constructor)>,
}

impl ComponentFactory {
    /// Create an empty factory
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory with the camera, point light and model components registered.
    /// Model components resolve their models through `models`.
    pub fn with_builtin(models: Arc<FlyweightRegistry<Model>>) -> Self {
        let mut factory = Self::new();
        factory.register(Camera::ID, || Box::new(Camera::default()));
        factory.register(PointLight::ID, || Box::new(PointLight));
        factory.register(ModelState::ID, move || Box::new(ModelState::new(Arc::clone(&models))));
        factory
    }

    /// Register a constructor for `id`.
    ///
    /// Returns `false` and keeps the existing constructor when `id` is
    /// already registered.
    pub fn register<F>(&mut self, id: StringId, constructor: F) -> bool
    where
        F: Fn() -> Box<dyn Component> + Send + Sync + 'static,
    {
        if self.constructors.contains_key(&id.id()) {
            log::warn!("Component constructor for {id} already registered");
            return false;
        }
        self.constructors.insert(id.id(), (id, Box::new(constructor)));
        log::debug!("Registered component constructor {id}");
        true
    }

    /// Remove the constructor for `id`
    pub fn unregister(&mut self, id: StringId) -> bool {
        self.constructors.remove(&id.id()).is_some()
    }

    /// Construct a component by type name
    pub fn construct(&self, name: &str) -> Option<Box<dyn Component>> {
        self.construct_by_id(crc32_str(name))
    }

    /// Construct a component by type id
    pub fn construct_by_id(&self, id: u32) -> Option<Box<dyn Component>> {
        self.constructors
            .get(&id)
            .map(|(_, constructor)| constructor())
    }

    /// Whether a constructor is registered for `name`
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(&crc32_str(name))
    }

    /// Names of every registered component kind, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.constructors.values().map(|(id, _)| id.name()).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for ComponentFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentFactory")
            .field("components", &self.names())
            .finish()
    }
}
