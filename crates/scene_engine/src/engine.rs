//! Engine session
//!
//! Owns everything a running session shares: configuration, the model cache
//! and its flyweight registry, the component factory and the active scene.

use std::path::Path;

use thiserror::Error;

use crate::assets::{Model, ResourceCache, ResourceError};
use crate::component::ComponentFactory;
use crate::config::{Config, ConfigError, EngineConfig};
use crate::foundation::logging;
use crate::render::Renderer;
use crate::scene::{Scene, SceneError};

/// Main engine struct
///
/// Scenes are driven synchronously: [`Engine::update`] and
/// [`Engine::render`] walk the whole scene before returning.
pub struct Engine {
    config: EngineConfig,
    models: ResourceCache<Model>,
    factory: ComponentFactory,
    scene: Scene,
}

impl Engine {
    /// Create a session from `config`
    pub fn new(config: EngineConfig) -> Self {
        logging::init_with_filter(&config.logging.filter);
        log::info!("Initializing engine...");

        let models = ResourceCache::new(&config.resources);
        let factory = ComponentFactory::with_builtin(std::sync::Arc::clone(models.registry()));
        let scene = Scene::from_settings(&config.scene);

        log::info!(
            "Engine ready: {} resource search paths, components [{}]",
            config.resources.search_paths.len(),
            factory.names().join(", ")
        );
        Self {
            config,
            models,
            factory,
            scene,
        }
    }

    /// Create a session from a `.toml` or `.ron` configuration file
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        Ok(Self::new(EngineConfig::load_from_file(path)?))
    }

    /// Replace the active scene with the one stored at `path`.
    ///
    /// On failure the active scene is left as it was.
    pub fn load_scene(&mut self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        self.scene = Scene::load_from_file(path, &self.factory)?;
        Ok(())
    }

    /// Store the active scene at `path` with the configured encoding
    pub fn save_scene(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        self.scene
            .save_to_file(path, self.config.resources.default_encoding)?;
        Ok(())
    }

    /// Advance the active scene by `delta` seconds
    pub fn update(&mut self, delta: f64) {
        self.scene.update(delta);
    }

    /// Submit the active scene's draw requests to `renderer`
    pub fn render(&self, renderer: &mut dyn Renderer) {
        self.scene.render(renderer);
    }

    /// Active scene
    pub const fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable active scene
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Model loader and cache
    pub const fn models(&self) -> &ResourceCache<Model> {
        &self.models
    }

    /// Component constructors
    pub const fn factory(&self) -> &ComponentFactory {
        &self.factory
    }

    /// Mutable component constructors, for registering custom kinds
    pub fn factory_mut(&mut self) -> &mut ComponentFactory {
        &mut self.factory
    }

    /// Session configuration
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("scene", &self.scene.name())
            .field("nodes", &self.scene.len())
            .field("models", &self.models)
            .finish_non_exhaustive()
    }
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration could not be read
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A resource failed to load
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// A scene failed to load or save
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),
}
