//! Resource cache
//!
//! Front end over a [`FlyweightRegistry`] that knows how to find, read and
//! decode resources. Keys are the CRC-32 of the path string a resource is
//! requested by, so every request for the same path shares one object.
//!
//! Loads decode the whole buffer before touching the registry; a failed load
//! leaves previously packed resources exactly as they were.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use super::flyweight::{FlyweightRegistry, Handle};
use super::{Resource, ResourceError};
use crate::config::ResourceConfig;
use crate::foundation::crc::crc32_str;

/// Loader and cache for one resource type
pub struct ResourceCache<T: Resource> {
    registry: Arc<FlyweightRegistry<T>>,
    search_paths: Vec<PathBuf>,
    /// Known source path per key, for loads by id
    paths: RwLock<HashMap<u32, String>>,
}

impl<T: Resource> ResourceCache<T> {
    /// Create a cache with its own registry
    pub fn new(config: &ResourceConfig) -> Self {
        Self::with_registry(config, FlyweightRegistry::new())
    }

    /// Create a cache over an existing registry
    pub fn with_registry(config: &ResourceConfig, registry: Arc<FlyweightRegistry<T>>) -> Self {
        Self {
            registry,
            search_paths: config.search_paths.clone(),
            paths: RwLock::new(HashMap::new()),
        }
    }

    /// Registry the cache packs into
    pub const fn registry(&self) -> &Arc<FlyweightRegistry<T>> {
        &self.registry
    }

    /// Key a path is cached under
    pub const fn key_for(path: &str) -> u32 {
        crc32_str(path)
    }

    /// Remember where the resource for `path` lives so it can later be loaded
    /// by key alone. Returns the key.
    pub fn register_path(&self, path: &str) -> u32 {
        let key = Self::key_for(path);
        self.paths.write().insert(key, path.to_string());
        key
    }

    /// Load the resource at `path`, or return the cached one.
    pub fn load_path(&self, path: &str) -> Result<Handle<T>, ResourceError> {
        let key = self.register_path(path);
        if self.registry.contains(key) {
            log::debug!("Resource cache hit for {path}");
            return Ok(Handle::new(&self.registry, key)?);
        }

        let file = self.resolve(path);
        let buffer = std::fs::read(&file).map_err(|source| ResourceError::Io {
            path: file.clone(),
            source,
        })?;
        let resource = T::from_buffer(&buffer)?;

        log::info!(
            "Loaded {} from {} ({} bytes)",
            T::TYPE_NAME,
            file.display(),
            buffer.len()
        );
        self.pack_or_existing(key, resource)
    }

    /// Load the resource cached under `key`, reading it from its registered
    /// path when it is not packed.
    pub fn load_id(&self, key: u32) -> Result<Handle<T>, ResourceError> {
        if self.registry.contains(key) {
            return Ok(Handle::new(&self.registry, key)?);
        }
        let path = self
            .paths
            .read()
            .get(&key)
            .cloned()
            .ok_or(ResourceError::NotFound(key))?;
        self.load_path(&path)
    }

    /// Decode `buffer` and pack it under `key`.
    ///
    /// When `key` is already packed the existing resource is kept and the
    /// buffer is ignored.
    pub fn load_buffer(&self, key: u32, buffer: &[u8]) -> Result<Handle<T>, ResourceError> {
        if self.registry.contains(key) {
            return Ok(Handle::new(&self.registry, key)?);
        }
        let resource = T::from_buffer(buffer)?;
        self.pack_or_existing(key, resource)
    }

    /// Handle for `key` if it is packed
    pub fn handle(&self, key: u32) -> Option<Handle<T>> {
        if self.registry.contains(key) {
            Handle::new(&self.registry, key).ok()
        } else {
            None
        }
    }

    /// Packed resource for `key`
    pub fn get(&self, key: u32) -> Option<Arc<T>> {
        self.registry.get(key)
    }

    /// Evict the resource for `key`
    pub fn unpack(&self, key: u32) -> Option<Arc<T>> {
        self.registry.unpack(key)
    }

    /// Evict every resource and forget all registered paths
    pub fn clear(&self) {
        self.registry.clear();
        self.paths.write().clear();
    }

    fn pack_or_existing(&self, key: u32, resource: T) -> Result<Handle<T>, ResourceError> {
        match self.registry.pack(key, resource) {
            Ok(handle) => Ok(handle),
            // Another loader won the race; share its object.
            Err(super::FlyweightError::AlreadyPacked(_)) => Ok(Handle::new(&self.registry, key)?),
            Err(err) => Err(err.into()),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let requested = Path::new(path);
        if requested.is_absolute() {
            return requested.to_path_buf();
        }
        self.search_paths
            .iter()
            .map(|base| base.join(requested))
            .find(|candidate| candidate.is_file())
            .unwrap_or_else(|| requested.to_path_buf())
    }
}

impl<T: Resource> std::fmt::Debug for ResourceCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("type", &T::TYPE_NAME)
            .field("packed", &self.registry.len())
            .field("search_paths", &self.search_paths)
            .finish()
    }
}
