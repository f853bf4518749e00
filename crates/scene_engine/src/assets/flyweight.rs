//! Flyweight registry
//!
//! A [`FlyweightRegistry`] maps non-zero numeric keys to shared objects. Each
//! registry is an explicit value owned by whoever scopes the session (usually
//! the engine) rather than process-wide state.
//!
//! [`Handle`]s carry only the key and a reference to the registry. They look
//! the object up on every access, so a handle outlives the registration
//! safely: once the key is unpacked the handle resolves to `None`.
//!
//! Pack, unpack and lookup all go through one reader-writer lock, so lookups
//! never observe a half-applied pack or unpack.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

/// Errors raised by the flyweight registry and its handles
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlyweightError {
    /// Key zero is reserved as the empty key
    #[error("Invalid key: 0 is reserved")]
    InvalidKey,

    /// Another object is already registered under this key
    #[error("Key {0:#010x} is already packed")]
    AlreadyPacked(u32),

    /// The handle's key no longer resolves to an object
    #[error("Invalid object: key {0:#010x} is not packed")]
    InvalidObject(u32),
}

/// Keyed store of shared objects.
pub struct FlyweightRegistry<T> {
    objects: RwLock<HashMap<u32, Arc<T>>>,
}

impl<T> Default for FlyweightRegistry<T> {
    fn default() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> fmt::Debug for FlyweightRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlyweightRegistry")
            .field("len", &self.len())
            .finish()
    }
}

impl<T> FlyweightRegistry<T> {
    /// Create an empty registry ready to be shared
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `object` under `key` and return a handle to it.
    pub fn pack(self: &Arc<Self>, key: u32, object: T) -> Result<Handle<T>, FlyweightError> {
        self.pack_shared(key, Arc::new(object))
    }

    /// Register an already shared object under `key`.
    pub fn pack_shared(self: &Arc<Self>, key: u32, object: Arc<T>) -> Result<Handle<T>, FlyweightError> {
        if key == 0 {
            return Err(FlyweightError::InvalidKey);
        }

        let mut objects = self.objects.write();
        if objects.contains_key(&key) {
            return Err(FlyweightError::AlreadyPacked(key));
        }
        objects.insert(key, object);
        log::debug!("Packed flyweight {key:#010x} ({} live)", objects.len());
        drop(objects);

        Ok(Handle {
            key,
            registry: Arc::clone(self),
        })
    }

    /// Remove the registration for `key`.
    ///
    /// Returns the object so the caller decides when it is finally dropped.
    /// Handles for `key` stop resolving immediately.
    pub fn unpack(&self, key: u32) -> Option<Arc<T>> {
        let removed = self.objects.write().remove(&key);
        if removed.is_some() {
            log::debug!("Unpacked flyweight {key:#010x}");
        }
        removed
    }

    /// Look up `key`. An absent key is not an error.
    pub fn get(&self, key: u32) -> Option<Arc<T>> {
        self.objects.read().get(&key).cloned()
    }

    /// Whether `key` is currently packed
    pub fn contains(&self, key: u32) -> bool {
        self.objects.read().contains_key(&key)
    }

    /// Number of packed objects
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Whether nothing is packed
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Currently packed keys, in no particular order
    pub fn keys(&self) -> Vec<u32> {
        self.objects.read().keys().copied().collect()
    }

    /// Visit every packed object.
    ///
    /// The registry is read-locked for the duration of the walk; `action` must
    /// not pack or unpack on the same registry.
    pub fn for_each(&self, mut action: impl FnMut(u32, &Arc<T>)) {
        for (key, object) in self.objects.read().iter() {
            action(*key, object);
        }
    }

    /// Unpack everything
    pub fn clear(&self) {
        let mut objects = self.objects.write();
        log::debug!("Clearing {} flyweights", objects.len());
        objects.clear();
    }
}

/// By-key reference into a [`FlyweightRegistry`].
pub struct Handle<T> {
    key: u32,
    registry: Arc<FlyweightRegistry<T>>,
}

impl<T> Handle<T> {
    /// Create a handle for `key`, whether or not it is packed yet.
    pub fn new(registry: &Arc<FlyweightRegistry<T>>, key: u32) -> Result<Self, FlyweightError> {
        if key == 0 {
            return Err(FlyweightError::InvalidKey);
        }
        Ok(Self {
            key,
            registry: Arc::clone(registry),
        })
    }

    /// Key this handle resolves
    pub const fn key(&self) -> u32 {
        self.key
    }

    /// Resolve the object, `None` once it has been unpacked
    pub fn get(&self) -> Option<Arc<T>> {
        self.registry.get(self.key)
    }

    /// Resolve the object or fail with [`FlyweightError::InvalidObject`]
    pub fn resolve(&self) -> Result<Arc<T>, FlyweightError> {
        self.get().ok_or(FlyweightError::InvalidObject(self.key))
    }

    /// Whether the key currently resolves
    pub fn is_valid(&self) -> bool {
        self.registry.contains(self.key)
    }

    /// Unpack the object this handle refers to
    pub fn unpack(&self) -> Option<Arc<T>> {
        self.registry.unpack(self.key)
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && Arc::ptr_eq(&self.registry, &other.registry)
    }
}

impl<T> Eq for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("key", &format_args!("{:#010x}", self.key))
            .field("valid", &self.is_valid())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Mesh {
        vertices: usize,
    }

    #[test]
    fn test_pack_then_get() {
        let registry = FlyweightRegistry::new();
        let handle = registry.pack(42, Mesh { vertices: 3 }).unwrap();

        assert_eq!(handle.key(), 42);
        assert_eq!(handle.get().unwrap().vertices, 3);
        assert_eq!(Handle::new(&registry, 42).unwrap().get().unwrap().vertices, 3);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unpack_invalidates_handles() {
        let registry = FlyweightRegistry::new();
        let handle = registry.pack(7, Mesh { vertices: 8 }).unwrap();
        let copy = handle.clone();

        let object = registry.unpack(7).unwrap();
        assert_eq!(object.vertices, 8);
        assert!(handle.get().is_none());
        assert!(!copy.is_valid());
        assert_eq!(copy.resolve(), Err(FlyweightError::InvalidObject(7)));
        assert!(registry.unpack(7).is_none());
    }

    #[test]
    fn test_reserved_key_rejected() {
        let registry = FlyweightRegistry::<Mesh>::new();
        assert_eq!(
            registry.pack(0, Mesh { vertices: 1 }).unwrap_err(),
            FlyweightError::InvalidKey
        );
        assert_eq!(Handle::new(&registry, 0).unwrap_err(), FlyweightError::InvalidKey);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_double_pack_rejected() {
        let registry = FlyweightRegistry::new();
        registry.pack(5, Mesh { vertices: 1 }).unwrap();
        assert_eq!(
            registry.pack(5, Mesh { vertices: 2 }).unwrap_err(),
            FlyweightError::AlreadyPacked(5)
        );
        assert_eq!(registry.get(5).unwrap().vertices, 1);
    }

    #[test]
    fn test_handle_before_pack_resolves_later() {
        let registry = FlyweightRegistry::new();
        let handle = Handle::new(&registry, 99).unwrap();
        assert!(handle.get().is_none());

        registry.pack(99, Mesh { vertices: 4 }).unwrap();
        assert_eq!(handle.resolve().unwrap().vertices, 4);
    }

    #[test]
    fn test_enumerate_and_clear() {
        let registry = FlyweightRegistry::new();
        for key in 1..=3 {
            registry.pack(key, Mesh { vertices: key as usize }).unwrap();
        }

        let mut total = 0;
        registry.for_each(|_, mesh| total += mesh.vertices);
        assert_eq!(total, 6);

        let mut keys = registry.keys();
        keys.sort_unstable();
        assert_eq!(keys, vec![1, 2, 3]);

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_lookups_during_pack() {
        let registry = FlyweightRegistry::new();
        std::thread::scope(|scope| {
            let writer = Arc::clone(&registry);
            scope.spawn(move || {
                for key in 1..=200 {
                    writer.pack(key, Mesh { vertices: key as usize }).unwrap();
                }
            });
            for _ in 0..4 {
                let reader = Arc::clone(&registry);
                scope.spawn(move || {
                    for key in 1..=200 {
                        if let Some(mesh) = reader.get(key) {
                            assert_eq!(mesh.vertices, key as usize);
                        }
                    }
                });
            }
        });
        assert_eq!(registry.len(), 200);
    }
}
