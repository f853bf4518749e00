//! Scene graph
//!
//! A [`Scene`] owns a forest of nodes held in a [`SceneGraph`] arena. Every
//! node caches its local and global transforms, carries an ordered list of
//! children and a dependency-ordered set of components.
//!
//! ```text
//! Scene ──► SceneGraph (arena) ──► Node ──► DependencyMap<Component>
//!                                   │
//!                                   └─► children: [NodeId]
//! ```
//!
//! Traversals use an external stack ([`Traversal`]) so read-only walks never
//! share mutable state.

mod bounds;
mod graph;
mod node;
#[allow(clippy::module_inception)]
mod scene;
mod serialization;
pub mod traversal;

#[cfg(test)]
mod tests;

pub use bounds::Aabb;
pub use graph::SceneGraph;
pub use node::{ComponentMap, Node, NodeFlags, NodeId};
pub use scene::Scene;
pub use serialization::{
    ComponentRecord, FlatNode, NodePayload, NodeTree, PropertyRecord, SceneRecord, TransformRecord,
};
pub use traversal::Traversal;

use thiserror::Error;

use crate::assets::ResourceError;
use crate::foundation::dependency_map::DependencyError;

/// Errors raised by scene graph mutation and scene (de)serialization
#[derive(Error, Debug)]
pub enum SceneError {
    /// The id does not name a live node
    #[error("Node {0:?} does not exist")]
    NodeNotFound(NodeId),

    /// The node is detached and has no position in any list
    #[error("Node {0:?} is detached and has no index")]
    NoIndex(NodeId),

    /// The requested edit does not match the current hierarchy
    #[error("Structural mismatch: {0}")]
    StructuralMismatch(String),

    /// Attaching would make a node its own ancestor
    #[error("Attaching {node:?} under {parent:?} would create a cycle")]
    WouldCreateCycle {
        /// Node being attached
        node: NodeId,
        /// Requested parent
        parent: NodeId,
    },

    /// Positional access outside the list
    #[error("Index {index} out of range for {len} entries")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// List length
        len: usize,
    },

    /// No constructor is registered for a serialized component
    #[error("Unknown component type: {0}")]
    UnknownComponent(String),

    /// A serialized node names a parent that does not precede it
    #[error("Node record {record} references parent record {parent} which does not precede it")]
    InvalidParentReference {
        /// Index of the offending record
        record: usize,
        /// Parent index it names
        parent: usize,
    },

    /// Component dependencies would form a cycle
    #[error("Component dependency error: {0}")]
    Dependency(#[from] DependencyError),

    /// Framing, decoding or file access failed
    #[error("Scene resource error: {0}")]
    Resource(#[from] ResourceError),
}
