//! Scene nodes

use bitflags::bitflags;
use slotmap::new_key_type;

use super::bounds::Aabb;
use crate::component::Component;
use crate::foundation::dependency_map::DependencyMap;
use crate::foundation::math::Transform;

new_key_type! {
    /// Stable identifier of a node in a [`SceneGraph`](super::SceneGraph)
    pub struct NodeId;
}

bitflags! {
    /// Per-node switches
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u32 {
        /// Node and its components take part in updates and messages
        const ENABLED = 1;
        /// Node takes part in render passes
        const VISIBLE = 2;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::all()
    }
}

/// Components of a node keyed by component type id
pub type ComponentMap = DependencyMap<u32, Box<dyn Component>>;

/// A placeable element of the scene graph.
///
/// Nodes live in the graph's arena and are only mutated through
/// [`SceneGraph`](super::SceneGraph) so the hierarchy and the cached global
/// transforms stay consistent.
#[derive(Debug)]
pub struct Node {
    pub(super) name: String,
    pub(super) local: Transform,
    pub(super) global: Transform,
    pub(super) aabb: Aabb,
    pub(super) flags: NodeFlags,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
    pub(super) components: ComponentMap,
}

impl Node {
    pub(super) fn new(name: impl Into<String>, flags: NodeFlags) -> Self {
        Self {
            name: name.into(),
            local: Transform::identity(),
            global: Transform::identity(),
            aabb: Aabb::default(),
            flags,
            parent: None,
            children: Vec::new(),
            components: ComponentMap::default(),
        }
    }

    /// Node name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Transform relative to the parent
    pub const fn local_transform(&self) -> &Transform {
        &self.local
    }

    /// Cached world transform
    pub const fn global_transform(&self) -> &Transform {
        &self.global
    }

    /// Bounds in node space
    pub const fn local_aabb(&self) -> &Aabb {
        &self.aabb
    }

    /// Bounds in world space
    pub fn global_aabb(&self) -> Aabb {
        self.aabb.transformed(&self.global)
    }

    /// Current flags
    pub const fn flags(&self) -> NodeFlags {
        self.flags
    }

    /// Whether the node takes part in updates
    pub const fn is_enabled(&self) -> bool {
        self.flags.contains(NodeFlags::ENABLED)
    }

    /// Whether the node takes part in rendering
    pub const fn is_visible(&self) -> bool {
        self.flags.contains(NodeFlags::VISIBLE)
    }

    /// Parent node, `None` for roots and detached nodes
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Attached components in dependency order
    pub const fn components(&self) -> &ComponentMap {
        &self.components
    }
}
