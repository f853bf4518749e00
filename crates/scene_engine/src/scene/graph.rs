//! Scene graph arena
//!
//! [`SceneGraph`] owns every node in a slot map. Hierarchy links are ids: a
//! node lists its children in order and names its parent as a non-owning
//! back-reference. Parentless nodes are either roots (listed in the graph's
//! ordered root list) or detached (created, or removed, and not yet placed).
//!
//! Invariants kept by every mutation:
//! - a node appears in at most one child list (or the root list);
//! - `index_of(node)` is the node's position in that list;
//! - `global == parent.global * local`, and `global == local` for roots and
//!   detached nodes.

use std::any::Any;

use slotmap::SlotMap;

use super::bounds::Aabb;
use super::node::{Node, NodeFlags, NodeId};
use super::traversal::Traversal;
use super::SceneError;
use crate::component::Component;
use crate::foundation::math::Transform;
use crate::foundation::string_id::StringId;
use crate::render::Renderer;

/// Arena of scene nodes
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, Node>,
    roots: Vec<NodeId>,
    default_flags: NodeFlags,
}

impl SceneGraph {
    /// Create an empty graph whose new nodes start enabled and visible
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph whose new nodes start with `flags`
    pub fn with_default_flags(flags: NodeFlags) -> Self {
        Self {
            default_flags: flags,
            ..Self::default()
        }
    }

    /// Flags given to newly created nodes
    pub const fn default_flags(&self) -> NodeFlags {
        self.default_flags
    }

    // ---------------------------------------------------------------------
    // Node lifetime
    // ---------------------------------------------------------------------

    /// Create a detached node
    pub fn create_node(&mut self, name: impl Into<String>) -> NodeId {
        self.nodes.insert(Node::new(name, self.default_flags))
    }

    /// Detach `node` and drop it together with its whole subtree.
    ///
    /// Returns the ids that were destroyed, `node` last.
    pub fn destroy(&mut self, node: NodeId) -> Result<Vec<NodeId>, SceneError> {
        self.detach(node)?;

        let mut doomed = Vec::new();
        Traversal::new().post_order(self, node, |id| doomed.push(id));
        for id in &doomed {
            self.nodes.remove(*id);
        }
        log::trace!("Destroyed {} nodes", doomed.len());
        Ok(doomed)
    }

    /// Remove every node
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
    }

    /// Whether `node` exists
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    /// Number of nodes, attached or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node data
    pub fn node(&self, node: NodeId) -> Option<&Node> {
        self.nodes.get(node)
    }

    fn get(&self, node: NodeId) -> Result<&Node, SceneError> {
        self.nodes.get(node).ok_or(SceneError::NodeNotFound(node))
    }

    fn get_mut(&mut self, node: NodeId) -> Result<&mut Node, SceneError> {
        self.nodes.get_mut(node).ok_or(SceneError::NodeNotFound(node))
    }

    // ---------------------------------------------------------------------
    // Hierarchy queries
    // ---------------------------------------------------------------------

    /// Top-level nodes in order
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Parent of `node`
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    /// Children of `node` in order; empty for unknown nodes
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes.get(node).map_or(&[], |n| n.children.as_slice())
    }

    /// Child of `node` at `index`
    pub fn child(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.children(node).get(index).copied()
    }

    /// Number of children of `node`
    pub fn child_count(&self, node: NodeId) -> usize {
        self.children(node).len()
    }

    /// Whether `node` sits in the root list
    pub fn is_root(&self, node: NodeId) -> bool {
        self.parent(node).is_none() && self.roots.contains(&node)
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Position of `node` in its parent's children, or in the root list.
    ///
    /// Fails with [`SceneError::NoIndex`] for a detached node.
    pub fn index_of(&self, node: NodeId) -> Result<usize, SceneError> {
        let siblings = match self.get(node)?.parent {
            Some(parent) => self.children(parent),
            None => self.roots.as_slice(),
        };
        siblings
            .iter()
            .position(|&id| id == node)
            .ok_or(SceneError::NoIndex(node))
    }

    // ---------------------------------------------------------------------
    // Hierarchy mutation
    // ---------------------------------------------------------------------

    /// Append `node` to `parent`'s children
    pub fn add_child(&mut self, parent: NodeId, node: NodeId) -> Result<(), SceneError> {
        self.attach(Some(parent), usize::MAX, node)
    }

    /// Insert `node` among `parent`'s children at `index`; past the end
    /// appends
    pub fn insert_child(&mut self, parent: NodeId, index: usize, node: NodeId) -> Result<(), SceneError> {
        self.attach(Some(parent), index, node)
    }

    /// Append `node` to the root list
    pub fn add_root(&mut self, node: NodeId) -> Result<(), SceneError> {
        self.attach(None, usize::MAX, node)
    }

    /// Insert `node` into the root list at `index`; past the end appends
    pub fn insert_root(&mut self, index: usize, node: NodeId) -> Result<(), SceneError> {
        self.attach(None, index, node)
    }

    /// Place `node` at `index` under `parent` (or in the root list), taking
    /// it from wherever it currently is
    pub fn move_node(&mut self, parent: Option<NodeId>, index: usize, node: NodeId) -> Result<(), SceneError> {
        self.attach(parent, index, node)
    }

    fn attach(&mut self, parent: Option<NodeId>, index: usize, node: NodeId) -> Result<(), SceneError> {
        let global = self.get(node)?.global;
        if let Some(parent) = parent {
            self.get(parent)?;
            if self.is_ancestor_or_self(node, parent) {
                return Err(SceneError::WouldCreateCycle { node, parent });
            }
        }

        self.unlink(node);

        let siblings = match parent {
            Some(parent) => &mut self.get_mut(parent)?.children,
            None => &mut self.roots,
        };
        let index = index.min(siblings.len());
        siblings.insert(index, node);
        self.get_mut(node)?.parent = parent;
        log::trace!("Attached {node:?} under {parent:?} at {index}");

        // World placement survives the move; the local transform absorbs it.
        self.set_global_transform(node, global)
    }

    /// Remove `node` from `parent`'s children.
    ///
    /// Fails with [`SceneError::StructuralMismatch`] when `node` is not a child
    /// of `parent`. The node keeps its world placement and becomes detached.
    pub fn remove_child(&mut self, parent: NodeId, node: NodeId) -> Result<NodeId, SceneError> {
        self.get(parent)?;
        if self.get(node)?.parent != Some(parent) || !self.children(parent).contains(&node) {
            log::warn!("Refusing to remove {node:?}: not a child of {parent:?}");
            return Err(SceneError::StructuralMismatch(format!(
                "node {node:?} is not a child of {parent:?}"
            )));
        }
        self.detach(node)?;
        Ok(node)
    }

    /// Remove the child of `parent` at `index`
    pub fn remove_child_by_index(&mut self, parent: NodeId, index: usize) -> Result<NodeId, SceneError> {
        let children = &self.get(parent)?.children;
        let node = *children.get(index).ok_or(SceneError::IndexOutOfRange {
            index,
            len: children.len(),
        })?;
        self.detach(node)?;
        Ok(node)
    }

    /// Remove `node` from the root list.
    ///
    /// Fails with [`SceneError::StructuralMismatch`] when `node` is not a root.
    pub fn remove_root(&mut self, node: NodeId) -> Result<NodeId, SceneError> {
        if !self.is_root(node) {
            self.get(node)?;
            log::warn!("Refusing to remove {node:?}: not a root");
            return Err(SceneError::StructuralMismatch(format!(
                "node {node:?} is not a root of this scene"
            )));
        }
        self.detach(node)?;
        Ok(node)
    }

    /// Remove the root at `index`
    pub fn remove_root_by_index(&mut self, index: usize) -> Result<NodeId, SceneError> {
        let node = *self.roots.get(index).ok_or(SceneError::IndexOutOfRange {
            index,
            len: self.roots.len(),
        })?;
        self.detach(node)?;
        Ok(node)
    }

    /// Take `node` out of whatever list holds it.
    ///
    /// The node's local transform becomes its current global transform, so
    /// its world placement is unchanged. Detaching a detached node is a no-op.
    pub fn detach(&mut self, node: NodeId) -> Result<(), SceneError> {
        self.get(node)?;
        self.unlink(node);
        let entry = self.get_mut(node)?;
        entry.parent = None;
        entry.local = entry.global;
        Ok(())
    }

    fn unlink(&mut self, node: NodeId) {
        let parent = self.parent(node);
        let siblings = match parent.and_then(|p| self.nodes.get_mut(p)) {
            Some(parent) => &mut parent.children,
            None => &mut self.roots,
        };
        if let Some(position) = siblings.iter().position(|&id| id == node) {
            siblings.remove(position);
        }
    }

    // ---------------------------------------------------------------------
    // Transforms and bounds
    // ---------------------------------------------------------------------

    /// Transform of `node` relative to its parent
    pub fn local_transform(&self, node: NodeId) -> Option<Transform> {
        self.nodes.get(node).map(|n| n.local)
    }

    /// World transform of `node`
    pub fn global_transform(&self, node: NodeId) -> Option<Transform> {
        self.nodes.get(node).map(|n| n.global)
    }

    /// Set the local transform of `node` and refresh every descendant's
    /// global transform, parents before children
    pub fn set_local_transform(&mut self, node: NodeId, local: Transform) -> Result<(), SceneError> {
        let parent_global = self.parent(node).and_then(|p| self.global_transform(p));
        let entry = self.get_mut(node)?;
        entry.local = local;
        entry.global = parent_global.map_or(local, |parent| parent * local);
        self.propagate(node);
        Ok(())
    }

    /// Set the world transform of `node`, deriving its local transform from
    /// the parent, and refresh every descendant's global transform
    pub fn set_global_transform(&mut self, node: NodeId, global: Transform) -> Result<(), SceneError> {
        let parent_global = self.parent(node).and_then(|p| self.global_transform(p));
        let entry = self.get_mut(node)?;
        entry.global = global;
        entry.local = parent_global.map_or(global, |parent| parent.inverse() * global);
        self.propagate(node);
        Ok(())
    }

    /// Recompute globals of all descendants of `node` in pre-order
    fn propagate(&mut self, node: NodeId) {
        let mut pending: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(id) = pending.pop() {
            let Some(parent_global) = self.parent(id).and_then(|p| self.global_transform(p)) else {
                continue;
            };
            if let Some(entry) = self.nodes.get_mut(id) {
                entry.global = parent_global * entry.local;
                pending.extend(entry.children.iter().rev().copied());
            }
        }
    }

    /// Bounds of `node` in node space
    pub fn local_aabb(&self, node: NodeId) -> Option<Aabb> {
        self.nodes.get(node).map(|n| n.aabb)
    }

    /// Bounds of `node` in world space
    pub fn global_aabb(&self, node: NodeId) -> Option<Aabb> {
        self.nodes.get(node).map(Node::global_aabb)
    }

    /// Set the node-space bounds of `node`
    pub fn set_local_aabb(&mut self, node: NodeId, aabb: Aabb) -> Result<(), SceneError> {
        self.get_mut(node)?.aabb = aabb;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Names and flags
    // ---------------------------------------------------------------------

    /// Name of `node`
    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node).map(Node::name)
    }

    /// Rename `node`
    pub fn set_name(&mut self, node: NodeId, name: impl Into<String>) -> Result<(), SceneError> {
        self.get_mut(node)?.name = name.into();
        Ok(())
    }

    /// First node named `name`, in forest pre-order
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        let mut found = None;
        let mut traversal = Traversal::new();
        for &root in &self.roots {
            traversal.pre_order(self, root, |id| {
                if found.is_none() && self.name(id) == Some(name) {
                    found = Some(id);
                }
            });
            if found.is_some() {
                break;
            }
        }
        found
    }

    /// Flags of `node`
    pub fn flags(&self, node: NodeId) -> Option<NodeFlags> {
        self.nodes.get(node).map(Node::flags)
    }

    /// Turn `flags` on or off for `node`
    pub fn set_flags(&mut self, node: NodeId, flags: NodeFlags, enabled: bool) -> Result<(), SceneError> {
        self.get_mut(node)?.flags.set(flags, enabled);
        Ok(())
    }

    /// Whether `node` exists and is enabled
    pub fn is_enabled(&self, node: NodeId) -> bool {
        self.nodes.get(node).is_some_and(Node::is_enabled)
    }

    /// Whether `node` exists and is visible
    pub fn is_visible(&self, node: NodeId) -> bool {
        self.nodes.get(node).is_some_and(Node::is_visible)
    }

    // ---------------------------------------------------------------------
    // Components
    // ---------------------------------------------------------------------

    /// Attach `component` to `node`, replacing any component with the same id.
    ///
    /// Fails without changing the node when the component's dependencies
    /// would close a cycle among the node's components.
    pub fn add_component(
        &mut self,
        node: NodeId,
        component: Box<dyn Component>,
    ) -> Result<Option<Box<dyn Component>>, SceneError> {
        let id = component.id();
        let dependencies = component.dependencies().to_vec();
        let replaced = self
            .get_mut(node)?
            .components
            .insert(id.id(), dependencies, component)?;
        log::trace!("Attached component {id} to {node:?}");
        Ok(replaced)
    }

    /// Detach the component with type id `id` from `node`
    pub fn remove_component(&mut self, node: NodeId, id: u32) -> Option<Box<dyn Component>> {
        self.nodes.get_mut(node)?.components.erase(&id)
    }

    /// Component with type id `id`
    pub fn component(&self, node: NodeId, id: u32) -> Option<&dyn Component> {
        self.nodes
            .get(node)?
            .components
            .find(&id)
            .map(|component| &**component)
            .filter(|component| !component.as_any().is::<Running>())
    }

    /// Mutable component with type id `id`
    pub fn component_mut(&mut self, node: NodeId, id: u32) -> Option<&mut dyn Component> {
        self.nodes
            .get_mut(node)?
            .components
            .find_mut(&id)
            .map(|component| &mut **component)
            .filter(|component| !component.as_any().is::<Running>())
    }

    /// Component at `index` in dependency order
    pub fn component_by_index(&self, node: NodeId, index: usize) -> Option<&dyn Component> {
        self.nodes
            .get(node)?
            .components
            .get(index)
            .map(|component| &**component)
            .filter(|component| !component.as_any().is::<Running>())
    }

    /// Number of components on `node`
    pub fn component_count(&self, node: NodeId) -> usize {
        self.nodes.get(node).map_or(0, |n| n.components.len())
    }

    /// First component of concrete type `T` on `node`
    pub fn component_as<T: Component>(&self, node: NodeId) -> Option<&T> {
        self.nodes
            .get(node)?
            .components
            .iter()
            .find_map(|component| component.downcast_ref::<T>())
    }

    /// First component of concrete type `T` on `node`, mutably
    pub fn component_as_mut<T: Component>(&mut self, node: NodeId) -> Option<&mut T> {
        let components = &mut self.nodes.get_mut(node)?.components;
        let index = components
            .iter()
            .position(|component| component.as_any().is::<T>())?;
        components.get_mut(index)?.downcast_mut::<T>()
    }

    /// Run the components of `node` in dependency order.
    ///
    /// Each component leaves its slot only while it runs, so it can be handed
    /// the graph mutably and still read the siblings that ran before it.
    pub fn update_node(&mut self, node: NodeId, delta: f64) {
        self.for_each_component(node, |graph, component| component.update(graph, node, delta));
    }

    /// Deliver a message to the components of `node` in dependency order
    pub fn message_node(&mut self, node: NodeId, kind: u32, payload: &dyn Any) {
        self.for_each_component(node, |graph, component| {
            component.process_message(graph, node, kind, payload);
        });
    }

    /// Let the components of `node` submit draw requests
    pub fn render_node(&self, node: NodeId, renderer: &mut dyn Renderer) {
        if let Some(entry) = self.nodes.get(node) {
            for component in entry.components.iter() {
                component.render(self, node, renderer);
            }
        }
    }

    fn for_each_component(
        &mut self,
        node: NodeId,
        mut action: impl FnMut(&mut Self, &mut dyn Component),
    ) {
        let Some(entry) = self.nodes.get(node) else {
            return;
        };
        // Components attached during the pass first run on the next one.
        let keys: Vec<u32> = entry.components.keys().copied().collect();

        for key in keys {
            let Some(slot) = self.slot_mut(node, key) else {
                continue;
            };
            let id = slot.id();
            let mut running = std::mem::replace(slot, Box::new(Running(id)));

            action(self, &mut *running);

            // Put it back unless it was removed or replaced meanwhile.
            match self.slot_mut(node, key) {
                Some(slot) if slot.as_any().is::<Running>() => *slot = running,
                _ => log::trace!("Component {id} left {node:?} during its own pass"),
            }
        }
    }

    fn slot_mut(&mut self, node: NodeId, key: u32) -> Option<&mut Box<dyn Component>> {
        self.nodes.get_mut(node)?.components.find_mut(&key)
    }

    // ---------------------------------------------------------------------
    // Traversal conveniences
    // ---------------------------------------------------------------------

    /// Ids of `root` and its descendants in pre-order
    pub fn pre_order(&self, root: NodeId) -> Vec<NodeId> {
        let mut visited = Vec::new();
        Traversal::new().pre_order(self, root, |id| visited.push(id));
        visited
    }

    /// Ids of `root` and its descendants in post-order
    pub fn post_order(&self, root: NodeId) -> Vec<NodeId> {
        let mut visited = Vec::new();
        Traversal::new().post_order(self, root, |id| visited.push(id));
        visited
    }

    /// Every attached node, root by root, in pre-order
    pub fn forest_pre_order(&self) -> Vec<NodeId> {
        let mut visited = Vec::new();
        let mut traversal = Traversal::new();
        for &root in &self.roots {
            traversal.pre_order(self, root, |id| visited.push(id));
        }
        visited
    }

    /// `node` followed by each of its ancestors up to its root
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut visited = Vec::new();
        super::traversal::ancestors(self, node, |id| visited.push(id));
        visited
    }
}

/// Stand-in holding a component's slot while that component runs
struct Running(StringId);

impl Component for Running {
    fn id(&self) -> StringId {
        self.0
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
