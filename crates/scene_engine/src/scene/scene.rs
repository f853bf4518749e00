//! Scene: a named forest of nodes plus the camera it is viewed through

use std::any::Any;

use super::graph::SceneGraph;
use super::node::{NodeFlags, NodeId};
use super::traversal::Traversal;
use super::SceneError;
use crate::component::{Camera, PointLight};
use crate::config::SceneSettings;
use crate::foundation::math::{Mat4, Vec3};
use crate::render::Renderer;

/// Top-level container of the scene graph
#[derive(Debug)]
pub struct Scene {
    name: String,
    graph: SceneGraph,
    camera: Option<NodeId>,
    traversal: Traversal,
}

impl Default for Scene {
    fn default() -> Self {
        Self::from_settings(&SceneSettings::default())
    }
}

impl Scene {
    /// Create an empty scene
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graph: SceneGraph::new(),
            camera: None,
            traversal: Traversal::new(),
        }
    }

    /// Create an empty scene using configured defaults
    pub fn from_settings(settings: &SceneSettings) -> Self {
        let mut flags = NodeFlags::empty();
        flags.set(NodeFlags::ENABLED, settings.nodes_enabled);
        flags.set(NodeFlags::VISIBLE, settings.nodes_visible);
        Self {
            name: settings.default_name.clone(),
            graph: SceneGraph::with_default_flags(flags),
            camera: None,
            traversal: Traversal::new(),
        }
    }

    pub(super) fn from_parts(name: String, graph: SceneGraph, camera: Option<NodeId>) -> Self {
        Self {
            name,
            graph,
            camera,
            traversal: Traversal::new(),
        }
    }

    /// Scene name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the scene
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Node arena
    pub const fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Mutable node arena
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// Create a detached node
    pub fn create_node(&mut self, name: impl Into<String>) -> NodeId {
        self.graph.create_node(name)
    }

    /// Number of nodes, attached or not
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    /// Whether the scene holds no nodes
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Drop every node and the camera
    pub fn clear(&mut self) {
        self.graph.clear();
        self.camera = None;
    }

    // ---------------------------------------------------------------------
    // Root list
    // ---------------------------------------------------------------------

    /// Append `node` to the top level
    pub fn add(&mut self, node: NodeId) -> Result<(), SceneError> {
        self.graph.add_root(node)
    }

    /// Insert `node` into the top level at `index`
    pub fn insert(&mut self, index: usize, node: NodeId) -> Result<(), SceneError> {
        self.graph.insert_root(index, node)
    }

    /// Take `node` off the top level, leaving it detached
    pub fn remove(&mut self, node: NodeId) -> Result<NodeId, SceneError> {
        self.graph.remove_root(node)
    }

    /// Take the top-level node at `index` off, leaving it detached
    pub fn remove_by_index(&mut self, index: usize) -> Result<NodeId, SceneError> {
        self.graph.remove_root_by_index(index)
    }

    /// Move `node` from wherever it is to the top level at `index`
    pub fn move_node(&mut self, index: usize, node: NodeId) -> Result<(), SceneError> {
        self.graph.move_node(None, index, node)
    }

    /// Top-level node at `index`
    pub fn child(&self, index: usize) -> Option<NodeId> {
        self.graph.roots().get(index).copied()
    }

    /// Number of top-level nodes
    pub fn child_count(&self) -> usize {
        self.graph.roots().len()
    }

    /// Top-level nodes in order
    pub fn roots(&self) -> &[NodeId] {
        self.graph.roots()
    }

    /// Position of `node` among its siblings
    pub fn index_of(&self, node: NodeId) -> Result<usize, SceneError> {
        self.graph.index_of(node)
    }

    /// Destroy `node` and its subtree; clears the camera if it was inside
    pub fn destroy(&mut self, node: NodeId) -> Result<Vec<NodeId>, SceneError> {
        let destroyed = self.graph.destroy(node)?;
        if self.camera.is_some_and(|camera| destroyed.contains(&camera)) {
            log::debug!("Scene camera destroyed with its subtree");
            self.camera = None;
        }
        Ok(destroyed)
    }

    // ---------------------------------------------------------------------
    // Passes
    // ---------------------------------------------------------------------

    /// Run every enabled node's components, ancestors before descendants
    pub fn update(&mut self, delta: f64) {
        let roots = self.graph.roots().to_vec();
        for root in roots {
            self.traversal.pre_order_mut(&mut self.graph, root, |graph, node| {
                if graph.is_enabled(node) {
                    graph.update_node(node, delta);
                }
            });
        }
    }

    /// Deliver a message to the components of every enabled node
    pub fn broadcast_message(&mut self, kind: u32, payload: &dyn Any) {
        let roots = self.graph.roots().to_vec();
        for root in roots {
            self.traversal.pre_order_mut(&mut self.graph, root, |graph, node| {
                if graph.is_enabled(node) {
                    graph.message_node(node, kind, payload);
                }
            });
        }
    }

    /// Let every enabled, visible node submit its draw requests
    pub fn render(&self, renderer: &mut dyn Renderer) {
        let mut traversal = Traversal::new();
        for &root in self.graph.roots() {
            traversal.pre_order(&self.graph, root, |node| {
                if self.graph.is_enabled(node) && self.graph.is_visible(node) {
                    self.graph.render_node(node, renderer);
                }
            });
        }
    }

    /// Every attached node, root by root, in pre-order
    pub fn pre_order(&self) -> Vec<NodeId> {
        self.graph.forest_pre_order()
    }

    /// Every attached node, root by root, in post-order
    pub fn post_order(&self) -> Vec<NodeId> {
        self.graph
            .roots()
            .iter()
            .flat_map(|&root| self.graph.post_order(root))
            .collect()
    }

    // ---------------------------------------------------------------------
    // Camera and lights
    // ---------------------------------------------------------------------

    /// Choose the node the scene is viewed from, or none
    pub fn set_camera(&mut self, camera: Option<NodeId>) -> Result<(), SceneError> {
        if let Some(node) = camera {
            if !self.graph.contains(node) {
                return Err(SceneError::NodeNotFound(node));
            }
        }
        self.camera = camera;
        Ok(())
    }

    /// Node the scene is viewed from
    pub const fn camera(&self) -> Option<NodeId> {
        self.camera
    }

    /// World-to-view matrix: the inverse of the camera node's global transform
    pub fn view_matrix(&self) -> Option<Mat4> {
        let camera = self.camera?;
        self.graph
            .global_transform(camera)
            .and_then(|global| global.to_matrix().try_inverse())
    }

    /// Projection of the camera node's [`Camera`] component, `None` without
    /// one or when its parameters are degenerate
    pub fn projection_matrix(&self, aspect: f32) -> Option<Mat4> {
        let camera = self.camera?;
        self.graph
            .component_as::<Camera>(camera)
            .and_then(|camera| camera.projection_matrix(aspect))
    }

    /// World positions of every attached node carrying a [`PointLight`]
    pub fn point_lights(&self) -> Vec<Vec3> {
        self.graph
            .forest_pre_order()
            .into_iter()
            .filter(|&node| self.graph.component_as::<PointLight>(node).is_some())
            .filter_map(|node| self.graph.global_transform(node))
            .map(|global| global.translation)
            .collect()
    }
}
