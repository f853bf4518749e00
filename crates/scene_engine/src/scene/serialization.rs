//! Scene persistence
//!
//! A scene is stored as a flat list of node records in forest pre-order. Each
//! record names the index of its parent record; roots name none, and a parent
//! always precedes its children. The flat shape keeps arbitrarily deep
//! hierarchies within the limits of every serde backend. [`NodeTree`] offers
//! the equivalent nested view for tools that prefer it.
//!
//! Records are framed with the `AEONSCE` tag and may be binary or RON text.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::bounds::Aabb;
use super::graph::SceneGraph;
use super::node::{NodeFlags, NodeId};
use super::scene::Scene;
use super::traversal::Traversal;
use super::SceneError;
use crate::assets::framing::{self, Encoding, Magic};
use crate::assets::ResourceError;
use crate::component::{Component, ComponentFactory, Property};
use crate::foundation::crc::crc32_str;
use crate::foundation::math::{Quat, Transform, Vec3};

/// Plain-array form of a [`Transform`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformRecord {
    /// Scale along x, y, z
    pub scale: [f32; 3],
    /// Rotation quaternion as `[w, x, y, z]`
    pub rotation: [f32; 4],
    /// Translation
    pub translation: [f32; 3],
}

impl Default for TransformRecord {
    fn default() -> Self {
        Self::from(&Transform::identity())
    }
}

impl From<&Transform> for TransformRecord {
    fn from(transform: &Transform) -> Self {
        let q = transform.rotation.quaternion();
        Self {
            scale: transform.scale.into(),
            rotation: [q.w, q.i, q.j, q.k],
            translation: transform.translation.into(),
        }
    }
}

impl From<&TransformRecord> for Transform {
    fn from(record: &TransformRecord) -> Self {
        let [w, x, y, z] = record.rotation;
        let quaternion = nalgebra::Quaternion::new(w, x, y, z);
        let rotation = if quaternion.norm_squared() > f32::EPSILON {
            Quat::from_quaternion(quaternion)
        } else {
            Quat::identity()
        };
        Self::new(
            Vec3::from(record.scale),
            rotation,
            Vec3::from(record.translation),
        )
    }
}

/// One named property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    /// Property name as exposed by the component
    pub name: String,
    /// Stored value
    pub value: Property,
}

/// A component by type name with its exposed properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// Registered component type name
    pub name: String,
    /// Property snapshot
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
}

impl ComponentRecord {
    /// Snapshot `component`
    pub fn capture(component: &dyn Component) -> Self {
        Self {
            name: component.id().name().to_string(),
            properties: component
                .properties()
                .into_iter()
                .map(|(id, value)| PropertyRecord {
                    name: id.name().to_string(),
                    value,
                })
                .collect(),
        }
    }

    /// Construct the component through `factory` and apply the stored
    /// properties
    pub fn instantiate(&self, factory: &ComponentFactory) -> Result<Box<dyn Component>, SceneError> {
        let mut component = factory
            .construct(&self.name)
            .ok_or_else(|| SceneError::UnknownComponent(self.name.clone()))?;
        for property in &self.properties {
            component.set_property(crc32_str(&property.name), &property.value);
        }
        Ok(component)
    }
}

/// Everything a node stores except its place in the hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePayload {
    /// Node name
    pub name: String,
    /// Raw [`NodeFlags`] bits
    pub flags: u32,
    /// Transform relative to the parent
    pub local: TransformRecord,
    /// Bounds in node space
    #[serde(default)]
    pub aabb: Aabb,
    /// Components in dependency order
    #[serde(default)]
    pub components: Vec<ComponentRecord>,
}

impl Default for NodePayload {
    fn default() -> Self {
        Self {
            name: String::new(),
            flags: NodeFlags::default().bits(),
            local: TransformRecord::default(),
            aabb: Aabb::default(),
            components: Vec::new(),
        }
    }
}

/// Node record with a back-reference to its parent record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatNode {
    /// Index of the parent record, `None` for a root
    pub parent: Option<usize>,
    /// Node data
    pub node: NodePayload,
}

/// Persisted scene
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneRecord {
    /// Scene name
    pub name: String,
    /// Index of the camera node record
    #[serde(default)]
    pub camera: Option<usize>,
    /// Node records in forest pre-order
    pub nodes: Vec<FlatNode>,
}

/// Nested form of a node record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeTree {
    /// Node data
    pub node: NodePayload,
    /// Direct children in order
    #[serde(default)]
    pub children: Vec<NodeTree>,
}

impl SceneRecord {
    /// Flatten nested trees into pre-order records
    pub fn from_trees(name: impl Into<String>, trees: Vec<NodeTree>) -> Self {
        let mut nodes = Vec::new();
        let mut pending: Vec<(NodeTree, Option<usize>)> =
            trees.into_iter().rev().map(|tree| (tree, None)).collect();

        while let Some((tree, parent)) = pending.pop() {
            let index = nodes.len();
            nodes.push(FlatNode {
                parent,
                node: tree.node,
            });
            pending.extend(tree.children.into_iter().rev().map(|child| (child, Some(index))));
        }

        Self {
            name: name.into(),
            camera: None,
            nodes,
        }
    }

    /// Rebuild the nested trees.
    ///
    /// Fails with [`SceneError::InvalidParentReference`] when a record names a
    /// parent that does not precede it.
    pub fn into_trees(self) -> Result<Vec<NodeTree>, SceneError> {
        self.validate()?;

        let parents: Vec<Option<usize>> = self.nodes.iter().map(|flat| flat.parent).collect();
        let mut slots: Vec<Option<NodeTree>> = self
            .nodes
            .into_iter()
            .map(|flat| {
                Some(NodeTree {
                    node: flat.node,
                    children: Vec::new(),
                })
            })
            .collect();

        // Children always follow their parent, so walking backwards finishes
        // every subtree before it is moved into its parent.
        let mut roots = Vec::new();
        for index in (0..slots.len()).rev() {
            let Some(mut tree) = slots[index].take() else {
                continue;
            };
            tree.children.reverse();
            match parents[index].and_then(|parent| slots[parent].as_mut()) {
                Some(parent) => parent.children.push(tree),
                None => roots.push(tree),
            }
        }
        roots.reverse();
        Ok(roots)
    }

    /// Check that every parent reference points at an earlier record
    pub fn validate(&self) -> Result<(), SceneError> {
        for (record, flat) in self.nodes.iter().enumerate() {
            if let Some(parent) = flat.parent {
                if parent >= record {
                    return Err(SceneError::InvalidParentReference { record, parent });
                }
            }
        }
        if let Some(camera) = self.camera {
            if camera >= self.nodes.len() {
                return Err(SceneError::StructuralMismatch(format!(
                    "camera record {camera} out of range for {} nodes",
                    self.nodes.len()
                )));
            }
        }
        Ok(())
    }
}

impl Scene {
    /// Capture the attached nodes as a flat record
    pub fn to_record(&self) -> SceneRecord {
        let graph = self.graph();
        let mut indices: HashMap<NodeId, usize> = HashMap::new();
        let mut nodes = Vec::with_capacity(graph.len());
        let mut traversal = Traversal::new();

        for &root in graph.roots() {
            traversal.pre_order(graph, root, |id| {
                let Some(node) = graph.node(id) else {
                    return;
                };
                let parent = node.parent().and_then(|parent| indices.get(&parent).copied());
                indices.insert(id, nodes.len());
                nodes.push(FlatNode {
                    parent,
                    node: NodePayload {
                        name: node.name().to_string(),
                        flags: node.flags().bits(),
                        local: TransformRecord::from(node.local_transform()),
                        aabb: *node.local_aabb(),
                        components: node
                            .components()
                            .iter()
                            .map(|component| ComponentRecord::capture(&**component))
                            .collect(),
                    },
                });
            });
        }

        SceneRecord {
            name: self.name().to_string(),
            camera: self.camera().and_then(|camera| indices.get(&camera).copied()),
            nodes,
        }
    }

    /// Build a scene from `record`, constructing components with `factory`.
    pub fn from_record(record: &SceneRecord, factory: &ComponentFactory) -> Result<Self, SceneError> {
        record.validate()?;

        let mut graph = SceneGraph::new();
        let mut ids: Vec<NodeId> = Vec::with_capacity(record.nodes.len());

        for flat in &record.nodes {
            let payload = &flat.node;
            let node = graph.create_node(payload.name.clone());
            graph.set_flags(node, NodeFlags::all(), false)?;
            graph.set_flags(node, NodeFlags::from_bits_truncate(payload.flags), true)?;
            graph.set_local_aabb(node, payload.aabb)?;
            for component in &payload.components {
                graph.add_component(node, component.instantiate(factory)?)?;
            }

            // Parent indices were validated to precede this record.
            match flat.parent.and_then(|parent| ids.get(parent).copied()) {
                Some(parent) => graph.add_child(parent, node)?,
                None => graph.add_root(node)?,
            }
            graph.set_local_transform(node, Transform::from(&payload.local))?;
            ids.push(node);
        }

        let camera = record.camera.and_then(|index| ids.get(index).copied());
        log::debug!("Rebuilt scene '{}' with {} nodes", record.name, ids.len());
        Ok(Self::from_parts(record.name.clone(), graph, camera))
    }

    /// Encode the scene as a framed record
    pub fn serialize(&self, encoding: Encoding) -> Result<Vec<u8>, SceneError> {
        Ok(framing::encode(Magic::SCENE, &self.to_record(), encoding)?)
    }

    /// Decode a framed scene record
    pub fn deserialize(buffer: &[u8], factory: &ComponentFactory) -> Result<Self, SceneError> {
        let record: SceneRecord = framing::decode(Magic::SCENE, buffer)?;
        Self::from_record(&record, factory)
    }

    /// Replace this scene's contents with the scene in `buffer`.
    ///
    /// The new scene is built separately and only swapped in when the whole
    /// buffer decodes; on error `self` is unchanged.
    pub fn load_buffer(&mut self, buffer: &[u8], factory: &ComponentFactory) -> Result<(), SceneError> {
        *self = Self::deserialize(buffer, factory)?;
        Ok(())
    }

    /// Write the scene to `path`
    pub fn save_to_file(&self, path: impl AsRef<Path>, encoding: Encoding) -> Result<(), SceneError> {
        let path = path.as_ref();
        let buffer = self.serialize(encoding)?;
        std::fs::write(path, buffer).map_err(|source| ResourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Saved scene '{}' to {}", self.name(), path.display());
        Ok(())
    }

    /// Read a scene from `path`
    pub fn load_from_file(path: impl AsRef<Path>, factory: &ComponentFactory) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let buffer = std::fs::read(path).map_err(|source| ResourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scene = Self::deserialize(&buffer, factory)?;
        log::info!("Loaded scene '{}' from {}", scene.name(), path.display());
        Ok(scene)
    }
}
