//! Component system
//!
//! Components are behaviour modules attached to scene nodes. Each declares a
//! type id and the ids of the components it depends on; a node keeps its
//! components in a [`DependencyMap`](crate::foundation::dependency_map::DependencyMap)
//! so dependencies update first.
//!
//! Components expose a small reflective property interface used by
//! serialization and tooling. New kinds plug in through the
//! [`ComponentFactory`].

pub mod camera;
pub mod factory;
pub mod model_state;
pub mod point_light;
pub mod property;

pub use camera::Camera;
pub use factory::ComponentFactory;
pub use model_state::ModelState;
pub use point_light::PointLight;
pub use property::Property;

use std::any::Any;
use std::fmt;

use crate::foundation::string_id::StringId;
use crate::render::Renderer;
use crate::scene::{NodeId, SceneGraph};

/// Behaviour attached to a scene node.
///
/// `update` and `process_message` receive the graph mutably so a component
/// can move its node or touch relatives. While they run, the node's own
/// components are detached from it; looking them up through the graph from
/// inside the call finds nothing.
pub trait Component: Any {
    /// Type identifier; one component per id per node
    fn id(&self) -> StringId;

    /// Ids of components that must update before this one
    fn dependencies(&self) -> &[u32] {
        &[]
    }

    /// Identifiers of the exposed properties
    fn property_info(&self) -> &'static [StringId] {
        &[]
    }

    /// Number of exposed properties
    fn property_count(&self) -> usize {
        self.property_info().len()
    }

    /// Current value of property `id`, `None` for unknown ids
    fn property(&self, _id: u32) -> Option<Property> {
        None
    }

    /// Assign property `id`.
    ///
    /// Unknown ids and values whose variant does not match the property's
    /// type are ignored.
    fn set_property(&mut self, _id: u32, _value: &Property) {}

    /// Advance the component by `delta` seconds
    fn update(&mut self, _graph: &mut SceneGraph, _node: NodeId, _delta: f64) {}

    /// Submit draw requests for the node
    fn render(&self, _graph: &SceneGraph, _node: NodeId, _renderer: &mut dyn Renderer) {}

    /// Handle a message broadcast through the scene
    fn process_message(
        &mut self,
        _graph: &mut SceneGraph,
        _node: NodeId,
        _kind: u32,
        _payload: &dyn Any,
    ) {
    }

    /// Upcast for downcasting to the concrete type
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete type
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn Component {
    /// Downcast to a concrete component type
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Mutably downcast to a concrete component type
    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }

    /// Look a property up by name
    pub fn property_by_name(&self, name: &str) -> Option<Property> {
        self.property(crate::foundation::crc::crc32_str(name))
    }

    /// Snapshot of every exposed property with its identifier
    pub fn properties(&self) -> Vec<(StringId, Property)> {
        self.property_info()
            .iter()
            .filter_map(|info| self.property(info.id()).map(|value| (*info, value)))
            .collect()
    }
}

impl fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id())
            .field("properties", &self.properties())
            .finish()
    }
}
