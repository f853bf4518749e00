//! Point light component

use std::any::Any;

use super::Component;
use crate::foundation::string_id::StringId;

/// Omnidirectional light emitted from the node's global position.
///
/// The light carries no parameters of its own; renderers collect the
/// positions of nodes carrying it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointLight;

impl PointLight {
    /// Component type id
    pub const ID: StringId = StringId::new("Point Light");
}

impl Component for PointLight {
    fn id(&self) -> StringId {
        Self::ID
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
