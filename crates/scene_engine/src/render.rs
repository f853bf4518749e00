//! Renderer boundary
//!
//! The core performs no GPU work. During a render pass it walks the scene and
//! hands fully resolved draw requests to whatever implements [`Renderer`].

use crate::assets::ResourceId;
use crate::foundation::math::{Mat4, Transform};

/// Consumer of draw requests produced by a render pass
pub trait Renderer {
    /// Draw `mesh` with `pipeline` at `global`.
    ///
    /// `material` falls back to the pipeline's default when absent.
    /// `skeleton` carries the joint matrices of skinned meshes.
    fn render(
        &mut self,
        global: &Transform,
        mesh: &ResourceId,
        pipeline: &ResourceId,
        material: Option<&ResourceId>,
        skeleton: Option<&[Mat4]>,
    );
}
