//! Scene graph behaviour tests
//!
//! Hierarchy, traversal and persistence tests that span several scene
//! modules. Single-module checks stay next to their code.

mod passes;
mod persistence;

use super::{NodeId, SceneGraph};

/// Small fixed hierarchy used across the tests:
///
/// ```text
/// root
/// ├── a
/// │   ├── a1
/// │   └── a2
/// │       └── a2x
/// └── b
///     └── b1
/// ```
pub(super) struct Fixture {
    pub graph: SceneGraph,
    pub root: NodeId,
    pub a: NodeId,
    pub a1: NodeId,
    pub a2: NodeId,
    pub a2x: NodeId,
    pub b: NodeId,
    pub b1: NodeId,
}

impl Fixture {
    pub fn new() -> Self {
        let mut graph = SceneGraph::new();
        let root = graph.create_node("root");
        let a = graph.create_node("a");
        let a1 = graph.create_node("a1");
        let a2 = graph.create_node("a2");
        let a2x = graph.create_node("a2x");
        let b = graph.create_node("b");
        let b1 = graph.create_node("b1");

        graph.add_root(root).unwrap();
        graph.add_child(root, a).unwrap();
        graph.add_child(a, a1).unwrap();
        graph.add_child(a, a2).unwrap();
        graph.add_child(a2, a2x).unwrap();
        graph.add_child(root, b).unwrap();
        graph.add_child(b, b1).unwrap();

        Self {
            graph,
            root,
            a,
            a1,
            a2,
            a2x,
            b,
            b1,
        }
    }

    pub fn names(&self, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|&id| self.graph.name(id).unwrap_or("?").to_string())
            .collect()
    }
}

/// Deterministic pseudo-random sequence for structural fuzzing
pub(super) struct Lcg(u64);

impl Lcg {
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn below(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((self.0 >> 33) as usize) % bound.max(1)
    }
}
