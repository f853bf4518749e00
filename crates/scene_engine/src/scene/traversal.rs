//! Depth-first traversal
//!
//! Iterative walks keep their position in an explicit stack of
//! `(node, next child)` cursors owned by a [`Traversal`] value rather than in
//! the nodes, so any number of read-only walks can run over the same graph at
//! once and deep hierarchies never touch the call stack. A `Traversal` can be
//! kept around and reused to avoid reallocating its stack.
//!
//! The recursive variants visit nodes in exactly the same order as their
//! iterative counterparts and exist for small trees and for cross-checking.

use super::graph::SceneGraph;
use super::node::NodeId;

/// Reusable depth-first walker
#[derive(Debug, Default, Clone)]
pub struct Traversal {
    stack: Vec<(NodeId, usize)>,
}

impl Traversal {
    /// Create a walker with an empty stack
    pub const fn new() -> Self {
        Self { stack: Vec::new() }
    }

    /// Visit `root` and its descendants, each node before its children
    pub fn pre_order(&mut self, graph: &SceneGraph, root: NodeId, visit: impl FnMut(NodeId)) {
        self.pre_order_with(graph, root, visit, |_| {});
    }

    /// Visit `root` and its descendants, each node after its children
    pub fn post_order(&mut self, graph: &SceneGraph, root: NodeId, visit: impl FnMut(NodeId)) {
        self.pre_order_with(graph, root, |_| {}, visit);
    }

    /// Walk `root`'s subtree calling `preamble` when a node is entered and
    /// `postamble` once all of its children are done
    pub fn pre_order_with(
        &mut self,
        graph: &SceneGraph,
        root: NodeId,
        mut preamble: impl FnMut(NodeId),
        mut postamble: impl FnMut(NodeId),
    ) {
        self.stack.clear();
        if !graph.contains(root) {
            return;
        }
        preamble(root);
        self.stack.push((root, 0));

        while let Some(frame) = self.stack.last_mut() {
            let (node, cursor) = *frame;
            if let Some(&child) = graph.children(node).get(cursor) {
                frame.1 += 1;
                preamble(child);
                self.stack.push((child, 0));
            } else {
                self.stack.pop();
                postamble(node);
            }
        }
    }

    /// Pre-order walk whose visitor may mutate the graph.
    ///
    /// Children are re-read after every visit, so nodes the visitor adds
    /// below the current node are walked too and destroyed nodes are skipped.
    pub fn pre_order_mut(
        &mut self,
        graph: &mut SceneGraph,
        root: NodeId,
        mut visit: impl FnMut(&mut SceneGraph, NodeId),
    ) {
        self.stack.clear();
        if !graph.contains(root) {
            return;
        }
        visit(graph, root);
        self.stack.push((root, 0));

        while let Some(frame) = self.stack.last_mut() {
            let (node, cursor) = *frame;
            if let Some(child) = graph.child(node, cursor) {
                frame.1 += 1;
                visit(graph, child);
                self.stack.push((child, 0));
            } else {
                self.stack.pop();
            }
        }
    }

    /// Post-order walk whose visitor may mutate the graph
    pub fn post_order_mut(
        &mut self,
        graph: &mut SceneGraph,
        root: NodeId,
        mut visit: impl FnMut(&mut SceneGraph, NodeId),
    ) {
        self.stack.clear();
        if !graph.contains(root) {
            return;
        }
        self.stack.push((root, 0));

        while let Some(frame) = self.stack.last_mut() {
            let (node, cursor) = *frame;
            if let Some(child) = graph.child(node, cursor) {
                frame.1 += 1;
                self.stack.push((child, 0));
            } else {
                self.stack.pop();
                visit(graph, node);
            }
        }
    }
}

/// Visit `node`, then each ancestor up to its root
pub fn ancestors(graph: &SceneGraph, node: NodeId, mut visit: impl FnMut(NodeId)) {
    let mut current = graph.contains(node).then_some(node);
    while let Some(id) = current {
        visit(id);
        current = graph.parent(id);
    }
}

/// Recursive pre-order walk
pub fn recursive_pre_order<F: FnMut(NodeId)>(graph: &SceneGraph, node: NodeId, visit: &mut F) {
    if !graph.contains(node) {
        return;
    }
    visit(node);
    for &child in graph.children(node) {
        recursive_pre_order(graph, child, visit);
    }
}

/// Recursive post-order walk
pub fn recursive_post_order<F: FnMut(NodeId)>(graph: &SceneGraph, node: NodeId, visit: &mut F) {
    if !graph.contains(node) {
        return;
    }
    for &child in graph.children(node) {
        recursive_post_order(graph, child, visit);
    }
    visit(node);
}

/// Recursive form of [`ancestors`]
pub fn recursive_ancestors<F: FnMut(NodeId)>(graph: &SceneGraph, node: NodeId, visit: &mut F) {
    if !graph.contains(node) {
        return;
    }
    visit(node);
    if let Some(parent) = graph.parent(node) {
        recursive_ancestors(graph, parent, visit);
    }
}
