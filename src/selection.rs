//! Selection set and structural sibling matching.

use crate::dom::{DomTree, ElementNode, NodeId};
use indexmap::IndexSet;
use std::fmt::Debug;

/// Decides whether two same-parent elements are "the same kind of item"
/// for sibling-group selection.
pub trait SiblingPolicy: Debug + Send + Sync {
    fn is_sibling(&self, anchor: &ElementNode, candidate: &ElementNode) -> bool;
}

/// Same tag, and either both classless or equal first class token.
///
/// Later class tokens are ignored; they tend to be state or utility classes
/// (`active`, `p-4`) that differ between otherwise identical list items.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstClassToken;

impl SiblingPolicy for FirstClassToken {
    fn is_sibling(&self, anchor: &ElementNode, candidate: &ElementNode) -> bool {
        anchor.tag_name == candidate.tag_name && anchor.first_class() == candidate.first_class()
    }
}

/// Same tag, classes ignored
#[derive(Debug, Clone, Copy, Default)]
pub struct TagOnly;

impl SiblingPolicy for TagOnly {
    fn is_sibling(&self, anchor: &ElementNode, candidate: &ElementNode) -> bool {
        anchor.tag_name == candidate.tag_name
    }
}

/// Same tag and the same class tokens in the same order
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactClassList;

impl SiblingPolicy for ExactClassList {
    fn is_sibling(&self, anchor: &ElementNode, candidate: &ElementNode) -> bool {
        anchor.tag_name == candidate.tag_name && anchor.classes().eq(candidate.classes())
    }
}

/// The anchor plus every sibling the policy accepts, in document order
pub fn sibling_group(tree: &DomTree, anchor: NodeId, policy: &dyn SiblingPolicy) -> Vec<NodeId> {
    let Some(anchor_element) = tree.get(anchor) else {
        return Vec::new();
    };
    let Some(parent) = tree.parent(anchor) else {
        return vec![anchor];
    };

    tree.children(parent)
        .iter()
        .copied()
        .filter(|s| {
            *s == anchor || tree.get(*s).is_some_and(|e| policy.is_sibling(anchor_element, e))
        })
        .collect()
}

/// Insertion-ordered set of picked nodes; membership is handle identity
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    nodes: IndexSet<NodeId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the node was already selected
    pub fn add(&mut self, node: NodeId) -> bool {
        self.nodes.insert(node)
    }

    /// Returns `false` if the node was not selected
    pub fn remove(&mut self, node: NodeId) -> bool {
        self.nodes.shift_remove(&node)
    }

    /// Flip membership; returns whether the node is selected afterwards
    pub fn toggle(&mut self, node: NodeId) -> bool {
        if self.remove(node) {
            false
        } else {
            self.add(node)
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First node selected (still attached or not)
    pub fn first(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<NodeId> {
        self.nodes.iter().copied().collect()
    }

    /// Drop nodes that are no longer part of the tree; returns what was dropped
    pub fn retain_attached(&mut self, tree: &DomTree) -> Vec<NodeId> {
        let stale: Vec<NodeId> = self.nodes.iter().copied().filter(|n| !tree.is_attached(*n)).collect();
        for node in &stale {
            self.nodes.shift_remove(node);
        }
        stale
    }

    /// Add the anchor and its structural siblings without touching the rest of
    /// the selection. Returns the nodes that were newly added.
    pub fn select_sibling_group(
        &mut self,
        tree: &DomTree,
        anchor: NodeId,
        policy: &dyn SiblingPolicy,
    ) -> Vec<NodeId> {
        sibling_group(tree, anchor, policy)
            .into_iter()
            .filter(|n| self.add(*n))
            .collect()
    }
}
