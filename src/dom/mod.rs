//! Document model
//!
//! This module holds the in-process model of a host-rendered document:
//! - ElementNode: per-element data (tag, attributes, geometry, overflow, scroll state)
//! - DomTree: arena of elements addressed by weak, generational NodeId handles
//! - selector: structural CSS selector generation for a node

pub mod element;
pub mod selector;
pub mod tree;

pub use element::{BoundingBox, ElementNode, Overflow, PICKER_UI_ATTR, ScrollMetrics};
pub use selector::structural_selector;
pub use tree::{DomTree, NodeId, PageSnapshot, SnapshotNode};
