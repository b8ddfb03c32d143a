use crate::dom::element::{BoundingBox, ElementNode, Overflow, ScrollMetrics};
use crate::error::{PickerError, Result};
use headless_chrome::Tab;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Handle to a node in a [`DomTree`].
///
/// Handles are weak: once the node (or any ancestor) is detached, the slot's
/// generation moves on and the handle stops resolving. Equality is identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

#[derive(Debug, Clone)]
struct Entry {
    element: ElementNode,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Model of a host-rendered document: an arena of elements rooted at `<html>`,
/// with `<body>` as its structural child and a fixed-size viewport.
#[derive(Debug, Clone)]
pub struct DomTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    body: NodeId,
    viewport: BoundingBox,
}

/// Serialized element as produced by the page snapshot script
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotNode {
    pub tag: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub rect: Option<BoundingBox>,
    #[serde(default)]
    pub overflow_x: Option<String>,
    #[serde(default)]
    pub overflow_y: Option<String>,
    #[serde(default)]
    pub scroll: ScrollMetrics,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default)]
    pub children: Vec<SnapshotNode>,
}

/// Page snapshot: viewport size plus the `<html>` subtree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub width: f64,
    pub height: f64,
    pub root: SnapshotNode,
}

impl DomTree {
    /// Create an empty document (`<html>` + `<body>`) with the given viewport size
    pub fn new(viewport_width: f64, viewport_height: f64) -> Self {
        let viewport = BoundingBox::new(0.0, 0.0, viewport_width, viewport_height);
        let html = ElementNode::new("html")
            .with_bounding_box(0.0, 0.0, viewport_width, viewport_height)
            .with_scroll(ScrollMetrics {
                scroll_height: viewport_height,
                scroll_width: viewport_width,
                client_height: viewport_height,
                client_width: viewport_width,
                ..Default::default()
            });

        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId { index: 0, generation: 0 },
            body: NodeId { index: 0, generation: 0 },
            viewport,
        };
        tree.root = tree.allocate(html, None);
        let body = ElementNode::new("body").with_bounding_box(0.0, 0.0, viewport_width, viewport_height);
        let (root, body) = (tree.root, tree.allocate(body, Some(tree.root)));
        tree.body = body;
        if let Some(entry) = tree.entry_mut(root) {
            entry.children.push(body);
        }
        tree
    }

    /// Build a document from a page snapshot
    pub fn from_snapshot(snapshot: PageSnapshot) -> Result<Self> {
        if !snapshot.root.tag.eq_ignore_ascii_case("html") {
            return Err(PickerError::SnapshotFailed(format!(
                "expected <html> at the snapshot root, got <{}>",
                snapshot.root.tag
            )));
        }

        let mut tree = Self::new(snapshot.width, snapshot.height);
        let root = tree.root;
        if let Some(html) = tree.get_mut(root) {
            html.attributes = snapshot.root.attributes.clone();
            html.scroll = snapshot.root.scroll;
        }

        for child in snapshot.root.children {
            if child.tag.eq_ignore_ascii_case("body") {
                let body = tree.body;
                if let Some(element) = tree.get_mut(body) {
                    *element = Self::element_from_snapshot(&child);
                }
                for grandchild in child.children {
                    tree.insert_snapshot(body, grandchild);
                }
            } else {
                tree.insert_snapshot(root, child);
            }
        }

        Ok(tree)
    }

    /// Snapshot the live page in a browser tab
    pub fn from_tab(tab: &Arc<Tab>) -> Result<Self> {
        let js_code = include_str!("snapshot_dom.js");

        let result = tab
            .evaluate(js_code, false)
            .map_err(|e| PickerError::SnapshotFailed(format!("Failed to execute snapshot script: {}", e)))?;

        let json_value = result
            .value
            .ok_or_else(|| PickerError::SnapshotFailed("No value returned from snapshot script".to_string()))?;

        // The script returns a JSON string rather than an object
        let json_str: String = serde_json::from_value(json_value)
            .map_err(|e| PickerError::SnapshotFailed(format!("Failed to get JSON string: {}", e)))?;

        let snapshot: PageSnapshot = serde_json::from_str(&json_str)
            .map_err(|e| PickerError::SnapshotFailed(format!("Failed to parse snapshot JSON: {}", e)))?;

        let tree = Self::from_snapshot(snapshot)?;
        log::debug!("Snapshotted {} elements", tree.count_elements());
        Ok(tree)
    }

    fn element_from_snapshot(node: &SnapshotNode) -> ElementNode {
        let mut element = ElementNode::new(&node.tag).with_attributes(node.attributes.clone());
        element.text_content = node.text.clone().filter(|t| !t.trim().is_empty());
        element.bounding_box = node.rect;
        element.overflow_x = node.overflow_x.as_deref().map(Overflow::parse).unwrap_or_default();
        element.overflow_y = node.overflow_y.as_deref().map(Overflow::parse).unwrap_or_default();
        element.scroll = node.scroll;
        element.z_index = node.z_index;
        element
    }

    fn insert_snapshot(&mut self, parent: NodeId, node: SnapshotNode) {
        let element = Self::element_from_snapshot(&node);
        if let Some(id) = self.append(parent, element) {
            for child in node.children {
                self.insert_snapshot(id, child);
            }
        }
    }

    fn allocate(&mut self, element: ElementNode, parent: Option<NodeId>) -> NodeId {
        let entry = Entry { element, parent, children: Vec::new() };

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            NodeId { index, generation: slot.generation }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot { generation: 0, entry: Some(entry) });
            NodeId { index, generation: 0 }
        }
    }

    fn entry(&self, id: NodeId) -> Option<&Entry> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    fn entry_mut(&mut self, id: NodeId) -> Option<&mut Entry> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    /// The `<html>` element; its scroll metrics describe the root scrolling surface
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `<body>` element
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Viewport rectangle (origin at 0,0)
    pub fn viewport(&self) -> BoundingBox {
        self.viewport
    }

    /// Whether the handle still points at a node that is part of this tree
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.entry(id).is_some()
    }

    /// Append a child element; returns `None` when the parent is detached
    pub fn append(&mut self, parent: NodeId, element: ElementNode) -> Option<NodeId> {
        if !self.is_attached(parent) {
            return None;
        }
        let id = self.allocate(element, Some(parent));
        self.entry_mut(parent)?.children.push(id);
        Some(id)
    }

    /// Detach a node and its subtree; every handle into it becomes stale.
    /// The root cannot be detached.
    pub fn detach(&mut self, id: NodeId) -> bool {
        if id == self.root || !self.is_attached(id) {
            return false;
        }

        if let Some(parent) = self.parent(id) {
            if let Some(entry) = self.entry_mut(parent) {
                entry.children.retain(|child| *child != id);
            }
        }

        let mut doomed = vec![id];
        doomed.extend(self.descendants(id));
        for node in doomed {
            let slot = &mut self.slots[node.index as usize];
            slot.entry = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(node.index);
        }
        true
    }

    /// Element data for a node
    pub fn get(&self, id: NodeId) -> Option<&ElementNode> {
        self.entry(id).map(|e| &e.element)
    }

    /// Mutable element data for a node
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut ElementNode> {
        self.entry_mut(id).map(|e| &mut e.element)
    }

    /// Parent of a node (`None` for the root or a stale handle)
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id).and_then(|e| e.parent)
    }

    /// Children in document order; empty for stale handles
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.entry(id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    /// Strict ancestors, nearest first
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors { tree: self, next: self.parent(id) }
    }

    /// Strict descendants in pre-order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev());
        }
        out
    }

    /// Whether `node` is `ancestor` or lives under it
    pub fn is_inclusive_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Whether the node is one of the two outermost structural roots
    pub fn is_structural_root(&self, id: NodeId) -> bool {
        id == self.root || id == self.body
    }

    /// Every node whose box contains the point, topmost first.
    ///
    /// Paint order approximation: higher stacking context first, then later in
    /// tree order (deeper and later siblings paint over earlier ones).
    pub fn elements_from_point(&self, x: f64, y: f64) -> Vec<NodeId> {
        let mut hits: Vec<(i32, usize, NodeId)> = Vec::new();
        let mut order = 0usize;
        let mut stack = vec![(self.root, 0i32)];

        while let Some((node, inherited_z)) = stack.pop() {
            let Some(element) = self.get(node) else { continue };
            let z = if element.z_index != 0 { element.z_index } else { inherited_z };

            if element.bounding_box.is_some_and(|b| b.contains(x, y)) {
                hits.push((z, order, node));
            }
            order += 1;

            for child in self.children(node).iter().rev() {
                stack.push((*child, z));
            }
        }

        hits.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
        hits.into_iter().map(|(_, _, node)| node).collect()
    }

    /// Set a node's scroll position (clamped), shifting the boxes of everything
    /// it scrolls. Returns the applied delta.
    pub fn set_scroll_top(&mut self, id: NodeId, top: f64) -> f64 {
        let Some(element) = self.get_mut(id) else { return 0.0 };
        let clamped = top.clamp(0.0, element.scroll.max_scroll_top());
        let delta = clamped - element.scroll.scroll_top;
        element.scroll.scroll_top = clamped;

        if delta != 0.0 {
            for node in self.descendants(id) {
                if let Some(b) = self.get_mut(node).and_then(|e| e.bounding_box.as_mut()) {
                    b.y -= delta;
                }
            }
        }
        delta
    }

    /// Rendered text of a subtree: block elements start new lines, inline text is
    /// joined with single spaces.
    pub fn inner_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(element) = self.get(id) else { return };
        if matches!(element.tag_name.as_str(), "script" | "style" | "noscript" | "template") {
            return;
        }

        let block = element.is_block();
        if block && !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }

        if let Some(text) = &element.text_content {
            if !out.is_empty() && !out.ends_with('\n') && !out.ends_with(' ') {
                out.push(' ');
            }
            out.push_str(text);
        }

        for child in self.children(id) {
            self.collect_text(*child, out);
        }

        if block && !out.ends_with('\n') {
            out.push('\n');
        }
    }

    /// Count attached elements
    pub fn count_elements(&self) -> usize {
        1 + self.descendants(self.root).len()
    }
}

/// Iterator over strict ancestors, nearest first
pub struct Ancestors<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}
