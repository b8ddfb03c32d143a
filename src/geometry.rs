//! Geometry tracking: scrollability, viewport rectangles and scroll container discovery.
//!
//! Everything here is a pure read of the [`DomTree`]; nothing is cached, so the
//! functions are safe to call once per frame.

use crate::dom::{BoundingBox, DomTree, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Overflow smaller than this is sub-pixel rounding noise, not scrollable content
pub const SCROLL_TOLERANCE: f64 = 2.0;

/// Upper bound on nodes inspected by any scroll container search
pub const MAX_CANDIDATES: usize = 500;

/// Minimum on-screen area for a generic container to win tier two
pub const MIN_VISIBLE_AREA: f64 = 40_000.0;

/// Minimum width and height for a generic container to win tier two
pub const MIN_DIMENSION: f64 = 100.0;

/// Scrollability of a node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollInfo {
    pub scrollable_vertically: bool,
    pub scrollable_horizontally: bool,
    /// Total vertical content extent (`scrollHeight`)
    pub content_extent: f64,
    /// Visible vertical extent (`clientHeight`)
    pub viewport_extent: f64,
}

impl ScrollInfo {
    pub fn is_scrollable(&self) -> bool {
        self.scrollable_vertically || self.scrollable_horizontally
    }
}

/// Something the harvester can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScrollTarget {
    /// The root scrolling surface
    Document,
    /// A scrollable element
    Node(NodeId),
}

impl ScrollTarget {
    /// Node whose scroll metrics back this target
    pub fn node(self, tree: &DomTree) -> NodeId {
        match self {
            ScrollTarget::Document => tree.root(),
            ScrollTarget::Node(id) => id,
        }
    }
}

/// Semantic markers pages commonly put on their primary scrolling content, in priority order
#[derive(Debug, Clone, Copy)]
enum SemanticTarget {
    Tag(&'static str),
    Role(&'static str),
    Id(&'static str),
    Class(&'static str),
}

const SEMANTIC_TARGETS: &[SemanticTarget] = &[
    SemanticTarget::Tag("main"),
    SemanticTarget::Role("main"),
    SemanticTarget::Role("feed"),
    SemanticTarget::Id("content"),
    SemanticTarget::Id("main"),
    SemanticTarget::Class("main-content"),
    SemanticTarget::Class("content"),
    SemanticTarget::Tag("article"),
    SemanticTarget::Role("log"),
    SemanticTarget::Role("list"),
];

/// Tags considered generic layout containers
const STRUCTURAL_TAGS: &[&str] = &["div", "section", "main", "article", "aside", "ul", "ol", "nav"];

impl SemanticTarget {
    fn matches(self, tree: &DomTree, node: NodeId) -> bool {
        let Some(element) = tree.get(node) else { return false };
        match self {
            SemanticTarget::Tag(tag) => element.is_tag(tag),
            SemanticTarget::Role(role) => element.role() == Some(role),
            SemanticTarget::Id(id) => element.id().is_some_and(|i| i == id),
            SemanticTarget::Class(class) => element.has_class(class),
        }
    }
}

/// Whether the node scrolls on either axis, with its vertical extents.
///
/// The document root ignores computed style: only the root scrolling surface
/// metrics decide. Stale handles are never scrollable.
pub fn is_scrollable(tree: &DomTree, node: NodeId) -> ScrollInfo {
    let Some(element) = tree.get(node) else {
        return ScrollInfo::default();
    };
    let m = element.scroll;
    let overflows_y = m.scroll_height - m.client_height > SCROLL_TOLERANCE;
    let overflows_x = m.scroll_width - m.client_width > SCROLL_TOLERANCE;

    let (vertical, horizontal) = if node == tree.root() {
        (overflows_y, overflows_x)
    } else {
        (
            overflows_y && element.overflow_y.allows_scrolling(),
            overflows_x && element.overflow_x.allows_scrolling(),
        )
    };

    ScrollInfo {
        scrollable_vertically: vertical,
        scrollable_horizontally: horizontal,
        content_extent: m.scroll_height,
        viewport_extent: m.client_height,
    }
}

/// Current rectangle of a node in viewport coordinates; the root maps to the viewport
pub fn viewport_rect(tree: &DomTree, node: NodeId) -> Option<BoundingBox> {
    if node == tree.root() {
        return tree.is_attached(node).then(|| tree.viewport());
    }
    tree.get(node)?.bounding_box
}

fn target_for(tree: &DomTree, node: NodeId) -> ScrollTarget {
    if node == tree.root() {
        ScrollTarget::Document
    } else {
        ScrollTarget::Node(node)
    }
}

/// Find the page's primary scroll container.
///
/// 1. the first scrollable node matching the semantic markers, in marker order;
/// 2. else the scrollable structural node with the largest visible area among a
///    bounded sample, provided it is big enough to matter;
/// 3. else the document root when it scrolls.
pub fn find_scrollable_container(tree: &DomTree) -> Option<ScrollTarget> {
    let nodes = tree.descendants(tree.root());

    for marker in SEMANTIC_TARGETS {
        let hit = nodes
            .iter()
            .find(|n| marker.matches(tree, **n) && is_scrollable(tree, **n).scrollable_vertically);
        if let Some(node) = hit {
            log::debug!("Scroll container from semantic marker {:?}", marker);
            return Some(ScrollTarget::Node(*node));
        }
    }

    let viewport = tree.viewport();
    let mut best: Option<(f64, NodeId)> = None;
    let candidates = nodes
        .iter()
        .filter(|n| {
            tree.get(**n)
                .is_some_and(|e| STRUCTURAL_TAGS.contains(&e.tag_name.as_str()))
        })
        .take(MAX_CANDIDATES);

    for node in candidates {
        if !is_scrollable(tree, *node).scrollable_vertically {
            continue;
        }
        let Some(rect) = viewport_rect(tree, *node) else { continue };
        if rect.width < MIN_DIMENSION || rect.height < MIN_DIMENSION {
            continue;
        }
        let visible = rect.intersection(&viewport).map(|r| r.area()).unwrap_or(0.0);
        if visible < MIN_VISIBLE_AREA {
            continue;
        }
        if best.is_none_or(|(area, _)| visible > area) {
            best = Some((visible, *node));
        }
    }

    if let Some((area, node)) = best {
        log::debug!("Scroll container by area ({:.0}px²)", area);
        return Some(ScrollTarget::Node(node));
    }

    is_scrollable(tree, tree.root())
        .scrollable_vertically
        .then_some(ScrollTarget::Document)
}

/// Scroll target for a picked node: the node itself, else a scrollable node in
/// its subtree (breadth-first, bounded), else its nearest scrollable strict ancestor.
pub fn resolve_scroll_target(tree: &DomTree, node: NodeId) -> Option<ScrollTarget> {
    if !tree.is_attached(node) {
        return None;
    }
    if is_scrollable(tree, node).scrollable_vertically {
        return Some(target_for(tree, node));
    }

    let mut queue: VecDeque<NodeId> = tree.children(node).iter().copied().collect();
    let mut inspected = 0;
    while let Some(candidate) = queue.pop_front() {
        if inspected >= MAX_CANDIDATES {
            break;
        }
        inspected += 1;
        if is_scrollable(tree, candidate).scrollable_vertically {
            return Some(target_for(tree, candidate));
        }
        queue.extend(tree.children(candidate));
    }

    tree.ancestors(node)
        .find(|a| is_scrollable(tree, *a).scrollable_vertically)
        .map(|a| target_for(tree, a))
}
