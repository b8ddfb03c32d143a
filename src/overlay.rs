//! Overlay rendering: highlight regions that follow their nodes frame by frame.
//!
//! The renderer owns one region per highlighted node plus a single shared hover
//! region. [`OverlayRenderer::on_frame`] is the only place region rectangles are
//! written. It runs once per rendered frame while the renderer's [`FrameLoop`] is
//! alive and silently drops regions whose node has been detached.

use crate::dom::{BoundingBox, DomTree, NodeId};
use crate::geometry;
use image::{Pixel, Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// What a region highlights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayKind {
    Hover,
    Selected,
    SiblingGroup,
}

impl OverlayKind {
    fn color(self) -> [u8; 3] {
        match self {
            OverlayKind::Hover => [66, 133, 244],
            OverlayKind::Selected => [52, 168, 83],
            OverlayKind::SiblingGroup => [251, 140, 0],
        }
    }
}

/// A highlight box bound to one node
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayRegion {
    pub node: NodeId,
    pub kind: OverlayKind,
    /// Rectangle written by the last frame; `None` until the first sync
    pub rect: Option<BoundingBox>,
}

impl OverlayRegion {
    fn new(node: NodeId, kind: OverlayKind) -> Self {
        Self { node, kind, rect: None }
    }
}

/// Handle for the per-frame synchronization loop.
///
/// Exactly one exists while the renderer is active; dropping it out of the
/// renderer stops the loop.
#[derive(Debug)]
pub struct FrameLoop {
    id: u64,
    frames: u64,
}

impl FrameLoop {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Frames synchronized since the loop started
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// Outcome of one synchronization frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Nodes whose regions were dropped because the node left the tree
    pub detached: Vec<NodeId>,
    /// Whether the hover region was hidden for the same reason
    pub hover_lost: bool,
}

/// Owns highlight regions and keeps them glued to their nodes
#[derive(Debug, Default)]
pub struct OverlayRenderer {
    regions: IndexMap<NodeId, OverlayRegion>,
    hover: Option<OverlayRegion>,
    frame_loop: Option<FrameLoop>,
    next_loop_id: u64,
}

impl OverlayRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the frame loop; no-op when already running
    pub fn activate(&mut self) {
        if self.frame_loop.is_some() {
            return;
        }
        self.next_loop_id += 1;
        self.frame_loop = Some(FrameLoop { id: self.next_loop_id, frames: 0 });
        log::debug!("Overlay frame loop {} started", self.next_loop_id);
    }

    /// Cancel the frame loop and drop every region
    pub fn deactivate(&mut self) {
        if let Some(frame_loop) = self.frame_loop.take() {
            log::debug!(
                "Overlay frame loop {} stopped after {} frames",
                frame_loop.id,
                frame_loop.frames
            );
        }
        self.clear_all();
        self.hover = None;
    }

    pub fn is_active(&self) -> bool {
        self.frame_loop.is_some()
    }

    pub fn frame_loop(&self) -> Option<&FrameLoop> {
        self.frame_loop.as_ref()
    }

    /// Create a region for the node; no-op (returns `false`) if it already has one
    pub fn create_overlay(&mut self, node: NodeId, kind: OverlayKind) -> bool {
        if self.regions.contains_key(&node) {
            return false;
        }
        self.regions.insert(node, OverlayRegion::new(node, kind));
        true
    }

    pub fn remove_overlay(&mut self, node: NodeId) -> bool {
        self.regions.shift_remove(&node).is_some()
    }

    /// Drop all node regions (the hover region is left alone)
    pub fn clear_all(&mut self) {
        self.regions.clear();
    }

    /// Point the shared hover region at a node
    pub fn show_hover(&mut self, node: NodeId) {
        match &mut self.hover {
            Some(region) if region.node == node => {}
            Some(region) => {
                region.node = node;
                region.rect = None;
            }
            None => self.hover = Some(OverlayRegion::new(node, OverlayKind::Hover)),
        }
    }

    pub fn hide_hover(&mut self) {
        self.hover = None;
    }

    pub fn hover(&self) -> Option<&OverlayRegion> {
        self.hover.as_ref()
    }

    pub fn region(&self, node: NodeId) -> Option<&OverlayRegion> {
        self.regions.get(&node)
    }

    /// Node regions in creation order
    pub fn regions(&self) -> impl Iterator<Item = &OverlayRegion> {
        self.regions.values()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// One synchronization frame: re-read every region's rectangle and drop
    /// regions whose node is gone. Does nothing while inactive.
    pub fn on_frame(&mut self, tree: &DomTree) -> FrameReport {
        let Some(frame_loop) = self.frame_loop.as_mut() else {
            return FrameReport::default();
        };
        frame_loop.frames += 1;

        let mut report = FrameReport::default();
        self.regions.retain(|node, region| {
            if !tree.is_attached(*node) {
                report.detached.push(*node);
                return false;
            }
            region.rect = geometry::viewport_rect(tree, *node);
            true
        });

        if let Some(hover) = &mut self.hover {
            if tree.is_attached(hover.node) {
                hover.rect = geometry::viewport_rect(tree, hover.node);
            } else {
                self.hover = None;
                report.hover_lost = true;
            }
        }

        if !report.detached.is_empty() {
            log::debug!("Dropped {} overlays for detached nodes", report.detached.len());
        }
        report
    }

    /// Rasterize the regions onto a screenshot. `scale` maps CSS pixels to
    /// image pixels (the device pixel ratio).
    pub fn paint(&self, image: &mut RgbaImage, scale: f64) {
        for region in self.regions.values().chain(self.hover.iter()) {
            if let Some(rect) = region.rect {
                paint_region(image, rect, region.kind, scale);
            }
        }
    }
}

/// Draw one highlight: translucent fill plus a two pixel outline
pub fn paint_region(image: &mut RgbaImage, rect: BoundingBox, kind: OverlayKind, scale: f64) {
    let (width, height) = image.dimensions();
    let left = (rect.x * scale).round().max(0.0) as u32;
    let top = (rect.y * scale).round().max(0.0) as u32;
    let right = (((rect.x + rect.width) * scale).round().max(0.0) as u32).min(width);
    let bottom = (((rect.y + rect.height) * scale).round().max(0.0) as u32).min(height);
    if right <= left || bottom <= top {
        return;
    }

    let [r, g, b] = kind.color();
    let fill = Rgba([r, g, b, 48]);
    for y in top..bottom {
        for x in left..right {
            image.get_pixel_mut(x, y).blend(&fill);
        }
    }

    let outline = Rgba([r, g, b, 255]);
    for inset in 0..2u32 {
        let w = (right - left).saturating_sub(inset * 2);
        let h = (bottom - top).saturating_sub(inset * 2);
        if w == 0 || h == 0 {
            break;
        }
        draw_hollow_rect_mut(
            image,
            Rect::at((left + inset) as i32, (top + inset) as i32).of_size(w, h),
            outline,
        );
    }
}
