//! Picker controller
//!
//! Ties hit-testing, level navigation, selection and overlays together behind a
//! start / stop / cancel / confirm lifecycle. The host forwards its input events
//! through [`PickerController::handle_event`] and its frame callbacks through
//! [`PickerController::on_frame`]; the controller decides which events it
//! swallows.

pub mod config;

pub use config::{KeyBindings, PickerConfig};

use crate::dom::{BoundingBox, DomTree, NodeId, structural_selector};
use crate::geometry::{self, ScrollTarget};
use crate::hit_test::{HitTester, NavigationLevel};
use crate::input::{EventDisposition, InputEvent, Key, Modifiers};
use crate::overlay::{FrameReport, OverlayKind, OverlayRenderer};
use crate::selection::{SelectionSet, sibling_group};
use serde::{Deserialize, Serialize};

/// Receives the outcome of a picker session: `Some` on confirm, `None` on cancel
pub type PickCallback = Box<dyn FnOnce(Option<PickResult>)>;

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerState {
    Idle,
    Active,
}

/// What the user picked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickResult {
    /// Selected nodes in selection order
    pub nodes: Vec<NodeId>,
    pub is_multiple: bool,
    /// Structural selector of the first selected node
    pub selector: Option<String>,
    /// Where harvesting should scroll
    pub scroll_target: Option<ScrollTarget>,
    /// Union of the selected nodes' rectangles
    pub bounding_rect: Option<BoundingBox>,
}

/// On-screen details about the node under the pointer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoReadout {
    pub tag: String,
    pub width: f64,
    pub height: f64,
    /// Structural siblings of the node, excluding itself
    pub sibling_count: usize,
    /// Block-level containers inside the node
    pub container_count: usize,
    pub level: i32,
}

/// Interactive element picker
pub struct PickerController {
    config: PickerConfig,
    hit_tester: HitTester,
    state: PickerState,
    level: NavigationLevel,
    selection: SelectionSet,
    overlay: OverlayRenderer,
    callback: Option<PickCallback>,
    /// Node under the pointer before the level offset
    raw: Option<NodeId>,
    /// Node under the pointer after the level offset
    current: Option<NodeId>,
    readout: Option<InfoReadout>,
}

impl std::fmt::Debug for PickerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickerController")
            .field("state", &self.state)
            .field("level", &self.level)
            .field("selection", &self.selection)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl Default for PickerController {
    fn default() -> Self {
        Self::new(PickerConfig::default())
    }
}

impl PickerController {
    pub fn new(config: PickerConfig) -> Self {
        let hit_tester = HitTester::new(config.hit_test.clone());
        Self {
            config,
            hit_tester,
            state: PickerState::Idle,
            level: NavigationLevel::default(),
            selection: SelectionSet::new(),
            overlay: OverlayRenderer::new(),
            callback: None,
            raw: None,
            current: None,
            readout: None,
        }
    }

    /// Begin a session. Returns `false` (and drops `callback`) if one is already running.
    pub fn start(&mut self, callback: impl FnOnce(Option<PickResult>) + 'static) -> bool {
        if self.state == PickerState::Active {
            log::debug!("Picker already active, ignoring start");
            return false;
        }

        self.level.reset();
        self.selection.clear();
        self.raw = None;
        self.current = None;
        self.readout = None;
        self.overlay.activate();
        self.callback = Some(Box::new(callback));
        self.state = PickerState::Active;
        log::info!("Picker started");
        true
    }

    /// Tear the session down without reporting anything
    pub fn stop(&mut self) {
        if self.state == PickerState::Idle {
            return;
        }
        self.overlay.deactivate();
        self.callback = None;
        self.raw = None;
        self.current = None;
        self.readout = None;
        self.state = PickerState::Idle;
        log::info!("Picker stopped");
    }

    /// Stop and report `None`
    pub fn cancel(&mut self) {
        if self.state == PickerState::Idle {
            return;
        }
        let callback = self.callback.take();
        self.stop();
        if let Some(callback) = callback {
            callback(None);
        }
    }

    /// Stop and report the selection. Returns `false` when there is nothing to
    /// confirm, in which case the session keeps running.
    pub fn confirm(&mut self, tree: &DomTree) -> bool {
        if self.state == PickerState::Idle {
            return false;
        }
        self.selection.retain_attached(tree);
        let Some(result) = self.build_result(tree) else {
            log::debug!("Confirm with empty selection ignored");
            return false;
        };

        let callback = self.callback.take();
        self.stop();
        log::info!("Picked {} node(s)", result.nodes.len());
        if let Some(callback) = callback {
            callback(Some(result));
        }
        true
    }

    pub fn is_active(&self) -> bool {
        self.state == PickerState::Active
    }

    pub fn state(&self) -> PickerState {
        self.state
    }

    pub fn level(&self) -> i32 {
        self.level.get()
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn overlay(&self) -> &OverlayRenderer {
        &self.overlay
    }

    /// Node currently under the pointer, after the level offset
    pub fn current(&self) -> Option<NodeId> {
        self.current
    }

    pub fn readout(&self) -> Option<&InfoReadout> {
        self.readout.as_ref()
    }

    /// Route one host input event. Everything passes through while idle.
    pub fn handle_event(&mut self, tree: &DomTree, event: InputEvent) -> EventDisposition {
        if self.state == PickerState::Idle {
            return EventDisposition::PassThrough;
        }

        match event {
            InputEvent::PointerMove { x, y } => {
                self.hover_at(tree, x, y);
                EventDisposition::Consumed
            }
            InputEvent::PointerDown { x, y, modifiers } => {
                self.hover_at(tree, x, y);
                self.press(modifiers);
                EventDisposition::Consumed
            }
            InputEvent::Key { key, .. } => self.key(tree, key),
            InputEvent::Wheel { delta_y, modifiers, .. } => {
                if !modifiers.is_held() {
                    return EventDisposition::PassThrough;
                }
                if delta_y < 0.0 {
                    self.step_level(tree, 1);
                } else if delta_y > 0.0 {
                    self.step_level(tree, -1);
                }
                EventDisposition::Consumed
            }
        }
    }

    /// Per-frame hook: keep overlays glued to their nodes and drop selected
    /// nodes that left the document.
    pub fn on_frame(&mut self, tree: &DomTree) -> FrameReport {
        if self.state == PickerState::Idle {
            return FrameReport::default();
        }

        let report = self.overlay.on_frame(tree);
        let dropped = self.selection.retain_attached(tree);
        for node in &dropped {
            self.overlay.remove_overlay(*node);
        }
        if !dropped.is_empty() {
            log::debug!("Dropped {} detached node(s) from the selection", dropped.len());
        }

        if self.current.is_some_and(|n| !tree.is_attached(n)) {
            self.raw = None;
            self.current = None;
            self.readout = None;
        }
        report
    }

    fn key(&mut self, tree: &DomTree, key: Key) -> EventDisposition {
        let keys = self.config.keys;
        if key == keys.cancel {
            self.cancel();
        } else if key == keys.accept {
            self.confirm(tree);
        } else if key == keys.level_up {
            self.step_level(tree, 1);
        } else if key == keys.level_down {
            self.step_level(tree, -1);
        } else if key == keys.select_siblings {
            self.select_siblings(tree);
        } else {
            return EventDisposition::PassThrough;
        }
        EventDisposition::Consumed
    }

    fn hover_at(&mut self, tree: &DomTree, x: f64, y: f64) {
        match self.hit_tester.resolve_with_level(tree, x, y, self.level) {
            Some((raw, resolved)) => {
                self.raw = Some(raw);
                self.set_current(tree, resolved);
            }
            None => {
                self.raw = None;
                self.current = None;
                self.readout = None;
                self.overlay.hide_hover();
            }
        }
    }

    /// Change the level and re-resolve from the raw node right away
    fn step_level(&mut self, tree: &DomTree, delta: i32) {
        if !self.level.adjust(delta) {
            return;
        }
        log::debug!("Picker level {}", self.level.get());

        let Some(raw) = self.raw else { return };
        match self.hit_tester.apply_level_offset(tree, raw, self.level) {
            Some(resolved) => self.set_current(tree, resolved),
            None => {
                self.raw = None;
                self.current = None;
                self.readout = None;
                self.overlay.hide_hover();
            }
        }
    }

    fn set_current(&mut self, tree: &DomTree, node: NodeId) {
        self.current = Some(node);
        self.overlay.show_hover(node);
        self.readout = self.describe(tree, node);
    }

    fn describe(&self, tree: &DomTree, node: NodeId) -> Option<InfoReadout> {
        let element = tree.get(node)?;
        let rect = geometry::viewport_rect(tree, node).unwrap_or_default();
        let siblings = sibling_group(tree, node, self.config.sibling_policy.as_ref()).len();
        let container_count = tree
            .descendants(node)
            .into_iter()
            .filter(|n| tree.get(*n).is_some_and(|e| e.is_block()))
            .count();

        Some(InfoReadout {
            tag: element.tag_name.clone(),
            width: rect.width,
            height: rect.height,
            sibling_count: siblings.saturating_sub(1),
            container_count,
            level: self.level.get(),
        })
    }

    fn press(&mut self, modifiers: Modifiers) {
        let Some(node) = self.current else { return };

        if modifiers.is_held() {
            if self.selection.toggle(node) {
                self.overlay.create_overlay(node, OverlayKind::Selected);
            } else {
                self.overlay.remove_overlay(node);
            }
        } else {
            self.selection.clear();
            self.overlay.clear_all();
            self.selection.add(node);
            self.overlay.create_overlay(node, OverlayKind::Selected);
        }
    }

    fn select_siblings(&mut self, tree: &DomTree) {
        let Some(anchor) = self.current else { return };
        let added = self
            .selection
            .select_sibling_group(tree, anchor, self.config.sibling_policy.as_ref());
        for node in &added {
            let kind = if *node == anchor { OverlayKind::Selected } else { OverlayKind::SiblingGroup };
            self.overlay.create_overlay(*node, kind);
        }
        log::debug!("Sibling group added {} node(s)", added.len());
    }

    fn build_result(&self, tree: &DomTree) -> Option<PickResult> {
        let first = self.selection.first()?;
        let nodes = self.selection.to_vec();

        let selector = structural_selector(tree, first);
        let bounding_rect = nodes
            .iter()
            .filter_map(|n| geometry::viewport_rect(tree, *n))
            .reduce(|acc, rect| acc.union(&rect));

        Some(PickResult {
            is_multiple: nodes.len() > 1,
            scroll_target: geometry::resolve_scroll_target(tree, first),
            selector,
            bounding_rect,
            nodes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementNode, Overflow, ScrollMetrics};
    use crate::hit_test::{LEVEL_MAX, LEVEL_MIN};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Outcome = Rc<RefCell<Vec<Option<PickResult>>>>;

    /// body > ul.feed (scrollable) > 4 × li.row, each 100px tall
    fn feed() -> (DomTree, NodeId, Vec<NodeId>) {
        let mut tree = DomTree::new(1000.0, 800.0);
        let body = tree.body();
        let list = tree
            .append(
                body,
                ElementNode::new("ul")
                    .with_attribute("class", "feed")
                    .with_bounding_box(0.0, 0.0, 600.0, 400.0)
                    .with_overflow(Overflow::Auto)
                    .with_scroll(ScrollMetrics { scroll_height: 1200.0, client_height: 400.0, ..Default::default() }),
            )
            .unwrap();
        let items = (0..4)
            .map(|i| {
                tree.append(
                    list,
                    ElementNode::new("li")
                        .with_attribute("class", "row")
                        .with_bounding_box(0.0, i as f64 * 100.0, 600.0, 100.0)
                        .with_text(format!("item {}", i)),
                )
                .unwrap()
            })
            .collect();
        (tree, list, items)
    }

    fn started() -> (PickerController, Outcome) {
        let outcome: Outcome = Rc::default();
        let mut picker = PickerController::default();
        let sink = outcome.clone();
        assert!(picker.start(move |result| sink.borrow_mut().push(result)));
        (picker, outcome)
    }

    fn key(key: Key) -> InputEvent {
        InputEvent::Key { key, modifiers: Modifiers::NONE }
    }

    #[test]
    fn test_start_is_idempotent() {
        let (mut picker, outcome) = started();
        let loop_id = picker.overlay().frame_loop().unwrap().id();

        let second: Outcome = Rc::default();
        let sink = second.clone();
        assert!(!picker.start(move |r| sink.borrow_mut().push(r)));
        assert_eq!(picker.overlay().frame_loop().unwrap().id(), loop_id);

        picker.cancel();
        assert_eq!(outcome.borrow().len(), 1);
        assert!(second.borrow().is_empty());
    }

    #[test]
    fn test_events_pass_through_while_idle() {
        let (tree, _, _) = feed();
        let mut picker = PickerController::default();
        let event = InputEvent::PointerMove { x: 10.0, y: 10.0 };
        assert_eq!(picker.handle_event(&tree, event), EventDisposition::PassThrough);
        assert_eq!(picker.handle_event(&tree, key(Key::Escape)), EventDisposition::PassThrough);
    }

    #[test]
    fn test_hover_updates_overlay_and_readout() {
        let (tree, list, items) = feed();
        let (mut picker, _) = started();

        picker.handle_event(&tree, InputEvent::PointerMove { x: 50.0, y: 150.0 });
        assert_eq!(picker.current(), Some(items[1]));
        assert_eq!(picker.overlay().hover().unwrap().node, items[1]);

        let readout = picker.readout().unwrap();
        assert_eq!(readout.tag, "li");
        assert_eq!(readout.sibling_count, 3);
        assert_eq!(readout.height, 100.0);

        picker.handle_event(&tree, key(Key::ArrowUp));
        assert_eq!(picker.current(), Some(list));
        let readout = picker.readout().unwrap();
        assert_eq!(readout.container_count, 4);
        assert_eq!(readout.level, 1);
    }

    #[test]
    fn test_level_is_clamped() {
        let (tree, _, _) = feed();
        let (mut picker, _) = started();

        for _ in 0..50 {
            picker.handle_event(&tree, key(Key::ArrowUp));
        }
        assert_eq!(picker.level(), LEVEL_MAX);

        let wheel_down = InputEvent::Wheel { x: 0.0, y: 0.0, delta_y: 120.0, modifiers: Modifiers::CTRL };
        for _ in 0..50 {
            picker.handle_event(&tree, wheel_down);
        }
        assert_eq!(picker.level(), LEVEL_MIN);
    }

    #[test]
    fn test_level_resets_on_restart() {
        let (tree, _, _) = feed();
        let (mut picker, _) = started();
        picker.handle_event(&tree, key(Key::ArrowUp));
        picker.stop();

        picker.start(|_| {});
        assert_eq!(picker.level(), 0);
    }

    #[test]
    fn test_wheel_without_modifier_scrolls_page() {
        let (tree, _, _) = feed();
        let (mut picker, _) = started();
        let plain = InputEvent::Wheel { x: 0.0, y: 0.0, delta_y: -120.0, modifiers: Modifiers::NONE };
        assert_eq!(picker.handle_event(&tree, plain), EventDisposition::PassThrough);
        assert_eq!(picker.level(), 0);

        let held = InputEvent::Wheel { x: 0.0, y: 0.0, delta_y: -120.0, modifiers: Modifiers::SHIFT };
        assert_eq!(picker.handle_event(&tree, held), EventDisposition::Consumed);
        assert_eq!(picker.level(), 1);
    }

    #[test]
    fn test_click_replaces_and_modifier_click_toggles() {
        let (tree, _, items) = feed();
        let (mut picker, _) = started();

        picker.handle_event(&tree, InputEvent::PointerDown { x: 5.0, y: 50.0, modifiers: Modifiers::NONE });
        picker.handle_event(&tree, InputEvent::PointerDown { x: 5.0, y: 250.0, modifiers: Modifiers::NONE });
        assert_eq!(picker.selection().to_vec(), vec![items[2]]);

        picker.handle_event(&tree, InputEvent::PointerDown { x: 5.0, y: 350.0, modifiers: Modifiers::CTRL });
        assert_eq!(picker.selection().to_vec(), vec![items[2], items[3]]);
        assert_eq!(picker.overlay().len(), 2);

        picker.handle_event(&tree, InputEvent::PointerDown { x: 5.0, y: 250.0, modifiers: Modifiers::CTRL });
        assert_eq!(picker.selection().to_vec(), vec![items[3]]);
        assert_eq!(picker.overlay().len(), 1);
    }

    #[test]
    fn test_sibling_key_selects_group_once() {
        let (tree, _, items) = feed();
        let (mut picker, _) = started();

        picker.handle_event(&tree, InputEvent::PointerMove { x: 5.0, y: 150.0 });
        picker.handle_event(&tree, key(Key::Char('s')));
        picker.handle_event(&tree, key(Key::Char('s')));

        assert_eq!(picker.selection().to_vec(), items);
        assert_eq!(picker.overlay().len(), 4);
        assert_eq!(picker.overlay().region(items[1]).unwrap().kind, OverlayKind::Selected);
        assert_eq!(picker.overlay().region(items[0]).unwrap().kind, OverlayKind::SiblingGroup);
    }

    #[test]
    fn test_confirm_with_empty_selection_is_noop() {
        let (tree, _, _) = feed();
        let (mut picker, outcome) = started();

        assert_eq!(picker.handle_event(&tree, key(Key::Enter)), EventDisposition::Consumed);
        assert!(picker.is_active());
        assert!(outcome.borrow().is_empty());
    }

    #[test]
    fn test_confirm_reports_selection() {
        let (tree, list, items) = feed();
        let (mut picker, outcome) = started();

        picker.handle_event(&tree, InputEvent::PointerMove { x: 5.0, y: 50.0 });
        picker.handle_event(&tree, key(Key::Char('s')));
        picker.handle_event(&tree, key(Key::Enter));

        assert!(!picker.is_active());
        assert!(!picker.overlay().is_active());
        let results = outcome.borrow();
        let result = results[0].as_ref().unwrap();
        assert!(result.is_multiple);
        assert_eq!(result.nodes, items);
        assert_eq!(result.scroll_target, Some(ScrollTarget::Node(list)));
        assert_eq!(result.bounding_rect, Some(BoundingBox::new(0.0, 0.0, 600.0, 400.0)));
        assert_eq!(result.selector.as_deref(), Some("body > ul.feed > li.row:nth-child(1)"));
    }

    #[test]
    fn test_cancel_calls_back_with_none() {
        let (tree, _, _) = feed();
        let (mut picker, outcome) = started();
        picker.handle_event(&tree, InputEvent::PointerDown { x: 5.0, y: 50.0, modifiers: Modifiers::NONE });

        assert_eq!(picker.handle_event(&tree, key(Key::Escape)), EventDisposition::Consumed);
        assert_eq!(*outcome.borrow(), vec![None]);
        assert!(!picker.is_active());

        // A second cancel has no session to report on
        picker.cancel();
        assert_eq!(outcome.borrow().len(), 1);
    }

    #[test]
    fn test_stop_never_calls_back() {
        let (mut picker, outcome) = started();
        picker.stop();
        picker.stop();
        assert!(outcome.borrow().is_empty());
    }

    #[test]
    fn test_unbound_keys_pass_through() {
        let (tree, _, _) = feed();
        let (mut picker, _) = started();
        assert_eq!(picker.handle_event(&tree, key(Key::Char('x'))), EventDisposition::PassThrough);
    }

    #[test]
    fn test_frame_heals_selection() {
        let (mut tree, _, items) = feed();
        let (mut picker, outcome) = started();
        picker.handle_event(&tree, InputEvent::PointerMove { x: 5.0, y: 50.0 });
        picker.handle_event(&tree, key(Key::Char('s')));

        tree.detach(items[0]);
        tree.detach(items[2]);
        let report = picker.on_frame(&tree);

        assert_eq!(report.detached, vec![items[0], items[2]]);
        assert!(report.hover_lost);
        assert_eq!(picker.selection().to_vec(), vec![items[1], items[3]]);
        assert_eq!(picker.current(), None);

        picker.confirm(&tree);
        assert_eq!(outcome.borrow()[0].as_ref().unwrap().nodes, vec![items[1], items[3]]);
    }
}
