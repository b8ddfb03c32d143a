//! Cross-context messaging between a host UI and the picker running in the page.
//!
//! The host sends [`PickerRequest::StartPicker`]; once the user confirms, the page
//! harvests the picked region and answers with [`PickerMessage::Picked`], or with
//! [`PickerMessage::Cancelled`] when the user backs out.

use crate::dom::{BoundingBox, DomTree};
use crate::error::{PickerError, Result};
use crate::harvest::{self, DocumentSurface, HarvestCancelKey, HarvestOptions, clean_text};
use crate::input::{EventDisposition, InputEvent};
use crate::picker::{PickResult, PickerConfig, PickerController};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Extra time granted on top of the harvest budget before a reply counts as lost
const REPLY_GRACE: Duration = Duration::from_secs(5);

/// Host → page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PickerRequest {
    StartPicker,
}

/// Page → host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PickerMessage {
    Picked(PickedPayload),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickedPayload {
    pub selector: Option<String>,
    pub is_scrollable: bool,
    /// Cleaned text of the picked nodes, collected after harvesting
    pub content: String,
    pub node_count: usize,
    pub bounding_rect: Option<BoundingBox>,
}

type OutcomeSlot = Rc<RefCell<Option<Option<PickResult>>>>;

/// Page-side endpoint: owns the picker and turns its outcome into a reply
#[derive(Debug)]
pub struct PickerBridge {
    picker: PickerController,
    outcome: OutcomeSlot,
    options: HarvestOptions,
}

impl Default for PickerBridge {
    fn default() -> Self {
        Self::new(PickerConfig::default(), HarvestOptions::default())
    }
}

impl PickerBridge {
    pub fn new(config: PickerConfig, options: HarvestOptions) -> Self {
        Self {
            picker: PickerController::new(config),
            outcome: Rc::default(),
            options,
        }
    }

    pub fn picker(&self) -> &PickerController {
        &self.picker
    }

    pub fn harvest_options(&self) -> &HarvestOptions {
        &self.options
    }

    /// Handle a host request. Returns whether a new picker session started.
    pub fn handle_request(&mut self, request: PickerRequest) -> bool {
        match request {
            PickerRequest::StartPicker => {
                let slot = self.outcome.clone();
                self.picker.start(move |result| {
                    *slot.borrow_mut() = Some(result);
                })
            }
        }
    }

    /// Same as [`handle_request`](Self::handle_request) for a raw JSON message
    pub fn handle_json(&mut self, raw: &str) -> Result<bool> {
        let request: PickerRequest = serde_json::from_str(raw)?;
        Ok(self.handle_request(request))
    }

    /// Forward a page input event to the picker
    pub fn handle_input(&mut self, tree: &DomTree, event: InputEvent) -> EventDisposition {
        self.picker.handle_event(tree, event)
    }

    /// Forward a frame callback to the picker
    pub fn on_frame(&mut self, tree: &DomTree) {
        self.picker.on_frame(tree);
    }

    /// The picker's outcome, once it has reported: `Some(None)` for a cancel
    pub fn take_outcome(&mut self) -> Option<Option<PickResult>> {
        self.outcome.borrow_mut().take()
    }

    /// A cancel key wired to a fresh token, for the next [`complete`](Self::complete)
    pub fn harvest_cancel_key(&self) -> HarvestCancelKey {
        HarvestCancelKey::new(CancellationToken::new())
    }

    /// Build the reply for a picker outcome. A confirmed pick harvests its
    /// scroll target first; cancelling that harvest still yields a `Picked`
    /// reply carrying whatever was loaded so far.
    pub async fn complete(
        &self,
        tree: &mut DomTree,
        outcome: Option<PickResult>,
        cancel: CancellationToken,
    ) -> Result<PickerMessage> {
        let Some(result) = outcome else {
            return Ok(PickerMessage::Cancelled);
        };

        let limit = self.options.max_duration() + REPLY_GRACE;
        match tokio::time::timeout(limit, self.harvest(tree, &result, cancel)).await {
            Ok(content) => {
                let content = content?;
                Ok(PickerMessage::Picked(PickedPayload {
                    selector: result.selector,
                    is_scrollable: result.scroll_target.is_some(),
                    content,
                    node_count: result.nodes.len(),
                    bounding_rect: result.bounding_rect,
                }))
            }
            Err(_) => Err(PickerError::Timeout {
                what: "harvest reply".to_string(),
                millis: limit.as_millis() as u64,
            }),
        }
    }

    async fn harvest(&self, tree: &mut DomTree, result: &PickResult, cancel: CancellationToken) -> Result<String> {
        if let Some(target) = result.scroll_target {
            let mut surface = DocumentSurface::new(tree, target);
            let report = harvest::scroll_and_settle(&mut surface, &self.options, cancel).await?;
            log::info!("Harvest ended {:?} at {:.1}%", report.end, report.coverage_percent);
        }

        let raw = result
            .nodes
            .iter()
            .filter(|n| tree.is_attached(**n))
            .map(|n| tree.inner_text(*n))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(clean_text(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementNode, NodeId, Overflow, ScrollMetrics};
    use crate::input::{Key, Modifiers};

    fn page() -> (DomTree, NodeId) {
        let mut tree = DomTree::new(1000.0, 800.0);
        let body = tree.body();
        let list = tree
            .append(
                body,
                ElementNode::new("ol")
                    .with_attribute("id", "thread")
                    .with_bounding_box(0.0, 0.0, 500.0, 300.0)
                    .with_overflow(Overflow::Scroll)
                    .with_scroll(ScrollMetrics { scroll_height: 3000.0, client_height: 300.0, ..Default::default() }),
            )
            .unwrap();
        for i in 0..3 {
            tree.append(
                list,
                ElementNode::new("li")
                    .with_bounding_box(0.0, i as f64 * 50.0, 500.0, 50.0)
                    .with_text(format!("message\u{200B}  {}", i)),
            )
            .unwrap();
        }
        (tree, list)
    }

    #[test]
    fn test_message_wire_format() {
        let request: PickerRequest = serde_json::from_str(r#"{"action":"START_PICKER"}"#).unwrap();
        assert_eq!(request, PickerRequest::StartPicker);
        assert_eq!(serde_json::to_string(&PickerMessage::Cancelled).unwrap(), r#"{"action":"CANCELLED"}"#);

        let picked = PickerMessage::Picked(PickedPayload {
            selector: Some("#thread".to_string()),
            is_scrollable: true,
            content: "hi".to_string(),
            node_count: 1,
            bounding_rect: None,
        });
        let value = serde_json::to_value(&picked).unwrap();
        assert_eq!(value["action"], "PICKED");
        assert_eq!(value["isScrollable"], true);
        assert_eq!(value["nodeCount"], 1);
    }

    #[test]
    fn test_unknown_request_is_rejected() {
        let mut bridge = PickerBridge::default();
        assert!(matches!(
            bridge.handle_json(r#"{"action":"EXPLODE"}"#),
            Err(PickerError::Serialization(_))
        ));
        assert!(bridge.handle_json(r#"{"action":"START_PICKER"}"#).unwrap());
        assert!(!bridge.handle_json(r#"{"action":"START_PICKER"}"#).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_pick_replies_cancelled() {
        let (mut tree, _) = page();
        let mut bridge = PickerBridge::default();
        bridge.handle_request(PickerRequest::StartPicker);
        bridge.handle_input(&tree, InputEvent::Key { key: Key::Escape, modifiers: Modifiers::NONE });

        let outcome = bridge.take_outcome().unwrap();
        let reply = bridge.complete(&mut tree, outcome, CancellationToken::new()).await.unwrap();
        assert_eq!(reply, PickerMessage::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_picked_harvests_scroll_target() {
        let (mut tree, list) = page();
        let mut bridge = PickerBridge::default();
        bridge.handle_request(PickerRequest::StartPicker);
        bridge.handle_input(&tree, InputEvent::PointerMove { x: 10.0, y: 10.0 });
        bridge.handle_input(&tree, InputEvent::Key { key: Key::ArrowUp, modifiers: Modifiers::NONE });
        bridge.handle_input(&tree, InputEvent::PointerDown { x: 10.0, y: 10.0, modifiers: Modifiers::NONE });
        bridge.handle_input(&tree, InputEvent::Key { key: Key::Enter, modifiers: Modifiers::NONE });

        let outcome = bridge.take_outcome().unwrap();
        let reply = bridge.complete(&mut tree, outcome, CancellationToken::new()).await.unwrap();

        let PickerMessage::Picked(payload) = reply else { panic!("expected a pick") };
        assert_eq!(payload.selector.as_deref(), Some("#thread"));
        assert!(payload.is_scrollable);
        assert_eq!(payload.node_count, 1);
        assert_eq!(payload.content, "message 0\nmessage 1\nmessage 2");
        assert_eq!(tree.get(list).unwrap().scroll.scroll_top, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_harvest_cancel_never_fires_picker_callback() {
        let (mut tree, _) = page();
        let mut bridge = PickerBridge::new(PickerConfig::default(), HarvestOptions::new().step_distance(50.0));
        bridge.handle_request(PickerRequest::StartPicker);
        bridge.handle_input(&tree, InputEvent::PointerDown { x: 10.0, y: 60.0, modifiers: Modifiers::NONE });
        bridge.handle_input(&tree, InputEvent::Key { key: Key::Enter, modifiers: Modifiers::NONE });
        let outcome = bridge.take_outcome().unwrap();
        assert!(outcome.is_some());

        let cancel_key = bridge.harvest_cancel_key();
        let token = cancel_key.token().clone();
        let canceller = async {
            tokio::time::sleep(Duration::from_millis(450)).await;
            assert!(cancel_key.handle_key(Key::Escape));
        };
        let (reply, _) = tokio::join!(bridge.complete(&mut tree, outcome, token), canceller);
        assert!(matches!(reply.unwrap(), PickerMessage::Picked(_)));

        // The picker already reported; the cancel key reaches nobody else
        let disposition =
            bridge.handle_input(&tree, InputEvent::Key { key: Key::Escape, modifiers: Modifiers::NONE });
        assert_eq!(disposition, EventDisposition::PassThrough);
        assert!(bridge.take_outcome().is_none());
    }
}
