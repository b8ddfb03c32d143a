use region_picker::bridge::{PickerBridge, PickerMessage, PickerRequest};
use region_picker::dom::{DomTree, PageSnapshot};
use region_picker::geometry::{self, ScrollTarget};
use region_picker::input::{InputEvent, Key, Modifiers};
use serde_json::json;
use tokio_util::sync::CancellationToken;

/// A chat-style page: fixed header, scrolling message list in <main>, sidebar
fn chat_page() -> DomTree {
    let message = |i: u32| {
        json!({
            "tag": "div",
            "attributes": {"class": "msg bubble"},
            "text": format!("  message   {}\u{200B} ", i),
            "rect": {"x": 200.0, "y": 60.0 + i as f64 * 80.0, "width": 600.0, "height": 80.0}
        })
    };

    let snapshot = json!({
        "width": 1000.0,
        "height": 700.0,
        "root": {
            "tag": "HTML",
            "scroll": {"scrollHeight": 700.0, "clientHeight": 700.0, "scrollWidth": 1000.0, "clientWidth": 1000.0},
            "children": [
                {"tag": "head", "children": [{"tag": "style"}]},
                {
                    "tag": "body",
                    "rect": {"x": 0.0, "y": 0.0, "width": 1000.0, "height": 700.0},
                    "children": [
                        {
                            "tag": "header",
                            "rect": {"x": 0.0, "y": 0.0, "width": 1000.0, "height": 60.0},
                            "zIndex": 10,
                            "text": "Chat"
                        },
                        {
                            "tag": "aside",
                            "rect": {"x": 0.0, "y": 60.0, "width": 200.0, "height": 640.0},
                            "text": "Contacts"
                        },
                        {
                            "tag": "main",
                            "attributes": {"id": "messages"},
                            "rect": {"x": 200.0, "y": 60.0, "width": 600.0, "height": 640.0},
                            "overflowY": "auto",
                            "scroll": {"scrollHeight": 2400.0, "clientHeight": 640.0, "scrollWidth": 600.0, "clientWidth": 600.0},
                            "children": (0..6).map(message).collect::<Vec<_>>()
                        },
                        {
                            "tag": "div",
                            "attributes": {"data-region-picker": "toolbar"},
                            "rect": {"x": 800.0, "y": 60.0, "width": 200.0, "height": 100.0},
                            "zIndex": 9999
                        }
                    ]
                }
            ]
        }
    });

    let snapshot: PageSnapshot = serde_json::from_value(snapshot).unwrap();
    DomTree::from_snapshot(snapshot).unwrap()
}

fn press(key: Key) -> InputEvent {
    InputEvent::Key { key, modifiers: Modifiers::NONE }
}

#[test]
fn test_semantic_container_detection() {
    let tree = chat_page();
    let target = geometry::find_scrollable_container(&tree).unwrap();
    let ScrollTarget::Node(node) = target else { panic!("expected an element target") };
    assert_eq!(tree.get(node).unwrap().id().map(String::as_str), Some("messages"));
}

#[tokio::test(start_paused = true)]
async fn test_pick_sibling_group_and_harvest() {
    let mut tree = chat_page();
    let mut bridge = PickerBridge::default();
    assert!(bridge.handle_json(r#"{"action":"START_PICKER"}"#).unwrap());

    // Only the picker toolbar and the page root sit here; neither is pickable
    bridge.handle_input(&tree, InputEvent::PointerMove { x: 900.0, y: 100.0 });
    assert_eq!(bridge.picker().current(), None);

    bridge.handle_input(&tree, InputEvent::PointerMove { x: 300.0, y: 150.0 });
    let readout = bridge.picker().readout().unwrap().clone();
    assert_eq!(readout.tag, "div");
    assert_eq!(readout.sibling_count, 5);

    bridge.handle_input(&tree, press(Key::Char('s')));
    bridge.on_frame(&tree);
    assert_eq!(bridge.picker().selection().len(), 6);
    bridge.handle_input(&tree, press(Key::Enter));

    let outcome = bridge.take_outcome().expect("picker reported");
    let reply = bridge.complete(&mut tree, outcome, CancellationToken::new()).await.unwrap();

    let PickerMessage::Picked(payload) = reply else { panic!("expected a pick") };
    assert_eq!(payload.node_count, 6);
    assert!(payload.is_scrollable);
    assert_eq!(payload.content.lines().count(), 6);
    assert_eq!(payload.content.lines().next(), Some("message 0"));
    let rect = payload.bounding_rect.unwrap();
    assert_eq!((rect.y, rect.height), (60.0, 480.0));
}

#[tokio::test(start_paused = true)]
async fn test_escape_round_trip() {
    let mut tree = chat_page();
    let mut bridge = PickerBridge::default();
    bridge.handle_request(PickerRequest::StartPicker);

    bridge.handle_input(&tree, InputEvent::PointerDown { x: 300.0, y: 150.0, modifiers: Modifiers::NONE });
    bridge.handle_input(&tree, press(Key::Escape));

    let outcome = bridge.take_outcome().unwrap();
    let reply = bridge.complete(&mut tree, outcome, CancellationToken::new()).await.unwrap();
    assert_eq!(serde_json::to_value(&reply).unwrap(), json!({"action": "CANCELLED"}));
    assert!(!bridge.picker().is_active());
}
