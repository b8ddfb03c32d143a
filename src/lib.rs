//! # region-picker
//!
//! Interactive region picking for rendered documents: hover a node, walk up or
//! down the tree, select it (or all of its structural siblings), then scroll the
//! containing region to its end so lazily loaded content is captured.
//!
//! ## Features
//!
//! - **Hit-testing with level navigation**: resolve the node under the pointer,
//!   skip non-visual and picker-owned nodes, and shift the pick by ±N levels
//! - **Selection**: multi-select with sibling-group matching through a pluggable policy
//! - **Overlays**: frame-synced highlight regions, rasterized onto screenshots
//! - **Scroll harvesting**: growth-aware scroll-to-end with timeout and cancel,
//!   followed by text cleanup
//! - **Chrome integration**: page snapshots and live scroll surfaces over CDP
//! - **MCP server**: the same operations as tools for AI agents
//!
//! ## Picking against a document model
//!
//! ```rust
//! use region_picker::dom::{DomTree, ElementNode};
//! use region_picker::input::{InputEvent, Key, Modifiers};
//! use region_picker::picker::PickerController;
//! use std::{cell::RefCell, rc::Rc};
//!
//! let mut tree = DomTree::new(800.0, 600.0);
//! let body = tree.body();
//! let list = tree.append(body, ElementNode::new("ul").with_bounding_box(0.0, 0.0, 800.0, 300.0)).unwrap();
//! for i in 0..3 {
//!     let row = ElementNode::new("li").with_attribute("class", "row").with_bounding_box(0.0, i as f64 * 100.0, 800.0, 100.0);
//!     tree.append(list, row);
//! }
//!
//! let picked = Rc::new(RefCell::new(None));
//! let sink = picked.clone();
//! let mut picker = PickerController::default();
//! picker.start(move |result| *sink.borrow_mut() = result);
//!
//! picker.handle_event(&tree, InputEvent::PointerMove { x: 10.0, y: 150.0 });
//! picker.handle_event(&tree, InputEvent::Key { key: Key::Char('s'), modifiers: Modifiers::NONE });
//! picker.handle_event(&tree, InputEvent::Key { key: Key::Enter, modifiers: Modifiers::NONE });
//!
//! assert_eq!(picked.borrow().as_ref().unwrap().nodes.len(), 3);
//! ```
//!
//! ## Harvesting a live page
//!
//! ```rust,no_run
//! use region_picker::{BrowserSession, LaunchOptions};
//! use serde_json::json;
//!
//! # fn main() -> region_picker::Result<()> {
//! let session = BrowserSession::launch(LaunchOptions::default())?;
//! let result = session.execute_tool("harvest", json!({"url": "https://example.com/feed"}))?;
//! println!("{}", result.data.unwrap()["content"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`dom`]: document model with weak node handles, page snapshots
//! - [`geometry`]: scrollability, viewport rectangles, scroll container discovery
//! - [`hit_test`]: pointer hit-testing and level navigation
//! - [`selection`]: selection set and sibling policies
//! - [`overlay`]: highlight regions and the frame loop
//! - [`picker`]: the picker controller
//! - [`harvest`]: scroll harvester and text cleanup
//! - [`bridge`]: host/page messages
//! - [`browser`]: Chrome session, live scroll surfaces
//! - [`tools`]: tool registry used by the CLI and MCP server
//! - [`mcp`]: MCP server (requires the `mcp-handler` feature)

pub mod bridge;
pub mod browser;
pub mod dom;
pub mod error;
pub mod geometry;
pub mod harvest;
pub mod input;
pub mod overlay;
pub mod picker;
pub mod selection;
pub mod tools;

#[cfg(feature = "mcp-handler")]
pub mod mcp;

pub use bridge::{PickerBridge, PickerMessage, PickerRequest};
pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions};
pub use dom::{BoundingBox, DomTree, ElementNode, NodeId};
pub use error::{PickerError, Result};
pub use harvest::{HarvestOptions, HarvestReport, ScrollSurface, clean_text, scroll_and_settle};
pub use picker::{PickResult, PickerConfig, PickerController};
pub use tools::{Tool, ToolContext, ToolRegistry, ToolResult};

#[cfg(feature = "mcp-handler")]
pub use mcp::BrowserServer;
#[cfg(feature = "mcp-handler")]
pub use rmcp::ServiceExt;
