use crate::dom::{DomTree, structural_selector};
use crate::error::{PickerError, Result};
use crate::input::{InputEvent, Key, Modifiers};
use crate::picker::{InfoReadout, PickerController};
use crate::tools::utils::open_if_requested;
use crate::tools::{Tool, ToolContext, ToolResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageOutputFormat};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Parameters for the highlight tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct HighlightParams {
    /// Page to open first; the current page when omitted
    #[serde(default)]
    pub url: Option<String>,

    /// Viewport x coordinate in CSS pixels
    pub x: f64,

    /// Viewport y coordinate in CSS pixels
    pub y: f64,

    /// Ancestor (+) or descendant (-) steps from the node under the point
    #[serde(default)]
    pub level: i32,

    /// Also highlight the node's structural siblings
    #[serde(default)]
    pub siblings: bool,
}

/// What the picker would show for a pointer position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub selector: Option<String>,
    pub readout: InfoReadout,
    pub highlighted: usize,
}

/// Replay a pointer position (plus level and sibling keys) through a picker
/// session and return the picker with its overlays synced to `tree`.
pub fn simulate(tree: &DomTree, params: &HighlightParams) -> (PickerController, Option<Highlight>) {
    let mut picker = PickerController::default();
    picker.start(|_| {});

    let step = if params.level >= 0 { Key::ArrowUp } else { Key::ArrowDown };
    for _ in 0..params.level.unsigned_abs() {
        picker.handle_event(tree, InputEvent::Key { key: step, modifiers: Modifiers::NONE });
    }
    picker.handle_event(tree, InputEvent::PointerMove { x: params.x, y: params.y });
    if params.siblings {
        picker.handle_event(tree, InputEvent::Key { key: Key::Char('s'), modifiers: Modifiers::NONE });
    }
    picker.on_frame(tree);

    let highlight = picker.current().zip(picker.readout().cloned()).map(|(node, readout)| Highlight {
        selector: structural_selector(tree, node),
        readout,
        highlighted: picker.overlay().len(),
    });
    (picker, highlight)
}

/// Screenshot the page with the picker's highlight painted on top
#[derive(Default)]
pub struct HighlightTool;

impl Tool for HighlightTool {
    type Params = HighlightParams;

    fn name(&self) -> &str {
        "highlight"
    }

    fn execute_typed(&self, params: HighlightParams, context: &mut ToolContext) -> Result<ToolResult> {
        open_if_requested(context.session, params.url.as_deref())?;
        let tree = context.session.snapshot_document()?;

        let (picker, highlight) = simulate(&tree, &params);
        let Some(highlight) = highlight else {
            return Ok(ToolResult::failure(format!("Nothing pickable at ({}, {})", params.x, params.y)));
        };

        let png = context.session.screenshot()?;
        let scale = context.session.device_pixel_ratio()?;
        let mut canvas = image::load_from_memory(&png)
            .map_err(|e| PickerError::ScreenshotFailed(format!("Failed to decode screenshot: {}", e)))?
            .to_rgba8();
        picker.overlay().paint(&mut canvas, scale);

        let mut encoded = Vec::new();
        DynamicImage::ImageRgba8(canvas)
            .write_to(&mut Cursor::new(&mut encoded), ImageOutputFormat::Png)
            .map_err(|e| PickerError::ScreenshotFailed(format!("Failed to encode screenshot: {}", e)))?;

        Ok(ToolResult::success_with(serde_json::json!({
            "selector": highlight.selector,
            "readout": highlight.readout,
            "highlighted": highlight.highlighted,
            "image": STANDARD.encode(&encoded),
            "mime_type": "image/png",
        })))
    }
}
