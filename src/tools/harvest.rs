use crate::error::{PickerError, Result};
use crate::geometry;
use crate::harvest::{HarvestEnd, HarvestOptions, ScrollSurface, clean_text, scroll_and_settle_blocking};
use crate::tools::utils::{open_if_requested, target_selector};
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Parameters for the harvest tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct HarvestParams {
    /// Page to open first; the current page when omitted
    #[serde(default)]
    pub url: Option<String>,

    /// CSS selector of the container to scroll; autodetected when omitted
    #[serde(default)]
    pub selector: Option<String>,

    /// Pixels scrolled per tick (default: 600)
    #[serde(default)]
    pub step_distance: Option<f64>,

    /// Milliseconds between ticks (default: 200)
    #[serde(default)]
    pub interval_ms: Option<u64>,

    /// Overall time budget in milliseconds (default: 15000)
    #[serde(default)]
    pub max_duration_ms: Option<u64>,
}

impl HarvestParams {
    pub fn options(&self) -> HarvestOptions {
        let defaults = HarvestOptions::default();
        HarvestOptions {
            step_distance: self.step_distance.unwrap_or(defaults.step_distance),
            interval_ms: self.interval_ms.unwrap_or(defaults.interval_ms),
            max_duration_ms: self.max_duration_ms.unwrap_or(defaults.max_duration_ms),
        }
    }
}

/// Scroll a container to its end, loading lazy content, and return its text
#[derive(Default)]
pub struct HarvestTool;

impl Tool for HarvestTool {
    type Params = HarvestParams;

    fn name(&self) -> &str {
        "harvest"
    }

    fn execute_typed(&self, params: HarvestParams, context: &mut ToolContext) -> Result<ToolResult> {
        open_if_requested(context.session, params.url.as_deref())?;

        let selector = match params.selector.clone() {
            Some(selector) => Some(selector),
            None => {
                let tree = context.session.snapshot_document()?;
                match geometry::find_scrollable_container(&tree) {
                    Some(target) => target_selector(&tree, target),
                    None => {
                        log::info!("No scroll container found, reading the document as is");
                        None
                    }
                }
            }
        };

        let options = params.options();
        let mut surface = context.session.scroll_surface(selector.clone())?;
        let report = scroll_and_settle_blocking(&mut surface, &options, CancellationToken::new())?;
        let content = collect_text(&mut surface, report.end)?;

        Ok(ToolResult::success_with(serde_json::json!({
            "selector": selector,
            "end": report.end,
            "ticks": report.ticks,
            "coverage_percent": report.coverage_percent,
            "content_extent": report.content_extent,
            "length": content.chars().count(),
            "content": content,
        })))
    }
}

/// Cleaned text of a harvested surface. A target that detached mid-run yields
/// nothing rather than an error.
fn collect_text<S: ScrollSurface + ?Sized>(surface: &mut S, end: HarvestEnd) -> Result<String> {
    match surface.rendered_text() {
        Ok(raw) => Ok(clean_text(&raw)),
        Err(PickerError::ElementNotFound(what)) if end == HarvestEnd::Detached => {
            log::warn!("Harvest target {} was replaced, no text to collect", what);
            Ok(String::new())
        }
        Err(e) => Err(e),
    }
}
