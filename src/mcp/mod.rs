//! MCP (Model Context Protocol) server for the region picker
//!
//! Wraps the tool registry in rmcp tools so agents can locate scroll
//! containers, harvest them and preview picker highlights.

pub mod handler;
pub use handler::BrowserServer;

use crate::tools::{ToolContext, ToolResult as InternalToolResult};
use rmcp::{ErrorData as McpError,
           handler::server::wrapper::Parameters,
           model::{CallToolResult, Content},
           tool, tool_router};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// find_scrollable parameters
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FindScrollableParams {
    /// Page to open first; the current page when omitted
    #[serde(default)]
    pub url: Option<String>,
}

/// harvest parameters
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HarvestParams {
    /// Page to open first; the current page when omitted
    #[serde(default)]
    pub url: Option<String>,
    /// CSS selector of the container to scroll; autodetected when omitted
    #[serde(default)]
    pub selector: Option<String>,
    /// Pixels scrolled per tick
    #[serde(default)]
    pub step_distance: Option<f64>,
    /// Milliseconds between ticks
    #[serde(default)]
    pub interval_ms: Option<u64>,
    /// Overall time budget in milliseconds
    #[serde(default)]
    pub max_duration_ms: Option<u64>,
}

/// highlight parameters
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
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

/// Convert an internal ToolResult to an MCP CallToolResult
fn convert_result(result: InternalToolResult) -> Result<CallToolResult, McpError> {
    if !result.success {
        let message = result.error.unwrap_or_else(|| "Unknown error".to_string());
        return Err(McpError::internal_error(message, None));
    }

    let Some(mut data) = result.data else {
        return Ok(CallToolResult::success(vec![Content::text("Success")]));
    };

    // Screenshots travel as image content, not as a base64 blob inside the JSON
    let image = data.as_object_mut().and_then(|o| o.remove("image"));
    let mut content = vec![Content::text(
        serde_json::to_string_pretty(&data).unwrap_or_else(|_| data.to_string()),
    )];
    if let Some(serde_json::Value::String(png)) = image {
        content.push(Content::image(png, "image/png"));
    }
    Ok(CallToolResult::success(content))
}

impl BrowserServer {
    /// Run a registry tool against the shared session
    fn run_tool(&self, name: &str, params: impl Serialize) -> Result<CallToolResult, McpError> {
        let tool_params =
            serde_json::to_value(params).map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        let session = self.session();
        let mut context = ToolContext::new(&*session);
        let result = session
            .tool_registry()
            .execute(name, tool_params, &mut context)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        convert_result(result)
    }
}

#[tool_router]
impl BrowserServer {
    /// Find the main scroll container
    #[tool(description = "Find the page's primary scroll container and report its selector and extents")]
    fn page_find_scrollable(&self, params: Parameters<FindScrollableParams>) -> Result<CallToolResult, McpError> {
        self.run_tool("find_scrollable", params.0)
    }

    /// Scroll a container to its end and return its text
    #[tool(
        description = "Scroll a container (autodetected unless a selector is given) until its content stops \
                       growing, then return the cleaned text"
    )]
    fn page_harvest(&self, params: Parameters<HarvestParams>) -> Result<CallToolResult, McpError> {
        self.run_tool("harvest", params.0)
    }

    /// Preview a picker highlight
    #[tool(
        description = "Highlight the element the picker would select at a viewport point (optionally moved \
                       up or down the tree, optionally with its siblings) and return an annotated screenshot"
    )]
    fn page_highlight(&self, params: Parameters<HighlightParams>) -> Result<CallToolResult, McpError> {
        self.run_tool("highlight", params.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_failure() {
        let result = convert_result(InternalToolResult::failure("no page"));
        assert!(result.is_err());
    }

    #[test]
    fn test_convert_splits_image() {
        let result = convert_result(InternalToolResult::success_with(serde_json::json!({
            "selector": "#feed",
            "image": "iVBORw0KGgo="
        })))
        .unwrap();
        assert_eq!(result.content.len(), 2);
    }

    #[test]
    fn test_convert_plain_data() {
        let result = convert_result(InternalToolResult::success_with(serde_json::json!({"found": false}))).unwrap();
        assert_eq!(result.content.len(), 1);
    }

    #[test]
    fn test_params_schema() {
        let schema = schemars::schema_for!(HighlightParams).to_value();
        assert!(schema["properties"]["level"].is_object());
    }
}
