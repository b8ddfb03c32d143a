use crate::dom::DomTree;
use crate::error::Result;
use crate::geometry::{self, ScrollInfo, ScrollTarget};
use crate::tools::utils::{open_if_requested, target_selector};
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the find_scrollable tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FindScrollableParams {
    /// Page to open first; the current page when omitted
    #[serde(default)]
    pub url: Option<String>,
}

/// Summary of the primary scroll container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollContainer {
    /// CSS selector, `None` when the document itself scrolls
    pub selector: Option<String>,
    pub is_document: bool,
    pub info: ScrollInfo,
}

/// Locate the page's main scroll container
pub fn describe_container(tree: &DomTree) -> Option<ScrollContainer> {
    let target = geometry::find_scrollable_container(tree)?;
    let node = target.node(tree);
    Some(ScrollContainer {
        selector: target_selector(tree, target),
        is_document: target == ScrollTarget::Document,
        info: geometry::is_scrollable(tree, node),
    })
}

#[derive(Default)]
pub struct FindScrollableTool;

impl Tool for FindScrollableTool {
    type Params = FindScrollableParams;

    fn name(&self) -> &str {
        "find_scrollable"
    }

    fn execute_typed(&self, params: FindScrollableParams, context: &mut ToolContext) -> Result<ToolResult> {
        open_if_requested(context.session, params.url.as_deref())?;
        let tree = context.session.snapshot_document()?;

        let container = describe_container(&tree);
        match &container {
            Some(c) => log::info!("Scroll container: {}", c.selector.as_deref().unwrap_or("document")),
            None => log::info!("Page has no scroll container"),
        }

        Ok(ToolResult::success_with(serde_json::json!({
            "found": container.is_some(),
            "container": container,
            "element_count": tree.count_elements(),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementNode, Overflow, ScrollMetrics};

    #[test]
    fn test_tool_metadata() {
        let tool = FindScrollableTool;
        assert_eq!(tool.name(), "find_scrollable");
        assert!(tool.parameters_schema().is_object());
    }

    #[test]
    fn test_params_url_optional() {
        let params: FindScrollableParams = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(params.url.is_none());
    }

    #[test]
    fn test_describe_semantic_container() {
        let mut tree = DomTree::new(1000.0, 800.0);
        let body = tree.body();
        tree.append(
            body,
            ElementNode::new("main")
                .with_bounding_box(0.0, 0.0, 1000.0, 800.0)
                .with_overflow(Overflow::Auto)
                .with_scroll(ScrollMetrics { scroll_height: 4000.0, client_height: 800.0, ..Default::default() }),
        )
        .unwrap();

        let container = describe_container(&tree).unwrap();
        assert_eq!(container.selector.as_deref(), Some("body > main"));
        assert!(!container.is_document);
        assert_eq!(container.info.content_extent, 4000.0);
    }

    #[test]
    fn test_describe_static_page() {
        let tree = DomTree::new(1000.0, 800.0);
        assert!(describe_container(&tree).is_none());
    }
}
