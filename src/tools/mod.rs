//! Tool system
//!
//! Each tool is a typed operation against a [`BrowserSession`]: it declares a
//! parameter struct (deserialized from JSON, schema derived with schemars) and
//! returns a [`ToolResult`]. The [`ToolRegistry`] looks tools up by name so the
//! MCP server and the CLI can drive them uniformly.

pub mod find_scrollable;
pub mod harvest;
pub mod highlight;
pub mod utils;

pub use find_scrollable::FindScrollableTool;
pub use harvest::HarvestTool;
pub use highlight::HighlightTool;

use crate::browser::BrowserSession;
use crate::error::{PickerError, Result};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a tool gets to work with
pub struct ToolContext<'a> {
    pub session: &'a BrowserSession,
}

impl<'a> ToolContext<'a> {
    pub fn new(session: &'a BrowserSession) -> Self {
        Self { session }
    }
}

/// Outcome of a tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success() -> Self {
        Self { success: true, data: None, error: None }
    }

    pub fn success_with(data: Value) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(error.into()) }
    }
}

/// A typed browser operation
pub trait Tool: Send + Sync {
    type Params: DeserializeOwned + JsonSchema;

    fn name(&self) -> &str;

    fn execute_typed(&self, params: Self::Params, context: &mut ToolContext) -> Result<ToolResult>;

    /// JSON schema of [`Tool::Params`]
    fn parameters_schema(&self) -> Value {
        schemars::schema_for!(Self::Params).to_value()
    }
}

/// Object-safe view of a [`Tool`], taking raw JSON parameters
pub trait DynTool: Send + Sync {
    fn name(&self) -> &str;

    fn parameters_schema(&self) -> Value;

    fn execute(&self, params: Value, context: &mut ToolContext) -> Result<ToolResult>;
}

/// Boxes a typed tool behind [`DynTool`]
struct Erased<T>(T);

impl<T: Tool> DynTool for Erased<T> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn parameters_schema(&self) -> Value {
        self.0.parameters_schema()
    }

    fn execute(&self, params: Value, context: &mut ToolContext) -> Result<ToolResult> {
        let typed: T::Params = serde_json::from_value(params)
            .map_err(|e| PickerError::InvalidArgument(format!("{}: {}", self.0.name(), e)))?;
        self.0.execute_typed(typed, context)
    }
}

/// Tools by name, in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, Box<dyn DynTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in tool
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(FindScrollableTool);
        registry.register(HarvestTool);
        registry.register(HighlightTool);
        registry
    }

    /// Add a tool, replacing any tool of the same name
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        self.tools.insert(name, Box::new(Erased(tool)));
    }

    pub fn get(&self, name: &str) -> Option<&dyn DynTool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool by name with JSON parameters
    pub fn execute(&self, name: &str, params: Value, context: &mut ToolContext) -> Result<ToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| PickerError::InvalidArgument(format!("Unknown tool '{}'", name)))?;

        log::debug!("Executing tool {}", name);
        tool.execute(params, context)
    }
}
