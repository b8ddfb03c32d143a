use thiserror::Error;

/// Errors that cross the crate boundary.
///
/// Picker-state conditions (nothing under the pointer, detached nodes, harvest
/// timeouts and cancellations, confirming an empty selection) are handled inside
/// the core and never show up here. Only broken collaborators do.
#[derive(Debug, Error)]
pub enum PickerError {
    /// Failed to launch the browser
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Failed to connect to a running browser
    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    /// Tab lookup, creation or activation failed
    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    /// Navigation failed or timed out
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// Script evaluation in the page failed
    #[error("Evaluation failed: {0}")]
    EvaluationFailed(String),

    /// The page snapshot could not be produced or parsed
    #[error("Document snapshot failed: {0}")]
    SnapshotFailed(String),

    /// Screenshot capture or decoding failed
    #[error("Screenshot failed: {0}")]
    ScreenshotFailed(String),

    /// No rendering surface is attached to serve the request
    #[error("No rendering surface attached: {0}")]
    NoSurface(String),

    /// A cross-context round-trip did not complete in time
    #[error("Timed out waiting for {what} after {millis}ms")]
    Timeout { what: String, millis: u64 },

    /// An element addressed by selector does not exist
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Bad parameters supplied by a caller
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A registered tool failed
    #[error("Tool '{tool}' failed: {reason}")]
    ToolExecutionFailed { tool: String, reason: String },

    /// JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, PickerError>;
