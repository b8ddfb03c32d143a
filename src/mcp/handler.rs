use crate::browser::{BrowserSession, LaunchOptions};
use crate::error;
use rmcp::{ServerHandler,
           handler::server::router::tool::ToolRouter,
           model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
           tool_handler};
use std::sync::{Arc, Mutex, MutexGuard};

/// MCP server exposing the region picker tools over one browser session
#[derive(Clone)]
pub struct BrowserServer {
    session: Arc<Mutex<BrowserSession>>,
    pub(crate) tool_router: ToolRouter<Self>,
}

impl BrowserServer {
    /// Launch a headless browser and serve it
    pub fn new() -> error::Result<Self> {
        Self::with_options(LaunchOptions::default())
    }

    /// Launch a browser with the given options and serve it
    pub fn with_options(options: LaunchOptions) -> error::Result<Self> {
        Ok(Self::from_session(BrowserSession::launch(options)?))
    }

    /// Serve an existing session
    pub fn from_session(session: BrowserSession) -> Self {
        Self { session: Arc::new(Mutex::new(session)), tool_router: Self::tool_router() }
    }

    /// Lock the browser session, recovering from poisoning
    pub(crate) fn session(&self) -> MutexGuard<'_, BrowserSession> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[tool_handler]
impl ServerHandler for BrowserServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Region picker tools: find a page's main scroll container, harvest lazily loaded \
                 content by scrolling it to the end, and render picker highlights onto a screenshot."
                    .to_string(),
            ),
        }
    }
}
