use crate::{browser::{config::{ConnectionOptions, LaunchOptions},
                      surface::TabScrollSurface},
            dom::DomTree,
            error::{PickerError, Result},
            tools::{ToolContext, ToolRegistry, ToolResult}};
use headless_chrome::{Browser, Tab, protocol::cdp::Page::CaptureScreenshotFormatOption};
use std::{ffi::OsStr, sync::Arc, time::Duration};

/// A Chrome/Chromium instance the picker runs against
pub struct BrowserSession {
    browser: Browser,

    /// Tools that can be executed against this session
    tool_registry: ToolRegistry,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

        // Harvests can sit idle between tool calls for a long time
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));
        launch_opts.path = options.chrome_path;
        launch_opts.user_data_dir = options.user_data_dir;
        launch_opts.sandbox = options.sandbox;

        let browser = Browser::new(launch_opts).map_err(|e| PickerError::LaunchFailed(e.to_string()))?;
        browser.new_tab().map_err(|e| PickerError::LaunchFailed(format!("Failed to create tab: {}", e)))?;

        log::info!("Browser launched (headless: {})", options.headless);
        Ok(Self { browser, tool_registry: ToolRegistry::with_defaults() })
    }

    /// Attach to a running browser via its DevTools WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser = Browser::connect_with_timeout(options.ws_url.clone(), Duration::from_millis(options.timeout))
            .map_err(|e| PickerError::ConnectionFailed(format!("{}: {}", options.ws_url, e)))?;

        log::info!("Connected to browser at {}", options.ws_url);
        Ok(Self { browser, tool_registry: ToolRegistry::with_defaults() })
    }

    /// Launch a headless browser with default options
    pub fn new() -> Result<Self> {
        Self::launch(LaunchOptions::default())
    }

    /// The active tab
    pub fn tab(&self) -> Result<Arc<Tab>> {
        self.get_active_tab()
    }

    pub fn get_tabs(&self) -> Result<Vec<Arc<Tab>>> {
        let tabs = self
            .browser
            .get_tabs()
            .lock()
            .map_err(|e| PickerError::TabOperationFailed(format!("Failed to get tabs: {}", e)))?
            .clone();

        Ok(tabs)
    }

    /// The tab the user is looking at: visible and focused if possible, else
    /// just visible, else the only tab there is.
    pub fn get_active_tab(&self) -> Result<Arc<Tab>> {
        let tabs = self.get_tabs()?;

        for check in ["document.visibilityState === 'visible' && document.hasFocus()", "document.visibilityState === 'visible'"] {
            for tab in &tabs {
                match tab.evaluate(check, false) {
                    Ok(remote) if remote.value.as_ref().and_then(|v| v.as_bool()).unwrap_or(false) => {
                        return Ok(tab.clone());
                    }
                    Ok(_) => {}
                    Err(e) => log::debug!("Failed to query tab state: {}", e),
                }
            }
        }

        match tabs.as_slice() {
            [only] => Ok(only.clone()),
            _ => Err(PickerError::TabOperationFailed("No active tab found".to_string())),
        }
    }

    /// Navigate the active tab
    pub fn navigate(&self, url: &str) -> Result<()> {
        self.tab()?
            .navigate_to(url)
            .map_err(|e| PickerError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;

        Ok(())
    }

    /// Block until the active tab finishes loading
    pub fn wait_for_navigation(&self) -> Result<()> {
        self.tab()?
            .wait_until_navigated()
            .map_err(|e| PickerError::NavigationFailed(format!("Navigation timeout: {}", e)))?;

        Ok(())
    }

    /// Snapshot the active tab's rendered document
    pub fn snapshot_document(&self) -> Result<DomTree> {
        DomTree::from_tab(&self.tab()?)
    }

    /// PNG screenshot of the active tab's viewport
    pub fn screenshot(&self) -> Result<Vec<u8>> {
        self.tab()?
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| PickerError::ScreenshotFailed(e.to_string()))
    }

    /// CSS to device pixel ratio of the active tab
    pub fn device_pixel_ratio(&self) -> Result<f64> {
        let remote = self
            .tab()?
            .evaluate("window.devicePixelRatio", false)
            .map_err(|e| PickerError::EvaluationFailed(e.to_string()))?;

        Ok(remote.value.and_then(|v| v.as_f64()).filter(|r| *r > 0.0).unwrap_or(1.0))
    }

    /// Live scroll surface in the active tab; `None` targets the document
    pub fn scroll_surface(&self, selector: Option<String>) -> Result<TabScrollSurface> {
        Ok(TabScrollSurface::new(self.tab()?, selector))
    }

    pub fn tool_registry(&self) -> &ToolRegistry {
        &self.tool_registry
    }

    /// Execute a registered tool by name
    pub fn execute_tool(&self, name: &str, params: serde_json::Value) -> Result<ToolResult> {
        let mut context = ToolContext::new(self);
        self.tool_registry.execute(name, params, &mut context)
    }
}
