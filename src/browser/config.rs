use std::path::PathBuf;

/// Options for launching a new browser instance
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Run without a visible window
    pub headless: bool,

    /// Window width in pixels
    pub window_width: u32,

    /// Window height in pixels
    pub window_height: u32,

    /// Chrome/Chromium binary; autodetected when `None`
    pub chrome_path: Option<PathBuf>,

    /// Profile directory; a temporary one when `None`
    pub user_data_dir: Option<PathBuf>,

    /// Enable the Chrome sandbox
    pub sandbox: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1280,
            window_height: 800,
            chrome_path: None,
            user_data_dir: None,
            sandbox: true,
        }
    }
}

impl LaunchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Builder method: set window size
    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Builder method: set the browser binary
    pub fn chrome_path(mut self, path: PathBuf) -> Self {
        self.chrome_path = Some(path);
        self
    }

    /// Builder method: set the profile directory
    pub fn user_data_dir(mut self, dir: PathBuf) -> Self {
        self.user_data_dir = Some(dir);
        self
    }

    /// Builder method: toggle the sandbox
    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }
}

/// Options for attaching to an already running browser
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    /// DevTools WebSocket URL, e.g. `ws://127.0.0.1:9222/devtools/browser/<id>`
    pub ws_url: String,

    /// Idle timeout for the DevTools connection, in milliseconds
    pub timeout: u64,
}

impl ConnectionOptions {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self { ws_url: ws_url.into(), timeout: 30_000 }
    }

    /// Builder method: set the idle timeout in milliseconds
    pub fn timeout(mut self, millis: u64) -> Self {
        self.timeout = millis;
        self
    }
}
