//! Region picker MCP server
//!
//! Serves the scroll container, harvest and highlight tools to MCP clients over
//! stdio or streamable HTTP.

use clap::{Parser, ValueEnum};
use region_picker::browser::{BrowserSession, ConnectionOptions, LaunchOptions};
use region_picker::mcp::BrowserServer;
use rmcp::transport::streamable_http_server::{StreamableHttpService, session::local::LocalSessionManager};
use rmcp::{ServiceExt, transport::stdio};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Transport {
    /// Standard input/output transport (default)
    Stdio,
    /// HTTP streamable transport
    Http,
}

#[derive(Parser)]
#[command(name = "mcp-server")]
#[command(version)]
#[command(about = "Region picker MCP server", long_about = None)]
struct Cli {
    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    executable_path: Option<PathBuf>,

    /// DevTools WebSocket URL of an already running browser
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Persistent browser profile directory
    #[arg(long, value_name = "DIR")]
    user_data_dir: Option<PathBuf>,

    /// Transport type to use
    #[arg(long, short = 't', value_enum, default_value = "stdio")]
    transport: Transport,

    /// Port for the HTTP transport
    #[arg(long, short = 'p', default_value = "3000")]
    port: u16,

    /// HTTP streamable endpoint path
    #[arg(long, default_value = "/mcp")]
    http_path: String,
}

impl Cli {
    fn launch_options(&self) -> LaunchOptions {
        let mut options = LaunchOptions::new().headless(!self.headed);
        if let Some(path) = &self.executable_path {
            options = options.chrome_path(path.clone());
        }
        if let Some(dir) = &self.user_data_dir {
            options = options.user_data_dir(dir.clone());
        }
        options
    }

    fn server(&self) -> region_picker::Result<BrowserServer> {
        match &self.ws_endpoint {
            Some(ws) => Ok(BrowserServer::from_session(BrowserSession::connect(ConnectionOptions::new(ws.clone()))?)),
            None => BrowserServer::with_options(self.launch_options()),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    log::info!("Region picker MCP server v{}", env!("CARGO_PKG_VERSION"));
    match &cli.ws_endpoint {
        Some(ws) => log::info!("Browser: connecting to {}", ws),
        None => log::info!("Browser mode: {}", if cli.headed { "headed" } else { "headless" }),
    }

    match cli.transport {
        Transport::Stdio => {
            let service = cli.server().map_err(|e| format!("Failed to create browser server: {}", e))?;
            log::info!("Ready to accept MCP connections via stdio");

            let server = service.serve(stdio()).await?;
            let quit_reason = server.waiting().await?;
            log::info!("Server quit with reason: {:?}", quit_reason);
        }
        Transport::Http => {
            let bind_addr = format!("127.0.0.1:{}", cli.port);
            let path = cli.http_path.clone();

            let service_factory = move || cli.server().map_err(std::io::Error::other);
            let http_service = StreamableHttpService::new(
                service_factory,
                LocalSessionManager::default().into(),
                Default::default(),
            );
            let router = axum::Router::new().nest_service(&path, http_service);

            log::info!("Ready to accept MCP connections at http://{}{}", bind_addr, path);
            let listener = tokio::net::TcpListener::bind(bind_addr).await?;
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await?;
        }
    }

    Ok(())
}
