//! Region picker command line
//!
//! ```bash
//! region-picker scrollable --url news.ycombinator.com
//! region-picker harvest --url example.com/feed --selector '#feed' --max-duration-ms 5000
//! ```

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use region_picker::browser::{BrowserSession, LaunchOptions};
use region_picker::tools::ToolResult;
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "region-picker")]
#[command(version)]
#[command(about = "Find and harvest scrollable regions of web pages", long_about = None)]
struct Cli {
    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H', global = true)]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH", global = true)]
    executable_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report the page's primary scroll container
    Scrollable {
        /// Page to open
        #[arg(long)]
        url: String,
    },
    /// Scroll a container to its end and print its text
    Harvest(HarvestArgs),
}

#[derive(Args)]
struct HarvestArgs {
    /// Page to open
    #[arg(long)]
    url: String,

    /// CSS selector of the container; autodetected when omitted
    #[arg(long)]
    selector: Option<String>,

    /// Pixels scrolled per tick
    #[arg(long)]
    step_distance: Option<f64>,

    /// Milliseconds between ticks
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Overall time budget in milliseconds
    #[arg(long)]
    max_duration_ms: Option<u64>,

    /// Print the full tool result as JSON instead of just the text
    #[arg(long)]
    json: bool,
}

fn unwrap_result(result: ToolResult) -> anyhow::Result<serde_json::Value> {
    if !result.success {
        bail!(result.error.unwrap_or_else(|| "tool failed".to_string()));
    }
    Ok(result.data.unwrap_or(serde_json::Value::Null))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let mut options = LaunchOptions::new().headless(!cli.headed);
    if let Some(path) = cli.executable_path {
        options = options.chrome_path(path);
    }
    let session = BrowserSession::launch(options).context("launching browser")?;

    match cli.command {
        Command::Scrollable { url } => {
            let result = session.execute_tool("find_scrollable", json!({ "url": url }))?;
            let data = unwrap_result(result)?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Command::Harvest(args) => {
            let params = json!({
                "url": args.url,
                "selector": args.selector,
                "step_distance": args.step_distance,
                "interval_ms": args.interval_ms,
                "max_duration_ms": args.max_duration_ms,
            });
            let data = unwrap_result(session.execute_tool("harvest", params)?)?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                eprintln!(
                    "{} after {} ticks ({:.1}% covered)",
                    data["end"].as_str().unwrap_or("finished"),
                    data["ticks"],
                    data["coverage_percent"].as_f64().unwrap_or(0.0)
                );
                println!("{}", data["content"].as_str().unwrap_or_default());
            }
        }
    }

    Ok(())
}
