use anyhow::Context;
use mcp_todoist::TodoistTools;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    errand_telemetry::init();

    let (cfg, cfg_path) = errand_config::Config::load().context("loading errand config")?;
    info!(?cfg_path, "config loaded");

    let tools = TodoistTools::from_config(&cfg.todoist);
    info!(version = env!("CARGO_PKG_VERSION"), initialized = tools.is_initialized(), "mcp-todoist serving on stdio");

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    errand_mcp::serve(stdin, tokio::io::stdout(), |req| tools.call(req)).await?;
    Ok(())
}
