use anyhow::Context;
use mcp_amap::AmapClient;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    errand_telemetry::init();

    let (cfg, cfg_path) = errand_config::Config::load().context("loading errand config")?;
    info!(?cfg_path, "config loaded");

    let client = AmapClient::from_config(&cfg.amap)?;
    info!(version = env!("CARGO_PKG_VERSION"), "mcp-amap serving on stdio");

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    errand_mcp::serve(stdin, tokio::io::stdout(), |req| client.call(req)).await?;
    Ok(())
}
