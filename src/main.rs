use clap::Parser;
use pgedge_mcp_server::config::{CliArgs, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pgedge_mcp_server::init_tracing();

    let args = CliArgs::parse();
    let config = Config::load(args)?;

    tracing::info!(transport = ?config.transport, "starting pgedge-mcp-server");
    let server = pgedge_mcp_server::build(config).await?;
    pgedge_mcp_server::run(server).await?;
    Ok(())
}
