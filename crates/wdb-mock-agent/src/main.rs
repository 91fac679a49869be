// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Standalone mock agent for manual bridge runs.

use clap::Parser;
use tracing_subscriber::EnvFilter;
use wdb_mock_agent::MockAgent;

#[derive(Parser, Debug)]
#[command(author, version, about = "Scriptable WebDriver Bridge agent stand-in")]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    bind_addr: String,

    /// Port to bind (0 picks an ephemeral port)
    #[arg(long, default_value_t = 7333)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.bind_addr, args.port).parse()?;
    let agent = MockAgent::new().spawn_on(addr).await?;
    tracing::info!("serving framed exchanges on {}", agent.addr());

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    Ok(())
}
