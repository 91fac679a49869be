// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! WebDriver Bridge server binary

use std::net::IpAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wdb_core::{CommandExecutor, DeviceTarget, StaticTarget};
use wdb_server::{Server, ServerConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "WebDriver-to-agent protocol bridge", long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(long, env = "WDB_PORT", default_value_t = 7332)]
    port: u16,

    /// Address to bind the listener to
    #[arg(long, env = "WDB_BIND_ADDR", default_value = "127.0.0.1")]
    bind_addr: IpAddr,

    /// Base path under which the command URLs are served
    #[arg(long, env = "WDB_URL_PATH", default_value = "")]
    url_path: String,

    /// Address of the automation agent
    #[arg(long, env = "WDB_AGENT_ADDR", default_value = "127.0.0.1")]
    agent_addr: String,

    /// Port of the automation agent
    #[arg(long, env = "WDB_AGENT_PORT")]
    agent_port: u16,

    /// Answer SHUTDOWN URLs without stopping the server
    #[arg(long)]
    ignore_remote_shutdown: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    tracing::info!(
        "WebDriver Bridge {} on {}/{}",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    );

    let config = ServerConfig {
        bind_addr: args.bind_addr,
        port: args.port,
        url_path: ServerConfig::normalize_url_path(&args.url_path),
        ignore_remote_shutdown: args.ignore_remote_shutdown,
    };

    let (status_tx, mut status_rx) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(update) = status_rx.recv().await {
            tracing::info!("{}", update);
        }
    });

    let target: Arc<dyn DeviceTarget> = Arc::new(
        StaticTarget::new(args.agent_addr, args.agent_port).with_status_updates(status_tx),
    );
    target.connect().await?;

    let executor = Arc::new(CommandExecutor::new(target));
    let server = Server::new(config, executor);
    server.run().await?;

    tracing::info!("server stopped");
    Ok(())
}
