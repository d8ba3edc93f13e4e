//! NewsAPI MCP server (stdio).
//!
//! stdout carries newline-delimited JSON-RPC; all logs go to stderr.

mod config;
mod server;

use anyhow::Context as _;
use clap::Parser as _;
use config::{Cli, LogFormat};
use newsapi_tools::{NewsClient, NewsToolSource, RateGate};
use rmcp::ServiceExt as _;
use server::NewsServer;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(cli).await {
        error!("Fatal: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(cli: &Cli) {
    let (filter, bad_directive) = match EnvFilter::try_new(&cli.log_level) {
        Ok(f) => (f, None),
        Err(e) => (EnvFilter::new("info"), Some(e)),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);
    match cli.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }

    if let Some(e) = bad_directive {
        warn!(directive = %cli.log_level, error = %e, "invalid log filter, falling back to info");
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let gate = Arc::new(RateGate::new(cli.min_interval()));
    let client =
        NewsClient::with_throttle(cli.client_config(), gate).context("configure NewsAPI client")?;
    let server = NewsServer::new(NewsToolSource::new(client));

    info!(
        base_url = %cli.base_url,
        min_interval_ms = cli.min_interval_ms,
        api_key_configured = cli.api_key.as_deref().is_some_and(|k| !k.is_empty()),
        "starting {} on stdio",
        server::SERVER_NAME
    );

    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .context("start MCP stdio transport")?;

    let cancel = service.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            cancel.cancel();
        }
    });

    let reason = service.waiting().await.context("MCP service task")?;
    info!(?reason, "MCP session ended");
    Ok(())
}
