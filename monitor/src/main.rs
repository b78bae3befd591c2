// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! tokenbridge-monitor entrypoint.
//!
//! `run` (the default) starts every enabled bridge monitor, the alert
//! scheduler, the metrics endpoint and the presenter, then waits for
//! SIGINT/SIGTERM and cancels the whole tree. The repair subcommands
//! (`fix-block-timestamps`, `reprocess-block-range`) run one bounded
//! operation and fail loudly instead of retrying.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use monitor::bridge_monitor::BridgeMonitor;
use monitor::config::{Config, Side};
use monitor::contract_monitor::ContractMonitor;
use monitor::eth_client::EthClient;
use monitor::metered_eth_provider::new_metered_eth_provider;
use monitor::metrics::{MetricsService, MonitorMetrics};
use monitor::presenter::Presenter;
use monitor::repositories::Repositories;
use monitor_pg_db::{Db, DbArgs};
use monitor_schema::models::NewBlockTimestamp;
use prometheus::Registry;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(rename_all = "kebab-case", author, version)]
struct Args {
    #[command(flatten)]
    db_args: DbArgs,
    #[clap(env = "MONITOR_CONFIG", long, default_value = "config.yml")]
    config: PathBuf,
    #[clap(env, long, default_value = "0.0.0.0:2112")]
    metrics_address: SocketAddr,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run all enabled bridge monitors (the default).
    Run,
    /// Re-fetch headers for every stored block timestamp of one chain and
    /// overwrite the recorded timestamps.
    FixBlockTimestamps {
        #[clap(long)]
        chain: String,
    },
    /// Re-run the log pipeline for an already-processed block range of one
    /// bridge side.
    ReprocessBlockRange {
        #[clap(long)]
        bridge: String,
        #[clap(long)]
        side: String,
        #[clap(long)]
        from_block: u64,
        #[clap(long)]
        to_block: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Arc::new(Config::load(&args.config)?);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let registry = Registry::new();
    let metrics = Arc::new(MonitorMetrics::new(&registry));

    let db = Db::for_write(config.postgres.connection_url()?, args.db_args.clone())
        .await
        .context("Failed to connect to the database")?;
    db.run_migrations(monitor_schema::MIGRATIONS).await?;
    let repos = Repositories::new(db, metrics.clone());

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run(args.metrics_address, registry, config, repos, metrics).await,
        Command::FixBlockTimestamps { chain } => {
            fix_block_timestamps(&config, &repos, metrics, &chain).await
        }
        Command::ReprocessBlockRange {
            bridge,
            side,
            from_block,
            to_block,
        } => reprocess_block_range(&config, repos, metrics, &bridge, &side, from_block, to_block).await,
    }
}

async fn run(
    metrics_address: SocketAddr,
    registry: Registry,
    config: Arc<Config>,
    repos: Repositories,
    metrics: Arc<MonitorMetrics>,
) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let mut handles: Vec<JoinHandle<()>> = Vec::new();

    // HTTP servers run until aborted; worker tasks unwind via the token.
    let mut server_handles: Vec<JoinHandle<()>> = Vec::new();
    server_handles.push(MetricsService::start(metrics_address, registry).await?);

    if let Some(presenter) = &config.presenter {
        let addr: SocketAddr = presenter
            .host
            .parse()
            .with_context(|| format!("invalid presenter host {}", presenter.host))?;
        server_handles.push(Presenter::start(addr, repos.clone(), config.clone()).await?);
    }

    let mut started = 0usize;
    for (bridge_id, bridge) in &config.bridges {
        if !config.is_bridge_enabled(bridge_id) {
            info!("[{}] bridge disabled, skipping", bridge_id);
            continue;
        }
        let monitor =
            BridgeMonitor::from_config(bridge_id, bridge, config.as_ref(), repos.clone(), &metrics)
                .await
                .with_context(|| format!("failed to construct bridge monitor {}", bridge_id))?;
        handles.extend(monitor.start(cancel.clone()));
        started += 1;
    }
    if started == 0 {
        warn!("No bridges enabled, nothing to monitor");
    }

    wait_for_shutdown().await;
    info!("Shutting down ...");
    cancel.cancel();
    for handle in handles {
        if let Err(e) = handle.await {
            if !e.is_cancelled() {
                error!("Worker task failed during shutdown: {:?}", e);
            }
        }
    }
    for handle in server_handles {
        handle.abort();
    }
    info!("Shutdown complete");
    Ok(())
}

async fn wait_for_shutdown() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}

/// Repair tool: rewrite every stored block timestamp of `chain` from freshly
/// fetched headers. Any failure is fatal, as the operator expects.
async fn fix_block_timestamps(
    config: &Config,
    repos: &Repositories,
    metrics: Arc<MonitorMetrics>,
    chain: &str,
) -> anyhow::Result<()> {
    let chain_config = config.chain(chain)?;
    let client = EthClient::new(
        new_metered_eth_provider(&chain_config.rpc.host, chain_config.rpc.rps, metrics)?,
        chain_config.rpc.timeout,
    );

    let rows = repos
        .block_timestamps
        .find_by_chain(&chain_config.chain_id)
        .await?;
    info!("Fixing {} block timestamps on {}", rows.len(), chain);

    for row in rows {
        let header = client.header_by_number(row.block_number as u64).await?;
        let timestamp = chrono::DateTime::<chrono::Utc>::from_timestamp(header.timestamp as i64, 0)
            .context("header timestamp out of range")?
            .naive_utc();
        if timestamp != row.timestamp {
            info!(
                "Correcting block {} timestamp {} -> {}",
                row.block_number, row.timestamp, timestamp
            );
            repos
                .block_timestamps
                .ensure(NewBlockTimestamp {
                    chain_id: row.chain_id.clone(),
                    block_number: row.block_number,
                    timestamp,
                })
                .await?;
        }
    }
    Ok(())
}

/// Repair tool: re-run fetching and processing for a block range that the
/// monitor has already passed.
async fn reprocess_block_range(
    config: &Config,
    repos: Repositories,
    metrics: Arc<MonitorMetrics>,
    bridge_id: &str,
    side: &str,
    from_block: u64,
    to_block: u64,
) -> anyhow::Result<()> {
    let bridge = config
        .bridges
        .get(bridge_id)
        .with_context(|| format!("unknown bridge {}", bridge_id))?;

    let (side, side_config, remote_side_config) = match side {
        "home" => (Side::Home, &bridge.home, &bridge.foreign),
        "foreign" => (Side::Foreign, &bridge.foreign, &bridge.home),
        other => anyhow::bail!("side must be home or foreign, got {}", other),
    };
    let chain_config = config.chain(&side_config.chain)?;

    let client = Arc::new(EthClient::new(
        new_metered_eth_provider(&chain_config.rpc.host, chain_config.rpc.rps, metrics.clone())?,
        chain_config.rpc.timeout,
    ));
    let monitor = ContractMonitor::new(
        bridge_id,
        bridge.bridge_mode,
        side,
        side_config.clone(),
        remote_side_config,
        chain_config.clone(),
        client,
        repos,
        &metrics,
    )
    .await?;

    monitor.process_block_range(from_block, to_block).await?;
    info!(
        "Reprocessed blocks {}..{} of {}/{}",
        from_block, to_block, bridge_id, side
    );
    Ok(())
}
