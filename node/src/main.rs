// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # keystone node
//!
//! Entry point for the `keystone-node` binary. Parses CLI arguments,
//! initializes logging and metrics, wires the enrollment workflow to its
//! balances sequence and transaction pool, and serves the HTTP API.
//!
//! Subcommands:
//!
//! - `run`: start the node
//! - `keygen`: derive or generate a secret and print its identity
//! - `version`: print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use keystone_protocol::crypto::{generate_secret, is_valid_secret, Keypair};
use keystone_protocol::enrollment::MultisigEnrollment;
use keystone_protocol::identity::derive_address;
use keystone_protocol::network::{Mempool, MempoolConfig};
use keystone_protocol::sequence::BalancesSequence;
use keystone_protocol::storage::MemoryAccountStore;

use cli::{Commands, KeystoneNodeCli};
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = KeystoneNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Keygen(args) => keygen(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the node: API server, metrics endpoint, and the confirmation loop.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(&args.log_level, args.log_format);

    tracing::info!(
        api_port = args.api_port,
        metrics_port = args.metrics_port,
        sequence_max_pending = args.sequence_max_pending,
        "starting keystone-node"
    );

    // --- Accounts ---
    let accounts = Arc::new(MemoryAccountStore::new());
    for spec in &args.fund {
        let account = accounts
            .fund(&spec.public_key, spec.amount)
            .with_context(|| format!("failed to fund account {}", spec.public_key))?;
        tracing::info!(address = %account.address, amount = spec.amount, "account funded");
    }

    // --- Pool, sequence, enrollment ---
    let mempool = Arc::new(Mempool::new(
        MempoolConfig {
            max_size: args.pool_max_size,
            min_fee: args.min_fee,
            ..MempoolConfig::default()
        },
        Arc::clone(&accounts),
    ));
    let sequence = Arc::new(BalancesSequence::spawn(args.sequence_max_pending));
    let enrollment = MultisigEnrollment::new(
        accounts.clone(),
        mempool.clone(),
        sequence.clone(),
    );

    let node_metrics = Arc::new(NodeMetrics::new());

    let app_state = api::AppState {
        version: format!(
            "{} (protocol {})",
            env!("CARGO_PKG_VERSION"),
            keystone_protocol::config::PROTOCOL_VERSION,
        ),
        enrollment,
        mempool: Arc::clone(&mempool),
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("{}:{}", args.host, args.api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("{}:{}", args.host, args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Confirmation loop ---
    // Stands in for block inclusion: pending state is promoted to confirmed
    // on a fixed interval.
    let pool_ref = Arc::clone(&mempool);
    let metrics_ref = Arc::clone(&node_metrics);
    let interval_ms = args.confirm_interval_ms.max(1);
    let confirm_loop = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
        loop {
            interval.tick().await;
            let confirmed = pool_ref.confirm_all();
            metrics_ref.transactions_in_pool.set(pool_ref.size() as i64);
            if !confirmed.is_empty() {
                metrics_ref
                    .transactions_confirmed_total
                    .inc_by(confirmed.len() as u64);
                tracing::info!(count = confirmed.len(), "transactions confirmed");
            }
        }
    });

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    confirm_loop.abort();
    tracing::info!(
        pending_tasks = sequence.pending(),
        pending_transactions = mempool.size(),
        "keystone-node stopped"
    );
    Ok(())
}

/// Prints a secret with its public key and address. A fresh mnemonic is
/// generated unless `--secret` is given.
fn keygen(args: cli::KeygenArgs) -> Result<()> {
    logging::init_logging("keystone_node=warn", logging::LogFormat::Compact);

    let secret = match args.secret {
        Some(secret) => {
            anyhow::ensure!(!secret.is_empty(), "secret must not be empty");
            if !is_valid_secret(&secret) {
                tracing::warn!("secret is not a valid BIP-39 mnemonic; deriving anyway");
            }
            secret
        }
        None => generate_secret(),
    };

    let keypair = Keypair::from_secret(&secret);
    let public_key = keypair.public_key_hex();
    let address = derive_address(&keypair.public_key(), args.prefix);

    if args.json {
        let out = serde_json::json!({
            "secret": secret,
            "publicKey": public_key,
            "address": address,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("failed to encode keygen output")?
        );
    } else {
        println!("secret      {}", secret);
        println!("public key  {}", public_key);
        println!("address     {}", address);
    }
    Ok(())
}

fn print_version() {
    println!("keystone-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol      {}", keystone_protocol::config::PROTOCOL_VERSION);
    println!("rustc         {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
