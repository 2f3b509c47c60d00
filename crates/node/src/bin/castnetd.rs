// Path: crates/node/src/bin/castnetd.rs
//! A standalone castnet node.
//!
//! Wires the node core to the loopback engine so a small mesh can be run by
//! hand: every line on stdin is sent on the configured channel, and every
//! externalized cast on that channel is logged. A production deployment
//! swaps the engine factory for a real FBA implementation.

use anyhow::Context;
use castnet_crypto::Keypair;
use castnet_node::NodeBuilder;
use castnet_telemetry::{LogFormat, TelemetryConfig};
use castnet_test_utils::LoopbackEngine;
use castnet_types::PublicKey;
use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "castnetd", about = "A federated-agreement messaging node")]
struct Cli {
    /// Accept inbound transports on this port.
    #[arg(long)]
    listen: Option<u16>,

    /// Log output shape.
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormatArg,

    /// Log filter when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_filter: String,

    /// Derive the node identity deterministically from this seed phrase.
    #[arg(long)]
    seed: Option<String>,

    /// Peers to dial, as base64-pubkey@ws-url.
    #[arg(long = "peer", value_name = "PK@URL")]
    peers: Vec<String>,

    /// Quorum slices to install, as comma-separated base64 public keys.
    #[arg(long = "quorum", value_name = "PK,PK,..")]
    quorums: Vec<String>,

    /// The channel to subscribe to and send stdin lines on.
    #[arg(long, default_value = "lobby")]
    channel: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    castnet_telemetry::init_tracing(&TelemetryConfig {
        default_directive: cli.log_filter.clone(),
        format: cli.log_format.into(),
    })?;

    let mut builder = NodeBuilder::new();
    if let Some(seed) = &cli.seed {
        builder = builder.keypair(Keypair::from_seed_phrase(seed)?);
    }
    let node = builder.spawn(|setup| {
        LoopbackEngine::new(setup.identity, setup.policy, setup.events)
    })?;

    let me = node.public_key().await?;
    info!(target: "castnetd", pk = %me, "node identity");

    if let Some(port) = cli.listen {
        let addr = node.listen(port).await?;
        info!(target: "castnetd", %addr, "listening");
    }

    for entry in &cli.peers {
        let (pk, url) = entry
            .split_once('@')
            .with_context(|| format!("--peer takes PK@URL, got {:?}", entry))?;
        let pk = PublicKey::from_base64(pk);
        match node.peer_connect(url, pk.clone()).await {
            Ok(()) => info!(target: "castnetd", peer = pk.short(), %url, "peer connected"),
            Err(e) => warn!(target: "castnetd", peer = pk.short(), %url, "peer connect failed: {}", e),
        }
    }

    for slice in &cli.quorums {
        let quorum: Vec<PublicKey> = slice
            .split(',')
            .filter(|part| !part.is_empty())
            .map(PublicKey::from_base64)
            .collect();
        node.add_quorum(quorum).await?;
    }

    node.receive(&cli.channel, move |delivery| {
        info!(
            target: "castnetd",
            channel = %delivery.channel,
            from = delivery.sender.short(),
            sha = %delivery.sha,
            "{}", delivery.pay
        );
    })
    .await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.is_empty() {
            continue;
        }
        match node.send(&cli.channel, line.into_bytes()).await {
            Ok(sha) => info!(target: "castnetd", %sha, "externalized"),
            Err(e) => warn!(target: "castnetd", "send failed: {}", e),
        }
    }

    // Stdin is gone (piped input ended); keep serving the mesh.
    std::future::pending::<()>().await;
    Ok(())
}
