//! ChainRelay daemon.
//!
//! # Commands
//! ```text
//! chainrelay [run]  [--config <file.yaml>] [--upstream-url <wss://…>] [--listen <addr>]
//! chainrelay decode --line "Program data: …"
//! chainrelay --version
//! ```
//!
//! `run` subscribes to the program's logs upstream and relays every decoded
//! create event to all clients connected on `ws://<listen>/connect`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chainrelay_core::LogPipeline;
use chainrelay_observability::init_tracing;
use chainrelay_server::{Broadcaster, ClientRegistry, RelayServer};
use chainrelay_stream::{Commitment, SolanaWsSource, UpstreamConnector};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio::net::TcpListener;
use tracing::info;

mod config;

use config::RelayConfig;

#[derive(Parser)]
#[command(
    name = "chainrelay",
    about = "Relay Solana program create events to WebSocket clients",
    long_about = "
ChainRelay subscribes to a Solana program's logs, decodes Anchor create
events from `Program data:` lines and broadcasts them as JSON to every
WebSocket client connected on the relay endpoint.

ENVIRONMENT VARIABLES:
  CHAINRELAY_CONFIG         Path to a YAML config file
  CHAINRELAY_UPSTREAM_URL   Solana PubSub WebSocket URL
  CHAINRELAY_PROGRAM_ID     Program whose logs are relayed
  CHAINRELAY_LISTEN         Listen address for downstream clients
  RUST_LOG                  Log filter (overrides the config file)
",
    version
)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true, env = "CHAINRELAY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay (default)
    Run(RunArgs),

    /// Decode a single program log line and print the wire event
    Decode {
        /// Raw log line, e.g. "Program data: G3KpTd7r…"
        #[arg(long)]
        line: String,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Solana PubSub WebSocket URL
    #[arg(long, env = "CHAINRELAY_UPSTREAM_URL")]
    upstream_url: Option<String>,

    /// Program id used as the `mentions` filter
    #[arg(long, env = "CHAINRELAY_PROGRAM_ID")]
    program_id: Option<String>,

    /// Commitment level for log notifications
    #[arg(long, value_enum)]
    commitment: Option<CommitmentArg>,

    /// Address to accept downstream clients on
    #[arg(long, env = "CHAINRELAY_LISTEN")]
    listen: Option<String>,

    /// Delay between reconnect attempts, in milliseconds
    #[arg(long)]
    reconnect_delay_ms: Option<u64>,

    /// Global log level
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON logs
    #[arg(long)]
    json_logs: bool,
}

/// Bare `chainrelay`: `run` options come from the environment only.
#[derive(Parser)]
#[command(name = "chainrelay")]
struct DefaultRun {
    #[command(flatten)]
    args: RunArgs,
}

#[derive(Clone, Copy, ValueEnum)]
enum CommitmentArg {
    Processed,
    Confirmed,
    Finalized,
}

impl From<CommitmentArg> for Commitment {
    fn from(arg: CommitmentArg) -> Self {
        match arg {
            CommitmentArg::Processed => Commitment::Processed,
            CommitmentArg::Confirmed => Commitment::Confirmed,
            CommitmentArg::Finalized => Commitment::Finalized,
        }
    }
}

impl RunArgs {
    fn apply(self, config: &mut RelayConfig) {
        if let Some(url) = self.upstream_url {
            config.upstream.ws_url = url;
        }
        if let Some(program_id) = self.program_id {
            config.upstream.program_id = program_id;
        }
        if let Some(commitment) = self.commitment {
            config.upstream.commitment = commitment.into();
        }
        if let Some(delay) = self.reconnect_delay_ms {
            config.upstream.reconnect_delay_ms = delay;
        }
        if let Some(listen) = self.listen {
            config.server.listen_addr = listen;
        }
        if let Some(level) = self.log_level {
            config.log.level = level;
        }
        if self.json_logs {
            config.log.json = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = RelayConfig::load(cli.config.as_deref())?;

    match resolve_command(cli.command)? {
        Commands::Run(args) => {
            args.apply(&mut config);
            cmd_run(config).await
        }
        Commands::Decode { line } => cmd_decode(&line),
    }
}

/// `run` is the default subcommand.
fn resolve_command(command: Option<Commands>) -> Result<Commands> {
    match command {
        Some(command) => Ok(command),
        None => Ok(Commands::Run(DefaultRun::try_parse_from(["chainrelay"])?.args)),
    }
}

async fn cmd_run(config: RelayConfig) -> Result<()> {
    init_tracing(&config.log);
    info!(version = env!("CARGO_PKG_VERSION"), "starting chainrelay");

    let registry = ClientRegistry::new();
    let broadcaster = Arc::new(Broadcaster::new(registry.clone()));

    let source = Arc::new(SolanaWsSource::new(config.upstream.ws_url.clone()));
    let upstream = UpstreamConnector::new(source, &config.upstream, broadcaster).spawn();

    let listener = TcpListener::bind(&config.server.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.server.listen_addr))?;

    RelayServer::new(registry, config.server)
        .serve(listener, shutdown_signal())
        .await
        .context("WebSocket server failed")?;

    upstream.abort();
    info!("chainrelay stopped");
    Ok(())
}

fn cmd_decode(line: &str) -> Result<()> {
    match LogPipeline::default().process_line(line)? {
        Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
        None => println!("no relayed event in line"),
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl-C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
