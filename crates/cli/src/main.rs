//! padbridge - Cemuhook DSU bridge CLI
//!
//! `padbridge serve` runs the DSU server, optionally with synthetic pads so
//! a consumer can be tested without hardware. `padbridge probe` performs a
//! version handshake against a running DSU server.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use padbridge_dsu_protocol as dsu;
use padbridge_server::{DsuServer, ServerConfig, SyntheticSource};
use tokio::net::UdpSocket;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "padbridge")]
#[command(about = "Bridge motion-sensing gamepads to Cemuhook DSU clients")]
#[command(version)]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the DSU server
    Serve {
        /// UDP port to listen on
        #[arg(long, env = "PADBRIDGE_UDP_PORT")]
        port: Option<u16>,

        /// Address to bind
        #[arg(long, env = "PADBRIDGE_BIND_ADDRESS")]
        bind: Option<IpAddr>,

        /// Client subscription timeout in milliseconds
        #[arg(long, env = "PADBRIDGE_CLIENT_TIMEOUT_MS")]
        client_timeout_ms: Option<u64>,

        /// Mount this many synthetic demo pads (0-4)
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=4))]
        synthetic_pads: u8,
    },

    /// Send a version request to a DSU server and print the reply
    Probe {
        /// Server endpoint
        #[arg(default_value = "127.0.0.1:26760")]
        endpoint: String,

        /// How long to wait for the reply, in milliseconds
        #[arg(long, default_value_t = 1000)]
        timeout_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("padbridge={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Serve {
            port,
            bind,
            client_timeout_ms,
            synthetic_pads,
        } => serve(port, bind, client_timeout_ms, synthetic_pads).await,
        Commands::Probe {
            endpoint,
            timeout_ms,
        } => probe(&endpoint, timeout_ms).await,
    }
}

async fn serve(
    port: Option<u16>,
    bind: Option<IpAddr>,
    client_timeout_ms: Option<u64>,
    synthetic_pads: u8,
) -> Result<()> {
    let mut config = ServerConfig::from_env();
    if let Some(port) = port {
        config = config.with_port(port);
    }
    if let Some(bind) = bind {
        config = config.with_bind_address(bind);
    }
    if let Some(ms) = client_timeout_ms {
        config = config.with_client_timeout(Duration::from_millis(ms));
    }

    let mut server = DsuServer::new(config);

    let mut errors = server
        .take_error_stream()
        .context("error stream already taken")?;
    let _error_logger = tokio::spawn(async move {
        while let Some(error) = errors.recv().await {
            warn!(%error, "server error");
        }
    });

    for index in 0..synthetic_pads {
        let mounted = server
            .add_source(Arc::new(SyntheticSource::new(index)))
            .await?;
        if !mounted {
            warn!(index, "no free slot for synthetic pad");
        }
    }

    let local_addr = server.start().await?;
    let server_id = format!("{:#010x}", server.server_id());
    info!(%local_addr, %server_id, "padbridge serving");
    if synthetic_pads > 0 {
        info!(synthetic_pads, "synthetic demo pads mounted");
    }

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutting down");
    server.remove_all_sources().await?;
    server.stop().await?;
    Ok(())
}

async fn probe(endpoint: &str, timeout_ms: u64) -> Result<()> {
    let socket = UdpSocket::bind("0.0.0.0:0").await.context("bind probe socket")?;
    let client_id: u32 = rand::random();

    socket
        .send_to(&dsu::version_request(client_id), endpoint)
        .await
        .with_context(|| format!("send version request to {endpoint}"))?;

    let mut buf = [0u8; 256];
    let (len, from) = tokio::time::timeout(
        Duration::from_millis(timeout_ms),
        socket.recv_from(&mut buf),
    )
    .await
    .with_context(|| format!("no reply from {endpoint} within {timeout_ms} ms"))?
    .context("receive reply")?;

    match dsu::parse_response(&buf[..len])? {
        dsu::Response::Version { max_version } => {
            println!("{from}: DSU server, protocol version {max_version}");
        }
        other => {
            println!("{from}: unexpected reply {other:?}");
        }
    }
    Ok(())
}
