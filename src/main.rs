// ABOUTME: Entry point for the switchgate binary.
// ABOUTME: Loads configuration, initializes tracing, serves an in-memory switch until Ctrl-C.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use switchgate_core::schema::Worker;
use switchgate_core::{InMemorySwitch, SwitchSeed, Switcher};
use switchgate_server::{Gateway, GatewayConfig, SnapshotApi};

/// Control-plane HTTP gateway for an overlay-network switch.
#[derive(Debug, Parser)]
#[command(name = "switchgate", version, about)]
struct Cli {
    /// Address to listen on (overrides SWITCHGATE_LISTEN).
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// File holding the admin token (overrides SWITCHGATE_TOKEN_FILE).
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// Directory with index.html and static files (overrides SWITCHGATE_PUBLIC_DIR).
    #[arg(long)]
    public: Option<PathBuf>,

    /// PEM certificate; TLS is enabled when given together with --key.
    #[arg(long, requires = "key")]
    cert: Option<PathBuf>,

    /// PEM private key for --cert.
    #[arg(long, requires = "cert")]
    key: Option<PathBuf>,

    /// Use this admin token instead of the persisted one. It is saved back to the token file.
    #[arg(long)]
    token: Option<String>,

    /// JSON file describing the switch state to serve.
    #[arg(long)]
    seed: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, config: &mut GatewayConfig) {
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if let Some(path) = &self.token_file {
            config.token_file = path.clone();
        }
        if let Some(dir) = &self.public {
            config.public_dir = dir.clone();
        }
        if let (Some(cert), Some(key)) = (&self.cert, &self.key) {
            config.cert_file = Some(cert.clone());
            config.key_file = Some(key.clone());
        }
    }
}

fn build_switch(seed: Option<&PathBuf>) -> anyhow::Result<InMemorySwitch> {
    match seed {
        Some(path) => {
            let seed = SwitchSeed::from_file(path)?;
            tracing::info!(
                "seeded switch from {}: {} points, {} links, {} networks",
                path.display(),
                seed.points.len(),
                seed.links.len(),
                seed.networks.len()
            );
            Ok(InMemorySwitch::from_seed(seed))
        }
        None => Ok(InMemorySwitch::new(Worker {
            alias: "switchgate".to_string(),
            ..Default::default()
        })),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "switchgate=info,switchgate_server=info,tower_http=info",
                )
            }),
        )
        .init();

    let mut config = GatewayConfig::from_env().context("invalid configuration")?;
    cli.apply(&mut config);

    let switcher: Arc<dyn Switcher> = Arc::new(build_switch(cli.seed.as_ref())?);
    let api = SnapshotApi::new(Arc::clone(&switcher));

    let gateway = Gateway::initialize(config, switcher, &api, cli.token.clone());
    tracing::info!(
        "admin token stored in {}; guest token is derived from it",
        gateway.token_file().display()
    );

    gateway.start().await;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    tracing::info!("shutting down");
    gateway.shutdown().await;

    Ok(())
}
