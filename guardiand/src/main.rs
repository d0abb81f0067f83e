use anyhow::Context;
use clap::Parser;
use guardiand::api::{self, AppState};
use guardiand::simulator::VitalsSimulator;
use guardiand::{Config, MemberStore, Metrics, Roster};
use log::{info, warn};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[clap(version, about = "Health Guardian daemon")]
struct Args {
    /// Path to the TOML configuration file
    #[clap(long)]
    config: Option<PathBuf>,

    /// Override the listen address from the configuration
    #[clap(long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config_path = Config::resolve_path(args.config.as_deref());
    let mut config = Config::load_from(&config_path)?;
    if let Some(listen) = args.listen {
        config.server.listen_addr = listen.to_string();
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();
    if config_path.exists() {
        info!("[config] loaded {}", config_path.display());
    } else {
        info!("[config] {} not found, using defaults", config_path.display());
    }

    let store = match &config.store.db_path {
        Some(path) => MemberStore::open(path)
            .await
            .with_context(|| format!("opening member store at {}", path.display()))?,
        None => {
            warn!("[store] no db_path configured; members will not survive a restart");
            MemberStore::in_memory().await?
        }
    };

    let roster = Arc::new(
        Roster::from_store(&store)
            .await
            .context("loading members")?,
    );
    info!("[guardiand] loaded {} members", roster.len().await);

    let metrics = Arc::new(Metrics::new());
    let simulator = VitalsSimulator::new(config.simulator.clone())
        .spawn(Arc::clone(&roster), Arc::clone(&metrics));

    let listen_addr = config.server.listen_addr.clone();
    let state = Arc::new(AppState::new(config, store, roster, metrics)?);
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("binding {listen_addr}"))?;
    info!("[guardiand] listening on http://{listen_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    simulator.abort();
    info!("[guardiand] stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("[guardiand] failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("[guardiand] shutdown requested");
}
