/*
annotator - single-binary main.rs
This binary starts the Rocket ingress and runs the pipeline worker inside the same process.
*/

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use annotator::clustering::remote::RemoteClusterer;
use annotator::collage;
use annotator::gateway::http::HttpGateway;
use annotator::gateway::ServiceGateway;
use annotator::models::Source;
use annotator::pipeline::Pipeline;
use annotator::server::{launch_rocket, AppState};
use annotator::subscriber::subscribe_to_publisher;
use annotator::worker::spawn_worker;

#[derive(Parser, Debug)]
#[command(name = "annotator", about = "News post aggregation service")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Do not register with the publisher at startup
    #[arg(long)]
    no_subscribe: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a collage from image URLs and report its size
    Collage {
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = load_config(args.config.clone()).await?;
    let config = Arc::new(config);

    let gateway: Arc<dyn ServiceGateway> =
        Arc::new(HttpGateway::new(&config.services).context("failed to build service gateway")?);

    if let Some(Command::Collage { urls }) = args.command {
        return debug_collage(gateway.as_ref(), &config, urls).await;
    }

    let clusterer = Arc::new(
        RemoteClusterer::new(&config.services.clustering_host, config.services.timeout_seconds())
            .context("failed to build clustering client")?,
    );
    let pipeline = Arc::new(Pipeline::new(config.clone(), gateway, clusterer));

    // Prepare a shutdown notifier to signal the worker
    let shutdown_notify = Arc::new(Notify::new());
    let (queue, worker_handle) = spawn_worker(pipeline, shutdown_notify.clone());

    if config.subscriber.enabled && !args.no_subscribe {
        if let Err(e) = subscribe_to_publisher(&config.subscriber).await {
            warn!("publisher registration failed: {:#}", e);
        }
    }

    info!("Launching Rocket HTTP server");
    if let Err(e) = launch_rocket(AppState::new(queue), &config.server).await {
        error!(%e, "Rocket server failed");
    }

    info!("HTTP server stopped; notifying worker to shutdown");
    shutdown_notify.notify_one();

    match tokio::time::timeout(Duration::from_secs(20), worker_handle).await {
        Ok(Ok(())) => info!("worker exited cleanly"),
        Ok(Err(join_err)) => error!(%join_err, "worker task panicked"),
        Err(_) => info!("Timed out waiting for worker to exit; continuing shutdown"),
    }

    info!("Shutdown complete");
    Ok(())
}

async fn load_config(explicit: Option<PathBuf>) -> Result<Config> {
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = explicit {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() {
            Some(p)
        } else {
            None
        }
    };

    let mut config = Config::load_with_defaults(
        if default_path.exists() { Some(&default_path) } else { None },
        override_path.as_deref(),
    )
    .await?;
    config.apply_env_overrides();
    config.services.validate()?;

    info!(default = ?default_path, override = ?override_path, "configuration loaded");
    Ok(config)
}

async fn debug_collage(gateway: &dyn ServiceGateway, config: &Config, urls: Vec<String>) -> Result<()> {
    let sources: Vec<Source> = urls
        .into_iter()
        .enumerate()
        .map(|(i, url)| Source {
            id: format!("debug-{}", i),
            link: url.clone(),
            date: None,
            media: Some(url),
        })
        .collect();
    let members: Vec<&Source> = sources.iter().collect();

    match collage::make_collage(gateway, &members, &config.collage).await {
        Some(uri) => {
            println!("collage built: {} bytes of data URI", uri.len());
            Ok(())
        }
        None => anyhow::bail!("collage could not be built"),
    }
}
