use anyhow::Context;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use premium_core::{config::Config, pipeline::AppCore};
use premium_server::{serve, AppState};
use std::{net::SocketAddr, path::PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Optional TOML config; flags below override it.
    #[arg(long, env = "PREMIUM_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "PREMIUM_BIND")]
    bind: Option<SocketAddr>,

    /// Directory with model.json / model.json.gz / model_v<N>.json
    #[arg(long, env = "PREMIUM_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    #[arg(long, env = "PREMIUM_SERVICE_NAME")]
    service_name: Option<String>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(bind) = self.bind {
            cfg.bind_addr = bind;
        }
        if let Some(dir) = self.model_dir {
            cfg.model_dir = dir;
        }
        if let Some(name) = self.service_name {
            cfg.service_name = name;
        }
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // metrics
    let prom = PrometheusBuilder::new()
        .install_recorder()
        .context("install prometheus recorder")?;

    let cfg = Args::parse().into_config()?;
    let addr = cfg.bind_addr;

    // the model is loaded once and shared read-only afterwards
    let core = AppCore::from_config(cfg)?;
    tracing::info!(
        model_dir = %core.runtime.model_dir.display(),
        model = %core.runtime.model_path.display(),
        proba = core.supports_proba(),
        "model ready"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!("premium-server listening on http://{addr}");

    serve(listener, AppState::new(core, prom)).await?;
    Ok(())
}
