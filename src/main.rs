use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crop_yield::{artifacts, server, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = AppConfig::from_env()?;
    tracing::info!(
        model = %cfg.model_path.display(),
        features = %cfg.features_path.display(),
        thresholds = %cfg.thresholds_path.display(),
        "loading artifacts"
    );

    let ctx = artifacts::load_context(&cfg).context("cannot serve predictions")?;
    let t = ctx.thresholds();
    tracing::info!(
        "loaded model; feat_list[{}], thresholds=({}, {}) from {:?}, encoding={:?}",
        ctx.schema().len(),
        t.low(),
        t.high(),
        ctx.threshold_source(),
        ctx.encoder().policy()
    );

    let app = server::router(Arc::new(ctx));

    let addr = cfg.socket_addr();
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}
