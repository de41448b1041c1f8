use air_quality_forecaster::{api, config, service, telemetry};
use anyhow::Result;
use config::Config;
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::load()?;

    // Bootstrap may train a full model set; keep it off the async workers
    let bootstrap_cfg = cfg.clone();
    let app_state =
        tokio::task::spawn_blocking(move || service::AppState::bootstrap(bootstrap_cfg)).await??;

    let app = api::router(app_state);
    let addr = cfg.server.socket_addr()?;

    if cfg.server.host == "0.0.0.0" {
        warn!("server binding to 0.0.0.0 - service will be reachable from the network");
    }

    info!(%addr, "starting Air Quality Forecaster");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
