use anyhow::Result;
use axum::Router;
use std::{fs, io::ErrorKind};
use swift_conformance::{config::GatewayConfig, gateway};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = GatewayConfig::from_env_and_args()?;

    tracing::info!("Starting swift-gateway with config: {:?}", cfg);

    // --- Ensure the account directory exists ---
    let account_root = cfg.root.join(&cfg.account);
    if !account_root.exists() {
        fs::create_dir_all(&account_root)?;
        tracing::info!("Created data directory at {}", account_root.display());
    }

    // --- Bind first so the advertised storage URL carries the real port ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };
    let base_url = format!("http://{}", listener.local_addr()?);

    // --- Build router ---
    let state = gateway::build_state(&cfg, &base_url)?;
    let app: Router = gateway::routes::routes().with_state(state);

    // --- Start server ---
    tracing::info!("Gateway listening on {}", base_url);
    axum::serve(listener, app).await?;

    Ok(())
}
