//! Reference gateway fixture.
//!
//! A compact axum server implementing exactly the Swift surface the
//! scenarios exercise, backed by a plain directory tree whose layout is
//! the mount layout. Integration tests [`spawn`] it in-process; the
//! `swift-gateway` binary serves the same router standalone. Against a
//! real deployment, the suite skips this module entirely and talks to
//! the external endpoint.

pub mod handlers;
pub mod health;
pub mod routes;
pub mod store;

pub use store::{GatewayStore, StoreError};

use crate::collate::Collation;
use crate::config::GatewayConfig;
use crate::errors::{AppError, Result};
use axum::http::HeaderMap;
use std::{
    collections::HashSet,
    path::PathBuf,
    sync::{Arc, Mutex},
};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

/// Shared state carried by every handler.
#[derive(Clone)]
pub struct GatewayState {
    pub store: GatewayStore,
    pub account: String,
    pub user: String,
    pub key: String,
    /// Advertised in the auth response's `X-Storage-Url`.
    pub storage_url: String,
    tokens: Arc<Mutex<HashSet<String>>>,
}

impl GatewayState {
    pub(crate) fn insert_token(&self, token: String) {
        self.tokens
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .insert(token);
    }

    /// Every `/v1` request must carry a live token and address the
    /// configured account.
    pub(crate) fn check_request(&self, account: &str, headers: &HeaderMap) -> std::result::Result<(), AppError> {
        let token = headers
            .get("X-Auth-Token")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("missing X-Auth-Token"))?;
        let known = self
            .tokens
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .contains(token);
        if !known {
            return Err(AppError::unauthorized("bad or expired token"));
        }
        if account != format!("AUTH_{}", self.account) {
            return Err(AppError::not_found(format!("account `{account}` not found")));
        }
        Ok(())
    }
}

/// Build handler state for a gateway advertised at `base_url`.
pub fn build_state(config: &GatewayConfig, base_url: &str) -> Result<GatewayState> {
    let collation = Collation::new(&config.locale)?;
    let store = GatewayStore::new(config.root.join(&config.account), collation);
    Ok(GatewayState {
        store,
        account: config.account.clone(),
        user: config.user.clone(),
        key: config.key.clone(),
        storage_url: format!("{base_url}/v1/AUTH_{}", config.account),
        tokens: Arc::new(Mutex::new(HashSet::new())),
    })
}

/// A running in-process gateway. Dropping the handle shuts the server
/// down gracefully.
pub struct GatewayHandle {
    pub base_url: String,
    pub auth_url: String,
    /// Root directory containing the per-account tree; this is what a
    /// mount probe should be pointed at.
    pub data_root: PathBuf,
    _shutdown_tx: oneshot::Sender<()>,
    _server: JoinHandle<()>,
}

/// Bind, spawn, and return a handle to an in-process gateway.
pub async fn spawn(config: &GatewayConfig) -> Result<GatewayHandle> {
    let account_root = config.root.join(&config.account);
    tokio::fs::create_dir_all(&account_root).await?;

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let addr = listener.local_addr()?;
    let base_url = format!("http://{addr}");

    let state = build_state(config, &base_url)?;
    let app = routes::routes().with_state(state);

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let server = tokio::spawn(async move {
        let serve = axum::serve(listener, app).with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });
        if let Err(err) = serve.await {
            tracing::error!("gateway server error: {err}");
        }
    });

    Ok(GatewayHandle {
        auth_url: format!("{base_url}/auth/v1.0"),
        base_url,
        data_root: config.root.clone(),
        _shutdown_tx: shutdown_tx,
        _server: server,
    })
}
