//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks data-root disk I/O

use crate::gateway::GatewayState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::{collections::HashMap, path::Path};
use tokio::fs;
use uuid::Uuid;

/// `GET /healthz`
///
/// Very small liveness probe — always returns 200 OK with a plain JSON
/// body. This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe performing a best-effort write/read/delete against
/// the store's data root. Returns JSON describing the check; HTTP 200
/// when it passes, HTTP 503 when it fails.
pub async fn readyz(State(state): State<GatewayState>) -> impl IntoResponse {
    let disk = disk_roundtrip(state.store.root()).await;
    let disk_ok = disk.is_ok();

    let mut checks = HashMap::new();
    checks.insert(
        "disk",
        CheckStatus {
            ok: disk_ok,
            error: disk.err(),
        },
    );

    let body = ReadyResponse {
        status: if disk_ok { "ok".into() } else { "error".into() },
        checks,
    };

    let status = if disk_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

/// Write, read back, and remove a probe file under `root`.
async fn disk_roundtrip(root: &Path) -> Result<(), String> {
    let tmp_path = root.join(format!(".readyz-{}", Uuid::new_v4()));
    fs::write(&tmp_path, b"readyz")
        .await
        .map_err(|e| format!("could not write tmp file: {e}"))?;
    let outcome = match fs::read(&tmp_path).await {
        Ok(bytes) if bytes == b"readyz" => Ok(()),
        Ok(_) => Err("file content mismatch".to_string()),
        Err(e) => Err(format!("could not read tmp file: {e}")),
    };
    let _ = fs::remove_file(&tmp_path).await;
    outcome
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
