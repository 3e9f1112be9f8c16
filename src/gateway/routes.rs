//! Defines routes for the Swift v1 surface.
//!
//! ## Structure
//! - **Auth**
//!   - `GET /auth/v1.0` — tempauth handshake
//! - **Account-level endpoints**
//!   - `GET    /v1/{account}` — list containers
//! - **Container-level endpoints**
//!   - `PUT    /v1/{account}/{container}` — create container
//!   - `GET    /v1/{account}/{container}` — list objects (path, prefix, format)
//!   - `HEAD   /v1/{account}/{container}` — object count / bytes used
//!   - `DELETE /v1/{account}/{container}` — delete empty container
//! - **Object-level endpoints**
//!   - `PUT    /v1/{account}/{container}/{*object}` — upload object
//!   - `GET    /v1/{account}/{container}/{*object}` — download object
//!   - `HEAD   /v1/{account}/{container}/{*object}` — metadata only
//!   - `DELETE /v1/{account}/{container}/{*object}` — delete object
//!
//! The wildcard `*object` allows nested keys like `dir1/subdir1/file2`.

use crate::gateway::{
    GatewayState,
    handlers::{
        authenticate, create_container, delete_container, delete_object, get_object,
        head_container, head_object, list_containers, list_objects, put_object,
    },
    health::{healthz, readyz},
};
use axum::{
    Router,
    routing::{get, put},
};

/// Build and return the router for the whole gateway surface.
///
/// The router carries shared state (`GatewayState`) to all handlers.
pub fn routes() -> Router<GatewayState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // auth handshake
        .route("/auth/v1.0", get(authenticate))
        // Account-level routes
        .route("/v1/{account}", get(list_containers))
        // Object-level routes
        .route(
            "/v1/{account}/{container}/{*object}",
            put(put_object)
                .get(get_object)
                .head(head_object)
                .delete(delete_object),
        )
        // Container-level routes
        .route(
            "/v1/{account}/{container}",
            put(create_container)
                .get(list_objects)
                .head(head_container)
                .delete(delete_container),
        )
}
