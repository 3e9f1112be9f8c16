//! Functional conformance harness for OpenStack Swift–compatible object
//! storage gateways that expose their object tree through a POSIX mount.
//!
//! The crate has three faces:
//!
//! - [`client`] — a typed async object model (`Connection`, `Account`,
//!   `Container`, `ObjectHandle`) over the Swift v1 HTTP API.
//! - [`probe`] — direct filesystem access to the backing mount, used to
//!   cross-check HTTP-visible state against filesystem-visible state.
//! - [`gateway`] — a compact reference gateway implementing exactly the
//!   Swift surface the scenarios exercise, backed by a plain directory
//!   tree. The integration tests spin it up in-process; it also ships as
//!   the `swift-gateway` binary.
//!
//! The functional scenarios themselves live under `tests/`.

pub mod client;
pub mod collate;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod probe;

pub use errors::{Error, Result};
