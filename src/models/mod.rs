//! Core data models shared by the client object model and the gateway.
//!
//! These entities mirror the wire shapes of the Swift v1 API: listing
//! records, HEAD results, and account summaries. One struct covers both
//! the JSON and XML listing forms via `serde`.

pub mod container;
pub mod object;

pub use container::{ContainerInfo, ContainerSummary};
pub use object::{ObjectInfo, ObjectRecord};
