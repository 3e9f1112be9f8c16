//! Container-level wire shapes.

use serde::{Deserialize, Serialize};

/// One entry of an account listing (`GET /v1/{account}?format=json`).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ContainerSummary {
    /// Container name, unique per account.
    pub name: String,

    /// Number of objects currently in the container.
    pub count: u64,

    /// Total payload bytes across those objects.
    pub bytes: u64,
}

/// Metadata returned by a container HEAD.
///
/// For a live container `object_count` reflects current objects only;
/// for a versions container it reflects the retained version count.
#[derive(Clone, Copy, Debug)]
pub struct ContainerInfo {
    pub object_count: u64,
    pub bytes_used: u64,
}
