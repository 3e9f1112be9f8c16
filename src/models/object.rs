//! Object-level wire shapes: listing records and HEAD results.

use serde::{Deserialize, Serialize};

/// One entry of a detailed container listing.
///
/// The same field names appear in the JSON array form and as child
/// elements of `<object>` in the XML form, so a single struct
/// deserializes both.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ObjectRecord {
    /// Object key; may contain `/` segments forming a virtual hierarchy.
    pub name: String,

    /// Content MD5 in lowercase hex (the ETag).
    pub hash: String,

    /// Payload size in bytes. Zero for directory markers.
    pub bytes: u64,

    /// MIME type; `application/directory` marks a pseudo-directory.
    pub content_type: String,

    /// Last modification timestamp as rendered by the gateway.
    pub last_modified: String,
}

impl ObjectRecord {
    /// Whether this entry is a pseudo-directory marker.
    pub fn is_directory(&self) -> bool {
        self.content_type == "application/directory"
    }
}

/// Metadata returned by an object HEAD, consistent with the bytes a GET
/// of the same object produces.
#[derive(Clone, Debug)]
pub struct ObjectInfo {
    pub etag: String,
    pub content_length: u64,
    pub content_type: String,
    pub last_modified: String,
}
