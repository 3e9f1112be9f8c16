//! Object handle: read/write/delete one object and fetch its metadata.

use crate::client::connection::{Connection, ensure_success, header_value};
use crate::errors::{Error, Result};
use crate::models::ObjectInfo;
use rand::RngCore;
use reqwest::{Method, StatusCode};

/// Headers accepted by [`ObjectHandle::write`].
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    pub content_type: Option<String>,
    /// `X-Object-Manifest`: `container/prefix` declaring a dynamic large
    /// object assembled from all objects sharing that prefix.
    pub manifest: Option<String>,
}

impl WriteOptions {
    pub fn content_type(value: impl Into<String>) -> Self {
        Self {
            content_type: Some(value.into()),
            ..Self::default()
        }
    }
}

/// Handle to one object within a container.
pub struct ObjectHandle<'a> {
    conn: &'a Connection,
    container: String,
    name: String,
}

impl<'a> ObjectHandle<'a> {
    pub(crate) fn new(conn: &'a Connection, container: String, name: String) -> Self {
        Self {
            conn,
            container,
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// PUT the object. Zero-length bodies are valid (directory markers,
    /// manifest markers). Returns the status (201 on success).
    pub async fn write(&self, data: &[u8], opts: &WriteOptions) -> Result<StatusCode> {
        let url = self.conn.url_for(&self.container, Some(&self.name))?;
        let mut request = self.conn.request(Method::PUT, url)?;
        if let Some(content_type) = &opts.content_type {
            request = request.header("Content-Type", content_type);
        }
        if let Some(manifest) = &opts.manifest {
            request = request.header("X-Object-Manifest", manifest);
        }
        let response = request.body(data.to_vec()).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.status())
    }

    /// Write `size` pseudo-random bytes and return them, so callers can
    /// assert content and ETag later.
    pub async fn write_random(&self, size: usize, opts: &WriteOptions) -> Result<Vec<u8>> {
        let mut data = vec![0u8; size];
        rand::thread_rng().fill_bytes(&mut data);
        self.write(&data, opts).await?;
        Ok(data)
    }

    /// GET the object's bytes. For a manifest object this is the
    /// concatenation of its segments, never the zero-length marker body.
    pub async fn read(&self) -> Result<Vec<u8>> {
        let url = self.conn.url_for(&self.container, Some(&self.name))?;
        let response = self.conn.request(Method::GET, url)?.send().await?;
        let response = ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// HEAD the object. The result is consistent with what [`read`]
    /// produces.
    ///
    /// [`read`]: ObjectHandle::read
    pub async fn info(&self) -> Result<ObjectInfo> {
        let url = self.conn.url_for(&self.container, Some(&self.name))?;
        let response = self.conn.request(Method::HEAD, url)?.send().await?;
        let response = ensure_success(response).await?;

        let etag = required(&response, "ETag")?;
        // Some gateways quote ETags S3-style.
        let etag = etag.trim_matches('"').to_string();
        let content_length = required(&response, "Content-Length")?
            .parse()
            .map_err(|_| Error::Listing("bad Content-Length".into()))?;
        Ok(ObjectInfo {
            etag,
            content_length,
            content_type: required(&response, "Content-Type")?,
            last_modified: required(&response, "Last-Modified")?,
        })
    }

    /// DELETE the object (204). In a versioned container the next-older
    /// version becomes current.
    pub async fn delete(&self) -> Result<StatusCode> {
        let url = self.conn.url_for(&self.container, Some(&self.name))?;
        let response = self.conn.request(Method::DELETE, url)?.send().await?;
        let response = ensure_success(response).await?;
        Ok(response.status())
    }
}

fn required(response: &reqwest::Response, name: &str) -> Result<String> {
    header_value(response, name).ok_or_else(|| Error::Listing(format!("missing {name} header")))
}
