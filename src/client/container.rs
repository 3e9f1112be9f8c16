//! Container handle: create/delete, listings, HEAD metadata.

use crate::client::connection::{Connection, ensure_success, header_value};
use crate::client::object::ObjectHandle;
use crate::errors::{Error, Result};
use crate::models::{ContainerInfo, ObjectRecord};
use reqwest::{Method, StatusCode};
use serde::Deserialize;

/// Wire format of a container listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListFormat {
    /// Newline-separated names; an empty listing is a 204.
    #[default]
    Plain,
    Json,
    Xml,
}

/// Parameters for [`Container::files`] and [`Container::files_detailed`].
///
/// `path` restricts the listing to the direct children of a prefix; the
/// empty string means the top level. `prefix` is a plain name-prefix
/// filter.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub path: Option<String>,
    pub prefix: Option<String>,
    pub format: ListFormat,
}

impl ListParams {
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn format(format: ListFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }
}

/// Headers accepted by [`Container::create`].
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// `X-Versions-Location`: name of the container that retains
    /// overwritten and deleted versions.
    pub versions_location: Option<String>,
    pub content_type: Option<String>,
}

/// Handle to one container, which may or may not exist yet.
pub struct Container<'a> {
    conn: &'a Connection,
    name: String,
}

impl<'a> Container<'a> {
    pub(crate) fn new(conn: &'a Connection, name: String) -> Self {
        Self { conn, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn object(&self, name: impl Into<String>) -> ObjectHandle<'a> {
        ObjectHandle::new(self.conn, self.name.clone(), name.into())
    }

    /// PUT the container. Idempotent: 201 when created, 202 when it
    /// already existed. Returns the status so scenarios can assert it.
    pub async fn create(&self, opts: &CreateOptions) -> Result<StatusCode> {
        let url = self.conn.url_for(&self.name, None)?;
        let mut request = self.conn.request(Method::PUT, url)?;
        if let Some(location) = &opts.versions_location {
            request = request.header("X-Versions-Location", location);
        }
        if let Some(content_type) = &opts.content_type {
            request = request.header("Content-Type", content_type);
        }
        let response = ensure_success(request.send().await?).await?;
        Ok(response.status())
    }

    /// DELETE the container; the gateway requires it to be empty.
    pub async fn delete(&self) -> Result<StatusCode> {
        let url = self.conn.url_for(&self.name, None)?;
        let response = self.conn.request(Method::DELETE, url)?.send().await?;
        let response = ensure_success(response).await?;
        Ok(response.status())
    }

    /// Object names in listing order.
    pub async fn files(&self, params: &ListParams) -> Result<Vec<String>> {
        match params.format {
            ListFormat::Plain => {
                let response = self.list_request(params, None).await?;
                if response.status() == StatusCode::NO_CONTENT {
                    return Ok(Vec::new());
                }
                let text = response.text().await?;
                Ok(text.lines().map(str::to_string).collect())
            }
            ListFormat::Json | ListFormat::Xml => Ok(self
                .files_detailed(params)
                .await?
                .into_iter()
                .map(|record| record.name)
                .collect()),
        }
    }

    /// Full listing records. A `Plain` format here is promoted to JSON.
    pub async fn files_detailed(&self, params: &ListParams) -> Result<Vec<ObjectRecord>> {
        let format = match params.format {
            ListFormat::Xml => "xml",
            _ => "json",
        };
        let response = self.list_request(params, Some(format)).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        let text = response.text().await?;
        if format == "xml" {
            let listing: XmlListing = quick_xml::de::from_str(&text)?;
            Ok(listing.objects)
        } else {
            serde_json::from_str(&text)
                .map_err(|err| Error::Listing(format!("bad json listing: {err}")))
        }
    }

    /// HEAD the container for its object count and byte total.
    pub async fn info(&self) -> Result<ContainerInfo> {
        let url = self.conn.url_for(&self.name, None)?;
        let response = self.conn.request(Method::HEAD, url)?.send().await?;
        let response = ensure_success(response).await?;
        Ok(ContainerInfo {
            object_count: header_u64(&response, "X-Container-Object-Count")?,
            bytes_used: header_u64(&response, "X-Container-Bytes-Used")?,
        })
    }

    async fn list_request(
        &self,
        params: &ListParams,
        format: Option<&str>,
    ) -> Result<reqwest::Response> {
        let url = self.conn.url_for(&self.name, None)?;
        let mut request = self.conn.request(Method::GET, url)?;
        if let Some(path) = &params.path {
            request = request.query(&[("path", path.as_str())]);
        }
        if let Some(prefix) = &params.prefix {
            request = request.query(&[("prefix", prefix.as_str())]);
        }
        if let Some(format) = format {
            request = request.query(&[("format", format)]);
        }
        ensure_success(request.send().await?).await
    }
}

fn header_u64(response: &reqwest::Response, name: &str) -> Result<u64> {
    let value =
        header_value(response, name).ok_or_else(|| Error::Listing(format!("missing {name}")))?;
    value
        .parse()
        .map_err(|_| Error::Listing(format!("bad {name} value `{value}`")))
}

#[derive(Deserialize)]
struct XmlListing {
    #[serde(rename = "object", default)]
    objects: Vec<ObjectRecord>,
}
