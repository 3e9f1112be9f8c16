//! Account handle: container enumeration and wholesale cleanup.

use crate::client::connection::{Connection, ensure_success};
use crate::client::container::{Container, ListFormat, ListParams};
use crate::errors::{Error, Result};
use crate::models::ContainerSummary;
use reqwest::{Method, StatusCode};

/// Handle to the authenticated account.
pub struct Account<'a> {
    conn: &'a Connection,
}

impl<'a> Account<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// A handle to `name`, whether or not the container exists.
    pub fn container(&self, name: impl Into<String>) -> Container<'a> {
        Container::new(self.conn, name.into())
    }

    /// Container names in listing order.
    pub async fn containers(&self) -> Result<Vec<String>> {
        let url = self.conn.storage_url()?.clone();
        let request = self
            .conn
            .request(Method::GET, url)?
            .query(&[("format", "json")]);
        let response = ensure_success(request.send().await?).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        let summaries: Vec<ContainerSummary> = serde_json::from_str(&response.text().await?)
            .map_err(|err| Error::Listing(format!("bad account listing: {err}")))?;
        Ok(summaries.into_iter().map(|s| s.name).collect())
    }

    /// Empty and delete every container. Idempotent: missing containers
    /// and objects are tolerated.
    ///
    /// Objects are deleted deepest-first so directory markers fall after
    /// their children. A container with a versions location resurrects an
    /// older version on each delete, so the drain loops until a listing
    /// comes back empty.
    pub async fn delete_containers(&self) -> Result<()> {
        for name in self.containers().await? {
            let container = self.container(&name);
            loop {
                let mut keys = match container.files(&ListParams::format(ListFormat::Json)).await {
                    Ok(keys) => keys,
                    Err(Error::Response { status, .. }) if status == StatusCode::NOT_FOUND => break,
                    Err(err) => return Err(err),
                };
                if keys.is_empty() {
                    break;
                }
                keys.sort_by(|a, b| {
                    let depth_a = a.matches('/').count();
                    let depth_b = b.matches('/').count();
                    depth_b.cmp(&depth_a).then_with(|| b.cmp(a))
                });
                for key in keys {
                    ignore_not_found(container.object(key).delete().await.map(drop))?;
                }
            }
            ignore_not_found(container.delete().await.map(drop))?;
        }
        Ok(())
    }
}

fn ignore_not_found(result: Result<()>) -> Result<()> {
    match result {
        Err(Error::Response { status, .. }) if status == StatusCode::NOT_FOUND => Ok(()),
        other => other,
    }
}
