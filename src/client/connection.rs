//! Auth handshake and request plumbing shared by all handles.

use crate::errors::{Error, Result};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use tracing::debug;

/// Holds the endpoint, credentials, and — after [`authenticate`] — the
/// storage URL and token every request carries.
///
/// [`authenticate`]: Connection::authenticate
#[derive(Debug)]
pub struct Connection {
    http: reqwest::Client,
    auth_url: String,
    username: String,
    key: String,
    storage_url: Option<Url>,
    token: Option<String>,
}

impl Connection {
    /// `username` is the `account:user` pair the gateway expects in
    /// `X-Auth-User`.
    pub fn new(
        auth_url: impl Into<String>,
        username: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            auth_url: auth_url.into(),
            username: username.into(),
            key: key.into(),
            storage_url: None,
            token: None,
        }
    }

    /// Perform the tempauth handshake and store the storage URL + token.
    ///
    /// Bad credentials surface as [`Error::Auth`]; any other non-2xx as
    /// [`Error::Response`].
    pub async fn authenticate(&mut self) -> Result<()> {
        let response = self
            .http
            .get(&self.auth_url)
            .header("X-Auth-User", &self.username)
            .header("X-Auth-Key", &self.key)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::Auth);
        }
        let response = ensure_success(response).await?;

        let storage_url = header_value(&response, "X-Storage-Url").ok_or(Error::Auth)?;
        let token = header_value(&response, "X-Auth-Token").ok_or(Error::Auth)?;
        let storage_url = Url::parse(&storage_url)
            .map_err(|err| Error::Listing(format!("bad storage URL `{storage_url}`: {err}")))?;

        debug!(%storage_url, "authenticated");
        self.storage_url = Some(storage_url);
        self.token = Some(token);
        Ok(())
    }

    /// The account's directory name on the mount: the storage URL's last
    /// path segment with the `AUTH_` reseller prefix stripped.
    pub fn device(&self) -> Result<String> {
        let url = self.storage_url()?;
        let segment = url
            .path_segments()
            .and_then(|mut s| s.next_back())
            .filter(|s| !s.is_empty())
            .ok_or(Error::Unauthenticated)?;
        Ok(segment.strip_prefix("AUTH_").unwrap_or(segment).to_string())
    }

    pub(crate) fn storage_url(&self) -> Result<&Url> {
        self.storage_url.as_ref().ok_or(Error::Unauthenticated)
    }

    /// Build the URL for a container or object. Object keys split on `/`
    /// so slashes stay path separators while each segment is
    /// percent-encoded (keys may contain spaces, `+`, `{`).
    pub(crate) fn url_for(&self, container: &str, object: Option<&str>) -> Result<Url> {
        let mut url = self.storage_url()?.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::Listing("storage URL cannot be a base".into()))?;
            segments.pop_if_empty();
            segments.push(container);
            if let Some(key) = object {
                for segment in key.split('/') {
                    segments.push(segment);
                }
            }
        }
        Ok(url)
    }

    /// A request builder with the auth token attached.
    pub(crate) fn request(&self, method: Method, url: Url) -> Result<RequestBuilder> {
        let token = self.token.as_ref().ok_or(Error::Unauthenticated)?;
        Ok(self.http.request(method, url).header("X-Auth-Token", token))
    }
}

/// Map any non-2xx response to [`Error::Response`].
pub(crate) async fn ensure_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(Error::Response { status, url, body })
}

pub(crate) fn header_value(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}
