//! Upstream API client
//!
//! Thin wrapper over a shared `reqwest::Client` with bounded connect and read
//! timeouts. Every Curio upstream call goes through [`ApiClient::get`].

use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{Error, Result};

const USER_AGENT: &str = concat!("curio/", env!("CARGO_PKG_VERSION"));

/// Default connect timeout for upstream calls
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default overall timeout for upstream calls
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(15);

/// Upstream call failure.
///
/// Callers probing for a resource treat every variant the same way: the
/// probe failed. The distinction only matters for logging and for errors
/// surfaced after a resource has been resolved.
#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS, connect, timeout or body read failure
    #[error("Network error calling {url}: {message}")]
    Transport { url: String, message: String },

    /// Upstream answered with a non-2xx status
    #[error("{url} returned {status}: {body}")]
    Status { url: String, status: u16, body: String },

    /// Upstream answered 2xx but the body did not have the expected shape
    #[error("Unable to parse response from {url}: {message}")]
    Malformed { url: String, message: String },
}

impl FetchError {
    /// HTTP status, if the upstream answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Connect and read timeouts shared by every call made through one client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientTimeouts {
    pub connect: Duration,
    pub read: Duration,
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_CONNECT_TIMEOUT,
            read: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// Shared upstream HTTP client.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(timeouts: ClientTimeouts) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.read)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }

    /// GET `url` and return the raw body.
    ///
    /// Any non-2xx response becomes [`FetchError::Status`] carrying the body.
    /// A 404 is logged at debug level since several callers expect it.
    pub async fn get(&self, url: &str) -> std::result::Result<Bytes, FetchError> {
        debug!(url = %url, "GET");

        let response = self.http.get(url).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Upstream request failed");
            FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            warn!(url = %url, error = %e, "Failed reading upstream response");
            FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            }
        })?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&body).into_owned();
            if status == reqwest::StatusCode::NOT_FOUND {
                debug!(url = %url, status = status.as_u16(), "Upstream returned not found");
            } else {
                warn!(url = %url, status = status.as_u16(), body = %body, "Upstream returned error status");
            }
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    /// GET `url` and deserialize the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> std::result::Result<T, FetchError> {
        let body = self.get(url).await?;
        serde_json::from_slice(&body).map_err(|e| {
            debug!(url = %url, error = %e, "Upstream response did not parse");
            FetchError::Malformed {
                url: url.to_string(),
                message: e.to_string(),
            }
        })
    }
}
