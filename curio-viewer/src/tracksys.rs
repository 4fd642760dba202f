//! TrackSys client
//!
//! TrackSys is the digitization tracking system. Curio only asks it for a
//! title and creator when describing an image object for oEmbed, and pings
//! it from the healthcheck.

use curio_common::ApiClient;
use serde::Deserialize;
use tracing::debug;

use crate::resolver::{null_as_default, upstream_url, ProbeError};

/// `GET {tracksys}/metadata/{pid}?type=brief`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BriefMetadata {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub creator: String,
}

pub struct TrackSysClient<'a> {
    client: &'a ApiClient,
    base_url: &'a str,
}

impl<'a> TrackSysClient<'a> {
    pub fn new(client: &'a ApiClient, base_url: &'a str) -> Self {
        Self { client, base_url }
    }

    pub async fn brief_metadata(&self, pid: &str) -> Result<BriefMetadata, ProbeError> {
        let url = upstream_url(self.base_url, &["metadata", pid], &[("type", "brief")])?;
        let brief: BriefMetadata = self.client.get_json(&url).await?;
        debug!(pid = %pid, title = %brief.title, "TrackSys brief metadata");
        Ok(brief)
    }

    /// Liveness ping: the object type of a known PID
    pub async fn ping(&self, pid: &str) -> Result<(), ProbeError> {
        let url = upstream_url(self.base_url, &["pid", pid, "type"], &[])?;
        self.client.get(&url).await.map(|_| ()).map_err(ProbeError::from)
    }
}
