//! Resource type resolution
//!
//! There is no registry telling which repository owns a PID, so the type is
//! found by elimination: ask the IIIF manifest service, then Apollo, then the
//! Archivematica store. The first affirmative answer wins, and the precedence
//! Image > LegacyMedia > Archival holds even when probes run concurrently.

pub mod archival;
pub mod iiif;
pub mod legacy;

use std::sync::Arc;

use curio_common::{ApiClient, FetchError};
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

pub use archival::{ArchivalNode, ArchivalStore, DirectoryStore, S3Store, TableNode};
pub use iiif::ImageManifestRef;
pub use legacy::LegacyMediaRecord;

use crate::config::Config;

/// How the three probes are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeStrategy {
    /// One after another, stopping at the first hit
    #[default]
    Sequential,
    /// All at once; the winner is still chosen by precedence
    Concurrent,
}

/// Outcome of resolving a PID
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Image(ImageManifestRef),
    LegacyMedia(LegacyMediaRecord),
    Archival(TableNode),
    NotFound,
}

impl Resolution {
    pub fn kind(&self) -> &'static str {
        match self {
            Resolution::Image(_) => "image",
            Resolution::LegacyMedia(_) => "legacy-media",
            Resolution::Archival(_) => "archival",
            Resolution::NotFound => "not-found",
        }
    }
}

/// Why a single probe came back negative
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Upstream(#[from] FetchError),

    /// Upstream answered, but not affirmatively
    #[error("{0}")]
    Absent(String),

    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(String),
}

/// Read an explicit JSON `null` as the field's default, the same as a
/// missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Build `{base}/{segments...}?{query...}`, percent-encoding each segment so a
/// PID always stays a single path segment.
pub(crate) fn upstream_url(base: &str, segments: &[&str], query: &[(&str, &str)]) -> Result<String, ProbeError> {
    let mut url = Url::parse(base).map_err(|e| ProbeError::InvalidUrl(format!("{}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| ProbeError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url.to_string())
}

/// Probes the upstream repositories for a PID
#[derive(Clone)]
pub struct Resolver {
    client: ApiClient,
    config: Arc<Config>,
    store: Arc<dyn ArchivalStore>,
}

impl Resolver {
    pub fn new(client: ApiClient, config: Arc<Config>, store: Arc<dyn ArchivalStore>) -> Self {
        Self { client, config, store }
    }

    /// Is this PID an image object with a usable manifest?
    pub async fn probe_image(&self, pid: &str, unit: Option<&str>) -> Result<ImageManifestRef, ProbeError> {
        iiif::lookup_manifest(&self.client, &self.config.iiif_url, pid, unit, self.config.no_cache).await
    }

    /// Is this PID a legacy WSLS media item?
    pub async fn probe_legacy(&self, pid: &str) -> Result<LegacyMediaRecord, ProbeError> {
        legacy::lookup_record(&self.client, &self.config.apollo_url, &self.config.fedora_url, pid).await
    }

    /// Is this PID an Archivematica package?
    pub async fn probe_archival(&self, pid: &str) -> Result<TableNode, ProbeError> {
        archival::lookup_tree(self.store.as_ref(), pid).await
    }

    /// Classify `pid`, returning the data needed to render it
    pub async fn resolve(&self, pid: &str, unit: Option<&str>) -> Resolution {
        let resolution = match self.config.probe_strategy {
            ProbeStrategy::Sequential => self.resolve_sequential(pid, unit).await,
            ProbeStrategy::Concurrent => self.resolve_concurrent(pid, unit).await,
        };
        info!(pid = %pid, kind = resolution.kind(), "Resolved");
        resolution
    }

    async fn resolve_sequential(&self, pid: &str, unit: Option<&str>) -> Resolution {
        debug!(pid = %pid, unit = ?unit, "Check if PID is an image");
        match self.probe_image(pid, unit).await {
            Ok(manifest) => return Resolution::Image(manifest),
            Err(e) => debug!(pid = %pid, reason = %e, "Not an image"),
        }

        match self.probe_legacy(pid).await {
            Ok(record) => return Resolution::LegacyMedia(record),
            Err(e) => debug!(pid = %pid, reason = %e, "Not WSLS"),
        }

        match self.probe_archival(pid).await {
            Ok(tree) => Resolution::Archival(tree),
            Err(e) => {
                debug!(pid = %pid, reason = %e, "Not Archivematica");
                Resolution::NotFound
            }
        }
    }

    async fn resolve_concurrent(&self, pid: &str, unit: Option<&str>) -> Resolution {
        let (image, legacy, archival) = tokio::join!(
            self.probe_image(pid, unit),
            self.probe_legacy(pid),
            self.probe_archival(pid),
        );

        match (image, legacy, archival) {
            (Ok(manifest), _, _) => Resolution::Image(manifest),
            (_, Ok(record), _) => Resolution::LegacyMedia(record),
            (_, _, Ok(tree)) => Resolution::Archival(tree),
            (Err(i), Err(l), Err(a)) => {
                debug!(pid = %pid, image = %i, legacy = %l, archival = %a, "All probes failed");
                Resolution::NotFound
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_url_keeps_pid_in_one_segment() {
        let url = upstream_url("http://iiif.test", &["pid", "uva-lib:123", "exist"], &[]).unwrap();
        assert_eq!(url, "http://iiif.test/pid/uva-lib:123/exist");

        let url = upstream_url("http://iiif.test/", &["pid", "a/b c"], &[]).unwrap();
        assert_eq!(url, "http://iiif.test/pid/a%2Fb%20c");
    }

    #[test]
    fn test_upstream_url_with_base_path_and_query() {
        let url = upstream_url("http://apollo.test/api", &["items", "uva-lib:9"], &[("unit", "42")]).unwrap();
        assert_eq!(url, "http://apollo.test/api/items/uva-lib:9?unit=42");
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Sample {
        #[serde(deserialize_with = "null_as_default")]
        name: String,
        #[serde(deserialize_with = "null_as_default")]
        flag: bool,
    }

    #[test]
    fn test_null_reads_as_default() {
        let sample: Sample = serde_json::from_str(r#"{"name": null, "flag": null}"#).unwrap();
        assert_eq!(sample.name, "");
        assert!(!sample.flag);

        let sample: Sample = serde_json::from_str(r#"{"flag": true}"#).unwrap();
        assert!(sample.flag);
    }

    #[test]
    fn test_upstream_url_rejects_garbage_base() {
        assert!(matches!(
            upstream_url("not a url", &["x"], &[]),
            Err(ProbeError::InvalidUrl(_))
        ));
    }
}
