//! IIIF manifest service probe

use curio_common::ApiClient;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{null_as_default, upstream_url, ProbeError};

/// Answer from `GET {iiif}/pid/{pid}/exist`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExistResponse {
    #[serde(deserialize_with = "null_as_default")]
    exists: bool,
    #[serde(deserialize_with = "null_as_default")]
    cached: bool,
    #[serde(deserialize_with = "null_as_default")]
    url: String,
}

/// A manifest the viewer can load
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageManifestRef {
    /// Manifest URL; may point at the external manifest cache
    pub url: String,
    /// Whether `url` was served from the manifest cache
    pub cached: bool,
    /// Unit of work the manifest is restricted to
    pub unit: Option<String>,
}

/// Ask the IIIF service whether `pid` has a manifest.
///
/// With a unit, the manifest only has to exist: it is generated on demand,
/// so its URL is built here. Without a unit, the manifest must also be in
/// the cache and the cache URL is used as returned. `cache_disabled` (local
/// development) relaxes the unit-less case to existence only, pointing at the
/// service directly.
pub async fn lookup_manifest(
    client: &ApiClient,
    iiif_base: &str,
    pid: &str,
    unit: Option<&str>,
    cache_disabled: bool,
) -> Result<ImageManifestRef, ProbeError> {
    let query: Vec<(&str, &str)> = unit.map(|u| vec![("unit", u)]).unwrap_or_default();
    let exist_url = upstream_url(iiif_base, &["pid", pid, "exist"], &query)?;

    let parsed: ExistResponse = client.get_json(&exist_url).await?;

    if !parsed.exists {
        return Err(ProbeError::Absent(format!("no IIIF manifest for {}", pid)));
    }

    if let Some(unit) = unit {
        debug!(pid = %pid, unit = %unit, "Unit present, not using IIIF cache");
        return Ok(ImageManifestRef {
            url: upstream_url(iiif_base, &["pid", pid], &[("unit", unit)])?,
            cached: false,
            unit: Some(unit.to_string()),
        });
    }

    if cache_disabled {
        return Ok(ImageManifestRef {
            url: upstream_url(iiif_base, &["pid", pid], &[])?,
            cached: false,
            unit: None,
        });
    }

    if !parsed.cached || parsed.url.is_empty() {
        return Err(ProbeError::Absent(format!("IIIF manifest for {} is not cached", pid)));
    }

    debug!(pid = %pid, url = %parsed.url, "IIIF manifest cached");
    Ok(ImageManifestRef {
        url: parsed.url,
        cached: true,
        unit: None,
    })
}
