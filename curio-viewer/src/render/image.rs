//! Image viewer payload
//!
//! The viewer itself loads the manifest; Curio only fetches it to list the
//! page asset IDs and to find a title for embeds.

use curio_common::{ApiClient, FetchError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resolver::{null_as_default, ImageManifestRef};

// https://iiif.lib.virginia.edu/iiif/tsm:2804870/full/!200,200/0/default.jpg -> tsm:2804870
static THUMBNAIL_WRAPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.*iiif/|/full.*$").expect("thumbnail pattern is valid"));

/// The parts of a IIIF Presentation 2 manifest Curio reads
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub label: Option<Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub sequences: Vec<Sequence>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Sequence {
    #[serde(deserialize_with = "null_as_default")]
    pub canvases: Vec<Canvas>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Canvas {
    /// Either a bare URL or an image resource with an `@id`
    pub thumbnail: Option<Value>,
}

impl Canvas {
    fn thumbnail_url(&self) -> Option<&str> {
        match self.thumbnail.as_ref()? {
            Value::String(url) => Some(url.as_str()),
            Value::Object(resource) => resource.get("@id").or_else(|| resource.get("id"))?.as_str(),
            _ => None,
        }
    }
}

impl Manifest {
    /// Per-page image asset IDs from the first sequence, in canvas order
    pub fn page_ids(&self) -> Vec<String> {
        self.sequences
            .first()
            .map(|sequence| {
                sequence
                    .canvases
                    .iter()
                    .map(|canvas| page_asset_id(canvas.thumbnail_url().unwrap_or_default()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Manifest label as plain text, when it is a plain string
    pub fn label_text(&self) -> Option<String> {
        match self.label.as_ref()? {
            Value::String(label) => Some(label.clone()),
            _ => None,
        }
    }
}

/// Strip the IIIF image server prefix and the size/region suffix from a
/// thumbnail URL, leaving the image asset ID
pub fn page_asset_id(thumbnail: &str) -> String {
    THUMBNAIL_WRAPPER.replace_all(thumbnail, "").into_owned()
}

/// Convert the public 1-based `page` parameter into a 0-based canvas index.
/// Absent, non-numeric and non-positive values all mean the first page.
pub fn start_page_index(page: Option<&str>) -> usize {
    page.and_then(|p| p.trim().parse::<usize>().ok())
        .map(|p| p.saturating_sub(1))
        .unwrap_or(0)
}

pub async fn fetch_manifest(client: &ApiClient, url: &str) -> Result<Manifest, FetchError> {
    client.get_json(url).await
}

/// Payload for the image viewer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageViewerData {
    #[serde(rename = "iiif")]
    pub manifest_url: String,
    #[serde(rename = "rights")]
    pub rights_url: String,
    /// 0-based canvas index to open at
    pub page: usize,
    /// Comma-separated page asset IDs
    pub page_pids: String,
}

impl ImageViewerData {
    pub fn new(manifest_ref: &ImageManifestRef, manifest: &Manifest, rights_url: Option<&str>, page: usize) -> Self {
        Self {
            manifest_url: manifest_ref.url.clone(),
            rights_url: rights_url.unwrap_or_default().to_string(),
            page,
            page_pids: manifest.page_ids().join(","),
        }
    }
}
