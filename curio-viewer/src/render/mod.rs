//! Response renderers
//!
//! Map a [`Resolution`](crate::resolver::Resolution) into what the front end
//! or an embedding site consumes.

pub mod image;
pub mod oembed;

use serde::Serialize;

use crate::resolver::{LegacyMediaRecord, TableNode};
pub use image::ImageViewerData;

/// Payload of `GET /view/:pid`, tagged with the viewer the front end should
/// use.
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ViewResponse {
    #[serde(rename = "iiif")]
    Image(ImageViewerData),
    #[serde(rename = "wsls")]
    LegacyMedia(LegacyMediaRecord),
    #[serde(rename = "archivematica")]
    Archival(TableNode),
}
