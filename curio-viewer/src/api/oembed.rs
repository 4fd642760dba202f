//! oEmbed endpoint

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::render::image::fetch_manifest;
use crate::render::oembed::{embed_html, parse_dimension, parse_embed_url, EmbedDescriptor, EmbedFormat, EmbedSize};
use crate::resolver::{ImageManifestRef, Resolution};
use crate::tracksys::TrackSysClient;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OEmbedQuery {
    pub url: Option<String>,
    pub format: Option<String>,
    pub maxwidth: Option<String>,
    pub maxheight: Option<String>,
}

/// GET /oembed?url=U&format=json|xml&maxwidth=W&maxheight=H
pub async fn get_oembed(State(state): State<AppState>, Query(query): Query<OEmbedQuery>) -> ApiResult<Response> {
    let target = parse_embed_url(query.url.as_deref().unwrap_or_default()).map_err(ApiError::BadRequest)?;
    let format = EmbedFormat::parse(query.format.as_deref()).map_err(ApiError::BadRequest)?;
    info!(pid = %target.pid, format = ?format, "oEmbed request");

    let (title, author, size) = match state.resolver.resolve(&target.pid, target.unit.as_deref()).await {
        Resolution::Image(manifest_ref) => {
            let (title, author) = image_title(&state, &target.pid, &manifest_ref).await?;
            (title, author, EmbedSize::IMAGE)
        }
        Resolution::LegacyMedia(record) => (record.title, String::new(), EmbedSize::LEGACY_MEDIA),
        Resolution::Archival(tree) => (tree.data.name, String::new(), EmbedSize::ARCHIVAL),
        Resolution::NotFound => return Err(ApiError::NotFound(target.pid)),
    };

    let size = size.constrain(
        parse_dimension(query.maxwidth.as_deref()),
        parse_dimension(query.maxheight.as_deref()),
    );
    let html = embed_html(&state.config.hostname, &target, size);
    let body = EmbedDescriptor::rich(title, author, html, size)
        .render(format)
        .map_err(ApiError::Internal)?;

    Ok(([(header::CONTENT_TYPE, format.content_type())], body).into_response())
}

/// Title and creator for an image embed: TrackSys when configured and
/// reachable, else the manifest label. A manifest without pages has nothing
/// to embed.
async fn image_title(state: &AppState, pid: &str, manifest_ref: &ImageManifestRef) -> ApiResult<(String, String)> {
    let manifest = fetch_manifest(&state.client, &manifest_ref.url).await?;
    if manifest.page_ids().is_empty() {
        warn!(pid = %pid, url = %manifest_ref.url, "Manifest has no viewable pages");
        return Err(ApiError::NotFound(pid.to_string()));
    }

    if let Some(tracksys_url) = &state.config.tracksys_url {
        match TrackSysClient::new(&state.client, tracksys_url).brief_metadata(pid).await {
            Ok(brief) => return Ok((brief.title, brief.creator)),
            Err(e) => warn!(pid = %pid, error = %e, "TrackSys metadata unavailable, using manifest label"),
        }
    }

    Ok((manifest.label_text().unwrap_or_default(), String::new()))
}
