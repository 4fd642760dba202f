//! Viewer payload endpoint

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::render::image::{fetch_manifest, start_page_index, ImageViewerData};
use crate::render::ViewResponse;
use crate::resolver::Resolution;
use crate::AppState;

/// Optional `GET /view/:pid` parameters
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    /// Unit of work restricting an image manifest
    pub unit: Option<String>,
    /// 1-based page to open at
    pub page: Option<String>,
}

impl ViewQuery {
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

/// GET /view/:pid
///
/// Resolves the PID and returns the payload for the matching viewer.
pub async fn get_view(
    State(state): State<AppState>,
    Path(pid): Path<String>,
    Query(query): Query<ViewQuery>,
) -> ApiResult<Json<ViewResponse>> {
    let response = match state.resolver.resolve(&pid, query.unit()).await {
        Resolution::Image(manifest_ref) => {
            let manifest = fetch_manifest(&state.client, &manifest_ref.url).await?;
            let page = start_page_index(query.page.as_deref());
            debug!(pid = %pid, page, "Rendering image viewer");
            ViewResponse::Image(ImageViewerData::new(
                &manifest_ref,
                &manifest,
                state.config.rights_url.as_deref(),
                page,
            ))
        }
        Resolution::LegacyMedia(record) => ViewResponse::LegacyMedia(record),
        Resolution::Archival(tree) => ViewResponse::Archival(tree),
        Resolution::NotFound => return Err(ApiError::NotFound(pid)),
    };

    Ok(Json(response))
}
