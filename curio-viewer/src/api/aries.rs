//! Aries identifier lookup
//!
//! Aries is the library's identifier discovery service. It asks each system
//! whether it knows an identifier and how to reach it.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::debug;
use url::form_urlencoded;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AriesResponse {
    pub identifier: Vec<String>,
    pub access_url: Vec<String>,
    pub service_url: Vec<ServiceUrl>,
}

#[derive(Debug, Serialize)]
pub struct ServiceUrl {
    pub url: String,
    pub protocol: String,
}

impl AriesResponse {
    fn for_pid(hostname: &str, pid: &str) -> Self {
        let public_url = format!("https://{}/view/{}", hostname, pid);
        let encoded: String = form_urlencoded::byte_serialize(public_url.as_bytes()).collect();
        Self {
            identifier: vec![pid.to_string()],
            service_url: vec![ServiceUrl {
                url: format!("https://{}/oembed?url={}", hostname, encoded),
                protocol: "oembed".to_string(),
            }],
            access_url: vec![public_url],
        }
    }
}

/// GET /api/aries
pub async fn aries_ping() -> &'static str {
    "Curio Aries API"
}

/// GET /api/aries/:id
///
/// Only image and legacy media objects are reported.
pub async fn aries_lookup(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<AriesResponse>> {
    let known = match state.resolver.probe_image(&id, None).await {
        Ok(_) => true,
        Err(e) => {
            debug!(pid = %id, reason = %e, "Aries: not an image");
            state.resolver.probe_legacy(&id).await.is_ok()
        }
    };

    if !known {
        return Err(ApiError::NotFound(id));
    }
    Ok(Json(AriesResponse::for_pid(&state.config.hostname, &id)))
}
