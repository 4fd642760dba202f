//! Healthcheck endpoint
//!
//! Pings each upstream once. Archival storage is not checked.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::error;

use crate::resolver::{upstream_url, ProbeError};
use crate::tracksys::TrackSysClient;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub alive: bool,
    pub apollo: bool,
    pub iiif: bool,
    /// Present only when TrackSys is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracksys: Option<bool>,
}

impl HealthResponse {
    pub fn healthy(&self) -> bool {
        self.apollo && self.iiif && self.tracksys.unwrap_or(true)
    }
}

async fn ping(state: &AppState, service: &str, url: Result<String, ProbeError>) -> bool {
    let result = match url {
        Ok(url) => state.client.get(&url).await.map(|_| ()).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    if let Err(e) = &result {
        error!(service, error = %e, "Healthcheck ping failed");
    }
    result.is_ok()
}

/// GET /healthcheck
///
/// 200 when every upstream answered, 500 otherwise. The body is the same
/// either way.
pub async fn healthcheck(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let config = &state.config;
    let tracksys = async {
        let base = config.tracksys_url.as_deref()?;
        let result = TrackSysClient::new(&state.client, base).ping(&config.health_pid).await;
        if let Err(e) = &result {
            error!(service = "tracksys", error = %e, "Healthcheck ping failed");
        }
        Some(result.is_ok())
    };

    let (apollo, iiif, tracksys) = tokio::join!(
        ping(&state, "apollo", upstream_url(&config.apollo_url, &["items", config.health_pid.as_str()], &[])),
        ping(&state, "iiif", upstream_url(&config.iiif_url, &["version"], &[])),
        tracksys,
    );

    let response = HealthResponse {
        alive: true,
        apollo,
        iiif,
        tracksys,
    };
    let status = if response.healthy() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(response))
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/healthcheck", get(healthcheck))
}
