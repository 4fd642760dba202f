//! Front-end asset routes

use std::path::Path;

use axum::{http::StatusCode, Router};
use tower_http::services::ServeDir;

use crate::AppState;

/// GET /favicon.ico
pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// `/public/*` and `/view/uv/*` from `web_dir`; nothing when unset
pub fn static_routes(web_dir: Option<&Path>) -> Router<AppState> {
    match web_dir {
        Some(dir) => Router::new()
            .nest_service("/public", ServeDir::new(dir.join("public")))
            .nest_service("/view/uv", ServeDir::new(dir.join("uv"))),
        None => Router::new(),
    }
}
