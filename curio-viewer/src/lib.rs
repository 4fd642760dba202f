//! curio-viewer library - digital object viewer gateway
//!
//! Resolves a PID to the repository that holds it and serves the payload the
//! matching front-end viewer needs, plus oEmbed descriptors for embedding.

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use curio_common::ApiClient;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod config;
pub mod error;
pub mod render;
pub mod resolver;
pub mod tracksys;

pub use config::{ArchivalSource, Config};
pub use error::{ApiError, ApiResult};
pub use resolver::{ArchivalStore, Resolution, Resolver};

use resolver::{DirectoryStore, S3Store};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Upstream client shared by every probe and renderer
    pub client: ApiClient,
    pub resolver: Resolver,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Build state with the archival store `config` names
    pub async fn new(config: Config) -> curio_common::Result<Self> {
        let store: Arc<dyn ArchivalStore> = match &config.archival {
            ArchivalSource::Bucket { endpoint, bucket } => {
                Arc::new(S3Store::from_env(bucket.clone(), endpoint.as_deref(), config.timeouts).await)
            }
            ArchivalSource::Directory(dir) => Arc::new(DirectoryStore::new(dir.clone())),
        };
        Self::with_store(config, store)
    }

    /// Build state around an existing archival store
    pub fn with_store(config: Config, store: Arc<dyn ArchivalStore>) -> curio_common::Result<Self> {
        let client = ApiClient::new(config.timeouts)?;
        Ok(Self::from_parts(config, client, store))
    }

    fn from_parts(config: Config, client: ApiClient, store: Arc<dyn ArchivalStore>) -> Self {
        let config = Arc::new(config);
        Self {
            resolver: Resolver::new(client.clone(), config.clone(), store),
            config,
            client,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let static_files = api::static_routes(state.config.web_dir.as_deref());

    Router::new()
        .route("/", get(api::get_build_info))
        .route("/version", get(api::get_build_info))
        .route("/favicon.ico", get(api::favicon))
        .route("/view/:pid", get(api::get_view))
        .route("/oembed", get(api::get_oembed))
        .route("/api/aries", get(api::aries_ping))
        .route("/api/aries/:id", get(api::aries_lookup))
        .merge(api::health_routes())
        .merge(static_files)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
