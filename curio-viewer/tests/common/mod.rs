//! Fake upstream services shared by the integration tests
//!
//! One axum server stands in for every upstream, each under its own prefix:
//! `/iiif`, `/apollo`, `/tracksys` and `/s3`. Known PIDs:
//!
//! - `uva-lib:100`: cached image manifest
//! - `uva-lib:101`: cached image manifest with no pages
//! - `uva-lib:200`: image manifest that exists but is not cached
//! - `uva-lib:201`: like `uva-lib:200`, exist answer carries `"url": null`
//! - `uva-lib:300`: answered by both IIIF and Apollo
//! - `uva-lib:998`: IIIF answers 200 with an HTML page, Apollo has the item
//! - `uva-lib:999`: WSLS item `X1` with video
//! - `uva-lib:500`: Archivematica package (directory store and bucket)
//! - `uva-lib:501`: package tree with null fields (directory store)

#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use curio_viewer::config::{ArchivalSource, Config, DEFAULT_HEALTH_PID};
use curio_viewer::resolver::{ArchivalStore, S3Store};
use serde_json::{json, Value};
use tempfile::TempDir;

pub const BUCKET: &str = "curio-bucket";
pub const FEDORA: &str = "https://wsls.test";

pub const PACKAGE_TREE: &str = r#"{
    "name": "MSS 16152",
    "id": "pkg",
    "type": "folder",
    "entries": [
        {"name": "report.pdf", "id": "f1", "type": "file", "format": "Acrobat PDF 1.5",
         "source_url": "https://store.test/f1"},
        {"name": "objects", "type": "folder", "entries": [
            {"name": "scan.tif", "id": "f2", "type": "file", "view": "image", "format": "TIFF"}
        ]}
    ]
}"#;

pub const NULL_TREE: &str = r#"{
    "name": "MSS 1",
    "id": null,
    "type": "folder",
    "entries": [
        {"name": "notes.txt", "id": "n1", "type": "file", "format": null, "source_url": null},
        {"name": "empty", "type": "folder", "entries": null}
    ]
}"#;

fn manifest() -> Value {
    json!({
        "@context": "http://iiif.io/api/presentation/2/context.json",
        "label": "Cached Letter",
        "sequences": [{"canvases": [
            {"thumbnail": "https://iiif.test/iiif/tsm:1/full/!200,200/0/default.jpg"},
            {"thumbnail": "https://iiif.test/iiif/tsm:2/full/!200,200/0/default.jpg"},
            {"thumbnail": "https://iiif.test/iiif/tsm:3/full/!200,200/0/default.jpg"}
        ]}]
    })
}

async fn iiif_exist(State(base): State<String>, Path(pid): Path<String>) -> Response {
    let body = match pid.as_str() {
        "uva-lib:100" | "uva-lib:300" => json!({
            "exists": true,
            "cached": true,
            "url": format!("{}/cache/{}.json", base, pid),
        }),
        "uva-lib:101" => json!({
            "exists": true,
            "cached": true,
            "url": format!("{}/empty/{}.json", base, pid),
        }),
        "uva-lib:200" => json!({"exists": true, "cached": false}),
        "uva-lib:201" => json!({"exists": true, "cached": false, "url": null}),
        "uva-lib:998" => return Html("<html><body>Service moved</body></html>").into_response(),
        _ => json!({"exists": false}),
    };
    Json(body).into_response()
}

async fn iiif_manifest() -> Json<Value> {
    Json(manifest())
}

async fn empty_manifest() -> Json<Value> {
    Json(json!({"label": "Empty", "sequences": [{"canvases": null}]}))
}

fn apollo_item(wsls_id: &str, title: &str) -> Value {
    json!({"item": {"children": [
        {"type": {"name": "wslsID"}, "value": wsls_id},
        {"type": {"name": "title"}, "value": title},
        {"type": {"name": "hasVideo"}, "value": "true"},
        {"type": {"name": "hasScript"}, "value": "false"},
        {"type": {"name": "abstract"}, "value": "Storm damage footage"}
    ]}})
}

async fn apollo_items(Path(pid): Path<String>) -> Response {
    match pid.as_str() {
        "uva-lib:999" => Json(apollo_item("X1", "Roanoke tornado")).into_response(),
        "uva-lib:300" => Json(apollo_item("X3", "Both")).into_response(),
        "uva-lib:998" => Json(apollo_item("X998", "Moved")).into_response(),
        p if p == DEFAULT_HEALTH_PID => Json(apollo_item("H1", "Health")).into_response(),
        _ => (StatusCode::NOT_FOUND, "item not found").into_response(),
    }
}

async fn tracksys_metadata(Path(pid): Path<String>) -> Json<Value> {
    Json(json!({"title": format!("TrackSys title for {}", pid), "creator": "Jefferson, Thomas"}))
}

fn s3_error(status: StatusCode, code: &str) -> Response {
    let body = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Error><Code>{}</Code><Message>{}</Message><RequestId>test</RequestId></Error>"#,
        code, code
    );
    (status, [("content-type", "application/xml")], body).into_response()
}

async fn s3_object(Path((bucket, key)): Path<(String, String)>) -> Response {
    match (bucket.as_str(), key.as_str()) {
        (BUCKET, "uva-lib:500.json") => {
            ([("content-type", "application/json")], PACKAGE_TREE).into_response()
        }
        (BUCKET, _) => s3_error(StatusCode::NOT_FOUND, "NoSuchKey"),
        _ => s3_error(StatusCode::FORBIDDEN, "AccessDenied"),
    }
}

fn upstream_router(base: String) -> Router {
    Router::new()
        .route("/iiif/pid/:pid/exist", get(iiif_exist))
        .route("/iiif/pid/:pid", get(iiif_manifest))
        .route("/iiif/version", get(|| async { "iiif-manifest 3.1.0" }))
        .route("/cache/:file", get(iiif_manifest))
        .route("/empty/:file", get(empty_manifest))
        .route("/apollo/items/:pid", get(apollo_items))
        .route("/tracksys/metadata/:pid", get(tracksys_metadata))
        .route("/tracksys/pid/:pid/type", get(|| async { "master_file" }))
        .route("/s3/:bucket/:key", get(s3_object))
        .with_state(base)
}

/// Start the fake upstream server and return its base URL
pub async fn spawn_upstreams() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let router = upstream_router(base.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    base
}

/// Running fake upstreams plus a directory holding the package tree
pub struct Upstreams {
    pub base: String,
    pub archive: TempDir,
}

impl Upstreams {
    pub async fn start() -> Self {
        let base = spawn_upstreams().await;
        let archive = tempfile::tempdir().unwrap();
        std::fs::write(archive.path().join("uva-lib:500.json"), PACKAGE_TREE).unwrap();
        std::fs::write(archive.path().join("uva-lib:501.json"), NULL_TREE).unwrap();
        Self { base, archive }
    }

    /// Config reading package trees from the directory store
    pub fn config(&self) -> Config {
        let mut config = Config::with_upstreams(
            &format!("{}/iiif", self.base),
            &format!("{}/apollo", self.base),
            FEDORA,
            ArchivalSource::Directory(self.archive.path().to_path_buf()),
        );
        config.hostname = "curio.test".to_string();
        config
    }

    /// Config naming the fake bucket
    pub fn bucket_config(&self) -> Config {
        Config {
            archival: ArchivalSource::Bucket {
                endpoint: Some(format!("{}/s3", self.base)),
                bucket: BUCKET.to_string(),
            },
            ..self.config()
        }
    }

    /// S3 store on the fake endpoint with static credentials
    pub fn s3_store(&self, bucket: &str) -> Arc<dyn ArchivalStore> {
        let conf = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "static"))
            .endpoint_url(format!("{}/s3/", self.base))
            .force_path_style(true)
            .build();
        Arc::new(S3Store::new(aws_sdk_s3::Client::from_conf(conf), bucket.to_string()))
    }

    pub fn tracksys_url(&self) -> String {
        format!("{}/tracksys", self.base)
    }
}
