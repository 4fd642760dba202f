//! Archivematica package probe
//!
//! Each package is stored as `{pid}.json`: a recursive folder/file tree. The
//! front end renders it with a tree table, so the tree is re-shaped into
//! generic table nodes with synthetic keys and display icons.

use std::path::PathBuf;

use async_trait::async_trait;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::BehaviorVersion;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::get_object::GetObjectError;
use curio_common::{ClientTimeouts, FetchError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{null_as_default, ProbeError};

/// Read-only object store holding package trees
#[async_trait]
pub trait ArchivalStore: Send + Sync {
    /// Fetch the object stored under `key`; `Ok(None)` when there is no such
    /// object.
    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, FetchError>;

    /// Human-readable location, for logging
    fn describe(&self) -> String;
}

/// Objects read from an S3 bucket with the AWS SDK.
///
/// Credentials and region come from the standard AWS provider chain
/// (environment, profile, instance role).
pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Load the shared AWS configuration. `endpoint` overrides the regional
    /// endpoint (S3-compatible stores) and switches to path-style addressing.
    pub async fn from_env(bucket: impl Into<String>, endpoint: Option<&str>, timeouts: ClientTimeouts) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let timeout_config = TimeoutConfig::builder()
            .connect_timeout(timeouts.connect)
            .operation_timeout(timeouts.read)
            .build();

        let mut builder = aws_sdk_s3::config::Builder::from(&shared).timeout_config(timeout_config);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        Self::new(aws_sdk_s3::Client::from_conf(builder.build()), bucket)
    }
}

#[async_trait]
impl ArchivalStore for S3Store {
    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, FetchError> {
        let location = format!("s3://{}/{}", self.bucket, key);

        let output = match self.client.get_object().bucket(&self.bucket).key(key).send().await {
            Ok(output) => output,
            Err(e) => {
                if let Some(GetObjectError::NoSuchKey(_)) = e.as_service_error() {
                    debug!(bucket = %self.bucket, key = %key, "No such key");
                    return Ok(None);
                }
                // AccessDenied included: only NoSuchKey is a miss
                let message = DisplayErrorContext(&e).to_string();
                warn!(bucket = %self.bucket, key = %key, error = %message, "S3 GetObject failed");
                return Err(FetchError::Transport { url: location, message });
            }
        };

        let body = output.body.collect().await.map_err(|e| {
            warn!(bucket = %self.bucket, key = %key, error = %e, "Failed reading S3 object");
            FetchError::Transport {
                url: location.clone(),
                message: e.to_string(),
            }
        })?;
        Ok(Some(body.into_bytes().to_vec()))
    }

    fn describe(&self) -> String {
        format!("s3://{}", self.bucket)
    }
}

/// Objects read from a local directory (development and tests)
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ArchivalStore for DirectoryStore {
    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, FetchError> {
        if key.contains('/') || key.contains('\\') || key.starts_with('.') {
            return Ok(None);
        }

        let path = self.root.join(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FetchError::Transport {
                url: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Package tree node as stored by Archivematica. Arbitrarily nested.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ArchivalNode {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub node_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub format: String,
    #[serde(deserialize_with = "null_as_default")]
    pub source_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub display_url: String,
    #[serde(rename = "mime_types", deserialize_with = "null_as_default")]
    pub mime_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub view: String,
    #[serde(deserialize_with = "null_as_default")]
    pub entries: Vec<ArchivalNode>,
}

impl ArchivalNode {
    pub fn node_count(&self) -> usize {
        1 + self.entries.iter().map(ArchivalNode::node_count).sum::<usize>()
    }
}

/// Tree table node for the front end
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableNode {
    pub key: String,
    pub data: ColumnData,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TableNode>,
    #[serde(rename = "styleClass", skip_serializing_if = "String::is_empty")]
    pub style_class: String,
}

/// Columns displayed for one tree table row
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnData {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub format: String,
    pub icon: String,
    pub url: String,
}

impl TableNode {
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TableNode::node_count).sum::<usize>()
    }
}

/// Object key holding the package tree for `pid`
pub fn object_key(pid: &str) -> String {
    format!("{}.json", pid)
}

/// Re-shape a package tree into table nodes. `depth` is 0 for the root and
/// prefixes every key, so keys stay unique across levels.
pub fn transform_node(node: &ArchivalNode, depth: usize) -> TableNode {
    let key_id = if node.id.is_empty() { &node.name } else { &node.id };

    let mut data = ColumnData {
        name: node.name.clone(),
        node_type: node.node_type.clone(),
        ..Default::default()
    };

    match node.node_type.as_str() {
        "folder" => {
            data.icon = "fa fa-folder".to_string();
            data.format = "Folder".to_string();
        }
        "file" => {
            data.icon = "fa fa-file".to_string();
            data.format = node.format.clone();
            data.url = node.source_url.clone();
        }
        _ => {}
    }

    if node.view == "image" {
        data.node_type = "image".to_string();
        data.icon = "fa fa-file-image".to_string();
    }

    if node.format.contains("PDF") {
        data.icon = "fa fa-file-pdf".to_string();
    } else if node.format.contains("Word") {
        data.icon = "fa fa-file-word".to_string();
    } else if node.format.contains("Excel") {
        data.icon = "fa fa-file-excel".to_string();
    }

    TableNode {
        key: format!("{}-{}", depth, key_id),
        data,
        children: node.entries.iter().map(|child| transform_node(child, depth + 1)).collect(),
        style_class: String::new(),
    }
}

/// Fetch and transform the package tree for `pid`
pub async fn lookup_tree(store: &dyn ArchivalStore, pid: &str) -> Result<TableNode, ProbeError> {
    let key = object_key(pid);
    let body = store
        .fetch(&key)
        .await?
        .ok_or_else(|| ProbeError::Absent(format!("{} not in {}", key, store.describe())))?;

    let tree: ArchivalNode = serde_json::from_slice(&body).map_err(|e| {
        warn!(pid = %pid, error = %e, "Archivematica tree did not parse");
        FetchError::Malformed {
            url: format!("{}/{}", store.describe(), key),
            message: e.to_string(),
        }
    })?;

    debug!(pid = %pid, nodes = tree.node_count(), "Transforming Archivematica tree");
    Ok(transform_node(&tree, 0))
}
