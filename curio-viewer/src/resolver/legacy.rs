//! Apollo probe for legacy WSLS audio/video items

use curio_common::{ApiClient, FetchError};
use serde::{Deserialize, Serialize};

use super::{null_as_default, upstream_url, ProbeError};

/// Minimal mapping of the Apollo items API: a flat list of typed values
#[derive(Debug, Deserialize)]
struct ApolloResponse {
    #[serde(alias = "Item")]
    item: ApolloItem,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApolloItem {
    #[serde(alias = "Children", deserialize_with = "null_as_default")]
    children: Vec<ApolloNode>,
}

#[derive(Debug, Deserialize)]
struct ApolloNode {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    node_type: ApolloNodeType,
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApolloNodeType {
    #[serde(deserialize_with = "null_as_default")]
    name: String,
}

/// Metadata for a WSLS news film item, plus the asset URLs derived from its
/// WSLS ID
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LegacyMediaRecord {
    pub has_video: bool,
    pub has_script: bool,
    pub wsls_id: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(rename = "thumb_url", skip_serializing_if = "Option::is_none")]
    pub pdf_thumb_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_url: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub duration: String,
}

impl LegacyMediaRecord {
    /// Parse an Apollo item response. Unknown value types are ignored.
    pub fn from_apollo(body: &[u8]) -> Result<Self, serde_json::Error> {
        let response: ApolloResponse = serde_json::from_slice(body)?;

        let mut record = Self::default();
        for node in response.item.children {
            let value = node.value.unwrap_or_default();
            match node.node_type.name.as_str() {
                "wslsID" => record.wsls_id = value,
                "title" => record.title = value,
                "hasVideo" => record.has_video = value == "true",
                "hasScript" => record.has_script = value == "true",
                "abstract" => record.description = value,
                "duration" => record.duration = value,
                _ => {}
            }
        }
        Ok(record)
    }

    /// Fill in asset URLs under `fedora_base`. Video and poster exist only
    /// for items with video; script PDF, thumbnail and transcript only for
    /// items with a script.
    pub fn with_asset_urls(mut self, fedora_base: &str) -> Self {
        let id = self.wsls_id.clone();
        let asset = |suffix: &str| format!("{}/{}/{}{}", fedora_base, id, id, suffix);

        if self.has_video {
            self.video_url = Some(asset(".mp4"));
            self.poster_url = Some(asset("-poster.jpg"));
        }
        if self.has_script {
            self.pdf_url = Some(asset(".pdf"));
            self.pdf_thumb_url = Some(asset("-script-thumbnail.jpg"));
            self.transcript_url = Some(asset(".txt"));
        }
        self
    }
}

/// Look up `pid` in Apollo and build its WSLS record
pub async fn lookup_record(
    client: &ApiClient,
    apollo_base: &str,
    fedora_base: &str,
    pid: &str,
) -> Result<LegacyMediaRecord, ProbeError> {
    let url = upstream_url(apollo_base, &["items", pid], &[])?;
    let body = client.get(&url).await?;

    let record = LegacyMediaRecord::from_apollo(&body).map_err(|e| FetchError::Malformed {
        url,
        message: e.to_string(),
    })?;

    Ok(record.with_asset_urls(fedora_base))
}

#[cfg(test)]
mod tests {
    use super::*;

    const APOLLO_ITEM: &str = r#"{
        "collection": {"pid": "uva-an109873"},
        "item": {
            "pid": "uva-an110069",
            "children": [
                {"type": {"name": "title"}, "value": "Roanoke tornado damage"},
                {"type": {"name": "wslsID"}, "value": "0003_1"},
                {"type": {"name": "hasVideo"}, "value": "true"},
                {"type": {"name": "hasScript"}, "value": "false"},
                {"type": {"name": "abstract"}, "value": "Footage of storm damage."},
                {"type": {"name": "duration"}, "value": "00:01:22"},
                {"type": {"name": "filmBoxLabel"}, "value": "Box 12"}
            ]
        }
    }"#;

    #[test]
    fn test_parse_known_fields() {
        let record = LegacyMediaRecord::from_apollo(APOLLO_ITEM.as_bytes()).unwrap();
        assert_eq!(record.title, "Roanoke tornado damage");
        assert_eq!(record.wsls_id, "0003_1");
        assert!(record.has_video);
        assert!(!record.has_script);
        assert_eq!(record.description, "Footage of storm damage.");
        assert_eq!(record.duration, "00:01:22");
    }

    #[test]
    fn test_booleans_require_literal_true() {
        let body = r#"{"item": {"children": [
            {"type": {"name": "hasVideo"}, "value": "True"},
            {"type": {"name": "hasScript"}, "value": "yes"}
        ]}}"#;
        let record = LegacyMediaRecord::from_apollo(body.as_bytes()).unwrap();
        assert!(!record.has_video);
        assert!(!record.has_script);
    }

    #[test]
    fn test_missing_item_is_error() {
        assert!(LegacyMediaRecord::from_apollo(br#"{"error": "nope"}"#).is_err());
        assert!(LegacyMediaRecord::from_apollo(b"not json").is_err());
    }

    #[test]
    fn test_asset_urls_for_video_only() {
        let record = LegacyMediaRecord::from_apollo(APOLLO_ITEM.as_bytes())
            .unwrap()
            .with_asset_urls("https://wsls.test");
        assert_eq!(record.video_url.as_deref(), Some("https://wsls.test/0003_1/0003_1.mp4"));
        assert_eq!(record.poster_url.as_deref(), Some("https://wsls.test/0003_1/0003_1-poster.jpg"));
        assert!(record.pdf_url.is_none());
        assert!(record.pdf_thumb_url.is_none());
        assert!(record.transcript_url.is_none());
    }

    #[test]
    fn test_asset_urls_for_script() {
        let record = LegacyMediaRecord {
            has_script: true,
            wsls_id: "X1".to_string(),
            ..Default::default()
        }
        .with_asset_urls("https://wsls.test");
        assert!(record.video_url.is_none());
        assert_eq!(record.pdf_url.as_deref(), Some("https://wsls.test/X1/X1.pdf"));
        assert_eq!(
            record.pdf_thumb_url.as_deref(),
            Some("https://wsls.test/X1/X1-script-thumbnail.jpg")
        );
        assert_eq!(record.transcript_url.as_deref(), Some("https://wsls.test/X1/X1.txt"));
    }

    #[test]
    fn test_serialized_field_names() {
        let record = LegacyMediaRecord {
            has_script: true,
            wsls_id: "X1".to_string(),
            ..Default::default()
        }
        .with_asset_urls("https://wsls.test");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["wsls_id"], "X1");
        assert_eq!(json["thumb_url"], "https://wsls.test/X1/X1-script-thumbnail.jpg");
        assert!(json.get("video_url").is_none());
        assert!(json.get("duration").is_none());
    }
}
