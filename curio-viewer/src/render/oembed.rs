//! oEmbed descriptors
//!
//! An embedding site hands us the public URL of an object
//! (`https://curio.../view/{pid}?page=2`) and gets back a fixed-shape
//! descriptor holding an HTML snippet that frames the viewer.

use serde::Serialize;
use url::{form_urlencoded, Url};

pub const OEMBED_VERSION: &str = "1.0";
pub const PROVIDER_NAME: &str = "UVA Library";
pub const PROVIDER_URL: &str = "http://www.library.virginia.edu/";

/// Requested response encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedFormat {
    Json,
    Xml,
}

impl EmbedFormat {
    /// `json` when absent or empty
    pub fn parse(raw: Option<&str>) -> Result<Self, String> {
        match raw.map(str::trim).unwrap_or_default() {
            "" | "json" => Ok(EmbedFormat::Json),
            "xml" => Ok(EmbedFormat::Xml),
            other => Err(format!("Requested format '{}' is invalid.", other)),
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            EmbedFormat::Json => "application/json; charset=utf-8",
            EmbedFormat::Xml => "text/xml; charset=utf-8",
        }
    }
}

/// Embed frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedSize {
    pub width: u32,
    pub height: u32,
}

impl EmbedSize {
    pub const IMAGE: EmbedSize = EmbedSize { width: 800, height: 600 };
    pub const LEGACY_MEDIA: EmbedSize = EmbedSize { width: 670, height: 800 };
    pub const ARCHIVAL: EmbedSize = EmbedSize { width: 800, height: 600 };

    /// Shrink to the client's maxima. A default is never exceeded.
    pub fn constrain(self, max_width: Option<u32>, max_height: Option<u32>) -> Self {
        Self {
            width: max_width.map_or(self.width, |w| w.min(self.width)),
            height: max_height.map_or(self.height, |h| h.min(self.height)),
        }
    }
}

/// Parse `maxwidth` / `maxheight`. Missing, non-numeric and zero values
/// impose no constraint.
pub fn parse_dimension(raw: Option<&str>) -> Option<u32> {
    raw?.trim().parse::<u32>().ok().filter(|v| *v > 0)
}

/// The object an oEmbed `url` parameter points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedTarget {
    pub pid: String,
    pub unit: Option<String>,
    pub page: Option<String>,
    /// `http` or `https`, echoed into the snippet
    pub scheme: String,
}

/// Parse a public object URL of the form `{scheme}://{host}/{kind}/{pid}`.
///
/// `kind` is not checked (`view`, and the older `images` and `wsls`, are all
/// accepted) since the PID is resolved again anyway. `unit` and `page` are
/// taken from the URL's query. A value that was percent-encoded twice is
/// decoded once more before giving up.
pub fn parse_embed_url(raw: &str) -> Result<EmbedTarget, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("A URL param is required!".to_string());
    }

    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(first) => {
            let decoded = percent_encoding::percent_decode_str(raw).decode_utf8_lossy();
            Url::parse(&decoded).map_err(|_| format!("Invalid URL: {}", first))?
        }
    };

    let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();
    let pid = match segments.as_slice() {
        [kind, pid] if !kind.is_empty() && !pid.is_empty() => {
            percent_encoding::percent_decode_str(pid).decode_utf8_lossy().into_owned()
        }
        _ => return Err(format!("Invalid URL in request: {}", raw)),
    };

    let query_value = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    };

    Ok(EmbedTarget {
        pid,
        unit: query_value("unit"),
        page: query_value("page"),
        scheme: url.scheme().to_string(),
    })
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// HTML snippet framing the public viewer for `target`
pub fn embed_html(host: &str, target: &EmbedTarget, size: EmbedSize) -> String {
    let mut src = Url::parse(&format!("{}://{}/", target.scheme, host))
        .map(|mut base| {
            if let Ok(mut path) = base.path_segments_mut() {
                path.pop_if_empty().extend(["view", target.pid.as_str()]);
            }
            base.to_string()
        })
        .unwrap_or_else(|_| format!("{}://{}/view/{}", target.scheme, host, target.pid));

    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(unit) = &target.unit {
        query.append_pair("unit", unit);
    }
    if let Some(page) = &target.page {
        query.append_pair("page", page);
    }
    let query = query.finish();
    if !query.is_empty() {
        src.push('?');
        src.push_str(&query);
    }

    format!(
        r#"<iframe src="{}" width="{}" height="{}" allowfullscreen frameborder="0"></iframe>"#,
        escape_attribute(&src),
        size.width,
        size.height
    )
}

/// oEmbed "rich" response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename = "oembed")]
pub struct EmbedDescriptor {
    pub version: String,
    #[serde(rename = "type")]
    pub embed_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub author: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub html: String,
    pub width: u32,
    pub height: u32,
    pub provider_name: String,
    pub provider_url: String,
}

impl EmbedDescriptor {
    pub fn rich(title: String, author: String, html: String, size: EmbedSize) -> Self {
        Self {
            version: OEMBED_VERSION.to_string(),
            embed_type: "rich".to_string(),
            title,
            author,
            html,
            width: size.width,
            height: size.height,
            provider_name: PROVIDER_NAME.to_string(),
            provider_url: PROVIDER_URL.to_string(),
        }
    }

    /// JSON with the HTML snippet left unescaped
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_xml(&self) -> Result<String, String> {
        let body = quick_xml::se::to_string(self).map_err(|e| e.to_string())?;
        Ok(format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\" standalone=\"yes\"?>\n{}",
            body
        ))
    }

    pub fn render(&self, format: EmbedFormat) -> Result<String, String> {
        match format {
            EmbedFormat::Json => self.to_json().map_err(|e| e.to_string()),
            EmbedFormat::Xml => self.to_xml(),
        }
    }
}
