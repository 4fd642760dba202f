//! Service configuration
//!
//! Built once at startup from command-line flags, environment variables, the
//! optional TOML config file and compiled defaults (in that priority order),
//! then shared read-only with every handler.

use clap::Parser;
use curio_common::config::{normalize_base_url, TomlConfig};
use curio_common::{ClientTimeouts, Error, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::resolver::ProbeStrategy;

pub const DEFAULT_PORT: u16 = 8085;
pub const DEFAULT_APOLLO_URL: &str = "https://apollo.lib.virginia.edu/api";
pub const DEFAULT_IIIF_URL: &str = "https://iiifman.lib.virginia.edu";
pub const DEFAULT_FEDORA_URL: &str = "https://wsls.lib.virginia.edu";
pub const DEFAULT_HOSTNAME: &str = "curio.lib.virginia.edu";
pub const DEFAULT_HEALTH_PID: &str = "uva-lib:1157560";

/// Command-line arguments for curio-viewer
#[derive(Parser, Debug, Default)]
#[command(name = "curio-viewer")]
#[command(about = "Digital object viewer: resolves a PID to its repository and serves its viewer payload")]
#[command(version)]
pub struct Args {
    /// Port to offer service on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Apollo API base URL (legacy WSLS media metadata)
    #[arg(long = "apollo", env = "APOLLO_URL")]
    pub apollo_url: Option<String>,

    /// IIIF manifest service base URL
    #[arg(long = "iiif", env = "CURIO_IIIF_MAN_URL")]
    pub iiif_url: Option<String>,

    /// Base URL WSLS media assets are served from
    #[arg(long = "fedora", env = "WSLS_FEDORA_URL")]
    pub fedora_url: Option<String>,

    /// TrackSys API base URL, used for oEmbed titles of image objects
    #[arg(long = "tracksys", env = "TRACKSYS_URL")]
    pub tracksys_url: Option<String>,

    /// Public hostname of this service, used in embed snippets
    #[arg(long = "host", env = "CURIO_HOST")]
    pub hostname: Option<String>,

    /// Rights statement URL passed to the image viewer
    #[arg(long = "rights", env = "RIGHTS_URL")]
    pub rights_url: Option<String>,

    /// Bucket holding Archivematica package trees
    #[arg(long, env = "ARCHIVEMATICA_BUCKET")]
    pub archival_bucket: Option<String>,

    /// S3-compatible endpoint overriding the AWS regional endpoint
    #[arg(long, env = "ARCHIVEMATICA_ENDPOINT")]
    pub archival_endpoint: Option<String>,

    /// Read package trees from a local directory instead of the bucket
    #[arg(long, env = "ARCHIVEMATICA_DIR")]
    pub archival_dir: Option<PathBuf>,

    /// Directory holding the front end (`public/` and `uv/`)
    #[arg(long, env = "CURIO_WEB_DIR")]
    pub web_dir: Option<PathBuf>,

    /// Known PID used by the healthcheck
    #[arg(long, env = "CURIO_HEALTH_PID")]
    pub health_pid: Option<String>,

    /// Local dev mode: accept uncached IIIF manifests
    #[arg(long = "no-cache", alias = "nocache")]
    pub no_cache: bool,

    /// Probe all upstreams at once instead of one after another
    #[arg(long)]
    pub concurrent_probes: bool,

    /// Upstream connect timeout in seconds
    #[arg(long)]
    pub connect_timeout: Option<u64>,

    /// Upstream read timeout in seconds
    #[arg(long)]
    pub read_timeout: Option<u64>,

    /// Path to a TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Where Archivematica package trees are read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchivalSource {
    /// `s3://{bucket}/{pid}.json`, optionally through a non-AWS endpoint
    Bucket { endpoint: Option<String>, bucket: String },
    /// `{dir}/{pid}.json`
    Directory(PathBuf),
}

/// Resolved, immutable service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub apollo_url: String,
    pub iiif_url: String,
    pub fedora_url: String,
    pub tracksys_url: Option<String>,
    pub hostname: String,
    pub rights_url: Option<String>,
    pub archival: ArchivalSource,
    pub web_dir: Option<PathBuf>,
    pub health_pid: String,
    pub no_cache: bool,
    pub probe_strategy: ProbeStrategy,
    pub timeouts: ClientTimeouts,
}

impl Config {
    /// Configuration pointing at the given upstreams, everything else default
    pub fn with_upstreams(iiif_url: &str, apollo_url: &str, fedora_url: &str, archival: ArchivalSource) -> Self {
        Self {
            port: DEFAULT_PORT,
            apollo_url: normalize_base_url(apollo_url),
            iiif_url: normalize_base_url(iiif_url),
            fedora_url: normalize_base_url(fedora_url),
            tracksys_url: None,
            hostname: DEFAULT_HOSTNAME.to_string(),
            rights_url: None,
            archival,
            web_dir: None,
            health_pid: DEFAULT_HEALTH_PID.to_string(),
            no_cache: false,
            probe_strategy: ProbeStrategy::Sequential,
            timeouts: ClientTimeouts::default(),
        }
    }

    /// Merge command-line/environment values over the config file over
    /// compiled defaults.
    pub fn resolve(args: Args, file: TomlConfig) -> Result<Self> {
        let url = |cli: Option<String>, toml: Option<String>, default: &str| {
            normalize_base_url(cli.or(toml).as_deref().unwrap_or(default))
        };
        let optional_url = |cli: Option<String>, toml: Option<String>| {
            cli.or(toml)
                .map(|u| normalize_base_url(&u))
                .filter(|u| !u.is_empty())
        };

        let archival = match args.archival_dir.or(file.archival_dir) {
            Some(dir) => ArchivalSource::Directory(dir),
            None => {
                let bucket = args
                    .archival_bucket
                    .or(file.archival_bucket)
                    .filter(|b| !b.is_empty())
                    .ok_or_else(|| {
                        Error::Config(
                            "an Archivematica bucket (--archival-bucket) or directory (--archival-dir) is required"
                                .to_string(),
                        )
                    })?;
                ArchivalSource::Bucket {
                    endpoint: optional_url(args.archival_endpoint, file.archival_endpoint),
                    bucket,
                }
            }
        };

        let concurrent = args.concurrent_probes || file.concurrent_probes.unwrap_or(false);
        let defaults = ClientTimeouts::default();
        let timeouts = ClientTimeouts {
            connect: args
                .connect_timeout
                .or(file.connect_timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect),
            read: args
                .read_timeout
                .or(file.read_timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.read),
        };
        if timeouts.connect.is_zero() || timeouts.read.is_zero() {
            return Err(Error::Config("upstream timeouts must be at least one second".to_string()));
        }

        Ok(Self {
            port: args.port.or(file.port).unwrap_or(DEFAULT_PORT),
            apollo_url: url(args.apollo_url, file.apollo_url, DEFAULT_APOLLO_URL),
            iiif_url: url(args.iiif_url, file.iiif_url, DEFAULT_IIIF_URL),
            fedora_url: url(args.fedora_url, file.fedora_url, DEFAULT_FEDORA_URL),
            tracksys_url: optional_url(args.tracksys_url, file.tracksys_url),
            hostname: args
                .hostname
                .or(file.hostname)
                .unwrap_or_else(|| DEFAULT_HOSTNAME.to_string()),
            rights_url: args.rights_url.or(file.rights_url).filter(|u| !u.is_empty()),
            archival,
            web_dir: args.web_dir.or(file.web_dir),
            health_pid: args
                .health_pid
                .or(file.health_pid)
                .unwrap_or_else(|| DEFAULT_HEALTH_PID.to_string()),
            no_cache: args.no_cache || file.no_cache.unwrap_or(false),
            probe_strategy: if concurrent {
                ProbeStrategy::Concurrent
            } else {
                ProbeStrategy::Sequential
            },
            timeouts,
        })
    }

    /// Log the resolved configuration at startup
    pub fn log_summary(&self) {
        info!("[CONFIG] port           = [{}]", self.port);
        info!("[CONFIG] apolloURL      = [{}]", self.apollo_url);
        info!("[CONFIG] iiifURL        = [{}]", self.iiif_url);
        info!("[CONFIG] fedoraURL      = [{}]", self.fedora_url);
        info!("[CONFIG] tracksysURL    = [{}]", self.tracksys_url.as_deref().unwrap_or(""));
        info!("[CONFIG] hostname       = [{}]", self.hostname);
        info!("[CONFIG] rightsURL      = [{}]", self.rights_url.as_deref().unwrap_or(""));
        match &self.archival {
            ArchivalSource::Bucket { endpoint, bucket } => info!(
                "[CONFIG] archival       = [s3://{}] endpoint [{}]",
                bucket,
                endpoint.as_deref().unwrap_or("aws")
            ),
            ArchivalSource::Directory(dir) => info!("[CONFIG] archival       = [{}]", dir.display()),
        }
        info!("[CONFIG] healthPID      = [{}]", self.health_pid);
        info!("[CONFIG] cacheDisabled  = [{}]", self.no_cache);
        info!("[CONFIG] probeStrategy  = [{:?}]", self.probe_strategy);
        info!(
            "[CONFIG] timeouts       = [connect {:?}, read {:?}]",
            self.timeouts.connect, self.timeouts.read
        );
    }
}
