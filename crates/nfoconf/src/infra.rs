//! Infrastructure configuration - things that cannot change at runtime.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Filesystem paths for the artifact store and static assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root of the artifact store (images, raw payloads, records).
    /// Default: ~/.local/share/nfoview/store
    #[serde(default = "PathsConfig::default_store_dir")]
    pub store_dir: PathBuf,

    /// Directory served under `/fonts` (web fonts, stylesheets).
    /// Default: ./fonts
    #[serde(default = "PathsConfig::default_static_dir")]
    pub static_dir: PathBuf,

    /// Access tokens for the upload API, one per line.
    /// Default: ./tokens.txt
    #[serde(default = "PathsConfig::default_token_file")]
    pub token_file: PathBuf,
}

impl PathsConfig {
    fn default_store_dir() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".local/share/nfoview/store"))
            .unwrap_or_else(|| PathBuf::from(".local/share/nfoview/store"))
    }

    fn default_static_dir() -> PathBuf {
        PathBuf::from("fonts")
    }

    fn default_token_file() -> PathBuf {
        PathBuf::from("tokens.txt")
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            store_dir: Self::default_store_dir(),
            static_dir: Self::default_static_dir(),
            token_file: Self::default_token_file(),
        }
    }
}

/// Network bind address for the HTTP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindConfig {
    /// Interface to listen on. Default: 0.0.0.0
    #[serde(default = "BindConfig::default_host")]
    pub host: String,

    /// HTTP port. Default: 6789
    #[serde(default = "BindConfig::default_http_port")]
    pub http_port: u16,
}

impl BindConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_http_port() -> u16 {
        6789
    }

    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            http_port: Self::default_http_port(),
        }
    }
}

/// Telemetry and observability configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// OTLP gRPC endpoint for OpenTelemetry. Empty disables export.
    /// Default: "" (console logging only)
    #[serde(default)]
    pub otlp_endpoint: String,

    /// Log level or filter directive (trace, debug, info, warn, error).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }

    /// Whether OTLP export is configured.
    pub fn otlp_enabled(&self) -> bool {
        !self.otlp_endpoint.trim().is_empty()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: String::new(),
            log_level: Self::default_log_level(),
        }
    }
}

/// TLS termination. Both files must be set to serve HTTPS; with neither set
/// the server speaks plain HTTP.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TlsConfig {
    /// PEM certificate chain.
    #[serde(default)]
    pub cert: Option<PathBuf>,

    /// PEM private key.
    #[serde(default)]
    pub key: Option<PathBuf>,
}

impl TlsConfig {
    /// Whether either file is configured.
    pub fn requested(&self) -> bool {
        self.cert.is_some() || self.key.is_some()
    }
}

/// Infrastructure configuration - cannot change at runtime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfraConfig {
    /// Filesystem paths.
    #[serde(default)]
    pub paths: PathsConfig,

    /// HTTP bind address.
    #[serde(default)]
    pub bind: BindConfig,

    /// Telemetry settings.
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// HTTPS certificate and key.
    #[serde(default)]
    pub tls: TlsConfig,
}
