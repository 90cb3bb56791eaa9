//! Configuration loading for nfoview.
//!
//! One explicit `NfoConfig` is built at process start and handed to the
//! components that need it (store root, retention window, glyph metrics,
//! token file). Nothing reads configuration from globals afterwards.
//!
//! # Configuration Philosophy
//!
//! - **Infrastructure** (`InfraConfig`): paths, bind address, telemetry, TLS.
//! - **Artifacts** (`ArtifactsConfig`): retention window and render settings.
//!
//! # Usage
//!
//! ```rust,no_run
//! use nfoconf::NfoConfig;
//!
//! let config = NfoConfig::load().expect("Failed to load config");
//! println!("store: {}", config.infra.paths.store_dir.display());
//! println!("ttl: {}s", config.artifacts.retention.ttl_secs);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins, merged key by key):
//! 1. `/etc/nfoview/config.toml` (system)
//! 2. `~/.config/nfoview/config.toml` (user)
//! 3. `./nfoview.toml` (local override, replaced by `--config`)
//! 4. Environment variables (`NFOVIEW_*`)
//!
//! # Example Config
//!
//! ```toml
//! [paths]
//! store_dir = "~/.local/share/nfoview/store"
//! static_dir = "fonts"
//! token_file = "tokens.txt"
//!
//! [bind]
//! host = "0.0.0.0"
//! http_port = 6789
//!
//! [telemetry]
//! otlp_endpoint = ""
//! log_level = "info"
//!
//! [tls]
//! cert = "/etc/nfoview/cert.pem"
//! key = "/etc/nfoview/key.pem"
//!
//! [retention]
//! ttl_secs = 300
//!
//! [render]
//! glyph_width = 8
//! glyph_height = 16
//! padding = 20
//! foreground = "#ffffff"
//! background = "#000000"
//! ```

pub mod artifacts;
pub mod infra;
pub mod loader;

pub use artifacts::{ArtifactsConfig, RenderConfig, RetentionConfig};
pub use infra::{BindConfig, InfraConfig, PathsConfig, TelemetryConfig, TlsConfig};
pub use loader::{discover_config_files_with_override, ConfigSources};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete nfoview configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NfoConfig {
    /// Infrastructure - cannot change at runtime.
    #[serde(flatten)]
    pub infra: InfraConfig,

    /// Rendering and retention policy.
    #[serde(flatten)]
    pub artifacts: ArtifactsConfig,
}

impl NfoConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with an optional CLI-supplied file, then apply env overrides.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut merged = toml::Table::new();

        for path in loader::discover_config_files_with_override(config_path) {
            let table = loader::load_table(&path)?;
            loader::merge_tables(&mut merged, table);
            sources.files.push(path);
        }

        let origin = sources
            .files
            .last()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("<defaults>"));
        let mut config = loader::from_table(merged, &origin)?;

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        // Build TOML manually for nicer formatting
        let paths = &self.infra.paths;
        let bind = &self.infra.bind;
        let telemetry = &self.infra.telemetry;
        let retention = &self.artifacts.retention;
        let render = &self.artifacts.render;

        let mut output = String::new();
        output.push_str("# nfoview configuration\n\n");

        output.push_str("[paths]\n");
        output.push_str(&format!("store_dir = \"{}\"\n", paths.store_dir.display()));
        output.push_str(&format!("static_dir = \"{}\"\n", paths.static_dir.display()));
        output.push_str(&format!("token_file = \"{}\"\n", paths.token_file.display()));

        output.push_str("\n[bind]\n");
        output.push_str(&format!("host = \"{}\"\n", bind.host));
        output.push_str(&format!("http_port = {}\n", bind.http_port));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("otlp_endpoint = \"{}\"\n", telemetry.otlp_endpoint));
        output.push_str(&format!("log_level = \"{}\"\n", telemetry.log_level));

        let tls = &self.infra.tls;
        output.push_str("\n[tls]\n");
        if let Some(cert) = &tls.cert {
            output.push_str(&format!("cert = \"{}\"\n", cert.display()));
        }
        if let Some(key) = &tls.key {
            output.push_str(&format!("key = \"{}\"\n", key.display()));
        }

        output.push_str("\n[retention]\n");
        output.push_str(&format!("ttl_secs = {}\n", retention.ttl_secs));
        output.push_str(&format!("persist_deadlines = {}\n", retention.persist_deadlines));

        output.push_str("\n[render]\n");
        output.push_str(&format!("glyph_width = {}\n", render.glyph_width));
        output.push_str(&format!("glyph_height = {}\n", render.glyph_height));
        output.push_str(&format!("padding = {}\n", render.padding));
        output.push_str(&format!("foreground = \"{}\"\n", render.foreground));
        output.push_str(&format!("background = \"{}\"\n", render.background));

        output
    }
}
