//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, NfoConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/nfoview/config.toml");
    if system.exists() {
        files.push(system);
    }

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("nfoview/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("nfoview.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read a TOML file into a raw table, for layering.
pub fn load_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a single config file on top of compiled defaults.
pub fn load_from_file(path: &Path) -> Result<NfoConfig, ConfigError> {
    let table = load_table(path)?;
    from_table(table, path)
}

/// Deserialize a (possibly merged) table. Missing keys take their defaults.
pub(crate) fn from_table(table: toml::Table, origin: &Path) -> Result<NfoConfig, ConfigError> {
    let mut config: NfoConfig = toml::Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Parse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;

    let paths = &mut config.infra.paths;
    for path in [&mut paths.store_dir, &mut paths.static_dir, &mut paths.token_file] {
        expand_in_place(path);
    }
    let tls = &mut config.infra.tls;
    for path in [tls.cert.as_mut(), tls.key.as_mut()].into_iter().flatten() {
        expand_in_place(path);
    }

    Ok(config)
}

/// Expand `~` and `$VAR` prefixes of a path read from a file.
fn expand_in_place(path: &mut PathBuf) {
    if let Some(raw) = path.to_str() {
        *path = expand_path(raw);
    }
}

/// Deep-merge `overlay` into `base`. Nested tables merge key by key,
/// everything else in `overlay` replaces the base value.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_sub)), toml::Value::Table(overlay_sub)) => {
                merge_tables(base_sub, overlay_sub);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut NfoConfig, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, |key| env::var(key).ok());
}

/// Override logic with an injectable lookup, so tests don't touch process env.
pub(crate) fn apply_overrides_from(
    config: &mut NfoConfig,
    sources: &mut ConfigSources,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let mut hit = |key: &str| {
        let value = lookup(key);
        if value.is_some() {
            sources.env_overrides.push(key.to_string());
        }
        value
    };

    if let Some(v) = hit("NFOVIEW_STORE_DIR") {
        config.infra.paths.store_dir = expand_path(&v);
    }
    if let Some(v) = hit("NFOVIEW_STATIC_DIR") {
        config.infra.paths.static_dir = expand_path(&v);
    }
    if let Some(v) = hit("NFOVIEW_TOKEN_FILE") {
        config.infra.paths.token_file = expand_path(&v);
    }

    if let Some(v) = hit("NFOVIEW_TLS_CERT") {
        config.infra.tls.cert = Some(expand_path(&v));
    }
    if let Some(v) = hit("NFOVIEW_TLS_KEY") {
        config.infra.tls.key = Some(expand_path(&v));
    }

    if let Some(v) = hit("NFOVIEW_HOST") {
        config.infra.bind.host = v;
    }
    if let Some(port) = hit("NFOVIEW_HTTP_PORT").and_then(|v| v.parse().ok()) {
        config.infra.bind.http_port = port;
    }

    if let Some(ttl) = hit("NFOVIEW_TTL_SECS").and_then(|v| v.parse().ok()) {
        config.artifacts.retention.ttl_secs = ttl;
    }

    if let Some(v) = hit("NFOVIEW_OTLP_ENDPOINT") {
        config.infra.telemetry.otlp_endpoint = v;
    }
    // Also support standard OTEL env var
    if let Some(v) = hit("OTEL_EXPORTER_OTLP_ENDPOINT") {
        config.infra.telemetry.otlp_endpoint = v;
    }
    if let Some(v) = hit("NFOVIEW_LOG_LEVEL") {
        config.infra.telemetry.log_level = v;
    }
    if let Some(v) = hit("RUST_LOG") {
        config.infra.telemetry.log_level = v;
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            home.join(stripped)
        } else {
            PathBuf::from(path)
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // Handle $VAR/rest/of/path
        if let Some(slash_pos) = stripped.find('/') {
            let var_name = &stripped[..slash_pos];
            if let Ok(var_value) = env::var(var_name) {
                PathBuf::from(var_value).join(&stripped[slash_pos + 1..])
            } else {
                PathBuf::from(path)
            }
        } else {
            env::var(stripped)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(path))
        }
    } else {
        PathBuf::from(path)
    }
}
