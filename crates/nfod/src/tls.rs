//! HTTPS certificate loading.

use anyhow::{Context, Result};
use axum_server::tls_rustls::RustlsConfig;
use nfoconf::TlsConfig;

/// Load the configured certificate pair.
///
/// Returns `None` when TLS is not configured. A half-configured pair or a
/// missing file is an error, so a typo never silently downgrades to HTTP.
pub async fn load_rustls_config(config: &TlsConfig) -> Result<Option<RustlsConfig>> {
    let (cert, key) = match (&config.cert, &config.key) {
        (None, None) => return Ok(None),
        (Some(cert), Some(key)) => (cert, key),
        (cert, key) => anyhow::bail!(
            "TLS needs both cert and key (cert: {}, key: {})",
            cert.as_ref().map_or("unset".into(), |p| p.display().to_string()),
            key.as_ref().map_or("unset".into(), |p| p.display().to_string()),
        ),
    };

    if !cert.exists() || !key.exists() {
        anyhow::bail!(
            "TLS enabled but certificates not found.\n\
             Expected:\n  cert: {}\n  key: {}",
            cert.display(),
            key.display()
        );
    }

    let rustls = RustlsConfig::from_pem_file(cert, key)
        .await
        .with_context(|| {
            format!(
                "Failed to load TLS config from {} and {}",
                cert.display(),
                key.display()
            )
        })?;
    Ok(Some(rustls))
}
