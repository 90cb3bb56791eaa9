//! Access tokens for the upload API.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

/// Set of accepted tokens, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct TokenSet {
    tokens: Arc<HashSet<String>>,
}

impl TokenSet {
    /// One token per line; surrounding whitespace and blank lines are ignored.
    pub fn parse(contents: &str) -> Self {
        Self::from_tokens(contents.lines())
    }

    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens = tokens
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        Self {
            tokens: Arc::new(tokens),
        }
    }

    /// Load from a token file. A missing file yields an empty set.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(Self::parse(&contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(
                    path = %path.display(),
                    "Token file not found; uploads will be rejected"
                );
                Ok(Self::default())
            }
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read token file {}", path.display()))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Check an `Authorization` header value, bare or with a `Bearer ` prefix.
    pub fn authorize(&self, header: Option<&str>) -> bool {
        let Some(value) = header.map(str::trim) else {
            return false;
        };
        let token = value.strip_prefix("Bearer ").map(str::trim).unwrap_or(value);
        !token.is_empty() && self.tokens.contains(token)
    }
}

/// Middleware rejecting requests without a known token.
pub async fn require_token(
    State(tokens): State<TokenSet>,
    request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if tokens.authorize(header) {
        next.run(request).await
    } else {
        tracing::info!(uri = %request.uri(), "Rejected request with missing or unknown token");
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"message": "Unauthorized"})),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_skips_blank_lines() {
        let tokens = TokenSet::parse("alpha\n\n  beta  \r\n\n");
        assert_eq!(tokens.len(), 2);
        assert!(tokens.authorize(Some("alpha")));
        assert!(tokens.authorize(Some("beta")));
    }

    #[test]
    fn test_bearer_prefix_accepted() {
        let tokens = TokenSet::from_tokens(["s3cret"]);
        assert!(tokens.authorize(Some("Bearer s3cret")));
        assert!(tokens.authorize(Some("s3cret")));
        assert!(!tokens.authorize(Some("Bearer wrong")));
        assert!(!tokens.authorize(Some("")));
        assert!(!tokens.authorize(None));
    }

    #[test]
    fn test_empty_set_rejects_everything() {
        let tokens = TokenSet::default();
        assert!(!tokens.authorize(Some("")));
        assert!(!tokens.authorize(Some("anything")));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let tokens = TokenSet::load(&temp_dir.path().join("tokens.txt")).unwrap();
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_load_reads_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tokens.txt");
        std::fs::write(&path, "one\ntwo\n").unwrap();

        let tokens = TokenSet::load(&path).unwrap();
        assert_eq!(tokens.len(), 2);
    }
}
