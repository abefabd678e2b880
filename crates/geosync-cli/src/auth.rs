//! Token generation for geosync clients.
//!
//! Signs HS256 tokens with the same secret the server is configured with
//! (`GEOSYNC_JWT_SECRET`), so CLI tools can publish positions locally.

use anyhow::{Context, Result};
use geosync_core::issue_token;

/// Secret the server falls back to when `GEOSYNC_JWT_SECRET` is unset.
pub const DEV_SECRET: &str = "geosync-dev-secret";

/// Configuration for token generation.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Shared signing secret
    pub secret: String,
    /// Token validity in seconds
    pub ttl_secs: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: std::env::var("GEOSYNC_JWT_SECRET")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEV_SECRET.to_string()),
            ttl_secs: 24 * 3600,
        }
    }
}

/// Generate a signed token for `user_id`.
///
/// # Example
/// ```
/// use geosync_cli::auth::generate_token;
///
/// let token = generate_token("alice", None).unwrap();
/// assert_eq!(token.split('.').count(), 3);
/// ```
pub fn generate_token(user_id: &str, config: Option<TokenConfig>) -> Result<String> {
    let config = config.unwrap_or_default();
    if user_id.trim().is_empty() {
        anyhow::bail!("user id must not be empty");
    }
    issue_token(config.secret.as_bytes(), user_id, config.ttl_secs)
        .context("Failed to encode token")
}
