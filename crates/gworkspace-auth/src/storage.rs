use gworkspace_core::AuthError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Seconds before expiry at which a token is considered due for refresh
const REFRESH_BUFFER_SECS: i64 = 300;

/// Token set for OAuth2 authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    /// Access token for API requests
    pub access_token: String,

    /// Optional refresh token for token renewal
    pub refresh_token: Option<String>,

    /// Token expiration timestamp (Unix timestamp)
    pub expires_at: i64,

    /// Scopes granted to this token
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl TokenSet {
    /// Build a token set from an `expires_in` lifetime measured from now
    pub fn expiring_in(
        access_token: String,
        refresh_token: Option<String>,
        expires_in_secs: i64,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: chrono::Utc::now().timestamp() + expires_in_secs,
            scopes,
        }
    }

    /// Check if the token needs refresh (within 5 minutes of expiry)
    pub fn needs_refresh(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        now >= self.expires_at - REFRESH_BUFFER_SECS
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        now >= self.expires_at
    }
}

/// File-backed storage for the installed-app token.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Persist a token set, creating the parent directory if needed
    pub fn save(&self, token_set: &TokenSet) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    AuthError::StorageError(format!("Failed to create token directory: {}", e))
                })?;
            }
        }

        let json = serde_json::to_string_pretty(token_set)
            .map_err(|e| AuthError::StorageError(format!("Failed to serialize token: {}", e)))?;

        owner_only_options()
            .open(&self.path)
            .and_then(|mut file| file.write_all(json.as_bytes()))
            .map_err(|e| AuthError::StorageError(format!("Failed to write token file: {}", e)))?;

        tracing::info!("Saved token to {}", self.path.display());
        Ok(())
    }

    /// Load the token set, `Ok(None)` when no token has been saved yet
    pub fn load(&self) -> Result<Option<TokenSet>, AuthError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path)
            .map_err(|e| AuthError::TokenUnreadable(format!("{}: {}", self.path.display(), e)))?;

        let token_set: TokenSet = serde_json::from_str(&json)
            .map_err(|e| AuthError::TokenUnreadable(format!("{}: {}", self.path.display(), e)))?;

        tracing::info!("Loaded token from {}", self.path.display());
        Ok(Some(token_set))
    }

}

/// Token files are created readable by the owner only.
fn owner_only_options() -> fs::OpenOptions {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
}
