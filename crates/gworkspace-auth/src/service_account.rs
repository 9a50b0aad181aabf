//! Service-account authentication (signed JWT exchanged for an access token).

use gworkspace_core::AuthError;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::credentials::ServiceAccountKey;
use crate::storage::TokenSet;
use crate::TokenSource;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Assertion lifetime; Google rejects anything longer than an hour
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// JWT claims for Google OAuth2.
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Issuer (service account email)
    pub iss: String,
    /// Space-separated scopes
    pub scope: String,
    /// Audience (token endpoint)
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

pub struct ServiceAccountFlow {
    key: ServiceAccountKey,
    scopes: Vec<String>,
    client: reqwest::Client,
}

impl ServiceAccountFlow {
    pub fn new(key: ServiceAccountKey, scopes: Vec<String>) -> Self {
        Self {
            key,
            scopes,
            client: reqwest::Client::new(),
        }
    }

    pub fn claims(&self, now: i64) -> JwtClaims {
        JwtClaims {
            iss: self.key.client_email.clone(),
            scope: self.scopes.join(" "),
            aud: self.key.token_uri.clone(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        }
    }

    /// Sign the RS256 assertion for the given issue time.
    pub fn assertion(&self, now: i64) -> Result<String, AuthError> {
        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        encode(&Header::new(Algorithm::RS256), &self.claims(now), &key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Exchange a fresh assertion for an access token.
    #[tracing::instrument(skip(self), fields(issuer = %self.key.client_email), level = "info")]
    pub async fn fetch_token(&self) -> Result<TokenSet, AuthError> {
        let jwt = self.assertion(chrono::Utc::now().timestamp())?;

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", jwt.as_str())])
            .send()
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenExchange(format!("{}: {}", status, text)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::TokenExchange(format!("Failed to parse token response: {}", e)))?;

        tracing::info!("Obtained service account token");
        Ok(TokenSet::expiring_in(
            token.access_token,
            None,
            token.expires_in,
            self.scopes.clone(),
        ))
    }
}

impl TokenSource for ServiceAccountFlow {
    fn source_id(&self) -> &str {
        "service-account"
    }

    async fn token(&self) -> Result<TokenSet, AuthError> {
        self.fetch_token().await
    }
}
