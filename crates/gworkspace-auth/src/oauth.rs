use gworkspace_core::AuthError;
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use warp::Filter;

use crate::credentials::ClientSecrets;
use crate::storage::{TokenSet, TokenStore};
use crate::TokenSource;

/// Lifetime assumed when the token endpoint omits `expires_in`
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

const CALLBACK_PAGE: &str = "<html><body><h1>Authorization successful!</h1>\
<p>You can close this window and return to the terminal.</p></body></html>";

type CallbackSender = Arc<Mutex<Option<oneshot::Sender<HashMap<String, String>>>>>;

/// A pending authorization: the URL to visit plus what is needed to finish it.
pub struct AuthorizationRequest {
    pub url: String,
    pub csrf_token: CsrfToken,
    pub pkce_verifier: PkceCodeVerifier,
}

/// OAuth2 installed-application flow with a loopback redirect.
pub struct InstalledAppFlow {
    secrets: ClientSecrets,
    scopes: Vec<String>,
    redirect_port: u16,
    store: TokenStore,
}

impl InstalledAppFlow {
    pub fn new(
        secrets: ClientSecrets,
        scopes: Vec<String>,
        redirect_port: u16,
        store: TokenStore,
    ) -> Self {
        Self {
            secrets,
            scopes,
            redirect_port,
            store,
        }
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}/callback", self.redirect_port)
    }

    fn oauth_client(&self) -> Result<BasicClient, AuthError> {
        let auth_url = AuthUrl::new(self.secrets.auth_uri.clone())
            .map_err(|e| AuthError::InvalidCredentials(format!("Invalid auth URL: {}", e)))?;
        let token_url = TokenUrl::new(self.secrets.token_uri.clone())
            .map_err(|e| AuthError::InvalidCredentials(format!("Invalid token URL: {}", e)))?;
        let redirect_url = RedirectUrl::new(self.redirect_uri())
            .map_err(|e| AuthError::OAuthFailed(format!("Invalid redirect URI: {}", e)))?;

        Ok(BasicClient::new(
            ClientId::new(self.secrets.client_id.clone()),
            Some(ClientSecret::new(self.secrets.client_secret.clone())),
            auth_url,
            Some(token_url),
        )
        .set_redirect_uri(redirect_url))
    }

    /// Build the consent URL (offline access, forced consent, PKCE).
    pub fn authorization_request(&self) -> Result<AuthorizationRequest, AuthError> {
        let client = self.oauth_client()?;
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut request = client.authorize_url(CsrfToken::new_random);
        for scope in &self.scopes {
            request = request.add_scope(Scope::new(scope.clone()));
        }

        let (url, csrf_token) = request
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .set_pkce_challenge(pkce_challenge)
            .url();

        Ok(AuthorizationRequest {
            url: url.to_string(),
            csrf_token,
            pkce_verifier,
        })
    }

    /// Exchange an authorization code for tokens.
    #[tracing::instrument(skip_all, level = "info")]
    pub async fn exchange_code(
        &self,
        code: String,
        pkce_verifier: PkceCodeVerifier,
    ) -> Result<TokenSet, AuthError> {
        let response = self
            .oauth_client()?
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

        Ok(self.token_set(&response, None))
    }

    /// Refresh an expired access token.
    #[tracing::instrument(skip_all, level = "info")]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, AuthError> {
        let response = self
            .oauth_client()?
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

        // Google omits the refresh token on refresh responses; keep the old one.
        Ok(self.token_set(&response, Some(refresh_token)))
    }

    fn token_set(&self, response: &BasicTokenResponse, previous_refresh: Option<&str>) -> TokenSet {
        let expires_in = response
            .expires_in()
            .map(|d| d.as_secs() as i64)
            .unwrap_or(DEFAULT_EXPIRES_IN_SECS);

        let scopes = response
            .scopes()
            .map(|s| s.iter().map(|scope| scope.to_string()).collect())
            .unwrap_or_else(|| self.scopes.clone());

        let refresh_token = response
            .refresh_token()
            .map(|t| t.secret().clone())
            .or_else(|| previous_refresh.map(str::to_string));

        TokenSet::expiring_in(
            response.access_token().secret().clone(),
            refresh_token,
            expires_in,
            scopes,
        )
    }

    /// Run the browser consent flow and wait for the loopback callback.
    pub async fn authenticate_interactive(&self) -> Result<TokenSet, AuthError> {
        let request = self.authorization_request()?;

        let (tx, rx) = oneshot::channel();
        let tx: CallbackSender = Arc::new(Mutex::new(Some(tx)));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let routes = warp::get()
            .and(warp::path("callback"))
            .and(warp::query::<HashMap<String, String>>())
            .and(warp::any().map(move || tx.clone()))
            .and_then(handle_callback);

        let (_addr, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(([127, 0, 0, 1], self.redirect_port), async move {
                let _ = shutdown_rx.await;
            })
            .map_err(|_| AuthError::PortInUse(self.redirect_port))?;
        tokio::spawn(server);

        tracing::info!("Open the following link in your browser to authorize access:");
        tracing::info!("{}", request.url);
        if let Err(e) = webbrowser::open(&request.url) {
            tracing::warn!("Failed to open browser ({}); visit the link manually", e);
        }

        let params = rx
            .await
            .map_err(|_| AuthError::OAuthFailed("Callback server stopped".to_string()));
        let _ = shutdown_tx.send(());
        let params = params?;

        if let Some(error) = params.get("error") {
            return Err(if error == "access_denied" {
                AuthError::OAuthCancelled
            } else {
                AuthError::OAuthFailed(error.clone())
            });
        }

        if params.get("state").map(String::as_str) != Some(request.csrf_token.secret().as_str()) {
            return Err(AuthError::OAuthFailed("CSRF token mismatch".to_string()));
        }

        let code = params
            .get("code")
            .cloned()
            .ok_or_else(|| AuthError::OAuthFailed("Callback carried no code".to_string()))?;

        self.exchange_code(code, request.pkce_verifier).await
    }
}

async fn handle_callback(
    params: HashMap<String, String>,
    tx: CallbackSender,
) -> Result<impl warp::Reply, warp::Rejection> {
    if let Some(sender) = tx.lock().await.take() {
        let _ = sender.send(params);
    }
    Ok(warp::reply::html(CALLBACK_PAGE))
}

impl TokenSource for InstalledAppFlow {
    fn source_id(&self) -> &str {
        "installed-app"
    }

    /// Stored token if still fresh, otherwise refresh, otherwise ask the user.
    async fn token(&self) -> Result<TokenSet, AuthError> {
        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("Ignoring unreadable token file: {}", e);
                None
            }
        };

        let token = match stored {
            Some(token) if !token.needs_refresh() => return Ok(token),
            Some(TokenSet {
                refresh_token: Some(refresh_token),
                ..
            }) => match self.refresh(&refresh_token).await {
                Ok(token) => token,
                Err(e) => {
                    tracing::warn!("Token refresh failed, re-authorizing: {}", e);
                    self.authenticate_interactive().await?
                }
            },
            _ => self.authenticate_interactive().await?,
        };

        self.store.save(&token)?;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn flow(token_uri: &str, store: TokenStore) -> InstalledAppFlow {
        InstalledAppFlow::new(
            ClientSecrets {
                client_id: "test_client_id".to_string(),
                client_secret: "test_client_secret".to_string(),
                auth_uri: "https://accounts.google.com/o/oauth2/auth".to_string(),
                token_uri: token_uri.to_string(),
            },
            vec![
                "https://www.googleapis.com/auth/documents".to_string(),
                "https://www.googleapis.com/auth/calendar".to_string(),
            ],
            8080,
            store,
        )
    }

    #[test]
    fn test_auth_url_contains_scopes() {
        let flow = flow("https://oauth2.googleapis.com/token", TokenStore::new("token.json"));
        let request = flow.authorization_request().unwrap();
        assert!(request.url.contains("scope="));
        assert!(request.url.contains("documents"));
        assert!(request.url.contains("calendar"));
    }

    #[test]
    fn test_auth_url_contains_offline_access() {
        let flow = flow("https://oauth2.googleapis.com/token", TokenStore::new("token.json"));
        let request = flow.authorization_request().unwrap();
        assert!(request.url.contains("access_type=offline"));
        assert!(request.url.contains("prompt=consent"));
        assert!(request.url.contains("code_challenge="));
    }

    #[test]
    fn test_state_is_unique() {
        let flow = flow("https://oauth2.googleapis.com/token", TokenStore::new("token.json"));
        let first = flow.authorization_request().unwrap();
        let second = flow.authorization_request().unwrap();
        assert_ne!(first.csrf_token.secret(), second.csrf_token.secret());
    }

    #[test]
    fn test_redirect_uri_uses_port() {
        let flow = flow("https://oauth2.googleapis.com/token", TokenStore::new("token.json"));
        assert_eq!(flow.redirect_uri(), "http://127.0.0.1:8080/callback");

        // Same loopback address the callback server binds to
        let request = flow.authorization_request().unwrap();
        assert!(request
            .url
            .contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A8080%2Fcallback"));
    }

    #[tokio::test]
    async fn test_fresh_stored_token_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        store
            .save(&TokenSet::expiring_in("cached".to_string(), None, 3600, vec![]))
            .unwrap();

        // The token URI is never contacted for a fresh token.
        let flow = flow("http://127.0.0.1:9/token", store);
        let token = flow.token().await.unwrap();
        assert_eq!(token.access_token, "cached");
    }
}
