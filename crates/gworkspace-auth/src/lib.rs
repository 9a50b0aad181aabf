//! Exchange stored Google credentials for an access token.

pub mod credentials;
pub mod oauth;
pub mod service_account;
pub mod storage;

pub use credentials::{ClientSecrets, ServiceAccountKey};
pub use oauth::{AuthorizationRequest, InstalledAppFlow};
pub use service_account::ServiceAccountFlow;
pub use storage::{TokenSet, TokenStore};

use gworkspace_core::{AuthConfig, AuthError};

/// Something that can hand out a usable access token.
#[allow(async_fn_in_trait)]
pub trait TokenSource {
    /// Identifier used in logs (e.g. "installed-app")
    fn source_id(&self) -> &str;

    async fn token(&self) -> Result<TokenSet, AuthError>;
}

/// Obtain a token using whichever flow the config selects.
#[tracing::instrument(skip(config), fields(service_account = config.use_service_account), level = "info")]
pub async fn authenticate(config: &AuthConfig) -> Result<TokenSet, AuthError> {
    if config.use_service_account {
        let key = ServiceAccountKey::from_file(&config.credentials_file)?;
        let flow = ServiceAccountFlow::new(key, config.scopes.clone());
        fetch(&flow).await
    } else {
        let secrets = ClientSecrets::from_file(&config.credentials_file)?;
        let flow = InstalledAppFlow::new(
            secrets,
            config.scopes.clone(),
            config.redirect_port,
            TokenStore::new(&config.token_file),
        );
        fetch(&flow).await
    }
}

async fn fetch<S: TokenSource>(source: &S) -> Result<TokenSet, AuthError> {
    let token = source.token().await?;
    tracing::info!("Authenticated via {}", source.source_id());
    Ok(token)
}
