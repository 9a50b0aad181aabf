//! Centralized error types for gworkspace-helper.
//!
//! Each service crate keeps its own error enum for domain failures and wraps
//! [`ApiError`] for anything that went wrong on the wire. Everything converts
//! into [`AppError`], which offers `user_message()` for terminal output.

use thiserror::Error;

/// Top-level application error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Google API error: {0}")]
    Api(#[from] ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Domain errors raised by the Docs, Drive and Calendar helpers.
    #[error("{service} error: {message}")]
    Service {
        service: &'static str,
        message: String,
    },

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn service(service: &'static str, message: impl Into<String>) -> Self {
        AppError::Service {
            service,
            message: message.into(),
        }
    }

    /// Returns a short, non-technical message for terminal output.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Config(e) => e.user_message(),
            AppError::Auth(e) => e.user_message(),
            AppError::Api(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Service { .. } => "The requested change could not be applied.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Failures talking to a Google REST endpoint.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Token expired or revoked")]
    TokenExpired,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: resource was modified")]
    Conflict,

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ApiError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ApiError::TokenExpired => "Your Google session has expired. Please sign in again.",
            ApiError::Forbidden(_) => {
                "Google denied access. Check the granted scopes and sharing settings."
            }
            ApiError::NotFound(_) => "The document, file or event was not found.",
            ApiError::Conflict => "The resource was modified elsewhere. Please retry.",
            ApiError::RateLimited(_) => "Too many requests. Please wait and try again.",
            ApiError::Status { status, .. } if *status >= 500 => {
                "Google is experiencing issues. Please try again later."
            }
            ApiError::Status { .. } => "The request was rejected by Google.",
            ApiError::Decode(_) => "Received an unexpected response from Google.",
            ApiError::Network(_) => "Network error. Check your connection.",
        }
    }

    /// HTTP status code when the error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::TokenExpired => Some(401),
            ApiError::Forbidden(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::Conflict => Some(409),
            ApiError::RateLimited(_) => Some(429),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Decode(_) => None,
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Unable to read or write configuration: {0}")]
    Unreadable(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration location not found. Set GWORKSPACE_CONFIG.",
            ConfigError::Unreadable(_) => "The configuration file could not be read or written.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}

/// Authentication errors (credentials, tokens, OAuth flow).
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unable to read credentials file {path}: {message}")]
    CredentialsUnreadable { path: String, message: String },

    #[error("Unable to parse credentials file: {0}")]
    InvalidCredentials(String),

    #[error("Unable to read token file: {0}")]
    TokenUnreadable(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("OAuth flow failed: {0}")]
    OAuthFailed(String),

    #[error("OAuth flow cancelled by user")]
    OAuthCancelled,

    #[error("Unable to sign service account assertion: {0}")]
    Signing(String),

    #[error("Token storage error: {0}")]
    StorageError(String),

    #[error("Port {0} already in use for OAuth callback")]
    PortInUse(u16),
}

impl AuthError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::CredentialsUnreadable { .. } => {
                "Credentials file not found. Download it from the Google Cloud console."
            }
            AuthError::InvalidCredentials(_) => "The credentials file is not valid.",
            AuthError::TokenUnreadable(_) => "The saved token could not be read.",
            AuthError::TokenExchange(_) => "Google refused the sign-in. Please try again.",
            AuthError::OAuthFailed(_) => "Sign-in failed. Please try again.",
            AuthError::OAuthCancelled => "Sign-in was cancelled.",
            AuthError::Signing(_) => "The service account key could not be used.",
            AuthError::StorageError(_) => "Failed to save credentials. Please try again.",
            AuthError::PortInUse(_) => "Sign-in port is busy. Close other apps and try again.",
        }
    }
}
