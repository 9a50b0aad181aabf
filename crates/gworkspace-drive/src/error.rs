//! Drive-specific error types.

use gworkspace_core::{ApiError, AppError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriveError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("No permission found for {email} on {file_id}")]
    PermissionNotFound { file_id: String, email: String },

    #[error("Unknown permission role: {0}")]
    UnknownRole(String),
}

impl DriveError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Api(e) => e.user_message(),
            Self::PermissionNotFound { .. } => "That user does not have access to the file.",
            Self::UnknownRole(_) => "Unknown sharing role.",
        }
    }
}

impl From<reqwest::Error> for DriveError {
    fn from(e: reqwest::Error) -> Self {
        Self::Api(ApiError::Network(e))
    }
}

impl From<DriveError> for AppError {
    fn from(e: DriveError) -> Self {
        match e {
            DriveError::Api(api) => AppError::Api(api),
            other => AppError::service("Drive", other.to_string()),
        }
    }
}
