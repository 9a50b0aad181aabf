//! Calendar-specific error types.

use gworkspace_core::{ApiError, AppError};
use gworkspace_drive::DriveError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Drive(#[from] DriveError),

    #[error("Unknown time zone: {0}")]
    InvalidTimeZone(String),

    #[error("Invalid event data: {0}")]
    InvalidEventData(String),
}

impl CalendarError {
    /// User-friendly error message for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Api(e) => e.user_message(),
            Self::Drive(e) => e.user_message(),
            Self::InvalidTimeZone(_) => "The configured calendar time zone is not recognised.",
            Self::InvalidEventData(_) => "The event details are not valid.",
        }
    }
}

impl From<reqwest::Error> for CalendarError {
    fn from(e: reqwest::Error) -> Self {
        Self::Api(ApiError::Network(e))
    }
}

impl From<CalendarError> for AppError {
    fn from(e: CalendarError) -> Self {
        match e {
            CalendarError::Api(api) => AppError::Api(api),
            CalendarError::Drive(drive) => drive.into(),
            other => AppError::service("Calendar", other.to_string()),
        }
    }
}
