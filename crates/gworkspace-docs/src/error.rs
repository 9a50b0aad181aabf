//! Docs-specific error types.

use gworkspace_core::{ApiError, AppError};
use gworkspace_drive::DriveError;
use thiserror::Error;

/// Failure to find an insertion point in a fetched document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocateError {
    #[error("Document body is empty")]
    EmptyBody,

    #[error("Start line not found: {0:?}")]
    StartLineNotFound(String),

    #[error("End line not found: {0:?}")]
    EndLineNotFound(String),

    #[error("Start line {start:?} does not come before end line {end:?}")]
    LinesOutOfOrder { start: String, end: String },

    #[error("Line not found: {0:?}")]
    LineNotFound(String),

    #[error("Pattern not found: {0:?}")]
    PatternNotFound(String),

    #[error("Text not found: {0:?}")]
    TextNotFound(String),

    #[error("Table {0} not found")]
    TableNotFound(usize),

    #[error("Cell ({row}, {column}) is outside table {table}")]
    CellOutOfRange {
        table: usize,
        row: usize,
        column: usize,
    },
}

#[derive(Error, Debug)]
pub enum DocsError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Drive(#[from] DriveError),

    #[error(transparent)]
    Locate(#[from] LocateError),
}

impl DocsError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Api(e) => e.user_message(),
            Self::Drive(e) => e.user_message(),
            Self::Locate(LocateError::TableNotFound(_) | LocateError::CellOutOfRange { .. }) => {
                "The requested table cell does not exist."
            }
            Self::Locate(_) => "Could not find that text in the document.",
        }
    }
}

impl From<reqwest::Error> for DocsError {
    fn from(e: reqwest::Error) -> Self {
        Self::Api(ApiError::Network(e))
    }
}

impl From<DocsError> for AppError {
    fn from(e: DocsError) -> Self {
        match e {
            DocsError::Api(api) => AppError::Api(api),
            DocsError::Drive(drive) => drive.into(),
            other => AppError::service("Docs", other.to_string()),
        }
    }
}
