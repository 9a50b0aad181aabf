//! Google Drive helpers: folders, copies, exports and sharing.

pub mod client;
pub mod error;
pub mod types;

pub use client::DriveClient;
pub use error::DriveError;
pub use types::{DriveFile, Permission, PermissionList, PermissionRole, FOLDER_MIME_TYPE};
