//! Drive API types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DriveError;

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Drive file resource (only the fields this crate reads or writes).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

impl DriveFile {
    pub fn is_folder(&self) -> bool {
        self.mime_type.as_deref() == Some(FOLDER_MIME_TYPE)
    }
}

/// Sharing role of a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionRole {
    Owner,
    Organizer,
    FileOrganizer,
    Writer,
    Commenter,
    Reader,
}

impl PermissionRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Organizer => "organizer",
            Self::FileOrganizer => "fileOrganizer",
            Self::Writer => "writer",
            Self::Commenter => "commenter",
            Self::Reader => "reader",
        }
    }
}

impl fmt::Display for PermissionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionRole {
    type Err = DriveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "organizer" => Ok(Self::Organizer),
            "fileOrganizer" => Ok(Self::FileOrganizer),
            "writer" => Ok(Self::Writer),
            "commenter" => Ok(Self::Commenter),
            "reader" => Ok(Self::Reader),
            other => Err(DriveError::UnknownRole(other.to_string())),
        }
    }
}

/// Permission resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<PermissionRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
}

impl Permission {
    /// A permission granting `role` to a single user.
    pub fn user(email: &str, role: PermissionRole) -> Self {
        Self {
            id: String::new(),
            kind: Some("user".to_string()),
            role: Some(role),
            email_address: Some(email.to_string()),
        }
    }

    pub fn matches_email(&self, email: &str) -> bool {
        self.email_address
            .as_deref()
            .is_some_and(|address| address.eq_ignore_ascii_case(email))
    }
}

/// API response for permission list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionList {
    #[serde(default)]
    pub permissions: Vec<Permission>,
    pub next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_user_permission_body() {
        let body = serde_json::to_value(Permission::user("a@example.com", PermissionRole::Writer))
            .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"type": "user", "role": "writer", "emailAddress": "a@example.com"})
        );
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("fileOrganizer".parse::<PermissionRole>().unwrap(), PermissionRole::FileOrganizer);
        assert_eq!(PermissionRole::Reader.to_string(), "reader");
        assert!(matches!(
            "admin".parse::<PermissionRole>(),
            Err(DriveError::UnknownRole(_))
        ));
    }

    #[test]
    fn test_email_match_ignores_case() {
        let permission: Permission = serde_json::from_value(serde_json::json!({
            "id": "perm1",
            "emailAddress": "User@Example.com"
        }))
        .unwrap();
        assert!(permission.matches_email("user@example.com"));
        assert!(!permission.matches_email("other@example.com"));
    }

    #[test]
    fn test_folder_detection() {
        let file: DriveFile = serde_json::from_value(serde_json::json!({
            "id": "f1",
            "name": "Reports",
            "mimeType": "application/vnd.google-apps.folder"
        }))
        .unwrap();
        assert!(file.is_folder());
        assert!(file.web_view_link.is_none());
    }
}
