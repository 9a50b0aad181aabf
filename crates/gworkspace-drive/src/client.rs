//! Drive v3 API client.

use gworkspace_core::config::DRIVE_API_BASE;
use gworkspace_core::http;
use tracing::instrument;

use crate::error::DriveError;
use crate::types::*;

/// Fields requested when listing permissions for removal.
const PERMISSION_LIST_FIELDS: &str = "nextPageToken,permissions(id,emailAddress)";

const FILE_FIELDS: &str = "id,name,mimeType,webViewLink";

#[derive(Clone)]
pub struct DriveClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl DriveClient {
    pub fn new(access_token: &str) -> Self {
        Self::with_base_url(access_token, DRIVE_API_BASE)
    }

    /// Point the client at a different API root (proxies, mock servers).
    pub fn with_base_url(access_token: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: access_token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("{}/files/{}", self.base_url, urlencoding::encode(file_id))
    }

    /// Create a folder in My Drive.
    #[instrument(skip(self), level = "info")]
    pub async fn create_folder(&self, name: &str) -> Result<DriveFile, DriveError> {
        let url = format!("{}/files", self.base_url);
        let body = DriveFile {
            name: Some(name.to_string()),
            mime_type: Some(FOLDER_MIME_TYPE.to_string()),
            ..DriveFile::default()
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .query(&[("supportsAllDrives", "true")])
            .json(&body)
            .send()
            .await?;

        let folder: DriveFile = http::decode_json(response).await?;
        tracing::info!("Created folder {}", folder.id);
        Ok(folder)
    }

    /// Share a folder with a user.
    #[instrument(skip(self), level = "info")]
    pub async fn add_folder_permission(
        &self,
        folder_id: &str,
        email: &str,
        role: PermissionRole,
    ) -> Result<Permission, DriveError> {
        self.create_permission(folder_id, email, role, &[("supportsAllDrives", "true")])
            .await
    }

    /// Share a file with a user without sending a notification email.
    #[instrument(skip(self), level = "info")]
    pub async fn add_file_permission(
        &self,
        file_id: &str,
        email: &str,
        role: PermissionRole,
    ) -> Result<Permission, DriveError> {
        self.create_permission(
            file_id,
            email,
            role,
            &[("supportsAllDrives", "true"), ("sendNotificationEmail", "false")],
        )
        .await
    }

    async fn create_permission(
        &self,
        file_id: &str,
        email: &str,
        role: PermissionRole,
        query: &[(&str, &str)],
    ) -> Result<Permission, DriveError> {
        let url = format!("{}/permissions", self.file_url(file_id));

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .query(query)
            .json(&Permission::user(email, role))
            .send()
            .await?;

        Ok(http::decode_json(response).await?)
    }

    /// Copy a file into a folder, keeping its name.
    #[instrument(skip(self), level = "info")]
    pub async fn copy_file_to_folder(
        &self,
        file_id: &str,
        folder_id: &str,
    ) -> Result<DriveFile, DriveError> {
        let body = DriveFile {
            parents: vec![folder_id.to_string()],
            ..DriveFile::default()
        };
        self.copy(file_id, &body).await
    }

    /// Copy a file under a new name.
    #[instrument(skip(self), level = "info")]
    pub async fn copy_file(&self, file_id: &str, new_name: &str) -> Result<DriveFile, DriveError> {
        let body = DriveFile {
            name: Some(new_name.to_string()),
            ..DriveFile::default()
        };
        self.copy(file_id, &body).await
    }

    async fn copy(&self, file_id: &str, body: &DriveFile) -> Result<DriveFile, DriveError> {
        let url = format!("{}/copy", self.file_url(file_id));

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .query(&[("supportsAllDrives", "true")])
            .json(body)
            .send()
            .await?;

        let copy: DriveFile = http::decode_json(response).await?;
        tracing::info!("Copied {} to {}", file_id, copy.id);
        Ok(copy)
    }

    /// List every permission on a file, following pagination.
    #[instrument(skip(self), level = "info")]
    pub async fn list_permissions(&self, file_id: &str) -> Result<Vec<Permission>, DriveError> {
        let url = format!("{}/permissions", self.file_url(file_id));
        let mut permissions = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .header("Authorization", self.auth_header())
                .query(&[("supportsAllDrives", "true"), ("fields", PERMISSION_LIST_FIELDS)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: PermissionList = http::decode_json(request.send().await?).await?;
            permissions.extend(page.permissions);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(permissions)
    }

    /// Revoke the first permission granted to `email`.
    #[instrument(skip(self), level = "info")]
    pub async fn remove_folder_permission(
        &self,
        folder_id: &str,
        email: &str,
    ) -> Result<(), DriveError> {
        let permissions = self.list_permissions(folder_id).await?;
        let permission = permissions
            .iter()
            .find(|p| p.matches_email(email))
            .ok_or_else(|| DriveError::PermissionNotFound {
                file_id: folder_id.to_string(),
                email: email.to_string(),
            })?;

        let url = format!(
            "{}/permissions/{}",
            self.file_url(folder_id),
            urlencoding::encode(&permission.id)
        );

        let response = self
            .client
            .delete(&url)
            .header("Authorization", self.auth_header())
            .query(&[("supportsAllDrives", "true")])
            .send()
            .await?;
        http::ensure_success(response).await?;

        tracing::info!("Removed permission {} from {}", permission.id, folder_id);
        Ok(())
    }

    #[instrument(skip(self), level = "info")]
    pub async fn rename_folder(&self, folder_id: &str, new_name: &str) -> Result<DriveFile, DriveError> {
        self.rename(folder_id, new_name).await
    }

    #[instrument(skip(self), level = "info")]
    pub async fn rename_file(&self, file_id: &str, new_name: &str) -> Result<DriveFile, DriveError> {
        self.rename(file_id, new_name).await
    }

    async fn rename(&self, file_id: &str, new_name: &str) -> Result<DriveFile, DriveError> {
        let body = DriveFile {
            name: Some(new_name.to_string()),
            ..DriveFile::default()
        };

        let response = self
            .client
            .patch(self.file_url(file_id))
            .header("Authorization", self.auth_header())
            .query(&[("supportsAllDrives", "true")])
            .json(&body)
            .send()
            .await?;

        Ok(http::decode_json(response).await?)
    }

    /// Permanently delete a file or folder (bypasses the trash).
    #[instrument(skip(self), level = "info")]
    pub async fn delete_file_or_folder(&self, file_id: &str) -> Result<(), DriveError> {
        let response = self
            .client
            .delete(self.file_url(file_id))
            .header("Authorization", self.auth_header())
            .query(&[("supportsAllDrives", "true")])
            .send()
            .await?;
        http::ensure_success(response).await?;

        tracing::info!("Deleted {}", file_id);
        Ok(())
    }

    /// Export a Google Workspace file to the given MIME type.
    #[instrument(skip(self), level = "info")]
    pub async fn export_file(&self, file_id: &str, mime_type: &str) -> Result<String, DriveError> {
        let url = format!("{}/export", self.file_url(file_id));

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .query(&[("mimeType", mime_type)])
            .send()
            .await?;

        Ok(http::read_text(response).await?)
    }

    pub async fn export_as_text(&self, file_id: &str) -> Result<String, DriveError> {
        self.export_file(file_id, "text/plain").await
    }

    /// Fetch the metadata needed to link a file elsewhere.
    #[instrument(skip(self), level = "info")]
    pub async fn get_file(&self, file_id: &str) -> Result<DriveFile, DriveError> {
        let response = self
            .client
            .get(self.file_url(file_id))
            .header("Authorization", self.auth_header())
            .query(&[("supportsAllDrives", "true"), ("fields", FILE_FIELDS)])
            .send()
            .await?;

        Ok(http::decode_json(response).await?)
    }
}
