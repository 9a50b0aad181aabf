//! Docs v1 API client.
//!
//! Every edit re-fetches the document, resolves its insertion point locally
//! and sends a single batch update. File-level operations (copy, export,
//! rename, sharing) go through Drive.

use gworkspace_core::config::DOCS_API_BASE;
use gworkspace_core::http;
use gworkspace_drive::{DriveClient, DriveFile, Permission, PermissionRole};
use tracing::instrument;

use crate::error::DocsError;
use crate::locate;
use crate::types::*;

/// Browser URL of a document.
pub fn document_url(file_id: &str) -> String {
    format!("https://docs.google.com/document/d/{}/edit", file_id)
}

#[derive(Clone)]
pub struct DocsClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
    drive: DriveClient,
}

impl DocsClient {
    pub fn new(access_token: &str) -> Self {
        Self::with_base_url(access_token, DOCS_API_BASE, DriveClient::new(access_token))
    }

    pub fn with_base_url(access_token: &str, base_url: &str, drive: DriveClient) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: access_token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            drive,
        }
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    fn document_endpoint(&self, document_id: &str) -> String {
        format!("{}/documents/{}", self.base_url, urlencoding::encode(document_id))
    }

    #[instrument(skip(self), level = "info")]
    pub async fn create_document(&self, title: &str) -> Result<Document, DocsError> {
        let url = format!("{}/documents", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&serde_json::json!({ "title": title }))
            .send()
            .await?;

        let document: Document = http::decode_json(response).await?;
        tracing::info!("Created document {}", document.document_id);
        Ok(document)
    }

    #[instrument(skip(self), level = "info")]
    pub async fn get_document(&self, document_id: &str) -> Result<Document, DocsError> {
        let response = self
            .client
            .get(self.document_endpoint(document_id))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        Ok(http::decode_json(response).await?)
    }

    /// Apply `requests` atomically.
    #[instrument(skip(self, requests), fields(count = requests.len()), level = "info")]
    pub async fn batch_update(
        &self,
        document_id: &str,
        requests: Vec<Request>,
    ) -> Result<BatchUpdateResponse, DocsError> {
        let url = format!("{}:batchUpdate", self.document_endpoint(document_id));

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&BatchUpdateRequest { requests })
            .send()
            .await?;

        Ok(http::decode_json(response).await?)
    }

    /// Append text at the end of the body.
    #[instrument(skip(self, text), level = "info")]
    pub async fn add_text(&self, document_id: &str, text: &str) -> Result<(), DocsError> {
        let doc = self.get_document(document_id).await?;
        let index = locate::append_index(&doc)?;
        self.batch_update(document_id, vec![Request::insert_text(text, index)])
            .await?;
        Ok(())
    }

    /// Replace every occurrence of `old` (case-sensitive); returns how many changed.
    #[instrument(skip(self), level = "info")]
    pub async fn replace_text(
        &self,
        document_id: &str,
        old: &str,
        new: &str,
    ) -> Result<i64, DocsError> {
        let response = self
            .batch_update(document_id, vec![Request::replace_all_text(old, new)])
            .await?;
        Ok(occurrences_changed(&response))
    }

    /// One batch with a replacement per pair, applied in the given order.
    #[instrument(skip(self, replacements), level = "info")]
    pub async fn replace_multiple_texts<I, K, V>(
        &self,
        document_id: &str,
        replacements: I,
    ) -> Result<i64, DocsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let requests: Vec<Request> = replacements
            .into_iter()
            .map(|(old, new)| Request::replace_all_text(old, new))
            .collect();

        if requests.is_empty() {
            tracing::debug!("No replacements for {}", document_id);
            return Ok(0);
        }

        let response = self.batch_update(document_id, requests).await?;
        Ok(occurrences_changed(&response))
    }

    pub async fn make_copy(&self, file_id: &str, new_title: &str) -> Result<DriveFile, DocsError> {
        Ok(self.drive.copy_file(file_id, new_title).await?)
    }

    pub async fn export_as_text(&self, file_id: &str) -> Result<String, DocsError> {
        Ok(self.drive.export_as_text(file_id).await?)
    }

    pub async fn rename_document(
        &self,
        file_id: &str,
        new_title: &str,
    ) -> Result<DriveFile, DocsError> {
        Ok(self.drive.rename_file(file_id, new_title).await?)
    }

    pub async fn add_file_permission(
        &self,
        file_id: &str,
        email: &str,
        role: PermissionRole,
    ) -> Result<Permission, DocsError> {
        Ok(self.drive.add_file_permission(file_id, email, role).await?)
    }

    /// Insert `text` as a new line right after `start_line`, which must come
    /// before `end_line`.
    #[instrument(skip(self, text), level = "info")]
    pub async fn add_text_between_lines(
        &self,
        document_id: &str,
        start_line: &str,
        end_line: &str,
        text: &str,
    ) -> Result<(), DocsError> {
        let doc = self.get_document(document_id).await?;
        let index = locate::between_lines_index(&doc, start_line, end_line)?;
        self.insert_line(document_id, text, index).await
    }

    /// Insert `text` as a new line after the first line equal to `line`.
    #[instrument(skip(self, text), level = "info")]
    pub async fn add_text_after_line(
        &self,
        document_id: &str,
        line: &str,
        text: &str,
    ) -> Result<(), DocsError> {
        let doc = self.get_document(document_id).await?;
        let index = locate::after_line_index(&doc, line)?;
        self.insert_line(document_id, text, index).await
    }

    async fn insert_line(&self, document_id: &str, text: &str, index: i64) -> Result<(), DocsError> {
        let line = format!("{}\n", text);
        self.batch_update(document_id, vec![Request::insert_text(line, index)])
            .await?;
        Ok(())
    }

    /// Insert `text` immediately after the first occurrence of `pattern`.
    #[instrument(skip(self, text), level = "info")]
    pub async fn add_text_after_pattern_in_line(
        &self,
        document_id: &str,
        pattern: &str,
        text: &str,
    ) -> Result<(), DocsError> {
        let doc = self.get_document(document_id).await?;
        let index = locate::after_pattern_index(&doc, pattern)?;
        self.batch_update(document_id, vec![Request::insert_text(text, index)])
            .await?;
        Ok(())
    }

    /// Append an empty `rows` x `columns` table.
    #[instrument(skip(self), level = "info")]
    pub async fn add_table(
        &self,
        document_id: &str,
        rows: i64,
        columns: i64,
    ) -> Result<(), DocsError> {
        let doc = self.get_document(document_id).await?;
        let index = locate::append_index(&doc)?;
        self.batch_update(document_id, vec![Request::insert_table(rows, columns, index)])
            .await?;
        Ok(())
    }

    #[instrument(skip(self, text), level = "info")]
    pub async fn add_text_to_table_cell(
        &self,
        document_id: &str,
        table: usize,
        row: usize,
        column: usize,
        text: &str,
    ) -> Result<(), DocsError> {
        let doc = self.get_document(document_id).await?;
        let index = locate::table_cell_index(&doc, table, row, column)?;
        self.batch_update(document_id, vec![Request::insert_text(text, index)])
            .await?;
        Ok(())
    }

    /// Link the first occurrence of `search_text` to `url`.
    #[instrument(skip(self), level = "info")]
    pub async fn add_link_to_text(
        &self,
        document_id: &str,
        search_text: &str,
        url: &str,
    ) -> Result<(), DocsError> {
        let doc = self.get_document(document_id).await?;
        let (start, end) = locate::text_range(&doc, search_text)?;
        self.batch_update(document_id, vec![Request::link_range(start, end, url)])
            .await?;
        Ok(())
    }

    #[instrument(skip(self), level = "info")]
    pub async fn set_color_to_table_cell(
        &self,
        document_id: &str,
        table: usize,
        row: usize,
        column: usize,
        color: OptionalColor,
    ) -> Result<(), DocsError> {
        let doc = self.get_document(document_id).await?;
        // Resolving the cell rejects out-of-range coordinates before sending.
        locate::table_cell_index(&doc, table, row, column)?;
        let (table_start, _) = locate::nth_table(&doc, table)?;

        let request =
            Request::cell_background(table_start, row as i64, column as i64, color);
        self.batch_update(document_id, vec![request]).await?;
        Ok(())
    }

    /// Insert `text` at `index` and make it a link to `url`, in one batch.
    #[instrument(skip(self), level = "info")]
    pub async fn insert_text_with_link(
        &self,
        document_id: &str,
        text: &str,
        url: &str,
        index: i64,
    ) -> Result<(), DocsError> {
        let end = index + locate::utf16_len(text);
        let requests = vec![
            Request::insert_text(text, index),
            Request::link_range(index, end, url),
        ];
        self.batch_update(document_id, requests).await?;
        Ok(())
    }

    #[instrument(skip(self), level = "info")]
    pub async fn get_document_end_index(&self, document_id: &str) -> Result<i64, DocsError> {
        let doc = self.get_document(document_id).await?;
        Ok(locate::body_end_index(&doc)?)
    }
}

fn occurrences_changed(response: &BatchUpdateResponse) -> i64 {
    response
        .replies
        .iter()
        .filter_map(|reply| reply.replace_all_text.as_ref())
        .map(|reply| reply.occurrences_changed)
        .sum()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> DocsClient {
        let drive = DriveClient::with_base_url("test_token", &server.uri());
        DocsClient::with_base_url("test_token", &server.uri(), drive)
    }

    #[test]
    fn test_document_url() {
        assert_eq!(document_url("abc"), "https://docs.google.com/document/d/abc/edit");
    }

    #[tokio::test]
    async fn test_create_document() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/documents"))
            .and(body_json(serde_json::json!({"title": "Sample Document"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "documentId": "doc1",
                "title": "Sample Document",
                "body": {"content": [{"endIndex": 1, "sectionBreak": {}}]}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let doc = client(&mock_server).create_document("Sample Document").await.unwrap();
        assert_eq!(doc.document_id, "doc1");
        assert_eq!(doc.title, "Sample Document");
    }

    #[tokio::test]
    async fn test_empty_replacements_send_nothing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let changed = client(&mock_server)
            .replace_multiple_texts("doc1", Vec::<(String, String)>::new())
            .await
            .unwrap();
        assert_eq!(changed, 0);
    }

    #[test]
    fn test_occurrences_are_summed() {
        let response: BatchUpdateResponse = serde_json::from_value(serde_json::json!({
            "documentId": "doc1",
            "replies": [
                {"replaceAllText": {"occurrencesChanged": 2}},
                {"replaceAllText": {}},
                {}
            ]
        }))
        .unwrap();
        assert_eq!(occurrences_changed(&response), 2);
    }
}
