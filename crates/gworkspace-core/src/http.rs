//! Response handling shared by the Docs, Drive and Calendar clients.

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ApiError;

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Google's JSON error envelope: `{"error": {"code": 404, "message": "...", "status": "..."}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Deserialize a successful JSON response, or classify the failure.
pub async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = ensure_success(response).await?;
    response
        .json()
        .await
        .map_err(|e| ApiError::Decode(format!("JSON parse error: {}", e)))
}

/// Read a successful response as text (used by Drive exports).
pub async fn read_text(response: Response) -> Result<String, ApiError> {
    let response = ensure_success(response).await?;
    Ok(response.text().await?)
}

/// Pass through 2xx responses; turn anything else into an [`ApiError`].
pub async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

    let text = response.text().await.unwrap_or_default();
    let message = error_message(&text);

    Err(match status {
        StatusCode::UNAUTHORIZED => ApiError::TokenExpired,
        StatusCode::FORBIDDEN => ApiError::Forbidden(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::CONFLICT => ApiError::Conflict,
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited(retry_after),
        _ => ApiError::Status {
            status: status.as_u16(),
            message,
        },
    })
}

/// Prefer the envelope's message; fall back to the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match (envelope.error.message, envelope.error.status) {
            (Some(message), Some(status)) => format!("{} ({})", message, status),
            (Some(message), None) => message,
            (None, Some(status)) => status,
            (None, None) => body.to_string(),
        },
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn get(server: &MockServer, route: &str) -> Response {
        reqwest::Client::new()
            .get(format!("{}{}", server.uri(), route))
            .send()
            .await
            .unwrap()
    }

    #[test]
    fn test_error_message_from_envelope() {
        let body = r#"{"error": {"code": 404, "message": "File not found: abc.", "status": "NOT_FOUND"}}"#;
        assert_eq!(error_message(body), "File not found: abc. (NOT_FOUND)");
    }

    #[test]
    fn test_error_message_raw_body() {
        assert_eq!(error_message("upstream exploded"), "upstream exploded");
    }

    #[tokio::test]
    async fn test_decode_json_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/thing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "abc"})))
            .mount(&server)
            .await;

        let value: serde_json::Value = decode_json(get(&server, "/thing").await).await.unwrap();
        assert_eq!(value["id"], "abc");
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_token_expired() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result: Result<serde_json::Value, _> = decode_json(get(&server, "/x").await).await;
        assert!(matches!(result, Err(ApiError::TokenExpired)));
    }

    #[tokio::test]
    async fn test_not_found_carries_google_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}
            })))
            .mount(&server)
            .await;

        let result = ensure_success(get(&server, "/documents/missing").await).await;
        match result {
            Err(ApiError::NotFound(msg)) => assert!(msg.contains("Requested entity was not found")),
            other => panic!("unexpected result: {:?}", other.map(|r| r.status())),
        }
    }

    #[tokio::test]
    async fn test_rate_limited_reads_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).append_header("Retry-After", "30"))
            .mount(&server)
            .await;

        let result = ensure_success(get(&server, "/x").await).await;
        assert!(matches!(result, Err(ApiError::RateLimited(30))));
    }

    #[tokio::test]
    async fn test_server_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("try later"))
            .mount(&server)
            .await;

        let result = read_text(get(&server, "/x").await).await;
        match result {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "try later");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
