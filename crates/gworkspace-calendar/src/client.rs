//! Google Calendar API client.

use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use gworkspace_core::config::CALENDAR_API_BASE;
use gworkspace_core::{http, CalendarConfig};
use gworkspace_drive::DriveClient;
use serde_json::Value;
use tracing::instrument;

use crate::error::CalendarError;
use crate::types::*;

#[derive(Clone)]
pub struct CalendarClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
    calendar_id: String,
    time_zone: Tz,
    drive: DriveClient,
}

impl CalendarClient {
    pub fn new(access_token: &str, config: &CalendarConfig) -> Result<Self, CalendarError> {
        Self::with_base_url(
            access_token,
            CALENDAR_API_BASE,
            config,
            DriveClient::new(access_token),
        )
    }

    pub fn with_base_url(
        access_token: &str,
        base_url: &str,
        config: &CalendarConfig,
        drive: DriveClient,
    ) -> Result<Self, CalendarError> {
        let time_zone: Tz = config
            .time_zone
            .parse()
            .map_err(|_| CalendarError::InvalidTimeZone(config.time_zone.clone()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            access_token: access_token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            calendar_id: config.calendar_id.clone(),
            time_zone,
            drive,
        })
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(&self.calendar_id)
        )
    }

    fn event_url(&self, event_id: &str) -> String {
        format!("{}/{}", self.events_url(), urlencoding::encode(event_id))
    }

    /// Wall-clock time in the calendar's zone, e.g. `2024-02-01T19:00:00+09:00`.
    fn event_date_time(&self, at: DateTime<Utc>) -> EventDateTime {
        EventDateTime {
            date_time: at
                .with_timezone(&self.time_zone)
                .fixed_offset()
                .to_rfc3339_opts(SecondsFormat::Secs, false),
            time_zone: self.time_zone.name().to_string(),
        }
    }

    /// Create an event with a Google Meet conference attached.
    #[instrument(skip(self), level = "info")]
    pub async fn create_event(
        &self,
        summary: &str,
        location: &str,
        description: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Event, CalendarError> {
        if end < start {
            return Err(CalendarError::InvalidEventData(format!(
                "event ends ({}) before it starts ({})",
                end, start
            )));
        }

        let body = NewEvent {
            summary: summary.to_string(),
            location: location.to_string(),
            description: description.to_string(),
            start: self.event_date_time(start),
            end: self.event_date_time(end),
            conference_data: ConferenceData::meet(uuid::Uuid::new_v4().to_string()),
        };

        let response = self
            .client
            .post(self.events_url())
            .header("Authorization", self.auth_header())
            .query(&[("conferenceDataVersion", "1")])
            .json(&body)
            .send()
            .await?;

        let api_event: ApiEvent = http::decode_json(response).await?;
        tracing::info!("Created event {}", api_event.id);
        Ok(Event::from_api(api_event, &self.calendar_id))
    }

    /// Get a single event.
    #[instrument(skip(self), level = "info")]
    pub async fn get_event(&self, event_id: &str) -> Result<Event, CalendarError> {
        let api_event: ApiEvent = serde_json::from_value(self.get_event_resource(event_id).await?)
            .map_err(|e| CalendarError::InvalidEventData(e.to_string()))?;
        Ok(Event::from_api(api_event, &self.calendar_id))
    }

    /// The raw event resource, so updates can write back fields this crate doesn't model.
    async fn get_event_resource(&self, event_id: &str) -> Result<Value, CalendarError> {
        let response = self
            .client
            .get(self.event_url(event_id))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        Ok(http::decode_json(response).await?)
    }

    async fn put_event_resource(
        &self,
        event_id: &str,
        resource: &Value,
        query: &[(&str, &str)],
    ) -> Result<Event, CalendarError> {
        let response = self
            .client
            .put(self.event_url(event_id))
            .header("Authorization", self.auth_header())
            .query(query)
            .json(resource)
            .send()
            .await?;

        let api_event: ApiEvent = http::decode_json(response).await?;
        Ok(Event::from_api(api_event, &self.calendar_id))
    }

    /// Invite `emails` to an existing event, keeping current attendees.
    #[instrument(skip(self), level = "info")]
    pub async fn add_attendees_to_event(
        &self,
        event_id: &str,
        emails: &[String],
    ) -> Result<Event, CalendarError> {
        let mut resource = self.get_event_resource(event_id).await?;
        for email in emails {
            append_to(&mut resource, "attendees", serde_json::json!({ "email": email }))?;
        }

        self.put_event_resource(event_id, &resource, &[]).await
    }

    /// Attach a Drive file to an event using the file's web link.
    #[instrument(skip(self), level = "info")]
    pub async fn attach_file_to_event(
        &self,
        event_id: &str,
        file_id: &str,
    ) -> Result<Event, CalendarError> {
        let file = self.drive.get_file(file_id).await?;
        let file_url = file.web_view_link.ok_or_else(|| {
            CalendarError::InvalidEventData(format!("file {} has no web link", file_id))
        })?;

        let attachment = Attachment {
            file_id: Some(file_id.to_string()),
            file_url,
            title: file.name,
            mime_type: file.mime_type,
        };
        let attachment = serde_json::to_value(&attachment)
            .map_err(|e| CalendarError::InvalidEventData(e.to_string()))?;

        let mut resource = self.get_event_resource(event_id).await?;
        append_to(&mut resource, "attachments", attachment)?;

        self.put_event_resource(event_id, &resource, &[("supportsAttachments", "true")])
            .await
    }

    /// Delete an event.
    #[instrument(skip(self), level = "info")]
    pub async fn delete_event(&self, event_id: &str) -> Result<(), CalendarError> {
        let response = self
            .client
            .delete(self.event_url(event_id))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        // Delete returns 204 No Content on success
        http::ensure_success(response).await?;
        Ok(())
    }
}

/// Push `item` onto the array at `key`, creating the array if missing.
fn append_to(resource: &mut Value, key: &str, item: Value) -> Result<(), CalendarError> {
    let object = resource
        .as_object_mut()
        .ok_or_else(|| CalendarError::InvalidEventData("event is not a JSON object".into()))?;

    match object
        .entry(key)
        .or_insert_with(|| Value::Array(Vec::new()))
    {
        Value::Array(items) => {
            items.push(item);
            Ok(())
        }
        _ => Err(CalendarError::InvalidEventData(format!("{} is not a list", key))),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use gworkspace_core::ApiError;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config() -> CalendarConfig {
        CalendarConfig {
            calendar_id: "primary".to_string(),
            time_zone: "Asia/Tokyo".to_string(),
        }
    }

    fn client(server: &MockServer) -> CalendarClient {
        let drive = DriveClient::with_base_url("test_token", &server.uri());
        CalendarClient::with_base_url("test_token", &server.uri(), &config(), drive).unwrap()
    }

    #[test]
    fn test_unknown_time_zone() {
        let config = CalendarConfig {
            time_zone: "Mars/Olympus".to_string(),
            ..config()
        };
        let result = CalendarClient::new("token", &config);
        assert!(matches!(result, Err(CalendarError::InvalidTimeZone(_))));
    }

    #[test]
    fn test_times_use_calendar_zone() {
        let client = CalendarClient::new("token", &config()).unwrap();
        let at = DateTime::parse_from_rfc3339("2024-02-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let formatted = client.event_date_time(at);
        assert_eq!(formatted.date_time, "2024-02-01T19:00:00+09:00");
        assert_eq!(formatted.time_zone, "Asia/Tokyo");
    }

    #[test]
    fn test_append_creates_missing_list() {
        let mut resource = serde_json::json!({"id": "event1"});
        append_to(&mut resource, "attendees", serde_json::json!({"email": "a@example.com"}))
            .unwrap();
        append_to(&mut resource, "attendees", serde_json::json!({"email": "b@example.com"}))
            .unwrap();
        assert_eq!(resource["attendees"].as_array().unwrap().len(), 2);

        let mut resource = serde_json::json!({"attendees": "oops"});
        assert!(append_to(&mut resource, "attendees", Value::Null).is_err());
    }

    #[tokio::test]
    async fn test_end_before_start_is_rejected() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let start = Utc::now();
        let end = start - chrono::Duration::minutes(30);
        let result = client(&mock_server)
            .create_event("Meeting", "Virtual", "", start, end)
            .await;
        assert!(matches!(result, Err(CalendarError::InvalidEventData(_))));
    }

    #[tokio::test]
    async fn test_get_event() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/calendars/primary/events/event123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "event123",
                "summary": "Team Sync",
                "start": {"dateTime": "2024-02-01T14:00:00Z"},
                "end": {"dateTime": "2024-02-01T15:00:00Z"},
                "status": "confirmed"
            })))
            .mount(&mock_server)
            .await;

        let event = client(&mock_server).get_event("event123").await.unwrap();
        assert_eq!(event.id, "event123");
        assert_eq!(event.summary, "Team Sync");
        assert_eq!(event.calendar_id, "primary");
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/calendars/primary/events/event123"))
            .respond_with(ResponseTemplate::new(429).append_header("Retry-After", "30"))
            .mount(&mock_server)
            .await;

        let result = client(&mock_server).get_event("event123").await;
        assert!(matches!(
            result,
            Err(CalendarError::Api(ApiError::RateLimited(30)))
        ));
    }

    #[tokio::test]
    async fn test_delete_event() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/calendars/primary/events/event123"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        client(&mock_server).delete_event("event123").await.unwrap();
    }
}
