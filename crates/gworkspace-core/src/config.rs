use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable that overrides the config file location
pub const CONFIG_PATH_ENV: &str = "GWORKSPACE_CONFIG";

pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";
pub const DOCUMENTS_SCOPE: &str = "https://www.googleapis.com/auth/documents";
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

pub const DOCS_API_BASE: &str = "https://docs.googleapis.com/v1";
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

const PERMISSION_ROLES: &[&str] = &[
    "owner",
    "organizer",
    "fileOrganizer",
    "writer",
    "commenter",
    "reader",
];

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a single line summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Credential and token settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Calendar defaults used when creating events
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// API base URLs
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// Parameters for the end-to-end workflow binary
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

/// How to obtain an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Use a service-account key instead of the installed-app OAuth flow
    #[serde(default)]
    pub use_service_account: bool,

    /// OAuth client secrets file, or the service-account key when `use_service_account` is set
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,

    /// Where the installed-app flow persists its token
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,

    /// OAuth scopes to request
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// Loopback port for the OAuth callback
    #[serde(default = "default_redirect_port")]
    pub redirect_port: u16,
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from("auth/credentials.json")
}

fn default_token_file() -> PathBuf {
    PathBuf::from("auth/token.json")
}

fn default_scopes() -> Vec<String> {
    vec![
        DRIVE_SCOPE.to_string(),
        DOCUMENTS_SCOPE.to_string(),
        CALENDAR_SCOPE.to_string(),
    ]
}

fn default_redirect_port() -> u16 {
    8080
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            use_service_account: false,
            credentials_file: default_credentials_file(),
            token_file: default_token_file(),
            scopes: default_scopes(),
            redirect_port: default_redirect_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,

    /// IANA time zone that event times are expressed in
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

fn default_calendar_id() -> String {
    "primary".to_string()
}

fn default_time_zone() -> String {
    "Asia/Tokyo".to_string()
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            calendar_id: default_calendar_id(),
            time_zone: default_time_zone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_docs_url")]
    pub docs: String,
    #[serde(default = "default_drive_url")]
    pub drive: String,
    #[serde(default = "default_calendar_url")]
    pub calendar: String,
}

fn default_docs_url() -> String {
    DOCS_API_BASE.to_string()
}

fn default_drive_url() -> String {
    DRIVE_API_BASE.to_string()
}

fn default_calendar_url() -> String {
    CALENDAR_API_BASE.to_string()
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            docs: default_docs_url(),
            drive: default_drive_url(),
            calendar: default_calendar_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub document_title: String,
    pub initial_text: String,
    pub folder_name: String,
    pub copy_title: String,
    pub event_summary: String,
    pub event_location: String,
    pub event_description: String,
    /// Event length in minutes
    pub event_duration_minutes: u32,
    pub attendee_emails: Vec<String>,
    pub share_email: String,
    pub share_role: String,
    pub renamed_folder_name: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            document_title: "Sample Document".to_string(),
            initial_text: "Hello, World!".to_string(),
            folder_name: "Sample Folder".to_string(),
            copy_title: "Copy of Document".to_string(),
            event_summary: "Meeting".to_string(),
            event_location: "Virtual".to_string(),
            event_description: "Discuss project updates".to_string(),
            event_duration_minutes: 60,
            attendee_emails: vec!["user@gmail.com".to_string()],
            share_email: "user@gmail.com".to_string(),
            share_role: "reader".to_string(),
            renamed_folder_name: "New folder name".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, writing defaults there if it is missing
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Wrote default configuration to {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Unreadable(format!("{}: {}", path.display(), e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged. Returns an error if validation finds critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult), ConfigError> {
        Self::load()?.validated()
    }

    /// Validate an already loaded configuration, logging warnings
    pub fn validated(self) -> Result<(Self, ValidationResult), ConfigError> {
        let validation = self.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((self, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.auth.scopes.is_empty() {
            result.add_error("auth.scopes", "At least one OAuth scope is required");
        }

        if self.auth.redirect_port == 0 {
            result.add_error("auth.redirect_port", "Port cannot be 0");
        }

        if !self.auth.credentials_file.exists() {
            result.add_warning(
                "auth.credentials_file",
                format!(
                    "Credentials file does not exist: {}",
                    self.auth.credentials_file.display()
                ),
            );
        }

        if self.calendar.calendar_id.trim().is_empty() {
            result.add_error("calendar.calendar_id", "Calendar ID cannot be empty");
        }

        if self.calendar.time_zone.parse::<chrono_tz::Tz>().is_err() {
            result.add_error(
                "calendar.time_zone",
                format!("Unknown time zone: {}", self.calendar.time_zone),
            );
        }

        Self::validate_url(&self.endpoints.docs, "endpoints.docs", &mut result);
        Self::validate_url(&self.endpoints.drive, "endpoints.drive", &mut result);
        Self::validate_url(&self.endpoints.calendar, "endpoints.calendar", &mut result);

        if !PERMISSION_ROLES.contains(&self.workflow.share_role.as_str()) {
            result.add_error(
                "workflow.share_role",
                format!("Unknown permission role: {}", self.workflow.share_role),
            );
        }

        for email in &self.workflow.attendee_emails {
            if !email.contains('@') {
                result.add_warning(
                    "workflow.attendee_emails",
                    format!("Does not look like an email address: {}", email),
                );
            }
        }

        if self.workflow.event_duration_minutes == 0 {
            result.add_warning(
                "workflow.event_duration_minutes",
                "Event will start and end at the same time",
            );
        }

        result
    }

    fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ConfigError::Unreadable(format!("{}: {}", parent.display(), e))
                })?;
            }
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)
            .map_err(|e| ConfigError::Unreadable(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }

    /// Path to the configuration file, honoring `GWORKSPACE_CONFIG`
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_dir = dirs::config_dir()
            .ok_or_else(|| {
                ConfigError::NotFound(format!(
                    "no platform config directory; set {}",
                    CONFIG_PATH_ENV
                ))
            })?
            .join("gworkspace-helper");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_default_scopes_cover_all_three_apis() {
        let config = Config::default();
        assert_eq!(config.auth.scopes.len(), 3);
        assert!(config.auth.scopes.iter().any(|s| s.ends_with("/drive")));
        assert!(config.auth.scopes.iter().any(|s| s.ends_with("/documents")));
        assert!(config.auth.scopes.iter().any(|s| s.ends_with("/calendar")));
    }

    #[test]
    fn test_empty_scopes_is_error() {
        let mut config = Config::default();
        config.auth.scopes.clear();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "auth.scopes"));
    }

    #[test]
    fn test_unknown_time_zone() {
        let mut config = Config::default();
        config.calendar.time_zone = "Mars/Olympus_Mons".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "calendar.time_zone"));
    }

    #[test]
    fn test_invalid_endpoint_scheme() {
        let mut config = Config::default();
        config.endpoints.drive = "ftp://example.com/drive".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_unknown_share_role() {
        let mut config = Config::default();
        config.workflow.share_role = "admin".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "workflow.share_role"));
    }

    #[test]
    fn test_missing_credentials_is_warning() {
        let mut config = Config::default();
        config.auth.credentials_file = PathBuf::from("/nonexistent/credentials.json");
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "auth.credentials_file"));
    }

    #[test]
    fn test_load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();

        assert!(path.exists());
        assert_eq!(config.calendar.calendar_id, "primary");
    }

    #[test]
    fn test_load_from_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[auth]
use_service_account = true
credentials_file = "keys/service.json"

[calendar]
time_zone = "Europe/Paris"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert!(config.auth.use_service_account);
        assert_eq!(config.auth.credentials_file, PathBuf::from("keys/service.json"));
        assert_eq!(config.auth.token_file, PathBuf::from("auth/token.json"));
        assert_eq!(config.calendar.time_zone, "Europe/Paris");
        assert_eq!(config.calendar.calendar_id, "primary");
        assert_eq!(config.endpoints.docs, DOCS_API_BASE);
        assert_eq!(config.workflow.share_role, "reader");
    }

    #[test]
    fn test_load_from_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[auth\nscopes = 3").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
        assert_eq!(
            err.user_message(),
            "Configuration file is malformed. Check your settings."
        );
    }

    #[test]
    fn test_validated_rejects_invalid_config() {
        let mut config = Config::default();
        config.calendar.time_zone = "Mars/Olympus_Mons".to_string();
        config.auth.redirect_port = 0;

        let err = config.validated().unwrap_err();
        match &err {
            ConfigError::Invalid(summary) => {
                assert!(summary.contains("calendar.time_zone"));
                assert!(summary.contains("auth.redirect_port"));
            }
            other => panic!("expected Invalid, got {:?}", other),
        }

        let app: crate::AppError = err.into();
        assert_eq!(app.user_message(), "Invalid configuration. Check your settings.");
    }

    #[test]
    fn test_validated_accepts_default_config() {
        let (config, validation) = Config::default().validated().unwrap();
        assert_eq!(config.calendar.calendar_id, "primary");
        assert!(validation.is_valid());
    }

    #[test]
    fn test_load_from_directory_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable(_)));
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
