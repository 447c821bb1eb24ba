use crate::error::{config_error, env_error, SyncResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Calendar used when nothing else is configured
pub const DEFAULT_CALENDAR_NAME: &str = "Gradescope";

/// Default Gradescope host
pub const DEFAULT_GRADESCOPE_URL: &str = "https://www.gradescope.com";

/// Default Google Calendar v3 API root
pub const DEFAULT_CALENDAR_API_URL: &str = "https://www.googleapis.com/calendar/v3";

/// Optional settings file for non-secret values
pub const SETTINGS_FILE: &str = "config/gradesync.toml";

/// Main configuration structure for the sync
#[derive(Debug, Clone)]
pub struct Config {
    /// Gradescope login email
    pub gradescope_email: String,
    /// Gradescope login password
    pub gradescope_password: String,
    /// Name of the calendar that receives the events
    pub calendar_name: String,
    /// IANA time zone written on new events and calendars
    pub timezone: String,
    /// Where the authorized-user token lives
    pub token_path: PathBuf,
    /// Base64 encoded token JSON, takes precedence over `token_path`
    pub google_token_b64: Option<String>,
    /// Length of each event, zero means a marker at the due instant
    pub event_duration_minutes: u32,
    /// Request timeout for both HTTP clients
    pub http_timeout_secs: u64,
    /// Gradescope host
    pub gradescope_base_url: String,
    /// Google Calendar API root
    pub calendar_api_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gradescope_email: String::new(),
            gradescope_password: String::new(),
            calendar_name: DEFAULT_CALENDAR_NAME.to_string(),
            timezone: "UTC".to_string(),
            token_path: PathBuf::from("token.json"),
            google_token_b64: None,
            event_duration_minutes: 0,
            http_timeout_secs: 30,
            gradescope_base_url: DEFAULT_GRADESCOPE_URL.to_string(),
            calendar_api_url: DEFAULT_CALENDAR_API_URL.to_string(),
        }
    }
}

/// Values accepted from the settings file
#[derive(Debug, Default, Deserialize)]
pub struct FileSettings {
    pub calendar_name: Option<String>,
    pub timezone: Option<String>,
    pub token_path: Option<PathBuf>,
    pub event_duration_minutes: Option<u32>,
    pub http_timeout_secs: Option<u64>,
    pub gradescope_base_url: Option<String>,
    pub calendar_api_url: Option<String>,
}

impl Config {
    /// Load configuration from the settings file and the environment.
    ///
    /// Environment variables win over the file. Gradescope credentials are only
    /// required when `require_credentials` is set, cleanup runs without them.
    pub fn load(require_credentials: bool) -> SyncResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let mut config = Config::default();

        if Path::new(SETTINGS_FILE).exists() {
            let content = fs::read_to_string(SETTINGS_FILE)?;
            config.apply_file(toml::from_str(&content)?);
        }

        config.apply_env(|key| env::var(key).ok())?;

        if require_credentials {
            if config.gradescope_email.is_empty() {
                return Err(env_error("GRADESCOPE_EMAIL"));
            }
            if config.gradescope_password.is_empty() {
                return Err(env_error("GRADESCOPE_PASSWORD"));
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Merge values from the settings file
    pub fn apply_file(&mut self, file: FileSettings) {
        if let Some(name) = file.calendar_name {
            self.calendar_name = name;
        }
        if let Some(tz) = file.timezone {
            self.timezone = tz;
        }
        if let Some(path) = file.token_path {
            self.token_path = path;
        }
        if let Some(minutes) = file.event_duration_minutes {
            self.event_duration_minutes = minutes;
        }
        if let Some(secs) = file.http_timeout_secs {
            self.http_timeout_secs = secs;
        }
        if let Some(url) = file.gradescope_base_url {
            self.gradescope_base_url = url;
        }
        if let Some(url) = file.calendar_api_url {
            self.calendar_api_url = url;
        }
    }

    /// Merge values from a variable lookup (the process environment in production)
    pub fn apply_env<F>(&mut self, lookup: F) -> SyncResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(email) = lookup("GRADESCOPE_EMAIL") {
            self.gradescope_email = email;
        }
        if let Some(password) = lookup("GRADESCOPE_PASSWORD") {
            self.gradescope_password = password;
        }
        if let Some(name) = lookup("CALENDAR_NAME") {
            self.calendar_name = name;
        }
        if let Some(tz) = lookup("TIMEZONE") {
            self.timezone = tz;
        }
        if let Some(path) = lookup("GOOGLE_TOKEN_PATH") {
            self.token_path = PathBuf::from(path);
        }
        if let Some(token) = lookup("GOOGLE_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.google_token_b64 = Some(token);
        }
        if let Some(minutes) = lookup("EVENT_DURATION_MINUTES") {
            self.event_duration_minutes = minutes
                .parse()
                .map_err(|_| config_error("Invalid EVENT_DURATION_MINUTES format"))?;
        }
        if let Some(secs) = lookup("HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = secs
                .parse()
                .map_err(|_| config_error("Invalid HTTP_TIMEOUT_SECS format"))?;
        }
        if let Some(url) = lookup("GRADESCOPE_BASE_URL") {
            self.gradescope_base_url = url;
        }
        if let Some(url) = lookup("GOOGLE_CALENDAR_API_URL") {
            self.calendar_api_url = url;
        }
        Ok(())
    }

    /// Check values that can't be checked while parsing
    pub fn validate(&self) -> SyncResult<()> {
        if self.calendar_name.trim().is_empty() {
            return Err(config_error("Calendar name must not be empty"));
        }
        self.tz()?;
        Ok(())
    }

    /// Parsed time zone
    pub fn tz(&self) -> SyncResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| config_error(&format!("Invalid timezone: {}", self.timezone)))
    }

    /// Event length as a chrono duration
    pub fn event_duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.event_duration_minutes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::default();
        config.apply_file(FileSettings {
            calendar_name: Some("From File".to_string()),
            timezone: Some("Europe/Helsinki".to_string()),
            ..Default::default()
        });
        config
            .apply_env(lookup(&[("CALENDAR_NAME", "From Env")]))
            .unwrap();

        assert_eq!(config.calendar_name, "From Env");
        assert_eq!(config.timezone, "Europe/Helsinki");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let mut config = Config::default();
        let result = config.apply_env(lookup(&[("EVENT_DURATION_MINUTES", "ten")]));
        assert!(matches!(result, Err(crate::error::Error::Config(_))));
    }

    #[test]
    fn test_invalid_timezone_rejected() {
        let config = Config {
            timezone: "Mars/Olympus".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_google_token_ignored() {
        let mut config = Config::default();
        config.apply_env(lookup(&[("GOOGLE_TOKEN", "  ")])).unwrap();
        assert!(config.google_token_b64.is_none());
    }

    #[test]
    fn test_settings_file_parses() {
        let file: FileSettings = toml::from_str(
            r#"
            calendar_name = "Coursework"
            event_duration_minutes = 30
            "#,
        )
        .unwrap();
        let mut config = Config::default();
        config.apply_file(file);
        assert_eq!(config.calendar_name, "Coursework");
        assert_eq!(config.event_duration(), chrono::Duration::minutes(30));
    }
}
