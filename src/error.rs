use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(
        code(gradesync::environment),
        help("Set the variable in the environment or in a .env file")
    )]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(gradesync::config))]
    Config(String),

    #[error("Authentication failed: {0}")]
    #[diagnostic(
        code(gradesync::auth),
        help("Check the Gradescope credentials and the Google token, then rerun")
    )]
    Auth(String),

    #[error("Gradescope error: {0}")]
    #[diagnostic(code(gradesync::gradescope))]
    Gradescope(String),

    #[error("Google Calendar API error: {0}")]
    #[diagnostic(code(gradesync::google_calendar))]
    GoogleCalendar(String),

    #[error("HTTP error: {0}")]
    #[diagnostic(code(gradesync::http))]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    #[diagnostic(code(gradesync::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(gradesync::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(gradesync::other))]
    Other(String),
}

impl Error {
    /// Whether the error must abort the whole run
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth(_))
    }
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type SyncResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create authentication errors
pub fn auth_error(message: &str) -> Error {
    Error::Auth(message.to_string())
}

/// Helper to create Gradescope errors
pub fn gradescope_error(message: &str) -> Error {
    Error::Gradescope(message.to_string())
}

/// Helper to create Google Calendar errors
pub fn google_calendar_error(message: &str) -> Error {
    Error::GoogleCalendar(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
