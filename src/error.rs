//! Error types and handling for `routecast`

use thiserror::Error;

/// Main error type for the `routecast` library
#[derive(Error, Debug)]
pub enum RoutecastError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A collaborator (directions, geocoding, forecast) failed or answered garbage
    #[error("Upstream error: {message}")]
    Upstream { message: String },

    /// A coordinate resolved to no place, or a place to no coordinates
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl RoutecastError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new upstream error
    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether a failure on a single waypoint should only drop that waypoint
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Upstream { .. } | Self::NotFound { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            RoutecastError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            RoutecastError::Upstream { message } => {
                format!("Unable to reach external services: {message}")
            }
            RoutecastError::NotFound { message } => message.clone(),
            RoutecastError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            RoutecastError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for RoutecastError {
    fn from(err: reqwest::Error) -> Self {
        RoutecastError::upstream(err.to_string())
    }
}

impl From<reqwest_middleware::Error> for RoutecastError {
    fn from(err: reqwest_middleware::Error) -> Self {
        RoutecastError::upstream(err.to_string())
    }
}
