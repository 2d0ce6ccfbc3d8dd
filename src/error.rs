//! Error types and handling for the `NewsMap` application

use thiserror::Error;

/// Main error type for the `NewsMap` application
#[derive(Error, Debug)]
pub enum NewsMapError {
    /// Missing or blank user input; raised before any external call is made
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// News retrieval failed; the previously published map and list are kept
    #[error("Search failed: {message}")]
    Search { message: String },

    /// Route provider failed; the previously drawn route is kept
    #[error("Route planning failed: {message}")]
    Route { message: String },

    /// The operation was superseded by a newer one and its result was discarded
    #[error("Superseded: {message}")]
    Stale { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// API communication errors
    #[error("API error: {message}")]
    Api { message: String },
}

impl NewsMapError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn search<S: Into<String>>(message: S) -> Self {
        Self::Search {
            message: message.into(),
        }
    }

    pub fn route<S: Into<String>>(message: S) -> Self {
        Self::Route {
            message: message.into(),
        }
    }

    pub fn stale<S: Into<String>>(message: S) -> Self {
        Self::Stale {
            message: message.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Whether this error is caused by the user rather than a failing system
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(self, NewsMapError::Validation { .. })
    }

    /// Get a user-friendly error message, suitable for a blocking alert
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            NewsMapError::Validation { message } => message.clone(),
            NewsMapError::Search { .. } => {
                "Could not load news for this region. Please try again.".to_string()
            }
            NewsMapError::Route { .. } => {
                "Could not find a route between the selected places.".to_string()
            }
            NewsMapError::Stale { .. } => {
                "A newer request replaced this one.".to_string()
            }
            NewsMapError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            NewsMapError::Api { .. } => {
                "Unable to connect to external services. Please check your internet connection."
                    .to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = NewsMapError::validation("region is required");
        assert!(matches!(err, NewsMapError::Validation { .. }));
        assert!(err.is_user_error());

        let err = NewsMapError::search("backend returned 500");
        assert!(matches!(err, NewsMapError::Search { .. }));
        assert!(!err.is_user_error());

        let err = NewsMapError::route("no path");
        assert!(matches!(err, NewsMapError::Route { .. }));
    }

    #[test]
    fn test_user_messages() {
        let err = NewsMapError::validation("Please enter a region");
        assert_eq!(err.user_message(), "Please enter a region");

        let err = NewsMapError::search("timeout");
        assert!(err.user_message().contains("Could not load news"));
        assert!(!err.user_message().contains("timeout"));

        let err = NewsMapError::route("timeout");
        assert!(err.user_message().contains("route"));
    }

    #[test]
    fn test_config_error_message() {
        let err = NewsMapError::config("Marker palette needs at least one icon");
        assert!(!err.is_user_error());
        assert!(err.user_message().contains("config file"));
    }
}
