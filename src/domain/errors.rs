//! Domain error types
//!
//! This module defines the error hierarchy for odk-relay.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main odk-relay error type
///
/// This is the primary error type used throughout the application.
/// It wraps the remote-server and form-transformer errors and provides
/// the HTTP-style classification a request boundary should surface.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// ODK Central errors
    #[error("ODK Central error: {0}")]
    Central(#[from] CentralError),

    /// XForm conversion and rewriting errors
    #[error("Form error: {0}")]
    Form(#[from] FormError),

    /// Form catalog database errors
    #[error("Database error: {0}")]
    Database(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Submission conversion errors
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl RelayError {
    /// HTTP-style status class for this error
    ///
    /// Failures the caller can correct with different input map to 400,
    /// everything that prevented the operation on the server side maps to 500.
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::Form(_) | RelayError::Validation(_) => 400,
            RelayError::Central(CentralError::NotFound(_)) => 404,
            _ => 500,
        }
    }
}

/// ODK Central errors
///
/// Errors that occur when talking to the remote survey server.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum CentralError {
    /// The server is unreachable or the client could not be built
    #[error("Connection failed to odk central: {0}")]
    ConnectionFailed(String),

    /// The server rejected the credentials
    #[error("Could not authenticate to odk central: {0}")]
    AuthenticationFailed(String),

    /// The server answered with a body we could not decode
    #[error("Invalid response from odk central: {0}")]
    InvalidResponse(String),

    /// A named remote resource does not exist
    #[error("Not found on odk central: {0}")]
    NotFound(String),

    /// Any other non-success status on an operation that must succeed
    #[error("Request to odk central failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },
}

/// XForm transformer errors
#[derive(Debug, Error)]
pub enum FormError {
    /// The spreadsheet converter raised or could not be run
    #[error("{message}")]
    ConversionFailed { message: String, cause: String },

    /// The converter produced a zero-length file
    #[error("{0} is empty!")]
    EmptyOutput(String),

    /// The document is not well-formed XML
    #[error("Invalid XForm XML: {0}")]
    InvalidXml(String),

    /// The ad-hoc validity check rejected the form
    #[error("Your form is invalid: {0}")]
    Invalid(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for RelayError {
    fn from(err: std::io::Error) -> Self {
        RelayError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for RelayError {
    fn from(err: toml::de::Error) -> Self {
        RelayError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<csv::Error> for RelayError {
    fn from(err: csv::Error) -> Self {
        RelayError::Conversion(format!("CSV error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_error_display() {
        let err = RelayError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_central_error_conversion() {
        let central_err = CentralError::ConnectionFailed("Network error".to_string());
        let relay_err: RelayError = central_err.into();
        assert!(matches!(relay_err, RelayError::Central(_)));
        assert_eq!(relay_err.status_code(), 500);
    }

    #[test]
    fn test_form_errors_are_client_errors() {
        let err: RelayError = FormError::EmptyOutput("/tmp/form.xml".to_string()).into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "Form error: /tmp/form.xml is empty!");

        let err: RelayError = FormError::ConversionFailed {
            message: "Couldn't convert survey.xlsx to an XForm!".to_string(),
            cause: "bad sheet".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_authentication_failure_is_server_error() {
        let err: RelayError = CentralError::AuthenticationFailed("401.2".to_string()).into();
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let relay_err: RelayError = io_err.into();
        assert!(matches!(relay_err, RelayError::Io(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let relay_err: RelayError = toml_err.into();
        assert!(matches!(relay_err, RelayError::Configuration(_)));
        assert!(relay_err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_relay_error_implements_std_error() {
        let err = RelayError::Validation("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
