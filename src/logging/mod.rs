//! Logging and observability
//!
//! Structured logging with `tracing`:
//! - Console output on stderr
//! - Optional JSON log files with rotation
//! - `RUST_LOG` overrides the configured level
//!
//! # Example
//!
//! ```no_run
//! use odk_relay::logging::init_logging;
//! use odk_relay::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log one step of the form-publish sequence
///
/// # Example
///
/// ```no_run
/// use odk_relay::log_publish_step;
///
/// log_publish_step!("create_form", 12, "buildings");
/// ```
#[macro_export]
macro_rules! log_publish_step {
    ($step:expr, $project_id:expr, $form_id:expr) => {
        tracing::debug!(
            step = $step,
            project_id = %$project_id,
            form_id = %$form_id,
            "Publish sequence step"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use odk_relay::log_error_with_context;
/// use odk_relay::domain::RelayError;
///
/// let error = RelayError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
