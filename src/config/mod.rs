//! Configuration management for odk-relay.
//!
//! odk-relay uses a TOML configuration file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use odk_relay::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("odk-relay.toml")?;
//! println!("Central: {}", config.central.url);
//! println!("Staging: {}", config.forms.staging_dir.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`CentralConfig`] - Default ODK Central server and credentials
//! - [`FormsConfig`] - XLSForm converter and geodata staging directory
//! - [`SubmissionConfig`] - CSV → OSM/GeoJSON column handling
//! - [`PostgreSQLConfig`] - Form catalog database (optional)
//! - [`LoggingConfig`] - Local log files
//!
//! # Example Configuration
//!
//! ```toml
//! [central]
//! url = "https://central.example.org"
//! user = "admin@example.org"
//! password = "${ODK_CENTRAL_PASSWD}"
//!
//! [forms]
//! staging_dir = "/tmp/fmtm/odk"
//!
//! [submissions.tag_renames]
//! building_type = "building"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, CentralConfig, FormsConfig, LoggingConfig, PostgreSQLConfig, RelayConfig,
    SubmissionConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
