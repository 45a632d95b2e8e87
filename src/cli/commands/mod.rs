//! CLI command implementations
//!
//! This module contains all CLI command implementations plus the pieces
//! they share: loading the configuration, per-deployment credentials and
//! mapping errors onto exit codes.

pub mod app_users;
pub mod forms;
pub mod init;
pub mod projects;
pub mod submissions;
pub mod validate;

use crate::config::{load_config, RelayConfig};
use crate::domain::{CentralCredentials, CentralError, RelayError, Result};
use clap::Args;
use serde::Serialize;

/// Exit codes
pub const EXIT_OK: i32 = 0;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_CONNECTION: i32 = 4;
pub const EXIT_FATAL: i32 = 5;

/// Credentials of a deployment-specific Central server
///
/// All three must be given; otherwise the configured server is used.
#[derive(Args, Debug, Clone, Default)]
pub struct CredentialArgs {
    /// ODK Central URL for this deployment
    #[arg(long, requires = "odk_user")]
    pub odk_url: Option<String>,

    /// ODK Central user for this deployment
    #[arg(long, requires = "odk_password")]
    pub odk_user: Option<String>,

    /// ODK Central password for this deployment
    #[arg(long, requires = "odk_url")]
    pub odk_password: Option<String>,
}

impl CredentialArgs {
    pub fn credentials(&self) -> Option<CentralCredentials> {
        match (&self.odk_url, &self.odk_user, &self.odk_password) {
            (Some(url), Some(user), Some(password)) => Some(CentralCredentials::new(
                url.clone(),
                user.clone(),
                password.clone(),
            )),
            _ => None,
        }
    }
}

/// Load the configuration or report why not
pub(crate) fn load(config_path: &str) -> std::result::Result<RelayConfig, i32> {
    load_config(config_path).map_err(|e| {
        println!("❌ Failed to load configuration file");
        println!("   Error: {e}");
        EXIT_CONFIG
    })
}

/// Exit code for a failed operation
pub(crate) fn exit_code(err: &RelayError) -> i32 {
    match err {
        RelayError::Configuration(_) => EXIT_CONFIG,
        RelayError::Central(CentralError::ConnectionFailed(_)) => EXIT_CONNECTION,
        _ => EXIT_FATAL,
    }
}

/// Report a failed operation and return its exit code
pub(crate) fn fail(context: &str, err: &RelayError) -> i32 {
    crate::log_error_with_context!(err, context);
    println!("❌ {context}");
    println!("   Error: {err} (status {})", err.status_code());
    exit_code(err)
}

/// Print a value as pretty JSON
pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<i32> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(EXIT_OK)
}

/// Print the value, or report the error
pub(crate) fn report<T: Serialize>(result: Result<T>, context: &str) -> anyhow::Result<i32> {
    match result {
        Ok(value) => print_json(&value),
        Err(e) => Ok(fail(context, &e)),
    }
}
