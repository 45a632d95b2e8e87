//! Connection credentials for an ODK Central server

use crate::config::{secret_string, SecretString};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

/// URL, user and password for one Central server
///
/// Either supplied per operation by the caller (a project deployed on its own
/// Central instance) or taken from the default configuration. The password is
/// zeroized on drop and redacted from `Debug` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentralCredentials {
    /// Base URL of the server, without the `/v1` API suffix
    pub url: String,

    /// Account e-mail
    pub user: String,

    /// Account password
    pub password: SecretString,
}

impl CentralCredentials {
    pub fn new(url: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user: user.into(),
            password: secret_string(password.into()),
        }
    }

    /// Base URL with any trailing slash removed
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    pub(crate) fn password_str(&self) -> &str {
        self.password.expose_secret().as_ref()
    }
}
