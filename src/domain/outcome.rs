//! Outcome of a remote call that reports a status instead of failing
//!
//! Central answers some operations (create form, upload media, publish,
//! delete) with a status the caller is expected to inspect. The raw response
//! is classified once, at the client boundary, into a [`RemoteOutcome`] so
//! that orchestration code never looks at status codes or bodies again.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Central's authentication-failure code, carried in error bodies as `401.2`
const AUTH_FAILED_CODE_MAJOR: u64 = 401;

/// Classified result of a status-reporting remote call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RemoteOutcome {
    /// 2xx response
    Success { status: u16 },

    /// The server rejected the credentials
    AuthError { details: String },

    /// Any other status, with the server's explanation
    OtherError { status: u16, details: String },
}

impl RemoteOutcome {
    /// Classify a raw status and body
    ///
    /// A body carrying a Central error `code` of `401.x` is treated as an
    /// authentication failure even when the status itself is not 401.
    pub fn classify(status: u16, body: &str) -> Self {
        let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let code = parsed
            .as_ref()
            .and_then(|v| v.get("code"))
            .and_then(|c| c.as_f64());
        let message = parsed
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| body.trim().to_string());

        if code.map(|c| c.trunc() as u64) == Some(AUTH_FAILED_CODE_MAJOR)
            || status == 401
            || status == 403
        {
            return RemoteOutcome::AuthError { details: message };
        }

        if (200..300).contains(&status) {
            RemoteOutcome::Success { status }
        } else {
            RemoteOutcome::OtherError {
                status,
                details: message,
            }
        }
    }

    /// HTTP status, when one is known
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteOutcome::Success { status } | RemoteOutcome::OtherError { status, .. } => {
                Some(*status)
            }
            RemoteOutcome::AuthError { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RemoteOutcome::Success { .. })
    }

    /// True for "created" (200) and "already exists" (409)
    pub fn is_created_or_exists(&self) -> bool {
        matches!(self, RemoteOutcome::Success { status: 200 })
            || matches!(self, RemoteOutcome::OtherError { status: 409, .. })
    }
}

impl fmt::Display for RemoteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteOutcome::Success { status } => write!(f, "success ({status})"),
            RemoteOutcome::AuthError { details } => write!(f, "authentication failed: {details}"),
            RemoteOutcome::OtherError { status, details } => {
                write!(f, "failed ({status}): {details}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(200, "{}" ; "ok")]
    #[test_case(201, "" ; "created")]
    #[test_case(204, "" ; "no content")]
    fn test_success_statuses(status: u16, body: &str) {
        assert_eq!(
            RemoteOutcome::classify(status, body),
            RemoteOutcome::Success { status }
        );
    }

    #[test]
    fn test_auth_code_in_body_wins() {
        let body = r#"{"code":401.2,"message":"Could not authenticate with the provided credentials."}"#;
        let outcome = RemoteOutcome::classify(200, body);
        assert!(matches!(outcome, RemoteOutcome::AuthError { .. }));
        assert_eq!(outcome.status(), None);
    }

    #[test]
    fn test_conflict_is_other_error_but_continues() {
        let body = r#"{"code":409.3,"message":"A resource already exists with id."}"#;
        let outcome = RemoteOutcome::classify(409, body);
        assert_eq!(
            outcome,
            RemoteOutcome::OtherError {
                status: 409,
                details: "A resource already exists with id.".to_string()
            }
        );
        assert!(outcome.is_created_or_exists());
    }

    #[test_case(400 ; "bad request")]
    #[test_case(404 ; "not found")]
    #[test_case(500 ; "server error")]
    fn test_other_statuses_do_not_continue(status: u16) {
        let outcome = RemoteOutcome::classify(status, "boom");
        assert!(!outcome.is_created_or_exists());
        assert_eq!(outcome.status(), Some(status));
    }

    #[test]
    fn test_201_is_not_created_or_exists() {
        assert!(!RemoteOutcome::Success { status: 201 }.is_created_or_exists());
    }
}
