//! ODK Central API models
//!
//! Only the fields odk-relay reads are typed; everything else the server
//! sends is kept in `extra` so callers can pass it through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A project as listed by `GET /v1/projects`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u32,
    pub name: String,

    #[serde(default)]
    pub archived: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A form as listed by `GET /v1/projects/{id}/forms`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormInfo {
    pub xml_form_id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub state: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An app user (project-scoped actor)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppUser {
    pub id: u64,
    pub display_name: String,

    /// Only present right after creation, or for users that were not revoked
    #[serde(default)]
    pub token: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request body for project creation
#[derive(Debug, Serialize)]
pub(crate) struct CreateProjectRequest<'a> {
    pub name: &'a str,
}

/// Request body for app-user creation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateAppUserRequest<'a> {
    pub display_name: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_keeps_unknown_fields() {
        let json = r#"{"id":3,"name":"FMTM Roads","archived":null,"createdAt":"2024-01-01T00:00:00Z"}"#;
        let project: Project = serde_json::from_str(json).unwrap();
        assert_eq!(project.id, 3);
        assert_eq!(project.name, "FMTM Roads");
        assert_eq!(project.extra["createdAt"], "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_app_user_token_optional() {
        let json = r#"{"id":15,"displayName":"buildings","type":"field_key"}"#;
        let user: AppUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.display_name, "buildings");
        assert!(user.token.is_none());
    }

    #[test]
    fn test_form_info_camel_case() {
        let json = r#"{"xmlFormId":"buildings","name":"Buildings","version":"1","state":"open"}"#;
        let form: FormInfo = serde_json::from_str(json).unwrap();
        assert_eq!(form.xml_form_id, "buildings");
        assert_eq!(form.state.as_deref(), Some("open"));
    }
}
