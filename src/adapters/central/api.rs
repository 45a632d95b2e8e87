//! ODK Central API trait definition
//!
//! [`CentralApi`] abstracts the remote survey server so the orchestration
//! layer can be driven against the HTTP client or a test double.
//! [`CentralConnector`] produces one API handle per operation from a set of
//! credentials; no handle outlives the operation that opened it.

use super::models::{AppUser, FormInfo, Project};
use crate::domain::{CentralCredentials, ProjectId, RemoteOutcome, Result, XFormId};
use async_trait::async_trait;
use serde_json::Value;

/// Central's built-in role id for app users
pub const APP_USER_ROLE_ID: u32 = 2;

/// Operations against one ODK Central server
///
/// Calls that the server answers with a status the caller must inspect
/// (create/delete/upload/publish) return a [`RemoteOutcome`]. Calls that
/// return data fail with a [`crate::domain::CentralError`] instead.
#[async_trait]
pub trait CentralApi: Send + Sync {
    /// Base URL of the server this handle talks to
    fn base_url(&self) -> &str;

    async fn list_projects(&self) -> Result<Vec<Project>>;

    async fn project_details(&self, project_id: ProjectId) -> Result<Value>;

    /// Create a project with exactly `name`
    ///
    /// # Errors
    ///
    /// `AuthenticationFailed` when the server reports a `401.x` code, even
    /// inside a 200 response.
    async fn create_project(&self, name: &str) -> Result<Project>;

    async fn delete_project(&self, project_id: ProjectId) -> Result<RemoteOutcome>;

    async fn list_forms(&self, project_id: ProjectId, metadata: bool) -> Result<Vec<FormInfo>>;

    async fn form_details(&self, project_id: ProjectId, form_id: &XFormId) -> Result<Value>;

    /// Upload an XForm definition, published immediately unless `draft`
    async fn create_form(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
        xform: String,
        draft: bool,
    ) -> Result<RemoteOutcome>;

    async fn delete_form(&self, project_id: ProjectId, form_id: &XFormId) -> Result<RemoteOutcome>;

    /// Put a published form back into draft so it accepts attachments
    async fn create_draft(&self, project_id: ProjectId, form_id: &XFormId)
        -> Result<RemoteOutcome>;

    /// Attach a media file to the form's draft
    async fn upload_media(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<RemoteOutcome>;

    async fn download_media(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
        filename: &str,
    ) -> Result<Vec<u8>>;

    /// Publish the form's current draft
    async fn publish_form(&self, project_id: ProjectId, form_id: &XFormId)
        -> Result<RemoteOutcome>;

    async fn list_app_users(&self, project_id: ProjectId) -> Result<Vec<AppUser>>;

    async fn create_app_user(&self, project_id: ProjectId, display_name: &str) -> Result<AppUser>;

    async fn delete_app_user(&self, project_id: ProjectId, actor_id: u64) -> Result<RemoteOutcome>;

    async fn assign_app_user(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
        role_id: u32,
        actor_id: u64,
    ) -> Result<RemoteOutcome>;

    async fn list_submissions(&self, project_id: ProjectId, form_id: &XFormId)
        -> Result<Vec<Value>>;

    /// Raw submission export: OData JSON when `json`, CSV otherwise
    async fn download_submissions(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
        submission_id: Option<&str>,
        json: bool,
    ) -> Result<Vec<u8>>;
}

/// Opens a [`CentralApi`] handle for one operation
pub trait CentralConnector: Send + Sync {
    /// # Errors
    ///
    /// `ConnectionFailed` if a client cannot be built for these credentials.
    fn connect(&self, credentials: &CentralCredentials) -> Result<Box<dyn CentralApi>>;
}
