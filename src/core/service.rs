//! Orchestration service
//!
//! [`RelayService`] is the single entry point callers use. Every operation
//! resolves credentials (the caller's, else the configured defaults), opens a
//! fresh Central handle, does its work and drops the handle.

use crate::adapters::central::{
    AppUser, CentralApi, CentralConnector, FormInfo, HttpConnector, Project, APP_USER_ROLE_ID,
};
use crate::config::{CentralConfig, FormsConfig, RelayConfig};
use crate::core::publish::{PublishRequest, PublishResult, PublishSequence};
use crate::core::transform::{
    check_validity, generate_updated_xform, Xls2XformCommand, XlsFormConverter,
};
use crate::domain::{
    CentralCredentials, CentralError, FormValidity, GeodataCategory, ProjectId, RelayError,
    RemoteOutcome, Result, XFormId,
};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Reason reported when a remote project delete fails
pub const PROJECT_DELETE_FAILED: &str = "Could not delete project from central odk";

/// Outcome of [`RelayService::delete_project`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectDeletion {
    pub project_id: ProjectId,
    pub remote: RemoteDeletion,
    pub reconciliation: Reconciliation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemoteDeletion {
    /// Central answered; the outcome may still be an error status
    Deleted { outcome: RemoteOutcome },

    /// The delete could not be carried out
    SoftFailure { reason: String },
}

/// Whether the caller's local project → remote id mapping needs attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reconciliation {
    /// The remote project is gone; the local mapping is stale
    Pending,

    /// Nothing was deleted remotely; the local mapping still holds
    NotRequired,
}

/// A freshly issued app-user token for one form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppUserToken {
    pub actor_id: u64,
    pub display_name: String,
    pub token: String,
    pub assignment: RemoteOutcome,
}

/// Form to convert, bind and publish in one go
#[derive(Debug, Clone)]
pub struct DeployRequest<'a> {
    pub project_id: ProjectId,

    /// Uploaded XLSForm or XForm
    pub input: &'a Path,

    /// `xls`, `xlsx` or `xml`
    pub form_type: &'a str,

    pub form_id: &'a XFormId,
    pub category: &'a GeodataCategory,
    pub geodata: &'a [u8],
    pub create_draft: bool,
}

/// Project, form, app-user and submission operations against ODK Central
pub struct RelayService {
    central: CentralConfig,
    forms: FormsConfig,
    connector: Arc<dyn CentralConnector>,
    converter: Arc<dyn XlsFormConverter>,
}

impl RelayService {
    pub fn new(
        central: CentralConfig,
        forms: FormsConfig,
        connector: Arc<dyn CentralConnector>,
        converter: Arc<dyn XlsFormConverter>,
    ) -> Self {
        Self {
            central,
            forms,
            connector,
            converter,
        }
    }

    /// Service wired to the HTTP client and the `xls2xform` executable
    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(
            config.central.clone(),
            config.forms.clone(),
            Arc::new(HttpConnector::from_config(&config.central)),
            Arc::new(Xls2XformCommand::new(config.forms.converter_command.clone())),
        )
    }

    pub fn staging_dir(&self) -> &Path {
        &self.forms.staging_dir
    }

    fn connect(&self, credentials: Option<&CentralCredentials>) -> Result<Box<dyn CentralApi>> {
        let defaults;
        let credentials = match credentials {
            Some(credentials) => credentials,
            None => {
                tracing::debug!("No deployment credentials given, using configured ODK Central");
                defaults = self.central.credentials();
                &defaults
            }
        };

        self.connector.connect(credentials).map_err(|e| match e {
            RelayError::Central(CentralError::ConnectionFailed(_)) => e,
            other => CentralError::ConnectionFailed(other.to_string()).into(),
        })
    }

    pub async fn list_projects(
        &self,
        credentials: Option<&CentralCredentials>,
    ) -> Result<Vec<Project>> {
        self.connect(credentials)?.list_projects().await
    }

    /// Create a project named `"{prefix} {name}"`
    pub async fn create_project(
        &self,
        name: &str,
        credentials: Option<&CentralCredentials>,
    ) -> Result<Project> {
        let api = self.connect(credentials)?;
        let remote_name = format!("{} {}", self.central.project_name_prefix, name);

        tracing::debug!(name = %remote_name, url = %api.base_url(), "Creating ODK Central project");
        let project = api.create_project(&remote_name).await?;
        tracing::info!(project_id = project.id, name = %project.name, "Created ODK Central project");
        Ok(project)
    }

    /// Delete a remote project without ever failing
    pub async fn delete_project(
        &self,
        project_id: ProjectId,
        credentials: Option<&CentralCredentials>,
    ) -> ProjectDeletion {
        let attempt = match self.connect(credentials) {
            Ok(api) => api.delete_project(project_id).await,
            Err(e) => Err(e),
        };

        match attempt {
            Ok(outcome) if outcome.is_success() => {
                tracing::info!(project_id = %project_id, outcome = %outcome, "Deleted ODK Central project");
                ProjectDeletion {
                    project_id,
                    remote: RemoteDeletion::Deleted { outcome },
                    reconciliation: Reconciliation::Pending,
                }
            }
            Ok(outcome) => {
                tracing::warn!(project_id = %project_id, outcome = %outcome, "{PROJECT_DELETE_FAILED}");
                ProjectDeletion {
                    project_id,
                    remote: RemoteDeletion::SoftFailure {
                        reason: PROJECT_DELETE_FAILED.to_string(),
                    },
                    reconciliation: Reconciliation::NotRequired,
                }
            }
            Err(e) => {
                tracing::warn!(project_id = %project_id, error = %e, "{PROJECT_DELETE_FAILED}");
                ProjectDeletion {
                    project_id,
                    remote: RemoteDeletion::SoftFailure {
                        reason: PROJECT_DELETE_FAILED.to_string(),
                    },
                    reconciliation: Reconciliation::NotRequired,
                }
            }
        }
    }

    pub async fn project_details(
        &self,
        project_id: ProjectId,
        credentials: Option<&CentralCredentials>,
    ) -> Result<Value> {
        self.connect(credentials)?.project_details(project_id).await
    }

    pub async fn list_forms(
        &self,
        project_id: ProjectId,
        metadata: bool,
        credentials: Option<&CentralCredentials>,
    ) -> Result<Vec<FormInfo>> {
        self.connect(credentials)?
            .list_forms(project_id, metadata)
            .await
    }

    pub async fn form_details(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
        credentials: Option<&CentralCredentials>,
    ) -> Result<Value> {
        self.connect(credentials)?
            .form_details(project_id, form_id)
            .await
    }

    pub async fn delete_form(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
        credentials: Option<&CentralCredentials>,
    ) -> Result<RemoteOutcome> {
        let outcome = self
            .connect(credentials)?
            .delete_form(project_id, form_id)
            .await?;
        tracing::info!(project_id = %project_id, form_id = %form_id, outcome = %outcome, "Deleted XForm");
        Ok(outcome)
    }

    /// Run the publish sequence for an already generated XForm
    pub async fn publish_xform(
        &self,
        request: &PublishRequest<'_>,
        credentials: Option<&CentralCredentials>,
    ) -> Result<PublishResult> {
        let api = self.connect(credentials)?;
        PublishSequence::new(api.as_ref(), &self.forms.staging_dir)
            .run(request)
            .await
    }

    /// Convert, bind and publish an uploaded form
    ///
    /// The deployment XForm is written to
    /// `{staging_dir}/{project_id}/{form_id}.xml`.
    pub async fn deploy_form(
        &self,
        request: &DeployRequest<'_>,
        credentials: Option<&CentralCredentials>,
    ) -> Result<PublishResult> {
        let xform_path = self.xform_path(request.project_id, request.form_id);
        generate_updated_xform(
            self.converter.as_ref(),
            request.input,
            &xform_path,
            request.form_type,
            request.category,
        )
        .await?;

        let publish = PublishRequest {
            project_id: request.project_id,
            xform_path: &xform_path,
            category: request.category,
            geodata: request.geodata,
            create_draft: request.create_draft,
            convert_to_draft: self.forms.convert_to_draft_when_publishing,
        };
        self.publish_xform(&publish, credentials).await
    }

    fn xform_path(&self, project_id: ProjectId, form_id: &XFormId) -> PathBuf {
        self.forms
            .staging_dir
            .join(project_id.to_string())
            .join(format!("{form_id}.xml"))
    }

    /// Validity check for an uploaded form
    pub async fn check_form(&self, content: &[u8], form_type: &str) -> Result<FormValidity> {
        check_validity(self.converter.as_ref(), content, form_type).await
    }

    /// Attach a media file to the form named by its file stem, then publish
    pub async fn upload_xform_media(
        &self,
        project_id: ProjectId,
        media_path: &Path,
        credentials: Option<&CentralCredentials>,
    ) -> Result<RemoteOutcome> {
        let form_id = XFormId::from_path(media_path).map_err(RelayError::Validation)?;
        let api = self.connect(credentials)?;

        let draft = api.create_draft(project_id, &form_id).await?;
        tracing::debug!(form_id = %form_id, outcome = %draft, "Draft for media upload");

        let media = upload_file(api.as_ref(), project_id, &form_id, media_path).await?;
        if !media.is_success() {
            tracing::warn!(form_id = %form_id, outcome = %media, "Media upload was not accepted");
        }

        api.publish_form(project_id, &form_id).await
    }

    /// Attach a media file to a form's draft
    pub async fn upload_media(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
        media_path: &Path,
        credentials: Option<&CentralCredentials>,
    ) -> Result<RemoteOutcome> {
        let api = self.connect(credentials)?;
        upload_file(api.as_ref(), project_id, form_id, media_path).await
    }

    pub async fn download_media(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
        filename: &str,
        credentials: Option<&CentralCredentials>,
    ) -> Result<Vec<u8>> {
        self.connect(credentials)?
            .download_media(project_id, form_id, filename)
            .await
    }

    pub async fn list_app_users(
        &self,
        project_id: ProjectId,
        credentials: Option<&CentralCredentials>,
    ) -> Result<Vec<AppUser>> {
        self.connect(credentials)?.list_app_users(project_id).await
    }

    /// Delete the app user with this display name
    ///
    /// # Errors
    ///
    /// `CentralError::NotFound` if no app user has that name.
    pub async fn delete_app_user(
        &self,
        project_id: ProjectId,
        display_name: &str,
        credentials: Option<&CentralCredentials>,
    ) -> Result<RemoteOutcome> {
        let api = self.connect(credentials)?;
        let user = api
            .list_app_users(project_id)
            .await?
            .into_iter()
            .find(|u| u.display_name == display_name)
            .ok_or_else(|| {
                CentralError::NotFound(format!(
                    "app user '{display_name}' in project {project_id}"
                ))
            })?;

        api.delete_app_user(project_id, user.id).await
    }

    /// Create an app user named after a form and give it the form
    pub async fn create_app_user_token(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
        credentials: Option<&CentralCredentials>,
    ) -> Result<AppUserToken> {
        let api = self.connect(credentials)?;
        let user = api.create_app_user(project_id, form_id.as_str()).await?;
        let token = user.token.clone().ok_or_else(|| {
            CentralError::InvalidResponse(format!("app user {} has no token", user.id))
        })?;

        let assignment = api
            .assign_app_user(project_id, form_id, APP_USER_ROLE_ID, user.id)
            .await?;
        if !assignment.is_success() {
            tracing::warn!(
                actor_id = user.id,
                form_id = %form_id,
                outcome = %assignment,
                "App user role assignment failed"
            );
        }

        Ok(AppUserToken {
            actor_id: user.id,
            display_name: user.display_name,
            token,
            assignment,
        })
    }

    /// All submissions of a project, app user by app user
    ///
    /// Each app user is looked up by the form sharing its display name, so a
    /// project deployed with one app user per form yields every form's
    /// submissions in app-user order.
    pub async fn list_submissions(
        &self,
        project_id: ProjectId,
        credentials: Option<&CentralCredentials>,
    ) -> Result<Vec<Value>> {
        let api = self.connect(credentials)?;
        let mut submissions = Vec::new();

        for user in api.list_app_users(project_id).await? {
            let form_id = XFormId::new(user.display_name.as_str()).map_err(|e| {
                CentralError::InvalidResponse(format!("app user {}: {e}", user.id))
            })?;
            let batch = api.list_submissions(project_id, &form_id).await?;
            tracing::debug!(form_id = %form_id, count = batch.len(), "Listed submissions");
            submissions.extend(batch);
        }

        Ok(submissions)
    }

    /// Submission export as text lines (CSV rows, or OData JSON)
    pub async fn download_submissions(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
        submission_id: Option<&str>,
        json: bool,
        credentials: Option<&CentralCredentials>,
    ) -> Result<Vec<String>> {
        let bytes = self
            .connect(credentials)?
            .download_submissions(project_id, form_id, submission_id, json)
            .await?;
        let text = String::from_utf8(bytes).map_err(|e| {
            CentralError::InvalidResponse(format!("submission export is not UTF-8: {e}"))
        })?;
        Ok(text.lines().map(str::to_string).collect())
    }
}

async fn upload_file(
    api: &dyn CentralApi,
    project_id: ProjectId,
    form_id: &XFormId,
    media_path: &Path,
) -> Result<RemoteOutcome> {
    let filename = media_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            RelayError::Validation(format!("Invalid media path: {}", media_path.display()))
        })?;
    let content = tokio::fs::read(media_path).await?;
    api.upload_media(project_id, form_id, filename, content).await
}
