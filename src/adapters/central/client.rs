//! ODK Central HTTP client
//!
//! [`CentralClient`] implements [`CentralApi`] over the Central REST API
//! (`{url}/v1/...`) with HTTP basic authentication on every request.
//! [`HttpConnector`] builds a fresh client per operation.

use super::api::{CentralApi, CentralConnector};
use super::models::{AppUser, CreateAppUserRequest, CreateProjectRequest, FormInfo, Project};
use crate::config::CentralConfig;
use crate::domain::{
    CentralCredentials, CentralError, ProjectId, RelayError, RemoteOutcome, Result, XFormId,
};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use url::Url;

const EXTENDED_METADATA: &str = "X-Extended-Metadata";

/// HTTP implementation of [`CentralApi`]
///
/// # Example
///
/// ```no_run
/// use odk_relay::adapters::central::{CentralApi, CentralClient};
/// use odk_relay::domain::CentralCredentials;
/// use std::time::Duration;
///
/// # async fn example() -> odk_relay::domain::Result<()> {
/// let creds = CentralCredentials::new("https://central.example.org", "admin@example.org", "pw");
/// let client = CentralClient::new(&creds, Duration::from_secs(60), true)?;
/// let projects = client.list_projects().await?;
/// # Ok(())
/// # }
/// ```
pub struct CentralClient {
    /// Base URL as configured, for logging
    base_url: String,

    /// Parsed base URL that endpoints are appended to
    api_root: Url,

    /// HTTP client for making requests
    client: Client,

    /// Precomputed `Authorization` header value
    auth_header: String,
}

impl CentralClient {
    /// Create a client for one server
    ///
    /// # Errors
    ///
    /// `ConnectionFailed` if the URL cannot be parsed or the HTTP client
    /// cannot be built.
    pub fn new(
        credentials: &CentralCredentials,
        timeout: Duration,
        tls_verify: bool,
    ) -> Result<Self> {
        let base_url = credentials.base_url().to_string();
        let api_root = Url::parse(&base_url).map_err(|e| {
            CentralError::ConnectionFailed(format!("Invalid Central URL {base_url}: {e}"))
        })?;
        if api_root.cannot_be_a_base() {
            return Err(CentralError::ConnectionFailed(format!(
                "Central URL cannot be used as a base: {base_url}"
            ))
            .into());
        }

        let mut client_builder = ClientBuilder::new()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(30));

        if !tls_verify {
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder
            .build()
            .map_err(|e| CentralError::ConnectionFailed(e.to_string()))?;

        let encoded = general_purpose::STANDARD.encode(format!(
            "{}:{}",
            credentials.user,
            credentials.password_str()
        ));

        Ok(Self {
            base_url,
            api_root,
            client,
            auth_header: format!("Basic {encoded}"),
        })
    }

    /// `{base}/v1/{segments...}` with each segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_root.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("v1").extend(segments);
        }
        url
    }

    fn project_segment(project_id: ProjectId) -> String {
        project_id.to_string()
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        request
            .header(AUTHORIZATION, &self.auth_header)
            .send()
            .await
            .map_err(|e| RelayError::from(CentralError::ConnectionFailed(e.to_string())))
    }

    async fn read_body(resp: Response, what: &str) -> Result<String> {
        resp.text()
            .await
            .map_err(|e| RelayError::from(CentralError::ConnectionFailed(format!("{what}: {e}"))))
    }

    /// Send a status-reporting request and classify the answer
    async fn outcome(&self, request: RequestBuilder) -> Result<RemoteOutcome> {
        let resp = self.send(request).await?;
        let status = resp.status().as_u16();
        let body = Self::read_body(resp, "read response").await?;
        Ok(RemoteOutcome::classify(status, &body))
    }

    /// Send a data request; any non-2xx status is an error
    async fn expect_success(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let resp = self.send(request).await?;
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status().as_u16();
        let body = Self::read_body(resp, what).await?;
        Err(error_for_status(status, &body, what))
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let resp = self.expect_success(request, what).await?;
        resp.json::<T>().await.map_err(|e| {
            RelayError::from(CentralError::InvalidResponse(format!("{what}: {e}")))
        })
    }

    async fn fetch_bytes(&self, request: RequestBuilder, what: &str) -> Result<Vec<u8>> {
        let resp = self.expect_success(request, what).await?;
        resp.bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| RelayError::from(CentralError::ConnectionFailed(format!("{what}: {e}"))))
    }
}

/// Map a failed data request onto a [`CentralError`]
fn error_for_status(status: u16, body: &str, what: &str) -> RelayError {
    let err = match RemoteOutcome::classify(status, body) {
        RemoteOutcome::AuthError { details } => CentralError::AuthenticationFailed(details),
        RemoteOutcome::OtherError {
            status: 404,
            details,
        } => CentralError::NotFound(format!("{what}: {details}")),
        RemoteOutcome::OtherError { status, details } => CentralError::RequestFailed {
            status,
            message: format!("{what}: {details}"),
        },
        RemoteOutcome::Success { status } => {
            CentralError::InvalidResponse(format!("{what}: unexpected status {status}"))
        }
    };
    err.into()
}

/// Content type Central should store for an attachment
fn media_content_type(filename: &str) -> &'static str {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".geojson") {
        "application/geo+json"
    } else if lower.ends_with(".csv") {
        "text/csv"
    } else if lower.ends_with(".xml") {
        "application/xml"
    } else {
        "application/octet-stream"
    }
}

/// Draft version string Central records on publish
fn publish_version() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[async_trait]
impl CentralApi for CentralClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        let url = self.endpoint(&["projects"]);
        self.fetch_json(self.client.get(url), "list projects").await
    }

    async fn project_details(&self, project_id: ProjectId) -> Result<Value> {
        let pid = Self::project_segment(project_id);
        let url = self.endpoint(&["projects", &pid]);
        let request = self.client.get(url).header(EXTENDED_METADATA, "true");
        self.fetch_json(request, "project details").await
    }

    async fn create_project(&self, name: &str) -> Result<Project> {
        let url = self.endpoint(&["projects"]);
        let request = self.client.post(url).json(&CreateProjectRequest { name });

        let resp = self.send(request).await?;
        let status = resp.status().as_u16();
        let body = Self::read_body(resp, "create project").await?;

        tracing::debug!(status, body = %body, "ODK Central response to project creation");

        match RemoteOutcome::classify(status, &body) {
            RemoteOutcome::Success { .. } => serde_json::from_str(&body).map_err(|e| {
                RelayError::from(CentralError::InvalidResponse(format!(
                    "create project: {e}"
                )))
            }),
            RemoteOutcome::AuthError { .. } => Err(CentralError::AuthenticationFailed(
                "Could not authenticate to odk central.".to_string(),
            )
            .into()),
            RemoteOutcome::OtherError { status, details } => Err(CentralError::RequestFailed {
                status,
                message: format!("Error creating project on ODK Central: {details}"),
            }
            .into()),
        }
    }

    async fn delete_project(&self, project_id: ProjectId) -> Result<RemoteOutcome> {
        let pid = Self::project_segment(project_id);
        let url = self.endpoint(&["projects", &pid]);
        self.outcome(self.client.delete(url)).await
    }

    async fn list_forms(&self, project_id: ProjectId, metadata: bool) -> Result<Vec<FormInfo>> {
        let pid = Self::project_segment(project_id);
        let url = self.endpoint(&["projects", &pid, "forms"]);
        let mut request = self.client.get(url);
        if metadata {
            request = request.header(EXTENDED_METADATA, "true");
        }
        self.fetch_json(request, "list forms").await
    }

    async fn form_details(&self, project_id: ProjectId, form_id: &XFormId) -> Result<Value> {
        let pid = Self::project_segment(project_id);
        let url = self.endpoint(&["projects", &pid, "forms", form_id.as_str()]);
        let request = self.client.get(url).header(EXTENDED_METADATA, "true");
        self.fetch_json(request, "form details").await
    }

    async fn create_form(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
        xform: String,
        draft: bool,
    ) -> Result<RemoteOutcome> {
        let pid = Self::project_segment(project_id);
        let url = self.endpoint(&["projects", &pid, "forms"]);
        let publish = if draft { "false" } else { "true" };

        tracing::debug!(
            project_id = %project_id,
            form_id = %form_id,
            draft,
            "Uploading XForm to ODK Central"
        );

        let request = self
            .client
            .post(url)
            .query(&[("ignoreWarnings", "true"), ("publish", publish)])
            .header(CONTENT_TYPE, "application/xml")
            .body(xform);
        self.outcome(request).await
    }

    async fn delete_form(&self, project_id: ProjectId, form_id: &XFormId) -> Result<RemoteOutcome> {
        let pid = Self::project_segment(project_id);
        let url = self.endpoint(&["projects", &pid, "forms", form_id.as_str()]);
        self.outcome(self.client.delete(url)).await
    }

    async fn create_draft(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
    ) -> Result<RemoteOutcome> {
        let pid = Self::project_segment(project_id);
        let url = self.endpoint(&["projects", &pid, "forms", form_id.as_str(), "draft"]);
        self.outcome(self.client.post(url)).await
    }

    async fn upload_media(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<RemoteOutcome> {
        let pid = Self::project_segment(project_id);
        let url = self.endpoint(&[
            "projects",
            &pid,
            "forms",
            form_id.as_str(),
            "draft",
            "attachments",
            filename,
        ]);
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, media_content_type(filename))
            .body(content);
        self.outcome(request).await
    }

    async fn download_media(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
        filename: &str,
    ) -> Result<Vec<u8>> {
        let pid = Self::project_segment(project_id);
        let url = self.endpoint(&[
            "projects",
            &pid,
            "forms",
            form_id.as_str(),
            "attachments",
            filename,
        ]);
        self.fetch_bytes(self.client.get(url), "download media").await
    }

    async fn publish_form(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
    ) -> Result<RemoteOutcome> {
        let pid = Self::project_segment(project_id);
        let url = self.endpoint(&[
            "projects",
            &pid,
            "forms",
            form_id.as_str(),
            "draft",
            "publish",
        ]);
        let request = self
            .client
            .post(url)
            .query(&[("version", publish_version())]);
        self.outcome(request).await
    }

    async fn list_app_users(&self, project_id: ProjectId) -> Result<Vec<AppUser>> {
        let pid = Self::project_segment(project_id);
        let url = self.endpoint(&["projects", &pid, "app-users"]);
        self.fetch_json(self.client.get(url), "list app users").await
    }

    async fn create_app_user(&self, project_id: ProjectId, display_name: &str) -> Result<AppUser> {
        let pid = Self::project_segment(project_id);
        let url = self.endpoint(&["projects", &pid, "app-users"]);
        let request = self
            .client
            .post(url)
            .json(&CreateAppUserRequest { display_name });
        self.fetch_json(request, "create app user").await
    }

    async fn delete_app_user(&self, project_id: ProjectId, actor_id: u64) -> Result<RemoteOutcome> {
        let pid = Self::project_segment(project_id);
        let actor = actor_id.to_string();
        let url = self.endpoint(&["projects", &pid, "app-users", &actor]);
        self.outcome(self.client.delete(url)).await
    }

    async fn assign_app_user(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
        role_id: u32,
        actor_id: u64,
    ) -> Result<RemoteOutcome> {
        let pid = Self::project_segment(project_id);
        let role = role_id.to_string();
        let actor = actor_id.to_string();
        let url = self.endpoint(&[
            "projects",
            &pid,
            "forms",
            form_id.as_str(),
            "assignments",
            &role,
            &actor,
        ]);
        self.outcome(self.client.post(url)).await
    }

    async fn list_submissions(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
    ) -> Result<Vec<Value>> {
        let pid = Self::project_segment(project_id);
        let url = self.endpoint(&["projects", &pid, "forms", form_id.as_str(), "submissions"]);
        self.fetch_json(self.client.get(url), "list submissions").await
    }

    async fn download_submissions(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
        submission_id: Option<&str>,
        json: bool,
    ) -> Result<Vec<u8>> {
        let pid = Self::project_segment(project_id);
        let url = if json {
            let service = format!("{form_id}.svc");
            let entity = match submission_id {
                Some(sid) => format!("Submissions('{sid}')"),
                None => "Submissions".to_string(),
            };
            self.endpoint(&["projects", &pid, "forms", &service, &entity])
        } else {
            self.endpoint(&[
                "projects",
                &pid,
                "forms",
                form_id.as_str(),
                "submissions.csv",
            ])
        };
        self.fetch_bytes(self.client.get(url), "download submissions")
            .await
    }
}

/// Builds a [`CentralClient`] per operation
#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
    tls_verify: bool,
}

impl HttpConnector {
    pub fn new(timeout: Duration, tls_verify: bool) -> Self {
        Self {
            timeout,
            tls_verify,
        }
    }

    pub fn from_config(config: &CentralConfig) -> Self {
        Self::new(Duration::from_secs(config.timeout_seconds), config.tls_verify)
    }
}

impl CentralConnector for HttpConnector {
    fn connect(&self, credentials: &CentralCredentials) -> Result<Box<dyn CentralApi>> {
        tracing::debug!(
            url = %credentials.url,
            user = %credentials.user,
            "Connecting to ODK Central"
        );
        let client = CentralClient::new(credentials, self.timeout, self.tls_verify)?;
        Ok(Box::new(client))
    }
}
