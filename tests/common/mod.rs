//! Test doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use odk_relay::adapters::central::{AppUser, CentralApi, CentralConnector, FormInfo, Project};
use odk_relay::core::transform::XlsFormConverter;
use odk_relay::domain::{
    CentralCredentials, CentralError, ProjectId, RelayError, RemoteOutcome, Result, XFormId,
};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const MINIMAL_XFORM: &str = r#"<?xml version="1.0"?>
<h:html xmlns="http://www.w3.org/2002/xforms" xmlns:h="http://www.w3.org/1999/xhtml">
  <h:head>
    <h:title>survey</h:title>
    <model>
      <instance>
        <data id="survey" version="1"><name/></data>
      </instance>
      <instance id="features" src="jr://file/features.geojson"/>
    </model>
  </h:head>
  <h:body/>
</h:html>
"#;

pub fn success(status: u16) -> RemoteOutcome {
    RemoteOutcome::Success { status }
}

pub fn failure(status: u16, details: &str) -> RemoteOutcome {
    RemoteOutcome::OtherError {
        status,
        details: details.to_string(),
    }
}

pub fn app_user(id: u64, display_name: &str) -> AppUser {
    AppUser {
        id,
        display_name: display_name.to_string(),
        token: Some(format!("token-{id}")),
        extra: Map::new(),
    }
}

#[derive(Default)]
pub struct FakeState {
    pub calls: Vec<String>,
    pub create_form: Option<RemoteOutcome>,
    pub upload_media: Option<RemoteOutcome>,
    pub upload_fails: bool,
    pub delete_project: Option<RemoteOutcome>,
    pub delete_project_fails: bool,
    pub app_users: Vec<AppUser>,
    pub submissions: HashMap<String, Vec<Value>>,

    /// Media uploads seen, as (filename, content)
    pub uploads: Vec<(String, Vec<u8>)>,

    /// XForms uploaded with create_form
    pub xforms: Vec<String>,

    /// Whether each staged file under `staging_dir` existed at upload time
    pub staged_during_upload: Vec<bool>,
    pub staging_dir: Option<PathBuf>,
}

/// In-memory Central that records every call
#[derive(Clone, Default)]
pub struct FakeCentral {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeCentral {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F: FnOnce(&mut FakeState)>(self, f: F) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl CentralApi for FakeCentral {
    fn base_url(&self) -> &str {
        "https://central.test"
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        self.record("list_projects".to_string());
        Ok(vec![])
    }

    async fn project_details(&self, project_id: ProjectId) -> Result<Value> {
        self.record(format!("project_details {project_id}"));
        Ok(json!({ "id": project_id.get() }))
    }

    async fn create_project(&self, name: &str) -> Result<Project> {
        self.record(format!("create_project {name}"));
        Ok(Project {
            id: 1,
            name: name.to_string(),
            archived: None,
            extra: Map::new(),
        })
    }

    async fn delete_project(&self, project_id: ProjectId) -> Result<RemoteOutcome> {
        self.record(format!("delete_project {project_id}"));
        if self.state.lock().unwrap().delete_project_fails {
            return Err(CentralError::ConnectionFailed("connection reset".to_string()).into());
        }
        Ok(self
            .state
            .lock()
            .unwrap()
            .delete_project
            .clone()
            .unwrap_or_else(|| success(200)))
    }

    async fn list_forms(&self, project_id: ProjectId, _metadata: bool) -> Result<Vec<FormInfo>> {
        self.record(format!("list_forms {project_id}"));
        Ok(vec![])
    }

    async fn form_details(&self, project_id: ProjectId, form_id: &XFormId) -> Result<Value> {
        self.record(format!("form_details {project_id} {form_id}"));
        Ok(json!({ "xmlFormId": form_id.as_str() }))
    }

    async fn create_form(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
        xform: String,
        draft: bool,
    ) -> Result<RemoteOutcome> {
        self.record(format!("create_form {project_id} {form_id} draft={draft}"));
        let mut state = self.state.lock().unwrap();
        state.xforms.push(xform);
        Ok(state.create_form.clone().unwrap_or_else(|| success(200)))
    }

    async fn delete_form(&self, project_id: ProjectId, form_id: &XFormId) -> Result<RemoteOutcome> {
        self.record(format!("delete_form {project_id} {form_id}"));
        Ok(success(200))
    }

    async fn create_draft(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
    ) -> Result<RemoteOutcome> {
        self.record(format!("create_draft {project_id} {form_id}"));
        Ok(success(200))
    }

    async fn upload_media(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<RemoteOutcome> {
        self.record(format!("upload_media {project_id} {form_id} {filename}"));
        let mut state = self.state.lock().unwrap();
        if let Some(dir) = state.staging_dir.clone() {
            let staged = dir.join(project_id.to_string()).join(filename);
            state.staged_during_upload.push(staged.exists());
        }
        state.uploads.push((filename.to_string(), content));
        if state.upload_fails {
            return Err(RelayError::Io("broken pipe".to_string()));
        }
        Ok(state.upload_media.clone().unwrap_or_else(|| success(200)))
    }

    async fn download_media(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
        filename: &str,
    ) -> Result<Vec<u8>> {
        self.record(format!("download_media {project_id} {form_id} {filename}"));
        Ok(b"{}".to_vec())
    }

    async fn publish_form(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
    ) -> Result<RemoteOutcome> {
        self.record(format!("publish_form {project_id} {form_id}"));
        Ok(success(200))
    }

    async fn list_app_users(&self, project_id: ProjectId) -> Result<Vec<AppUser>> {
        self.record(format!("list_app_users {project_id}"));
        Ok(self.state.lock().unwrap().app_users.clone())
    }

    async fn create_app_user(&self, project_id: ProjectId, display_name: &str) -> Result<AppUser> {
        self.record(format!("create_app_user {project_id} {display_name}"));
        Ok(app_user(99, display_name))
    }

    async fn delete_app_user(&self, project_id: ProjectId, actor_id: u64) -> Result<RemoteOutcome> {
        self.record(format!("delete_app_user {project_id} {actor_id}"));
        Ok(success(200))
    }

    async fn assign_app_user(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
        role_id: u32,
        actor_id: u64,
    ) -> Result<RemoteOutcome> {
        self.record(format!(
            "assign_app_user {project_id} {form_id} {role_id} {actor_id}"
        ));
        Ok(success(200))
    }

    async fn list_submissions(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
    ) -> Result<Vec<Value>> {
        self.record(format!("list_submissions {project_id} {form_id}"));
        Ok(self
            .state
            .lock()
            .unwrap()
            .submissions
            .get(form_id.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn download_submissions(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
        _submission_id: Option<&str>,
        json: bool,
    ) -> Result<Vec<u8>> {
        self.record(format!("download_submissions {project_id} {form_id} json={json}"));
        Ok(b"KEY,name\nuuid:1,a\nuuid:2,b\n".to_vec())
    }
}

/// Hands out the same [`FakeCentral`] and remembers which server was asked for
#[derive(Clone, Default)]
pub struct FakeConnector {
    pub central: FakeCentral,
    pub connected_to: Arc<Mutex<Vec<String>>>,
}

impl FakeConnector {
    pub fn new(central: FakeCentral) -> Self {
        Self {
            central,
            connected_to: Arc::default(),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.connected_to.lock().unwrap().clone()
    }
}

impl CentralConnector for FakeConnector {
    fn connect(&self, credentials: &CentralCredentials) -> Result<Box<dyn CentralApi>> {
        self.connected_to
            .lock()
            .unwrap()
            .push(credentials.base_url().to_string());
        Ok(Box::new(self.central.clone()))
    }
}

/// Writes a fixed XForm in place of running `xls2xform`
#[derive(Clone)]
pub struct FakeConverter {
    pub xform: String,
}

impl FakeConverter {
    pub fn new(xform: &str) -> Self {
        Self {
            xform: xform.to_string(),
        }
    }
}

#[async_trait]
impl XlsFormConverter for FakeConverter {
    async fn convert(&self, _source: &Path, output: &Path, _validate: bool) -> Result<()> {
        tokio::fs::write(output, &self.xform).await?;
        Ok(())
    }
}
