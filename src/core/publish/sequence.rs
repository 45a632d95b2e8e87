//! Form publish sequence
//!
//! ```text
//! CreateForm ──(200 | 409)──> StageGeodata ──> AttachMedia ──> Cleanup ──> Publish
//!      │                                            │
//!      └─(other) Halted                             └─(error) Cleanup, then raise
//! ```

use super::staging::{remove_staged, stage_geodata};
use crate::adapters::central::CentralApi;
use crate::domain::{GeodataCategory, ProjectId, RemoteOutcome, Result, XFormId};
use crate::log_publish_step;
use serde::Serialize;
use std::path::Path;

/// Inputs for one publish
#[derive(Debug, Clone)]
pub struct PublishRequest<'a> {
    pub project_id: ProjectId,

    /// Deployment XForm; its file stem is the remote form id
    pub xform_path: &'a Path,

    pub category: &'a GeodataCategory,

    /// GeoJSON features for the form's geodata attachment
    pub geodata: &'a [u8],

    /// Create the form as a draft instead of publishing it immediately
    pub create_draft: bool,

    /// Put the form back into draft before attaching media
    pub convert_to_draft: bool,
}

/// How far the sequence got
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PublishResult {
    /// CreateForm answered something other than created or already-exists;
    /// nothing else ran
    Halted { create: RemoteOutcome },

    Published {
        create: RemoteOutcome,
        draft: Option<RemoteOutcome>,
        media: RemoteOutcome,
        publish: RemoteOutcome,
    },
}

impl PublishResult {
    /// The status the caller should report: the halting outcome, or the
    /// publish outcome
    pub fn final_outcome(&self) -> &RemoteOutcome {
        match self {
            PublishResult::Halted { create } => create,
            PublishResult::Published { publish, .. } => publish,
        }
    }
}

/// Runs the publish sequence against one Central handle
pub struct PublishSequence<'a> {
    api: &'a dyn CentralApi,
    staging_dir: &'a Path,
}

impl<'a> PublishSequence<'a> {
    pub fn new(api: &'a dyn CentralApi, staging_dir: &'a Path) -> Self {
        Self { api, staging_dir }
    }

    /// # Errors
    ///
    /// Any error from reading the XForm, staging, or a remote call that
    /// could not complete. An AttachMedia error is raised only after the
    /// staged file has been removed.
    pub async fn run(&self, request: &PublishRequest<'_>) -> Result<PublishResult> {
        let project_id = request.project_id;
        let form_id = XFormId::from_path(request.xform_path)
            .map_err(crate::domain::RelayError::Validation)?;

        log_publish_step!("create_form", project_id, form_id);
        let xform = tokio::fs::read_to_string(request.xform_path).await?;
        let create = self
            .api
            .create_form(project_id, &form_id, xform, request.create_draft)
            .await?;

        if !create.is_created_or_exists() {
            tracing::warn!(
                project_id = %project_id,
                form_id = %form_id,
                outcome = %create,
                "Form creation did not succeed, stopping publish"
            );
            return Ok(PublishResult::Halted { create });
        }

        log_publish_step!("stage_geodata", project_id, form_id);
        let staged = stage_geodata(
            self.staging_dir,
            project_id,
            request.category,
            request.geodata,
        )
        .await?;

        log_publish_step!("attach_media", project_id, form_id);
        let attached = self
            .attach(project_id, &form_id, request.category, &staged, request.convert_to_draft)
            .await;

        log_publish_step!("cleanup", project_id, form_id);
        if let Err(e) = remove_staged(&staged).await {
            tracing::warn!(path = %staged.display(), error = %e, "Failed to remove staged geodata");
        }

        let (draft, media) = attached?;
        if !media.is_success() {
            tracing::warn!(
                project_id = %project_id,
                form_id = %form_id,
                outcome = %media,
                "Geodata attachment was not accepted"
            );
        }

        log_publish_step!("publish", project_id, form_id);
        let publish = self.api.publish_form(project_id, &form_id).await?;

        tracing::info!(
            project_id = %project_id,
            form_id = %form_id,
            outcome = %publish,
            "Published form"
        );

        Ok(PublishResult::Published {
            create,
            draft,
            media,
            publish,
        })
    }

    async fn attach(
        &self,
        project_id: ProjectId,
        form_id: &XFormId,
        category: &GeodataCategory,
        staged: &Path,
        convert_to_draft: bool,
    ) -> Result<(Option<RemoteOutcome>, RemoteOutcome)> {
        let draft = if convert_to_draft {
            let outcome = self.api.create_draft(project_id, form_id).await?;
            if !outcome.is_success() {
                // a form created as a draft already has one
                tracing::debug!(outcome = %outcome, "Draft not created");
            }
            Some(outcome)
        } else {
            None
        };

        let content = tokio::fs::read(staged).await?;
        let media = self
            .api
            .upload_media(project_id, form_id, &category.file_name(), content)
            .await?;
        Ok((draft, media))
    }
}
