//! `forms` commands

use super::{fail, load, print_json, report, CredentialArgs, EXIT_CONFIG, EXIT_OK};
use crate::adapters::postgresql::{FormCatalog, PostgreSQLClient, PostgresFormCatalog};
use crate::core::service::{DeployRequest, RelayService};
use crate::domain::{GeodataCategory, ProjectId, RelayError, XFormId};
use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct FormsArgs {
    #[command(flatten)]
    pub credentials: CredentialArgs,

    #[command(subcommand)]
    pub command: FormsCommand,
}

#[derive(Subcommand, Debug)]
pub enum FormsCommand {
    /// List the forms of a project
    List {
        project_id: ProjectId,

        /// Include extended metadata
        #[arg(long)]
        metadata: bool,
    },

    /// Show form details
    Details {
        project_id: ProjectId,
        form_id: XFormId,
    },

    /// Delete a form
    Delete {
        project_id: ProjectId,
        form_id: XFormId,
    },

    /// Convert, bind and publish a form with its geodata
    Publish {
        project_id: ProjectId,

        /// XLSForm (.xls, .xlsx) or XForm (.xml)
        input: PathBuf,

        /// Geodata category; the form references `{category}.geojson`
        #[arg(long)]
        category: GeodataCategory,

        /// GeoJSON features to attach
        #[arg(long)]
        geojson: PathBuf,

        /// Remote form id (defaults to the input file stem)
        #[arg(long)]
        form_id: Option<XFormId>,

        /// Leave the form as a draft when creating it
        #[arg(long)]
        draft: bool,
    },

    /// Check a form and list the geodata it needs
    Validate {
        input: PathBuf,
    },

    /// List the XForms recorded in the form catalog database
    Catalog {
        #[arg(long, default_value_t = 0)]
        skip: i64,

        #[arg(long, default_value_t = 100)]
        limit: i64,
    },

    /// Upload a media file to the form named by its file stem, then publish
    UploadMedia {
        project_id: ProjectId,
        media: PathBuf,

        /// Attach to this form's draft without publishing
        #[arg(long)]
        form_id: Option<XFormId>,
    },

    /// Download a form attachment
    DownloadMedia {
        project_id: ProjectId,
        form_id: XFormId,
        filename: String,

        /// Output file (defaults to the attachment name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl FormsArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        let service = RelayService::from_config(&config);
        let credentials = self.credentials.credentials();
        let credentials = credentials.as_ref();

        match &self.command {
            FormsCommand::List {
                project_id,
                metadata,
            } => report(
                service.list_forms(*project_id, *metadata, credentials).await,
                "Failed to list forms",
            ),
            FormsCommand::Details {
                project_id,
                form_id,
            } => report(
                service.form_details(*project_id, form_id, credentials).await,
                "Failed to get form details",
            ),
            FormsCommand::Delete {
                project_id,
                form_id,
            } => report(
                service.delete_form(*project_id, form_id, credentials).await,
                "Failed to delete form",
            ),
            FormsCommand::Publish {
                project_id,
                input,
                category,
                geojson,
                form_id,
                draft,
            } => {
                let form_id = match form_id {
                    Some(id) => id.clone(),
                    None => match XFormId::from_path(input) {
                        Ok(id) => id,
                        Err(e) => return Ok(fail("Invalid form file", &RelayError::Validation(e))),
                    },
                };
                let geodata = match tokio::fs::read(geojson).await {
                    Ok(bytes) => bytes,
                    Err(e) => return Ok(fail("Failed to read geodata", &e.into())),
                };
                let form_type = extension(input);

                let request = DeployRequest {
                    project_id: *project_id,
                    input,
                    form_type: &form_type,
                    form_id: &form_id,
                    category,
                    geodata: &geodata,
                    create_draft: *draft,
                };
                match service.deploy_form(&request, credentials).await {
                    Ok(result) => {
                        println!("Publish result: {}", result.final_outcome());
                        print_json(&result)
                    }
                    Err(e) => Ok(fail("Failed to publish form", &e)),
                }
            }
            FormsCommand::Validate { input } => {
                let content = match tokio::fs::read(input).await {
                    Ok(bytes) => bytes,
                    Err(e) => return Ok(fail("Failed to read form", &e.into())),
                };
                report(
                    service.check_form(&content, &extension(input)).await,
                    "Form check failed",
                )
            }
            FormsCommand::Catalog { skip, limit } => {
                let Some(ref database) = config.database else {
                    println!("❌ No [database] section configured");
                    return Ok(EXIT_CONFIG);
                };
                let catalog = match PostgreSQLClient::new(database.clone()) {
                    Ok(client) => PostgresFormCatalog::new(client),
                    Err(e) => return Ok(fail("Invalid form catalog settings", &e)),
                };
                report(
                    catalog.list_forms(*skip, *limit).await,
                    "Failed to list form catalog",
                )
            }
            FormsCommand::UploadMedia {
                project_id,
                media,
                form_id,
            } => {
                let result = match form_id {
                    Some(form_id) => {
                        service
                            .upload_media(*project_id, form_id, media, credentials)
                            .await
                    }
                    None => {
                        service
                            .upload_xform_media(*project_id, media, credentials)
                            .await
                    }
                };
                report(result, "Failed to upload media")
            }
            FormsCommand::DownloadMedia {
                project_id,
                form_id,
                filename,
                output,
            } => {
                let bytes = match service
                    .download_media(*project_id, form_id, filename, credentials)
                    .await
                {
                    Ok(bytes) => bytes,
                    Err(e) => return Ok(fail("Failed to download media", &e)),
                };
                let path = output.clone().unwrap_or_else(|| PathBuf::from(filename));
                if let Err(e) = tokio::fs::write(&path, &bytes).await {
                    return Ok(fail("Failed to write media", &e.into()));
                }
                println!("✅ Wrote {} bytes to {}", bytes.len(), path.display());
                Ok(EXIT_OK)
            }
        }
    }
}

fn extension(path: &std::path::Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_string()
}
