//! `submissions` commands

use super::{fail, load, print_json, report, CredentialArgs, EXIT_OK};
use crate::core::service::RelayService;
use crate::core::submissions::SubmissionConverter;
use crate::domain::{ProjectId, RelayError, XFormId};
use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct SubmissionsArgs {
    #[command(flatten)]
    pub credentials: CredentialArgs,

    #[command(subcommand)]
    pub command: SubmissionsCommand,
}

#[derive(Subcommand, Debug)]
pub enum SubmissionsCommand {
    /// List every submission of a project
    List { project_id: ProjectId },

    /// Download a form's submissions
    Download {
        project_id: ProjectId,
        form_id: XFormId,

        /// OData JSON instead of CSV
        #[arg(long)]
        json: bool,

        /// A single submission (implies --json)
        #[arg(long)]
        submission_id: Option<String>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert a submissions CSV into `.osm` and `.geojson` files
    Convert {
        /// CSV file; outputs are written next to it
        csv: PathBuf,
    },
}

impl SubmissionsArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        match &self.command {
            SubmissionsCommand::Convert { csv } => {
                let converter = SubmissionConverter::new(&config.submissions);
                let csv = csv.clone();
                let result = tokio::task::spawn_blocking(move || converter.convert_csv(&csv, &[]))
                    .await
                    .map_err(|e| RelayError::Conversion(format!("Conversion task failed: {e}")))
                    .and_then(|r| r);
                match result {
                    Ok(files) => {
                        println!(
                            "✅ {} features from {} records ({} empty, {} malformed)",
                            files.summary.features,
                            files.summary.records,
                            files.summary.empty,
                            files.summary.malformed
                        );
                        print_json(&files)
                    }
                    Err(e) => Ok(fail("Failed to convert submissions", &e)),
                }
            }
            SubmissionsCommand::List { project_id } => {
                let service = RelayService::from_config(&config);
                let credentials = self.credentials.credentials();
                report(
                    service
                        .list_submissions(*project_id, credentials.as_ref())
                        .await,
                    "Failed to list submissions",
                )
            }
            SubmissionsCommand::Download {
                project_id,
                form_id,
                json,
                submission_id,
                output,
            } => {
                let service = RelayService::from_config(&config);
                let credentials = self.credentials.credentials();
                let lines = match service
                    .download_submissions(
                        *project_id,
                        form_id,
                        submission_id.as_deref(),
                        *json || submission_id.is_some(),
                        credentials.as_ref(),
                    )
                    .await
                {
                    Ok(lines) => lines,
                    Err(e) => return Ok(fail("Failed to download submissions", &e)),
                };

                match output {
                    Some(path) => {
                        let mut text = lines.join("\n");
                        text.push('\n');
                        if let Err(e) = tokio::fs::write(path, text).await {
                            return Ok(fail("Failed to write submissions", &e.into()));
                        }
                        println!("✅ Wrote {} lines to {}", lines.len(), path.display());
                    }
                    None => {
                        for line in &lines {
                            println!("{line}");
                        }
                    }
                }
                Ok(EXIT_OK)
            }
        }
    }
}
