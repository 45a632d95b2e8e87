//! `projects` commands

use super::{fail, load, print_json, report, CredentialArgs};
use crate::core::service::{RelayService, RemoteDeletion};
use crate::domain::ProjectId;
use clap::{Args, Subcommand};

#[derive(Args, Debug)]
pub struct ProjectsArgs {
    #[command(flatten)]
    pub credentials: CredentialArgs,

    #[command(subcommand)]
    pub command: ProjectsCommand,
}

#[derive(Subcommand, Debug)]
pub enum ProjectsCommand {
    /// List projects on ODK Central
    List,

    /// Create a project (named with the configured prefix)
    Create {
        /// Project name, without the prefix
        name: String,
    },

    /// Delete a project
    Delete { project_id: ProjectId },

    /// Show project details
    Details { project_id: ProjectId },
}

impl ProjectsArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        let service = RelayService::from_config(&config);
        let credentials = self.credentials.credentials();
        let credentials = credentials.as_ref();

        match &self.command {
            ProjectsCommand::List => report(
                service.list_projects(credentials).await,
                "Failed to list projects",
            ),
            ProjectsCommand::Create { name } => {
                match service.create_project(name, credentials).await {
                    Ok(project) => {
                        println!("✅ Created project {} ({})", project.name, project.id);
                        print_json(&project)
                    }
                    Err(e) => Ok(fail("Failed to create project", &e)),
                }
            }
            ProjectsCommand::Delete { project_id } => {
                let deletion = service.delete_project(*project_id, credentials).await;
                if let RemoteDeletion::SoftFailure { reason } = &deletion.remote {
                    println!("⚠️  {reason}");
                }
                print_json(&deletion)
            }
            ProjectsCommand::Details { project_id } => report(
                service.project_details(*project_id, credentials).await,
                "Failed to get project details",
            ),
        }
    }
}
