//! `app-users` commands

use super::{load, report, CredentialArgs};
use crate::core::service::RelayService;
use crate::domain::{ProjectId, XFormId};
use clap::{Args, Subcommand};

#[derive(Args, Debug)]
pub struct AppUsersArgs {
    #[command(flatten)]
    pub credentials: CredentialArgs,

    #[command(subcommand)]
    pub command: AppUsersCommand,
}

#[derive(Subcommand, Debug)]
pub enum AppUsersCommand {
    /// List the app users of a project
    List { project_id: ProjectId },

    /// Delete an app user by display name
    Delete {
        project_id: ProjectId,
        display_name: String,
    },

    /// Create an app user for a form and print its token
    Token {
        project_id: ProjectId,
        form_id: XFormId,
    },
}

impl AppUsersArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        let service = RelayService::from_config(&config);
        let credentials = self.credentials.credentials();
        let credentials = credentials.as_ref();

        match &self.command {
            AppUsersCommand::List { project_id } => report(
                service.list_app_users(*project_id, credentials).await,
                "Failed to list app users",
            ),
            AppUsersCommand::Delete {
                project_id,
                display_name,
            } => report(
                service
                    .delete_app_user(*project_id, display_name, credentials)
                    .await,
                "Failed to delete app user",
            ),
            AppUsersCommand::Token {
                project_id,
                form_id,
            } => report(
                service
                    .create_app_user_token(*project_id, form_id, credentials)
                    .await,
                "Failed to create app user",
            ),
        }
    }
}
