//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for odk-relay using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// odk-relay - field mapping forms and submissions on ODK Central
#[derive(Parser, Debug)]
#[command(name = "odk-relay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "odk-relay.toml", env = "ODK_RELAY_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "ODK_RELAY_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Manage ODK Central projects
    Projects(commands::projects::ProjectsArgs),

    /// Convert, publish and manage forms
    Forms(commands::forms::FormsArgs),

    /// Manage app users and their tokens
    AppUsers(commands::app_users::AppUsersArgs),

    /// List, download and convert submissions
    Submissions(commands::submissions::SubmissionsArgs),
}
