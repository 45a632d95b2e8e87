//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the odk-relay configuration file.

use crate::adapters::postgresql::PostgreSQLClient;
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates as well
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  ODK Central: {}", config.central.url);
        println!("  ODK Central User: {}", config.central.user);
        println!("  Project Prefix: {}", config.central.project_name_prefix);
        println!("  Converter: {}", config.forms.converter_command);
        println!("  Staging Directory: {}", config.forms.staging_dir.display());
        println!(
            "  Geometry Columns: {:?}",
            config.submissions.geometry_columns
        );

        match config.database {
            Some(ref pg_config) => match PostgreSQLClient::new(pg_config.clone()) {
                Ok(client) => {
                    println!("  Form Catalog: {}", client.connection_string_safe());
                    println!("  Max Connections: {}", pg_config.max_connections);
                }
                Err(e) => {
                    println!("❌ Invalid form catalog settings");
                    println!("   Error: {e}");
                    return Ok(2);
                }
            },
            None => println!("  Form Catalog: not configured"),
        }

        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_configuration_error() {
        let code = ValidateArgs {}
            .execute("/nonexistent/odk-relay.toml")
            .await
            .unwrap();
        assert_eq!(code, 2);
    }
}
