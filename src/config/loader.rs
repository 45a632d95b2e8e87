//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::RelayConfig;
use super::secret_string;
use crate::domain::errors::RelayError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into RelayConfig
/// 4. Applies environment variable overrides (`ODK_CENTRAL_*`, `ODK_RELAY_*`)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file cannot be read, a referenced environment
/// variable is unset, TOML parsing fails, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use odk_relay::config::loader::load_config;
///
/// let config = load_config("odk-relay.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<RelayConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(RelayError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        RelayError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: RelayConfig = toml::from_str(&contents)
        .map_err(|e| RelayError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        RelayError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied through untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| RelayError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let processed = re.replace_all(line, |cap: &regex::Captures<'_>| {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        lines.push(processed.into_owned());
    }

    if !missing_vars.is_empty() {
        return Err(RelayError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

/// Applies environment variable overrides
///
/// The default Central connection honours the same variables the web backend
/// uses (`ODK_CENTRAL_URL`, `ODK_CENTRAL_USER`, `ODK_CENTRAL_PASSWD`). Other
/// settings follow the pattern `ODK_RELAY_<SECTION>_<KEY>`.
fn apply_env_overrides(config: &mut RelayConfig) {
    if let Ok(val) = std::env::var("ODK_CENTRAL_URL") {
        config.central.url = val;
    }
    if let Ok(val) = std::env::var("ODK_CENTRAL_USER") {
        config.central.user = val;
    }
    if let Ok(val) = std::env::var("ODK_CENTRAL_PASSWD") {
        config.central.password = secret_string(val);
    }

    if let Ok(val) = std::env::var("ODK_RELAY_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("ODK_RELAY_CENTRAL_TIMEOUT_SECONDS") {
        if let Ok(timeout) = val.parse() {
            config.central.timeout_seconds = timeout;
        }
    }

    if let Ok(val) = std::env::var("ODK_RELAY_FORMS_STAGING_DIR") {
        config.forms.staging_dir = PathBuf::from(val);
    }
    if let Ok(val) = std::env::var("ODK_RELAY_FORMS_CONVERTER_COMMAND") {
        config.forms.converter_command = val;
    }

    if let Ok(val) = std::env::var("ODK_RELAY_DATABASE_CONNECTION_STRING") {
        match config.database {
            Some(ref mut database) => database.connection_string = secret_string(val),
            None => {
                config.database = Some(super::schema::PostgreSQLConfig {
                    connection_string: secret_string(val),
                    max_connections: 4,
                    connection_timeout_seconds: 30,
                })
            }
        }
    }

    if let Ok(val) = std::env::var("ODK_RELAY_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("ODK_RELAY_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("ODK_RELAY_LOADER_TEST_VAR", "test_value");
        let input = "password = \"${ODK_RELAY_LOADER_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "password = \"test_value\"");
        std::env::remove_var("ODK_RELAY_LOADER_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("ODK_RELAY_LOADER_MISSING_VAR");
        let input = "password = \"${ODK_RELAY_LOADER_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("ODK_RELAY_LOADER_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_env_vars_skips_comments() {
        std::env::remove_var("ODK_RELAY_LOADER_COMMENTED");
        let input = "# password = \"${ODK_RELAY_LOADER_COMMENTED}\"\nuser = \"a\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, input);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[central]
url = "https://central.example.org"
user = "admin@example.org"
password = "pass"

[forms]
staging_dir = "/tmp/odk-relay-test"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.central.project_name_prefix, "FMTM");
        assert_eq!(config.central.password.expose_secret(), "pass");
        assert_eq!(config.forms.staging_dir, PathBuf::from("/tmp/odk-relay-test"));
        assert!(config.database.is_none());
    }
}
