//! XLSForm → XForm converters

use crate::domain::{RelayError, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// Converts a spreadsheet form into an XForm file
#[async_trait]
pub trait XlsFormConverter: Send + Sync {
    /// Write the XForm for `source` to `output`
    ///
    /// `validate` runs the converter's own form validation; it is off in the
    /// publish path and on for the validity check.
    async fn convert(&self, source: &Path, output: &Path, validate: bool) -> Result<()>;
}

/// Runs pyxform's `xls2xform` executable
#[derive(Debug, Clone)]
pub struct Xls2XformCommand {
    program: String,
}

impl Xls2XformCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, source: &Path, output: &Path, validate: bool) -> Command {
        let mut command = Command::new(&self.program);
        command.arg(source).arg(output);
        if !validate {
            command.arg("--skip_validate");
        }
        command.kill_on_drop(true);
        command
    }
}

impl Default for Xls2XformCommand {
    fn default() -> Self {
        Self::new("xls2xform")
    }
}

#[async_trait]
impl XlsFormConverter for Xls2XformCommand {
    async fn convert(&self, source: &Path, output: &Path, validate: bool) -> Result<()> {
        tracing::debug!(
            program = %self.program,
            source = %source.display(),
            output = %output.display(),
            validate,
            "Running XLSForm converter"
        );

        let result = self
            .command(source, output, validate)
            .output()
            .await
            .map_err(|e| RelayError::Io(format!("Failed to run {}: {e}", self.program)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let stdout = String::from_utf8_lossy(&result.stdout);
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(RelayError::Conversion(format!(
                "{} exited with {}: {detail}",
                self.program, result.status
            )));
        }

        Ok(())
    }
}
