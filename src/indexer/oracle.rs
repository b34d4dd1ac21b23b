//! The external inference tool boundary.
//!
//! The tool is run once per file with the file path and an empty query, in the
//! file's directory, and prints declaration records as UTF-8 JSON: either one
//! array of records or one record per line.

use std::{
    path::Path,
    process::{Command, Output, Stdio},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ToolError;

/// One declaration reported by the inference tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceRecord {
    pub name: String,
    pub full_name: String,
    pub signature: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub href: String,
}

impl InferenceRecord {
    /// `Dict.map : (a -> b) -> Dict k a -> Dict k b`
    pub fn render(&self) -> String {
        format!("{} : {}", self.full_name, self.signature)
    }
}

/// Something that produces raw inference output for a source file.
///
/// Runs on a blocking worker thread.
pub trait InferenceTool: Send + Sync {
    fn name(&self) -> &str;

    fn run(&self, file: &Path) -> Result<String, ToolError>;
}

/// `elm-oracle <file> ""` run as a subprocess.
#[derive(Debug, Clone)]
pub struct OracleCommand {
    program: String,
}

impl OracleCommand {
    pub fn new(program: impl Into<String>) -> OracleCommand {
        OracleCommand {
            program: program.into(),
        }
    }
}

impl InferenceTool for OracleCommand {
    fn name(&self) -> &str {
        &self.program
    }

    fn run(&self, file: &Path) -> Result<String, ToolError> {
        let file_arg = file.to_string_lossy();
        run_command(&self.program, &[file_arg.as_ref(), ""], file.parent())
    }
}

/// Run `program` to completion, whatever its exit status.
pub(crate) fn capture_output(
    program: &str,
    args: &[&str],
    working_dir: Option<&Path>,
) -> Result<Output, ToolError> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = working_dir.filter(|dir| !dir.as_os_str().is_empty()) {
        command.current_dir(dir);
    }

    debug!(program, ?args, "running external tool");
    command.output().map_err(|source| ToolError::Spawn {
        program: program.to_string(),
        source,
    })
}

/// Run `program` to completion and return its trimmed standard output.
pub(crate) fn run_command(
    program: &str,
    args: &[&str],
    working_dir: Option<&Path>,
) -> Result<String, ToolError> {
    let output = capture_output(program, args, working_dir)?;

    if !output.status.success() {
        return Err(ToolError::NonZeroExit {
            program: program.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8(output.stdout)?;
    let stdout = stdout.trim();
    if stdout.is_empty() {
        return Err(ToolError::EmptyOutput {
            program: program.to_string(),
        });
    }
    Ok(stdout.to_string())
}

/// Parse tool output in either supported shape.
pub fn parse_inference_output(output: &str) -> Result<Vec<InferenceRecord>, ToolError> {
    let output = output.trim();

    if output.starts_with('[') {
        return Ok(serde_json::from_str(output)?);
    }

    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_str(line).map_err(ToolError::from))
        .collect()
}
