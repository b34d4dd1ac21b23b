//! Compiler report parsing and the error-highlighting capability.
//!
//! The compiler, run with `--report=json`, prints one JSON array of errors per
//! line, interleaved with plain progress lines:
//!
//! ```text
//! [{"type":"error","file":"src/Main.elm","region":{"start":{"line":3,"column":5},...},"overview":"...","details":"..."}]
//! Successfully generated /dev/null
//! ```
//!
//! [`parse_report`] turns that stream into [`ReportEntry`]s; [`ReportFormat`]
//! renders them for a text panel; an [`ErrorHighlighter`] marks them in the
//! editor when one is available.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Deserialize;
use tracing::debug;

use crate::{error::ToolError, indexer::capture_output};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Region {
    pub start: Location,
    pub end: Option<Location>,
}

/// One problem reported by the compiler. Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompileError {
    #[serde(rename = "type")]
    pub kind: String,
    pub file: String,
    pub region: Region,
    pub overview: String,
    #[serde(default)]
    pub details: String,
}

static NEWLINE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n+").unwrap());

impl CompileError {
    pub fn line(&self) -> u32 {
        self.region.start.line
    }

    pub fn column(&self) -> u32 {
        self.region.start.column
    }

    /// The overview, followed by the details with blank lines collapsed.
    pub fn message(&self) -> String {
        match self.details.is_empty() {
            true => self.overview.clone(),
            false => format!(
                "{}\n{}",
                self.overview,
                NEWLINE_RUNS.replace_all(&self.details, "\n")
            ),
        }
    }

    /// The reported file, relative to the directory the compiler ran in.
    pub fn path(&self, working_dir: &Path) -> PathBuf {
        working_dir.join(&self.file)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEntry {
    Info(String),
    Error(CompileError),
}

/// Parse compiler output. Blank lines are dropped; lines that are not a JSON
/// error array are kept as [`ReportEntry::Info`].
pub fn parse_report(output: &str) -> Vec<ReportEntry> {
    output
        .lines()
        .flat_map(|line| match serde_json::from_str::<Vec<CompileError>>(line) {
            Ok(errors) => errors.into_iter().map(ReportEntry::Error).collect(),
            Err(_) => {
                let info = line.trim();
                if info.is_empty() {
                    return vec![];
                }
                debug!(line = info, "report line is not a JSON error list");
                vec![ReportEntry::Info(info.to_string())]
            }
        })
        .collect()
}

pub fn compile_errors(entries: &[ReportEntry]) -> Vec<CompileError> {
    entries
        .iter()
        .filter_map(|entry| match entry {
            ReportEntry::Error(error) => Some(error.clone()),
            ReportEntry::Info(_) => None,
        })
        .collect()
}

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$(\w+)").unwrap());

/// Output templates for a report panel.
///
/// `info` sees `$info`; `error` sees `$type`, `$file`, `$line`, `$column`,
/// `$overview`, `$details` and `$message`. Unknown placeholders are left as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFormat {
    pub info: String,
    pub error: String,
}

impl Default for ReportFormat {
    fn default() -> Self {
        ReportFormat {
            info: "$info".to_string(),
            error: "$file:$line:$column: $type: $message".to_string(),
        }
    }
}

impl ReportFormat {
    pub fn render(&self, entry: &ReportEntry) -> String {
        match entry {
            ReportEntry::Info(info) => substitute(&self.info, &HashMap::from([("info", info.clone())])),
            ReportEntry::Error(error) => substitute(
                &self.error,
                &HashMap::from([
                    ("type", error.kind.clone()),
                    ("file", error.file.clone()),
                    ("line", error.line().to_string()),
                    ("column", error.column().to_string()),
                    ("overview", error.overview.clone()),
                    ("details", error.details.clone()),
                    ("message", error.message()),
                ]),
            ),
        }
    }

    pub fn render_all(&self, entries: &[ReportEntry]) -> Vec<String> {
        entries.iter().map(|entry| self.render(entry)).collect()
    }
}

fn substitute(template: &str, values: &HashMap<&str, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            values
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Run `make_command <file> --report=json --output=/dev/null` in the file's directory.
///
/// A failing build still yields its report; only a run without any output is an error.
pub fn run_make(make_command: &str, file: &Path) -> Result<Vec<ReportEntry>, ToolError> {
    let file_arg = file.to_string_lossy();
    let output = capture_output(
        make_command,
        &[file_arg.as_ref(), "--report=json", "--output=/dev/null"],
        file.parent(),
    )?;

    let stdout = String::from_utf8(output.stdout)?;
    if stdout.trim().is_empty() {
        return Err(match output.status.success() {
            true => ToolError::EmptyOutput {
                program: make_command.to_string(),
            },
            false => ToolError::NonZeroExit {
                program: make_command.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            },
        });
    }
    Ok(parse_report(&stdout))
}

/// Marks compiler errors in the editor.
///
/// `errors` is the complete set for `file`; an empty slice clears earlier marks.
pub trait ErrorHighlighter: Send + Sync {
    fn highlight(&self, file: &Path, working_dir: &Path, errors: &[CompileError]);
}

/// Used when the editor cannot show diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHighlighter;

impl ErrorHighlighter for NoopHighlighter {
    fn highlight(&self, _file: &Path, _working_dir: &Path, _errors: &[CompileError]) {}
}
