//! Error types shared across the engine.
//!
//! Only start-up problems ([`CorpusError::PreludeNotFound`], unreadable corpus
//! files) are meant to reach the user. Everything else is logged and degrades
//! to "no result".

use std::{path::PathBuf, process::ExitStatus};

use thiserror::Error;

/// A single declaration string did not have the expected shape.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DeclarationError {
    #[error("malformed declaration `{raw}`: missing `{separator}`")]
    MalformedDeclaration {
        raw: String,
        separator: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("could not read declaration corpus {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("declaration corpus {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// There is no `Basics` module, so the implicit imports are unknown.
    #[error("prelude module `Basics` not found in the declaration corpus")]
    PreludeNotFound,
}

/// Failures of an external tool run (inference oracle or compiler).
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}: {stderr}")]
    NonZeroExit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("`{program}` produced no output")]
    EmptyOutput { program: String },

    #[error("could not parse tool output: {0}")]
    Unparsable(#[from] serde_json::Error),

    #[error("tool output is not valid UTF-8")]
    NotUtf8(#[from] std::string::FromUtf8Error),
}
