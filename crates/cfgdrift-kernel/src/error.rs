//! Error types for drift validation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message of the fatal precondition failure raised when the resource
/// declares no databases.
pub const DATABASES_PRECONDITION: &str = "spec.environment.databases not found or empty";

/// Failure of the remote command collaborator.
///
/// Always fatal for a validation run: never retried and never turned into a
/// failure record.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("{program} executable is not available in PATH")]
    NotInstalled { program: String },

    #[error("failed to execute `{command}` on {target}: {message}. stdout: {stdout}, stderr: {stderr}")]
    Failed {
        command: String,
        target: String,
        message: String,
        stdout: String,
        stderr: String,
    },

    #[error("`{command}` on {target} did not finish within {seconds}s")]
    Timeout {
        command: String,
        target: String,
        seconds: u64,
    },

    #[error("no captured output for `{command}`: {message}")]
    MissingOutput { command: String, message: String },
}

/// Failure of the desired-state collaborator.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{kind} {name} not found in namespace {namespace}")]
    NotFound {
        kind: String,
        name: String,
        namespace: String,
    },

    #[error("failed to read desired state from {origin}: {message}")]
    Read { origin: String, message: String },

    #[error("invalid desired state document at {origin}: {message}")]
    Parse { origin: String, message: String },
}

/// Drift found by a completed run: a count plus every rendered record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredFailure {
    pub message: String,
    pub details: Vec<String>,
}

impl StructuredFailure {
    pub fn from_details(details: Vec<String>) -> Self {
        Self {
            message: format!("{} checks failed", details.len()),
            details,
        }
    }
}

impl fmt::Display for StructuredFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for StructuredFailure {}

/// Everything that can stop [`crate::Validator::validate`] from returning `Ok`.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("{DATABASES_PRECONDITION}")]
    MissingDatabases,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("{0}")]
    Drift(StructuredFailure),
}
