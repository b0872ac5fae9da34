//! Error types for bcstart
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, missing session, unknown id)
//! - 3: Blocked by policy (disabled reset, strict transitions, file already mapped)
//! - 4: Operation failed (backend, I/O, generation)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the bcstart CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const POLICY_BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for bcstart operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Authentication required: no active session")]
    AuthenticationRequired,

    #[error("Business not found: {0}")]
    BusinessNotFound(String),

    #[error("Todo not found: {0}")]
    TodoNotFound(String),

    #[error("Sub-area not found: {0}")]
    SubAreaNotFound(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    // Policy blocks (exit code 3)
    #[error("Status transition not allowed: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("File {file_id} is already mapped to task {task_id}")]
    FileAlreadyMapped { file_id: String, task_id: String },

    #[error("Test data reset is disabled (set dev.allow_reset = true)")]
    ResetDisabled,

    #[error("Confirmation required: {0}")]
    ConfirmationRequired(String),

    // Operation failures (exit code 4)
    #[error("Remote failure: {0}")]
    RemoteFailure(String),

    #[error("Task generation timed out after {0}s")]
    GenerationTimedOut(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::AuthenticationRequired
            | Error::BusinessNotFound(_)
            | Error::TodoNotFound(_)
            | Error::SubAreaNotFound(_)
            | Error::FileNotFound(_)
            | Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::ValidationFailed(_) => exit_codes::USER_ERROR,

            Error::InvalidTransition { .. }
            | Error::FileAlreadyMapped { .. }
            | Error::ResetDisabled
            | Error::ConfirmationRequired(_) => exit_codes::POLICY_BLOCKED,

            Error::RemoteFailure(_)
            | Error::GenerationTimedOut(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Coarse category used by callers that only need to branch on the kind
    /// of failure (and by the JSON error envelope).
    pub fn kind(&self) -> &'static str {
        match self {
            Error::AuthenticationRequired => "authentication_required",
            Error::BusinessNotFound(_)
            | Error::TodoNotFound(_)
            | Error::SubAreaNotFound(_)
            | Error::FileNotFound(_) => "not_found",
            Error::ValidationFailed(_) => "validation_failed",
            Error::InvalidConfig(_) | Error::InvalidArgument(_) => "user_error",
            Error::InvalidTransition { .. }
            | Error::FileAlreadyMapped { .. }
            | Error::ResetDisabled
            | Error::ConfirmationRequired(_) => "policy_blocked",
            Error::RemoteFailure(_)
            | Error::GenerationTimedOut(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_) => "remote_failure",
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == "not_found"
    }

    /// Structured details for the JSON error envelope
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::InvalidTransition { from, to } => {
                Some(serde_json::json!({ "from": from, "to": to }))
            }
            Error::FileAlreadyMapped { file_id, task_id } => {
                Some(serde_json::json!({ "file_id": file_id, "task_id": task_id }))
            }
            _ => None,
        }
    }
}

/// Result type alias for bcstart operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub kind: &'static str,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            kind: err.kind(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
