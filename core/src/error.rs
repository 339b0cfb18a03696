//! Error types for the core library

use thiserror::Error;

use crate::model::task::TaskId;

/// Failures talking to the task backend.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server returned {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Status { status: u16, message: Option<String> },

    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::NotAuthenticated) || self.status() == Some(401)
    }
}

/// Failures of a task list operation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Task title must not be empty")]
    EmptyTitle,

    #[error("Task not found: {0}")]
    NotFound(TaskId),

    #[error("No task is being edited")]
    NotEditing,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Change saved, but reloading the task list failed: {0}")]
    ReloadFailed(#[source] ApiError),
}

impl StoreError {
    /// Validation failures are rejected before any request goes out.
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::EmptyTitle)
    }

    /// The server accepted the mutation; only the follow-up fetch failed.
    pub fn is_committed(&self) -> bool {
        matches!(self, StoreError::ReloadFailed(_))
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum FormError {
    #[error("Invalid deadline '{input}': {reason}")]
    InvalidDeadline { input: String, reason: String },
}
