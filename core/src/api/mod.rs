//! REST surface of the task backend.

pub mod http;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::model::task::{Task, TaskDraft, TaskId};

pub use http::{ApiConfig, AuthStrategy, HttpTaskApi};

#[async_trait]
pub trait TaskApi: Send + Sync {
    /// `GET /api/tasks`
    async fn list(&self) -> Result<Vec<Task>, ApiError>;
    /// `POST /api/tasks`, returning the server's canonical record.
    async fn create(&self, draft: &TaskDraft) -> Result<Task, ApiError>;
    /// `PUT /api/tasks/{id}` with the full record.
    async fn update(&self, task: &Task) -> Result<Task, ApiError>;
    /// `DELETE /api/tasks/{id}`. Any response body is ignored.
    async fn delete(&self, id: &TaskId) -> Result<(), ApiError>;
}
