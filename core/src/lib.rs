pub mod api;
pub mod error;
pub mod form;
pub mod model;
pub mod repository;
pub mod service;
pub mod session;
pub mod time;

pub use api::http::DEFAULT_BASE_URL;
pub use api::{ApiConfig, AuthStrategy, HttpTaskApi, TaskApi};
pub use error::{ApiError, FormError, StoreError};
pub use form::{Field, FormSubmission, TaskForm};
pub use model::task::{Task, TaskDraft, TaskId, TaskStatus};
pub use repository::{data_dir, FileTokenStore, TokenStore};
pub use service::task_store::{Operation, SyncMode, TaskStore};
pub use session::Session;
pub use time::{format_deadline, parse_deadline};
