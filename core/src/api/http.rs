//! reqwest-backed task API client

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::api::TaskApi;
use crate::error::ApiError;
use crate::model::task::{Task, TaskDraft, TaskId};
use crate::session::Session;

/// The local development backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

const TASKS_PATH: &str = "api/tasks";

/// How requests are authenticated.
#[derive(Debug, Clone)]
pub enum AuthStrategy {
    /// No `Authorization` header.
    None,
    /// `Authorization: Bearer <token>`, token read from the session per request.
    Bearer(Session),
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub auth: AuthStrategy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth: AuthStrategy::None,
        }
    }
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_auth(mut self, auth: AuthStrategy) -> Self {
        self.auth = auth;
        self
    }
}

pub struct HttpTaskApi {
    client: Client,
    base_url: Url,
    auth: AuthStrategy,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl HttpTaskApi {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: ApiConfig) -> Result<Self, ApiError> {
        let base_url = parse_base_url(&config.base_url)?;
        Ok(Self {
            client,
            base_url,
            auth: config.auth,
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), TASKS_PATH)
    }

    fn item_url(&self, id: &TaskId) -> String {
        format!("{}/{}", self.collection_url(), urlencoding::encode(id.as_str()))
    }

    fn request(&self, method: Method, url: String) -> Result<RequestBuilder, ApiError> {
        debug!("{} {}", method, url);
        let builder = self.client.request(method, url);
        match &self.auth {
            AuthStrategy::None => Ok(builder),
            AuthStrategy::Bearer(session) => {
                let token = session.token().ok_or(ApiError::NotAuthenticated)?;
                Ok(builder.bearer_auth(token))
            }
        }
    }

    /// Sends the request and returns the body of a 2xx response.
    async fn send(&self, builder: RequestBuilder) -> Result<String, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(&body);
            warn!(status = status.as_u16(), message = ?message, "request rejected");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send(builder).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list(&self) -> Result<Vec<Task>, ApiError> {
        let builder = self.request(Method::GET, self.collection_url())?;
        self.send_json(builder).await
    }

    async fn create(&self, draft: &TaskDraft) -> Result<Task, ApiError> {
        let builder = self.request(Method::POST, self.collection_url())?.json(draft);
        self.send_json(builder).await
    }

    async fn update(&self, task: &Task) -> Result<Task, ApiError> {
        let builder = self.request(Method::PUT, self.item_url(&task.id))?.json(task);
        self.send_json(builder).await
    }

    async fn delete(&self, id: &TaskId) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, self.item_url(id))?;
        self.send(builder).await?;
        Ok(())
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let invalid = |reason: &str| ApiError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("not a base URL"));
    }
    Ok(url)
}

/// Backends answer errors with `{"message": "..."}`; fall back to raw text.
fn error_message(body: &str) -> Option<String> {
    if let Ok(ErrorBody { message: Some(message) }) = serde_json::from_str(body) {
        return Some(message);
    }
    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
