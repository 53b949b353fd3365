//! Client for the core resource service: topics, assignments, attempts and
//! the admin views.
//!
//! Response bodies are handed back as [`serde_json::Value`]; this crate only
//! cares that the stored credential is attached and that failures carry a
//! readable message.

use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use shared::models::{AttemptRequest, error_message_from_text};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::token_store::TokenStore;

/// Failure of a core service call.
#[derive(Debug, Error)]
pub enum CoreApiError {
    /// Non-success answer.
    #[error("{message} ({status} from {path})")]
    Status {
        /// Requested path, with a leading slash.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Message from the body, or the status reason.
        message: String,
    },
    /// The request never produced a response.
    #[error("core service unreachable: {0}")]
    Network(String),
    /// A success answer whose body was not JSON.
    #[error("unexpected response from {path}: {message}")]
    Decode {
        /// Requested path.
        path: String,
        /// Decoder diagnostic.
        message: String,
    },
}

impl CoreApiError {
    /// Whether the service refused the credential.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CoreApiError::Status { status: 401 | 403, .. })
    }

    /// HTTP status, for [`CoreApiError::Status`] only.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            CoreApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Filters for `GET /topics`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct TopicQuery {
    /// Substring searched in title and description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    /// Exact difficulty label, e.g. `easy`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

/// Filters for `GET /assignments`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct AssignmentQuery {
    /// Substring searched in title and description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    /// Only assignments of this topic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<i64>,
}

/// Paging for the admin log listings. The service caps `limit` itself.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct LogQuery {
    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Entries to skip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

/// Authenticated client for the core service.
#[derive(Clone, Debug)]
pub struct CoreClient {
    base_url: String,
    client: Client,
    store: Arc<dyn TokenStore>,
}

impl CoreClient {
    /// Client for `base_url` with a default HTTP client.
    #[must_use]
    pub fn new(base_url: &str, store: Arc<dyn TokenStore>) -> Self {
        Self::with_client(base_url, Client::new(), store)
    }

    /// Client for `base_url` sharing an existing HTTP client. Every request
    /// carries the credential found in `store` at send time.
    #[must_use]
    pub fn with_client(base_url: &str, client: Client, store: Arc<dyn TokenStore>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            store,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `GET /topics`
    ///
    /// # Errors
    /// See [`CoreApiError`].
    #[instrument(skip(self))]
    pub async fn list_topics(&self, query: &TopicQuery) -> Result<Value, CoreApiError> {
        self.get_json("topics", Some(query)).await
    }

    /// `GET /topics/{id}`, the topic together with its assignments.
    ///
    /// # Errors
    /// See [`CoreApiError`].
    #[instrument(skip(self))]
    pub async fn get_topic(&self, topic_id: i64) -> Result<Value, CoreApiError> {
        self.get_json::<()>(&format!("topics/{topic_id}"), None).await
    }

    /// `GET /topics/{id}/assignments`
    ///
    /// # Errors
    /// See [`CoreApiError`].
    #[instrument(skip(self))]
    pub async fn topic_assignments(&self, topic_id: i64) -> Result<Value, CoreApiError> {
        self.get_json::<()>(&format!("topics/{topic_id}/assignments"), None)
            .await
    }

    /// `POST /topics`. Admin only; answers with the new `topic_id`.
    ///
    /// # Errors
    /// See [`CoreApiError`].
    #[instrument(skip(self, topic))]
    pub async fn create_topic(&self, topic: &Value) -> Result<Value, CoreApiError> {
        self.send_json(Method::POST, "topics", Some(topic)).await
    }

    /// `PUT /topics/{id}`. Only the fields present in `changes` are updated.
    ///
    /// # Errors
    /// See [`CoreApiError`].
    #[instrument(skip(self, changes))]
    pub async fn update_topic(
        &self,
        topic_id: i64,
        changes: &Value,
    ) -> Result<Value, CoreApiError> {
        self.send_json(Method::PUT, &format!("topics/{topic_id}"), Some(changes))
            .await
    }

    /// `DELETE /topics/{id}`
    ///
    /// # Errors
    /// See [`CoreApiError`].
    #[instrument(skip(self))]
    pub async fn delete_topic(&self, topic_id: i64) -> Result<Value, CoreApiError> {
        self.send_json(Method::DELETE, &format!("topics/{topic_id}"), None)
            .await
    }

    /// `GET /assignments`
    ///
    /// # Errors
    /// See [`CoreApiError`].
    #[instrument(skip(self))]
    pub async fn list_assignments(&self, query: &AssignmentQuery) -> Result<Value, CoreApiError> {
        self.get_json("assignments", Some(query)).await
    }

    /// `GET /assignments/{id}`
    ///
    /// # Errors
    /// See [`CoreApiError`].
    #[instrument(skip(self))]
    pub async fn get_assignment(&self, assignment_id: i64) -> Result<Value, CoreApiError> {
        self.get_json::<()>(&format!("assignments/{assignment_id}"), None)
            .await
    }

    /// `POST /assignments`. Admin only; `topic_id` and `title` are required
    /// by the service.
    ///
    /// # Errors
    /// See [`CoreApiError`].
    #[instrument(skip(self, assignment))]
    pub async fn create_assignment(&self, assignment: &Value) -> Result<Value, CoreApiError> {
        self.send_json(Method::POST, "assignments", Some(assignment))
            .await
    }

    /// `PUT /assignments/{id}`. Sending `tests` replaces the whole test set.
    ///
    /// # Errors
    /// See [`CoreApiError`].
    #[instrument(skip(self, changes))]
    pub async fn update_assignment(
        &self,
        assignment_id: i64,
        changes: &Value,
    ) -> Result<Value, CoreApiError> {
        self.send_json(
            Method::PUT,
            &format!("assignments/{assignment_id}"),
            Some(changes),
        )
        .await
    }

    /// `DELETE /assignments/{id}`
    ///
    /// # Errors
    /// See [`CoreApiError`].
    #[instrument(skip(self))]
    pub async fn delete_assignment(&self, assignment_id: i64) -> Result<Value, CoreApiError> {
        self.send_json(Method::DELETE, &format!("assignments/{assignment_id}"), None)
            .await
    }

    /// `GET /assignments/{id}/schema`, the collections the assignment runs against.
    ///
    /// # Errors
    /// See [`CoreApiError`].
    #[instrument(skip(self))]
    pub async fn assignment_schema(&self, assignment_id: i64) -> Result<Value, CoreApiError> {
        self.get_json::<()>(&format!("assignments/{assignment_id}/schema"), None)
            .await
    }

    /// `POST /assignments/{id}/attempts`. The verdict comes back as-is.
    ///
    /// # Errors
    /// See [`CoreApiError`].
    #[instrument(skip(self, attempt))]
    pub async fn submit_attempt(
        &self,
        assignment_id: i64,
        attempt: &AttemptRequest,
    ) -> Result<Value, CoreApiError> {
        let path = format!("assignments/{assignment_id}/attempts");
        let request = self.client.post(self.api_url(&path)).json(attempt);
        self.execute(&path, request).await
    }

    /// `GET /assignments/{id}/attempts`, the caller's attempt history.
    ///
    /// # Errors
    /// See [`CoreApiError`].
    #[instrument(skip(self))]
    pub async fn list_attempts(&self, assignment_id: i64) -> Result<Value, CoreApiError> {
        self.get_json::<()>(&format!("assignments/{assignment_id}/attempts"), None)
            .await
    }

    /// `GET /admin/logs`
    ///
    /// # Errors
    /// See [`CoreApiError`].
    #[instrument(skip(self))]
    pub async fn admin_logs(&self, query: &LogQuery) -> Result<Value, CoreApiError> {
        self.get_json("admin/logs", Some(query)).await
    }

    /// `GET /admin/logs/{id}`
    ///
    /// # Errors
    /// See [`CoreApiError`].
    #[instrument(skip(self))]
    pub async fn admin_log(&self, log_id: i64) -> Result<Value, CoreApiError> {
        self.get_json::<()>(&format!("admin/logs/{log_id}"), None).await
    }

    /// `GET /admin/assignments/{id}/request-logs`
    ///
    /// # Errors
    /// See [`CoreApiError`].
    #[instrument(skip(self))]
    pub async fn assignment_request_logs(
        &self,
        assignment_id: i64,
        query: &LogQuery,
    ) -> Result<Value, CoreApiError> {
        self.get_json(
            &format!("admin/assignments/{assignment_id}/request-logs"),
            Some(query),
        )
        .await
    }

    /// `GET /admin/users`
    ///
    /// # Errors
    /// See [`CoreApiError`].
    #[instrument(skip(self))]
    pub async fn admin_users(&self) -> Result<Value, CoreApiError> {
        self.get_json::<()>("admin/users", None).await
    }

    /// `GET /admin/users/{id}`, proxied to the identity service.
    ///
    /// # Errors
    /// See [`CoreApiError`].
    #[instrument(skip(self))]
    pub async fn admin_user(&self, user_id: i64) -> Result<Value, CoreApiError> {
        self.get_json::<()>(&format!("admin/users/{user_id}"), None)
            .await
    }

    /// `PUT /admin/users/{id}`
    ///
    /// # Errors
    /// See [`CoreApiError`].
    #[instrument(skip(self, changes))]
    pub async fn update_admin_user(
        &self,
        user_id: i64,
        changes: &Value,
    ) -> Result<Value, CoreApiError> {
        self.send_json(Method::PUT, &format!("admin/users/{user_id}"), Some(changes))
            .await
    }

    /// `DELETE /admin/users/{id}`
    ///
    /// # Errors
    /// See [`CoreApiError`].
    #[instrument(skip(self))]
    pub async fn delete_admin_user(&self, user_id: i64) -> Result<Value, CoreApiError> {
        self.send_json(Method::DELETE, &format!("admin/users/{user_id}"), None)
            .await
    }

    async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, CoreApiError> {
        let mut request = self.client.request(method, self.api_url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute(path, request).await
    }

    async fn get_json<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: Option<&Q>,
    ) -> Result<Value, CoreApiError> {
        let mut request = self.client.get(self.api_url(path));
        if let Some(query) = query {
            request = request.query(query);
        }
        self.execute(path, request).await
    }

    async fn execute(&self, path: &str, request: RequestBuilder) -> Result<Value, CoreApiError> {
        let request = match self.store.get() {
            Some(credential) => request.bearer_auth(credential.expose()),
            None => request,
        };
        let response = request
            .send()
            .await
            .map_err(|err| CoreApiError::Network(err.to_string()))?;
        let status = response.status();
        debug!(path, %status, "core service responded");

        if !status.is_success() {
            return Err(status_error(path, status, response).await);
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        response.json().await.map_err(|err| CoreApiError::Decode {
            path: path.to_string(),
            message: err.to_string(),
        })
    }
}

async fn status_error(path: &str, status: StatusCode, response: Response) -> CoreApiError {
    let message = response
        .text()
        .await
        .ok()
        .and_then(|text| error_message_from_text(&text))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    CoreApiError::Status {
        path: format!("/{path}"),
        status: status.as_u16(),
        message,
    }
}
