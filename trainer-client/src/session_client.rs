//! HTTP client for the identity service.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use shared::models::{
    IsAdminResponse, LoginRequest, LoginResponse, ProfileRecord, RegisterRequest,
    error_message_from_text,
};

use crate::{
    auth::AuthError,
    token_store::{Credential, TokenStore},
};

const ALREADY_EXISTS_MESSAGE: &str = "An account with this email already exists";
const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";
const MISSING_TOKEN_MESSAGE: &str = "identity service did not return a token";

/// Calls the session state machine makes against the identity service.
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Creates an account. The response body is ignored.
    ///
    /// # Errors
    /// [`AuthError::AlreadyExists`] on 409, [`AuthError::ServerError`] on any
    /// other non-success status.
    async fn register(&self, payload: &RegisterRequest) -> Result<(), AuthError>;

    /// Exchanges email and password for a bearer credential.
    ///
    /// # Errors
    /// [`AuthError::InvalidCredentials`] on 401/403, [`AuthError::ServerError`]
    /// otherwise.
    async fn login(&self, email: &str, password: &str) -> Result<Credential, AuthError>;

    /// Fetches the profile of the credential holder, without the admin flag.
    ///
    /// # Errors
    /// [`AuthError::SessionRejected`] on 401/403.
    async fn fetch_profile(&self) -> Result<ProfileRecord, AuthError>;

    /// Looks up whether `user_id` has admin rights.
    ///
    /// # Errors
    /// Any failure; callers treat it as "not an admin".
    async fn fetch_is_admin(&self, user_id: i64) -> Result<bool, AuthError>;
}

/// [`IdentityApi`] over HTTP, attaching the stored credential to every call.
#[derive(Clone, Debug)]
pub struct HttpSessionClient {
    base_url: String,
    client: Client,
    store: Arc<dyn TokenStore>,
}

impl HttpSessionClient {
    /// Creates a client for the identity service at `base_url`.
    pub fn new(base_url: &str, store: Arc<dyn TokenStore>) -> Self {
        Self::with_client(base_url, Client::new(), store)
    }

    /// Like [`HttpSessionClient::new`] but reusing a configured [`Client`].
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

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.store.get() {
            Some(credential) => request.bearer_auth(credential.expose()),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, AuthError> {
        self.authorize(request)
            .send()
            .await
            .map_err(|err| AuthError::NetworkError(err.to_string()))
    }
}

#[async_trait]
impl IdentityApi for HttpSessionClient {
    async fn register(&self, payload: &RegisterRequest) -> Result<(), AuthError> {
        let url = self.api_url("register");
        let response = self.send(self.client.post(url).json(payload)).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = failure_message(response).await;
        tracing::debug!(%status, "registration rejected");
        if status == StatusCode::CONFLICT {
            return Err(AuthError::AlreadyExists {
                message: message.unwrap_or_else(|| ALREADY_EXISTS_MESSAGE.to_string()),
            });
        }
        Err(AuthError::ServerError {
            status: Some(status.as_u16()),
            message: message.unwrap_or_else(|| format!("registration failed ({status})")),
        })
    }

    async fn login(&self, email: &str, password: &str) -> Result<Credential, AuthError> {
        let url = self.api_url("login");
        let payload = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.send(self.client.post(url).json(&payload)).await?;
        let status = response.status();

        if status.is_success() {
            let body: LoginResponse = response.json().await.map_err(|err| AuthError::ServerError {
                status: Some(status.as_u16()),
                message: format!("malformed login response: {err}"),
            })?;
            return body
                .into_token()
                .map(Credential::new)
                .ok_or_else(|| AuthError::ServerError {
                    status: Some(status.as_u16()),
                    message: MISSING_TOKEN_MESSAGE.to_string(),
                });
        }

        let message = failure_message(response).await;
        if is_rejection(status) {
            return Err(AuthError::InvalidCredentials {
                message: message.unwrap_or_else(|| INVALID_CREDENTIALS_MESSAGE.to_string()),
            });
        }
        Err(AuthError::ServerError {
            status: Some(status.as_u16()),
            message: message.unwrap_or_else(|| format!("login failed ({status})")),
        })
    }

    async fn fetch_profile(&self) -> Result<ProfileRecord, AuthError> {
        let url = self.api_url("me");
        let response = self.send(self.client.get(url)).await?;
        let status = response.status();

        if is_rejection(status) {
            return Err(AuthError::SessionRejected {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let message = failure_message(response).await;
            return Err(AuthError::ServerError {
                status: Some(status.as_u16()),
                message: message.unwrap_or_else(|| format!("profile request failed ({status})")),
            });
        }
        response.json().await.map_err(|err| AuthError::ServerError {
            status: Some(status.as_u16()),
            message: format!("malformed profile response: {err}"),
        })
    }

    async fn fetch_is_admin(&self, user_id: i64) -> Result<bool, AuthError> {
        let url = self.api_url(&format!("is-admin/{user_id}"));
        let response = self.send(self.client.get(url)).await?;
        let status = response.status();
        if !status.is_success() {
            let message = failure_message(response).await;
            return Err(AuthError::ServerError {
                status: Some(status.as_u16()),
                message: message.unwrap_or_else(|| format!("admin lookup failed ({status})")),
            });
        }
        let body: IsAdminResponse = response.json().await.map_err(|err| AuthError::ServerError {
            status: Some(status.as_u16()),
            message: format!("malformed admin flag response: {err}"),
        })?;
        Ok(body.is_admin)
    }
}

fn is_rejection(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

async fn failure_message(response: Response) -> Option<String> {
    let text = response.text().await.unwrap_or_default();
    error_message_from_text(&text)
}
