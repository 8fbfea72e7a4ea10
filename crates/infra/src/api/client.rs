//! Browser API client with one-shot token refresh
//!
//! Attaches the auth context's bearer token to every call. On the first 401
//! it asks the context to refresh and re-issues the identical request once;
//! a second 401, or a failed refresh, sends the user to the login route.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::RwLock;
use querydesk_domain::{ApiErrorResponse, BackendConfig};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use super::auth::{AuthContext, LoginRedirect};
use super::cancel::AbortSignal;
use super::errors::ApiError;
use super::request::{ApiRequest, MultipartForm, RequestBody};
use crate::http::HttpClient;

/// Position of an attempt within one logical call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// Initial send with the current token
    First,
    /// Re-issue after a token refresh; never refreshes again
    Retry,
}

impl Attempt {
    /// Whether a 401 on this attempt may trigger a token refresh
    pub fn allows_refresh(self) -> bool {
        matches!(self, Self::First)
    }
}

/// Authenticated JSON client for the QueryDesk backend
pub struct ApiClient {
    http_client: HttpClient,
    auth: Arc<dyn AuthContext>,
    redirect: Arc<dyn LoginRedirect>,
    config: BackendConfig,
    signal: RwLock<AbortSignal>,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HttpClient cannot be created
    pub fn new(
        config: BackendConfig,
        auth: Arc<dyn AuthContext>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Result<Self, ApiError> {
        let mut builder = HttpClient::builder();
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        let http_client = builder
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {}", e)))?;

        Ok(Self { http_client, auth, redirect, config, signal: RwLock::new(AbortSignal::new()) })
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Backend settings this client was built with
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Absolute URL for an API path
    pub fn url_for(&self, path: &str) -> String {
        self.config.url_for(path)
    }

    /// Signal that requests issued from now on are bound to
    pub fn abort_signal(&self) -> AbortSignal {
        self.signal.read().clone()
    }

    /// Abort every in-flight request and issue a fresh signal for later ones
    pub fn clear_abort_signal(&self) {
        let previous = std::mem::take(&mut *self.signal.write());
        previous.abort();
        debug!("Abort signal cleared");
    }

    /// Execute a request and decode the JSON response.
    ///
    /// Resolves to `Ok(None)` without touching the network when the auth
    /// context has no token. 204/205 responses and empty bodies decode from
    /// JSON `null`, so `()` and `Option<_>` targets succeed.
    ///
    /// # Errors
    ///
    /// - `ApiError::Api` / `ApiError::Unhandled` for non-2xx answers
    /// - `ApiError::Unauthorized` / `ApiError::RefreshFailed` when the session
    ///   cannot be recovered (the login redirect has already fired)
    /// - `ApiError::Auth` when the auth context fails to produce a token
    /// - `ApiError::Transport`, `ApiError::Decode`, `ApiError::Cancelled`
    #[instrument(skip(self, request), fields(method = %request.method(), url = %request.url()))]
    pub async fn request<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<Option<T>, ApiError> {
        let signal = self.abort_signal();
        let mut attempt = Attempt::First;

        loop {
            let Some(token) = self.auth.token().await? else {
                debug!("No access token available; skipping request");
                return Ok(None);
            };

            let response = self.send_bound(self.build(request, &token)?, &signal).await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                if !attempt.allows_refresh() {
                    warn!("Still unauthorized after token refresh");
                    self.redirect.redirect_to_login();
                    return Err(ApiError::Unauthorized);
                }

                debug!("Received 401; refreshing access token");
                if let Err(e) = self.auth.fetch_token().await {
                    warn!(error = %e, "Token refresh failed");
                    self.redirect.redirect_to_login();
                    return Err(ApiError::RefreshFailed(Box::new(e)));
                }

                attempt = Attempt::Retry;
                continue;
            }

            if !status.is_success() {
                let body = Self::read_text(response, &signal).await?;
                let err = Self::map_status_error(status, body);
                debug!(%status, error = %err, "Request failed");
                return Err(err);
            }

            let result = Self::decode(response, &signal).await?;
            info!(%status, "Request successful");
            return Ok(Some(result));
        }
    }

    /// Execute a GET request
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
        self.request(&ApiRequest::get(self.url_for(path))).await
    }

    /// Execute a POST request with a JSON body
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`]; `ApiError::Encode` if `body` cannot be
    /// serialized
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<T>, ApiError> {
        self.request(&ApiRequest::post(self.url_for(path)).json_body(body)?).await
    }

    /// Execute a PUT request with a JSON body
    ///
    /// # Errors
    ///
    /// See [`ApiClient::post`]
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<T>, ApiError> {
        self.request(&ApiRequest::put(self.url_for(path)).json_body(body)?).await
    }

    /// Execute a PATCH request with a JSON body
    ///
    /// # Errors
    ///
    /// See [`ApiClient::post`]
    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<T>, ApiError> {
        self.request(&ApiRequest::patch(self.url_for(path)).json_body(body)?).await
    }

    /// Execute a DELETE request
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`]
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
        self.request(&ApiRequest::delete(self.url_for(path))).await
    }

    /// POST a multipart form, e.g. a CSV upload
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`]
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        form: MultipartForm,
    ) -> Result<Option<T>, ApiError> {
        self.request(&ApiRequest::post(self.url_for(path)).multipart(form)).await
    }

    /// Download a binary body (CSV or file export).
    ///
    /// Single attempt: no token refresh and no structured-error parsing. A
    /// non-2xx answer becomes `ApiError::Download` with the raw body. Every
    /// failure is logged before it is returned.
    ///
    /// # Errors
    ///
    /// `ApiError::Download`, `ApiError::Auth`, `ApiError::Transport` or
    /// `ApiError::Cancelled`
    #[instrument(skip(self), fields(path = %path))]
    pub async fn download_file(&self, path: &str) -> Result<Option<Bytes>, ApiError> {
        let result = self.try_download(path).await;
        if let Err(e) = &result {
            error!(error = %e, "File download failed");
        }
        result
    }

    async fn try_download(&self, path: &str) -> Result<Option<Bytes>, ApiError> {
        let signal = self.abort_signal();

        let Some(token) = self.auth.token().await? else {
            debug!("No access token available; skipping download");
            return Ok(None);
        };

        let builder = self.http_client.request(Method::GET, self.url_for(path)).bearer_auth(token);
        let response = self.send_bound(builder, &signal).await?;

        let status = response.status();
        if !status.is_success() {
            let body = Self::read_text(response, &signal).await?;
            return Err(ApiError::Download { status: status.as_u16(), body });
        }

        let bytes = Self::read_bytes(response, &signal).await?;
        info!(size = bytes.len(), "File downloaded");
        Ok(Some(bytes))
    }

    /// Build one attempt: defaults first, caller headers last.
    fn build(&self, request: &ApiRequest, token: &str) -> Result<RequestBuilder, ApiError> {
        let mut builder =
            self.http_client.request(request.method().clone(), request.url()).bearer_auth(token);

        builder = match request.body() {
            RequestBody::Empty => {
                builder.header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            }
            RequestBody::Json(value) => builder
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .json(value),
            RequestBody::Multipart(form) => builder.multipart(form.to_form()?),
        };

        Ok(builder.headers(request.headers().clone()))
    }

    async fn send_bound(
        &self,
        builder: RequestBuilder,
        signal: &AbortSignal,
    ) -> Result<Response, ApiError> {
        tokio::select! {
            biased;
            () = signal.aborted() => {
                debug!("Request aborted");
                Err(ApiError::Cancelled)
            }
            result = self.http_client.send(builder) => result.map_err(ApiError::Transport),
        }
    }

    async fn read_bytes(response: Response, signal: &AbortSignal) -> Result<Bytes, ApiError> {
        tokio::select! {
            biased;
            () = signal.aborted() => Err(ApiError::Cancelled),
            result = response.bytes() => result.map_err(|e| {
                let infra: crate::errors::InfraError = e.into();
                ApiError::Transport(infra.into())
            }),
        }
    }

    async fn read_text(response: Response, signal: &AbortSignal) -> Result<String, ApiError> {
        let bytes = Self::read_bytes(response, signal).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn decode<T: DeserializeOwned>(
        response: Response,
        signal: &AbortSignal,
    ) -> Result<T, ApiError> {
        let status = response.status();

        // 204/205 carry no body by RFC; decode from null like an empty body
        let bytes = if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
            Bytes::new()
        } else {
            Self::read_bytes(response, signal).await?
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return serde_json::from_value(serde_json::Value::Null).map_err(|_| {
                ApiError::Decode(format!(
                    "Empty response ({}), but response type cannot be deserialized from null",
                    status.as_u16()
                ))
            });
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::Decode(format!("Failed to parse response: {}", e)))
    }

    fn map_status_error(status: StatusCode, body: String) -> ApiError {
        let code = status.as_u16();

        match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(error) => ApiError::Api { status: code, error },
            Err(_) => {
                let detail = if body.trim().is_empty() {
                    status.canonical_reason().unwrap_or_default().to_string()
                } else {
                    body
                };
                ApiError::Unhandled { status: code, error: ApiErrorResponse::unhandled(detail) }
            }
        }
    }
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<BackendConfig>,
    auth: Option<Arc<dyn AuthContext>>,
    redirect: Option<Arc<dyn LoginRedirect>>,
}

impl ApiClientBuilder {
    /// Set the backend configuration
    pub fn config(mut self, config: BackendConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the authentication context
    pub fn auth(mut self, auth: Arc<dyn AuthContext>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set the login redirect
    pub fn redirect(mut self, redirect: Arc<dyn LoginRedirect>) -> Self {
        self.redirect = Some(redirect);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns error if required fields are missing or client creation fails
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config =
            self.config.ok_or_else(|| ApiError::Config("Backend config not set".to_string()))?;
        let auth =
            self.auth.ok_or_else(|| ApiError::Config("Auth context not set".to_string()))?;
        let redirect = self
            .redirect
            .ok_or_else(|| ApiError::Config("Login redirect not set".to_string()))?;

        ApiClient::new(config, auth, redirect)
    }
}
