//! API client with circuit breaker, retry and session refresh
//!
//! [`ApiClient::send`] is the single dispatch path. Every helper (verbs,
//! upload, download) builds an [`ApiRequest`] and goes through it, so they
//! all share the breaker, the retry budget and the 401 handling.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use campus_common::resilience::{
    Breaker, CircuitBreaker, CircuitBreakerConfig, CircuitState, ExponentialBackoff,
};
use campus_domain::constants::{
    AUTH_PROFILE_PATH, CODE_RESOURCE_NOT_FOUND, HEALTH_PATH, MSG_FORBIDDEN, MSG_NOT_FOUND,
    MSG_SERVER_UNREACHABLE, MSG_UNAUTHORIZED,
};
use campus_domain::{ApiConfig, CampusError};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::auth::{
    is_auth_endpoint, AuthStore, Navigator, NoopAuthStore, SessionRefresh, TracingNavigator,
};
use super::envelope::unwrap_envelope;
use super::errors::ApiError;
use super::refresh::SessionRefresher;
use super::request::{ApiRequest, MultipartForm, RequestBody, ResponseShape};
use crate::http::HttpClient;

/// Decoded payload of a successful request
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Parsed JSON with the envelope already removed
    Json(Value),
    /// Raw body of a blob request
    Blob(Bytes),
}

impl ApiResponse {
    /// Deserialize the payload into `T`
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` when the payload does not match `T`.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            Self::Json(value) => {
                serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
            }
            Self::Blob(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
            }
        }
    }

    /// Raw bytes; an empty JSON object (204) yields no bytes
    pub fn into_bytes(self) -> Bytes {
        match self {
            Self::Blob(bytes) => bytes,
            Self::Json(Value::Object(map)) if map.is_empty() => Bytes::new(),
            Self::Json(value) => Bytes::from(value.to_string()),
        }
    }
}

/// Result of `GET {prefix}/health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: String,
}

/// Result of probing `GET {prefix}/auth/profile`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
}

impl AuthStatus {
    fn anonymous() -> Self {
        Self { authenticated: false, user: None }
    }
}

/// How a single attempt ended
enum Outcome {
    Done(ApiResponse),
    /// Transient failure; retried while budget remains
    Retry(ApiError),
    /// Session refreshed; re-issue immediately without using budget
    Replay,
    Fail(ApiError),
}

/// Best-effort fields of an error response body
#[derive(Debug, Default)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
    code: Option<String>,
}

impl ErrorBody {
    async fn read(response: Response) -> Self {
        let Ok(bytes) = response.bytes().await else {
            return Self::default();
        };
        let Ok(value) = serde_json::from_slice::<Value>(&bytes) else {
            return Self::default();
        };
        Self {
            message: text_field(&value, "message"),
            error: text_field(&value, "error"),
            code: text_field(&value, "code"),
        }
    }
}

/// String field, or a list of strings joined (validation errors)
fn text_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}

/// API client with resilience patterns
///
/// Cheap to clone; clones share the breaker, the cookie jar and the
/// collaborators.
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    config: Arc<ApiConfig>,
    breaker: Arc<dyn Breaker>,
    backoff: ExponentialBackoff,
    auth_store: Arc<dyn AuthStore>,
    navigator: Arc<dyn Navigator>,
    refresher: Arc<dyn SessionRefresh>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url)
            .field("api_prefix", &self.config.api_prefix)
            .field("breaker", &self.breaker)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client with default collaborators
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if the configuration is invalid or the
    /// transport cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        Self::builder().config(config).build()
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Current breaker state
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Dispatch a request through the breaker, retry and refresh logic
    ///
    /// # Errors
    ///
    /// Every failure is classified as an [`ApiError`]; see its variants.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = request.url(&self.config.base_url, &self.config.api_prefix)?;
        let headers = request.header_map()?;

        if !self.breaker.can_request() {
            warn!(state = %self.breaker.state(), "circuit breaker rejected request");
            return Err(ApiError::CircuitOpen);
        }

        let max_retries = if request.skip_retry { 0 } else { self.config.retry.max_retries };
        let auth_endpoint = is_auth_endpoint(url.path());
        let mut attempt: u32 = 0;
        let mut refreshed = false;

        loop {
            let outcome = self
                .attempt(&request, &url, &headers, attempt, auth_endpoint, &mut refreshed)
                .await;

            match outcome {
                Outcome::Done(response) => return Ok(response),
                Outcome::Fail(err) => {
                    debug!(attempt, error = ?err, "request failed");
                    return Err(err);
                }
                Outcome::Replay => {
                    debug!(attempt, "replaying request after session refresh");
                }
                Outcome::Retry(err) => {
                    if attempt >= max_retries {
                        warn!(attempts = attempt + 1, error = ?err, "request failed after retries");
                        if err == ApiError::RateLimited {
                            self.breaker.on_neutral();
                        }
                        return Err(err);
                    }
                    attempt += 1;
                    let delay = self.backoff.delay_for_retry(attempt);
                    debug!(
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = ?err,
                        "retrying request"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn attempt(
        &self,
        request: &ApiRequest,
        url: &Url,
        headers: &HeaderMap,
        attempt: u32,
        auth_endpoint: bool,
        refreshed: &mut bool,
    ) -> Outcome {
        let mut builder = self.http.request(request.method.clone(), url.clone());
        if request.sends_json() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        builder = match &request.body {
            None => builder,
            Some(RequestBody::Json(value)) => match serde_json::to_vec(value) {
                Ok(body) => builder.body(body),
                Err(e) => {
                    return Outcome::Fail(ApiError::InvalidRequest(format!(
                        "failed to serialize body: {e}"
                    )))
                }
            },
            Some(RequestBody::Raw(bytes)) => builder.body(bytes.clone()),
            Some(RequestBody::Multipart(form)) => match form.to_form() {
                Ok(form) => builder.multipart(form),
                Err(err) => return Outcome::Fail(err),
            },
        };
        builder = builder.headers(headers.clone());

        debug!(attempt, %url, "dispatching request");
        let response = match self.http.send(builder).await {
            Ok(response) => response,
            Err(CampusError::Network(detail)) => {
                self.breaker.on_failure();
                return Outcome::Retry(ApiError::network(detail));
            }
            Err(other) => return Outcome::Fail(other.into()),
        };

        self.classify(request.shape, response, attempt, auth_endpoint, refreshed).await
    }

    async fn classify(
        &self,
        shape: ResponseShape,
        response: Response,
        attempt: u32,
        auth_endpoint: bool,
        refreshed: &mut bool,
    ) -> Outcome {
        let status = response.status();

        match status {
            StatusCode::TOO_MANY_REQUESTS => Outcome::Retry(ApiError::RateLimited),
            StatusCode::UNAUTHORIZED => {
                self.unauthorized(response, attempt, auth_endpoint, refreshed).await
            }
            StatusCode::FORBIDDEN => {
                let body = ErrorBody::read(response).await;
                self.breaker.on_failure();
                Outcome::Fail(ApiError::Forbidden {
                    message: body.message.unwrap_or_else(|| MSG_FORBIDDEN.to_string()),
                    code: body.code,
                })
            }
            StatusCode::NOT_FOUND => {
                let body = ErrorBody::read(response).await;
                self.breaker.on_failure();
                Outcome::Fail(ApiError::NotFound {
                    message: body
                        .message
                        .or(body.error)
                        .unwrap_or_else(|| MSG_NOT_FOUND.to_string()),
                    code: body.code.unwrap_or_else(|| CODE_RESOURCE_NOT_FOUND.to_string()),
                })
            }
            s if s.is_server_error() => {
                self.breaker.on_failure();
                Outcome::Retry(ApiError::Server { status: s.as_u16() })
            }
            s if !s.is_success() => {
                let code = s.as_u16();
                let body = ErrorBody::read(response).await;
                self.breaker.on_failure();
                Outcome::Fail(ApiError::Http {
                    status: code,
                    message: body.message.unwrap_or_else(|| format!("HTTP error! status: {code}")),
                    code: body.code.unwrap_or_else(|| format!("HTTP_{code}")),
                })
            }
            StatusCode::NO_CONTENT => {
                self.breaker.on_success();
                Outcome::Done(ApiResponse::Json(Value::Object(Map::new())))
            }
            _ => self.read_success(shape, response).await,
        }
    }

    async fn unauthorized(
        &self,
        response: Response,
        attempt: u32,
        auth_endpoint: bool,
        refreshed: &mut bool,
    ) -> Outcome {
        let body = ErrorBody::read(response).await;
        let message = body.message.unwrap_or_else(|| MSG_UNAUTHORIZED.to_string());
        let session = message.to_lowercase().contains("session");

        if auth_endpoint {
            self.breaker.on_failure();
            return Outcome::Fail(ApiError::Unauthorized { message, code: body.code, session });
        }

        if attempt == 0 && !*refreshed {
            *refreshed = true;
            if self.refresher.refresh().await {
                return Outcome::Replay;
            }
        }

        self.auth_store.clear_auth(Some(&message)).await;
        self.breaker.on_failure();
        info!(session, "session ended, sign-in required");
        self.schedule_sign_in_redirect();

        Outcome::Fail(ApiError::Unauthorized { message, code: body.code, session })
    }

    async fn read_success(&self, shape: ResponseShape, response: Response) -> Outcome {
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => {
                self.breaker.on_failure();
                return Outcome::Retry(ApiError::network(format!(
                    "failed to read response body: {err}"
                )));
            }
        };

        match shape {
            ResponseShape::Blob => {
                self.breaker.on_success();
                Outcome::Done(ApiResponse::Blob(bytes))
            }
            ResponseShape::Json => match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => {
                    self.breaker.on_success();
                    Outcome::Done(ApiResponse::Json(unwrap_envelope(value)))
                }
                Err(e) => {
                    self.breaker.on_failure();
                    Outcome::Fail(ApiError::Decode(e.to_string()))
                }
            },
        }
    }

    /// Navigate to sign-in after a short delay, off the request path
    fn schedule_sign_in_redirect(&self) {
        let auth_store = Arc::clone(&self.auth_store);
        let navigator = Arc::clone(&self.navigator);
        let fallback = self.config.auth.sign_in_path.clone();
        let delay = self.config.auth.redirect_delay();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut url = auth_store.sign_in_url();
            if url.trim().is_empty() {
                url = fallback;
            }
            navigator.redirect(&url);
        });
    }

    /// Dispatch and deserialize the payload
    ///
    /// # Errors
    ///
    /// Any dispatch error, or `ApiError::Decode` if the payload is not a `T`.
    pub async fn request<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.send(request).await?.into_json()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(ApiRequest::get(path)).await
    }

    /// GET with query parameters taken from a serializable object
    pub async fn get_with<T, P>(&self, path: &str, params: &P) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        self.request(ApiRequest::get(path).params(params)?).await
    }

    /// POST a JSON body; pass `&()` to send no body
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(ApiRequest::put(path).json(body)?).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(ApiRequest::patch(path).json(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(ApiRequest::delete(path)).await
    }

    /// Send a multipart form (POST unless `method` says otherwise)
    pub async fn upload_file<T: DeserializeOwned>(
        &self,
        path: &str,
        form: MultipartForm,
        method: Option<Method>,
    ) -> Result<T, ApiError> {
        let request = ApiRequest::new(method.unwrap_or(Method::POST), path).multipart(form);
        self.request(request).await
    }

    /// Fetch a file as raw bytes
    pub async fn download_file(&self, path: &str) -> Result<Bytes, ApiError> {
        Ok(self.send(ApiRequest::get(path).blob()).await?.into_bytes())
    }

    /// Fetch a file and write it to `destination`, returning the byte count
    pub async fn download_to(
        &self,
        path: &str,
        destination: impl AsRef<Path>,
    ) -> Result<u64, ApiError> {
        let destination = destination.as_ref();
        let bytes = self.download_file(path).await?;
        tokio::fs::write(destination, &bytes)
            .await
            .map_err(|e| ApiError::Io(format!("{}: {e}", destination.display())))?;
        info!(path, destination = %destination.display(), bytes = bytes.len(), "file downloaded");
        Ok(bytes.len() as u64)
    }

    /// Probe backend liveness, bypassing the breaker and retries
    ///
    /// # Errors
    ///
    /// Any failure is reported as `ApiError::Network` ("API server is not
    /// reachable").
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        let unreachable_err = |detail: String| ApiError::Network {
            message: MSG_SERVER_UNREACHABLE.to_string(),
            detail,
        };

        let url = self.build_api_url(HEALTH_PATH)?;
        let response = self
            .http
            .send(self.http.request(Method::GET, url))
            .await
            .map_err(|e| unreachable_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "health check failed");
            return Err(unreachable_err(format!(
                "Health check failed with status {}",
                status.as_u16()
            )));
        }

        let value: Value = response.json().await.map_err(|e| unreachable_err(e.to_string()))?;
        serde_json::from_value(unwrap_envelope(value)).map_err(|e| unreachable_err(e.to_string()))
    }

    /// Check whether the current session is authenticated
    ///
    /// Never fails: 401, other errors and network failures all report
    /// `authenticated: false`.
    #[instrument(skip(self))]
    pub async fn auth_status(&self) -> AuthStatus {
        let Ok(url) = self.build_api_url(AUTH_PROFILE_PATH) else {
            return AuthStatus::anonymous();
        };

        match self.http.send(self.http.request(Method::GET, url)).await {
            Ok(response) if response.status().is_success() => match response.json::<Value>().await
            {
                Ok(user) => AuthStatus { authenticated: true, user: Some(user) },
                Err(err) => {
                    debug!(error = %err, "auth profile body unreadable");
                    AuthStatus::anonymous()
                }
            },
            Ok(response) => {
                debug!(status = %response.status(), "not authenticated");
                AuthStatus::anonymous()
            }
            Err(err) => {
                debug!(error = %err, "auth status probe failed");
                AuthStatus::anonymous()
            }
        }
    }

    /// Absolute URL for `endpoint`, adding the API prefix when missing
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` if the result is not a valid URL.
    pub fn build_api_url(&self, endpoint: &str) -> Result<Url, ApiError> {
        let clean = endpoint.trim_start_matches('/');
        let prefix = self.config.api_prefix.trim_matches('/');
        let base = self.config.base_url.trim_end_matches('/');

        let raw = if prefix.is_empty() || clean.starts_with(prefix) {
            format!("{base}/{clean}")
        } else {
            format!("{base}/{prefix}/{clean}")
        };

        Url::parse(&raw).map_err(|e| ApiError::InvalidRequest(format!("invalid URL '{raw}': {e}")))
    }
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ApiConfig>,
    http: Option<HttpClient>,
    breaker: Option<Arc<dyn Breaker>>,
    auth_store: Option<Arc<dyn AuthStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    refresher: Option<Arc<dyn SessionRefresh>>,
}

impl ApiClientBuilder {
    /// Set the API configuration
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a prebuilt transport instead of one derived from the config
    pub fn http_client(mut self, http: HttpClient) -> Self {
        self.http = Some(http);
        self
    }

    /// Share a breaker instead of creating one from the config
    pub fn breaker(mut self, breaker: Arc<dyn Breaker>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    pub fn auth_store(mut self, auth_store: Arc<dyn AuthStore>) -> Self {
        self.auth_store = Some(auth_store);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Replace the default cookie-based [`SessionRefresher`]
    pub fn session_refresh(mut self, refresher: Arc<dyn SessionRefresh>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if the configuration is invalid or the
    /// transport or breaker cannot be created.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let http = match self.http {
            Some(http) => http,
            None => HttpClient::builder()
                .timeout(config.request_timeout())
                .user_agent(config.user_agent.clone())
                .build()?,
        };

        let breaker: Arc<dyn Breaker> = match self.breaker {
            Some(breaker) => breaker,
            None => {
                let breaker_config = CircuitBreakerConfig::builder()
                    .failure_threshold(config.circuit_breaker.failure_threshold)
                    .timeout(config.circuit_breaker.open_timeout())
                    .build()?;
                Arc::new(CircuitBreaker::new(breaker_config)?)
            }
        };

        let refresher: Arc<dyn SessionRefresh> = match self.refresher {
            Some(refresher) => refresher,
            None => {
                let url = ApiRequest::post(config.auth.refresh_path.as_str())
                    .url(&config.base_url, &config.api_prefix)?;
                Arc::new(SessionRefresher::new(http.clone(), url.as_str()))
            }
        };

        let auth_store = self
            .auth_store
            .unwrap_or_else(|| Arc::new(NoopAuthStore::new(config.auth.sign_in_path.clone())));
        let navigator = self.navigator.unwrap_or_else(|| Arc::new(TracingNavigator));
        let backoff =
            ExponentialBackoff::new(config.retry.initial_backoff(), config.retry.max_backoff());

        Ok(ApiClient {
            http,
            config: Arc::new(config),
            breaker,
            backoff,
            auth_store,
            navigator,
            refresher,
        })
    }
}
