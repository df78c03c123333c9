//! HTTP access layer for the Studyhall API.
//!
//! Wraps a [`reqwest::Client`] with the two interception points the rest of
//! the crate relies on:
//!
//! - **Outbound**: the bearer token is read from durable storage before
//!   every request (not from session-store memory, so a freshly persisted
//!   token is picked up without plumbing) and attached as an
//!   `Authorization: Bearer` header when non-empty. Multipart bodies set no
//!   explicit content type so the transport writes the boundary header
//!   itself.
//! - **Inbound**: successful responses pass through unchanged; every failure
//!   is classified into an [`ApiError`], run through the fixed
//!   [`dispatch`](dispatch) side-effect table (notice, 401 purge + signal),
//!   and then re-raised to the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use studyhall_client::api::ApiClient;
//!
//! let api = ApiClient::new(&config, storage, notifier, watch)?;
//! let resp = api.get("/auth/me").await?;
//! let profile: UserProfile = ApiClient::json(resp).await?;
//! ```

mod dispatch;
mod error;

pub use error::ApiError;

use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::notify::{Notifier, SessionWatch};
use crate::session::storage::{StateStorage, keys};

/// Client for the Studyhall HTTP API.
///
/// Cheap to clone; all clones share the same connection pool, storage
/// handle, notifier, and session-expired signal.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    storage: Arc<dyn StateStorage>,
    notifier: Arc<dyn Notifier>,
    watch: SessionWatch,
}

/// Error body shape used across the Studyhall API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Client` if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(
        config: &ClientConfig,
        storage: Arc<dyn StateStorage>,
        notifier: Arc<dyn Notifier>,
        watch: SessionWatch,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.api_base_url.as_str().trim_end_matches('/').to_owned(),
                storage,
                notifier,
                watch,
            }),
        })
    }

    /// The session-expired signal this client raises on 401 responses.
    #[must_use]
    pub fn watch(&self) -> SessionWatch {
        self.inner.watch.clone()
    }

    // =========================================================================
    // Request methods
    // =========================================================================

    /// Send a GET request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server answers with a
    /// non-success status. Failure side effects (notice, 401 purge) have
    /// already run when this returns.
    pub async fn get(&self, path: &str) -> Result<reqwest::Response, ApiError> {
        self.send(self.inner.http.get(self.endpoint(path))).await
    }

    /// Send a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// Same contract as [`ApiClient::get`].
    pub async fn post_json<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ApiError> {
        self.send(self.inner.http.post(self.endpoint(path)).json(body))
            .await
    }

    /// Send a PUT request with a JSON body.
    ///
    /// # Errors
    ///
    /// Same contract as [`ApiClient::get`].
    pub async fn put_json<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ApiError> {
        self.send(self.inner.http.put(self.endpoint(path)).json(body))
            .await
    }

    /// Send a POST request with a multipart body.
    ///
    /// No content-type header is set here: the transport generates the
    /// multipart boundary and writes the header itself.
    ///
    /// # Errors
    ///
    /// Same contract as [`ApiClient::get`].
    pub async fn post_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<reqwest::Response, ApiError> {
        self.send(self.inner.http.post(self.endpoint(path)).multipart(form))
            .await
    }

    /// Decode a successful response body as JSON.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` if the body is not valid JSON for `T`.
    pub async fn json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        resp.json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    // =========================================================================
    // Interception
    // =========================================================================

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Read the bearer token from durable storage, if one is persisted.
    fn bearer(&self) -> Option<String> {
        match self.inner.storage.get(keys::TOKEN) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read persisted token");
                None
            }
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let req = match self.bearer() {
            Some(token) => req.bearer_auth(token),
            None => req,
        };

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => return Err(self.fail(ApiError::from_transport(&e))),
        };

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let detail = resp
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail);

        Err(self.fail(ApiError::Status { status, detail }))
    }

    /// Run the centralized side effects, then hand the error back for the
    /// caller to raise.
    fn fail(&self, error: ApiError) -> ApiError {
        dispatch::dispatch(
            &error,
            self.inner.storage.as_ref(),
            self.inner.notifier.as_ref(),
            &self.inner.watch,
        );
        error
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}
