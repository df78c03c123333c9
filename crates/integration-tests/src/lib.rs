//! Integration tests for the Studyhall client.
//!
//! Every test runs against an in-process fake of the Studyhall API: an
//! `axum` server bound to an ephemeral localhost port, scriptable per test
//! (valid credentials, profile payload shape, token rotation). No external
//! services are required.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p studyhall-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `session_lifecycle` - Login, persistence, refresh, logout
//! - `error_dispatch` - Centralized failure side effects over real HTTP
//! - `navigation` - Guarded navigation against a live session

#![allow(clippy::expect_used)]

use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};

use studyhall_client::api::ApiClient;
use studyhall_client::config::ClientConfig;
use studyhall_client::notify::{BufferedNotifier, Notifier, SessionWatch};
use studyhall_client::session::storage::{MemoryStorage, StateStorage};
use studyhall_client::session::{Credentials, SessionStore};
use studyhall_core::Email;

/// Email the fake accepts for login.
pub const EMAIL: &str = "avery@studyhall.test";
/// Password the fake accepts for login.
pub const PASSWORD: &str = "correct-horse";

/// Which field of the login response carries the profile.
///
/// The real backend has shipped both shapes; tests exercise each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    /// Profile under `user_info` (the current shape).
    UserInfo,
    /// Profile under `user` (the legacy shape).
    User,
    /// No profile field at all (a malformed response).
    Missing,
}

/// Scriptable state behind the fake API, shared with the test body.
#[derive(Debug)]
pub struct FakeState {
    /// Token issued on login and required by authenticated endpoints.
    pub token: String,
    /// Profile returned by login and by `/auth/me`.
    pub profile: Value,
    /// Login response shape.
    pub profile_field: ProfileField,
    /// Body of the most recent `PUT /user/profile`.
    pub last_profile_update: Option<Value>,
    /// Body of the most recent `POST /auth/change-password`.
    pub last_password_change: Option<Value>,
    /// Body of the most recent `POST /auth/register`.
    pub last_registration: Option<Value>,
    /// File name of the most recent `POST /user/avatar`.
    pub last_avatar_upload: Option<String>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            token: "tok-fake-1".to_string(),
            profile: json!({
                "id": 1,
                "name": "Avery Chen",
                "email": EMAIL,
                "role": "teacher",
            }),
            profile_field: ProfileField::UserInfo,
            last_profile_update: None,
            last_password_change: None,
            last_registration: None,
            last_avatar_upload: None,
        }
    }
}

type Shared = Arc<Mutex<FakeState>>;

fn lock(state: &Shared) -> std::sync::MutexGuard<'_, FakeState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An in-process fake of the Studyhall API.
#[derive(Debug)]
pub struct FakeApi {
    base_url: String,
    state: Shared,
}

impl FakeApi {
    /// Bind the fake to an ephemeral port and start serving.
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(FakeState::default()));

        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/auth/me", get(me))
            .route("/auth/change-password", post(change_password))
            .route("/user/profile", put(update_profile))
            .route("/user/avatar", post(upload_avatar))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind fake api listener");
        let addr = listener.local_addr().expect("listener has no local addr");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("fake api server failed");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// The base URL requests should target.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Script the shape of the login response.
    pub fn set_profile_field(&self, field: ProfileField) {
        lock(&self.state).profile_field = field;
    }

    /// Replace the profile returned by login and `/auth/me`.
    pub fn set_profile(&self, profile: Value) {
        lock(&self.state).profile = profile;
    }

    /// Rotate the server-side token so previously issued bearers get 401.
    pub fn invalidate_token(&self) {
        lock(&self.state).token.push_str("-rotated");
    }

    /// Body of the most recent profile update, if any.
    #[must_use]
    pub fn last_profile_update(&self) -> Option<Value> {
        lock(&self.state).last_profile_update.clone()
    }

    /// Body of the most recent password change, if any.
    #[must_use]
    pub fn last_password_change(&self) -> Option<Value> {
        lock(&self.state).last_password_change.clone()
    }

    /// Body of the most recent registration, if any.
    #[must_use]
    pub fn last_registration(&self) -> Option<Value> {
        lock(&self.state).last_registration.clone()
    }

    /// File name of the most recent avatar upload, if any.
    #[must_use]
    pub fn last_avatar_upload(&self) -> Option<String> {
        lock(&self.state).last_avatar_upload.clone()
    }
}

// =============================================================================
// Handlers
// =============================================================================

fn bearer_ok(headers: &HeaderMap, token: &str) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(format!("Bearer {token}").as_str())
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Could not validate credentials" })),
    )
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let state = lock(&state);

    let email = body.get("email").and_then(Value::as_str);
    let password = body.get("password").and_then(Value::as_str);
    if email != Some(EMAIL) || password != Some(PASSWORD) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Incorrect email or password" })),
        );
    }

    let response = match state.profile_field {
        ProfileField::UserInfo => json!({
            "access_token": state.token,
            "user_info": state.profile,
        }),
        ProfileField::User => json!({
            "access_token": state.token,
            "user": state.profile,
        }),
        ProfileField::Missing => json!({ "access_token": state.token }),
    };
    (StatusCode::OK, Json(response))
}

async fn register(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = lock(&state);

    if body.get("email").and_then(Value::as_str) == Some(EMAIL) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": "Email already registered" })),
        );
    }

    let response = json!({
        "id": 2,
        "name": body.get("name").cloned().unwrap_or(Value::Null),
        "email": body.get("email").cloned().unwrap_or(Value::Null),
        "role": body.get("role").cloned().unwrap_or(Value::Null),
    });
    state.last_registration = Some(body);
    (StatusCode::OK, Json(response))
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let state = lock(&state);
    if !bearer_ok(&headers, &state.token) {
        return unauthorized();
    }
    (StatusCode::OK, Json(state.profile.clone()))
}

async fn update_profile(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = lock(&state);
    if !bearer_ok(&headers, &state.token) {
        return unauthorized();
    }
    state.last_profile_update = Some(body);
    (StatusCode::OK, Json(json!({})))
}

async fn upload_avatar(
    State(state): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    {
        let state = lock(&state);
        if !bearer_ok(&headers, &state.token) {
            return unauthorized();
        }
    }

    let mut file_name = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            file_name = field.file_name().map(str::to_owned);
            let _ = field.bytes().await;
        }
    }

    let Some(file_name) = file_name else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Missing file field" })),
        );
    };

    let avatar_url = format!("https://cdn.studyhall.test/avatars/{file_name}");
    lock(&state).last_avatar_upload = Some(file_name);
    (StatusCode::OK, Json(json!({ "avatar_url": avatar_url })))
}

async fn change_password(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = lock(&state);
    if !bearer_ok(&headers, &state.token) {
        return unauthorized();
    }
    if body.get("old_password").and_then(Value::as_str) != Some(PASSWORD) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Incorrect current password" })),
        );
    }
    state.last_password_change = Some(body);
    (StatusCode::OK, Json(json!({})))
}

// =============================================================================
// Test context
// =============================================================================

/// Everything a test needs: the fake, a client wired to it, and the
/// observable sinks (storage, notices, session-expired signal).
pub struct TestContext {
    /// The scriptable fake API.
    pub fake: FakeApi,
    /// Client pointed at the fake.
    pub client: ApiClient,
    /// Durable storage behind the client and the session store.
    pub storage: Arc<MemoryStorage>,
    /// Buffer receiving every user-facing notice.
    pub notices: Arc<BufferedNotifier>,
    /// Signal raised on 401 responses.
    pub watch: SessionWatch,
}

impl TestContext {
    /// Spawn a fake and wire a client to it.
    pub async fn new() -> Self {
        let fake = FakeApi::spawn().await;
        let storage = Arc::new(MemoryStorage::new());
        let notices = Arc::new(BufferedNotifier::new());
        let watch = SessionWatch::new();

        let config = ClientConfig::new(fake.base_url()).expect("fake base url is valid");
        let client = ApiClient::new(
            &config,
            Arc::clone(&storage) as Arc<dyn StateStorage>,
            Arc::clone(&notices) as Arc<dyn Notifier>,
            watch.clone(),
        )
        .expect("failed to build api client");

        Self {
            fake,
            client,
            storage,
            notices,
            watch,
        }
    }

    /// A session store over this context's client and storage.
    #[must_use]
    pub fn session(&self) -> SessionStore {
        SessionStore::new(
            self.client.clone(),
            Arc::clone(&self.storage) as Arc<dyn StateStorage>,
        )
    }

    /// The credentials the fake accepts.
    #[must_use]
    pub fn good_credentials(&self) -> Credentials {
        Credentials {
            email: Email::parse(EMAIL).expect("test email is valid"),
            password: SecretString::from(PASSWORD),
        }
    }
}
