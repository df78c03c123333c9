//! The authentication session store.
//!
//! A session is the (token, profile) pair representing an authenticated
//! user. The store is a single owned instance - no ambient globals - that
//! persists both fields to durable storage on every mutation and restores
//! them at construction, so a restarted process resumes the session.
//!
//! Every operation that talks to the server normalizes failures into a
//! [`SessionError`] carrying a human-readable message; calling code matches
//! on `Result` and never needs panic handling.

pub mod storage;

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use studyhall_core::{Email, Role, UserId};

use crate::api::{ApiClient, ApiError};
use storage::{StateStorage, keys};

/// A normalized session operation failure.
///
/// The message is taken from, in order of preference: the structured server
/// `detail`, the transport error's own message, or a per-operation fallback.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct SessionError {
    message: String,
}

impl SessionError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn from_api(error: &ApiError, fallback: &str) -> Self {
        let message = match error {
            ApiError::Status {
                detail: Some(detail),
                ..
            } => detail.clone(),
            ApiError::Status { detail: None, .. } => fallback.to_string(),
            other => other.to_string(),
        };
        Self::new(message)
    }

    /// The human-readable failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The authenticated user's profile record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backend user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Account email address.
    pub email: Email,
    /// Platform role, governs route access.
    pub role: Role,
    /// Contact phone number, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Avatar image URL, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// A partial profile update.
///
/// Only the `Some` fields are sent to the server and merged into the stored
/// profile (shallow merge: a present field overwrites the stored one).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    /// New phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// New avatar URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    /// Shallow-merge this update into `profile`.
    fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(name) = &self.name {
            profile.name = name.clone();
        }
        if let Some(email) = &self.email {
            profile.email = email.clone();
        }
        if let Some(phone) = &self.phone {
            profile.phone = Some(phone.clone());
        }
        if let Some(avatar_url) = &self.avatar_url {
            profile.avatar_url = Some(avatar_url.clone());
        }
    }
}

/// Login credentials.
///
/// The password is held as a [`SecretString`] so it never appears in `Debug`
/// output or logs; the manual `Serialize` impl exposes it on the wire only.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Account email address.
    pub email: Email,
    /// Account password.
    pub password: SecretString,
}

impl Serialize for Credentials {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Credentials", 2)?;
        s.serialize_field("email", &self.email)?;
        s.serialize_field("password", self.password.expose_secret())?;
        s.end()
    }
}

/// New-account registration payload.
#[derive(Debug, Clone)]
pub struct Registration {
    /// Display name.
    pub name: String,
    /// Account email address.
    pub email: Email,
    /// Account password.
    pub password: SecretString,
    /// Requested platform role.
    pub role: Role,
}

impl Serialize for Registration {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Registration", 4)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("email", &self.email)?;
        s.serialize_field("password", self.password.expose_secret())?;
        s.serialize_field("role", &self.role)?;
        s.end()
    }
}

/// Password-change payload.
#[derive(Debug, Clone)]
pub struct PasswordChange {
    /// The current password.
    pub old_password: SecretString,
    /// The replacement password.
    pub new_password: SecretString,
}

impl Serialize for PasswordChange {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("PasswordChange", 2)?;
        s.serialize_field("old_password", self.old_password.expose_secret())?;
        s.serialize_field("new_password", self.new_password.expose_secret())?;
        s.end()
    }
}

/// Read access to the current session, as the navigation guard sees it.
pub trait SessionRead {
    /// Whether a session is active: token non-empty AND profile present.
    fn is_logged_in(&self) -> bool;

    /// The current profile's role, if a profile is held.
    fn role(&self) -> Option<Role>;

    /// Whether the current role is a member of `roles`. Accepts a slice,
    /// array, or `Vec`; pass `[role]` for a single role.
    fn has_role(&self, roles: impl AsRef<[Role]>) -> bool {
        self.role().is_some_and(|role| roles.as_ref().contains(&role))
    }
}

/// Login response. The backend has shipped the profile under both
/// `user_info` and `user`; this shim accepts either, preferring `user_info`.
/// Do not add further aliases without confirming the canonical field name.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: Option<String>,
    user_info: Option<UserProfile>,
    user: Option<UserProfile>,
}

#[derive(Debug, Deserialize)]
struct AvatarResponse {
    avatar_url: String,
}

/// The authentication session store.
pub struct SessionStore {
    api: ApiClient,
    storage: Arc<dyn StateStorage>,
    token: String,
    profile: Option<UserProfile>,
}

impl SessionStore {
    /// Create a store, restoring any persisted session from storage.
    ///
    /// A corrupt persisted profile is treated as "no session" rather than an
    /// error, so a bad state file never locks the user out of logging in.
    pub fn new(api: ApiClient, storage: Arc<dyn StateStorage>) -> Self {
        let token = storage
            .get(keys::TOKEN)
            .ok()
            .flatten()
            .unwrap_or_default();
        let profile = storage.get(keys::USER_INFO).ok().flatten().and_then(|raw| {
            serde_json::from_str(&raw)
                .inspect_err(|e| tracing::warn!(error = %e, "discarding corrupt persisted profile"))
                .ok()
        });

        Self {
            api,
            storage,
            token,
            profile,
        }
    }

    // =========================================================================
    // Read operations
    // =========================================================================

    /// The current bearer token; empty means "no session".
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The current profile, if a session is held.
    #[must_use]
    pub const fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    // =========================================================================
    // Mutating operations
    // =========================================================================

    /// Log in with email and password.
    ///
    /// On success the token and profile are stored together and persisted.
    /// A response missing the token or both profile fields is a format
    /// error and mutates nothing.
    ///
    /// # Errors
    ///
    /// Returns a normalized [`SessionError`] on any transport, server, or
    /// response-format failure.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<(), SessionError> {
        let resp = self
            .api
            .post_json("/auth/login", credentials)
            .await
            .map_err(|e| SessionError::from_api(&e, "Login failed"))?;

        let body: LoginResponse = ApiClient::json(resp)
            .await
            .map_err(|e| SessionError::from_api(&e, "Login failed"))?;

        let profile = body.user_info.or(body.user);
        match (body.access_token, profile) {
            (Some(token), Some(profile)) if !token.is_empty() => {
                self.set_session(token, profile);
                tracing::info!(role = %self.role().map(|r| r.to_string()).unwrap_or_default(), "login succeeded");
                Ok(())
            }
            _ => Err(SessionError::new(
                "Login response missing token or user info",
            )),
        }
    }

    /// Register a new account. Does not mutate local session state.
    ///
    /// # Errors
    ///
    /// Returns a normalized [`SessionError`] on failure.
    pub async fn register(
        &self,
        registration: &Registration,
    ) -> Result<serde_json::Value, SessionError> {
        let resp = self
            .api
            .post_json("/auth/register", registration)
            .await
            .map_err(|e| SessionError::from_api(&e, "Registration failed"))?;

        ApiClient::json(resp)
            .await
            .map_err(|e| SessionError::from_api(&e, "Registration failed"))
    }

    /// Clear the session from memory and durable storage.
    ///
    /// Always succeeds and is idempotent: logging out with no session held
    /// leaves the empty state unchanged.
    pub fn logout(&mut self) {
        self.token.clear();
        self.profile = None;

        for key in [keys::TOKEN, keys::USER_INFO] {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(key, error = %e, "failed to clear persisted session state");
            }
        }
    }

    /// Send a partial profile update and merge it into the stored profile.
    ///
    /// Only the fields present in `update` change; everything else keeps its
    /// prior value. No profile re-fetch is performed.
    ///
    /// # Errors
    ///
    /// Returns a normalized [`SessionError`] on failure; the local profile
    /// is not touched in that case.
    pub async fn update_profile(&mut self, update: &ProfileUpdate) -> Result<(), SessionError> {
        self.api
            .put_json("/user/profile", update)
            .await
            .map_err(|e| SessionError::from_api(&e, "Profile update failed"))?;

        if let Some(profile) = self.profile.as_mut() {
            update.apply_to(profile);
        }
        self.persist();
        Ok(())
    }

    /// Change the account password. Pass-through; no local state mutation.
    ///
    /// # Errors
    ///
    /// Returns a normalized [`SessionError`] on failure.
    pub async fn change_password(&self, change: &PasswordChange) -> Result<(), SessionError> {
        self.api
            .post_json("/auth/change-password", change)
            .await
            .map_err(|e| SessionError::from_api(&e, "Password change failed"))?;
        Ok(())
    }

    /// Upload a new avatar image and point the stored profile at the URL
    /// the server assigned to it.
    ///
    /// # Errors
    ///
    /// Returns a normalized [`SessionError`] on failure; the local profile
    /// is not touched in that case.
    pub async fn upload_avatar(
        &mut self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), SessionError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_owned());
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self
            .api
            .post_multipart("/user/avatar", form)
            .await
            .map_err(|e| SessionError::from_api(&e, "Avatar upload failed"))?;

        let body: AvatarResponse = ApiClient::json(resp)
            .await
            .map_err(|e| SessionError::from_api(&e, "Avatar upload failed"))?;

        if let Some(profile) = self.profile.as_mut() {
            profile.avatar_url = Some(body.avatar_url);
        }
        self.persist();
        Ok(())
    }

    /// Fetch the canonical current-user record and overwrite the stored
    /// profile with it. The token is untouched.
    ///
    /// On failure - typically an expired or invalid token - the session is
    /// fully logged out before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns a normalized [`SessionError`] on failure.
    pub async fn refresh_from_server(&mut self) -> Result<(), SessionError> {
        let resp = match self.api.get("/auth/me").await {
            Ok(resp) => resp,
            Err(e) => {
                self.logout();
                return Err(SessionError::from_api(&e, "Failed to fetch user info"));
            }
        };

        match ApiClient::json::<UserProfile>(resp).await {
            Ok(profile) => {
                self.profile = Some(profile);
                self.persist();
                Ok(())
            }
            Err(e) => {
                self.logout();
                Err(SessionError::from_api(&e, "Failed to fetch user info"))
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn set_session(&mut self, token: String, profile: UserProfile) {
        self.token = token;
        self.profile = Some(profile);
        self.persist();
    }

    /// Write the current session to durable storage. Memory remains the
    /// source of truth if the write fails; the failure is logged and the
    /// session stays usable for this process lifetime.
    fn persist(&self) {
        if let Err(e) = self.storage.set(keys::TOKEN, &self.token) {
            tracing::warn!(error = %e, "failed to persist token");
        }

        match &self.profile {
            Some(profile) => match serde_json::to_string(profile) {
                Ok(raw) => {
                    if let Err(e) = self.storage.set(keys::USER_INFO, &raw) {
                        tracing::warn!(error = %e, "failed to persist profile");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "failed to serialize profile"),
            },
            None => {
                if let Err(e) = self.storage.remove(keys::USER_INFO) {
                    tracing::warn!(error = %e, "failed to remove persisted profile");
                }
            }
        }
    }
}

impl SessionRead for SessionStore {
    fn is_logged_in(&self) -> bool {
        !self.token.is_empty() && self.profile.is_some()
    }

    fn role(&self) -> Option<Role> {
        self.profile.as_ref().map(|p| p.role)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("logged_in", &self.is_logged_in())
            .field("role", &self.role())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn profile(role: Role) -> UserProfile {
        UserProfile {
            id: UserId::new(1),
            name: "Avery".to_string(),
            email: Email::parse("avery@example.com").unwrap(),
            role,
            phone: None,
            avatar_url: None,
        }
    }

    #[test]
    fn test_profile_update_shallow_merge() {
        let mut stored = profile(Role::Student);
        stored.phone = Some("555-0100".to_string());

        let update = ProfileUpdate {
            name: Some("Avery Chen".to_string()),
            ..ProfileUpdate::default()
        };
        update.apply_to(&mut stored);

        assert_eq!(stored.name, "Avery Chen");
        // Untouched fields keep their prior values
        assert_eq!(stored.email.as_str(), "avery@example.com");
        assert_eq!(stored.phone.as_deref(), Some("555-0100"));
        assert_eq!(stored.role, Role::Student);
    }

    #[test]
    fn test_profile_update_serializes_only_present_fields() {
        let update = ProfileUpdate {
            phone: Some("555-0101".to_string()),
            ..ProfileUpdate::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "phone": "555-0101" }));
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials {
            email: Email::parse("avery@example.com").unwrap(),
            password: SecretString::from("hunter2"),
        };
        let debug = format!("{credentials:?}");
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_credentials_serialize_exposes_password_on_wire() {
        let credentials = Credentials {
            email: Email::parse("avery@example.com").unwrap(),
            password: SecretString::from("hunter2"),
        };
        let json = serde_json::to_value(&credentials).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "email": "avery@example.com", "password": "hunter2" })
        );
    }

    #[test]
    fn test_login_response_prefers_user_info() {
        let raw = serde_json::json!({
            "access_token": "tok",
            "user_info": { "id": 1, "name": "A", "email": "a@b.c", "role": "student" },
            "user": { "id": 2, "name": "B", "email": "b@b.c", "role": "teacher" },
        });
        let body: LoginResponse = serde_json::from_value(raw).unwrap();
        let profile = body.user_info.or(body.user).unwrap();
        assert_eq!(profile.id, UserId::new(1));
    }

    #[test]
    fn test_session_error_message_preference() {
        use reqwest::StatusCode;

        // Structured detail wins
        let err = SessionError::from_api(
            &ApiError::Status {
                status: StatusCode::UNAUTHORIZED,
                detail: Some("Incorrect email or password".to_string()),
            },
            "Login failed",
        );
        assert_eq!(err.message(), "Incorrect email or password");

        // No detail: per-operation fallback
        let err = SessionError::from_api(
            &ApiError::Status {
                status: StatusCode::BAD_GATEWAY,
                detail: None,
            },
            "Login failed",
        );
        assert_eq!(err.message(), "Login failed");

        // Transport failures use the error's own message
        let err = SessionError::from_api(&ApiError::Timeout, "Login failed");
        assert_eq!(err.message(), "request timed out");
    }
}
