//! Centralized failure dispatch.
//!
//! Every failed request goes through [`dispatch`] exactly once before the
//! error is returned to the caller. The dispatch table is fixed:
//!
//! | Condition | Side effects |
//! |---|---|
//! | 401 | purge persisted session, raise the session-expired signal, notify |
//! | 403 / 404 / 500 | notify |
//! | other status | notify with the server `detail`, else a generic message |
//! | timeout / network | notify |
//!
//! The redirect that follows a 401 is NOT performed here: the navigation
//! controller observes the raised [`SessionWatch`] and owns the location
//! change (including the already-on-login idempotency check).

use crate::notify::{Notice, Notifier, SessionWatch};
use crate::session::storage::{StateStorage, keys};

use super::ApiError;

/// Run the side effects for a failed request. The caller re-raises the
/// original error afterwards.
pub(crate) fn dispatch(
    error: &ApiError,
    storage: &dyn StateStorage,
    notifier: &dyn Notifier,
    watch: &SessionWatch,
) {
    let message = match error {
        ApiError::Status { status, detail } => match status.as_u16() {
            401 => {
                purge_session(storage);
                watch.raise();
                "Session expired, please log in again".to_string()
            }
            403 => "You do not have permission to access this resource".to_string(),
            404 => "The requested resource does not exist".to_string(),
            500 => "Internal server error".to_string(),
            _ => detail
                .clone()
                .unwrap_or_else(|| "Request failed".to_string()),
        },
        ApiError::Timeout => "Request timed out, please try again later".to_string(),
        ApiError::Network(_) => "Network error, please check your connection".to_string(),
        ApiError::Decode(_) | ApiError::Client(_) => "Request failed".to_string(),
    };

    notifier.notify(Notice::new(message));
}

/// Remove the persisted token and profile after an authentication rejection.
fn purge_session(storage: &dyn StateStorage) {
    for key in [keys::TOKEN, keys::USER_INFO] {
        if let Err(e) = storage.remove(key) {
            tracing::warn!(key, error = %e, "failed to purge persisted session state");
        }
    }
}
