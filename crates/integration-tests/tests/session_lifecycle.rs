//! Session store lifecycle over real HTTP.
//!
//! Exercises login, persistence and restore, server refresh, profile
//! updates, password changes, and logout against the in-process fake API.

#![allow(clippy::unwrap_used)]

use secrecy::SecretString;
use serde_json::json;

use studyhall_client::session::storage::{StateStorage, keys};
use studyhall_client::session::{
    Credentials, PasswordChange, ProfileUpdate, Registration, SessionRead,
};
use studyhall_core::{Email, Role, UserId};

use studyhall_integration_tests::{EMAIL, PASSWORD, ProfileField, TestContext};

#[tokio::test]
async fn test_login_stores_token_and_profile_together() {
    let ctx = TestContext::new().await;
    let mut session = ctx.session();

    assert!(!session.is_logged_in());

    session.login(&ctx.good_credentials()).await.unwrap();

    assert!(session.is_logged_in());
    assert_eq!(session.token(), "tok-fake-1");
    let profile = session.profile().unwrap();
    assert_eq!(profile.id, UserId::new(1));
    assert_eq!(profile.role, Role::Teacher);

    // Both fields persisted
    assert_eq!(
        ctx.storage.get(keys::TOKEN).unwrap().as_deref(),
        Some("tok-fake-1")
    );
    assert!(ctx.storage.get(keys::USER_INFO).unwrap().is_some());
}

#[tokio::test]
async fn test_restored_store_resumes_session() {
    let ctx = TestContext::new().await;
    let mut session = ctx.session();
    session.login(&ctx.good_credentials()).await.unwrap();
    drop(session);

    // A fresh store over the same storage picks the session back up
    let restored = ctx.session();
    assert!(restored.is_logged_in());
    assert_eq!(restored.role(), Some(Role::Teacher));
}

#[tokio::test]
async fn test_login_accepts_legacy_user_field() {
    let ctx = TestContext::new().await;
    ctx.fake.set_profile_field(ProfileField::User);

    let mut session = ctx.session();
    session.login(&ctx.good_credentials()).await.unwrap();
    assert!(session.is_logged_in());
}

#[tokio::test]
async fn test_login_without_profile_mutates_nothing() {
    let ctx = TestContext::new().await;
    ctx.fake.set_profile_field(ProfileField::Missing);

    let mut session = ctx.session();
    let err = session.login(&ctx.good_credentials()).await.unwrap_err();
    assert_eq!(err.message(), "Login response missing token or user info");

    assert!(!session.is_logged_in());
    assert_eq!(ctx.storage.get(keys::TOKEN).unwrap(), None);
}

#[tokio::test]
async fn test_login_failure_surfaces_server_detail() {
    let ctx = TestContext::new().await;
    let mut session = ctx.session();

    let bad = Credentials {
        email: Email::parse(EMAIL).unwrap(),
        password: SecretString::from("wrong"),
    };
    let err = session.login(&bad).await.unwrap_err();
    assert_eq!(err.message(), "Incorrect email or password");
    assert!(!session.is_logged_in());
}

#[tokio::test]
async fn test_refresh_overwrites_profile_from_server() {
    let ctx = TestContext::new().await;
    let mut session = ctx.session();
    session.login(&ctx.good_credentials()).await.unwrap();

    // The server-side record changes out from under the client
    ctx.fake.set_profile(json!({
        "id": 1,
        "name": "Avery C.",
        "email": EMAIL,
        "role": "teacher",
        "phone": "555-0100",
    }));

    session.refresh_from_server().await.unwrap();

    let profile = session.profile().unwrap();
    assert_eq!(profile.name, "Avery C.");
    assert_eq!(profile.phone.as_deref(), Some("555-0100"));
    assert_eq!(session.token(), "tok-fake-1");
}

#[tokio::test]
async fn test_refresh_with_rejected_token_logs_out() {
    let ctx = TestContext::new().await;
    let mut session = ctx.session();
    session.login(&ctx.good_credentials()).await.unwrap();

    ctx.fake.invalidate_token();

    let err = session.refresh_from_server().await.unwrap_err();
    assert_eq!(err.message(), "Could not validate credentials");

    assert!(!session.is_logged_in());
    assert_eq!(ctx.storage.get(keys::TOKEN).unwrap(), None);
    assert_eq!(ctx.storage.get(keys::USER_INFO).unwrap(), None);
    assert!(ctx.watch.is_raised());
}

#[tokio::test]
async fn test_update_profile_sends_only_present_fields() {
    let ctx = TestContext::new().await;
    let mut session = ctx.session();
    session.login(&ctx.good_credentials()).await.unwrap();

    let update = ProfileUpdate {
        phone: Some("555-0199".to_string()),
        ..ProfileUpdate::default()
    };
    session.update_profile(&update).await.unwrap();

    // Wire payload carries exactly the present field
    assert_eq!(
        ctx.fake.last_profile_update(),
        Some(json!({ "phone": "555-0199" }))
    );

    // Local profile shallow-merged, other fields untouched
    let profile = session.profile().unwrap();
    assert_eq!(profile.phone.as_deref(), Some("555-0199"));
    assert_eq!(profile.name, "Avery Chen");
}

#[tokio::test]
async fn test_upload_avatar_updates_profile_url() {
    let ctx = TestContext::new().await;
    let mut session = ctx.session();
    session.login(&ctx.good_credentials()).await.unwrap();

    session
        .upload_avatar("avery.png", vec![0x89, 0x50, 0x4e, 0x47])
        .await
        .unwrap();

    assert_eq!(ctx.fake.last_avatar_upload().as_deref(), Some("avery.png"));
    assert_eq!(
        session.profile().unwrap().avatar_url.as_deref(),
        Some("https://cdn.studyhall.test/avatars/avery.png")
    );
}

#[tokio::test]
async fn test_change_password_is_a_passthrough() {
    let ctx = TestContext::new().await;
    let mut session = ctx.session();
    session.login(&ctx.good_credentials()).await.unwrap();

    let change = PasswordChange {
        old_password: SecretString::from(PASSWORD),
        new_password: SecretString::from("battery-staple"),
    };
    session.change_password(&change).await.unwrap();

    assert_eq!(
        ctx.fake.last_password_change(),
        Some(json!({
            "old_password": PASSWORD,
            "new_password": "battery-staple",
        }))
    );
    // Session untouched
    assert!(session.is_logged_in());
}

#[tokio::test]
async fn test_change_password_wrong_current_surfaces_detail() {
    let ctx = TestContext::new().await;
    let mut session = ctx.session();
    session.login(&ctx.good_credentials()).await.unwrap();

    let change = PasswordChange {
        old_password: SecretString::from("not-it"),
        new_password: SecretString::from("battery-staple"),
    };
    let err = session.change_password(&change).await.unwrap_err();
    assert_eq!(err.message(), "Incorrect current password");
}

#[tokio::test]
async fn test_register_does_not_touch_session() {
    let ctx = TestContext::new().await;
    let session = ctx.session();

    let registration = Registration {
        name: "Sam Park".to_string(),
        email: Email::parse("sam@studyhall.test").unwrap(),
        password: SecretString::from("new-pass"),
        role: Role::Student,
    };
    let body = session.register(&registration).await.unwrap();

    assert_eq!(body.get("id"), Some(&json!(2)));
    assert_eq!(
        ctx.fake
            .last_registration()
            .unwrap()
            .get("role")
            .cloned(),
        Some(json!("student"))
    );
    assert!(!session.is_logged_in());
}

#[tokio::test]
async fn test_register_duplicate_email_surfaces_detail() {
    let ctx = TestContext::new().await;
    let session = ctx.session();

    let registration = Registration {
        name: "Avery Chen".to_string(),
        email: Email::parse(EMAIL).unwrap(),
        password: SecretString::from("again"),
        role: Role::Teacher,
    };
    let err = session.register(&registration).await.unwrap_err();
    assert_eq!(err.message(), "Email already registered");
}

#[tokio::test]
async fn test_logout_clears_memory_and_storage() {
    let ctx = TestContext::new().await;
    let mut session = ctx.session();
    session.login(&ctx.good_credentials()).await.unwrap();

    session.logout();

    assert!(!session.is_logged_in());
    assert_eq!(session.token(), "");
    assert_eq!(ctx.storage.get(keys::TOKEN).unwrap(), None);
    assert_eq!(ctx.storage.get(keys::USER_INFO).unwrap(), None);

    // Idempotent
    session.logout();
    assert!(!session.is_logged_in());
}
