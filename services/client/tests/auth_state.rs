mod common;

use client_lib::adapters::{FileTokenStore, InMemoryTokenStore};
use common::{auth_state, BrokenTokenStore, Call, FakeApi};
use document_manager_core::domain::{AuthStatus, AuthToken};
use document_manager_core::ports::{PortError, TokenStore};
use std::sync::Arc;

#[tokio::test]
async fn correct_otp_authenticates_and_persists_token() {
    let api = Arc::new(FakeApi::default());
    let tokens = Arc::new(InMemoryTokenStore::new());
    let (mut auth, session) = auth_state(&api, tokens.clone());

    assert!(auth.request_otp("9876543210").await);
    assert_eq!(auth.status(), AuthStatus::Anonymous);
    assert_eq!(auth.pending_phone_number(), "9876543210");

    assert!(auth.validate_otp("123456").await);
    assert_eq!(auth.status(), AuthStatus::Authenticated);
    assert_eq!(session.token(), Some(AuthToken::new("abc")));
    assert_eq!(tokens.load().await.unwrap(), Some(AuthToken::new("abc")));
    assert_eq!(auth.last_error(), None);

    assert_eq!(
        api.calls()[1],
        Call::ValidateOtp {
            token: None,
            mobile_number: "9876543210".to_string(),
            otp: "123456".to_string(),
        }
    );
}

#[tokio::test]
async fn wrong_otp_stays_anonymous_without_persisting() {
    let api = Arc::new(FakeApi::default());
    let tokens = Arc::new(InMemoryTokenStore::new());
    let (mut auth, _session) = auth_state(&api, tokens.clone());

    assert!(auth.request_otp("9876543210").await);
    assert!(!auth.validate_otp("000000").await);

    assert_eq!(auth.status(), AuthStatus::Anonymous);
    assert_eq!(auth.last_error(), Some("Invalid OTP"));
    assert_eq!(tokens.load().await.unwrap(), None);
}

#[tokio::test]
async fn failed_otp_request_keeps_no_pending_number() {
    let api = Arc::new(FakeApi {
        otp_failure: Some(PortError::Network),
        ..Default::default()
    });
    let (mut auth, _session) = auth_state(&api, Arc::new(InMemoryTokenStore::new()));

    assert!(!auth.request_otp("9876543210").await);
    assert_eq!(auth.pending_phone_number(), "");
    assert_eq!(auth.last_error(), Some("No response from server"));

    auth.clear_error();
    assert_eq!(auth.last_error(), None);
}

#[tokio::test]
async fn each_attempt_replaces_the_previous_error() {
    let api = Arc::new(FakeApi::default());
    let (mut auth, _session) = auth_state(&api, Arc::new(InMemoryTokenStore::new()));

    assert!(!auth.request_otp("").await);
    assert!(auth.last_error().is_some());

    assert!(auth.request_otp("9876543210").await);
    assert_eq!(auth.last_error(), None);
}

#[tokio::test]
async fn blank_input_is_rejected_before_dispatch() {
    let api = Arc::new(FakeApi::default());
    let (mut auth, _session) = auth_state(&api, Arc::new(InMemoryTokenStore::new()));

    assert!(!auth.request_otp("   ").await);
    assert_eq!(auth.last_error(), Some("Please enter your phone number"));

    assert!(!auth.validate_otp("123456").await);
    assert_eq!(auth.last_error(), Some("Request an OTP first"));

    assert!(auth.request_otp("9876543210").await);
    assert!(!auth.validate_otp("").await);
    assert_eq!(auth.last_error(), Some("Please enter the OTP"));

    assert_eq!(api.calls().len(), 1);
}

#[tokio::test]
async fn token_is_not_set_when_it_cannot_be_persisted() {
    let api = Arc::new(FakeApi::default());
    let (mut auth, session) = auth_state(&api, Arc::new(BrokenTokenStore::default()));

    assert!(auth.request_otp("9876543210").await);
    assert!(!auth.validate_otp("123456").await);

    assert_eq!(session.status(), AuthStatus::Anonymous);
    assert_eq!(auth.last_error(), Some("Local storage error: disk full"));
}

#[tokio::test]
async fn logout_always_returns_to_anonymous() {
    let api = Arc::new(FakeApi::default());
    let tokens = Arc::new(InMemoryTokenStore::new());
    let (mut auth, session) = auth_state(&api, tokens.clone());

    // From Anonymous.
    auth.logout().await;
    assert_eq!(auth.status(), AuthStatus::Anonymous);

    // From Authenticated.
    assert!(auth.request_otp("9876543210").await);
    assert!(auth.validate_otp("123456").await);
    auth.logout().await;

    assert_eq!(session.status(), AuthStatus::Anonymous);
    assert_eq!(auth.pending_phone_number(), "");
    assert_eq!(tokens.load().await.unwrap(), None);
    assert_eq!(auth.last_error(), None);
}

#[tokio::test]
async fn logout_ends_anonymous_even_if_storage_fails() {
    let api = Arc::new(FakeApi::default());
    let tokens = Arc::new(BrokenTokenStore {
        inner: InMemoryTokenStore::with_token(AuthToken::new("abc")),
    });
    let (mut auth, session) = auth_state(&api, tokens);

    assert!(auth.restore_session().await);
    assert!(auth.is_authenticated());

    auth.logout().await;
    assert_eq!(session.status(), AuthStatus::Anonymous);
    assert_eq!(auth.last_error(), Some("Local storage error: read-only"));
}

#[tokio::test]
async fn authenticated_session_sends_its_token() {
    let api = Arc::new(FakeApi::default());
    let (mut auth, _session) = auth_state(
        &api,
        Arc::new(InMemoryTokenStore::with_token(AuthToken::new("stored"))),
    );

    assert!(auth.restore_session().await);
    assert!(auth.request_otp("9876543210").await);
    assert_eq!(
        api.calls()[0],
        Call::RequestOtp {
            token: Some(AuthToken::new("stored")),
            mobile_number: "9876543210".to_string(),
        }
    );
}

#[tokio::test]
async fn session_survives_restart_through_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let api = Arc::new(FakeApi::default());

    {
        let (mut auth, _session) = auth_state(&api, Arc::new(FileTokenStore::new(&path)));
        assert!(auth.request_otp("9876543210").await);
        assert!(auth.validate_otp("123456").await);
    }

    let (mut restarted, session) = auth_state(&api, Arc::new(FileTokenStore::new(&path)));
    assert_eq!(session.status(), AuthStatus::Anonymous);
    assert!(restarted.restore_session().await);
    assert_eq!(session.token(), Some(AuthToken::new("abc")));
    assert_eq!(restarted.pending_phone_number(), "9876543210");

    restarted.logout().await;
    let (mut after_logout, session) = auth_state(&api, Arc::new(FileTokenStore::new(&path)));
    assert!(!after_logout.restore_session().await);
    assert_eq!(session.pending_phone_number(), "");
}

#[tokio::test]
async fn verified_phone_number_is_persisted_with_the_token() {
    let api = Arc::new(FakeApi::default());
    let tokens = Arc::new(InMemoryTokenStore::new());
    let (mut auth, _session) = auth_state(&api, tokens.clone());

    assert!(auth.request_otp(" 9876543210 ").await);
    assert!(auth.validate_otp("123456").await);
    assert_eq!(
        tokens.load_phone_number().await.unwrap().as_deref(),
        Some("9876543210")
    );

    auth.logout().await;
    assert_eq!(tokens.load_phone_number().await.unwrap(), None);
}
