//! services/client/src/state/auth.rs
//!
//! Phone-number OTP authentication. Moves the session between Anonymous and
//! Authenticated and mirrors the token into durable storage.

use document_manager_core::domain::{AuthStatus, AuthToken, ValidationError};
use document_manager_core::ports::{DocumentManagementApi, PortError, PortResult, TokenStore};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::state::session::SessionHandle;

pub struct AuthState {
    api: Arc<dyn DocumentManagementApi>,
    tokens: Arc<dyn TokenStore>,
    session: SessionHandle,
    last_error: Option<String>,
}

impl AuthState {
    pub fn new(
        api: Arc<dyn DocumentManagementApi>,
        tokens: Arc<dyn TokenStore>,
        session: SessionHandle,
    ) -> Self {
        Self {
            api,
            tokens,
            session,
            last_error: None,
        }
    }

    /// Loads a previously persisted token, and the phone number it was issued for,
    /// into the session. An unreadable store leaves the session Anonymous.
    pub async fn restore_session(&mut self) -> bool {
        let result: PortResult<Option<(AuthToken, Option<String>)>> = async {
            let Some(token) = self.tokens.load().await? else {
                return Ok(None);
            };
            let phone_number = self.tokens.load_phone_number().await?;
            Ok::<_, PortError>(Some((token, phone_number)))
        }
        .await;

        match result {
            Ok(Some((token, phone_number))) => {
                self.session.update(|s| {
                    s.auth_token = Some(token);
                    s.pending_phone_number = phone_number.unwrap_or_default();
                });
                info!("restored persisted session");
                true
            }
            Ok(None) => false,
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    /// Asks the service to send an OTP to `phone_number` and remembers the number
    /// for the validation step.
    #[instrument(skip_all)]
    pub async fn request_otp(&mut self, phone_number: &str) -> bool {
        self.last_error = None;
        let phone_number = phone_number.trim();

        let result: PortResult<()> = async {
            if phone_number.is_empty() {
                return Err(PortError::from(ValidationError::MissingPhoneNumber));
            }
            let token = self.session.token();
            self.api.request_otp(token.as_ref(), phone_number).await?;
            Ok::<_, PortError>(())
        }
        .await;

        match result {
            Ok(()) => {
                self.session
                    .update(|s| s.pending_phone_number = phone_number.to_string());
                info!("OTP requested");
                true
            }
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    /// Checks `otp` against the pending phone number. On success the token and the
    /// phone number are persisted first, and only then is the token placed in the
    /// session.
    #[instrument(skip_all)]
    pub async fn validate_otp(&mut self, otp: &str) -> bool {
        self.last_error = None;
        let otp = otp.trim();

        let result: PortResult<AuthToken> = async {
            if otp.is_empty() {
                return Err(PortError::from(ValidationError::MissingOtp));
            }
            let phone_number = self.session.pending_phone_number();
            if phone_number.is_empty() {
                return Err(PortError::from(ValidationError::NoPendingPhoneNumber));
            }
            let current = self.session.token();
            let verification = self
                .api
                .validate_otp(current.as_ref(), &phone_number, otp)
                .await?;
            self.tokens.save(&verification.token, &phone_number).await?;
            Ok::<_, PortError>(verification.token)
        }
        .await;

        match result {
            Ok(token) => {
                self.session.update(|s| s.auth_token = Some(token));
                info!("session authenticated");
                true
            }
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    /// Always ends Anonymous, even when the stored token cannot be removed.
    #[instrument(skip_all)]
    pub async fn logout(&mut self) {
        self.last_error = None;
        let cleared = self.tokens.clear().await;
        self.session.update(|s| {
            s.auth_token = None;
            s.pending_phone_number.clear();
        });
        info!("logged out");
        if let Err(e) = cleared {
            self.fail(e);
        }
    }

    pub fn status(&self) -> AuthStatus {
        self.session.status()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == AuthStatus::Authenticated
    }

    pub fn pending_phone_number(&self) -> String {
        self.session.pending_phone_number()
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    fn fail(&mut self, err: PortError) {
        warn!(error = %err, "authentication step failed");
        self.last_error = Some(err.to_string());
    }
}
