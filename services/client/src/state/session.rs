//! services/client/src/state/session.rs
//!
//! The shared handle over the current `Session`.

use document_manager_core::domain::{AuthStatus, AuthToken, Session};
use std::sync::{Arc, PoisonError, RwLock};

/// A cloneable handle to the one `Session` of the running client. Every container
/// that needs the token holds a clone of the same handle.
#[derive(Clone, Debug, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Session>>,
}

impl SessionHandle {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(RwLock::new(session)),
        }
    }

    pub fn snapshot(&self) -> Session {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn token(&self) -> Option<AuthToken> {
        self.snapshot().auth_token
    }

    pub fn status(&self) -> AuthStatus {
        self.snapshot().status()
    }

    pub fn pending_phone_number(&self) -> String {
        self.snapshot().pending_phone_number
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut session = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut session)
    }
}
