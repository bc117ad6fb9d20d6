//! services/client/src/state/app.rs
//!
//! The application state, created once at startup and handed to whatever front-end
//! drives the client.

use document_manager_core::ports::{DocumentManagementApi, TokenStore};
use std::sync::Arc;
use tracing::info;

use crate::adapters::{FileTokenStore, HttpDocumentApi};
use crate::config::Config;
use crate::error::ClientError;
use crate::state::{AuthState, DocumentState, SessionHandle};

pub struct AppState {
    pub config: Arc<Config>,
    pub session: SessionHandle,
    pub auth: AuthState,
    pub documents: DocumentState,
}

impl AppState {
    /// Builds the HTTP adapter and the file-backed token store from `config`, then
    /// restores any persisted session.
    pub async fn bootstrap(config: Config) -> Result<Self, ClientError> {
        let api = Arc::new(HttpDocumentApi::new(
            config.api_base_url.clone(),
            config.request_timeout,
        )?);
        let tokens = Arc::new(FileTokenStore::new(config.token_path.clone()));
        info!(base_url = %config.api_base_url, "client adapters initialized");
        Ok(Self::from_parts(config, api, tokens).await)
    }

    /// Wires both containers to one session, using the given ports.
    pub async fn from_parts(
        config: Config,
        api: Arc<dyn DocumentManagementApi>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        let session = SessionHandle::default();
        let mut auth = AuthState::new(api.clone(), tokens, session.clone());
        auth.restore_session().await;
        let documents = DocumentState::new(api, session.clone(), config.user_id.clone());

        Self {
            config: Arc::new(config),
            session,
            auth,
            documents,
        }
    }
}
