//! crates/document_manager_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the client's core logic.
//! These traits form the boundary of the hexagonal architecture, keeping the state
//! containers independent of the HTTP transport and of the device storage.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{AuthToken, Document, DocumentDraft, SearchQuery, ValidationError};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error taxonomy surfaced by every port. The `Display` output of each variant is
/// the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// The server answered, but reported a logical failure.
    #[error("{0}")]
    Service(String),
    /// No response reached the client (connection failure or timeout).
    #[error("No response from server")]
    Network,
    /// The request could not be built, so nothing was sent.
    #[error("{0}")]
    RequestSetup(String),
    /// The durable token storage could not be read or written.
    #[error("Local storage error: {0}")]
    Storage(String),
}

impl From<ValidationError> for PortError {
    fn from(err: ValidationError) -> Self {
        PortError::RequestSetup(err.to_string())
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Port Response Types
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpDispatch {
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpVerification {
    pub token: AuthToken,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub document: Document,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults {
    pub documents: Vec<Document>,
    pub message: Option<String>,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The remote document-management service. Every call carries the current session
/// token when one exists.
#[async_trait]
pub trait DocumentManagementApi: Send + Sync {
    // --- Authentication ---
    async fn request_otp(
        &self,
        token: Option<&AuthToken>,
        mobile_number: &str,
    ) -> PortResult<OtpDispatch>;

    async fn validate_otp(
        &self,
        token: Option<&AuthToken>,
        mobile_number: &str,
        otp: &str,
    ) -> PortResult<OtpVerification>;

    // --- Documents ---
    async fn upload_document(
        &self,
        token: Option<&AuthToken>,
        draft: &DocumentDraft,
        owner_id: &str,
    ) -> PortResult<UploadReceipt>;

    /// Always requests the fixed first page, whatever paging `query` carries.
    async fn search_documents(
        &self,
        token: Option<&AuthToken>,
        query: &SearchQuery,
    ) -> PortResult<SearchResults>;

    async fn fetch_tags(&self, token: Option<&AuthToken>, term: &str) -> PortResult<Vec<String>>;

    /// Fetches the content of a stored file from its URI.
    async fn download_file(&self, token: Option<&AuthToken>, uri: &str) -> PortResult<Bytes>;
}

/// Durable device-local storage for the `authToken` entry and the phone number the
/// token was issued for.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> PortResult<Option<AuthToken>>;

    async fn load_phone_number(&self) -> PortResult<Option<String>>;

    async fn save(&self, token: &AuthToken, phone_number: &str) -> PortResult<()>;

    /// Removes both the token and the phone number.
    async fn clear(&self) -> PortResult<()>;
}
