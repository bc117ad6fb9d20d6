pub mod domain;
pub mod ports;

pub use domain::{
    AuthStatus, AuthToken, Document, DocumentDraft, DocumentMetadata, FileAttachment, MajorHead,
    PreviewKind, SearchQuery, Session, ValidationError, SEARCH_PAGE_LENGTH, SEARCH_PAGE_START,
};
pub use ports::{
    DocumentManagementApi, OtpDispatch, OtpVerification, PortError, PortResult, SearchResults,
    TokenStore, UploadReceipt,
};
