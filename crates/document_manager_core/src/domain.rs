//! crates/document_manager_core/src/domain.rs
//!
//! Defines the pure, core data structures for the document manager client.
//! These structs are independent of the HTTP wire format and of any storage backend.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Index of the first record requested by every search.
pub const SEARCH_PAGE_START: u32 = 0;
/// Number of records requested by every search. Searches are a single fixed page.
pub const SEARCH_PAGE_LENGTH: u32 = 10;

const PERSONAL_MINOR_HEADS: &[&str] = &["john", "tom", "emily", "sarah"];
const PROFESSIONAL_MINOR_HEADS: &[&str] = &["accounts", "hr", "it", "finance"];

//=========================================================================================
// Validation Errors
//=========================================================================================

/// Input rejected on the client before any request is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter your phone number")]
    MissingPhoneNumber,
    #[error("Please enter the OTP")]
    MissingOtp,
    #[error("Request an OTP first")]
    NoPendingPhoneNumber,
    #[error("Please select a category")]
    MissingMajorHead,
    #[error("Please select a sub-category")]
    MissingMinorHead,
    #[error("Unknown category: {0}")]
    UnknownMajorHead(String),
    #[error("'{minor}' is not a sub-category of {major}")]
    MinorHeadMismatch { major: MajorHead, minor: String },
    #[error("Please select a file to upload")]
    MissingFile,
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("The start date must not be after the end date")]
    InvalidDateRange,
    #[error("No user id is available for the upload")]
    MissingOwner,
}

//=========================================================================================
// Session
//=========================================================================================

/// Opaque token issued by the service after OTP validation.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(..)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Anonymous,
    Authenticated,
}

/// The client's authentication state. A token is present iff the user is authenticated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub auth_token: Option<AuthToken>,
    pub pending_phone_number: String,
}

impl Session {
    pub fn status(&self) -> AuthStatus {
        match self.auth_token {
            Some(_) => AuthStatus::Authenticated,
            None => AuthStatus::Anonymous,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == AuthStatus::Authenticated
    }
}

//=========================================================================================
// Classification
//=========================================================================================

/// Top level of the two-level document classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MajorHead {
    Personal,
    Professional,
}

impl MajorHead {
    pub const ALL: [MajorHead; 2] = [MajorHead::Personal, MajorHead::Professional];

    pub fn as_str(self) -> &'static str {
        match self {
            MajorHead::Personal => "personal",
            MajorHead::Professional => "professional",
        }
    }

    /// The sub-categories that may be filed under this category.
    pub fn minor_heads(self) -> &'static [&'static str] {
        match self {
            MajorHead::Personal => PERSONAL_MINOR_HEADS,
            MajorHead::Professional => PROFESSIONAL_MINOR_HEADS,
        }
    }

    /// Lowercases `minor` and checks that it belongs to this category.
    pub fn normalize_minor_head(self, minor: &str) -> Result<String, ValidationError> {
        let minor = minor.trim().to_lowercase();
        if minor.is_empty() {
            return Err(ValidationError::MissingMinorHead);
        }
        if !self.minor_heads().contains(&minor.as_str()) {
            return Err(ValidationError::MinorHeadMismatch { major: self, minor });
        }
        Ok(minor)
    }
}

impl fmt::Display for MajorHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MajorHead {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "personal" => Ok(MajorHead::Personal),
            "professional" => Ok(MajorHead::Professional),
            "" => Err(ValidationError::MissingMajorHead),
            other => Err(ValidationError::UnknownMajorHead(other.to_string())),
        }
    }
}

/// Trims tags and drops blank ones. Order and duplicates are kept.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|tag| tag.as_ref().trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

//=========================================================================================
// Files
//=========================================================================================

/// How a stored file can be previewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    Pdf,
    Image,
    Unsupported,
}

/// Guesses a mime type from a file name's extension.
pub fn mime_type_for_name(name: &str) -> &'static str {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

/// A file attached to a document. For uploads `uri` points at local content;
/// for stored documents it is where the service serves the file from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub name: String,
    pub mime_type: String,
    pub uri: String,
    pub size_bytes: Option<u64>,
}

impl FileAttachment {
    pub fn preview_kind(&self) -> PreviewKind {
        let mime = self.mime_type.to_ascii_lowercase();
        if mime.contains("pdf") {
            PreviewKind::Pdf
        } else if mime.starts_with("image/") {
            PreviewKind::Image
        } else {
            PreviewKind::Unsupported
        }
    }
}

//=========================================================================================
// Documents
//=========================================================================================

/// Validated metadata describing a document to upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    pub major_head: MajorHead,
    pub minor_head: String,
    pub document_date: NaiveDate,
    pub remarks: Option<String>,
    pub tags: Vec<String>,
}

impl DocumentMetadata {
    pub fn new(
        major_head: MajorHead,
        minor_head: &str,
        document_date: NaiveDate,
        remarks: Option<String>,
        tags: Vec<String>,
    ) -> Result<Self, ValidationError> {
        let minor_head = major_head.normalize_minor_head(minor_head)?;
        let remarks = remarks
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        Ok(Self {
            major_head,
            minor_head,
            document_date,
            remarks,
            tags: normalize_tags(tags),
        })
    }
}

/// Everything needed to upload one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDraft {
    pub metadata: DocumentMetadata,
    pub file: FileAttachment,
}

impl DocumentDraft {
    /// Only PDFs and images can be uploaded.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.file.name.trim().is_empty() {
            return Err(ValidationError::MissingFile);
        }
        match self.file.preview_kind() {
            PreviewKind::Pdf | PreviewKind::Image => Ok(()),
            PreviewKind::Unsupported => Err(ValidationError::UnsupportedFileType(
                self.file.mime_type.clone(),
            )),
        }
    }
}

/// A document stored by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub id: String,
    pub major_head: MajorHead,
    pub minor_head: String,
    pub document_date: NaiveDate,
    pub remarks: Option<String>,
    pub tags: Vec<String>,
    pub file: FileAttachment,
}

//=========================================================================================
// Search
//=========================================================================================

/// Search filters. `offset` and `limit` are kept for callers that track paging
/// themselves, but every search is sent as the fixed first page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub major_head: Option<MajorHead>,
    pub minor_head: Option<String>,
    pub tags: Vec<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub offset: u32,
    pub limit: u32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            major_head: None,
            minor_head: None,
            tags: Vec::new(),
            from_date: None,
            to_date: None,
            offset: SEARCH_PAGE_START,
            limit: SEARCH_PAGE_LENGTH,
        }
    }
}

impl SearchQuery {
    /// Returns a copy with the minor head lowercased and blank tags removed.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        let minor_head = match (self.major_head, self.minor_head.as_deref()) {
            (_, None) => None,
            (_, Some(minor)) if minor.trim().is_empty() => None,
            (None, Some(_)) => return Err(ValidationError::MissingMajorHead),
            (Some(major), Some(minor)) => Some(major.normalize_minor_head(minor)?),
        };
        if let (Some(from), Some(to)) = (self.from_date, self.to_date) {
            if from > to {
                return Err(ValidationError::InvalidDateRange);
            }
        }
        Ok(Self {
            major_head: self.major_head,
            minor_head,
            tags: normalize_tags(&self.tags),
            from_date: self.from_date,
            to_date: self.to_date,
            offset: self.offset,
            limit: self.limit,
        })
    }
}
