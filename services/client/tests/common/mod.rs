//! In-memory fakes of the core ports, shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use client_lib::adapters::InMemoryTokenStore;
use client_lib::state::{AuthState, DocumentState, SessionHandle};
use document_manager_core::domain::{
    AuthToken, Document, DocumentDraft, DocumentMetadata, FileAttachment, MajorHead, SearchQuery,
};
use document_manager_core::ports::{
    DocumentManagementApi, OtpDispatch, OtpVerification, PortError, PortResult, SearchResults,
    TokenStore, UploadReceipt,
};
use std::sync::{Arc, Mutex};

/// One recorded call to the fake service, with the token it carried.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    RequestOtp { token: Option<AuthToken>, mobile_number: String },
    ValidateOtp { token: Option<AuthToken>, mobile_number: String, otp: String },
    Upload { token: Option<AuthToken>, owner_id: String, file_name: String },
    Search { token: Option<AuthToken>, query: SearchQuery },
    Tags { token: Option<AuthToken>, term: String },
    Download { token: Option<AuthToken>, uri: String },
}

/// A scripted stand-in for the document-management service. Every field is public so
/// tests can script it with struct-update syntax over `FakeApi::default()`.
pub struct FakeApi {
    pub correct_otp: String,
    pub issued_token: String,
    pub otp_failure: Option<PortError>,
    pub upload_failure: Option<PortError>,
    pub search_response: PortResult<Vec<Document>>,
    pub tags_response: PortResult<Vec<String>>,
    pub download_response: PortResult<Bytes>,
    pub calls: Mutex<Vec<Call>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            correct_otp: "123456".to_string(),
            issued_token: "abc".to_string(),
            otp_failure: None,
            upload_failure: None,
            search_response: Ok(Vec::new()),
            tags_response: Ok(Vec::new()),
            download_response: Ok(Bytes::from_static(b"%PDF-1.4")),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeApi {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DocumentManagementApi for FakeApi {
    async fn request_otp(
        &self,
        token: Option<&AuthToken>,
        mobile_number: &str,
    ) -> PortResult<OtpDispatch> {
        self.record(Call::RequestOtp {
            token: token.cloned(),
            mobile_number: mobile_number.to_string(),
        });
        match &self.otp_failure {
            Some(err) => Err(err.clone()),
            None => Ok(OtpDispatch { message: Some("OTP sent".to_string()) }),
        }
    }

    async fn validate_otp(
        &self,
        token: Option<&AuthToken>,
        mobile_number: &str,
        otp: &str,
    ) -> PortResult<OtpVerification> {
        self.record(Call::ValidateOtp {
            token: token.cloned(),
            mobile_number: mobile_number.to_string(),
            otp: otp.to_string(),
        });
        if otp == self.correct_otp {
            Ok(OtpVerification {
                token: AuthToken::new(self.issued_token.clone()),
                message: None,
            })
        } else {
            Err(PortError::Service("Invalid OTP".to_string()))
        }
    }

    async fn upload_document(
        &self,
        token: Option<&AuthToken>,
        draft: &DocumentDraft,
        owner_id: &str,
    ) -> PortResult<UploadReceipt> {
        self.record(Call::Upload {
            token: token.cloned(),
            owner_id: owner_id.to_string(),
            file_name: draft.file.name.clone(),
        });
        if let Some(err) = &self.upload_failure {
            return Err(err.clone());
        }
        let stored = self.calls().len();
        let metadata = &draft.metadata;
        Ok(UploadReceipt {
            document: Document {
                id: format!("doc-{}", stored),
                major_head: metadata.major_head,
                minor_head: metadata.minor_head.clone(),
                document_date: metadata.document_date,
                remarks: metadata.remarks.clone(),
                tags: metadata.tags.clone(),
                file: draft.file.clone(),
            },
            message: Some("Document saved".to_string()),
        })
    }

    async fn search_documents(
        &self,
        token: Option<&AuthToken>,
        query: &SearchQuery,
    ) -> PortResult<SearchResults> {
        self.record(Call::Search { token: token.cloned(), query: query.clone() });
        self.search_response.clone().map(|documents| SearchResults { documents, message: None })
    }

    async fn fetch_tags(&self, token: Option<&AuthToken>, term: &str) -> PortResult<Vec<String>> {
        self.record(Call::Tags { token: token.cloned(), term: term.to_string() });
        self.tags_response.clone()
    }

    async fn download_file(&self, token: Option<&AuthToken>, uri: &str) -> PortResult<Bytes> {
        self.record(Call::Download { token: token.cloned(), uri: uri.to_string() });
        self.download_response.clone()
    }
}

/// A token store whose writes always fail.
#[derive(Default)]
pub struct BrokenTokenStore {
    pub inner: InMemoryTokenStore,
}

#[async_trait]
impl TokenStore for BrokenTokenStore {
    async fn load(&self) -> PortResult<Option<AuthToken>> {
        self.inner.load().await
    }

    async fn load_phone_number(&self) -> PortResult<Option<String>> {
        self.inner.load_phone_number().await
    }

    async fn save(&self, _token: &AuthToken, _phone_number: &str) -> PortResult<()> {
        Err(PortError::Storage("disk full".to_string()))
    }

    async fn clear(&self) -> PortResult<()> {
        Err(PortError::Storage("read-only".to_string()))
    }
}

pub fn auth_state(api: &Arc<FakeApi>, tokens: Arc<dyn TokenStore>) -> (AuthState, SessionHandle) {
    let session = SessionHandle::default();
    let auth = AuthState::new(api.clone(), tokens, session.clone());
    (auth, session)
}

pub fn document_state(api: &Arc<FakeApi>, session: SessionHandle, owner: Option<&str>) -> DocumentState {
    DocumentState::new(api.clone(), session, owner.map(str::to_string))
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn pdf_attachment(name: &str) -> FileAttachment {
    FileAttachment {
        name: name.to_string(),
        mime_type: "application/pdf".to_string(),
        uri: format!("/tmp/{}", name),
        size_bytes: Some(1024),
    }
}

pub fn draft(major: MajorHead, minor: &str, tags: &[&str], file_name: &str) -> DocumentDraft {
    let metadata = DocumentMetadata::new(
        major,
        minor,
        date(2024, 4, 1),
        None,
        tags.iter().map(|t| t.to_string()).collect(),
    )
    .unwrap();
    DocumentDraft { metadata, file: pdf_attachment(file_name) }
}

pub fn stored_document(id: &str, major: MajorHead, minor: &str) -> Document {
    Document {
        id: id.to_string(),
        major_head: major,
        minor_head: minor.to_string(),
        document_date: date(2024, 1, 15),
        remarks: None,
        tags: vec!["tax".to_string()],
        file: pdf_attachment(&format!("{}.pdf", id)),
    }
}
