//! services/client/src/adapters/http_api.rs
//!
//! This module contains the HTTP adapter, which is the concrete implementation of the
//! `DocumentManagementApi` port from the `core` crate. It talks to the remote
//! document-management service using `reqwest`.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use document_manager_core::domain::{
    mime_type_for_name, AuthToken, Document, DocumentDraft, FileAttachment, MajorHead,
    SearchQuery, SEARCH_PAGE_LENGTH, SEARCH_PAGE_START,
};
use document_manager_core::ports::{
    DocumentManagementApi, OtpDispatch, OtpVerification, PortError, PortResult, SearchResults,
    UploadReceipt,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::adapters::local_file;

/// Header carrying the session token on every request.
pub const TOKEN_HEADER: &str = "token";

//=========================================================================================
// Endpoints
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    GenerateOtp,
    ValidateOtp,
    SaveDocumentEntry,
    SearchDocumentEntry,
    DocumentTags,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Endpoint::GenerateOtp => "generateOTP",
            Endpoint::ValidateOtp => "validateOTP",
            Endpoint::SaveDocumentEntry => "saveDocumentEntry",
            Endpoint::SearchDocumentEntry => "searchDocumentEntry",
            Endpoint::DocumentTags => "documentTags",
        }
    }

    /// Shown to the user when the service fails without saying why.
    fn failure_message(self) -> &'static str {
        match self {
            Endpoint::GenerateOtp => "Failed to send OTP",
            Endpoint::ValidateOtp => "Invalid OTP",
            Endpoint::SaveDocumentEntry => "Failed to upload document",
            Endpoint::SearchDocumentEntry => "Failed to search documents",
            Endpoint::DocumentTags => "Failed to fetch tags",
        }
    }

    fn service_error(self, message: Option<String>) -> PortError {
        PortError::Service(
            message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| self.failure_message().to_string()),
        )
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `DocumentManagementApi` port over HTTP.
#[derive(Clone, Debug)]
pub struct HttpDocumentApi {
    client: Client,
    base_url: Url,
}

impl HttpDocumentApi {
    /// Creates a new `HttpDocumentApi`. `timeout` bounds each request end to end.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn endpoint_url(&self, endpoint: Endpoint) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            endpoint.path()
        )
    }

    /// Resolves a stored file's location. Relative URIs are taken to live under the
    /// API base; absolute ones are used as they are.
    fn file_url(&self, uri: &str) -> PortResult<Url> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(uri.trim())
            .map_err(|e| PortError::RequestSetup(format!("Invalid file location '{}': {}", uri, e)))
    }

    fn post(&self, endpoint: Endpoint, token: Option<&AuthToken>) -> RequestBuilder {
        with_token(self.client.post(self.endpoint_url(endpoint)), token)
    }

    /// Sends the request and unwraps the `{success, message, ...}` envelope.
    #[instrument(skip_all, fields(endpoint = endpoint.path()))]
    async fn dispatch<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        request: RequestBuilder,
    ) -> PortResult<(T, Option<String>)> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "request did not complete");
            classify_send_error(e)
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            warn!(%status, error = %e, "failed to read response body");
            PortError::Network
        })?;

        let outcome: Outcome = match serde_json::from_slice(&body) {
            Ok(outcome) => outcome,
            Err(e) if status.is_success() => {
                error!(%status, error = %e, "response is not a JSON envelope");
                return Err(malformed_response(e));
            }
            Err(_) => Outcome::default(),
        };

        if !status.is_success() || !outcome.success {
            warn!(%status, "service reported a failure");
            return Err(endpoint.service_error(outcome.message));
        }

        let payload = serde_json::from_slice::<T>(&body).map_err(|e| {
            error!(%status, error = %e, "response payload could not be decoded");
            malformed_response(e)
        })?;
        info!(%status, "request succeeded");
        Ok((payload, outcome.message))
    }
}

fn with_token(request: RequestBuilder, token: Option<&AuthToken>) -> RequestBuilder {
    match token {
        Some(token) => request.header(TOKEN_HEADER, token.as_str()),
        None => request,
    }
}

/// A failure while sending means either the request was never built or no
/// response came back.
fn classify_send_error(err: reqwest::Error) -> PortError {
    if err.is_builder() {
        PortError::RequestSetup(err.to_string())
    } else {
        PortError::Network
    }
}

fn malformed_response(detail: impl std::fmt::Display) -> PortError {
    PortError::Service(format!("Unexpected response from server: {}", detail))
}

//=========================================================================================
// "Impure" Wire Structs
//=========================================================================================

#[derive(Serialize)]
struct GenerateOtpBody<'a> {
    mobile_number: &'a str,
}

#[derive(Serialize)]
struct ValidateOtpBody<'a> {
    mobile_number: &'a str,
    otp: &'a str,
}

#[derive(Serialize)]
struct TagsQueryBody<'a> {
    term: &'a str,
}

#[derive(Serialize, Debug, PartialEq)]
struct TagBody<'a> {
    tag_name: &'a str,
}

fn tag_bodies(tags: &[String]) -> Vec<TagBody<'_>> {
    tags.iter().map(|tag| TagBody { tag_name: tag }).collect()
}

fn wire_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// The JSON `data` part of the upload form.
#[derive(Serialize)]
struct UploadData<'a> {
    major_head: &'static str,
    minor_head: &'a str,
    document_date: String,
    document_remarks: &'a str,
    tags: Vec<TagBody<'a>>,
    user_id: &'a str,
}

impl<'a> UploadData<'a> {
    fn from_draft(draft: &'a DocumentDraft, owner_id: &'a str) -> Self {
        let metadata = &draft.metadata;
        Self {
            major_head: metadata.major_head.as_str(),
            minor_head: &metadata.minor_head,
            document_date: wire_date(Some(metadata.document_date)),
            document_remarks: metadata.remarks.as_deref().unwrap_or_default(),
            tags: tag_bodies(&metadata.tags),
            user_id: owner_id,
        }
    }
}

/// Absent filters are sent as empty strings. Paging is always the fixed first page.
#[derive(Serialize)]
struct SearchBody<'a> {
    major_head: &'static str,
    minor_head: &'a str,
    from_date: String,
    to_date: String,
    tags: Vec<TagBody<'a>>,
    start: u32,
    length: u32,
}

impl<'a> SearchBody<'a> {
    fn from_query(query: &'a SearchQuery) -> Self {
        Self {
            major_head: query.major_head.map(MajorHead::as_str).unwrap_or_default(),
            minor_head: query.minor_head.as_deref().unwrap_or_default(),
            from_date: wire_date(query.from_date),
            to_date: wire_date(query.to_date),
            tags: tag_bodies(&query.tags),
            start: SEARCH_PAGE_START,
            length: SEARCH_PAGE_LENGTH,
        }
    }
}

#[derive(Deserialize, Default)]
struct Outcome {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct TokenPayload {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Deserialize)]
struct Acknowledgement {}

#[derive(Deserialize)]
struct DocumentPayload {
    #[serde(default)]
    document: Option<DocumentRecord>,
}

#[derive(Deserialize)]
struct DocumentsPayload {
    #[serde(default, deserialize_with = "null_as_empty")]
    documents: Vec<DocumentRecord>,
}

#[derive(Deserialize)]
struct TagsPayload {
    #[serde(default, deserialize_with = "null_as_empty")]
    tags: Vec<TagRecord>,
}

/// Tags arrive either as `{"tag_name": ...}` objects or as bare strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum TagRecord {
    Named { tag_name: String },
    Plain(String),
}

impl TagRecord {
    fn into_name(self) -> String {
        match self {
            TagRecord::Named { tag_name } => tag_name,
            TagRecord::Plain(name) => name,
        }
    }
}

#[derive(Deserialize)]
struct FileRecord {
    #[serde(default, alias = "file_name", alias = "fileName")]
    name: String,
    #[serde(default, alias = "type", alias = "mimeType")]
    mime_type: Option<String>,
    #[serde(default, alias = "url", alias = "file_url", alias = "fileUrl")]
    uri: String,
    #[serde(default, alias = "size", alias = "sizeBytes")]
    size_bytes: Option<u64>,
}

impl FileRecord {
    fn to_domain(self) -> FileAttachment {
        let mime_type = self
            .mime_type
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| mime_type_for_name(&self.name).to_string());
        FileAttachment {
            name: self.name,
            mime_type,
            uri: self.uri,
            size_bytes: self.size_bytes,
        }
    }
}

/// Missing fields decode as empty and are rejected by `to_domain`, so a partial echo
/// of a saved upload can still report its id.
#[derive(Deserialize)]
struct DocumentRecord {
    #[serde(
        default,
        alias = "document_id",
        alias = "documentId",
        deserialize_with = "string_or_number"
    )]
    id: String,
    #[serde(default, alias = "majorHead")]
    major_head: String,
    #[serde(default, alias = "minorHead")]
    minor_head: String,
    #[serde(default, alias = "documentDate")]
    document_date: String,
    #[serde(default, alias = "document_remarks", alias = "documentRemarks")]
    remarks: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    tags: Vec<TagRecord>,
    #[serde(default)]
    file: Option<FileRecord>,
}

impl DocumentRecord {
    fn to_domain(self) -> PortResult<Document> {
        let major_head = self
            .major_head
            .parse::<MajorHead>()
            .map_err(malformed_response)?;
        let document_date = parse_wire_date(&self.document_date).ok_or_else(|| {
            malformed_response(format!("invalid document date '{}'", self.document_date))
        })?;
        Ok(Document {
            id: self.id,
            major_head,
            minor_head: self.minor_head,
            document_date,
            remarks: self.remarks.filter(|r| !r.trim().is_empty()),
            tags: self.tags.into_iter().map(TagRecord::into_name).collect(),
            file: self.file.map(FileRecord::to_domain).unwrap_or_default(),
        })
    }
}

/// The document the service stored, rebuilt from what was submitted.
fn saved_document(draft: &DocumentDraft, id: String) -> Document {
    let metadata = &draft.metadata;
    Document {
        id,
        major_head: metadata.major_head,
        minor_head: metadata.minor_head.clone(),
        document_date: metadata.document_date,
        remarks: metadata.remarks.clone(),
        tags: metadata.tags.clone(),
        file: draft.file.clone(),
    }
}

/// Accepts `YYYY-MM-DD` or any timestamp that starts with it.
fn parse_wire_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or numeric id, found {}",
            other
        ))),
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

//=========================================================================================
// `DocumentManagementApi` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentManagementApi for HttpDocumentApi {
    async fn request_otp(
        &self,
        token: Option<&AuthToken>,
        mobile_number: &str,
    ) -> PortResult<OtpDispatch> {
        let endpoint = Endpoint::GenerateOtp;
        let request = self
            .post(endpoint, token)
            .json(&GenerateOtpBody { mobile_number });
        let (Acknowledgement {}, message) = self.dispatch(endpoint, request).await?;
        Ok(OtpDispatch { message })
    }

    async fn validate_otp(
        &self,
        token: Option<&AuthToken>,
        mobile_number: &str,
        otp: &str,
    ) -> PortResult<OtpVerification> {
        let endpoint = Endpoint::ValidateOtp;
        let request = self
            .post(endpoint, token)
            .json(&ValidateOtpBody { mobile_number, otp });
        let (payload, message): (TokenPayload, _) = self.dispatch(endpoint, request).await?;
        let token = payload
            .token
            .filter(|t| !t.is_empty())
            .map(AuthToken::new)
            .ok_or_else(|| PortError::Service("Server did not return a token".to_string()))?;
        Ok(OtpVerification { token, message })
    }

    async fn upload_document(
        &self,
        token: Option<&AuthToken>,
        draft: &DocumentDraft,
        owner_id: &str,
    ) -> PortResult<UploadReceipt> {
        let endpoint = Endpoint::SaveDocumentEntry;
        let data = serde_json::to_string(&UploadData::from_draft(draft, owner_id))
            .map_err(|e| PortError::RequestSetup(e.to_string()))?;

        let content = local_file::read_attachment(&draft.file.uri)
            .await
            .map_err(|e| {
                PortError::RequestSetup(format!("Failed to read {}: {}", draft.file.name, e))
            })?;
        let file_part = Part::bytes(content)
            .file_name(draft.file.name.clone())
            .mime_str(&draft.file.mime_type)
            .map_err(|e| PortError::RequestSetup(e.to_string()))?;
        let form = Form::new().part("file", file_part).text("data", data);

        let request = self.post(endpoint, token).multipart(form);
        let (payload, message): (DocumentPayload, _) = self.dispatch(endpoint, request).await?;
        // The service has stored the file at this point; a thin echo is not a failure.
        let document = match payload.document {
            Some(record) => {
                let id = record.id.clone();
                record.to_domain().unwrap_or_else(|e| {
                    warn!(id = %id, error = %e, "saved document echo is incomplete");
                    saved_document(draft, id)
                })
            }
            None => {
                warn!("service did not echo the saved document");
                saved_document(draft, String::new())
            }
        };
        Ok(UploadReceipt { document, message })
    }

    async fn search_documents(
        &self,
        token: Option<&AuthToken>,
        query: &SearchQuery,
    ) -> PortResult<SearchResults> {
        let endpoint = Endpoint::SearchDocumentEntry;
        let request = self
            .post(endpoint, token)
            .json(&SearchBody::from_query(query));
        let (payload, message): (DocumentsPayload, _) = self.dispatch(endpoint, request).await?;
        let documents = payload
            .documents
            .into_iter()
            .map(DocumentRecord::to_domain)
            .collect::<PortResult<Vec<_>>>()?;
        Ok(SearchResults { documents, message })
    }

    async fn fetch_tags(&self, token: Option<&AuthToken>, term: &str) -> PortResult<Vec<String>> {
        let endpoint = Endpoint::DocumentTags;
        let request = self.post(endpoint, token).json(&TagsQueryBody { term });
        let (payload, _): (TagsPayload, _) = self.dispatch(endpoint, request).await?;
        Ok(payload.tags.into_iter().map(TagRecord::into_name).collect())
    }

    #[instrument(skip(self, token))]
    async fn download_file(&self, token: Option<&AuthToken>, uri: &str) -> PortResult<Bytes> {
        let url = self.file_url(uri)?;

        let response = with_token(self.client.get(url), token)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "download did not complete");
                classify_send_error(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "download rejected");
            return Err(PortError::Service("Failed to download file".to_string()));
        }
        let content = response.bytes().await.map_err(|e| {
            warn!(error = %e, "download interrupted");
            PortError::Network
        })?;
        info!(bytes = content.len(), "download finished");
        Ok(content)
    }
}
