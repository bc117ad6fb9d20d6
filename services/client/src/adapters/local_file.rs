//! services/client/src/adapters/local_file.rs
//!
//! Access to files on the local device: describing a picked file and reading its
//! content for upload.

use document_manager_core::domain::{mime_type_for_name, FileAttachment};
use std::io;
use std::path::{Path, PathBuf};

/// Describes the file at `path` as an upload attachment.
pub async fn attachment_from_path(path: &Path) -> io::Result<FileAttachment> {
    let metadata = tokio::fs::metadata(path).await?;
    if !metadata.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a file", path.display()),
        ));
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(FileAttachment {
        mime_type: mime_type_for_name(&name).to_string(),
        name,
        uri: path.to_string_lossy().into_owned(),
        size_bytes: Some(metadata.len()),
    })
}

/// Reads the content behind an attachment URI (a plain path or a `file://` URI).
pub async fn read_attachment(uri: &str) -> io::Result<Vec<u8>> {
    tokio::fs::read(local_path(uri)).await
}

fn local_path(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri))
}

/// The base name of `name`, so a file from the service never escapes the target directory.
pub fn safe_file_name(name: &str) -> Option<String> {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.trim().is_empty())
}
