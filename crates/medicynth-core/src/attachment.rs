//! Attachment ingestion and preview descriptors.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::Result;

const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "rar", "7z", "tar", "gz"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt"];

/// Binary payload waiting to be sent with the next message.
///
/// Serialized the way the chat API expects the `image` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub data: String,
    pub mime_type: String,
}

impl Attachment {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Video,
    Archive,
    Document,
    Other,
}

impl FileKind {
    /// MIME prefix wins over the file name; archives are checked before documents.
    pub fn classify(mime_type: &str, file_name: &str) -> Self {
        if mime_type.starts_with("image/") {
            return FileKind::Image;
        }
        if mime_type.starts_with("video/") {
            return FileKind::Video;
        }

        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some(ext) if ARCHIVE_EXTENSIONS.contains(&ext) => FileKind::Archive,
            Some(ext) if DOCUMENT_EXTENSIONS.contains(&ext) => FileKind::Document,
            _ => FileKind::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Image => "Image",
            FileKind::Video => "Video",
            FileKind::Archive => "Archive",
            FileKind::Document => "Document",
            FileKind::Other => "File",
        }
    }
}

/// What the preview area shows for a pending attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPreview {
    pub file_name: String,
    pub size: String,
    pub kind: FileKind,
}

/// Size in MiB with two decimals, e.g. `1.50 MB`.
pub fn format_size(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

/// Result of reading a file picked by the user
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub attachment: Attachment,
    pub preview: AttachmentPreview,
}

impl LoadedFile {
    pub fn from_bytes(file_name: &str, mime_type: &str, bytes: &[u8]) -> Self {
        let attachment = Attachment {
            data: STANDARD.encode(bytes),
            mime_type: mime_type.to_string(),
        };
        let preview = AttachmentPreview {
            file_name: file_name.to_string(),
            size: format_size(bytes.len() as u64),
            kind: FileKind::classify(mime_type, file_name),
        };
        Self { attachment, preview }
    }
}

/// Read a file and encode it as a pending attachment.
pub async fn read_attachment(path: &Path) -> Result<LoadedFile> {
    let bytes = tokio::fs::read(path).await?;
    let mime_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    tracing::debug!(file = %file_name, mime = %mime_type, bytes = bytes.len(), "read attachment");
    Ok(LoadedFile::from_bytes(&file_name, &mime_type, &bytes))
}
