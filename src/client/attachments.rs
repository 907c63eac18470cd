// Attachment preparation
// Maps file extensions to MIME types and enforces the upload limits before
// anything is sent to the proxy

use crate::state::AttachmentMeta;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Largest file that can be attached (20 MB)
pub const MAX_FILE_SIZE_BYTES: u64 = 20 * 1024 * 1024;

/// Most files that can be attached to one message
pub const MAX_FILES: usize = 10;

/// Extensions the proxy accepts and the MIME type each is sent as
const MIME_BY_EXTENSION: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("m4a", "audio/mp4"),
    ("weba", "audio/webm"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("ogg", "video/ogg"),
    ("ogv", "video/ogg"),
    ("pdf", "application/pdf"),
    ("txt", "text/plain"),
];

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("'{0}' is not a supported file type")]
    Unsupported(String),
    #[error("'{name}' is larger than {limit_mb} MB")]
    TooLarge { name: String, limit_mb: u64 },
    #[error("At most {0} files can be attached to one message")]
    TooMany(usize),
    #[error("Could not read '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// A file waiting to be sent with the next message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAttachment {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl PendingAttachment {
    /// Metadata kept in the conversation once the file is sent
    pub fn meta(&self) -> AttachmentMeta {
        AttachmentMeta {
            id: uuid::Uuid::new_v4().to_string(),
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            size: self.data.len() as u64,
        }
    }
}

/// MIME type for a file name, if the extension is on the allow-list
pub fn mime_type_for(name: &str) -> Option<&'static str> {
    let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    MIME_BY_EXTENSION
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
}

fn check_count(already_attached: usize) -> Result<(), AttachmentError> {
    if already_attached >= MAX_FILES {
        return Err(AttachmentError::TooMany(MAX_FILES));
    }
    Ok(())
}

fn check_size(name: &str, size: u64) -> Result<(), AttachmentError> {
    if size > MAX_FILE_SIZE_BYTES {
        return Err(AttachmentError::TooLarge {
            name: name.to_string(),
            limit_mb: MAX_FILE_SIZE_BYTES / (1024 * 1024),
        });
    }
    Ok(())
}

/// Validate in-memory file contents
pub fn prepare(
    name: &str,
    data: Vec<u8>,
    already_attached: usize,
) -> Result<PendingAttachment, AttachmentError> {
    check_count(already_attached)?;
    let mime_type =
        mime_type_for(name).ok_or_else(|| AttachmentError::Unsupported(name.to_string()))?;
    check_size(name, data.len() as u64)?;

    Ok(PendingAttachment {
        name: name.to_string(),
        mime_type: mime_type.to_string(),
        data,
    })
}

/// Validate and read a file from disk
///
/// Type and size are checked before the contents are read.
pub fn read_file(path: &Path, already_attached: usize) -> Result<PendingAttachment, AttachmentError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    check_count(already_attached)?;
    if mime_type_for(&name).is_none() {
        return Err(AttachmentError::Unsupported(name));
    }

    let io_error = |source| AttachmentError::Io {
        name: name.clone(),
        source,
    };
    let size = fs::metadata(path).map_err(io_error)?.len();
    check_size(&name, size)?;
    let data = fs::read(path).map_err(io_error)?;

    prepare(&name, data, already_attached)
}
