//! Validation of uploaded documents before text extraction.
//!
//! Only Word (DOCX) documents are accepted. A file is rejected from its
//! declared type, extension and leading bytes alone, so nothing is sent to
//! the extraction service for a file that cannot be a DOCX.

use thiserror::Error;

use crate::error::ModelError;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// DOCX files are ZIP containers.
const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unsupported file type for {filename}: please upload a .docx document")]
    UnsupportedFormat { filename: String },

    #[error("{filename} is empty")]
    Empty { filename: String },

    #[error("text extraction failed: {0}")]
    Extraction(#[from] ModelError),
}

/// A file handed to the application, with the type its source declared.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    /// MIME type as declared by the picker or the caller, if any.
    pub declared_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, declared_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            declared_type,
            bytes,
        }
    }

    /// Guess the declared type from the file extension, as a file picker
    /// would.
    pub fn from_path_bytes(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let declared_type = mime_for_filename(&filename).map(str::to_string);
        Self {
            filename,
            declared_type,
            bytes,
        }
    }
}

fn mime_for_filename(filename: &str) -> Option<&'static str> {
    let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "docx" => Some(DOCX_MIME),
        "doc" => Some("application/msword"),
        "pdf" => Some("application/pdf"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}

/// Reject anything that is not a DOCX document.
pub fn validate_upload(file: &UploadedFile) -> Result<(), ImportError> {
    let unsupported = || ImportError::UnsupportedFormat {
        filename: file.filename.clone(),
    };

    match file.declared_type.as_deref() {
        Some(mime) if mime.eq_ignore_ascii_case(DOCX_MIME) => {}
        Some(_) => return Err(unsupported()),
        None => {
            let is_docx = file
                .filename
                .rsplit_once('.')
                .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("docx"));
            if !is_docx {
                return Err(unsupported());
            }
        }
    }

    if file.bytes.is_empty() {
        return Err(ImportError::Empty {
            filename: file.filename.clone(),
        });
    }
    if !file.bytes.starts_with(ZIP_SIGNATURE) {
        return Err(unsupported());
    }
    Ok(())
}
