//! Pending user input.
//!
//! Typed text and imported documents accumulate here until the user sends
//! them. Importing never submits anything.

use tracing::info;

use distress_core::import::{ImportError, UploadedFile, validate_upload};
use distress_core::service::DocumentImporter;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composer {
    buffer: String,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.trim().is_empty()
    }

    /// Append `text` on a new line.
    pub fn push_line(&mut self, text: &str) {
        if !self.buffer.is_empty() {
            self.buffer.push('\n');
        }
        self.buffer.push_str(text);
    }

    /// Validate `file`, extract its text and append it to the buffer,
    /// separated from existing content by a blank line.
    ///
    /// A file of the wrong type is rejected before `importer` is called,
    /// and any failure leaves the buffer as it was. Returns the number of
    /// characters appended.
    pub async fn import<I>(&mut self, importer: &I, file: &UploadedFile) -> Result<usize, ImportError>
    where
        I: DocumentImporter + ?Sized,
    {
        validate_upload(file)?;

        let extracted = importer.extract_text(&file.filename, &file.bytes).await?;
        let text = extracted.trim();
        if text.is_empty() {
            return Err(ImportError::Empty {
                filename: file.filename.clone(),
            });
        }

        if !self.buffer.is_empty() {
            if !self.buffer.ends_with('\n') {
                self.buffer.push('\n');
            }
            self.buffer.push('\n');
        }
        self.buffer.push_str(text);

        let appended = text.chars().count();
        info!(filename = %file.filename, chars = appended, "document imported into input");
        Ok(appended)
    }

    /// Take the buffered input, leaving the composer empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }
}
