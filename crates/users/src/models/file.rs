//! Uploaded files.

use std::path::Path;

/// A file received in a multipart request.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Name the client gave the file.
    pub filename: String,
    /// MIME type declared by the client.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Create an uploaded file.
    #[must_use]
    pub fn new(filename: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            bytes,
        }
    }

    /// Returns the extension of the original filename including the dot, or
    /// an empty string.
    ///
    /// Only ASCII letters and digits are kept, so the extension is always
    /// safe to use in a storage reference.
    #[must_use]
    pub fn extension(&self) -> String {
        Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.chars().filter(char::is_ascii_alphanumeric).collect::<String>())
            .filter(|ext| !ext.is_empty())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default()
    }
}

// Contents are left out of debug output.
impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
