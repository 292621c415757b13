//! `multipart/form-data` encoding for uploads.

use std::fmt::Write as _;

/// MIME type used when a file part has none and none can be guessed.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

const CRLF: &str = "\r\n";

/// File content for a form part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Raw file bytes.
    pub bytes: Vec<u8>,
    /// File name sent in `Content-Disposition`.
    pub filename: Option<String>,
    /// Explicit MIME type; guessed from `filename` when absent.
    pub mime_type: Option<String>,
}

impl FilePart {
    /// Creates a file part from raw bytes.
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            filename: None,
            mime_type: None,
        }
    }

    /// Sets the file name.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Sets the MIME type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Returns the MIME type sent for this part.
    ///
    /// Explicit type first, then a guess from the file extension, then
    /// [`DEFAULT_MIME_TYPE`].
    #[must_use]
    pub fn resolved_mime_type(&self) -> String {
        if let Some(mime) = self
            .mime_type
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
        {
            return mime.to_string();
        }

        self.filename
            .as_deref()
            .and_then(|name| mime_guess::from_path(name).first_raw())
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string()
    }
}

/// Content of a single form part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartContent {
    /// A scalar text field.
    Text(String),
    /// File content.
    File(FilePart),
}

/// A named form part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Field name.
    pub name: String,
    /// Field content.
    pub content: PartContent,
}

/// An ordered `multipart/form-data` body.
///
/// # Example
///
/// ```
/// use wa_cloud::transport::{FilePart, MultipartForm};
///
/// let form = MultipartForm::new()
///     .text("messaging_product", "whatsapp")
///     .file("file", FilePart::new(b"\x89PNG".to_vec()).with_filename("logo.png"));
///
/// assert!(form.content_type().starts_with("multipart/form-data; boundary="));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartForm {
    boundary: String,
    parts: Vec<Part>,
}

impl MultipartForm {
    /// Creates an empty form with a freshly generated boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(format!("wa-cloud-{}", uuid::Uuid::new_v4().simple()))
    }

    /// Creates an empty form with a fixed boundary.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    /// Appends a text field.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(Part {
            name: name.into(),
            content: PartContent::Text(value.into()),
        });
        self
    }

    /// Appends a file field.
    #[must_use]
    pub fn file(mut self, name: impl Into<String>, file: FilePart) -> Self {
        self.parts.push(Part {
            name: name.into(),
            content: PartContent::File(file),
        });
        self
    }

    /// Returns the boundary.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Returns the parts in order.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Returns the `Content-Type` header value for this form.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Encodes the form body.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut body = Vec::new();

        for part in &self.parts {
            let mut head = format!("--{}{CRLF}", self.boundary);
            let _ = write!(
                head,
                "Content-Disposition: form-data; name=\"{}\"",
                escape_quoted(&part.name)
            );

            match &part.content {
                PartContent::Text(value) => {
                    head.push_str(CRLF);
                    head.push_str(CRLF);
                    body.extend_from_slice(head.as_bytes());
                    body.extend_from_slice(value.as_bytes());
                }
                PartContent::File(file) => {
                    if let Some(ref filename) = file.filename {
                        let _ = write!(head, "; filename=\"{}\"", escape_quoted(filename));
                    }
                    let _ = write!(
                        head,
                        "{CRLF}Content-Type: {}{CRLF}{CRLF}",
                        file.resolved_mime_type()
                    );
                    body.extend_from_slice(head.as_bytes());
                    body.extend_from_slice(&file.bytes);
                }
            }

            body.extend_from_slice(CRLF.as_bytes());
        }

        body.extend_from_slice(format!("--{}--{CRLF}", self.boundary).as_bytes());
        body
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Percent-encodes characters that would break a quoted header parameter.
fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
