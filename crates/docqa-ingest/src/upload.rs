//! Uploaded files and their declared content types.

use std::path::Path;

use serde::{Deserialize, Serialize};

pub const MIME_TEXT: &str = "text/plain";
pub const MIME_PDF: &str = "application/pdf";

/// Declared content type of an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MimeType {
    PlainText,
    Pdf,
    Other(String),
}

impl MimeType {
    /// Parse a declared content type. Parameters such as `charset` are ignored.
    pub fn parse(content_type: &str) -> Self {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase();
        match essence.as_str() {
            MIME_TEXT => Self::PlainText,
            MIME_PDF => Self::Pdf,
            _ => Self::Other(essence),
        }
    }

    /// Infer the content type from a filename extension.
    pub fn from_filename(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "txt" => Self::PlainText,
            "pdf" => Self::Pdf,
            "" => Self::Other(String::new()),
            other => Self::Other(format!("application/x-{}", other)),
        }
    }

    /// Resolve the type of an upload, falling back to the extension when the
    /// uploader declared nothing useful.
    pub fn resolve(declared: Option<&str>, filename: &str) -> Self {
        match declared.map(Self::parse) {
            Some(Self::Other(ref essence))
                if essence.is_empty() || essence == "application/octet-stream" =>
            {
                Self::from_filename(filename)
            }
            Some(mime) => mime,
            None => Self::from_filename(filename),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::PlainText => MIME_TEXT,
            Self::Pdf => MIME_PDF,
            Self::Other(s) => s,
        }
    }
}

impl std::fmt::Display for MimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file received from the upload surface. Consumed once by the ingester.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: MimeType,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, mime_type: MimeType, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            mime_type,
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, inferring its type from the extension.
    pub fn from_path(path: &Path) -> docqa_core::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unnamed")
            .to_string();
        let mime_type = MimeType::from_filename(&name);
        Ok(Self {
            name,
            mime_type,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ignores_parameters() {
        assert_eq!(MimeType::parse("text/plain; charset=utf-8"), MimeType::PlainText);
        assert_eq!(MimeType::parse("Application/PDF"), MimeType::Pdf);
        assert_eq!(
            MimeType::parse("image/png"),
            MimeType::Other("image/png".into())
        );
    }

    #[test]
    fn test_resolve_falls_back_to_extension() {
        assert_eq!(MimeType::resolve(None, "notes.TXT"), MimeType::PlainText);
        assert_eq!(
            MimeType::resolve(Some("application/octet-stream"), "paper.pdf"),
            MimeType::Pdf
        );
        // A declared type wins over the extension.
        assert_eq!(
            MimeType::resolve(Some("image/png"), "notes.txt"),
            MimeType::Other("image/png".into())
        );
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let file = UploadedFile::from_path(&path).unwrap();
        assert_eq!(file.name, "notes.txt");
        assert_eq!(file.mime_type, MimeType::PlainText);
        assert_eq!(file.bytes, b"hello");
    }
}
