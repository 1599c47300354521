//! Normalized upload content.

use bytes::Bytes;

/// Bytes to upload together with the name and type the client declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    bytes: Bytes,
    filename: String,
    content_type: String,
}

impl FileContent {
    /// Wrap raw bytes with their original filename and declared type.
    #[must_use]
    pub fn new(
        bytes: impl Into<Bytes>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            filename: filename.into(),
            content_type: content_type.into(),
        }
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whether there are no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Original filename.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Declared content type.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The bytes, cheaply cloned.
    #[must_use]
    pub fn bytes(&self) -> Bytes {
        self.bytes.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len_matches_bytes() {
        let content = FileContent::new(vec![0u8; 1024], "data.csv", "text/csv");
        assert_eq!(content.len(), 1024);
        assert!(!content.is_empty());
        assert_eq!(content.filename(), "data.csv");
        assert_eq!(content.content_type(), "text/csv");
    }

    #[test]
    fn test_from_static_bytes() {
        let content = FileContent::new(Bytes::from_static(b""), "empty.txt", "text/plain");
        assert!(content.is_empty());
        assert_eq!(content.bytes(), Bytes::new());
    }
}
