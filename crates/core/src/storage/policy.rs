//! Upload size and content-type policy.

use super::error::StorageError;

/// Image content types accepted everywhere.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];

/// Content types accepted by general file uploads.
pub const ALLOWED_FILE_TYPES: &[&str] = &[
    // Images
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    // Documents
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/plain",
    "text/csv",
];

/// Default max file size: 10MB.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
/// Max image size: 5MB.
pub const MAX_IMAGE_SIZE: u64 = 5 * 1024 * 1024;

/// Effective ceiling and allow-list for one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Maximum size in bytes.
    pub max_size: u64,
    /// Accepted content types.
    pub allowed_types: Vec<String>,
}

impl UploadPolicy {
    /// General document + image policy.
    #[must_use]
    pub fn files() -> Self {
        Self {
            max_size: MAX_FILE_SIZE,
            allowed_types: to_owned(ALLOWED_FILE_TYPES),
        }
    }

    /// Image-only policy.
    #[must_use]
    pub fn images() -> Self {
        Self {
            max_size: MAX_IMAGE_SIZE,
            allowed_types: to_owned(ALLOWED_IMAGE_TYPES),
        }
    }

    /// Replace the defaults with whatever the caller supplied.
    #[must_use]
    pub fn with_overrides(mut self, max_size: Option<u64>, allowed_types: Option<Vec<String>>) -> Self {
        if let Some(max_size) = max_size {
            self.max_size = max_size;
        }
        if let Some(allowed_types) = allowed_types {
            self.allowed_types = allowed_types;
        }
        self
    }

    /// Check if a content type is allowed.
    #[must_use]
    pub fn is_type_allowed(&self, content_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == content_type)
    }

    /// Validate size first, then content type.
    ///
    /// # Errors
    ///
    /// Returns `FileTooLarge` or `InvalidContentType`.
    pub fn validate(&self, size: u64, content_type: &str) -> Result<(), StorageError> {
        if size > self.max_size {
            return Err(StorageError::file_too_large(size, self.max_size));
        }

        if !self.is_type_allowed(content_type) {
            return Err(StorageError::invalid_content_type(content_type));
        }

        Ok(())
    }
}

fn to_owned(types: &[&str]) -> Vec<String> {
    types.iter().map(ToString::to_string).collect()
}
