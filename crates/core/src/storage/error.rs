//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// File size exceeds maximum allowed.
    #[error("File size exceeds maximum allowed size of {}MB", megabytes(.max))]
    FileTooLarge {
        /// Actual file size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// Content type not in the allow-list.
    #[error("File type {content_type} is not allowed")]
    InvalidContentType {
        /// The rejected content type.
        content_type: String,
    },

    /// Object not found in storage.
    #[error("file not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Presign operation not supported by the backing store.
    #[error("presign operation not supported by storage provider")]
    PresignNotSupported,

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// Any other failure from the object store.
    #[error("{0}")]
    Operation(String),
}

impl StorageError {
    /// Create a file too large error.
    #[must_use]
    pub fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }

    /// Create an invalid content type error.
    #[must_use]
    pub fn invalid_content_type(content_type: impl Into<String>) -> Self {
        Self::InvalidContentType {
            content_type: content_type.into(),
        }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Whether this error is a size or type policy violation.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::FileTooLarge { .. } | Self::InvalidContentType { .. }
        )
    }

    /// Attach the requested key to an error raised by the store.
    #[must_use]
    pub(crate) fn for_key(self, key: &str) -> Self {
        match self {
            Self::NotFound { .. } => Self::not_found(key),
            other => other,
        }
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            opendal::ErrorKind::Unsupported => Self::PresignNotSupported,
            _ => Self::Operation(err.to_string()),
        }
    }
}

/// Formats a byte count as mebibytes without rounding, so limits below
/// 1MB never collapse to `0`.
#[allow(clippy::trivially_copy_pass_by_ref, clippy::cast_precision_loss)]
fn megabytes(bytes: &u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes % MIB == 0 {
        (bytes / MIB).to_string()
    } else {
        (*bytes as f64 / MIB as f64).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(5 * 1024 * 1024, "5")]
    #[case(10 * 1024 * 1024, "10")]
    #[case(1024 * 1024 + 512 * 1024, "1.5")]
    #[case(1024, "0.0009765625")]
    #[case(256 * 1024, "0.25")]
    fn test_megabytes(#[case] bytes: u64, #[case] expected: &str) {
        assert_eq!(megabytes(&bytes), expected);
    }

    #[test]
    fn test_file_too_large_names_limit() {
        let err = StorageError::file_too_large(6 * 1024 * 1024, 5 * 1024 * 1024);
        assert_eq!(
            err.to_string(),
            "File size exceeds maximum allowed size of 5MB"
        );
        assert!(err.is_validation());
    }

    #[test]
    fn test_small_limit_is_not_zero() {
        let err = StorageError::file_too_large(2048, 1024);
        assert_eq!(
            err.to_string(),
            "File size exceeds maximum allowed size of 0.0009765625MB"
        );
    }

    #[test]
    fn test_invalid_content_type_names_type() {
        let err = StorageError::invalid_content_type("application/x-msdownload");
        assert_eq!(
            err.to_string(),
            "File type application/x-msdownload is not allowed"
        );
        assert!(err.is_validation());
    }

    #[test]
    fn test_for_key_rewrites_not_found() {
        let err = StorageError::not_found("NotFound (persistent) at stat").for_key("a/b.png");
        assert!(matches!(err, StorageError::NotFound { ref key } if key == "a/b.png"));

        let err = StorageError::operation("boom").for_key("a/b.png");
        assert!(matches!(err, StorageError::Operation(_)));
        assert!(!err.is_validation());
    }
}
