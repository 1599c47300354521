//! Object storage for uploaded files using Apache OpenDAL.
//!
//! The engine validates content against size/type policy, generates
//! collision-resistant keys, talks to one S3-compatible bucket (Cloudflare
//! R2) and hands back public or presigned URLs.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       StorageEngine                              │
//! │   UploadPolicy::validate ──► generate_key ──► ObjectStore::put   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                    ObjectStore (trait)                           │
//! │ OpendalStore: op.write_with / op.stat / op.delete / op.presign_* │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod content;
mod engine;
mod error;
mod key;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
mod policy;
mod store;

pub use config::StorageConfig;
pub use content::FileContent;
pub use engine::{
    CACHE_CONTROL, DEFAULT_IMAGE_FOLDER, ImageUploadOptions, ObjectMetadata, StorageEngine,
    UploadOptions, UploadResult,
};
pub use error::StorageError;
pub use key::{generate_key, sanitize_filename};
pub use policy::{
    ALLOWED_FILE_TYPES, ALLOWED_IMAGE_TYPES, MAX_FILE_SIZE, MAX_IMAGE_SIZE, UploadPolicy,
};
pub use store::{ObjectStat, ObjectStore, OpendalStore, PresignedUrl, PutObject};
