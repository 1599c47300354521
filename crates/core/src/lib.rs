//! Core storage logic for Stowage.
//!
//! This crate contains the object storage engine with ZERO web dependencies.
//! Upload policy, key generation, and the object store client live here.
//!
//! # Modules
//!
//! - `storage` - Validation, key generation, and S3-compatible object access

pub mod storage;
