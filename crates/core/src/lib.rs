//! fsg-core: Core library for the filestore-gateway HTTP facade
//!
//! This crate provides the pieces shared by the storage adapter and the
//! HTTP server:
//! - Storage configuration loaded from the process environment
//! - Object key construction from route segments
//! - ObjectStore trait for S3 operations
//!
//! This crate is designed to be independent of any specific S3 SDK,
//! so the handlers can be exercised against mocks and in-memory stores.

pub mod config;
pub mod error;
pub mod path;
pub mod traits;

pub use config::{BackendEndpoint, StorageConfig};
pub use error::{Error, Result};
pub use path::ObjectKey;
pub use traits::{ByteStream, ObjectInfo, ObjectStore};
