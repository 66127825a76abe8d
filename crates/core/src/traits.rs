//! ObjectStore trait definition
//!
//! This trait defines the interface for S3-compatible storage operations.
//! It allows the HTTP handlers to be decoupled from the specific S3 SDK
//! implementation.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A stream of object bytes, read or written chunk by chunk
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Metadata for one stored object, as reported by a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ObjectInfo {
    /// Object key
    pub key: String,

    /// Size in bytes
    pub size: u64,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = DateTime))]
    pub last_modified: Option<Timestamp>,

    /// ETag (usually MD5 for single-part uploads)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for a file
    pub fn file(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
            last_modified: None,
            etag: None,
        }
    }
}

/// Trait for S3-compatible storage operations
///
/// This trait is implemented by the S3 adapter and can be mocked for testing.
/// Implementations hold no mutable state and are shared across requests.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Open an object for reading
    ///
    /// Returns `Error::NotFound` when the key does not exist.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ByteStream>;

    /// List every object in a bucket
    ///
    /// The stream is lazy and finite: further pages are requested only while
    /// it is polled, and it ends once the backend reports the last page.
    /// Ending is the only completion signal; the listing is never restarted.
    fn list_objects(&self, bucket: &str) -> BoxStream<'static, Result<ObjectInfo>>;

    /// Write an object, replacing any existing one at the same key
    ///
    /// `length` is the exact payload size when known up front.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: ByteStream,
        length: Option<u64>,
    ) -> Result<()>;

    /// Delete an object; deleting a missing key succeeds
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_info_file() {
        let info = ObjectInfo::file("docs/report.txt", 1024);
        assert_eq!(info.key, "docs/report.txt");
        assert_eq!(info.size, 1024);
        assert!(info.last_modified.is_none());
    }

    #[test]
    fn test_object_info_json_shape() {
        let mut info = ObjectInfo::file("docs/report.txt", 5);
        info.last_modified = Some(Timestamp::from_second(0).unwrap());
        info.etag = Some("abc".into());

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["key"], "docs/report.txt");
        assert_eq!(json["size"], 5);
        assert_eq!(json["lastModified"], "1970-01-01T00:00:00Z");
        assert_eq!(json["etag"], "abc");
    }

    #[test]
    fn test_object_info_omits_missing_fields() {
        let json = serde_json::to_value(ObjectInfo::file("a/b", 0)).unwrap();
        assert!(json.get("lastModified").is_none());
        assert!(json.get("etag").is_none());
    }
}
