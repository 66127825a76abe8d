//! Storage configuration
//!
//! Credentials, bucket and the activation flag are read once from the
//! process environment at startup. The backend endpoint, region and TLS
//! mode are fixed at compile time.

use std::fmt;

use url::Url;

use crate::error::{Error, Result};

/// Environment variable holding the access key
pub const ENV_ACCESS_KEY: &str = "SELECTEL_FILESTORAGE_ACCESSKEY";

/// Environment variable holding the secret key
pub const ENV_SECRET_KEY: &str = "SELECTEL_FILESTORAGE_SECRETKEY";

/// Environment variable holding the activation flag ("true"/"false")
pub const ENV_IS_ACTIVE: &str = "SELECTEL_FILESTORAGE_ISACTIVE";

/// Environment variable holding the bucket name
pub const ENV_BUCKET: &str = "SELECTEL_FILESTORAGE_BUCKET";

/// Value assumed when the activation flag is not set at all
const DEFAULT_IS_ACTIVE: &str = "true";

/// Connection descriptor for the object-storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendEndpoint {
    /// Host name, without scheme
    pub host: &'static str,

    /// Signing region
    pub region: &'static str,

    /// Use HTTPS
    pub tls: bool,
}

impl BackendEndpoint {
    /// The storage backend this gateway talks to
    pub const DEFAULT: Self = Self {
        host: "s3.storage.selcloud.ru",
        region: "ru-1",
        tls: true,
    };

    /// Endpoint URL handed to the S3 client
    pub fn url(&self) -> Result<Url> {
        let scheme = if self.tls { "https" } else { "http" };
        Url::parse(&format!("{scheme}://{}", self.host))
            .map_err(|e| Error::Config(format!("invalid endpoint '{}': {e}", self.host)))
    }
}

/// Storage settings, immutable once loaded
#[derive(Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Kill-switch: when false every storage operation is refused
    pub is_active: bool,

    /// Access key ID
    pub access_key: String,

    /// Secret access key
    pub secret_key: String,

    /// Bucket all objects live in
    pub bucket: String,
}

impl StorageConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Missing values default to an empty string, and the activation flag
    /// defaults to `true`. An activation flag that cannot be parsed disables
    /// storage and logs a warning instead of failing startup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_key = lookup(ENV_ACCESS_KEY).unwrap_or_default();
        let secret_key = lookup(ENV_SECRET_KEY).unwrap_or_default();
        let bucket = lookup(ENV_BUCKET).unwrap_or_default();
        let is_active_raw = lookup(ENV_IS_ACTIVE).unwrap_or_else(|| DEFAULT_IS_ACTIVE.to_string());

        let is_active = parse_active_flag(&is_active_raw).unwrap_or_else(|| {
            tracing::warn!(
                "{ENV_IS_ACTIVE}='{is_active_raw}' is not a boolean, storage will be inactive"
            );
            false
        });

        Self {
            is_active,
            access_key,
            secret_key,
            bucket,
        }
    }
}

// Keep the secret out of logs.
impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("is_active", &self.is_active)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .finish()
    }
}

/// Parse an activation flag value
///
/// Accepts `true` or `false` in any letter case, surrounded by optional
/// whitespace. Returns None for anything else.
pub fn parse_active_flag(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
