//! Object key construction
//!
//! Keys are built from two route segments: a directory path and a file
//! name, joined with a forward slash. Segments are taken as-is; there is
//! no normalization or escaping, and `..` is passed through to the backend.

use std::fmt;

use crate::error::{Error, Result};

/// Full key of one object inside a bucket
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    /// Directory part, may itself contain slashes (e.g. `dir1/dir2`)
    pub dir: String,
    /// File name
    pub name: String,
}

impl ObjectKey {
    /// Create a key from a directory path and a file name
    ///
    /// Both segments must be non-empty.
    pub fn new(dir: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        let name = name.into();

        if dir.is_empty() {
            return Err(Error::InvalidPath("Directory path cannot be empty".into()));
        }
        if name.is_empty() {
            return Err(Error::InvalidPath("File name cannot be empty".into()));
        }

        Ok(Self { dir, name })
    }
}

/// The key as sent to the backend: `dir/name`
impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.dir, self.name)
    }
}
