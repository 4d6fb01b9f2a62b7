use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Opaque reference to a file kept by the file host. The ledger never looks
/// inside a handle; it only stores and returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileHandle(String);

impl FileHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An image supplied to a write operation: either a freshly selected local
/// file that still needs uploading, or a handle from an earlier upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Local(PathBuf),
    Uploaded(FileHandle),
}

impl From<FileHandle> for ImageSource {
    fn from(handle: FileHandle) -> Self {
        ImageSource::Uploaded(handle)
    }
}
