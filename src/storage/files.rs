use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use crate::domain::FileHandle;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("upload failed: {0}")]
pub struct UploadError(pub String);

/// File-hosting collaborator: takes a local file, returns an opaque handle.
/// Uploads happen before any document write, so a failed upload aborts the
/// surrounding operation with no partial state.
pub trait FileHost: Send + Sync + 'static {
    fn upload(
        &self,
        file: &Path,
        folder: &str,
    ) -> impl Future<Output = Result<FileHandle, UploadError>> + Send;
}

/// File host backed by a directory on disk. Uploads are copied under
/// `<root>/<folder>/` with a fresh name and handed back as
/// `<folder>/<name>` handles.
#[derive(Debug, Clone)]
pub struct DiskFileHost {
    root: PathBuf,
}

impl DiskFileHost {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileHost for DiskFileHost {
    async fn upload(&self, file: &Path, folder: &str) -> Result<FileHandle, UploadError> {
        let name = match file.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        };
        let dir = self.root.join(folder);
        fs::create_dir_all(&dir).map_err(|err| UploadError(err.to_string()))?;
        fs::copy(file, dir.join(&name))
            .map_err(|err| UploadError(format!("{}: {err}", file.display())))?;
        Ok(FileHandle::new(format!("{folder}/{name}")))
    }
}
