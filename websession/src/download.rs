//! Scoped temporary files for downloads.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tempfile::NamedTempFile;

use crate::error::Error;

/// A downloaded payload materialized as a temporary file.
///
/// The file lives only as long as this guard: dropping it deletes the file
/// on every exit path, error paths included. Call
/// [`persist`](DownloadedFile::persist) to move it to a permanent location
/// instead.
#[derive(Debug)]
pub struct DownloadedFile {
    file: NamedTempFile,
}

impl DownloadedFile {
    pub(crate) async fn materialize(payload: Bytes) -> Result<Self, Error> {
        let file = tokio::task::spawn_blocking(move || write_temp(&payload))
            .await
            .map_err(|join_error| Error::Download(Arc::new(std::io::Error::other(join_error))))?
            .map_err(|io_error| Error::Download(Arc::new(io_error)))?;
        Ok(DownloadedFile { file })
    }

    /// The temporary location of the downloaded file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Moves the file to `dest`, taking it out of temporary lifecycle.
    ///
    /// After this the file is the caller's to manage; nothing is deleted.
    pub fn persist(self, dest: impl AsRef<Path>) -> Result<PathBuf, Error> {
        let dest = dest.as_ref().to_path_buf();
        self.file
            .persist(&dest)
            .map(|_| dest)
            .map_err(|persist_error| Error::Download(Arc::new(persist_error.error)))
    }
}

fn write_temp(payload: &[u8]) -> std::io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(payload)?;
    file.flush()?;
    Ok(file)
}
