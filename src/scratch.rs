//! Per-run scratch storage.
//!
//! Every pipeline run gets its own private directory holding the fetched
//! blob. The directory is removed when the [`ScratchHandle`] is dropped, on
//! every exit path.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufWriter};

use crate::utils::sanitize_file_name;

const SCRATCH_PREFIX: &str = "docpipe-";
const COPY_BUFFER: usize = 64 * 1024;

/// Errors that can occur while managing scratch storage.
#[derive(Debug, Error)]
pub enum ScratchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Blob exceeds the {limit} byte limit")]
    LimitExceeded { limit: u64 },
}

/// Exclusive scratch directory holding one blob.
pub struct ScratchHandle {
    dir: TempDir,
    file_path: PathBuf,
    max_bytes: u64,
}

impl ScratchHandle {
    /// Create a fresh directory under `root` (or the system temp dir).
    ///
    /// `file_name` is sanitized before use; the blob path keeps its
    /// extension so tools that look at it see the right format.
    pub fn acquire(
        root: Option<&Path>,
        file_name: &str,
        max_bytes: u64,
    ) -> Result<Self, ScratchError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX);
        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        let file_path = dir.path().join(sanitize_file_name(file_name));
        tracing::debug!("Acquired scratch directory {}", dir.path().display());
        Ok(Self {
            dir,
            file_path,
            max_bytes,
        })
    }

    /// Path of the blob inside the scratch directory.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Open the blob file for writing, truncating any earlier content.
    pub async fn writer(&mut self) -> Result<ScratchWriter<'_>, ScratchError> {
        let file = tokio::fs::File::create(&self.file_path).await?;
        Ok(ScratchWriter {
            inner: BufWriter::new(file),
            written: 0,
            limit: self.max_bytes,
            _handle: std::marker::PhantomData,
        })
    }

    /// Copy `reader` into the blob file, enforcing the size limit.
    pub async fn fill_from<R>(&mut self, mut reader: R) -> Result<u64, ScratchError>
    where
        R: AsyncRead + Unpin,
    {
        let mut writer = self.writer().await?;
        let mut buf = vec![0u8; COPY_BUFFER];
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            writer.write_chunk(&buf[..n]).await?;
        }
        writer.finish().await
    }

    /// Remove the directory now, reporting any failure.
    pub fn release(self) -> Result<(), ScratchError> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        tracing::debug!("Released scratch directory {}", path.display());
        Ok(())
    }
}

impl std::fmt::Debug for ScratchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchHandle")
            .field("path", &self.file_path)
            .field("max_bytes", &self.max_bytes)
            .finish()
    }
}

/// Buffered writer for the scratch blob that counts bytes written.
pub struct ScratchWriter<'a> {
    inner: BufWriter<tokio::fs::File>,
    written: u64,
    limit: u64,
    _handle: std::marker::PhantomData<&'a mut ScratchHandle>,
}

impl ScratchWriter<'_> {
    /// Append a chunk, failing once the total would pass the limit.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), ScratchError> {
        let next = self.written + chunk.len() as u64;
        if next > self.limit {
            return Err(ScratchError::LimitExceeded { limit: self.limit });
        }
        self.inner.write_all(chunk).await?;
        self.written = next;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush to disk and return the number of bytes written.
    pub async fn finish(mut self) -> Result<u64, ScratchError> {
        self.inner.flush().await?;
        self.inner.get_mut().sync_all().await?;
        Ok(self.written)
    }
}
