//! Filesystem-backed blob storage.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use super::{BlobFetcher, FetchError};
use crate::models::DocumentReference;
use crate::scratch::{ScratchError, ScratchHandle};

/// Reads objects from `root/<container>/<key>`.
#[derive(Debug, Clone)]
pub struct LocalFetcher {
    root: PathBuf,
}

impl LocalFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a reference to a path under the root.
    ///
    /// Only plain path segments are accepted so a key can never escape its
    /// container.
    pub fn resolve(&self, reference: &DocumentReference) -> Result<PathBuf, FetchError> {
        let container = relative_segments(reference.container_id())?;
        let key = relative_segments(reference.object_key())?;
        Ok(self.root.join(container).join(key))
    }
}

fn relative_segments(value: &str) -> Result<PathBuf, FetchError> {
    let path = Path::new(value);
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(segment) => out.push(segment),
            Component::CurDir => {}
            _ => return Err(FetchError::InvalidKey(value.to_string())),
        }
    }
    if out.as_os_str().is_empty() {
        return Err(FetchError::InvalidKey(value.to_string()));
    }
    Ok(out)
}

#[async_trait]
impl BlobFetcher for LocalFetcher {
    fn name(&self) -> &str {
        "local"
    }

    async fn fetch(
        &self,
        reference: &DocumentReference,
        scratch: &mut ScratchHandle,
    ) -> Result<u64, FetchError> {
        let source = self.resolve(reference)?;
        let file = match tokio::fs::File::open(&source).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FetchError::NotFound)
            }
            Err(e) => return Err(e.into()),
        };

        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(FetchError::NotFound);
        }
        if metadata.len() > scratch.max_bytes() {
            return Err(ScratchError::LimitExceeded {
                limit: scratch.max_bytes(),
            }
            .into());
        }

        let written = scratch.fill_from(file).await?;
        tracing::debug!("Copied {} bytes for {}", written, reference);
        Ok(written)
    }
}
