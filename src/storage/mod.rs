//! Blob storage access.
//!
//! A [`BlobFetcher`] copies one stored object into a scratch handle. Two
//! implementations ship with the crate:
//! - [`LocalFetcher`]: objects laid out as `root/<container>/<key>` on disk
//! - [`HttpFetcher`]: objects served at `<base_url>/<container>/<key>`

mod http;
mod local;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::DocumentReference;
use crate::scratch::{ScratchError, ScratchHandle};

pub use http::HttpFetcher;
pub use local::LocalFetcher;

/// Errors that can occur while fetching a blob.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Object not found")]
    NotFound,

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Storage returned status {0}")]
    Status(u16),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Scratch error: {0}")]
    Scratch(#[from] ScratchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of stored blobs.
#[async_trait]
pub trait BlobFetcher: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Write the object named by `reference` to `scratch.path()`.
    ///
    /// Returns the number of bytes written.
    async fn fetch(
        &self,
        reference: &DocumentReference,
        scratch: &mut ScratchHandle,
    ) -> Result<u64, FetchError>;
}
