//! HTTP-backed blob storage.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};

use super::{BlobFetcher, FetchError};
use crate::models::DocumentReference;
use crate::scratch::{ScratchError, ScratchHandle};

const USER_AGENT: &str = concat!("docpipe/", env!("CARGO_PKG_VERSION"));

/// Fetches objects with `GET <base_url>/<container>/<key>`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: String,
}

impl HttpFetcher {
    /// Create a fetcher for `base_url`.
    ///
    /// `connect_timeout` bounds connection setup only; the pipeline bounds
    /// the whole fetch.
    pub fn new(base_url: impl Into<String>, connect_timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL for a reference. Each key segment is percent-encoded; `/`
    /// separators are kept.
    pub fn object_url(&self, reference: &DocumentReference) -> Result<String, FetchError> {
        let key = reference.object_key();
        if reference.container_id().is_empty() || key.is_empty() {
            return Err(FetchError::InvalidKey(reference.to_string()));
        }
        let segments: Vec<String> = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        Ok(format!(
            "{}/{}/{}",
            self.base_url,
            urlencoding::encode(reference.container_id()),
            segments.join("/")
        ))
    }
}

#[async_trait]
impl BlobFetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(
        &self,
        reference: &DocumentReference,
        scratch: &mut ScratchHandle,
    ) -> Result<u64, FetchError> {
        let url = self.object_url(reference)?;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.without_url().to_string()))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(FetchError::NotFound),
            status => return Err(FetchError::Status(status.as_u16())),
        }

        let limit = scratch.max_bytes();
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(ScratchError::LimitExceeded { limit }.into());
        }

        let mut writer = scratch.writer().await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::Request(e.without_url().to_string()))?;
            writer.write_chunk(&chunk).await?;
        }
        let written = writer.finish().await?;
        tracing::debug!("Downloaded {} bytes for {}", written, reference);
        Ok(written)
    }
}
