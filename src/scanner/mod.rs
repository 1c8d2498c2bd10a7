//! Malware scanning of fetched blobs.
//!
//! Scanners classify a local file as clean, infected or unavailable. Any
//! fault inside a scanner is reported as [`ScanVerdict::Unavailable`], never
//! as clean.

mod clamd;
mod clamscan;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

pub use clamd::ClamdScanner;
pub use clamscan::ClamscanScanner;

/// Outcome of scanning one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanVerdict {
    Clean,
    Infected { signature: String },
    Unavailable { reason: String },
}

impl ScanVerdict {
    pub fn is_clean(&self) -> bool {
        matches!(self, ScanVerdict::Clean)
    }
}

/// Errors that can occur while talking to a scanning engine.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Scanner not available: {0}")]
    NotAvailable(String),

    #[error("Unexpected scanner reply: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A malware scanning engine.
#[async_trait]
pub trait ContentScanner: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Check if the engine can be reached.
    async fn is_available(&self) -> bool;

    /// How to make the engine available, shown when it is not.
    fn availability_hint(&self) -> String;

    /// Scan the file at `path`, surfacing engine faults as errors.
    async fn scan_file(&self, path: &Path) -> Result<ScanVerdict, ScanError>;

    /// Scan the file at `path`. Engine faults become `Unavailable`.
    async fn scan(&self, path: &Path) -> ScanVerdict {
        match self.scan_file(path).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!("{} scan failed: {}", self.name(), e);
                ScanVerdict::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }
}
