//! On-demand scanning with the `clamscan` command-line tool.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use super::{ContentScanner, ScanError, ScanVerdict};
use crate::utils::check_binary;

/// Runs `clamscan` once per file.
#[derive(Debug, Clone)]
pub struct ClamscanScanner {
    binary: String,
}

impl ClamscanScanner {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for ClamscanScanner {
    fn default() -> Self {
        Self::new("clamscan")
    }
}

/// Pull the signature out of a `<path>: <signature> FOUND` line.
fn parse_signature(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        let line = line.trim_end().strip_suffix(" FOUND")?;
        let (_, signature) = line.rsplit_once(": ")?;
        Some(signature.trim().to_string())
    })
}

#[async_trait]
impl ContentScanner for ClamscanScanner {
    fn name(&self) -> &str {
        "clamscan"
    }

    async fn is_available(&self) -> bool {
        check_binary(&self.binary)
    }

    fn availability_hint(&self) -> String {
        "Install ClamAV (apt install clamav / brew install clamav) and run freshclam".to_string()
    }

    async fn scan_file(&self, path: &Path) -> Result<ScanVerdict, ScanError> {
        let output = Command::new(&self.binary)
            .args(["--no-summary", "--stdout"])
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ScanError::NotAvailable(self.binary.clone()),
                _ => ScanError::Io(e),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        match output.status.code() {
            Some(0) => Ok(ScanVerdict::Clean),
            Some(1) => Ok(ScanVerdict::Infected {
                signature: parse_signature(&stdout).unwrap_or_else(|| "unknown".to_string()),
            }),
            code => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ScanError::Protocol(format!(
                    "{} exited with {:?}: {}",
                    self.binary,
                    code,
                    stderr.trim()
                )))
            }
        }
    }
}
