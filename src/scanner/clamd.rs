//! clamd daemon client using the `zINSTREAM` command.

use std::path::Path;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use super::{ContentScanner, ScanError, ScanVerdict};

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Longest reply read from the daemon. Real replies are one short line.
const MAX_REPLY_BYTES: u64 = 4096;

/// Streams files to a clamd daemon over TCP.
#[derive(Debug, Clone)]
pub struct ClamdScanner {
    address: String,
    chunk_size: usize,
}

impl ClamdScanner {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the stream chunk size. Must stay below clamd's `StreamMaxLength`.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    async fn connect(&self) -> Result<TcpStream, ScanError> {
        TcpStream::connect(&self.address)
            .await
            .map_err(|e| ScanError::NotAvailable(format!("clamd at {}: {}", self.address, e)))
    }

    async fn ping(&self) -> Result<(), ScanError> {
        let mut stream = self.connect().await?;
        stream.write_all(b"zPING\0").await?;
        let reply = read_reply(&mut stream).await?;
        if reply == "PONG" {
            Ok(())
        } else {
            Err(ScanError::Protocol(reply))
        }
    }

    async fn instream(&self, path: &Path) -> Result<String, ScanError> {
        let mut file = tokio::fs::File::open(path).await?;
        let mut stream = self.connect().await?;
        stream.write_all(b"zINSTREAM\0").await?;

        let mut buf = vec![0u8; self.chunk_size];
        loop {
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            stream.write_all(&(n as u32).to_be_bytes()).await?;
            stream.write_all(&buf[..n]).await?;
        }
        stream.write_all(&0u32.to_be_bytes()).await?;
        stream.flush().await?;

        read_reply(&mut stream).await
    }
}

/// Read one NUL-terminated reply, bounded by [`MAX_REPLY_BYTES`].
async fn read_reply<S: AsyncRead + Unpin>(stream: S) -> Result<String, ScanError> {
    let mut reply = Vec::new();
    let mut limited = BufReader::new(stream.take(MAX_REPLY_BYTES));
    limited.read_until(b'\0', &mut reply).await?;
    let reply = String::from_utf8_lossy(&reply);
    Ok(reply.trim_end_matches(['\0', '\n']).to_string())
}

/// Parse a clamd scan reply such as `stream: OK` or `stream: Eicar-Signature FOUND`.
pub(crate) fn parse_reply(reply: &str) -> Result<ScanVerdict, ScanError> {
    let body = reply.strip_prefix("stream:").unwrap_or(reply).trim();
    if body == "OK" {
        return Ok(ScanVerdict::Clean);
    }
    if let Some(signature) = body.strip_suffix(" FOUND") {
        return Ok(ScanVerdict::Infected {
            signature: signature.trim().to_string(),
        });
    }
    Err(ScanError::Protocol(body.to_string()))
}

#[async_trait]
impl ContentScanner for ClamdScanner {
    fn name(&self) -> &str {
        "clamd"
    }

    async fn is_available(&self) -> bool {
        self.ping().await.is_ok()
    }

    fn availability_hint(&self) -> String {
        format!(
            "Start clamd listening on {} (TCPSocket/TCPAddr in clamd.conf)",
            self.address
        )
    }

    async fn scan_file(&self, path: &Path) -> Result<ScanVerdict, ScanError> {
        let reply = self.instream(path).await?;
        tracing::debug!("clamd replied: {}", reply);
        parse_reply(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::net::TcpListener;

    /// Minimal clamd: answers PING and INSTREAM, flags payloads containing "EICAR".
    async fn fake_clamd() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                tokio::spawn(async move {
                    let mut command = Vec::new();
                    loop {
                        let byte = socket.read_u8().await.unwrap();
                        if byte == 0 {
                            break;
                        }
                        command.push(byte);
                    }
                    let reply: &[u8] = match command.as_slice() {
                        b"zPING" => &b"PONG\0"[..],
                        b"zINSTREAM" => {
                            let mut payload = Vec::new();
                            loop {
                                let len = socket.read_u32().await.unwrap() as usize;
                                if len == 0 {
                                    break;
                                }
                                let mut chunk = vec![0u8; len];
                                socket.read_exact(&mut chunk).await.unwrap();
                                payload.extend_from_slice(&chunk);
                            }
                            if payload.windows(5).any(|w| w == b"EICAR") {
                                &b"stream: Eicar-Test-Signature FOUND\0"[..]
                            } else {
                                &b"stream: OK\0"[..]
                            }
                        }
                        _ => &b"UNKNOWN COMMAND\0"[..],
                    };
                    socket.write_all(reply).await.unwrap();
                    socket.shutdown().await.ok();
                });
            }
        });
        address
    }

    fn write_file(bytes: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, bytes).unwrap();
        (dir, path)
    }

    #[test]
    fn test_parse_reply() {
        assert_eq!(parse_reply("stream: OK").unwrap(), ScanVerdict::Clean);
        assert_eq!(
            parse_reply("stream: Win.Test.EICAR_HDB-1 FOUND").unwrap(),
            ScanVerdict::Infected {
                signature: "Win.Test.EICAR_HDB-1".to_string()
            }
        );
        assert!(parse_reply("INSTREAM size limit exceeded. ERROR").is_err());
    }

    #[tokio::test]
    async fn test_clean_and_infected_over_multiple_chunks() {
        let address = fake_clamd().await;
        let scanner = ClamdScanner::new(address).with_chunk_size(4);
        assert!(scanner.is_available().await);

        let (_dir, clean) = write_file(b"just some harmless bytes");
        assert_eq!(scanner.scan(&clean).await, ScanVerdict::Clean);

        let (_dir2, infected) = write_file(b"X5O!P%@AP EICAR-STANDARD-ANTIVIRUS-TEST-FILE");
        assert!(matches!(
            scanner.scan(&infected).await,
            ScanVerdict::Infected { .. }
        ));
    }

    #[tokio::test]
    async fn test_reply_stops_at_nul_and_size_cap() {
        let reply = read_reply(&b"stream: OK\0trailing garbage"[..]).await.unwrap();
        assert_eq!(reply, "stream: OK");

        let flood = vec![b'x'; 1024 * 1024];
        let reply = read_reply(flood.as_slice()).await.unwrap();
        assert_eq!(reply.len(), MAX_REPLY_BYTES as usize);
        assert!(parse_reply(&reply).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_daemon_is_unavailable() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let scanner = ClamdScanner::new(address);
        assert!(!scanner.is_available().await);

        let (_dir, path) = write_file(b"data");
        assert!(matches!(
            scanner.scan(&path).await,
            ScanVerdict::Unavailable { .. }
        ));
    }
}
