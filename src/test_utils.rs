//! Test helpers: reply builders, canned daemon replies, and a scripted fake
//! daemon running over an in-memory duplex pipe.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::task::JoinHandle;

/// Pre-built replies for common commands.
pub mod fixtures {
    /// AUTHENTICATE accepted.
    pub fn auth_ok_response() -> &'static str {
        "250 OK\r\n"
    }

    /// GETINFO version.
    pub fn version_response() -> &'static str {
        "250-version=0.4.8.12 (git-abc123)\r\n\
         250 OK\r\n"
    }

    /// GETCONF SocksPort.
    pub fn socksport_response() -> &'static str {
        "250 SocksPort=9050\r\n"
    }

    /// Unknown configuration key.
    pub fn error_response() -> &'static str {
        "552 Unknown option\r\n"
    }
}

/// Builder for control protocol replies.
#[derive(Debug, Clone, Default)]
pub struct MockReply {
    lines: Vec<String>,
}

impl MockReply {
    /// Create a new empty reply builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// A single `250 OK` line.
    pub fn ok() -> Self {
        Self::new().finish()
    }

    /// A single failure line.
    pub fn error(code: u16, message: &str) -> Self {
        Self {
            lines: vec![format!("{} {}", code, message)],
        }
    }

    /// Add a mid-reply line (`250-...`).
    pub fn data_line(mut self, line: &str) -> Self {
        self.lines.push(format!("250-{}", line));
        self
    }

    /// Add the final `250 OK` line.
    pub fn finish(mut self) -> Self {
        self.lines.push("250 OK".to_string());
        self
    }

    /// Build the reply as it appears on the wire.
    pub fn build(&self) -> String {
        self.lines.iter().map(|l| format!("{}\r\n", l)).collect()
    }
}

/// Spawn a fake daemon on the far end of a duplex pipe.
///
/// The daemon optionally writes `greeting`, then answers each received line
/// with the next entry of `script`. An empty entry hangs up instead of
/// answering. Once the script is exhausted, `QUIT` gets
/// `250 closing connection` followed by a hang-up and anything else gets
/// `510`. The task resolves to every line received.
pub fn fake_daemon(
    greeting: Option<&str>,
    script: &[&str],
) -> (DuplexStream, JoinHandle<Vec<String>>) {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let greeting = greeting.map(str::to_string);
    let script: Vec<String> = script.iter().map(|s| s.to_string()).collect();

    let handle = tokio::spawn(async move {
        let (read, mut write) = tokio::io::split(server);
        let mut lines = BufReader::new(read).lines();
        let mut received = Vec::new();
        let mut script = script.into_iter();

        if let Some(greeting) = greeting {
            if write.write_all(greeting.as_bytes()).await.is_err() {
                return received;
            }
        }

        while let Ok(Some(line)) = lines.next_line().await {
            let reply = match script.next() {
                Some(reply) => reply,
                None if line == "QUIT" => {
                    received.push(line);
                    let _ = write.write_all(b"250 closing connection\r\n").await;
                    break;
                }
                None => "510 Unrecognized command\r\n".to_string(),
            };
            received.push(line);

            if reply.is_empty() || write.write_all(reply.as_bytes()).await.is_err() {
                break;
            }
        }

        received
    });

    (client, handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_reply_ok() {
        assert_eq!(MockReply::ok().build(), "250 OK\r\n");
    }

    #[test]
    fn test_mock_reply_with_data() {
        let reply = MockReply::new()
            .data_line("version=0.4.8.12")
            .data_line("config-file=/etc/tor/torrc")
            .finish();

        let expected = "250-version=0.4.8.12\r\n250-config-file=/etc/tor/torrc\r\n250 OK\r\n";
        assert_eq!(reply.build(), expected);
    }

    #[test]
    fn test_mock_reply_error() {
        assert_eq!(
            MockReply::error(552, "Unknown option").build(),
            "552 Unknown option\r\n"
        );
    }

    #[tokio::test]
    async fn test_fake_daemon_answers_script() {
        let (client, daemon) = fake_daemon(Some("250 hi\r\n"), &["250 OK\r\n"]);
        let (read, mut write) = tokio::io::split(client);
        let mut lines = BufReader::new(read).lines();

        assert_eq!(lines.next_line().await.unwrap().unwrap(), "250 hi");
        write.write_all(b"GETINFO version\r\n").await.unwrap();
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "250 OK");
        write.write_all(b"QUIT\r\n").await.unwrap();
        assert_eq!(
            lines.next_line().await.unwrap().unwrap(),
            "250 closing connection"
        );

        assert_eq!(daemon.await.unwrap(), ["GETINFO version", "QUIT"]);
    }
}
