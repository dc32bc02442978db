//! A small in-process stand-in for the daemon's control port.
//!
//! It understands just enough of the protocol to exercise a session:
//! AUTHENTICATE (password or cookie), GETINFO version, GETCONF / SETCONF /
//! RESETCONF against an in-memory table, SIGNAL and QUIT.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// How the mock daemon authenticates and greets.
#[derive(Debug, Clone, Default)]
pub struct MockOptions {
    pub password: Option<String>,
    pub cookie: Option<Vec<u8>>,
    pub greeting: Option<String>,
}

impl MockOptions {
    pub fn password(password: &str) -> Self {
        Self {
            password: Some(password.to_string()),
            ..Self::default()
        }
    }

    pub fn cookie(cookie: &[u8]) -> Self {
        Self {
            cookie: Some(cookie.to_vec()),
            ..Self::default()
        }
    }

    pub fn greeting(mut self, greeting: &str) -> Self {
        self.greeting = Some(greeting.to_string());
        self
    }
}

#[derive(Default)]
struct Shared {
    conf: HashMap<String, String>,
    received: Vec<String>,
}

/// A running mock daemon.
pub struct MockDaemon {
    addr: Option<SocketAddr>,
    socket: Option<PathBuf>,
    shared: Arc<Mutex<Shared>>,
    task: JoinHandle<()>,
}

impl MockDaemon {
    /// Listen on an ephemeral loopback TCP port.
    pub async fn start(options: MockOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shared = Arc::new(Mutex::new(Shared::default()));

        let state = Arc::clone(&shared);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, options.clone(), Arc::clone(&state)));
            }
        });

        Self {
            addr: Some(addr),
            socket: None,
            shared,
            task,
        }
    }

    /// Listen on a Unix socket at `path`.
    #[cfg(unix)]
    pub async fn start_unix(path: &Path, options: MockOptions) -> Self {
        let listener = tokio::net::UnixListener::bind(path).unwrap();
        let shared = Arc::new(Mutex::new(Shared::default()));

        let state = Arc::clone(&shared);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, options.clone(), Arc::clone(&state)));
            }
        });

        Self {
            addr: None,
            socket: Some(path.to_path_buf()),
            shared,
            task,
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.expect("TCP mock").port()
    }

    pub fn socket_path(&self) -> &Path {
        self.socket.as_deref().expect("unix mock")
    }

    /// Every line received so far, across all connections.
    pub fn received(&self) -> Vec<String> {
        self.shared.lock().unwrap().received.clone()
    }

    /// Preload a configuration value.
    pub fn set_conf(&self, key: &str, value: &str) {
        self.shared
            .lock()
            .unwrap()
            .conf
            .insert(key.to_string(), value.to_string());
    }
}

impl Drop for MockDaemon {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve<S>(stream: S, options: MockOptions, shared: Arc<Mutex<Shared>>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read, mut write) = tokio::io::split(stream);
    let mut lines = BufReader::new(read).lines();
    let needs_auth = options.password.is_some() || options.cookie.is_some();
    let mut authenticated = !needs_auth;

    if let Some(greeting) = &options.greeting {
        if write.write_all(greeting.as_bytes()).await.is_err() {
            return;
        }
    }

    while let Ok(Some(line)) = lines.next_line().await {
        shared.lock().unwrap().received.push(line.clone());

        let (keyword, rest) = line.split_once(' ').unwrap_or((line.as_str(), ""));
        let keyword = keyword.to_uppercase();
        let mut close = false;

        let reply = match keyword.as_str() {
            "AUTHENTICATE" => {
                if check_credentials(&options, rest) {
                    authenticated = true;
                    "250 OK\r\n".to_string()
                } else {
                    close = true;
                    "515 Authentication failed: Password did not match \
                     HashedControlPassword value from configuration\r\n"
                        .to_string()
                }
            }
            "QUIT" => {
                close = true;
                "250 closing connection\r\n".to_string()
            }
            _ if !authenticated => {
                close = true;
                "514 Authentication required.\r\n".to_string()
            }
            "GETINFO" => match rest {
                "version" => "250-version=0.4.8.10\r\n250 OK\r\n".to_string(),
                other => format!("552 Unrecognized key \"{}\"\r\n", other),
            },
            "GETCONF" => match shared.lock().unwrap().conf.get(rest) {
                Some(value) => format!("250 {}={}\r\n", rest, value),
                None => format!("552 Unrecognized configuration key \"{}\"\r\n", rest),
            },
            "SETCONF" => match rest.split_once('=') {
                Some((key, value)) => {
                    shared
                        .lock()
                        .unwrap()
                        .conf
                        .insert(key.to_string(), value.to_string());
                    "250 OK\r\n".to_string()
                }
                None => "513 syntax error in configuration values\r\n".to_string(),
            },
            "RESETCONF" => {
                shared.lock().unwrap().conf.remove(rest);
                "250 OK\r\n".to_string()
            }
            "SIGNAL" => match rest {
                "RELOAD" | "SHUTDOWN" | "DUMP" | "DEBUG" | "HALT" | "TERM" | "NEWNYM"
                | "CLEARDNSCACHE" | "USR1" | "USR2" | "HEARTBEAT" | "DORMANT" | "ACTIVE" => {
                    "250 OK\r\n".to_string()
                }
                other => format!("552 Unrecognized signal code \"{}\"\r\n", other),
            },
            other => format!("510 Unrecognized command \"{}\"\r\n", other),
        };

        if write.write_all(reply.as_bytes()).await.is_err() || close {
            break;
        }
    }
}

fn check_credentials(options: &MockOptions, argument: &str) -> bool {
    if let Some(password) = &options.password {
        return argument == format!("\"{}\"", password);
    }
    if let Some(cookie) = &options.cookie {
        return argument.eq_ignore_ascii_case(&hex::encode(cookie));
    }
    true
}
