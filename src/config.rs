//! Configuration for a control session.
//!
//! A [`SessionConfig`] names where the control port lives (TCP host and port,
//! or a Unix socket path that takes precedence) and how to authenticate
//! (a password, or a cookie file used only when no password is set).

use crate::auth::AuthCredential;
use crate::error::{ControlError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Default control port host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default control port.
pub const DEFAULT_PORT: u16 = 9051;

/// How the end of a reply is recognized on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyFraming {
    /// Buffer across reads until a line with a space separator ends the reply.
    #[default]
    Terminated,
    /// Treat exactly one transport read as the complete reply.
    Burst,
}

/// Configuration for connecting to the control port.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Host name or address of the control port.
    pub host: String,
    /// TCP port of the control port.
    pub port: u16,
    /// Unix socket path. Overrides `host` and `port` when set.
    pub socket_path: Option<PathBuf>,
    /// Password for `AUTHENTICATE`.
    pub password: Option<String>,
    /// Cookie file, used only when `password` is absent.
    pub cookie_path: Option<PathBuf>,
    /// Upper bound on opening the transport.
    pub connect_timeout: Duration,
    /// Reply framing used by every command.
    pub reply_framing: ReplyFraming,
    /// Require a `250` greeting before authenticating. Off by default.
    pub expect_greeting: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            socket_path: None,
            password: None,
            cookie_path: None,
            connect_timeout: Duration::from_secs(30),
            reply_framing: ReplyFraming::default(),
            expect_greeting: false,
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from `TOR_CONTROL_*` environment variables.
    ///
    /// Recognized: `TOR_CONTROL_HOST`, `TOR_CONTROL_PORT`,
    /// `TOR_CONTROL_SOCKET`, `TOR_CONTROL_PASSWORD`, `TOR_CONTROL_COOKIE`.
    /// Unset or empty variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(host) = get("TOR_CONTROL_HOST") {
            config.host = host;
        }
        if let Some(port) = get("TOR_CONTROL_PORT") {
            config.port = port.parse().map_err(|e| {
                ControlError::Configuration(format!("Invalid TOR_CONTROL_PORT '{}': {}", port, e))
            })?;
        }
        config.socket_path = get("TOR_CONTROL_SOCKET").map(PathBuf::from);
        config.password = get("TOR_CONTROL_PASSWORD");
        config.cookie_path = get("TOR_CONTROL_COOKIE").map(PathBuf::from);

        Ok(config)
    }

    /// Set the TCP host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the TCP port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Connect through a Unix socket instead of TCP.
    pub fn socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = Some(path.into());
        self
    }

    /// Point the session at a parsed [`ControlAddress`].
    pub fn address(mut self, address: ControlAddress) -> Self {
        match address {
            ControlAddress::Tcp { host, port } => {
                self.host = host;
                self.port = port;
                self.socket_path = None;
            }
            ControlAddress::Unix(path) => self.socket_path = Some(path),
        }
        self
    }

    /// Set password authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set cookie file authentication.
    pub fn cookie_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookie_path = Some(path.into());
        self
    }

    /// Set the transport open timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the reply framing.
    pub fn reply_framing(mut self, framing: ReplyFraming) -> Self {
        self.reply_framing = framing;
        self
    }

    /// Require a `250` greeting right after the transport opens.
    ///
    /// Tor sends nothing until the client speaks, so the check is off by
    /// default and `connect` goes straight to `AUTHENTICATE`. With it off, a
    /// daemon that opens with an error line surfaces as
    /// [`ControlError::Authentication`] or [`ControlError::Rejected`] from
    /// the first exchange instead of [`ControlError::Connection`]. Enable it
    /// for daemons that do greet.
    pub fn expect_greeting(mut self, enabled: bool) -> Self {
        self.expect_greeting = enabled;
        self
    }

    /// The address the session will open.
    pub fn resolved_address(&self) -> ControlAddress {
        match &self.socket_path {
            Some(path) => ControlAddress::Unix(path.clone()),
            None => ControlAddress::Tcp {
                host: self.host.clone(),
                port: self.port,
            },
        }
    }

    /// The credential the session will present.
    pub fn credential(&self) -> AuthCredential {
        if let Some(password) = &self.password {
            AuthCredential::Password(password.clone())
        } else if let Some(path) = &self.cookie_path {
            AuthCredential::CookieFile(path.clone())
        } else {
            AuthCredential::None
        }
    }
}

/// The address to connect to for the control port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlAddress {
    /// TCP host and port.
    Tcp {
        /// Host name or address.
        host: String,
        /// Port number.
        port: u16,
    },
    /// Unix domain socket path.
    Unix(PathBuf),
}

impl Default for ControlAddress {
    fn default() -> Self {
        ControlAddress::Tcp {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ControlAddress {
    /// Parse an address string.
    ///
    /// Supports:
    /// - `host:port` for TCP (`[::1]:9051` for IPv6 literals)
    /// - `unix:/path/to/socket` for Unix sockets
    pub fn parse(s: &str) -> Result<Self> {
        if let Some(path) = s.strip_prefix("unix:") {
            if path.is_empty() {
                return Err(ControlError::Configuration(
                    "Empty unix socket path".to_string(),
                ));
            }
            return Ok(ControlAddress::Unix(PathBuf::from(path)));
        }

        let (host, port) = s.rsplit_once(':').ok_or_else(|| {
            ControlError::Configuration(format!("Invalid address '{}': missing port", s))
        })?;
        let port = port.parse().map_err(|e| {
            ControlError::Configuration(format!("Invalid address '{}': {}", s, e))
        })?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(ControlError::Configuration(format!(
                "Invalid address '{}': missing host",
                s
            )));
        }

        Ok(ControlAddress::Tcp {
            host: host.to_string(),
            port,
        })
    }
}

impl std::fmt::Display for ControlAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlAddress::Tcp { host, port } if host.contains(':') => {
                write!(f, "[{}]:{}", host, port)
            }
            ControlAddress::Tcp { host, port } => write!(f, "{}:{}", host, port),
            ControlAddress::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}
