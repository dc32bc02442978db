//! # tor-control-session
//!
//! An async session client for the Tor control protocol.
//!
//! A [`Session`] opens the control port (TCP or a Unix socket), authenticates
//! with a password or the daemon's cookie file, and then exchanges one
//! command at a time. Replies come back as ordered lists of [`ReplyLine`]s;
//! any line with a status code of 400 or above turns the call into
//! [`ControlError::Rejected`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tor_control_session::{Result, Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = SessionConfig::new()
//!         .host("localhost")
//!         .port(9051)
//!         .password("secure-password");
//!
//!     let session = Session::new(config);
//!     session.connect().await?;
//!
//!     let reply = session.get_new_identity().await?;
//!     println!("{} {}", reply.code, reply.message);
//!
//!     session.disconnect().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Raw commands
//!
//! ```rust,no_run
//! # use tor_control_session::Session;
//! # async fn example(session: &Session) -> tor_control_session::Result<()> {
//! for line in session.send_command(["GETINFO", "version", "config-file"]).await? {
//!     println!("{}: {}", line.code, line.message);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Scoped sessions
//!
//! ```rust,no_run
//! # use tor_control_session::{Session, SessionConfig};
//! # async fn example() -> tor_control_session::Result<()> {
//! let socks = Session::scoped(SessionConfig::from_env()?, |session| async move {
//!     session.get_config("SocksPort").await
//! })
//! .await?;
//! println!("SOCKS port: {}", socks);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `tokio-runtime` (default): the [`Session`] and its transport. Without
//!   it only the codec, configuration and error types are built.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all)]

pub mod auth;
pub mod config;
pub mod error;
pub mod protocol;
pub mod types;

#[cfg(feature = "tokio-runtime")]
mod commands;
#[cfg(feature = "tokio-runtime")]
pub mod session;
#[cfg(feature = "tokio-runtime")]
pub mod transport;

#[cfg(all(test, feature = "tokio-runtime"))]
mod test_utils;

pub use error::{ControlError, Result, StatusCode};

#[cfg(feature = "tokio-runtime")]
pub use session::Session;
#[cfg(feature = "tokio-runtime")]
pub use transport::ControlStream;

pub use auth::AuthCredential;
pub use config::{ControlAddress, ReplyFraming, SessionConfig};
pub use protocol::{Command, ReplyDecoder, ReplyLine};
pub use types::{SessionState, Signal};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
