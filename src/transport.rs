//! Opening the byte stream to the control port.

use crate::config::ControlAddress;
use crate::error::{ControlError, Result};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

/// Any ordered, reliable byte stream a session can run over.
pub trait ControlStream: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> ControlStream for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

/// Type-erased transport owned by a session.
pub type BoxedStream = Box<dyn ControlStream>;

/// Open a stream to `address`, giving up after `timeout`.
pub async fn open(address: &ControlAddress, timeout: Duration) -> Result<BoxedStream> {
    debug!(%address, "Opening control connection");

    let opened = tokio::time::timeout(timeout, open_stream(address))
        .await
        .map_err(|_| ControlError::Timeout)?;

    opened.map_err(|e| ControlError::Connection(format!("{}: {}", address, e)))
}

async fn open_stream(address: &ControlAddress) -> io::Result<BoxedStream> {
    match address {
        ControlAddress::Tcp { host, port } => {
            let stream = TcpStream::connect((host.as_str(), *port)).await?;
            stream.set_nodelay(true)?;
            Ok(Box::new(stream))
        }
        #[cfg(unix)]
        ControlAddress::Unix(path) => {
            let stream = tokio::net::UnixStream::connect(path).await?;
            Ok(Box::new(stream))
        }
        #[cfg(not(unix))]
        ControlAddress::Unix(_) => Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "unix sockets are not available on this platform",
        )),
    }
}
