//! Session lifecycle: connect, authenticate, exchange commands, disconnect.
//!
//! A [`Session`] owns at most one transport at a time. A background reader
//! task turns the transport into a stream of data and error events and
//! flips the session to [`SessionState::Disconnected`] when the peer goes
//! away. Commands wait on that event stream one at a time; the session
//! mutex guarantees a single command in flight.

use crate::auth::{format_cookie_hex, quote_password, read_cookie_file, AuthCredential};
use crate::config::{ReplyFraming, SessionConfig};
use crate::error::{ControlError, Result};
use crate::protocol::{check_reply, parse_burst, Command, ReplyDecoder, ReplyLine};
use crate::transport::{self, BoxedStream, ControlStream};
use crate::types::SessionState;

use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

const READ_CHUNK: usize = 8 * 1024;

/// A connection to the control port.
///
/// All methods take `&self`; share a session between tasks with an `Arc`.
pub struct Session {
    config: SessionConfig,
    state: Arc<watch::Sender<SessionState>>,
    link: Mutex<Option<Link>>,
}

impl Session {
    /// Create a disconnected session.
    pub fn new(config: SessionConfig) -> Self {
        let (state, _) = watch::channel(SessionState::Disconnected);
        Self {
            config,
            state: Arc::new(state),
            link: Mutex::new(None),
        }
    }

    /// Run `body` against a freshly connected session and always disconnect
    /// afterwards, returning the body's result.
    pub async fn scoped<T, F, Fut>(config: SessionConfig, body: F) -> Result<T>
    where
        F: FnOnce(Arc<Session>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let session = Arc::new(Session::new(config));
        session.connect().await?;
        let outcome = body(Arc::clone(&session)).await;
        session.disconnect().await;
        outcome
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current connection state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Whether the session is connected and authenticated.
    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Connected
    }

    /// Watch state transitions, including unexpected disconnects.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Open the configured transport and authenticate.
    ///
    /// Resolves once the session accepts commands. On failure every
    /// partially opened resource is released and the session stays
    /// disconnected. Connecting an already connected session does nothing.
    pub async fn connect(&self) -> Result<()> {
        let mut slot = self.link.lock().await;
        if self.live_link(&mut slot).await.is_some() {
            debug!("Session already connected");
            return Ok(());
        }

        let address = self.config.resolved_address();
        let stream = transport::open(&address, self.config.connect_timeout).await?;
        debug!(%address, "Transport open");
        self.establish(&mut slot, stream).await
    }

    /// Run the handshake over a stream the caller already opened.
    pub async fn attach<S: ControlStream>(&self, stream: S) -> Result<()> {
        let mut slot = self.link.lock().await;
        if self.live_link(&mut slot).await.is_some() {
            return Err(ControlError::Connection(
                "Session is already connected".to_string(),
            ));
        }
        self.establish(&mut slot, Box::new(stream)).await
    }

    /// Send `QUIT`, then release the transport.
    ///
    /// Errors from the `QUIT` exchange are logged and ignored. Calling this on
    /// a disconnected session does nothing.
    pub async fn disconnect(&self) {
        let mut slot = self.link.lock().await;
        let Some(mut link) = slot.take() else {
            self.set_state(SessionState::Disconnected);
            return;
        };

        if self.is_connected() {
            let quit = Command::line("QUIT");
            match link.round_trip(&quit, self.config.reply_framing).await {
                Ok(_) => debug!("QUIT acknowledged"),
                Err(e) => debug!(error = %e, "QUIT failed during disconnect"),
            }
        }

        link.shutdown().await;
        self.set_state(SessionState::Disconnected);
        debug!("Disconnected from control port");
    }

    /// Send a command and return every line of its reply, in wire order.
    ///
    /// Fails with [`ControlError::NotConnected`] without writing anything
    /// when the session is disconnected, and with [`ControlError::Rejected`]
    /// when any reply line carries a code of 400 or above.
    pub async fn send_command(&self, command: impl Into<Command>) -> Result<Vec<ReplyLine>> {
        let command = command.into();
        let mut slot = self.link.lock().await;
        let Some(link) = self.live_link(&mut slot).await else {
            return Err(ControlError::NotConnected);
        };

        let result = link.round_trip(&command, self.config.reply_framing).await;

        if let Err(e) = &result {
            if e.breaks_link() {
                debug!(error = %e, "Dropping control connection after failed read");
                if let Some(dead) = slot.take() {
                    dead.shutdown().await;
                }
                self.set_state(SessionState::Disconnected);
            }
        }
        result
    }

    /// Return the held link if the session is connected, reaping a link
    /// whose peer has gone away.
    async fn live_link<'a>(&self, slot: &'a mut Option<Link>) -> Option<&'a mut Link> {
        if slot.is_some() && !self.is_connected() {
            if let Some(dead) = slot.take() {
                debug!("Releasing transport closed by peer");
                dead.shutdown().await;
            }
        }
        if self.is_connected() {
            slot.as_mut()
        } else {
            None
        }
    }

    async fn establish(&self, slot: &mut Option<Link>, stream: BoxedStream) -> Result<()> {
        let mut link = Link::spawn(stream, Arc::clone(&self.state));

        if let Err(e) = self.handshake(&mut link).await {
            debug!(error = %e, "Handshake failed");
            link.shutdown().await;
            self.set_state(SessionState::Disconnected);
            return Err(e);
        }

        // The reader task clears `alive` under the same lock, so a close that
        // raced the handshake cannot be overwritten here.
        let alive = Arc::clone(&link.alive);
        let marked = self.state.send_if_modified(|state| {
            if alive.load(Ordering::SeqCst) {
                *state = SessionState::Connected;
                true
            } else {
                false
            }
        });
        if !marked {
            link.shutdown().await;
            return Err(ControlError::ConnectionClosed);
        }

        *slot = Some(link);
        debug!("Control session ready");
        Ok(())
    }

    async fn handshake(&self, link: &mut Link) -> Result<()> {
        if self.config.expect_greeting {
            let greeting = link.next_chunk().await?;
            if !greeting.starts_with(b"250") {
                return Err(ControlError::Connection(format!(
                    "Unexpected greeting: {}",
                    String::from_utf8_lossy(&greeting).trim_end()
                )));
            }
            trace!("Greeting accepted");
        }

        let framing = self.config.reply_framing;
        match self.config.credential() {
            AuthCredential::None => {
                debug!("No credentials configured, skipping authentication");
            }
            AuthCredential::Password(password) => {
                debug!("Authenticating with password");
                link.authenticate(&quote_password(&password), framing).await?;
            }
            AuthCredential::CookieFile(path) => {
                debug!(path = %path.display(), "Authenticating with cookie file");
                let cookie = read_cookie_file(&path).await?;
                link.authenticate(&format_cookie_hex(&cookie), framing).await?;
            }
        }
        Ok(())
    }

    fn set_state(&self, state: SessionState) {
        self.state.send_replace(state);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.config.resolved_address())
            .field("state", &self.state())
            .finish()
    }
}

/// Map a daemon rejection of `AUTHENTICATE` to an authentication failure.
pub(crate) fn authentication_error(err: ControlError) -> ControlError {
    match err {
        ControlError::Rejected { message, .. } => ControlError::Authentication(message),
        other => other,
    }
}

/// One event observed on the transport.
enum Inbound {
    Data(Vec<u8>),
    Failed(io::Error),
}

/// An open transport plus the task reading from it.
struct Link {
    writer: WriteHalf<BoxedStream>,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    decoder: ReplyDecoder,
    alive: Arc<AtomicBool>,
    reader: JoinHandle<()>,
}

impl Link {
    fn spawn(stream: BoxedStream, state: Arc<watch::Sender<SessionState>>) -> Self {
        let (read_half, writer) = tokio::io::split(stream);
        let (events, inbound) = mpsc::unbounded_channel();
        let alive = Arc::new(AtomicBool::new(true));
        let reader = tokio::spawn(read_events(read_half, events, state, Arc::clone(&alive)));

        Self {
            writer,
            inbound,
            decoder: ReplyDecoder::new(),
            alive,
            reader,
        }
    }

    async fn round_trip(
        &mut self,
        command: &Command,
        framing: ReplyFraming,
    ) -> Result<Vec<ReplyLine>> {
        trace!("Sending command: {}", command);
        self.writer.write_all(command.encode().as_bytes()).await?;
        self.writer.flush().await?;

        let lines = self.read_reply(framing).await?;
        check_reply(lines)
    }

    async fn authenticate(&mut self, argument: &str, framing: ReplyFraming) -> Result<()> {
        let command = Command::from_tokens(["AUTHENTICATE", argument]);
        self.round_trip(&command, framing)
            .await
            .map_err(authentication_error)?;
        debug!("Authentication successful");
        Ok(())
    }

    async fn read_reply(&mut self, framing: ReplyFraming) -> Result<Vec<ReplyLine>> {
        let lines = match framing {
            ReplyFraming::Burst => {
                let chunk = self.next_chunk().await?;
                parse_burst(&chunk)?
            }
            ReplyFraming::Terminated => loop {
                if let Some(lines) = self.decoder.next_reply()? {
                    break lines;
                }
                let chunk = self.next_chunk().await?;
                self.decoder.push(&chunk);
            },
        };

        for line in &lines {
            trace!("Received line: {}", line);
        }
        Ok(lines)
    }

    async fn next_chunk(&mut self) -> Result<Vec<u8>> {
        match self.inbound.recv().await {
            Some(Inbound::Data(chunk)) => Ok(chunk),
            Some(Inbound::Failed(e)) => Err(ControlError::Transport(e)),
            None => Err(ControlError::ConnectionClosed),
        }
    }

    async fn shutdown(mut self) {
        let _ = self.writer.shutdown().await;
        self.reader.abort();
        let _ = (&mut self.reader).await;
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_events(
    mut reader: ReadHalf<BoxedStream>,
    events: mpsc::UnboundedSender<Inbound>,
    state: Arc<watch::Sender<SessionState>>,
    alive: Arc<AtomicBool>,
) {
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                debug!("Control connection closed by peer");
                break;
            }
            Ok(n) => {
                trace!(bytes = n, "Received data");
                if events.send(Inbound::Data(buf[..n].to_vec())).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "Control connection failed");
                let _ = events.send(Inbound::Failed(e));
                break;
            }
        }
    }

    state.send_modify(|state| {
        alive.store(false, Ordering::SeqCst);
        *state = SessionState::Disconnected;
    });
}
