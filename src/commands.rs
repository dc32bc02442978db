//! Typed wrappers over [`Session::send_command`].
//!
//! Each wrapper sends one fixed command shape and, except for
//! [`Session::signal`], returns only the first line of the reply. Arguments
//! are forwarded as-is; nothing is validated or quoted here.

use crate::auth::{format_cookie_hex, quote_password, read_cookie_file};
use crate::error::{ControlError, Result};
use crate::protocol::{first_line, Command, ReplyLine};
use crate::session::{authentication_error, Session};
use crate::types::Signal;

use std::fmt::Display;
use std::path::Path;
use tracing::debug;

impl Session {
    async fn first_reply(&self, command: impl Into<Command>) -> Result<ReplyLine> {
        first_line(self.send_command(command).await?)
    }

    // ==================== Authentication ====================

    /// Send `AUTHENTICATE "<password>"`.
    pub async fn authenticate(&self, password: &str) -> Result<ReplyLine> {
        debug!("Authenticating with password");
        self.authenticate_with(&quote_password(password)).await
    }

    /// Read a cookie file and send `AUTHENTICATE <hex>`.
    pub async fn authenticate_cookie_file(&self, path: impl AsRef<Path>) -> Result<ReplyLine> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Authenticating with cookie file");
        let cookie = read_cookie_file(path).await?;
        self.authenticate_with(&format_cookie_hex(&cookie)).await
    }

    async fn authenticate_with(&self, argument: &str) -> Result<ReplyLine> {
        let reply = self
            .send_command(["AUTHENTICATE", argument])
            .await
            .map_err(authentication_error)?;
        first_line(reply)
    }

    /// Send `QUIT`. The daemon closes the connection afterwards.
    pub async fn quit(&self) -> Result<ReplyLine> {
        self.first_reply("QUIT").await
    }

    // ==================== Configuration ====================

    /// Send `GETCONF <key>` and return the value after the first `=`.
    pub async fn get_config(&self, key: &str) -> Result<String> {
        let line = self.first_reply(["GETCONF", key]).await?;
        line.message
            .split_once('=')
            .map(|(_, value)| value.to_string())
            .ok_or_else(|| {
                ControlError::Parse(format!("No value in GETCONF reply: '{}'", line.message))
            })
    }

    /// Send `SETCONF <key>=<value>`.
    pub async fn set_config(&self, key: &str, value: &str) -> Result<ReplyLine> {
        let assignment = format!("{}={}", key, value);
        self.first_reply(["SETCONF", assignment.as_str()]).await
    }

    /// Send `RESETCONF <key>`.
    pub async fn reset_config(&self, key: &str) -> Result<ReplyLine> {
        self.first_reply(["RESETCONF", key]).await
    }

    // ==================== Signals ====================

    /// Send `SIGNAL <name>` and return the whole reply.
    pub async fn signal(&self, signal: Signal) -> Result<Vec<ReplyLine>> {
        debug!(%signal, "Sending signal");
        self.send_command(["SIGNAL", signal.as_str()]).await
    }

    async fn signal_first(&self, signal: Signal) -> Result<ReplyLine> {
        first_line(self.signal(signal).await?)
    }

    /// Send `SIGNAL RELOAD`.
    pub async fn signal_reload(&self) -> Result<ReplyLine> {
        self.signal_first(Signal::Reload).await
    }

    /// Send `SIGNAL SHUTDOWN`.
    pub async fn signal_shutdown(&self) -> Result<ReplyLine> {
        self.signal_first(Signal::Shutdown).await
    }

    /// Send `SIGNAL DUMP`.
    pub async fn signal_dump(&self) -> Result<ReplyLine> {
        self.signal_first(Signal::Dump).await
    }

    /// Send `SIGNAL DEBUG`.
    pub async fn signal_debug(&self) -> Result<ReplyLine> {
        self.signal_first(Signal::Debug).await
    }

    /// Send `SIGNAL HALT`.
    pub async fn signal_halt(&self) -> Result<ReplyLine> {
        self.signal_first(Signal::Halt).await
    }

    /// Send `SIGNAL TERM`.
    pub async fn signal_term(&self) -> Result<ReplyLine> {
        self.signal_first(Signal::Term).await
    }

    /// Send `SIGNAL NEWNYM`.
    pub async fn signal_new_nym(&self) -> Result<ReplyLine> {
        self.signal_first(Signal::NewNym).await
    }

    /// Send `SIGNAL CLEARDNSCACHE`.
    pub async fn signal_clear_dns_cache(&self) -> Result<ReplyLine> {
        self.signal_first(Signal::ClearDnsCache).await
    }

    /// Send `SIGNAL USR1`.
    pub async fn signal_usr1(&self) -> Result<ReplyLine> {
        self.signal_first(Signal::Usr1).await
    }

    /// Send `SIGNAL USR2`.
    pub async fn signal_usr2(&self) -> Result<ReplyLine> {
        self.signal_first(Signal::Usr2).await
    }

    /// Request a new identity (new circuits).
    pub async fn get_new_identity(&self) -> Result<ReplyLine> {
        self.signal_new_nym().await
    }

    // ==================== Information ====================

    /// Send `GETINFO <key>`.
    pub async fn get_info(&self, key: &str) -> Result<ReplyLine> {
        self.first_reply(["GETINFO", key]).await
    }

    /// Send `MAPADDRESS <address>=<target>`.
    pub async fn map_address(&self, address: &str, target: &str) -> Result<ReplyLine> {
        let mapping = format!("{}={}", address, target);
        self.first_reply(["MAPADDRESS", mapping.as_str()]).await
    }

    // ==================== Circuits and streams ====================

    /// Send `EXTENDCIRCUIT <id>`.
    pub async fn extend_circuit(&self, circuit_id: impl Display) -> Result<ReplyLine> {
        self.first_reply(Command::from_tokens([
            "EXTENDCIRCUIT".to_string(),
            circuit_id.to_string(),
        ]))
        .await
    }

    /// Send `SETCIRCUITPURPOSE <id> <purpose>`.
    pub async fn set_circuit_purpose(
        &self,
        circuit_id: impl Display,
        purpose: &str,
    ) -> Result<ReplyLine> {
        let id = circuit_id.to_string();
        self.first_reply(["SETCIRCUITPURPOSE", id.as_str(), purpose])
            .await
    }

    /// Send `SETROUTERPURPOSE <nickname-or-key> <purpose>`.
    pub async fn set_router_purpose(&self, nick_or_key: &str, purpose: &str) -> Result<ReplyLine> {
        self.first_reply(["SETROUTERPURPOSE", nick_or_key, purpose])
            .await
    }

    /// Send `CLOSESTREAM <id> <reason>`.
    pub async fn close_stream(
        &self,
        stream_id: impl Display,
        reason: impl Display,
    ) -> Result<ReplyLine> {
        self.first_reply(Command::from_tokens([
            "CLOSESTREAM".to_string(),
            stream_id.to_string(),
            reason.to_string(),
        ]))
        .await
    }

    /// Send `CLOSECIRCUIT <id>`.
    pub async fn close_circuit(&self, circuit_id: impl Display) -> Result<ReplyLine> {
        self.first_reply(Command::from_tokens([
            "CLOSECIRCUIT".to_string(),
            circuit_id.to_string(),
        ]))
        .await
    }

    /// Send `ATTACHSTREAM <stream> <circuit> [hop]`.
    pub async fn attach_stream(
        &self,
        stream_id: impl Display,
        circuit_id: impl Display,
        hop: Option<&str>,
    ) -> Result<ReplyLine> {
        let mut tokens = vec![
            "ATTACHSTREAM".to_string(),
            stream_id.to_string(),
            circuit_id.to_string(),
        ];
        tokens.extend(hop.map(str::to_string));
        self.first_reply(tokens).await
    }
}
