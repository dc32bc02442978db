//! Small value types shared by the session and its commands.

use std::fmt;
use std::str::FromStr;

use crate::error::ControlError;

/// Connection state of a [`Session`](crate::Session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No transport is held. Initial state.
    #[default]
    Disconnected,
    /// Transport open and authenticated.
    Connected,
}

impl SessionState {
    /// Get the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connected => "connected",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A daemon signal that can be sent via the SIGNAL command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Reload: reload config items.
    Reload,
    /// Controlled shutdown.
    Shutdown,
    /// Dump stats.
    Dump,
    /// Switch all open logs to loglevel debug.
    Debug,
    /// Immediate shutdown.
    Halt,
    /// Immediate shutdown, same as SIGTERM.
    Term,
    /// Switch to clean circuits.
    NewNym,
    /// Forget client-side cached IPs.
    ClearDnsCache,
    /// Same as SIGUSR1 (dump stats).
    Usr1,
    /// Same as SIGUSR2 (debug logging).
    Usr2,
    /// Dump an unscheduled heartbeat message.
    Heartbeat,
    /// Become dormant.
    Dormant,
    /// Stop being dormant.
    Active,
}

impl Signal {
    /// Get the signal name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Reload => "RELOAD",
            Signal::Shutdown => "SHUTDOWN",
            Signal::Dump => "DUMP",
            Signal::Debug => "DEBUG",
            Signal::Halt => "HALT",
            Signal::Term => "TERM",
            Signal::NewNym => "NEWNYM",
            Signal::ClearDnsCache => "CLEARDNSCACHE",
            Signal::Usr1 => "USR1",
            Signal::Usr2 => "USR2",
            Signal::Heartbeat => "HEARTBEAT",
            Signal::Dormant => "DORMANT",
            Signal::Active => "ACTIVE",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Signal {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_uppercase().as_str() {
            "RELOAD" | "HUP" => Signal::Reload,
            "SHUTDOWN" | "INT" => Signal::Shutdown,
            "DUMP" => Signal::Dump,
            "DEBUG" => Signal::Debug,
            "HALT" => Signal::Halt,
            "TERM" => Signal::Term,
            "NEWNYM" => Signal::NewNym,
            "CLEARDNSCACHE" => Signal::ClearDnsCache,
            "USR1" => Signal::Usr1,
            "USR2" => Signal::Usr2,
            "HEARTBEAT" => Signal::Heartbeat,
            "DORMANT" => Signal::Dormant,
            "ACTIVE" => Signal::Active,
            other => {
                return Err(ControlError::Parse(format!("Unknown signal '{}'", other)));
            }
        })
    }
}
