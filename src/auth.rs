//! Credentials for the `AUTHENTICATE` command.
//!
//! The daemon accepts either a password, sent as a quoted string, or the
//! contents of its cookie file, sent as hex.

use std::path::PathBuf;

#[cfg(feature = "tokio-runtime")]
use crate::error::{ControlError, Result};
#[cfg(feature = "tokio-runtime")]
use std::path::Path;

/// Authentication credentials presented during `connect`.
#[derive(Debug, Clone, Default)]
pub enum AuthCredential {
    /// Skip authentication.
    #[default]
    None,
    /// Password for the HASHEDPASSWORD method.
    Password(String),
    /// Cookie file path, read when authenticating.
    CookieFile(PathBuf),
}

/// Wrap a password in double quotes for `AUTHENTICATE`.
///
/// Unlike a bare `"..."` wrap, backslashes and embedded quotes are
/// backslash-escaped as the daemon's QuotedString syntax requires, so the
/// daemon reads the password back verbatim. Passwords without `"` or `\`
/// come out identical to the bare wrap.
pub fn quote_password(password: &str) -> String {
    let mut quoted = String::with_capacity(password.len() + 2);
    quoted.push('"');
    for c in password.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Format cookie data as hex for the AUTHENTICATE command.
pub fn format_cookie_hex(cookie: &[u8]) -> String {
    hex::encode_upper(cookie)
}

/// Read the raw authentication cookie from a file.
#[cfg(feature = "tokio-runtime")]
pub async fn read_cookie_file(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|source| ControlError::CookieFile {
            path: path.to_path_buf(),
            source,
        })
}
