//! Command framing and reply decoding.
//!
//! Outbound, a [`Command`] is one line: either pre-formatted or a list of
//! tokens joined by single spaces, terminated with CRLF. No quoting is
//! applied here.
//!
//! Inbound, every reply line is `<3-digit code><separator><message>`. The
//! message is whatever follows the fixed 4-character prefix, whatever the
//! separator is. Lines end in CRLF or a bare LF; empty lines are skipped.
//!
//! Two decoders are provided. [`parse_burst`] treats one chunk of bytes as a
//! whole reply. [`ReplyDecoder`] buffers chunks until a line whose separator
//! is a space closes the reply, folding `+` data blocks into their header
//! line.

use crate::error::{ControlError, Result, StatusCode};
use std::fmt;

/// A single outbound command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    line: String,
}

impl Command {
    /// A pre-formatted command line (without the CRLF terminator).
    pub fn line(line: impl Into<String>) -> Self {
        Self { line: line.into() }
    }

    /// Join tokens with single spaces, in order.
    pub fn from_tokens<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut line = String::new();
        for (i, token) in tokens.into_iter().enumerate() {
            if i > 0 {
                line.push(' ');
            }
            line.push_str(token.as_ref());
        }
        Self { line }
    }

    /// The command line without terminator.
    pub fn as_str(&self) -> &str {
        &self.line
    }

    /// The first token, e.g. `GETINFO`.
    pub fn keyword(&self) -> &str {
        self.line.split(' ').next().unwrap_or("")
    }

    /// The bytes written to the wire.
    pub fn encode(&self) -> String {
        let mut wire = String::with_capacity(self.line.len() + 2);
        wire.push_str(&self.line);
        wire.push_str("\r\n");
        wire
    }

    /// The command as it may appear in logs. Credentials are masked.
    pub fn redacted(&self) -> &str {
        if self.keyword().eq_ignore_ascii_case("AUTHENTICATE") {
            "AUTHENTICATE <redacted>"
        } else {
            &self.line
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.redacted())
    }
}

impl From<&str> for Command {
    fn from(line: &str) -> Self {
        Command::line(line)
    }
}

impl From<String> for Command {
    fn from(line: String) -> Self {
        Command::line(line)
    }
}

impl From<&[&str]> for Command {
    fn from(tokens: &[&str]) -> Self {
        Command::from_tokens(tokens)
    }
}

impl<const N: usize> From<[&str; N]> for Command {
    fn from(tokens: [&str; N]) -> Self {
        Command::from_tokens(tokens)
    }
}

impl From<Vec<String>> for Command {
    fn from(tokens: Vec<String>) -> Self {
        Command::from_tokens(tokens)
    }
}

impl From<Vec<&str>> for Command {
    fn from(tokens: Vec<&str>) -> Self {
        Command::from_tokens(tokens)
    }
}

/// One decoded reply line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyLine {
    /// The 3-digit status code.
    pub code: u16,
    /// The 4th character: '-' for mid-reply, '+' for data, ' ' for end.
    pub separator: char,
    /// Everything after the 4-character prefix.
    pub message: String,
}

impl ReplyLine {
    /// Build a reply line directly.
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            separator: ' ',
            message: message.into(),
        }
    }

    /// Parse a reply line from a string without its line terminator.
    pub fn parse(line: &str) -> Result<Self> {
        let digits = line.get(..3).filter(|d| d.bytes().all(|b| b.is_ascii_digit()));
        let code: u16 = match digits.and_then(|d| d.parse().ok()) {
            Some(code) => code,
            None => {
                return Err(ControlError::Malformed(format!(
                    "Invalid status code in: '{}'",
                    line
                )))
            }
        };

        let rest = &line[3..];
        let mut chars = rest.chars();
        let separator = chars.next().unwrap_or(' ');
        let message = chars.as_str().to_string();

        Ok(ReplyLine {
            code,
            separator,
            message,
        })
    }

    /// Check if this is the final line of a reply.
    pub fn is_end(&self) -> bool {
        self.separator == ' '
    }

    /// Check if this line opens a data block.
    pub fn is_data(&self) -> bool {
        self.separator == '+'
    }

    /// Whether the code is 400 or above.
    pub fn is_failure(&self) -> bool {
        StatusCode::is_failure(self.code)
    }

    /// Get the status code as an enum.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.code)
    }
}

impl fmt::Display for ReplyLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.code, self.separator, self.message)
    }
}

/// Split a payload into non-empty lines on CRLF or LF.
fn split_lines(payload: &str) -> impl Iterator<Item = &str> {
    payload
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
}

/// Decode one chunk of bytes as a complete reply.
pub fn parse_burst(payload: &[u8]) -> Result<Vec<ReplyLine>> {
    let text = String::from_utf8_lossy(payload);
    split_lines(&text).map(ReplyLine::parse).collect()
}

/// Apply the failure threshold to a decoded reply.
///
/// The first line with a code of 400 or above turns the whole reply into
/// [`ControlError::Rejected`] carrying that line's message.
pub fn check_reply(lines: Vec<ReplyLine>) -> Result<Vec<ReplyLine>> {
    if let Some(failed) = lines.iter().find(|line| line.is_failure()) {
        return Err(ControlError::Rejected {
            code: failed.code,
            message: failed.message.clone(),
        });
    }
    Ok(lines)
}

/// Take the first line of a reply.
pub fn first_line(lines: Vec<ReplyLine>) -> Result<ReplyLine> {
    lines
        .into_iter()
        .next()
        .ok_or_else(|| ControlError::Malformed("Empty reply".to_string()))
}

/// Incremental decoder that reassembles replies split across reads.
#[derive(Debug, Default)]
pub struct ReplyDecoder {
    buf: Vec<u8>,
    pending: Vec<ReplyLine>,
    data: Option<(ReplyLine, Vec<String>)>,
}

impl ReplyDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes read from the transport.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Whether any bytes or lines are held back waiting for more input.
    pub fn is_idle(&self) -> bool {
        self.buf.is_empty() && self.pending.is_empty() && self.data.is_none()
    }

    /// Return the next complete reply, or `None` if more bytes are needed.
    ///
    /// A line that is not a reply line fails with
    /// [`ControlError::Malformed`] and resets the decoder, since the reply
    /// it belonged to can no longer be delimited.
    pub fn next_reply(&mut self) -> Result<Option<Vec<ReplyLine>>> {
        while let Some(line) = self.take_line() {
            if self.data.is_some() {
                if line == "." {
                    self.close_data_block();
                } else if let Some((_, data)) = self.data.as_mut() {
                    // Leading dots are doubled on the wire.
                    let unescaped = line.strip_prefix('.').filter(|l| l.starts_with('.'));
                    data.push(unescaped.unwrap_or(&line).to_string());
                }
                continue;
            }

            if line.is_empty() {
                continue;
            }

            let reply_line = match ReplyLine::parse(&line) {
                Ok(reply_line) => reply_line,
                Err(e) => {
                    self.reset();
                    return Err(e);
                }
            };
            if reply_line.is_data() {
                self.data = Some((reply_line, Vec::new()));
            } else if reply_line.is_end() {
                self.pending.push(reply_line);
                return Ok(Some(std::mem::take(&mut self.pending)));
            } else {
                self.pending.push(reply_line);
            }
        }

        Ok(None)
    }

    /// Drop everything buffered, including partially assembled replies.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.pending.clear();
        self.data = None;
    }

    fn close_data_block(&mut self) {
        if let Some((mut head, data)) = self.data.take() {
            if !data.is_empty() {
                head.message.push('\n');
                head.message.push_str(&data.join("\n"));
            }
            self.pending.push(head);
        }
    }

    fn take_line(&mut self) -> Option<String> {
        let end = self.buf.iter().position(|&b| b == b'\n')?;
        let raw: Vec<u8> = self.buf.drain(..=end).collect();
        let raw = &raw[..raw.len() - 1];
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        Some(String::from_utf8_lossy(raw).into_owned())
    }
}
