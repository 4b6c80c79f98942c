use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use calypso_config::CfgConsole;

use crate::command::VtyCommand;
use crate::error::ConsoleError;
use crate::telnet::TelnetFilter;

/// Privilege level of a console session. Decides which prompt ends a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleMode {
    User,
    Privileged,
}

/// Command/response access to the controller console.
///
/// Every operation talks to the controller through this trait, so the
/// controller can be replaced by a [`crate::ScriptedConsole`] in tests.
pub trait Console {
    /// Writes `line` plus newline and returns the reply text up to the next prompt.
    fn send(&mut self, line: &str) -> Result<String, ConsoleError>;

    /// Enters privileged mode (`enable`)
    fn enable(&mut self) -> Result<(), ConsoleError>;

    /// Leaves privileged mode (`disable`)
    fn disable(&mut self) -> Result<(), ConsoleError>;

    fn mode(&self) -> ConsoleMode;

    /// Best-effort teardown. Never fails, safe to call twice.
    fn close(&mut self);

    fn run(&mut self, cmd: &VtyCommand<'_>) -> Result<String, ConsoleError> {
        self.send(&cmd.to_line())
    }
}

/// Console session over the controller's telnet VTY.
///
/// Replies are read until the prompt of the current mode shows up in the
/// received text. Anything the controller sent after the prompt is kept for
/// the next exchange. Each read is bounded by the configured read timeout; when the prompt
/// does not show up in time the call fails with [`ConsoleError::Timeout`]
/// carrying what was received so far.
pub struct TelnetConsole {
    stream: Option<TcpStream>,
    peer: String,
    filter: TelnetFilter,
    /// Filtered bytes received after the last matched prompt
    pending: Vec<u8>,
    user_prompt: String,
    privileged_prompt: String,
    read_timeout: Duration,
    mode: ConsoleMode,
}

impl TelnetConsole {
    /// Connects and waits for the first unprivileged prompt
    pub fn open(cfg: &CfgConsole) -> Result<Self, ConsoleError> {
        let peer = format!("{}:{}", cfg.host, cfg.port);
        tracing::debug!("TelnetConsole: connecting to {}", peer);

        let stream = connect_stream(&peer, cfg.connect_timeout)?;
        let mut console = Self {
            stream: Some(stream),
            peer,
            filter: TelnetFilter::new(),
            pending: Vec::new(),
            user_prompt: cfg.user_prompt.clone(),
            privileged_prompt: cfg.privileged_prompt.clone(),
            read_timeout: cfg.read_timeout,
            mode: ConsoleMode::User,
        };

        let banner = console.read_until_prompt(ConsoleMode::User)?;
        tracing::debug!("TelnetConsole: connected to {}, banner {} bytes", console.peer, banner.len());
        Ok(console)
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    fn prompt_for(&self, mode: ConsoleMode) -> &str {
        match mode {
            ConsoleMode::User => &self.user_prompt,
            ConsoleMode::Privileged => &self.privileged_prompt,
        }
    }

    /// Writes one command line and collects the reply up to the prompt of `expect`
    fn exchange(&mut self, line: &str, expect: ConsoleMode) -> Result<String, ConsoleError> {
        if line.contains(['\r', '\n']) {
            return Err(ConsoleError::MultiLine(line.to_string()));
        }
        let stream = self.stream.as_mut().ok_or(ConsoleError::NotConnected)?;

        tracing::debug!("-> {}", line);
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        stream.write_all(&buf)?;
        stream.flush()?;

        let raw = self.read_until_prompt(expect)?;
        let reply = strip_echo(&raw, line);
        tracing::debug!("<- {} bytes", reply.len());
        tracing::trace!("<- {:?}", reply);
        Ok(reply)
    }

    /// Reads until the prompt for `mode` appears in the received text.
    /// Returns the text before the prompt, line endings normalized to `\n`;
    /// bytes after it stay in `pending`.
    fn read_until_prompt(&mut self, mode: ConsoleMode) -> Result<String, ConsoleError> {
        let prompt = self.prompt_for(mode).as_bytes().to_vec();
        let deadline = Instant::now() + self.read_timeout;
        let stream = self.stream.as_mut().ok_or(ConsoleError::NotConnected)?;

        let mut text: Vec<u8> = std::mem::take(&mut self.pending);
        let mut chunk = [0u8; 1024];
        loop {
            if let Some(pos) = find_prompt(&text, &prompt) {
                self.pending = text.split_off(pos + prompt.len());
                text.truncate(pos);
                if !self.pending.is_empty() {
                    tracing::trace!("TelnetConsole: {} bytes after prompt kept", self.pending.len());
                }
                return Ok(normalize(&text));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(timeout(&prompt, &text));
            }
            stream.set_read_timeout(Some(remaining))?;

            let n = match stream.read(&mut chunk) {
                Ok(0) => return Err(ConsoleError::Closed),
                Ok(n) => n,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Err(timeout(&prompt, &text));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ConsoleError::Io(e)),
            };

            let mut replies = Vec::new();
            self.filter.feed(&chunk[..n], &mut text, &mut replies);
            if !replies.is_empty() {
                tracing::trace!("TelnetConsole: refusing {} bytes of option negotiation", replies.len());
                stream.write_all(&replies)?;
            }
        }
    }
}

impl Console for TelnetConsole {
    fn send(&mut self, line: &str) -> Result<String, ConsoleError> {
        self.exchange(line, self.mode)
    }

    fn enable(&mut self) -> Result<(), ConsoleError> {
        self.exchange(&VtyCommand::Enable.to_line(), ConsoleMode::Privileged)?;
        self.mode = ConsoleMode::Privileged;
        Ok(())
    }

    fn disable(&mut self) -> Result<(), ConsoleError> {
        self.exchange(&VtyCommand::Disable.to_line(), ConsoleMode::User)?;
        self.mode = ConsoleMode::User;
        Ok(())
    }

    fn mode(&self) -> ConsoleMode {
        self.mode
    }

    fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.write_all(format!("{}\n", VtyCommand::Exit).as_bytes());
            let _ = stream.flush();
            let _ = stream.shutdown(Shutdown::Both);
            tracing::debug!("TelnetConsole: closed session to {}", self.peer);
        }
    }
}

impl Drop for TelnetConsole {
    fn drop(&mut self) {
        self.close();
    }
}

/// Resolves `addr` and connects to the first address that answers
fn connect_stream(addr: &str, connect_timeout: Duration) -> Result<TcpStream, ConsoleError> {
    let connect_err = |source: std::io::Error| ConsoleError::Connect {
        addr: addr.to_string(),
        source,
    };

    let mut last_err = None;
    for socket_addr in addr.to_socket_addrs().map_err(connect_err)? {
        tracing::trace!("TelnetConsole: trying {}", socket_addr);
        match TcpStream::connect_timeout(&socket_addr, connect_timeout) {
            Ok(stream) => {
                stream.set_nodelay(true).map_err(connect_err)?;
                return Ok(stream);
            }
            Err(e) => last_err = Some(e),
        }
    }
    Err(connect_err(
        last_err.unwrap_or_else(|| std::io::Error::new(ErrorKind::NotFound, "no addresses resolved")),
    ))
}

/// Offset of the first occurrence of `prompt` in `text`
fn find_prompt(text: &[u8], prompt: &[u8]) -> Option<usize> {
    if prompt.is_empty() || text.len() < prompt.len() {
        return None;
    }
    text.windows(prompt.len()).position(|w| w == prompt)
}

fn timeout(prompt: &[u8], text: &[u8]) -> ConsoleError {
    ConsoleError::Timeout {
        expected: String::from_utf8_lossy(prompt).into_owned(),
        partial: normalize(text),
    }
}

fn normalize(text: &[u8]) -> String {
    String::from_utf8_lossy(text).replace("\r\n", "\n").replace('\r', "\n")
}

/// The VTY echoes what it was sent; drop the first line equal to the command.
/// Notices queued in front of the echo are kept.
fn strip_echo(reply: &str, line: &str) -> String {
    let mut out = String::with_capacity(reply.len());
    let mut stripped = false;
    for l in reply.split_inclusive('\n') {
        if !stripped && l.trim() == line.trim() {
            stripped = true;
            continue;
        }
        out.push_str(l);
    }
    out
}
