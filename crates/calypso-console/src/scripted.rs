use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::ConsoleError;
use crate::session::{Console, ConsoleMode};

type Responder = Box<dyn FnMut(&str) -> Result<String, ConsoleError> + Send>;

/// Shared record of every line written to one or more scripted consoles
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    lines: Arc<Mutex<Vec<String>>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Number of recorded lines starting with `prefix`
    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.lines().iter().filter(|l| l.starts_with(prefix)).count()
    }
}

/// Stand-in for the controller console.
///
/// Every line, including `enable`/`disable`/`exit`, is recorded in the
/// transcript and answered by the responder.
pub struct ScriptedConsole {
    transcript: Transcript,
    responder: Responder,
    mode: ConsoleMode,
    closed: bool,
}

impl ScriptedConsole {
    pub fn new<F>(responder: F) -> Self
    where
        F: FnMut(&str) -> Result<String, ConsoleError> + Send + 'static,
    {
        Self::with_transcript(Transcript::new(), responder)
    }

    pub fn with_transcript<F>(transcript: Transcript, responder: F) -> Self
    where
        F: FnMut(&str) -> Result<String, ConsoleError> + Send + 'static,
    {
        Self {
            transcript,
            responder: Box::new(responder),
            mode: ConsoleMode::User,
            closed: false,
        }
    }

    /// Answers every command with an empty reply, like a controller that accepts everything
    pub fn silent() -> Self {
        Self::new(|_| Ok(String::new()))
    }

    /// Answers from a fixed queue in order, then with empty replies
    pub fn from_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut queue: VecDeque<String> = responses.into_iter().map(Into::into).collect();
        Self::new(move |_| Ok(queue.pop_front().unwrap_or_default()))
    }

    pub fn transcript(&self) -> Transcript {
        self.transcript.clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.transcript.lines()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Console for ScriptedConsole {
    fn send(&mut self, line: &str) -> Result<String, ConsoleError> {
        if self.closed {
            return Err(ConsoleError::NotConnected);
        }
        if line.contains(['\r', '\n']) {
            return Err(ConsoleError::MultiLine(line.to_string()));
        }
        self.transcript.push(line);
        (self.responder)(line)
    }

    fn enable(&mut self) -> Result<(), ConsoleError> {
        self.send("enable")?;
        self.mode = ConsoleMode::Privileged;
        Ok(())
    }

    fn disable(&mut self) -> Result<(), ConsoleError> {
        self.send("disable")?;
        self.mode = ConsoleMode::User;
        Ok(())
    }

    fn mode(&self) -> ConsoleMode {
        self.mode
    }

    fn close(&mut self) {
        if !self.closed {
            self.transcript.push("exit");
            self.closed = true;
        }
    }
}
