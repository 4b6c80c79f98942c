use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use calypso_console::{ConsoleError, ScriptedConsole, Transcript};

#[derive(Debug, Clone)]
struct Subscriber {
    imsi: String,
    extension: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    subscribers: BTreeMap<u64, Subscriber>,
    next_id: u64,
    /// Command prefixes answered with an error marker
    reject: Vec<String>,
}

/// In-memory controller answering VTY command lines the way an OpenBSC NITB does.
/// Clones share state, so several scripted sessions see the same subscribers.
#[derive(Debug, Clone, Default)]
pub struct FakeNitb {
    state: Arc<Mutex<State>>,
    transcript: Transcript,
}

impl FakeNitb {
    pub fn new() -> Self {
        let nitb = Self::default();
        nitb.state.lock().unwrap().next_id = 100;
        nitb
    }

    pub fn with_subscriber(self, id: u64, imsi: &str, extension: Option<&str>) -> Self {
        self.state.lock().unwrap().subscribers.insert(
            id,
            Subscriber {
                imsi: imsi.to_string(),
                extension: extension.map(str::to_string),
            },
        );
        self
    }

    /// Lines starting with `prefix` get `% Error ...` back
    pub fn reject(self, prefix: &str) -> Self {
        self.state.lock().unwrap().reject.push(prefix.to_string());
        self
    }

    pub fn console(&self) -> ScriptedConsole {
        ScriptedConsole::with_transcript(self.transcript.clone(), self.responder())
    }

    /// Answers lines against the shared state without recording them
    pub fn responder(&self) -> impl FnMut(&str) -> Result<String, ConsoleError> + Send + 'static {
        let state = self.state.clone();
        move |line: &str| Ok(answer(&mut state.lock().unwrap(), line))
    }

    pub fn transcript(&self) -> Transcript {
        self.transcript.clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.transcript.lines()
    }

    pub fn extension_of(&self, id: u64) -> Option<String> {
        self.state.lock().unwrap().subscribers.get(&id).and_then(|s| s.extension.clone())
    }

    pub fn extension_of_imsi(&self, imsi: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.subscribers.values().find(|s| s.imsi == imsi).and_then(|s| s.extension.clone())
    }
}

impl FakeNitb {
    /// Responder that fails every exchange, like a dropped session
    pub fn broken_console() -> ScriptedConsole {
        ScriptedConsole::new(|_| Err(ConsoleError::Closed))
    }
}

fn answer(state: &mut State, line: &str) -> String {
    if state.reject.iter().any(|p| line.starts_with(p.as_str())) {
        return "% Error: command rejected\n".to_string();
    }

    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        ["enable"] | ["disable"] | ["subscriber", "sync"] => String::new(),
        ["show", "subscriber", "id", id] => match id.parse::<u64>().ok().and_then(|id| state.subscribers.get(&id)) {
            Some(s) => format!("    IMSI: {}\n    Extension: {}\n", s.imsi, s.extension.as_deref().unwrap_or("")),
            None => format!("% No subscriber found for id {}\n", id),
        },
        ["show", "subscriber", "imsi", imsi] => match state.subscribers.values().find(|s| s.imsi == *imsi) {
            Some(s) => format!("    IMSI: {}\n", s.imsi),
            None => format!("% No subscriber found for imsi {}\n", imsi),
        },
        ["show", "subscriber", "extension", ext] => {
            match state.subscribers.values().find(|s| s.extension.as_deref() == Some(*ext)) {
                Some(s) => format!("    IMSI: {}\n    Extension: {}\n", s.imsi, ext),
                None => format!("% No subscriber found for extension {}\n", ext),
            }
        }
        ["subscriber", "create", "imsi", imsi] => {
            let id = state.next_id;
            state.next_id += 1;
            state.subscribers.insert(
                id,
                Subscriber {
                    imsi: imsi.to_string(),
                    extension: None,
                },
            );
            format!("    ID: {}, Authorized: 0\n", id)
        }
        ["subscriber", "id", id, "extension", ext] => match id.parse::<u64>().ok().and_then(|id| state.subscribers.get_mut(&id)) {
            Some(s) => {
                s.extension = Some(ext.to_string());
                String::new()
            }
            None => format!("% No subscriber found for id {}\n", id),
        },
        ["subscriber", "imsi", imsi, "extension", ext] => match state.subscribers.values_mut().find(|s| s.imsi == *imsi) {
            Some(s) => {
                s.extension = Some(ext.to_string());
                String::new()
            }
            None => format!("% No subscriber found for imsi {}\n", imsi),
        },
        ["subscriber", "id", id, "sms", ..] => match id.parse::<u64>().ok().filter(|id| state.subscribers.contains_key(id)) {
            Some(_) => String::new(),
            None => format!("% No subscriber found for id {}\n", id),
        },
        ["subscriber", "extension", ext, "sms" | "silent-sms" | "ussd-notify", ..] => {
            if state.subscribers.values().any(|s| s.extension.as_deref() == Some(*ext)) {
                String::new()
            } else {
                format!("% No subscriber found for extension {}\n", ext)
            }
        }
        _ => "% Unknown command.\n".to_string(),
    }
}
