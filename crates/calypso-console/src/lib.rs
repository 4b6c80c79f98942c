//! Controller console (VTY) access
//!
//! This crate drives the controller's line-oriented telnet console:
//! - `TelnetConsole`: prompt-matching session with bounded reads
//! - `VtyCommand`: the command lines the tools issue
//! - `ResponseClassifier`: marker-based judgement of free-text replies
//! - `ScriptedConsole`: in-memory console for tests

pub mod classify;
pub mod command;
pub mod error;
pub mod scripted;
pub mod session;
pub mod telnet;

pub use classify::{Reply, ResponseClassifier, VtyClassifier};
pub use command::{CommandKind, SmsTarget, VtyCommand};
pub use error::ConsoleError;
pub use scripted::{ScriptedConsole, Transcript};
pub use session::{Console, ConsoleMode, TelnetConsole};
