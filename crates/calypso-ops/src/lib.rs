//! Operator workflows on top of the console and the HLR store
//!
//! - `changer`: registered-number update with console/store fallback
//! - `broadcast`: SMS to every subscriber, continue-on-error
//! - `ussd`: two-pass USSD broadcast with silent-SMS priming
//! - `flood`: repeated SMS from rotating spoofed senders, fail-fast

pub mod broadcast;
pub mod changer;
pub mod error;
pub mod flood;
pub mod mutation;
pub mod pacing;
pub mod sentinel;
pub mod spoof;
pub mod ussd;

pub use broadcast::{BroadcastReport, DeliveryFailure, SmsBroadcast};
pub use changer::{MsisdnChanger, MutationPath};
pub use error::OpsError;
pub use flood::{FloodJob, FloodReport, SmsFlood};
pub use mutation::{MutationResult, update_number_via_console, update_number_via_store};
pub use pacing::{Pacer, RecordingPacer, ThreadPacer};
pub use sentinel::{SentinelState, assign_extension_to_imsi, ensure_sentinel};
pub use spoof::SpoofNumberGenerator;
pub use ussd::{ConsoleConnector, TelnetConnector, UssdBroadcast, UssdMessage};
