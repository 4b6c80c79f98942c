//! Launcher for the controller, its helper scripts and the operator tools
//!
//! Every action of the operator panel maps to an argument vector that is
//! spawned directly, never through a shell. Long-running SMS capture runs in
//! a `CaptureWorker` that streams output lines over a channel.

pub mod actions;
pub mod capture;
pub mod error;
pub mod launcher;
pub mod report;

pub use actions::{Action, EditTarget, LaunchContext, LaunchMode, LaunchSpec, Script};
pub use capture::CaptureWorker;
pub use error::LaunchError;
pub use launcher::{ActionOutcome, LaunchHandle, Launcher};
pub use report::delivery_report;
