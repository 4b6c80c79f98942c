//! Access to the controller's subscriber database (HLR)

pub mod error;
pub mod fixtures;
pub mod listing;
pub mod network;
pub mod store;

pub use error::{HlrError, HlrResult};
pub use store::{HlrStore, MutationOutcome, SubscriberRecord};
