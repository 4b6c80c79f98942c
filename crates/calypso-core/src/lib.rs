//! Core utilities for the Calypso BTS operator tools
//!
//! This crate provides the small set of types shared by every tool:
//! - Validated subscriber identities (id, extension, IMSI)
//! - Logging setup and helper macros

pub mod debug;
pub mod identity;

pub use identity::{Extension, IdentityError, Imsi, SubscriberId};
