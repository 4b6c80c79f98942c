pub mod fake_vty;

pub use fake_vty::{Behaviour, FakeVty};
