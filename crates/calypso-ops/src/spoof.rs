use calypso_config::CfgIdentity;
use calypso_core::Extension;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::OpsError;

/// Produces sender numbers: a prefix from the configured set followed by random digits
pub struct SpoofNumberGenerator {
    prefixes: Vec<String>,
    digits: usize,
    rng: StdRng,
}

impl SpoofNumberGenerator {
    pub fn new(prefixes: Vec<String>, digits: usize) -> Self {
        Self::with_rng(prefixes, digits, StdRng::from_os_rng())
    }

    /// Deterministic sequence, for tests and reproducible runs
    pub fn seeded(prefixes: Vec<String>, digits: usize, seed: u64) -> Self {
        Self::with_rng(prefixes, digits, StdRng::seed_from_u64(seed))
    }

    pub fn from_config(cfg: &CfgIdentity) -> Self {
        Self::new(cfg.spoof_prefixes.clone(), cfg.spoof_digits)
    }

    fn with_rng(prefixes: Vec<String>, digits: usize, rng: StdRng) -> Self {
        Self { prefixes, digits, rng }
    }

    pub fn next_number(&mut self) -> Result<Extension, OpsError> {
        let prefix = self.prefixes.choose(&mut self.rng).map(String::as_str).unwrap_or_default();
        let mut number = String::with_capacity(prefix.len() + self.digits);
        number.push_str(prefix);
        for _ in 0..self.digits {
            let d: u8 = self.rng.random_range(0..10);
            number.push(char::from(b'0' + d));
        }
        Ok(Extension::parse(&number)?)
    }
}
