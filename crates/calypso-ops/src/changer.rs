use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use calypso_console::{Console, ResponseClassifier, VtyClassifier, VtyCommand};
use calypso_core::{Extension, SubscriberId};
use calypso_hlr::{HlrResult, HlrStore};

use crate::mutation::{MutationResult, update_number_via_console, update_number_via_store};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPath {
    Console,
    Store,
}

/// Tries each configured path in order until one settles the request.
///
/// `Updated` and `NotFound` both settle it: a subscriber missing on one path
/// is not looked for on the next. Only `Failed` falls through.
pub struct MsisdnChanger {
    strategy: Vec<MutationPath>,
    classifier: Box<dyn ResponseClassifier>,
    stop: Option<Arc<AtomicBool>>,
}

impl Default for MsisdnChanger {
    fn default() -> Self {
        Self::new(vec![MutationPath::Console, MutationPath::Store])
    }
}

impl MsisdnChanger {
    pub fn new(strategy: Vec<MutationPath>) -> Self {
        Self {
            strategy,
            classifier: Box::new(VtyClassifier),
            stop: None,
        }
    }

    /// Checked before each path; once set, no further path is tried
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    fn stopped(&self) -> bool {
        self.stop.as_ref().is_some_and(|s| s.load(Ordering::Relaxed))
    }

    pub fn with_classifier(mut self, classifier: Box<dyn ResponseClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn strategy(&self) -> &[MutationPath] {
        &self.strategy
    }

    pub fn uses(&self, path: MutationPath) -> bool {
        self.strategy.contains(&path)
    }

    /// Runs the strategy. `console` is None when the console path is not
    /// wanted or could not be connected; that path is then skipped.
    /// The store is only opened if the store path is reached.
    pub fn run<F>(&self, mut console: Option<&mut dyn Console>, open_store: F, id: SubscriberId, number: &Extension) -> MutationResult
    where
        F: FnOnce() -> HlrResult<HlrStore>,
    {
        let mut open_store = Some(open_store);
        let mut result = MutationResult::Failed("no update path available".to_string());

        for path in &self.strategy {
            if self.stopped() {
                tracing::info!("interrupted before {:?} path", path);
                result = MutationResult::Interrupted;
                break;
            }
            result = match path {
                MutationPath::Console => match console.as_deref_mut() {
                    Some(c) => update_number_via_console(c, self.classifier.as_ref(), id, number),
                    None => {
                        tracing::info!("console path skipped: no session");
                        continue;
                    }
                },
                MutationPath::Store => match open_store.take().map(|open| open()) {
                    Some(Ok(mut store)) => update_number_via_store(&mut store, id, number),
                    Some(Err(e)) => {
                        tracing::warn!("store path failed: {}", e);
                        MutationResult::Failed(e.to_string())
                    }
                    None => continue,
                },
            };
            tracing::debug!("{:?} path: {:?}", path, result);
            if !matches!(result, MutationResult::Failed(_)) {
                break;
            }
        }

        if result == MutationResult::Updated {
            if let Some(c) = console.as_deref_mut() {
                // The controller caches subscribers; ask it to reload
                if let Err(e) = c.run(&VtyCommand::Sync) {
                    tracing::warn!("subscriber sync failed: {}", e);
                }
            }
        }
        result
    }
}
