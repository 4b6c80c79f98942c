use calypso_console::{Console, ConsoleMode, Reply, ResponseClassifier, VtyCommand};
use calypso_core::{Extension, SubscriberId};
use calypso_hlr::{HlrStore, MutationOutcome};

/// Outcome of one attempt to change a registered number
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationResult {
    Updated,
    NotFound,
    Failed(String),
    /// Stopped by the operator before a path settled the request
    Interrupted,
}

impl MutationResult {
    /// The single line a tool prints for this outcome
    pub fn status_line(&self, id: SubscriberId) -> String {
        match self {
            MutationResult::Updated => format!("Successfully updated MSISDN for Subscriber ID {}", id),
            MutationResult::NotFound => format!("No Subscriber found for id {}", id),
            MutationResult::Failed(_) => format!("Failed to update MSISDN for Subscriber ID {}", id),
            MutationResult::Interrupted => "Operation cancelled by user".to_string(),
        }
    }

    /// A missing subscriber is a valid answer, not a failure of the tool
    pub fn exit_code(&self) -> i32 {
        match self {
            MutationResult::Updated | MutationResult::NotFound => 0,
            MutationResult::Failed(_) => 1,
            MutationResult::Interrupted => 130,
        }
    }
}

/// Changes the extension through the console, entering privileged mode first
pub fn update_number_via_console(
    console: &mut dyn Console,
    classifier: &dyn ResponseClassifier,
    id: SubscriberId,
    number: &Extension,
) -> MutationResult {
    if console.mode() == ConsoleMode::User {
        if let Err(e) = console.enable() {
            return MutationResult::Failed(e.to_string());
        }
    }

    let cmd = VtyCommand::SetExtensionById { id, extension: number };
    let response = match console.run(&cmd) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!("console update of subscriber {} failed: {}", id, e);
            return MutationResult::Failed(e.to_string());
        }
    };
    match classifier.classify(cmd.kind(), &response) {
        Reply::Ok => MutationResult::Updated,
        Reply::NotFound => MutationResult::NotFound,
        Reply::Error(line) => {
            tracing::warn!("console rejected update of subscriber {}: {}", id, line);
            MutationResult::Failed(line)
        }
    }
}

/// Changes the registered number directly in the HLR file
pub fn update_number_via_store(store: &mut HlrStore, id: SubscriberId, number: &Extension) -> MutationResult {
    match store.update_registered_number(id, number) {
        Ok(MutationOutcome::Updated) => MutationResult::Updated,
        Ok(MutationOutcome::NotFound) => MutationResult::NotFound,
        Err(e) => {
            tracing::warn!("store update of subscriber {} failed: {}", id, e);
            MutationResult::Failed(e.to_string())
        }
    }
}
