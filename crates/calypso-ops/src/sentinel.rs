//! The sentinel subscriber: a fixed IMSI created on demand and used as the
//! sender identity for bulk messaging. Its extension is overwritten freely.

use calypso_console::{Console, Reply, ResponseClassifier, VtyCommand};
use calypso_core::{Extension, Imsi};

use crate::OpsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentinelState {
    Existing,
    Created,
}

/// Looks the sentinel up and creates it when the controller does not know it
pub fn ensure_sentinel(console: &mut dyn Console, classifier: &dyn ResponseClassifier, imsi: &Imsi) -> Result<SentinelState, OpsError> {
    let lookup = VtyCommand::ShowSubscriberByImsi(imsi);
    let response = console.run(&lookup)?;
    match classifier.classify(lookup.kind(), &response) {
        Reply::Ok => Ok(SentinelState::Existing),
        Reply::Error(line) => Err(OpsError::command(&lookup.to_line(), &line)),
        Reply::NotFound => {
            let create = VtyCommand::CreateSubscriber(imsi);
            let response = console.run(&create)?;
            if let Reply::Error(line) = classifier.classify(create.kind(), &response) {
                return Err(OpsError::command(&create.to_line(), &line));
            }
            tracing::info!("created sentinel subscriber imsi {}", imsi);
            Ok(SentinelState::Created)
        }
    }
}

/// Binds `extension` to the subscriber with `imsi`. Needs privileged mode,
/// which is entered and left again around the assignment.
pub fn assign_extension_to_imsi(
    console: &mut dyn Console,
    classifier: &dyn ResponseClassifier,
    imsi: &Imsi,
    extension: &Extension,
) -> Result<(), OpsError> {
    console.enable()?;
    let assign = VtyCommand::SetExtensionByImsi { imsi, extension };
    let result = console.run(&assign);
    // Drop privileges even when the assignment failed
    console.disable()?;

    let response = result?;
    match classifier.classify(assign.kind(), &response) {
        Reply::Error(line) => Err(OpsError::command(&assign.to_line(), &line)),
        _ => {
            tracing::debug!("imsi {} now has extension {}", imsi, extension);
            Ok(())
        }
    }
}
