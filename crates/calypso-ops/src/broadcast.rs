use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use calypso_console::{Console, ConsoleError, Reply, ResponseClassifier, SmsTarget, VtyClassifier, VtyCommand};
use calypso_core::{Extension, Imsi, assert_warn};
use calypso_hlr::SubscriberRecord;

use crate::OpsError;
use crate::pacing::Pacer;
use crate::sentinel::{assign_extension_to_imsi, ensure_sentinel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub target: String,
    pub reason: String,
}

/// Per-target results of a bulk pass, in the order the targets were tried
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: Vec<String>,
    pub failed: Vec<DeliveryFailure>,
    /// Set when Ctrl+C ended the pass early
    pub interrupted: bool,
}

impl BroadcastReport {
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }

    pub(crate) fn fail(&mut self, target: impl Into<String>, reason: impl Into<String>) {
        self.failed.push(DeliveryFailure {
            target: target.into(),
            reason: reason.into(),
        });
    }
}

/// Sends one SMS from a fixed sender extension to every target.
///
/// A rejected delivery is recorded and the loop moves on to the next target.
pub struct SmsBroadcast {
    classifier: Box<dyn ResponseClassifier>,
    command_delay: Duration,
    /// When the sender extension is unknown, bind it to this sentinel IMSI instead of failing
    provision_sender: Option<Imsi>,
}

impl SmsBroadcast {
    pub fn new(command_delay: Duration) -> Self {
        Self {
            classifier: Box::new(VtyClassifier),
            command_delay,
            provision_sender: None,
        }
    }

    pub fn with_classifier(mut self, classifier: Box<dyn ResponseClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn provision_sender(mut self, sentinel: Imsi) -> Self {
        self.provision_sender = Some(sentinel);
        self
    }

    pub fn run(
        &self,
        console: &mut dyn Console,
        targets: &[SubscriberRecord],
        sender: &Extension,
        text: &str,
        pacer: &dyn Pacer,
        stop: &AtomicBool,
    ) -> Result<BroadcastReport, OpsError> {
        assert_warn!(!text.trim().is_empty(), "broadcasting an empty message");
        self.check_sender(console, sender)?;

        let mut report = BroadcastReport::default();
        for (i, record) in targets.iter().enumerate() {
            if stop.load(Ordering::Relaxed) {
                tracing::info!("broadcast interrupted after {} of {} targets", i, targets.len());
                report.interrupted = true;
                break;
            }
            if i > 0 {
                pacer.pause(self.command_delay);
            }

            let cmd = VtyCommand::SendSms {
                target: SmsTarget::Id(record.id),
                sender,
                text,
            };
            let target = record.id.to_string();
            match console.run(&cmd) {
                Ok(response) => match self.classifier.classify(cmd.kind(), &response) {
                    Reply::Error(line) => {
                        tracing::warn!("sms to subscriber {} failed: {}", target, line);
                        report.fail(target, line);
                    }
                    _ => {
                        tracing::debug!("sms to subscriber {} accepted", target);
                        report.delivered.push(target);
                    }
                },
                // A late reply leaves the session usable once the prompt arrives; a dead stream does not
                Err(e @ ConsoleError::Timeout { .. }) => {
                    tracing::warn!("sms to subscriber {} timed out", target);
                    report.fail(target, e.to_string());
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!(
            "broadcast done: {} delivered, {} failed of {} targets",
            report.delivered.len(),
            report.failed.len(),
            targets.len()
        );
        Ok(report)
    }

    fn check_sender(&self, console: &mut dyn Console, sender: &Extension) -> Result<(), OpsError> {
        let lookup = VtyCommand::ShowSubscriberByExtension(sender);
        let response = console.run(&lookup)?;
        match self.classifier.classify(lookup.kind(), &response) {
            Reply::Ok => Ok(()),
            Reply::Error(line) => Err(OpsError::command(&lookup.to_line(), &line)),
            Reply::NotFound => match &self.provision_sender {
                Some(imsi) => {
                    tracing::info!("sender extension {} unknown, binding it to imsi {}", sender, imsi);
                    ensure_sentinel(console, self.classifier.as_ref(), imsi)?;
                    assign_extension_to_imsi(console, self.classifier.as_ref(), imsi, sender)
                }
                None => Err(OpsError::NotFound(format!("sender extension {}", sender))),
            },
        }
    }
}
