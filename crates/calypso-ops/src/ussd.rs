//! USSD notification to every subscriber with a numeric extension.
//!
//! Phones often drop a USSD notify while idle, so each subscriber is first
//! paged with silent SMS. The notify pass runs only after the whole priming
//! pass plus a settle delay, and only for subscribers that were reached.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use calypso_config::{CfgConsole, CfgPacing};
use calypso_console::{Console, ConsoleError, Reply, ResponseClassifier, TelnetConsole, VtyClassifier, VtyCommand};
use calypso_core::{Extension, Imsi};
use calypso_hlr::SubscriberRecord;

use crate::OpsError;
use crate::broadcast::BroadcastReport;
use crate::pacing::Pacer;
use crate::sentinel::ensure_sentinel;

pub const SILENT_SMS_TEXT: &str = ".SILENT";

/// Opens console sessions. The USSD broadcast uses a fresh session per subscriber.
pub trait ConsoleConnector {
    fn connect(&mut self) -> Result<Box<dyn Console>, ConsoleError>;
}

pub struct TelnetConnector {
    cfg: CfgConsole,
}

impl TelnetConnector {
    pub fn new(cfg: CfgConsole) -> Self {
        Self { cfg }
    }
}

impl ConsoleConnector for TelnetConnector {
    fn connect(&mut self) -> Result<Box<dyn Console>, ConsoleError> {
        Ok(Box::new(TelnetConsole::open(&self.cfg)?))
    }
}

/// USSD notify payload; `ussd_type` is passed to the controller unchanged
#[derive(Debug, Clone, Copy)]
pub struct UssdMessage<'a> {
    pub ussd_type: u8,
    pub text: &'a str,
}

pub struct UssdBroadcast {
    classifier: Box<dyn ResponseClassifier>,
    sentinel: Imsi,
    silent_sms_count: u32,
    command_delay: Duration,
    settle_delay: Duration,
}

impl UssdBroadcast {
    pub fn new(sentinel: Imsi, pacing: &CfgPacing) -> Self {
        Self {
            classifier: Box::new(VtyClassifier),
            sentinel,
            silent_sms_count: pacing.silent_sms_count,
            command_delay: pacing.command_delay,
            settle_delay: pacing.settle_delay,
        }
    }

    pub fn with_classifier(mut self, classifier: Box<dyn ResponseClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Runs both passes. `on_result` is called once per notified subscriber
    /// with the delivery verdict, as soon as it is known.
    pub fn run(
        &self,
        connector: &mut dyn ConsoleConnector,
        targets: &[SubscriberRecord],
        message: UssdMessage<'_>,
        pacer: &dyn Pacer,
        stop: &AtomicBool,
        on_result: &mut dyn FnMut(&Extension, bool),
    ) -> Result<BroadcastReport, OpsError> {
        let mut report = BroadcastReport::default();

        let candidates: Vec<Extension> = targets
            .iter()
            .filter_map(|r| r.number.as_deref())
            .filter_map(|n| Extension::parse_existing(n.trim()).ok())
            .filter(Extension::is_numeric)
            .collect();
        tracing::info!("ussd: priming {} of {} subscribers", candidates.len(), targets.len());

        let mut primed = Vec::with_capacity(candidates.len());
        for ext in candidates {
            if stop.load(Ordering::Relaxed) {
                report.interrupted = true;
                return Ok(report);
            }
            match self.with_session(connector, |console| self.prime(console, &ext)) {
                Ok(()) => primed.push(ext),
                Err(e) => {
                    tracing::warn!("ussd: priming {} failed: {}", ext, e);
                    report.fail(ext.as_str(), e.to_string());
                }
            }
            pacer.pause(self.command_delay);
        }

        pacer.pause(self.settle_delay);

        for ext in primed {
            if stop.load(Ordering::Relaxed) {
                report.interrupted = true;
                break;
            }
            match self.with_session(connector, |console| self.notify(console, &ext, message)) {
                Ok(()) => {
                    on_result(&ext, true);
                    report.delivered.push(ext.to_string());
                }
                Err(e) => {
                    tracing::warn!("ussd: notify {} failed: {}", ext, e);
                    on_result(&ext, false);
                    report.fail(ext.as_str(), e.to_string());
                }
            }
            pacer.pause(self.command_delay);
        }
        Ok(report)
    }

    /// Opens a session, runs `f`, and closes the session whatever the outcome
    fn with_session<F>(&self, connector: &mut dyn ConsoleConnector, f: F) -> Result<(), OpsError>
    where
        F: FnOnce(&mut dyn Console) -> Result<(), OpsError>,
    {
        let mut console = connector.connect().map_err(OpsError::Connection)?;
        let result = f(console.as_mut());
        console.close();
        result
    }

    fn prime(&self, console: &mut dyn Console, ext: &Extension) -> Result<(), OpsError> {
        ensure_sentinel(console, self.classifier.as_ref(), &self.sentinel)?;
        let cmd = VtyCommand::SendSilentSms {
            target: ext,
            sender: &self.sentinel,
            text: SILENT_SMS_TEXT,
        };
        for _ in 0..self.silent_sms_count {
            let response = console.run(&cmd)?;
            // Reaching the controller is what counts here; a rejected page is only noted
            if let Reply::Error(line) = self.classifier.classify(cmd.kind(), &response) {
                tracing::debug!("ussd: silent sms to {} rejected: {}", ext, line);
            }
        }
        Ok(())
    }

    fn notify(&self, console: &mut dyn Console, ext: &Extension, message: UssdMessage<'_>) -> Result<(), OpsError> {
        ensure_sentinel(console, self.classifier.as_ref(), &self.sentinel)?;
        let cmd = VtyCommand::UssdNotify {
            target: ext,
            ussd_type: message.ussd_type,
            text: message.text,
        };
        let response = console.run(&cmd)?;
        match self.classifier.classify(cmd.kind(), &response) {
            Reply::Error(line) => Err(OpsError::command(&cmd.to_line(), &line)),
            _ => Ok(()),
        }
    }
}
