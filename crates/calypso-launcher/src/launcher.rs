use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};

use calypso_config::SharedConfig;

use crate::actions::{Action, LaunchContext, LaunchMode, LaunchSpec};
use crate::capture::{CaptureWorker, capture_spec};
use crate::error::LaunchError;
use crate::report::delivery_report;

/// What an action produced, handed to the completion callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// A detached program was started and left running
    Started { title: &'static str, pid: u32 },
    /// A captured program ran to completion
    Finished { title: &'static str, success: bool, output: String },
    Failed { title: &'static str, error: String },
}

impl ActionOutcome {
    pub fn title(&self) -> &'static str {
        match self {
            ActionOutcome::Started { title, .. } | ActionOutcome::Finished { title, .. } | ActionOutcome::Failed { title, .. } => title,
        }
    }

    /// Launch error, or a captured tool that exited nonzero
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ActionOutcome::Failed { .. } | ActionOutcome::Finished { success: false, .. }
        )
    }

    /// Body of the result window
    pub fn text(&self) -> String {
        match self {
            ActionOutcome::Started { pid, .. } => format!("started (pid {})", pid),
            ActionOutcome::Finished { output, .. } => output.clone(),
            ActionOutcome::Failed { error, .. } => error.clone(),
        }
    }
}

/// Completion of a launched action. Captured actions finish on a worker thread.
pub struct LaunchHandle {
    worker: Option<JoinHandle<()>>,
}

impl LaunchHandle {
    fn done() -> Self {
        Self { worker: None }
    }

    /// Blocks until the completion callback has run
    pub fn wait(mut self) {
        if let Some(w) = self.worker.take() {
            if w.join().is_err() {
                tracing::error!("Launcher: action worker panicked");
            }
        }
    }
}

pub struct Launcher {
    ctx: LaunchContext,
    config: SharedConfig,
    capture: Option<CaptureWorker>,
}

impl Launcher {
    pub fn new(config: SharedConfig, ctx: LaunchContext) -> Self {
        Self { ctx, config, capture: None }
    }

    pub fn context(&self) -> &LaunchContext {
        &self.ctx
    }

    /// Runs `action` and reports through `on_done`.
    ///
    /// Detached programs report `Started` before this returns. Captured ones
    /// run on a worker thread that calls `on_done` when the program exits, so
    /// the caller is never blocked by a slow tool.
    pub fn run<F>(&self, action: Action, on_done: F) -> Result<LaunchHandle, LaunchError>
    where
        F: FnOnce(ActionOutcome) + Send + 'static,
    {
        let title = action.title();
        if let Action::RemoveDatabase { confirmed } = action {
            let outcome = self.remove_database(confirmed)?;
            on_done(outcome);
            return Ok(LaunchHandle::done());
        }
        let Some(spec) = action.command(&self.ctx) else {
            return Ok(LaunchHandle::done());
        };

        match spec.mode {
            LaunchMode::Detached => {
                let pid = spawn_detached(&spec)?;
                on_done(ActionOutcome::Started { title, pid });
                Ok(LaunchHandle::done())
            }
            LaunchMode::Captured => {
                // Bulk delivery reports start with the subscriber listing
                let listing = match action.report_kind() {
                    Some(kind) => Action::ListSubscribers.command(&self.ctx).map(|s| (kind, s)),
                    None => None,
                };
                let worker = thread::Builder::new().name(format!("launch-{}", title)).spawn(move || {
                    let subscribers = listing.map(|(kind, s)| (kind, run_captured(&s).map(|o| o.1).unwrap_or_else(|e| e.to_string())));
                    let outcome = match run_captured(&spec) {
                        Ok((success, output)) => ActionOutcome::Finished {
                            title,
                            success,
                            output: match subscribers {
                                Some((kind, subs)) => delivery_report(kind, &subs, &output),
                                None => output,
                            },
                        },
                        Err(e) => ActionOutcome::Failed { title, error: e.to_string() },
                    };
                    on_done(outcome);
                })?;
                Ok(LaunchHandle { worker: Some(worker) })
            }
        }
    }

    fn remove_database(&self, confirmed: bool) -> Result<ActionOutcome, LaunchError> {
        if !confirmed {
            return Err(LaunchError::NotConfirmed("removing the subscriber database"));
        }
        let path = &self.ctx.hlr_path;
        match std::fs::remove_file(path) {
            Ok(()) => tracing::info!("Launcher: removed {}", path.display()),
            // Gone already is the state we want
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => tracing::info!("Launcher: {} did not exist", path.display()),
            Err(e) => return Err(e.into()),
        }
        Ok(ActionOutcome::Finished {
            title: "Database Removed",
            success: true,
            output: "REMOVED".to_string(),
        })
    }

    /// Starts the SMS capture. Only one capture runs at a time.
    pub fn start_capture(&mut self) -> Result<(), LaunchError> {
        let cfg = self.config.config();
        let spec = capture_spec(&cfg.launcher);
        self.start_capture_with(&spec)
    }

    pub fn start_capture_with(&mut self, spec: &LaunchSpec) -> Result<(), LaunchError> {
        if let Some(worker) = self.capture.as_mut() {
            if worker.is_running() {
                return Err(LaunchError::AlreadyRunning);
            }
        }
        // Reap a previous capture that ended on its own
        if let Some(mut old) = self.capture.take() {
            old.stop()?;
        }
        let timeout = self.config.config().launcher.capture_stop_timeout;
        self.capture = Some(CaptureWorker::spawn(spec, timeout)?);
        Ok(())
    }

    pub fn capture(&self) -> Option<&CaptureWorker> {
        self.capture.as_ref()
    }

    pub fn stop_capture(&mut self) -> Result<(), LaunchError> {
        if let Some(mut worker) = self.capture.take() {
            worker.stop()?;
        }
        Ok(())
    }
}

fn command_for(spec: &LaunchSpec) -> Command {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args).stdin(Stdio::null());
    if let Some(cwd) = &spec.cwd {
        cmd.current_dir(cwd);
    }
    cmd
}

fn spawn_detached(spec: &LaunchSpec) -> Result<u32, LaunchError> {
    tracing::info!("Launcher: starting {}", spec.display());
    let mut child = command_for(spec).spawn().map_err(|source| LaunchError::Spawn {
        program: spec.program.clone(),
        source,
    })?;
    let pid = child.id();
    // Reap it when it exits so it does not linger as a zombie
    thread::Builder::new().name(format!("reap-{}", pid)).spawn(move || {
        let _ = child.wait();
    })?;
    Ok(pid)
}

/// Runs to completion; stdout followed by stderr
fn run_captured(spec: &LaunchSpec) -> Result<(bool, String), LaunchError> {
    tracing::info!("Launcher: running {}", spec.display());
    let Output { status, stdout, stderr } = command_for(spec).output().map_err(|source| LaunchError::Spawn {
        program: spec.program.clone(),
        source,
    })?;
    let mut output = String::from_utf8_lossy(&stdout).into_owned();
    output.push_str(&String::from_utf8_lossy(&stderr));
    tracing::debug!("Launcher: {} exited with {}", spec.program, status);
    Ok((status.success(), output))
}
