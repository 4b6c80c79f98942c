//! Background SMS capture.
//!
//! The capture program prints one line per observed SMS. Its stdout and
//! stderr are read by one thread each and merged into a single channel, so
//! the caller sees error messages from the capture tool interleaved with the
//! captured messages.

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use calypso_config::CfgLauncher;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};

use crate::actions::{LaunchMode, LaunchSpec};
use crate::error::LaunchError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const READER_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// tshark invocation printing originator, destination and text of each SMS
pub fn capture_spec(cfg: &CfgLauncher) -> LaunchSpec {
    let mut argv = cfg.elevate.clone();
    argv.push(cfg.capture_program.clone());
    argv.extend(
        [
            "-i",
            cfg.capture_interface.as_str(),
            "-l",
            "-Y",
            "gsm_sms",
            "-T",
            "fields",
            "-e",
            "gsm_sms.tp-oa",
            "-e",
            "gsm_sms.tp-da",
            "-e",
            "gsm_sms.sms_text",
        ]
        .map(str::to_string),
    );
    let program = argv.remove(0);
    LaunchSpec::new(program, LaunchMode::Captured).args(argv)
}

pub struct CaptureWorker {
    program: String,
    child: Option<Child>,
    readers: Vec<JoinHandle<()>>,
    lines: Receiver<String>,
    stop_timeout: Duration,
    exit_status: Option<ExitStatus>,
}

impl CaptureWorker {
    pub fn start(cfg: &CfgLauncher) -> Result<Self, LaunchError> {
        Self::spawn(&capture_spec(cfg), cfg.capture_stop_timeout)
    }

    pub fn spawn(spec: &LaunchSpec, stop_timeout: Duration) -> Result<Self, LaunchError> {
        tracing::info!("CaptureWorker: starting {}", spec.display());
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }
        let mut child = cmd.spawn().map_err(|source| LaunchError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        let (tx, rx) = unbounded::<String>();
        let mut readers = Vec::with_capacity(2);
        if let Some(out) = child.stdout.take() {
            readers.push(spawn_reader("capture-stdout", out, tx.clone())?);
        }
        if let Some(err) = child.stderr.take() {
            readers.push(spawn_reader("capture-stderr", err, tx)?);
        }

        Ok(Self {
            program: spec.program.clone(),
            child: Some(child),
            readers,
            lines: rx,
            stop_timeout,
            exit_status: None,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Next line if one is already queued
    pub fn try_recv(&self) -> Option<String> {
        self.lines.try_recv().ok()
    }

    /// Waits up to `timeout` for a line. `Err(Disconnected)` once the program
    /// has exited and every line has been drained.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<String, RecvTimeoutError> {
        self.lines.recv_timeout(timeout)
    }

    pub fn lines(&self) -> &Receiver<String> {
        &self.lines
    }

    pub fn is_running(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                tracing::info!("CaptureWorker: {} exited with {}", self.program, status);
                self.exit_status = Some(status);
                false
            }
            Err(e) => {
                tracing::warn!("CaptureWorker: cannot poll {}: {}", self.program, e);
                false
            }
        }
    }

    /// Terminates the program: SIGTERM first, SIGKILL when it is still alive
    /// after the stop timeout. Reaps the process and joins the reader threads.
    /// Returns the exit status, or None when there was nothing to stop.
    pub fn stop(&mut self) -> Result<Option<ExitStatus>, LaunchError> {
        let Some(mut child) = self.child.take() else {
            return Ok(self.exit_status);
        };

        let status = match child.try_wait() {
            Ok(Some(status)) => status,
            _ => {
                terminate(&child);
                let deadline = Instant::now() + self.stop_timeout;
                loop {
                    match child.try_wait() {
                        Ok(Some(status)) => break status,
                        Ok(None) if Instant::now() < deadline => thread::sleep(POLL_INTERVAL),
                        _ => {
                            tracing::warn!("CaptureWorker: {} ignored SIGTERM, killing", self.program);
                            // Already exited between the poll and the kill is fine
                            let _ = child.kill();
                            break child.wait().map_err(|source| LaunchError::Wait {
                                program: self.program.clone(),
                                source,
                            })?;
                        }
                    }
                }
            }
        };
        tracing::info!("CaptureWorker: {} stopped ({})", self.program, status);
        self.exit_status = Some(status);
        self.join_readers();
        Ok(Some(status))
    }

    fn join_readers(&mut self) {
        let start = Instant::now();
        for handle in self.readers.drain(..) {
            while !handle.is_finished() {
                if start.elapsed() >= READER_JOIN_TIMEOUT {
                    // A grandchild may still hold the pipe open
                    tracing::warn!("CaptureWorker: reader thread did not finish in time, abandoning");
                    break;
                }
                thread::sleep(POLL_INTERVAL);
            }
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!("CaptureWorker: stop on drop failed: {}", e);
        }
    }
}

#[cfg(unix)]
fn terminate(child: &Child) {
    let Ok(pid) = libc::pid_t::try_from(child.id()) else {
        return;
    };
    // SAFETY: kill(2) has no memory effects; the pid belongs to our unreaped child
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc != 0 {
        tracing::debug!("CaptureWorker: SIGTERM to {} failed: {}", pid, std::io::Error::last_os_error());
    }
}

#[cfg(not(unix))]
fn terminate(_child: &Child) {}

fn spawn_reader<R>(name: &str, pipe: R, tx: Sender<String>) -> Result<JoinHandle<()>, LaunchError>
where
    R: Read + Send + 'static,
{
    let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim();
                    if !line.is_empty() && tx.send(line.to_string()).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!("capture reader: {}", e);
                    break;
                }
            }
        }
    })?;
    Ok(handle)
}
