// src/exec/supervisor.rs

//! Per-job process supervision shared by both launch modes.

use std::future::Future;
use std::pin::Pin;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::engine::{NOT_STARTED_EXIT_CODE, RuntimeEvent};
use crate::jobs::JobName;

/// How long output readers may keep running after their process exited.
///
/// A grandchild that inherited the pipes can hold them open indefinitely;
/// past this point its output is abandoned so the exit can be reported.
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(5);

/// Handle for one running engine process.
///
/// - `cancel` asks the supervisor task to kill the process.
/// - `join` is the supervisor task; it resolves to the final exit code.
///
/// Dropping the handle without calling [`ProcessHandle::kill`] also kills the
/// process if it is still running.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: Option<u32>,
    cancel: Option<oneshot::Sender<()>>,
    join: JoinHandle<i32>,
}

impl ProcessHandle {
    /// Request a kill and return a future resolving to the reaped exit code.
    pub fn kill(mut self) -> Pin<Box<dyn Future<Output = i32> + Send + 'static>> {
        if let Some(cancel) = self.cancel.take() {
            if cancel.send(()).is_err() {
                debug!(pid = ?self.pid, "process already finished while cancelling");
            }
        }

        let join = self.join;
        Box::pin(async move {
            match join.await {
                Ok(exit_code) => exit_code,
                Err(e) => {
                    warn!(error = %e, "process supervisor task failed");
                    NOT_STARTED_EXIT_CODE
                }
            }
        })
    }
}

/// Exit code as reported to callers.
///
/// On Unix a process terminated by a signal has no exit code; it is reported
/// as `128 + signal`, the shell convention.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    NOT_STARTED_EXIT_CODE
}

/// Spawn the supervisor task for a freshly started process.
///
/// Either the process exits on its own (normal case: drain the readers, then
/// send `JobExited`), or a kill is requested (kill, reap, abandon the
/// readers, and send nothing; the coordinator reports the exit itself).
pub(crate) fn supervise(
    job: JobName,
    mut child: Child,
    readers: Vec<JoinHandle<()>>,
    runtime_tx: mpsc::UnboundedSender<RuntimeEvent>,
) -> ProcessHandle {
    let pid = child.id();
    let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

    let join = tokio::spawn(async move {
        tokio::select! {
            status_res = child.wait() => {
                let exit_code = match status_res {
                    Ok(status) => exit_code_of(status),
                    Err(e) => {
                        error!(job = %job, error = %e, "waiting for engine process failed");
                        NOT_STARTED_EXIT_CODE
                    }
                };

                // Every line must be reported before the exit.
                drain_readers(&job, readers).await;

                info!(job = %job, exit_code, "engine process exited");

                if runtime_tx
                    .send(RuntimeEvent::JobExited { job, exit_code })
                    .is_err()
                {
                    debug!("runtime gone; process exit not reported");
                }
                exit_code
            }

            cancel = &mut cancel_rx => {
                match cancel {
                    Ok(()) => info!(job = %job, "kill requested; killing engine process"),
                    Err(_) => debug!(job = %job, "process handle dropped; killing engine process"),
                }

                let exit_code = kill_and_reap(&job, &mut child).await;
                for reader in readers {
                    reader.abort();
                }
                exit_code
            }
        }
    });

    ProcessHandle {
        pid,
        cancel: Some(cancel_tx),
        join,
    }
}

async fn kill_and_reap(job: &str, child: &mut Child) -> i32 {
    if let Err(e) = child.kill().await {
        // Usually means the process exited on its own in the meantime.
        debug!(job = %job, error = %e, "kill failed");
    }

    match child.wait().await {
        Ok(status) => exit_code_of(status),
        Err(e) => {
            warn!(job = %job, error = %e, "failed to reap killed engine process");
            NOT_STARTED_EXIT_CODE
        }
    }
}

async fn drain_readers(job: &str, readers: Vec<JoinHandle<()>>) {
    for mut reader in readers {
        match timeout(OUTPUT_DRAIN_GRACE, &mut reader).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(job = %job, error = %e, "output reader task failed"),
            Err(_) => {
                warn!(
                    job = %job,
                    "output pipe still open after process exit; abandoning reader"
                );
                reader.abort();
            }
        }
    }
}
