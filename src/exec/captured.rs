// src/exec/captured.rs

//! Captured-output launch mode: stdout/stderr are piped, sanitized and
//! relayed to the coordinator line by line.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::engine::{OutputStream, RuntimeEvent};
use crate::exec::args::{command_line, engine_args};
use crate::exec::supervisor::{ProcessHandle, supervise};
use crate::exec::{LaunchError, LaunchSettings};
use crate::jobs::{Job, JobName};
use crate::sanitize::sanitize_line;

/// Start the engine for `job` with its output captured.
///
/// The process inherits this process's environment (the engine relies on
/// `PATH` to find its own libraries). Input files are not checked here; the
/// caller guarantees they exist.
pub fn launch_captured(
    settings: &LaunchSettings,
    job: &Job,
    runtime_tx: &mpsc::UnboundedSender<RuntimeEvent>,
) -> Result<ProcessHandle, LaunchError> {
    let mut cmd = Command::new(&settings.executable);
    cmd.args(engine_args(settings, job))
        .stdin(Stdio::null())
        .kill_on_drop(true);

    if settings.emit_logs {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    } else {
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
    }

    info!(
        job = %job.name(),
        cmd = %command_line(settings, job),
        "starting engine process (captured output)"
    );

    let mut child = cmd.spawn().map_err(|source| LaunchError::Spawn {
        executable: settings.executable.clone(),
        source,
    })?;

    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_line_reader(
            job.display_name.clone(),
            OutputStream::Stdout,
            stdout,
            runtime_tx.clone(),
        ));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_line_reader(
            job.display_name.clone(),
            OutputStream::Stderr,
            stderr,
            runtime_tx.clone(),
        ));
    }

    Ok(supervise(
        job.display_name.clone(),
        child,
        readers,
        runtime_tx.clone(),
    ))
}

/// Read `source` line by line until EOF, forwarding every non-empty
/// sanitized line as a `JobOutput` event.
///
/// Bytes are decoded as lossy UTF-8, so invalid sequences become U+FFFD
/// instead of ending the reader. Engines that write UTF-16LE come through as
/// text interleaved with NULs, which the sanitizer strips. A final line
/// without a trailing newline is forwarded as well.
fn spawn_line_reader<R>(
    job: JobName,
    stream: OutputStream,
    source: R,
    runtime_tx: mpsc::UnboundedSender<RuntimeEvent>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(source);
        let mut buf = Vec::with_capacity(256);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = sanitize_line(&String::from_utf8_lossy(&buf));
                    if line.is_empty() {
                        continue;
                    }
                    let event = RuntimeEvent::JobOutput {
                        job: job.clone(),
                        stream,
                        line,
                    };
                    if runtime_tx.send(event).is_err() {
                        debug!(job = %job, "runtime gone; stopping output reader");
                        break;
                    }
                }
                Err(e) => {
                    debug!(job = %job, ?stream, error = %e, "output stream read failed");
                    break;
                }
            }
        }
    })
}
