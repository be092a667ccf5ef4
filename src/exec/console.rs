// src/exec/console.rs

//! Visible-console launch mode: the engine gets its own terminal window and
//! its output is not captured.

use std::path::Path;

use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::info;

use crate::engine::RuntimeEvent;
use crate::exec::args::{command_line, engine_args};
use crate::exec::supervisor::{ProcessHandle, supervise};
use crate::exec::{LaunchError, LaunchSettings};
use crate::jobs::Job;

/// `CREATE_NEW_CONSOLE` from the Win32 process creation flags.
#[cfg(windows)]
const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;

/// Start the engine for `job` in a new console window.
///
/// Runs [`preflight`] first; a missing file fails the job without spawning.
/// On platforms without separate console windows the process shares this
/// terminal instead.
pub fn launch_console(
    settings: &LaunchSettings,
    job: &Job,
    runtime_tx: &mpsc::UnboundedSender<RuntimeEvent>,
) -> Result<ProcessHandle, LaunchError> {
    preflight(settings, job)?;

    let mut cmd = Command::new(&settings.executable);
    cmd.args(engine_args(settings, job)).kill_on_drop(true);

    #[cfg(windows)]
    cmd.creation_flags(CREATE_NEW_CONSOLE);

    info!(
        job = %job.name(),
        cmd = %command_line(settings, job),
        "starting engine process (own console)"
    );

    let child = cmd.spawn().map_err(|source| LaunchError::Spawn {
        executable: settings.executable.clone(),
        source,
    })?;

    Ok(supervise(
        job.display_name.clone(),
        child,
        Vec::new(),
        runtime_tx.clone(),
    ))
}

/// Check, in order, that the executable, the prepared script and the input
/// file all exist. The first missing one is reported.
pub fn preflight(settings: &LaunchSettings, job: &Job) -> Result<(), LaunchError> {
    require_file("Executable", &settings.executable)?;
    require_file("Script", &job.script_path)?;
    require_file("Input file", &job.input_path)?;
    Ok(())
}

fn require_file(what: &'static str, path: &Path) -> Result<(), LaunchError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(LaunchError::MissingFile {
            what,
            path: path.to_path_buf(),
        })
    }
}
