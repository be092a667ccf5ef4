// src/exec/backend.rs

//! Pluggable launcher abstraction.
//!
//! The scheduler core talks to a `Launcher` instead of spawning processes
//! itself. Production code uses [`ProcessLauncher`]; tests can provide a
//! launcher that records which jobs were started and never touches the OS.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::engine::RuntimeEvent;
use crate::exec::supervisor::ProcessHandle;
use crate::exec::{captured, console};
use crate::jobs::Job;
use crate::types::{EngineKind, LaunchMode};

/// Why a job could not be started. The job never ran in either case.
#[derive(Error, Debug)]
pub enum LaunchError {
    /// Pre-flight check failed (console mode).
    #[error("{what} not found: {}", .path.display())]
    MissingFile { what: &'static str, path: PathBuf },

    /// The OS refused to start the process.
    #[error("failed to spawn {}: {source}", .executable.display())]
    Spawn {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LaunchError {
    /// Line to relay to the caller as an `ErrorLine` before the sentinel
    /// `Finished`, if this kind of failure has one.
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            LaunchError::MissingFile { .. } => Some(format!("ERROR: {self}")),
            LaunchError::Spawn { .. } => None,
        }
    }
}

/// Trait abstracting how a job's process is started and stopped.
///
/// `launch` is called from inside the coordinator and must not block: it
/// starts the work and returns a handle. Output lines and the eventual exit
/// are reported asynchronously as [`RuntimeEvent`]s.
pub trait Launcher: Send {
    /// Owned per active job; dropped when the job leaves the active set.
    type Handle: Send + 'static;

    fn launch(&mut self, job: &Job) -> Result<Self::Handle, LaunchError>;

    /// Kill a running job's process and resolve to its exit code once it
    /// has been reaped. The kill is requested immediately, before the
    /// returned future is polled.
    fn kill(&mut self, handle: Self::Handle) -> Pin<Box<dyn Future<Output = i32> + Send + 'static>>;
}

/// How to invoke the engine. Fixed for the lifetime of a scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSettings {
    pub executable: PathBuf,
    pub engine: EngineKind,
    /// Passed as `/l <language>` when set.
    pub language: Option<String>,
    /// Passed as `/product <product>` when set.
    pub product: Option<String>,
    pub mode: LaunchMode,
    /// Pipe stdout/stderr in captured mode. When off, the process output is
    /// discarded at the OS level.
    pub emit_logs: bool,
}

impl LaunchSettings {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            engine: EngineKind::default(),
            language: None,
            product: None,
            mode: LaunchMode::default(),
            emit_logs: true,
        }
    }
}

/// Real launcher used in production: one OS process per job.
#[derive(Debug)]
pub struct ProcessLauncher {
    settings: LaunchSettings,
    runtime_tx: mpsc::UnboundedSender<RuntimeEvent>,
}

impl ProcessLauncher {
    /// Create a launcher that reports back on `runtime_tx`.
    pub fn new(settings: LaunchSettings, runtime_tx: mpsc::UnboundedSender<RuntimeEvent>) -> Self {
        Self {
            settings,
            runtime_tx,
        }
    }
}

impl Launcher for ProcessLauncher {
    type Handle = ProcessHandle;

    fn launch(&mut self, job: &Job) -> Result<ProcessHandle, LaunchError> {
        match self.settings.mode {
            LaunchMode::Captured => captured::launch_captured(&self.settings, job, &self.runtime_tx),
            LaunchMode::Console => console::launch_console(&self.settings, job, &self.runtime_tx),
        }
    }

    fn kill(&mut self, handle: ProcessHandle) -> Pin<Box<dyn Future<Output = i32> + Send + 'static>> {
        handle.kill()
    }
}
