use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use dwgbatch::engine::{OutputStream, RuntimeEvent};
use dwgbatch::exec::{LaunchError, Launcher};
use dwgbatch::jobs::Job;
use tokio::sync::mpsc;

/// How a fake launch should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeFailure {
    /// Behave like a console-mode pre-flight failure on the script.
    MissingScript,
    /// Behave like the OS refusing to spawn the process.
    Spawn,
}

/// Handle returned by [`FakeLauncher`]; just remembers which job it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeHandle {
    pub job: String,
}

/// A fake launcher that:
/// - records which jobs were launched and which were killed
/// - starts nothing; jobs stay "running" until the test reports their exit
///   through a [`FakeController`] (or the core directly)
/// - can be told to fail specific jobs
pub struct FakeLauncher {
    launched: Arc<Mutex<Vec<String>>>,
    killed: Arc<Mutex<Vec<String>>>,
    failures: HashMap<String, FakeFailure>,
    kill_exit_code: i32,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self {
            launched: Arc::new(Mutex::new(Vec::new())),
            killed: Arc::new(Mutex::new(Vec::new())),
            failures: HashMap::new(),
            kill_exit_code: 137,
        }
    }

    /// Make launching `job` fail.
    pub fn failing(mut self, job: &str, failure: FakeFailure) -> Self {
        self.failures.insert(job.to_string(), failure);
        self
    }

    /// Exit code reported for killed jobs (default 137).
    pub fn with_kill_exit_code(mut self, code: i32) -> Self {
        self.kill_exit_code = code;
        self
    }

    /// Jobs launched so far, in launch order.
    pub fn launched(&self) -> Vec<String> {
        self.launched.lock().unwrap().clone()
    }

    /// Jobs killed so far, in kill order.
    pub fn killed(&self) -> Vec<String> {
        self.killed.lock().unwrap().clone()
    }

    /// Shared view of the launch log, usable after the launcher has been
    /// moved into a runtime.
    pub fn launched_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.launched)
    }

    pub fn killed_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.killed)
    }
}

impl Default for FakeLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl Launcher for FakeLauncher {
    type Handle = FakeHandle;

    fn launch(&mut self, job: &Job) -> Result<FakeHandle, LaunchError> {
        match self.failures.get(job.name()) {
            Some(FakeFailure::MissingScript) => Err(LaunchError::MissingFile {
                what: "Script",
                path: job.script_path.clone(),
            }),
            Some(FakeFailure::Spawn) => Err(LaunchError::Spawn {
                executable: PathBuf::from("fake-engine"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "fake spawn failure"),
            }),
            None => {
                self.launched.lock().unwrap().push(job.name().to_string());
                Ok(FakeHandle {
                    job: job.name().to_string(),
                })
            }
        }
    }

    fn kill(&mut self, handle: FakeHandle) -> Pin<Box<dyn Future<Output = i32> + Send + 'static>> {
        self.killed.lock().unwrap().push(handle.job);
        let code = self.kill_exit_code;
        Box::pin(async move { code })
    }
}

/// Plays the part of running processes: reports output and exits for fake
/// jobs back to a scheduler runtime.
#[derive(Debug, Clone)]
pub struct FakeController {
    runtime_tx: mpsc::UnboundedSender<RuntimeEvent>,
}

impl FakeController {
    pub fn new(runtime_tx: mpsc::UnboundedSender<RuntimeEvent>) -> Self {
        Self { runtime_tx }
    }

    pub fn finish(&self, job: &str, exit_code: i32) -> anyhow::Result<()> {
        self.send(RuntimeEvent::JobExited {
            job: job.to_string(),
            exit_code,
        })
    }

    pub fn stdout(&self, job: &str, line: &str) -> anyhow::Result<()> {
        self.output(job, OutputStream::Stdout, line)
    }

    pub fn stderr(&self, job: &str, line: &str) -> anyhow::Result<()> {
        self.output(job, OutputStream::Stderr, line)
    }

    fn output(&self, job: &str, stream: OutputStream, line: &str) -> anyhow::Result<()> {
        self.send(RuntimeEvent::JobOutput {
            job: job.to_string(),
            stream,
            line: line.to_string(),
        })
    }

    fn send(&self, event: RuntimeEvent) -> anyhow::Result<()> {
        self.runtime_tx
            .send(event)
            .map_err(|_| anyhow::anyhow!("scheduler runtime is gone"))
    }
}
