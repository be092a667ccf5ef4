// src/engine/handle.rs

//! Caller-side handle to a running scheduler.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::engine::{CoreScheduler, Runtime, RuntimeEvent, SchedulerEvent, SchedulerOptions};
use crate::errors::{BatchError, Result};
use crate::exec::{LaunchSettings, Launcher, ProcessLauncher};
use crate::jobs::Job;

/// Stream of events from a scheduler. Ends once the runtime has exited.
pub type EventStream = mpsc::UnboundedReceiver<SchedulerEvent>;

/// Cheap, cloneable handle for submitting work to a scheduler runtime.
///
/// All requests are queued on the runtime's event channel and applied in the
/// order they were sent.
///
/// Dropping the last clone shuts the runtime down as if [`Scheduler::shutdown`]
/// had been called: running jobs are killed and the event stream ends.
#[derive(Debug, Clone)]
pub struct Scheduler {
    tx: mpsc::UnboundedSender<RuntimeEvent>,
    _guard: Arc<ShutdownOnDrop>,
}

/// Sends `Shutdown` when the last `Scheduler` clone goes away.
///
/// The launcher owned by the runtime holds its own sender, so the runtime's
/// channel never closes by itself.
#[derive(Debug)]
struct ShutdownOnDrop {
    tx: mpsc::UnboundedSender<RuntimeEvent>,
}

impl Drop for ShutdownOnDrop {
    fn drop(&mut self) {
        if self.tx.send(RuntimeEvent::Shutdown).is_ok() {
            debug!("last scheduler handle dropped; shutting runtime down");
        }
    }
}

impl Scheduler {
    /// Spawn a scheduler that runs real engine processes.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        options: SchedulerOptions,
        settings: LaunchSettings,
    ) -> (Self, EventStream, JoinHandle<Result<()>>) {
        Self::spawn_with(options, |runtime_tx| {
            ProcessLauncher::new(settings, runtime_tx)
        })
    }

    /// Spawn a scheduler around a custom launcher.
    ///
    /// `make_launcher` receives the runtime's event sender so that the
    /// launcher can report output lines and exits back to the coordinator.
    pub fn spawn_with<L, F>(
        options: SchedulerOptions,
        make_launcher: F,
    ) -> (Self, EventStream, JoinHandle<Result<()>>)
    where
        L: Launcher + 'static,
        F: FnOnce(mpsc::UnboundedSender<RuntimeEvent>) -> L,
    {
        let (rt_tx, rt_rx) = mpsc::unbounded_channel::<RuntimeEvent>();
        let (events_tx, events_rx) = mpsc::unbounded_channel::<SchedulerEvent>();

        let launcher = make_launcher(rt_tx.clone());
        let runtime = Runtime::new(CoreScheduler::new(options), launcher, rt_rx, events_tx);
        let join = tokio::spawn(runtime.run());

        let guard = Arc::new(ShutdownOnDrop { tx: rt_tx.clone() });
        (
            Self {
                tx: rt_tx,
                _guard: guard,
            },
            events_rx,
            join,
        )
    }

    /// Queue jobs behind anything already pending.
    pub fn submit(&self, jobs: Vec<Job>) -> Result<()> {
        self.send(RuntimeEvent::Submit(jobs))
    }

    /// Change the concurrency ceiling (clamped to 1..=12).
    pub fn configure(&self, max_parallel: usize) -> Result<()> {
        self.send(RuntimeEvent::Configure { max_parallel })
    }

    /// Kill all running jobs and discard pending ones.
    ///
    /// Resolves once every killed process has been reaped and its `Finished`
    /// event has been queued on the event stream.
    pub async fn stop(&self) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.send(RuntimeEvent::Stop {
            done: Some(done_tx),
        })?;
        done_rx.await.map_err(|_| BatchError::SchedulerClosed)
    }

    /// Ask the runtime to stop (killing anything still running) and exit.
    pub fn shutdown(&self) -> Result<()> {
        self.send(RuntimeEvent::Shutdown)
    }

    fn send(&self, event: RuntimeEvent) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|_| BatchError::SchedulerClosed)
    }
}
