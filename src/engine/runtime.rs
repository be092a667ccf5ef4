// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::{CoreCommand, CoreScheduler, CoreStep, RuntimeEvent, SchedulerEvent};
use crate::errors::Result;
use crate::exec::Launcher;

/// Coordinator loop: the single owner of the scheduler state.
///
/// Every `RuntimeEvent` (caller requests and process reports alike) arrives
/// on one channel and is applied to the [`CoreScheduler`] one at a time, so
/// admission never races with itself. The commands the core returns are
/// executed here: events are forwarded to the caller, killed processes are
/// reaped.
pub struct Runtime<L: Launcher> {
    core: CoreScheduler<L::Handle>,
    launcher: L,
    event_rx: mpsc::UnboundedReceiver<RuntimeEvent>,
    events_tx: mpsc::UnboundedSender<SchedulerEvent>,
}

impl<L: Launcher> fmt::Debug for Runtime<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<L: Launcher> Runtime<L> {
    pub fn new(
        core: CoreScheduler<L::Handle>,
        launcher: L,
        event_rx: mpsc::UnboundedReceiver<RuntimeEvent>,
        events_tx: mpsc::UnboundedSender<SchedulerEvent>,
    ) -> Self {
        Self {
            core,
            launcher,
            event_rx,
            events_tx,
        }
    }

    /// Main event loop.
    ///
    /// Runs until a `Shutdown` request arrives (sent explicitly or by dropping
    /// the last [`Scheduler`](crate::engine::Scheduler) handle) or every
    /// sender is gone.
    pub async fn run(mut self) -> Result<()> {
        info!(
            max_parallel = self.core.max_parallel(),
            "scheduler runtime started"
        );

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            match event {
                RuntimeEvent::Submit(jobs) => {
                    let step = self.core.submit(jobs, &mut self.launcher);
                    self.execute(step).await;
                }
                RuntimeEvent::Configure { max_parallel } => {
                    let step = self.core.configure(max_parallel, &mut self.launcher);
                    self.execute(step).await;
                }
                RuntimeEvent::JobOutput { job, stream, line } => {
                    let step = self.core.handle_output(&job, stream, line);
                    self.execute(step).await;
                }
                RuntimeEvent::JobExited { job, exit_code } => {
                    let step = self.core.handle_exit(&job, exit_code, &mut self.launcher);
                    self.execute(step).await;
                }
                RuntimeEvent::Stop { done } => {
                    let step = self.core.stop();
                    self.execute(step).await;
                    if let Some(done) = done {
                        let _ = done.send(());
                    }
                }
                RuntimeEvent::Shutdown => {
                    let step = self.core.stop();
                    self.execute(step).await;
                    info!("shutdown requested; stopping runtime");
                    break;
                }
            }
        }

        info!("runtime exiting");
        Ok(())
    }

    /// Execute the commands from one core step.
    ///
    /// All kills are issued before any of them is awaited, so a stop with
    /// several running jobs doesn't wait for them one by one.
    async fn execute(&mut self, step: CoreStep<L::Handle>) {
        let mut reaping = Vec::new();

        for command in step.commands {
            match command {
                CoreCommand::Emit(event) => self.emit(event),
                CoreCommand::Reap { job, handle } => {
                    let exit = self.launcher.kill(handle);
                    reaping.push((job, exit));
                }
            }
        }

        for (job, exit) in reaping {
            let exit_code = exit.await;
            info!(job = %job, exit_code, "killed job reaped");
            self.emit(SchedulerEvent::Finished { job, exit_code });
        }
    }

    fn emit(&self, event: SchedulerEvent) {
        if self.events_tx.send(event).is_err() {
            debug!("scheduler event receiver dropped; discarding event");
        }
    }
}
