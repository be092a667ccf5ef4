// src/engine/core.rs

//! Synchronous scheduler state machine.
//!
//! [`CoreScheduler`] owns the pending queue and the active set and decides
//! which job starts next. Every mutation goes through `&mut self`, so the
//! single coordinator that owns it is the only writer.
//!
//! The core does no async IO. Starting a process is delegated to a
//! [`Launcher`]; anything the outer shell has to do afterwards (emit an event,
//! kill and reap a process) comes back as a [`CoreCommand`]. With a fake
//! launcher the whole admission logic runs in plain unit tests, no Tokio
//! required.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, info, warn};

use crate::engine::{
    NOT_STARTED_EXIT_CODE, OutputStream, SchedulerEvent, SchedulerOptions, clamp_max_parallel,
};
use crate::exec::Launcher;
use crate::jobs::{Job, JobName, JobState};

/// Command produced by the core, to be executed by the outer shell.
#[derive(Debug)]
pub enum CoreCommand<H> {
    /// Deliver this event to the caller.
    Emit(SchedulerEvent),
    /// Kill this process, wait for it, then report `Finished` for `job`.
    ///
    /// The handle has already left the active set.
    Reap { job: JobName, handle: H },
}

/// Result of one core operation.
#[derive(Debug)]
pub struct CoreStep<H> {
    pub commands: Vec<CoreCommand<H>>,
}

impl<H> CoreStep<H> {
    fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    fn emit(&mut self, event: SchedulerEvent) {
        self.commands.push(CoreCommand::Emit(event));
    }

    /// Events in emission order, skipping reap commands.
    pub fn events(&self) -> impl Iterator<Item = &SchedulerEvent> {
        self.commands.iter().filter_map(|c| match c {
            CoreCommand::Emit(event) => Some(event),
            CoreCommand::Reap { .. } => None,
        })
    }

    /// Jobs whose processes must be reaped, in command order.
    pub fn reaped_jobs(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            CoreCommand::Reap { job, .. } => Some(job.as_str()),
            CoreCommand::Emit(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Scheduler state: pending FIFO, active handles keyed by display name,
/// concurrency ceiling.
///
/// Invariants after every public call:
/// - no job name is both pending and active
/// - `active.len() <= max_parallel`, unless the ceiling was just lowered;
///   the overflow then drains through normal exits
/// - `QueueEmpty` is emitted at most once per transition into the idle state
pub struct CoreScheduler<H> {
    pending: VecDeque<Job>,
    active: HashMap<JobName, H>,
    max_parallel: usize,
    emit_logs: bool,
    /// Set once `QueueEmpty` has been emitted for the current idle period;
    /// cleared as soon as new work is queued.
    idle_reported: bool,
}

impl<H> std::fmt::Debug for CoreScheduler<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreScheduler")
            .field("pending", &self.pending_jobs())
            .field("active", &self.active_jobs())
            .field("max_parallel", &self.max_parallel)
            .field("emit_logs", &self.emit_logs)
            .field("idle_reported", &self.idle_reported)
            .finish()
    }
}

impl<H> CoreScheduler<H> {
    pub fn new(options: SchedulerOptions) -> Self {
        Self {
            pending: VecDeque::new(),
            active: HashMap::new(),
            max_parallel: clamp_max_parallel(options.max_parallel),
            emit_logs: options.emit_logs,
            idle_reported: false,
        }
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Returns `true` if nothing is pending and nothing is running.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.active.is_empty()
    }

    /// Names of pending jobs, in queue order.
    pub fn pending_jobs(&self) -> Vec<JobName> {
        self.pending.iter().map(|j| j.display_name.clone()).collect()
    }

    /// Names of running jobs, sorted.
    pub fn active_jobs(&self) -> Vec<JobName> {
        let mut names: Vec<_> = self.active.keys().cloned().collect();
        names.sort();
        names
    }

    /// Where `job` currently is. Finished jobs are forgotten, so this returns
    /// `None` for them as well as for unknown names.
    pub fn state_of(&self, job: &str) -> Option<JobState> {
        if self.active.contains_key(job) {
            Some(JobState::Running)
        } else if self.pending.iter().any(|j| j.display_name == job) {
            Some(JobState::Pending)
        } else {
            None
        }
    }

    /// Change the concurrency ceiling, then admit as far as the new ceiling
    /// allows. Lowering the ceiling never kills running jobs.
    pub fn configure<L>(&mut self, max_parallel: usize, launcher: &mut L) -> CoreStep<H>
    where
        L: Launcher<Handle = H>,
    {
        let clamped = clamp_max_parallel(max_parallel);
        if clamped != max_parallel {
            warn!(
                requested = max_parallel,
                clamped, "max_parallel out of range; clamping"
            );
        }
        if clamped < self.active.len() {
            info!(
                max_parallel = clamped,
                active = self.active.len(),
                "ceiling lowered below running jobs; letting them drain"
            );
        }
        self.max_parallel = clamped;
        self.admit(launcher)
    }

    /// Append jobs to the tail of the pending queue, then admit.
    ///
    /// A job whose display name is already pending or running is rejected
    /// with an `ErrorLine` and a sentinel `Finished`; it is never queued.
    pub fn submit<L>(&mut self, jobs: Vec<Job>, launcher: &mut L) -> CoreStep<H>
    where
        L: Launcher<Handle = H>,
    {
        let mut step = CoreStep::new();
        let mut queued = 0usize;

        for job in jobs {
            if self.state_of(&job.display_name).is_some() {
                warn!(
                    job = %job.display_name,
                    "job with the same name is already queued or running; rejecting"
                );
                step.emit(SchedulerEvent::ErrorLine {
                    job: job.display_name.clone(),
                    line: format!(
                        "ERROR: duplicate job name '{}'; job not queued",
                        job.display_name
                    ),
                });
                step.emit(SchedulerEvent::Finished {
                    job: job.display_name,
                    exit_code: NOT_STARTED_EXIT_CODE,
                });
                continue;
            }
            self.pending.push_back(job);
            queued += 1;
        }

        if queued > 0 {
            self.idle_reported = false;
        }
        debug!(queued, pending = self.pending.len(), "jobs submitted");

        step.commands.extend(self.admit(launcher).commands);
        step
    }

    /// Move jobs from pending to active until the ceiling is reached, then
    /// report `QueueEmpty` if this left the scheduler idle for the first time.
    ///
    /// Calling this again without any state change in between emits nothing.
    pub fn admit<L>(&mut self, launcher: &mut L) -> CoreStep<H>
    where
        L: Launcher<Handle = H>,
    {
        let mut step = CoreStep::new();

        while self.active.len() < self.max_parallel {
            let Some(job) = self.pending.pop_front() else {
                break;
            };
            // Starting: popped, not yet recorded as active.
            let name = job.display_name.clone();

            match launcher.launch(&job) {
                Ok(handle) => {
                    debug!(job = %name, active = self.active.len() + 1, "job started");
                    self.active.insert(name.clone(), handle);
                    step.emit(SchedulerEvent::Started { job: name });
                }
                Err(err) => {
                    warn!(job = %name, error = %err, "job could not be started");
                    if let Some(line) = err.diagnostic() {
                        step.emit(SchedulerEvent::ErrorLine {
                            job: name.clone(),
                            line,
                        });
                    }
                    step.emit(SchedulerEvent::Finished {
                        job: name,
                        exit_code: NOT_STARTED_EXIT_CODE,
                    });
                }
            }
        }

        if self.is_idle() && !self.idle_reported {
            info!("all jobs finished; queue empty");
            self.idle_reported = true;
            step.emit(SchedulerEvent::QueueEmpty);
        }

        step
    }

    /// Relay a captured line, if logging is enabled and the job is running.
    ///
    /// Lines from jobs that are no longer active (e.g. read after `stop`)
    /// are dropped.
    pub fn handle_output(&self, job: &str, stream: OutputStream, line: String) -> CoreStep<H> {
        let mut step = CoreStep::new();

        if !self.emit_logs {
            return step;
        }
        if !self.active.contains_key(job) {
            debug!(job = %job, "output from a job that is not active; dropping");
            return step;
        }

        let job = job.to_string();
        step.emit(match stream {
            OutputStream::Stdout => SchedulerEvent::OutputLine { job, line },
            OutputStream::Stderr => SchedulerEvent::ErrorLine { job, line },
        });
        step
    }

    /// A running process exited: retire its handle, report `Finished` and
    /// refill the active set.
    ///
    /// Exits for jobs that are not active (already reaped by `stop`) are
    /// ignored, which keeps `Finished` exactly-once.
    pub fn handle_exit<L>(&mut self, job: &str, exit_code: i32, launcher: &mut L) -> CoreStep<H>
    where
        L: Launcher<Handle = H>,
    {
        let Some(handle) = self.active.remove(job) else {
            debug!(job = %job, exit_code, "exit from a job that is not active; ignoring");
            return CoreStep::new();
        };

        let mut step = CoreStep::new();
        step.emit(SchedulerEvent::Finished {
            job: job.to_string(),
            exit_code,
        });
        drop(handle);

        step.commands.extend(self.admit(launcher).commands);
        step
    }

    /// Drop every pending job and hand back every active process for killing.
    ///
    /// On return both collections are empty. No `QueueEmpty` is emitted for
    /// this idle state; stopping is not draining.
    pub fn stop(&mut self) -> CoreStep<H> {
        let discarded = self.pending.len();
        self.pending.clear();
        self.idle_reported = true;

        let mut reaped: Vec<(JobName, H)> = self.active.drain().collect();
        reaped.sort_by(|a, b| a.0.cmp(&b.0));

        info!(
            discarded,
            killing = reaped.len(),
            "stop requested; discarding pending jobs and killing active ones"
        );

        CoreStep {
            commands: reaped
                .into_iter()
                .map(|(job, handle)| CoreCommand::Reap { job, handle })
                .collect(),
        }
    }
}
