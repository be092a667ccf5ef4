// src/engine/mod.rs

//! Scheduling engine for dwgbatch.
//!
//! This module ties together:
//! - the pending queue and the active process set
//! - the concurrency ceiling and admission of new jobs
//! - the coordinator loop that reacts to:
//!   - caller requests (submit, configure, stop, shutdown)
//!   - output lines read from running processes
//!   - process exits
//!
//! The synchronous state machine lives in [`core`]; the async shell that owns
//! the channels is [`runtime`], and callers talk to it through the
//! [`Scheduler`] handle in [`handle`].

use tokio::sync::oneshot;

pub use crate::jobs::{Job, JobName};

/// Exit code reported for a job that never ran (missing files, spawn failure).
pub const NOT_STARTED_EXIT_CODE: i32 = -1;

/// Lowest accepted concurrency ceiling.
pub const MIN_PARALLEL: usize = 1;

/// Highest accepted concurrency ceiling.
pub const MAX_PARALLEL: usize = 12;

/// Clamp a requested concurrency ceiling into `MIN_PARALLEL..=MAX_PARALLEL`.
pub fn clamp_max_parallel(requested: usize) -> usize {
    requested.clamp(MIN_PARALLEL, MAX_PARALLEL)
}

/// Which pipe a captured line was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Options for a scheduler instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Concurrency ceiling; clamped on use.
    pub max_parallel: usize,
    /// Relay captured output lines to the caller. Never affects
    /// `Started` / `Finished`.
    pub emit_logs: bool,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            max_parallel: 2,
            emit_logs: true,
        }
    }
}

/// Events flowing into the coordinator from callers and running processes.
#[derive(Debug)]
pub enum RuntimeEvent {
    /// Append jobs to the pending queue.
    Submit(Vec<Job>),
    /// Change the concurrency ceiling.
    Configure { max_parallel: usize },
    /// Kill everything running and drop everything pending. `done` is
    /// signalled once every killed process has been reaped.
    Stop { done: Option<oneshot::Sender<()>> },
    /// Stop, then leave the coordinator loop.
    Shutdown,
    /// A sanitized, non-empty line read from a running process.
    JobOutput {
        job: JobName,
        stream: OutputStream,
        line: String,
    },
    /// A process exited on its own.
    JobExited { job: JobName, exit_code: i32 },
}

/// Events delivered to the caller.
///
/// Per job the order is always `Started`, then any number of line events,
/// then exactly one `Finished`. Jobs that never ran skip `Started`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    Started { job: JobName },
    OutputLine { job: JobName, line: String },
    ErrorLine { job: JobName, line: String },
    Finished { job: JobName, exit_code: i32 },
    /// Pending and active both became empty.
    QueueEmpty,
}

impl SchedulerEvent {
    /// The job this event belongs to, if any.
    pub fn job(&self) -> Option<&str> {
        match self {
            SchedulerEvent::Started { job }
            | SchedulerEvent::OutputLine { job, .. }
            | SchedulerEvent::ErrorLine { job, .. }
            | SchedulerEvent::Finished { job, .. } => Some(job),
            SchedulerEvent::QueueEmpty => None,
        }
    }
}

pub mod core;
pub mod handle;
pub mod runtime;

pub use core::{CoreCommand, CoreScheduler, CoreStep};
pub use handle::{EventStream, Scheduler};
pub use runtime::Runtime;
