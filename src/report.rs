// src/report.rs

//! Batch progress tracking and per-job log files.
//!
//! [`BatchReport`] consumes the scheduler's event stream and keeps one row
//! per job (state, exit code, log file). When a log directory is configured,
//! every relayed line is appended to `<log_dir>/<name>__accore.log`. Failing
//! to write a log file is reported and otherwise ignored; it never affects
//! the batch.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::engine::SchedulerEvent;
use crate::jobs::{Job, JobName, JobState};

/// Suffix of per-job log files.
pub const LOG_FILE_SUFFIX: &str = "__accore.log";

/// Log file path for a job.
pub fn log_path_for(log_dir: &Path, job: &str) -> PathBuf {
    log_dir.join(format!("{job}{LOG_FILE_SUFFIX}"))
}

/// One job's row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRow {
    pub name: JobName,
    pub input: PathBuf,
    pub state: JobState,
    pub log_path: Option<PathBuf>,
}

impl JobRow {
    pub fn exit_code(&self) -> Option<i32> {
        match self.state {
            JobState::Finished(code) => Some(code),
            _ => None,
        }
    }

    pub fn failed(&self) -> bool {
        matches!(self.exit_code(), Some(code) if code != 0)
    }
}

#[derive(Debug)]
pub struct BatchReport {
    rows: Vec<JobRow>,
    index: HashMap<JobName, usize>,
    completed: usize,
    drained: bool,
}

impl BatchReport {
    /// Start tracking `jobs`, all `Pending`. Rows keep submission order.
    pub fn new(jobs: &[Job], log_dir: Option<&Path>) -> Self {
        let rows: Vec<JobRow> = jobs
            .iter()
            .map(|job| JobRow {
                name: job.display_name.clone(),
                input: job.input_path.clone(),
                state: JobState::Pending,
                log_path: log_dir.map(|dir| log_path_for(dir, job.name())),
            })
            .collect();
        let index = rows
            .iter()
            .enumerate()
            .map(|(i, row)| (row.name.clone(), i))
            .collect();

        Self {
            rows,
            index,
            completed: 0,
            drained: false,
        }
    }

    pub fn rows(&self) -> &[JobRow] {
        &self.rows
    }

    pub fn row(&self, job: &str) -> Option<&JobRow> {
        self.index.get(job).map(|&i| &self.rows[i])
    }

    pub fn total(&self) -> usize {
        self.rows.len()
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Finished rows with a non-zero exit code (including never-ran jobs).
    pub fn failed(&self) -> Vec<&JobRow> {
        self.rows.iter().filter(|r| r.failed()).collect()
    }

    /// `true` once `QueueEmpty` was seen: every job ran to completion.
    pub fn is_drained(&self) -> bool {
        self.drained
    }

    /// Apply one scheduler event.
    pub fn record(&mut self, event: &SchedulerEvent) {
        match event {
            SchedulerEvent::QueueEmpty => self.drained = true,
            SchedulerEvent::Started { job } => {
                if let Some(row) = self.row_mut(job) {
                    row.state = JobState::Running;
                }
            }
            SchedulerEvent::OutputLine { job, line } | SchedulerEvent::ErrorLine { job, line } => {
                if let Some(path) = self.row_mut(job).and_then(|r| r.log_path.clone()) {
                    append_line(&path, line);
                }
            }
            SchedulerEvent::Finished { job, exit_code } => {
                let Some(row) = self.row_mut(job) else {
                    return;
                };
                if row.state.is_terminal() {
                    warn!(job = %job, "second Finished event for job; ignoring");
                    return;
                }
                row.state = JobState::Finished(*exit_code);
                self.completed += 1;
            }
        }
    }

    /// `Completed n/m.`
    pub fn progress_line(&self) -> String {
        format!("Completed {}/{}.", self.completed, self.total())
    }

    /// Multi-line table of every job with its state and exit code.
    pub fn summary(&self) -> String {
        let width = self
            .rows
            .iter()
            .map(|r| r.name.len())
            .max()
            .unwrap_or(0)
            .max("JOB".len());

        let mut out = String::new();
        let _ = writeln!(out, "{:<width$}  {:<7}  EXIT", "JOB", "STATUS");
        for row in &self.rows {
            let exit = row
                .exit_code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(out, "{:<width$}  {:<7}  {}", row.name, row.state.label(), exit);
        }

        let failed = self.failed().len();
        if self.drained {
            let _ = write!(
                out,
                "All jobs finished. ({}/{}, {} failed)",
                self.completed,
                self.total(),
                failed
            );
        } else {
            let _ = write!(
                out,
                "Aborted. ({}/{} finished, {} failed)",
                self.completed,
                self.total(),
                failed
            );
        }
        out
    }

    fn row_mut(&mut self, job: &str) -> Option<&mut JobRow> {
        match self.index.get(job) {
            Some(&i) => Some(&mut self.rows[i]),
            None => {
                warn!(job = %job, "event for a job that is not part of this batch");
                None
            }
        }
    }
}

fn append_line(path: &Path, line: &str) {
    let result = (|| -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{line}")
    })();

    if let Err(e) = result {
        warn!(path = %path.display(), error = %e, "failed to write job log");
    }
}
