// src/jobs/job.rs

//! Job descriptor and lifecycle state.

use std::path::{Path, PathBuf};

/// Canonical job key type used throughout the engine.
///
/// This is the job's display name; it must be unique within a batch.
pub type JobName = String;

/// One unit of work: run `script_path` against `input_path` in the engine.
///
/// Jobs are built by the caller and never modified once submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input_path: PathBuf,
    pub script_path: PathBuf,
    pub display_name: JobName,
}

impl Job {
    pub fn new(
        input_path: impl Into<PathBuf>,
        script_path: impl Into<PathBuf>,
        display_name: impl Into<JobName>,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            script_path: script_path.into(),
            display_name: display_name.into(),
        }
    }

    /// Build a job whose display name is the input file's stem
    /// (`drawings/site-plan.dwg` -> `site-plan`).
    pub fn for_input(input_path: impl Into<PathBuf>, script_path: impl Into<PathBuf>) -> Self {
        let input_path = input_path.into();
        let display_name = display_name_for(&input_path);
        Self {
            input_path,
            script_path: script_path.into(),
            display_name,
        }
    }

    pub fn name(&self) -> &str {
        &self.display_name
    }
}

/// Derive the default display name for an input path.
///
/// Falls back to the full path text if the path has no file stem.
pub fn display_name_for(input: &Path) -> JobName {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.to_string_lossy().into_owned())
}

/// Caller-facing lifecycle of a job.
///
/// The scheduler itself moves a job `Pending -> Starting -> Running ->
/// Finished`; `Starting` only exists inside a single admission step and is
/// never observable from outside the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    /// Terminal. Carries the exit code from the `Finished` event.
    Finished(i32),
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Finished(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobState::Pending => "Pending",
            JobState::Running => "Running",
            JobState::Finished(_) => "Done",
        }
    }
}
