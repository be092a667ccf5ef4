// src/jobs/batch.rs

//! Turning a list of input files into a batch of jobs.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::errors::{BatchError, Result};
use crate::jobs::job::Job;

/// One job per input file, all sharing the same prepared script.
///
/// Display names are derived from the input file stems, so two inputs named
/// `a.dwg` in different folders collide; run the result through
/// [`ensure_unique_names`] before submitting.
pub fn jobs_for_inputs<I, P>(inputs: I, script: &Path) -> Vec<Job>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    inputs
        .into_iter()
        .map(|input| Job::for_input(input, script))
        .collect()
}

/// Reject a batch in which two jobs share a display name.
///
/// Events are correlated back to jobs by display name alone, so duplicates
/// would make two jobs indistinguishable to the caller.
pub fn ensure_unique_names(jobs: &[Job]) -> Result<()> {
    let mut seen = HashSet::new();
    for job in jobs {
        if !seen.insert(job.name()) {
            return Err(BatchError::DuplicateJob(format!(
                "'{}' (input {})",
                job.name(),
                job.input_path.display()
            )));
        }
    }
    Ok(())
}
