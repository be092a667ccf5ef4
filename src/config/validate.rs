// src/config/validate.rs

use tracing::warn;

use crate::config::model::{ConfigFile, EngineSection, JobEntry, RawConfigFile};
use crate::engine::clamp_max_parallel;
use crate::errors::{BatchError, Result};
use crate::jobs::{Job, ensure_unique_names};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::BatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let RawConfigFile {
            mut engine,
            mut scheduler,
            output,
            jobs,
        } = raw;

        validate_engine(&mut engine)?;

        let clamped = clamp_max_parallel(scheduler.max_parallel);
        if clamped != scheduler.max_parallel {
            warn!(
                requested = scheduler.max_parallel,
                clamped, "[scheduler].max_parallel out of range; clamping"
            );
            scheduler.max_parallel = clamped;
        }

        let jobs = jobs
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| job_from_entry(idx, entry))
            .collect::<Result<Vec<_>>>()?;
        ensure_unique_names(&jobs)?;

        Ok(ConfigFile::new_unchecked(engine, scheduler, output, jobs))
    }
}

/// Fail unless the configured executable exists on disk.
///
/// Not part of `TryFrom`, so that configs can be parsed (and dry-run) on
/// machines without the engine installed.
pub fn ensure_executable_exists(engine: &EngineSection) -> Result<()> {
    if engine.executable.is_file() {
        Ok(())
    } else {
        Err(BatchError::ConfigError(format!(
            "engine executable not found: {}",
            engine.executable.display()
        )))
    }
}

fn validate_engine(engine: &mut EngineSection) -> Result<()> {
    if engine.executable.as_os_str().is_empty() {
        return Err(BatchError::ConfigError(
            "[engine].executable must not be empty".to_string(),
        ));
    }
    engine.language = normalise_flag(engine.language.take());
    engine.product = normalise_flag(engine.product.take());
    Ok(())
}

fn normalise_flag(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn job_from_entry(idx: usize, entry: JobEntry) -> Result<Job> {
    if entry.input.as_os_str().is_empty() {
        return Err(BatchError::ConfigError(format!(
            "job #{} has an empty `input`",
            idx + 1
        )));
    }
    if entry.script.as_os_str().is_empty() {
        return Err(BatchError::ConfigError(format!(
            "job #{} ({}) has an empty `script`",
            idx + 1,
            entry.input.display()
        )));
    }

    let job = match entry.name.map(|n| n.trim().to_string()) {
        Some(name) if !name.is_empty() => Job::new(entry.input, entry.script, name),
        _ => Job::for_input(entry.input, entry.script),
    };
    Ok(job)
}
