// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::engine::SchedulerOptions;
use crate::exec::LaunchSettings;
use crate::jobs::Job;
use crate::types::{EngineKind, LaunchMode};

/// Batch description exactly as read from a TOML file.
///
/// ```toml
/// [engine]
/// executable = "C:/Program Files/Autodesk/AutoCAD 2024/accoreconsole.exe"
/// kind = "core-console"
/// language = "en-US"
///
/// [scheduler]
/// max_parallel = 4
///
/// [output]
/// log_dir = "logs"
///
/// [[job]]
/// input = "drawings/site-plan.dwg"
/// script = "out/site-plan__batch.scr"
/// ```
///
/// Only `[engine].executable` is required. Use [`ConfigFile`] (via
/// `TryFrom`) for a validated view.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    pub engine: EngineSection,

    #[serde(default)]
    pub scheduler: SchedulerSection,

    #[serde(default)]
    pub output: OutputSection,

    /// All `[[job]]` entries, in file order.
    #[serde(default, rename = "job")]
    pub jobs: Vec<JobEntry>,
}

/// `[engine]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    /// Path to the engine executable.
    pub executable: PathBuf,

    /// `"core-console"` (default) or `"desktop"`.
    #[serde(default)]
    pub kind: EngineKind,

    /// Language code passed with `/l`. Defaults to `en-US`; an empty string
    /// omits the flag.
    #[serde(default = "default_language")]
    pub language: Option<String>,

    /// Product code passed with `/product` (e.g. `"C3D"`). Empty or absent
    /// omits the flag.
    #[serde(default)]
    pub product: Option<String>,
}

fn default_language() -> Option<String> {
    Some("en-US".to_string())
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSection {
    /// Concurrency ceiling. Out-of-range values are clamped to 1..=12.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Relay captured engine output (and write per-job log files).
    #[serde(default = "default_emit_logs")]
    pub emit_logs: bool,

    /// `"captured"` (default) or `"console"`.
    #[serde(default)]
    pub mode: LaunchMode,
}

fn default_max_parallel() -> usize {
    2
}

fn default_emit_logs() -> bool {
    true
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            emit_logs: default_emit_logs(),
            mode: LaunchMode::default(),
        }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct OutputSection {
    /// Directory for per-job `<name>__accore.log` files. No files are
    /// written when absent.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

/// One `[[job]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct JobEntry {
    /// Drawing to process.
    pub input: PathBuf,

    /// Prepared script to run against it.
    pub script: PathBuf,

    /// Display name; defaults to the input's file stem.
    #[serde(default)]
    pub name: Option<String>,
}

/// Validated batch description.
///
/// Guarantees: a non-empty executable path, a clamped `max_parallel`, blank
/// language/product normalised to `None`, and jobs with unique display names.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub engine: EngineSection,
    pub scheduler: SchedulerSection,
    pub output: OutputSection,
    pub jobs: Vec<Job>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        engine: EngineSection,
        scheduler: SchedulerSection,
        output: OutputSection,
        jobs: Vec<Job>,
    ) -> Self {
        Self {
            engine,
            scheduler,
            output,
            jobs,
        }
    }

    pub fn launch_settings(&self) -> LaunchSettings {
        LaunchSettings {
            executable: self.engine.executable.clone(),
            engine: self.engine.kind,
            language: self.engine.language.clone(),
            product: self.engine.product.clone(),
            mode: self.scheduler.mode,
            emit_logs: self.scheduler.emit_logs,
        }
    }

    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            max_parallel: self.scheduler.max_parallel,
            emit_logs: self.scheduler.emit_logs,
        }
    }

    /// Where per-job logs go, if logging is enabled and a directory is set.
    pub fn log_dir(&self) -> Option<&std::path::Path> {
        if self.scheduler.emit_logs {
            self.output.log_dir.as_deref()
        } else {
            None
        }
    }
}
