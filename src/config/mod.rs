// src/config/mod.rs

//! Batch file loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a batch file from disk (`loader.rs`).
//! - Validate it into jobs and launch settings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{
    ConfigFile, EngineSection, JobEntry, OutputSection, RawConfigFile, SchedulerSection,
};
pub use validate::ensure_executable_exists;
