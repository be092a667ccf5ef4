// src/exec/mod.rs

//! Process launching layer.
//!
//! This module is responsible for actually running the engine for a job,
//! using `tokio::process::Command`, and reporting back to the coordinator via
//! `RuntimeEvent`s.
//!
//! - [`backend`] provides the `Launcher` trait and the production
//!   `ProcessLauncher`, which tests can replace with a fake.
//! - [`args`] builds the engine command line.
//! - [`captured`] runs a job with piped, sanitized output.
//! - [`console`] runs a job in its own console window after pre-flight checks.
//! - [`supervisor`] waits for exit or kill and owns the per-job handle.

pub mod args;
pub mod backend;
pub mod captured;
pub mod console;
pub mod supervisor;

pub use args::{command_line, engine_args};
pub use backend::{LaunchError, LaunchSettings, Launcher, ProcessLauncher};
pub use supervisor::{ProcessHandle, exit_code_of};
