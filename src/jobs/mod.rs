// src/jobs/mod.rs

//! Job descriptors and batch preparation.
//!
//! - [`job`] holds the immutable [`Job`] descriptor and the per-job
//!   lifecycle states reported to callers.
//! - [`batch`] turns input files into jobs and checks that display names are
//!   unique, since the display name is the only key events carry.

pub mod batch;
pub mod job;

pub use batch::{ensure_unique_names, jobs_for_inputs};
pub use job::{Job, JobName, JobState};
