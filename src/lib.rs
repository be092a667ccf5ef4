// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod jobs;
pub mod logging;
pub mod report;
pub mod sanitize;
pub mod types;

use std::path::PathBuf;

use anyhow::{Result, bail};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, ensure_executable_exists, load_and_validate};
use crate::engine::{NOT_STARTED_EXIT_CODE, Scheduler, SchedulerEvent, clamp_max_parallel};
use crate::errors::BatchError;
use crate::exec::command_line;
use crate::jobs::{Job, ensure_unique_names, jobs_for_inputs};
use crate::report::BatchReport;
use crate::types::LaunchMode;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - batch file loading and CLI overrides
/// - job collection
/// - scheduler + process launcher
/// - progress reporting and per-job logs
/// - Ctrl-C handling
///
/// Fails if any job exited non-zero, never ran, or the batch was interrupted.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let mut cfg = load_and_validate(&config_path)?;
    apply_cli_overrides(&mut cfg, &args);
    let jobs = collect_jobs(&cfg, &args)?;

    if args.dry_run {
        print_dry_run(&cfg, &jobs);
        return Ok(());
    }

    ensure_executable_exists(&cfg.engine)?;

    let report = run_batch(&cfg, jobs).await?;
    println!("{}", report.summary());

    if !report.is_drained() {
        bail!("batch interrupted before all jobs finished");
    }
    let failed = report.failed().len();
    if failed > 0 {
        bail!("{failed} of {} job(s) failed", report.total());
    }
    Ok(())
}

/// Run `jobs` to completion (or until Ctrl-C) and return the final report.
pub async fn run_batch(cfg: &ConfigFile, jobs: Vec<Job>) -> Result<BatchReport> {
    let mut report = BatchReport::new(&jobs, cfg.log_dir());
    let (scheduler, mut events, runtime) =
        Scheduler::spawn(cfg.scheduler_options(), cfg.launch_settings());

    // Ctrl-C → kill running jobs, drop pending ones, shut down.
    let interrupt = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            warn!("interrupted; stopping batch");
            if scheduler.stop().await.is_ok() {
                let _ = scheduler.shutdown();
            }
        })
    };

    info!(
        jobs = jobs.len(),
        max_parallel = cfg.scheduler.max_parallel,
        mode = ?cfg.scheduler.mode,
        "running batch"
    );
    scheduler.submit(jobs)?;

    while let Some(event) = events.recv().await {
        relay_event(&event);
        report.record(&event);

        match event {
            SchedulerEvent::Finished { .. } => info!("{}", report.progress_line()),
            SchedulerEvent::QueueEmpty => break,
            _ => {}
        }
    }

    interrupt.abort();
    // Already gone after an interrupt.
    let _ = scheduler.shutdown();
    runtime.await??;

    Ok(report)
}

/// Apply command-line overrides on top of the batch file.
pub fn apply_cli_overrides(cfg: &mut ConfigFile, args: &CliArgs) {
    if let Some(n) = args.max_parallel {
        let clamped = clamp_max_parallel(n);
        if clamped != n {
            warn!(requested = n, clamped, "--max-parallel out of range; clamping");
        }
        cfg.scheduler.max_parallel = clamped;
    }
    if let Some(mode) = args.mode {
        cfg.scheduler.mode = mode;
    }
    if args.console {
        cfg.scheduler.mode = LaunchMode::Console;
    }
    if let Some(kind) = args.engine_kind {
        cfg.engine.kind = kind;
    }
    if args.no_logs {
        cfg.scheduler.emit_logs = false;
    }
    if let Some(ref dir) = args.log_dir {
        cfg.output.log_dir = Some(dir.clone());
    }
}

/// Jobs from the batch file followed by one job per command-line input.
pub fn collect_jobs(cfg: &ConfigFile, args: &CliArgs) -> crate::errors::Result<Vec<Job>> {
    let mut jobs = cfg.jobs.clone();
    if let Some(ref script) = args.script {
        jobs.extend(jobs_for_inputs(args.inputs.iter().cloned(), script));
    }

    if jobs.is_empty() {
        return Err(BatchError::ConfigError(
            "no jobs: add [[job]] entries to the batch file or pass INPUT files with --script"
                .to_string(),
        ));
    }
    ensure_unique_names(&jobs)?;
    Ok(jobs)
}

fn relay_event(event: &SchedulerEvent) {
    match event {
        SchedulerEvent::Started { job } => info!(job = %job, "running"),
        SchedulerEvent::OutputLine { job, line } => println!("[{job}] {line}"),
        SchedulerEvent::ErrorLine { job, line } => eprintln!("[{job}] {line}"),
        SchedulerEvent::Finished { job, exit_code } if *exit_code == NOT_STARTED_EXIT_CODE => {
            warn!(job = %job, "job never ran")
        }
        SchedulerEvent::Finished { job, exit_code } => {
            info!(job = %job, exit_code, "done")
        }
        SchedulerEvent::QueueEmpty => debug!("queue empty"),
    }
}

/// Simple dry-run output: print settings, jobs and their command lines.
fn print_dry_run(cfg: &ConfigFile, jobs: &[Job]) {
    let settings = cfg.launch_settings();

    println!("dwgbatch dry-run");
    println!("  engine.executable = {}", cfg.engine.executable.display());
    println!("  engine.kind = {:?}", cfg.engine.kind);
    println!("  scheduler.max_parallel = {}", cfg.scheduler.max_parallel);
    println!("  scheduler.mode = {:?}", cfg.scheduler.mode);
    println!("  scheduler.emit_logs = {}", cfg.scheduler.emit_logs);
    if let Some(dir) = cfg.log_dir() {
        println!("  output.log_dir = {}", dir.display());
    }
    println!();

    println!("jobs ({}):", jobs.len());
    for job in jobs {
        println!("  - {}", job.name());
        println!("      input: {}", job.input_path.display());
        println!("      script: {}", job.script_path.display());
        println!("      cmd: {}", command_line(&settings, job));
    }

    debug!("dry-run complete (no execution)");
}
