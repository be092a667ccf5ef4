// tests/report.rs

use std::error::Error;
use std::fs;

use tempfile::TempDir;

use dwgbatch::engine::{NOT_STARTED_EXIT_CODE, SchedulerEvent};
use dwgbatch::jobs::JobState;
use dwgbatch::report::{BatchReport, log_path_for};
use dwgbatch_test_utils::builders::named_jobs;

type TestResult = Result<(), Box<dyn Error>>;

fn started(job: &str) -> SchedulerEvent {
    SchedulerEvent::Started { job: job.into() }
}

fn finished(job: &str, exit_code: i32) -> SchedulerEvent {
    SchedulerEvent::Finished {
        job: job.into(),
        exit_code,
    }
}

#[test]
fn rows_follow_the_event_stream() {
    let mut report = BatchReport::new(&named_jobs(&["a", "b", "c"]), None);
    assert_eq!(report.row("a").map(|r| r.state), Some(JobState::Pending));

    report.record(&started("a"));
    report.record(&started("b"));
    assert_eq!(report.row("a").map(|r| r.state), Some(JobState::Running));

    report.record(&finished("b", 0));
    report.record(&finished("a", 2));
    assert_eq!(report.progress_line(), "Completed 2/3.");

    report.record(&finished("c", NOT_STARTED_EXIT_CODE));
    report.record(&SchedulerEvent::QueueEmpty);

    assert!(report.is_drained());
    assert_eq!(report.completed(), 3);
    let failed: Vec<_> = report.failed().into_iter().map(|r| r.name.as_str()).collect();
    assert_eq!(failed, vec!["a", "c"]);
    assert_eq!(report.row("c").and_then(|r| r.exit_code()), Some(-1));
}

#[test]
fn second_finished_for_a_job_is_ignored() {
    let mut report = BatchReport::new(&named_jobs(&["a"]), None);
    report.record(&started("a"));
    report.record(&finished("a", 0));
    report.record(&finished("a", 9));

    assert_eq!(report.completed(), 1);
    assert_eq!(report.row("a").map(|r| r.state), Some(JobState::Finished(0)));
}

#[test]
fn events_for_unknown_jobs_are_ignored() {
    let mut report = BatchReport::new(&named_jobs(&["a"]), None);
    report.record(&finished("stranger", 0));
    assert_eq!(report.completed(), 0);
}

#[test]
fn summary_distinguishes_drained_from_aborted() {
    let mut report = BatchReport::new(&named_jobs(&["site-plan", "b"]), None);
    report.record(&started("site-plan"));
    report.record(&finished("site-plan", 0));

    let aborted = report.summary();
    assert!(aborted.starts_with("JOB"), "{aborted}");
    assert!(aborted.contains("site-plan  Done"), "{aborted}");
    assert!(aborted.contains("b          Pending  -"), "{aborted}");
    assert!(aborted.ends_with("Aborted. (1/2 finished, 0 failed)"), "{aborted}");

    report.record(&started("b"));
    report.record(&finished("b", 1));
    report.record(&SchedulerEvent::QueueEmpty);
    assert!(
        report
            .summary()
            .ends_with("All jobs finished. (2/2, 1 failed)")
    );
}

#[test]
fn relayed_lines_are_appended_to_per_job_logs() -> TestResult {
    let dir = TempDir::new()?;
    let log_dir = dir.path().join("logs");
    let mut report = BatchReport::new(&named_jobs(&["plan", "detail"]), Some(log_dir.as_path()));

    report.record(&started("plan"));
    report.record(&SchedulerEvent::OutputLine {
        job: "plan".into(),
        line: "Opening drawing".into(),
    });
    report.record(&SchedulerEvent::ErrorLine {
        job: "plan".into(),
        line: "Missing xref".into(),
    });
    report.record(&finished("plan", 0));

    let plan_log = log_path_for(&log_dir, "plan");
    assert!(plan_log.ends_with("plan__accore.log"));
    assert_eq!(fs::read_to_string(&plan_log)?, "Opening drawing\nMissing xref\n");
    assert_eq!(
        report.row("plan").and_then(|r| r.log_path.clone()),
        Some(plan_log)
    );

    // No lines, no file.
    assert!(!log_path_for(&log_dir, "detail").exists());
    Ok(())
}

#[test]
fn unwritable_log_dir_does_not_affect_the_report() -> TestResult {
    let dir = TempDir::new()?;
    // A file where the directory should be.
    let blocker = dir.path().join("logs");
    fs::write(&blocker, "")?;
    let mut report = BatchReport::new(&named_jobs(&["plan"]), Some(blocker.as_path()));

    report.record(&started("plan"));
    report.record(&SchedulerEvent::OutputLine {
        job: "plan".into(),
        line: "hello".into(),
    });
    report.record(&finished("plan", 0));

    assert_eq!(report.completed(), 1);
    Ok(())
}
