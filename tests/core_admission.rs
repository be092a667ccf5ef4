// tests/core_admission.rs

use dwgbatch::engine::{
    CoreScheduler, NOT_STARTED_EXIT_CODE, OutputStream, SchedulerEvent, SchedulerOptions,
};
use dwgbatch::jobs::JobState;
use dwgbatch_test_utils::builders::{
    events, finished, job, jobs, named_jobs, queue_empty_count, started,
};
use dwgbatch_test_utils::fake_launcher::{FakeFailure, FakeHandle, FakeLauncher};
use dwgbatch_test_utils::init_tracing;

fn core(max_parallel: usize) -> CoreScheduler<FakeHandle> {
    CoreScheduler::new(SchedulerOptions {
        max_parallel,
        emit_logs: true,
    })
}

#[test]
fn five_jobs_two_slots_run_in_submission_order() {
    init_tracing();
    let mut launcher = FakeLauncher::new();
    let mut core = core(2);
    let mut seen = Vec::new();

    let step = core.submit(jobs(5), &mut launcher);
    seen.extend(events(&step));
    assert_eq!(started(&seen), vec!["job1", "job2"]);
    assert_eq!(core.active_jobs(), vec!["job1", "job2"]);
    assert_eq!(core.pending_jobs(), vec!["job3", "job4", "job5"]);

    // Exits in arbitrary order; each frees exactly one slot.
    for (name, code) in [("job2", 0), ("job1", 1), ("job3", 0), ("job5", 0), ("job4", 0)] {
        let step = core.handle_exit(name, code, &mut launcher);
        seen.extend(events(&step));
        assert!(core.active_len() <= 2);
    }

    assert_eq!(started(&seen), vec!["job1", "job2", "job3", "job4", "job5"]);
    assert_eq!(
        finished(&seen),
        vec![
            ("job2".to_string(), 0),
            ("job1".to_string(), 1),
            ("job3".to_string(), 0),
            ("job5".to_string(), 0),
            ("job4".to_string(), 0),
        ]
    );
    assert_eq!(queue_empty_count(&seen), 1);
    assert_eq!(seen.last(), Some(&SchedulerEvent::QueueEmpty));
    assert!(core.is_idle());
    assert_eq!(launcher.launched(), vec!["job1", "job2", "job3", "job4", "job5"]);
}

#[test]
fn replacement_starts_right_after_finished() {
    let mut launcher = FakeLauncher::new();
    let mut core = core(1);

    core.submit(named_jobs(&["a", "b"]), &mut launcher);
    let step = core.handle_exit("a", 0, &mut launcher);

    assert_eq!(
        events(&step),
        vec![
            SchedulerEvent::Finished {
                job: "a".into(),
                exit_code: 0
            },
            SchedulerEvent::Started { job: "b".into() },
        ]
    );
}

#[test]
fn queue_empty_is_reported_once_per_idle_period() {
    let mut launcher = FakeLauncher::new();
    let mut core = core(2);

    core.submit(jobs(1), &mut launcher);
    let step = core.handle_exit("job1", 0, &mut launcher);
    assert_eq!(queue_empty_count(&events(&step)), 1);

    // Nothing changed: no second QueueEmpty.
    assert!(core.admit(&mut launcher).is_empty());
    assert!(core.configure(3, &mut launcher).is_empty());

    // New work, new idle period.
    core.submit(named_jobs(&["late"]), &mut launcher);
    let step = core.handle_exit("late", 0, &mut launcher);
    assert_eq!(queue_empty_count(&events(&step)), 1);
}

#[test]
fn submitting_nothing_to_an_idle_scheduler_reports_queue_empty() {
    let mut launcher = FakeLauncher::new();
    let mut core = core(2);

    let step = core.submit(Vec::new(), &mut launcher);
    assert_eq!(events(&step), vec![SchedulerEvent::QueueEmpty]);

    let step = core.submit(Vec::new(), &mut launcher);
    assert!(step.is_empty());
}

#[test]
fn admit_is_idempotent_at_the_ceiling() {
    let mut launcher = FakeLauncher::new();
    let mut core = core(2);

    core.submit(jobs(4), &mut launcher);
    let again = core.admit(&mut launcher);

    assert!(again.is_empty());
    assert_eq!(launcher.launched(), vec!["job1", "job2"]);
    assert_eq!(core.pending_len(), 2);
}

#[test]
fn raising_the_ceiling_starts_pending_jobs_immediately() {
    let mut launcher = FakeLauncher::new();
    let mut core = core(1);

    core.submit(jobs(4), &mut launcher);
    let step = core.configure(3, &mut launcher);

    assert_eq!(started(&events(&step)), vec!["job2", "job3"]);
    assert_eq!(core.active_len(), 3);
    assert_eq!(core.pending_jobs(), vec!["job4"]);
}

#[test]
fn lowering_the_ceiling_lets_running_jobs_drain() {
    let mut launcher = FakeLauncher::new();
    let mut core = core(4);

    core.submit(jobs(6), &mut launcher);
    assert_eq!(core.active_len(), 4);

    let step = core.configure(1, &mut launcher);
    assert!(step.is_empty());
    assert_eq!(core.active_len(), 4, "lowering must not kill anything");
    assert!(launcher.killed().is_empty());

    // Three exits just shrink the active set; the fourth frees a slot.
    for name in ["job1", "job2", "job3"] {
        let step = core.handle_exit(name, 0, &mut launcher);
        assert!(started(&events(&step)).is_empty());
    }
    let step = core.handle_exit("job4", 0, &mut launcher);
    assert_eq!(started(&events(&step)), vec!["job5"]);
    assert_eq!(core.active_len(), 1);
}

#[test]
fn configure_clamps_out_of_range_values() {
    let mut launcher = FakeLauncher::new();
    let mut core = core(2);

    core.configure(0, &mut launcher);
    assert_eq!(core.max_parallel(), 1);

    core.configure(50, &mut launcher);
    assert_eq!(core.max_parallel(), 12);

    let core = CoreScheduler::<FakeHandle>::new(SchedulerOptions {
        max_parallel: 99,
        emit_logs: true,
    });
    assert_eq!(core.max_parallel(), 12);
}

#[test]
fn stop_reaps_every_active_job_and_discards_pending() {
    let mut launcher = FakeLauncher::new();
    let mut core = core(3);

    core.submit(jobs(7), &mut launcher);
    assert_eq!(core.active_len(), 3);
    assert_eq!(core.pending_len(), 4);

    let step = core.stop();

    assert_eq!(
        step.reaped_jobs().collect::<Vec<_>>(),
        vec!["job1", "job2", "job3"]
    );
    assert_eq!(step.events().count(), 0, "stop emits nothing by itself");
    assert!(core.is_idle());

    // Late exits from reaped processes are ignored, keeping Finished exactly-once.
    let step = core.handle_exit("job1", 137, &mut launcher);
    assert!(step.is_empty());

    // Stopping is not draining.
    assert!(core.admit(&mut launcher).is_empty());
    assert_eq!(launcher.launched(), vec!["job1", "job2", "job3"]);
}

#[test]
fn stop_on_an_idle_scheduler_is_a_no_op() {
    let mut core = core(2);
    assert!(core.stop().is_empty());
}

#[test]
fn scheduler_is_reusable_after_stop() {
    let mut launcher = FakeLauncher::new();
    let mut core = core(2);

    core.submit(jobs(3), &mut launcher);
    core.stop();

    let step = core.submit(named_jobs(&["again"]), &mut launcher);
    assert_eq!(started(&events(&step)), vec!["again"]);

    let step = core.handle_exit("again", 0, &mut launcher);
    assert_eq!(queue_empty_count(&events(&step)), 1);
}

#[test]
fn missing_file_failure_reports_error_line_then_sentinel_and_moves_on() {
    let mut launcher = FakeLauncher::new().failing("job1", FakeFailure::MissingScript);
    let mut core = core(1);

    let step = core.submit(jobs(2), &mut launcher);
    let seen = events(&step);

    assert!(matches!(
        &seen[0],
        SchedulerEvent::ErrorLine { job, line } if job == "job1" && line.starts_with("ERROR: Script not found")
    ));
    assert_eq!(
        seen[1],
        SchedulerEvent::Finished {
            job: "job1".into(),
            exit_code: NOT_STARTED_EXIT_CODE
        }
    );
    assert_eq!(seen[2], SchedulerEvent::Started { job: "job2".into() });
    assert_eq!(seen.len(), 3);
    assert_eq!(core.active_jobs(), vec!["job2"]);
}

#[test]
fn spawn_failure_reports_only_the_sentinel() {
    let mut launcher = FakeLauncher::new().failing("solo", FakeFailure::Spawn);
    let mut core = core(2);

    let step = core.submit(named_jobs(&["solo"]), &mut launcher);

    assert_eq!(
        events(&step),
        vec![
            SchedulerEvent::Finished {
                job: "solo".into(),
                exit_code: NOT_STARTED_EXIT_CODE
            },
            SchedulerEvent::QueueEmpty,
        ]
    );
}

#[test]
fn duplicate_name_is_rejected_at_submit() {
    let mut launcher = FakeLauncher::new();
    let mut core = core(1);

    core.submit(named_jobs(&["a", "b"]), &mut launcher);
    let step = core.submit(named_jobs(&["a", "b", "c"]), &mut launcher);
    let seen = events(&step);

    assert_eq!(
        finished(&seen),
        vec![
            ("a".to_string(), NOT_STARTED_EXIT_CODE),
            ("b".to_string(), NOT_STARTED_EXIT_CODE),
        ]
    );
    assert!(seen.iter().any(|e| matches!(
        e,
        SchedulerEvent::ErrorLine { job, line } if job == "a" && line.contains("duplicate")
    )));
    assert_eq!(core.pending_jobs(), vec!["b", "c"]);
    assert_eq!(core.state_of("a"), Some(JobState::Running));
}

#[test]
fn output_is_relayed_only_for_active_jobs() {
    let mut launcher = FakeLauncher::new();
    let mut core = core(1);
    core.submit(named_jobs(&["a", "b"]), &mut launcher);

    let step = core.handle_output("a", OutputStream::Stdout, "Regenerating model.".into());
    assert_eq!(
        events(&step),
        vec![SchedulerEvent::OutputLine {
            job: "a".into(),
            line: "Regenerating model.".into()
        }]
    );

    let step = core.handle_output("a", OutputStream::Stderr, "warning".into());
    assert_eq!(
        events(&step),
        vec![SchedulerEvent::ErrorLine {
            job: "a".into(),
            line: "warning".into()
        }]
    );

    // Pending job.
    assert!(core.handle_output("b", OutputStream::Stdout, "x".into()).is_empty());
    // Unknown job.
    assert!(core.handle_output("zzz", OutputStream::Stdout, "x".into()).is_empty());
}

#[test]
fn disabling_logs_suppresses_lines_but_not_lifecycle_events() {
    let mut launcher = FakeLauncher::new();
    let mut core = CoreScheduler::<FakeHandle>::new(SchedulerOptions {
        max_parallel: 2,
        emit_logs: false,
    });

    let step = core.submit(vec![job("quiet")], &mut launcher);
    assert_eq!(started(&events(&step)), vec!["quiet"]);

    assert!(
        core.handle_output("quiet", OutputStream::Stdout, "hello".into())
            .is_empty()
    );

    let step = core.handle_exit("quiet", 0, &mut launcher);
    assert_eq!(finished(&events(&step)), vec![("quiet".to_string(), 0)]);
}

#[test]
fn state_of_tracks_pending_and_running() {
    let mut launcher = FakeLauncher::new();
    let mut core = core(1);
    core.submit(named_jobs(&["a", "b"]), &mut launcher);

    assert_eq!(core.state_of("a"), Some(JobState::Running));
    assert_eq!(core.state_of("b"), Some(JobState::Pending));

    core.handle_exit("a", 0, &mut launcher);
    assert_eq!(core.state_of("a"), None);
    assert_eq!(core.state_of("b"), Some(JobState::Running));
}
