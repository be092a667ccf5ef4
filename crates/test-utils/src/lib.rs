pub mod builders;
pub mod fake_launcher;

use std::sync::{Arc, Mutex, Once};

use dwgbatch::engine::{EventStream, Scheduler, SchedulerEvent, SchedulerOptions};
use dwgbatch::errors::Result;
use tokio::task::JoinHandle;
use tracing_subscriber::{fmt, EnvFilter};

use crate::fake_launcher::{FakeController, FakeLauncher};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// A scheduler runtime driven by a [`FakeLauncher`].
pub struct FakeScheduler {
    pub scheduler: Scheduler,
    pub events: EventStream,
    pub runtime: JoinHandle<Result<()>>,
    /// Reports output and exits for the fake jobs.
    pub controller: FakeController,
    pub launched: Arc<Mutex<Vec<String>>>,
    pub killed: Arc<Mutex<Vec<String>>>,
}

impl FakeScheduler {
    /// Receive the next event, failing the test after 5 seconds.
    pub async fn next_event(&mut self) -> SchedulerEvent {
        with_timeout(self.events.recv())
            .await
            .expect("event stream closed")
    }

    /// Receive events up to and including the first one matching `until`.
    pub async fn events_until<F>(&mut self, mut until: F) -> Vec<SchedulerEvent>
    where
        F: FnMut(&SchedulerEvent) -> bool,
    {
        let mut seen = Vec::new();
        loop {
            let event = self.next_event().await;
            let done = until(&event);
            seen.push(event);
            if done {
                return seen;
            }
        }
    }

    pub fn launched(&self) -> Vec<String> {
        self.launched.lock().unwrap().clone()
    }

    pub fn killed(&self) -> Vec<String> {
        self.killed.lock().unwrap().clone()
    }
}

/// Spawn a scheduler runtime around `launcher`.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_fake(options: SchedulerOptions, launcher: FakeLauncher) -> FakeScheduler {
    let launched = launcher.launched_log();
    let killed = launcher.killed_log();
    let mut controller = None;

    let (scheduler, events, runtime) = Scheduler::spawn_with(options, |runtime_tx| {
        controller = Some(FakeController::new(runtime_tx));
        launcher
    });

    FakeScheduler {
        scheduler,
        events,
        runtime,
        controller: controller.expect("launcher factory was called"),
        launched,
        killed,
    }
}
