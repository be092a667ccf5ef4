#![allow(dead_code)]

use std::path::PathBuf;

use dwgbatch::engine::{CoreStep, SchedulerEvent};
use dwgbatch::jobs::Job;

/// A job named `name` with placeholder paths derived from it.
pub fn job(name: &str) -> Job {
    Job::new(
        format!("drawings/{name}.dwg"),
        format!("scripts/{name}__batch.scr"),
        name,
    )
}

/// `count` jobs named `job1`, `job2`, ...
pub fn jobs(count: usize) -> Vec<Job> {
    (1..=count).map(|i| job(&format!("job{i}"))).collect()
}

/// Jobs with the given names, in order.
pub fn named_jobs(names: &[&str]) -> Vec<Job> {
    names.iter().map(|n| job(n)).collect()
}

/// Owned copy of the events in a core step.
pub fn events<H>(step: &CoreStep<H>) -> Vec<SchedulerEvent> {
    step.events().cloned().collect()
}

/// Names from the `Started` events in a list, in order.
pub fn started(events: &[SchedulerEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            SchedulerEvent::Started { job } => Some(job.clone()),
            _ => None,
        })
        .collect()
}

/// `(name, exit_code)` from the `Finished` events in a list, in order.
pub fn finished(events: &[SchedulerEvent]) -> Vec<(String, i32)> {
    events
        .iter()
        .filter_map(|e| match e {
            SchedulerEvent::Finished { job, exit_code } => Some((job.clone(), *exit_code)),
            _ => None,
        })
        .collect()
}

/// Number of `QueueEmpty` events in a list.
pub fn queue_empty_count(events: &[SchedulerEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, SchedulerEvent::QueueEmpty))
        .count()
}

/// Builder for a batch TOML file, for config tests.
pub struct BatchFileBuilder {
    engine: Vec<String>,
    scheduler: Vec<String>,
    output: Vec<String>,
    jobs: Vec<String>,
}

impl BatchFileBuilder {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        let executable: PathBuf = executable.into();
        Self {
            engine: vec![format!("executable = {:?}", executable.to_string_lossy())],
            scheduler: Vec::new(),
            output: Vec::new(),
            jobs: Vec::new(),
        }
    }

    pub fn engine(mut self, line: &str) -> Self {
        self.engine.push(line.to_string());
        self
    }

    pub fn scheduler(mut self, line: &str) -> Self {
        self.scheduler.push(line.to_string());
        self
    }

    pub fn output(mut self, line: &str) -> Self {
        self.output.push(line.to_string());
        self
    }

    pub fn job(mut self, input: &str, script: &str) -> Self {
        self.jobs
            .push(format!("[[job]]\ninput = {input:?}\nscript = {script:?}\n"));
        self
    }

    pub fn named_job(mut self, input: &str, script: &str, name: &str) -> Self {
        self.jobs.push(format!(
            "[[job]]\ninput = {input:?}\nscript = {script:?}\nname = {name:?}\n"
        ));
        self
    }

    pub fn build(self) -> String {
        let mut out = String::new();
        out.push_str("[engine]\n");
        for line in &self.engine {
            out.push_str(line);
            out.push('\n');
        }
        if !self.scheduler.is_empty() {
            out.push_str("\n[scheduler]\n");
            for line in &self.scheduler {
                out.push_str(line);
                out.push('\n');
            }
        }
        if !self.output.is_empty() {
            out.push_str("\n[output]\n");
            for line in &self.output {
                out.push_str(line);
                out.push('\n');
            }
        }
        for job in &self.jobs {
            out.push('\n');
            out.push_str(job);
        }
        out
    }
}
