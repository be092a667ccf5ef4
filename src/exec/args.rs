// src/exec/args.rs

//! Engine command-line construction.

use std::ffi::OsString;

use crate::exec::LaunchSettings;
use crate::jobs::Job;
use crate::types::EngineKind;

/// Arguments for one job, in the order the engine expects:
/// product flag, language flag, input, script.
pub fn engine_args(settings: &LaunchSettings, job: &Job) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::with_capacity(8);

    if let Some(product) = non_blank(settings.product.as_deref()) {
        args.push("/product".into());
        args.push(product.into());
    }
    if let Some(language) = non_blank(settings.language.as_deref()) {
        args.push("/l".into());
        args.push(language.into());
    }

    match settings.engine {
        EngineKind::CoreConsole => {
            args.push("/i".into());
            args.push(job.input_path.clone().into_os_string());
        }
        EngineKind::Desktop => {
            args.push(job.input_path.clone().into_os_string());
        }
    }

    args.push("/s".into());
    args.push(job.script_path.clone().into_os_string());
    args
}

/// Human-readable command line for logs and `--dry-run`.
///
/// Arguments containing whitespace are double-quoted. This is for display
/// only; the process itself is spawned with the argument vector.
pub fn command_line(settings: &LaunchSettings, job: &Job) -> String {
    std::iter::once(settings.executable.clone().into_os_string())
        .chain(engine_args(settings, job))
        .map(|arg| quote(&arg.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn quote(arg: &str) -> String {
    if arg.is_empty() || arg.chars().any(char::is_whitespace) {
        format!("\"{arg}\"")
    } else {
        arg.to_string()
    }
}
