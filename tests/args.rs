// tests/args.rs

use std::ffi::OsString;

use dwgbatch::exec::{LaunchSettings, command_line, engine_args};
use dwgbatch::jobs::Job;
use dwgbatch::types::EngineKind;

fn strings(args: Vec<OsString>) -> Vec<String> {
    args.into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

fn plan_job() -> Job {
    Job::for_input("drawings/site-plan.dwg", "out/site-plan__batch.scr")
}

#[test]
fn core_console_passes_input_with_flag() {
    let settings = LaunchSettings {
        language: Some("en-US".into()),
        ..LaunchSettings::new("accoreconsole.exe")
    };

    assert_eq!(
        strings(engine_args(&settings, &plan_job())),
        vec![
            "/l",
            "en-US",
            "/i",
            "drawings/site-plan.dwg",
            "/s",
            "out/site-plan__batch.scr"
        ]
    );
}

#[test]
fn desktop_passes_input_positionally_after_product_and_language() {
    let settings = LaunchSettings {
        engine: EngineKind::Desktop,
        language: Some("de-DE".into()),
        product: Some("C3D".into()),
        ..LaunchSettings::new("acad.exe")
    };

    assert_eq!(
        strings(engine_args(&settings, &plan_job())),
        vec![
            "/product",
            "C3D",
            "/l",
            "de-DE",
            "drawings/site-plan.dwg",
            "/s",
            "out/site-plan__batch.scr"
        ]
    );
}

#[test]
fn blank_flags_are_omitted() {
    let settings = LaunchSettings {
        language: Some(" ".into()),
        product: Some(String::new()),
        ..LaunchSettings::new("accoreconsole.exe")
    };

    assert_eq!(
        strings(engine_args(&settings, &plan_job())),
        vec!["/i", "drawings/site-plan.dwg", "/s", "out/site-plan__batch.scr"]
    );
}

#[test]
fn command_line_quotes_arguments_with_spaces() {
    let settings = LaunchSettings::new("C:/Program Files/Autodesk/accoreconsole.exe");
    let job = Job::for_input("My Drawings/plan.dwg", "plan.scr");

    assert_eq!(
        command_line(&settings, &job),
        "\"C:/Program Files/Autodesk/accoreconsole.exe\" /i \"My Drawings/plan.dwg\" /s plan.scr"
    );
}

#[test]
fn engine_kind_and_mode_parse_from_flags() {
    use dwgbatch::types::LaunchMode;

    assert_eq!("accore".parse::<EngineKind>(), Ok(EngineKind::CoreConsole));
    assert_eq!(" Desktop ".parse::<EngineKind>(), Ok(EngineKind::Desktop));
    assert!("lt".parse::<EngineKind>().is_err());
    assert_eq!("console".parse::<LaunchMode>(), Ok(LaunchMode::Console));
    assert!("hidden".parse::<LaunchMode>().is_err());
}
