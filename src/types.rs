use std::str::FromStr;
use serde::Deserialize;

/// How the engine process is attached to the operator.
///
/// - `Captured`: stdout/stderr are piped, sanitized and relayed as events.
/// - `Console`: the process gets its own visible terminal window and nothing
///   is captured. Useful when the engine may stop on an unexpected prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchMode {
    Captured,
    Console,
}

impl Default for LaunchMode {
    fn default() -> Self {
        LaunchMode::Captured
    }
}

impl FromStr for LaunchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "captured" => Ok(LaunchMode::Captured),
            "console" => Ok(LaunchMode::Console),
            other => Err(format!(
                "invalid launch mode: {other} (expected \"captured\" or \"console\")"
            )),
        }
    }
}

/// Which flavour of the CAD engine the executable is.
///
/// The flavour only changes how the input drawing is passed on the command
/// line; the script is always given with `/s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    /// Headless core console: `/i <input> /s <script>`.
    CoreConsole,
    /// Full desktop application: `<input> /s <script>`.
    Desktop,
}

impl Default for EngineKind {
    fn default() -> Self {
        EngineKind::CoreConsole
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "core-console" | "accore" => Ok(EngineKind::CoreConsole),
            "desktop" => Ok(EngineKind::Desktop),
            other => Err(format!(
                "invalid engine kind: {other} (expected \"core-console\" or \"desktop\")"
            )),
        }
    }
}
