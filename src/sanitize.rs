// src/sanitize.rs

//! Cleaning of raw engine output before it is relayed or written to logs.

use std::sync::LazyLock;

use regex::Regex;

/// CSI sequence: ESC `[`, parameter bytes, intermediate bytes, final byte.
static ANSI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1B\[[0-?]*[ -/]*[@-~]").expect("valid ANSI regex"));

/// C0 controls except TAB and LF, plus DEL.
static CTRL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0B-\x1F\x7F]").expect("valid control regex"));

/// Strip terminal escape sequences and control characters from a single line
/// of output, then trim surrounding whitespace.
///
/// Returns an empty string if nothing printable remains; callers are expected
/// to drop such lines instead of emitting them.
///
/// Escape fragments that don't form a complete CSI sequence are left alone
/// (apart from the ESC byte itself, which is a control character).
pub fn sanitize_line(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let without_ansi = ANSI_RE.replace_all(raw, "");
    let without_ctrl = CTRL_RE.replace_all(&without_ansi, "");
    without_ctrl.trim().to_string()
}
