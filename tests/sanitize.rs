// tests/sanitize.rs

use dwgbatch::sanitize::sanitize_line;
use proptest::prelude::*;

#[test]
fn strips_colour_codes_and_bell() {
    assert_eq!(
        sanitize_line("\x1b[31mERROR\x1b[0m: bad file\x07"),
        "ERROR: bad file"
    );
}

#[test]
fn strips_cursor_movement_and_erase_sequences() {
    assert_eq!(sanitize_line("\x1b[2K\x1b[1GLoading 45%"), "Loading 45%");
    assert_eq!(sanitize_line("\x1b[?25lCommand:\x1b[?25h"), "Command:");
}

#[test]
fn trims_surrounding_whitespace_and_line_endings() {
    assert_eq!(sanitize_line("  Regenerating model.\r\n"), "Regenerating model.");
}

#[test]
fn keeps_inner_tabs_and_spaces() {
    assert_eq!(sanitize_line("Layer\t0   on"), "Layer\t0   on");
}

#[test]
fn blank_or_control_only_lines_become_empty() {
    assert_eq!(sanitize_line(""), "");
    assert_eq!(sanitize_line("   \t "), "");
    assert_eq!(sanitize_line("\x1b[0m\r\n"), "");
    assert_eq!(sanitize_line("\x00\x01\x7f"), "");
}

#[test]
fn utf16_style_nul_padding_is_removed() {
    assert_eq!(sanitize_line("C\0o\0m\0m\0a\0n\0d\0:\0"), "Command:");
}

#[test]
fn non_ascii_text_survives() {
    assert_eq!(sanitize_line("Zeichnung geöffnet: Grundriß"), "Zeichnung geöffnet: Grundriß");
}

#[test]
fn incomplete_escape_loses_only_the_escape_byte() {
    assert_eq!(sanitize_line("abc\x1b["), "abc[");
}

proptest! {
    #[test]
    fn output_has_no_control_characters(raw in ".*") {
        let clean = sanitize_line(&raw);
        prop_assert!(!clean.chars().any(|c| c.is_ascii_control() && c != '\t' && c != '\n'));
        prop_assert_eq!(clean.trim(), clean.as_str());
    }

    #[test]
    fn sanitizing_is_idempotent(raw in ".*") {
        let once = sanitize_line(&raw);
        prop_assert_eq!(sanitize_line(&once), once);
    }
}
