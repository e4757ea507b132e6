//! Output slicing
//!
//! Every turn reruns the whole program, so its output repeats everything
//! earlier turns printed. These helpers cut it down to what is new relative
//! to a line offset.

use crate::feedback::error_parser::EXIT_STATUS_MARKER;

/// Number of newline-terminated lines in `output`
pub fn line_count(output: &str) -> usize {
    output.bytes().filter(|&b| b == b'\n').count()
}

/// Text after the `offset`-th newline, or `""` when there are fewer lines
pub fn slice_from(output: &str, offset: usize) -> &str {
    if offset == 0 {
        return output;
    }
    match output.match_indices('\n').nth(offset - 1) {
        Some((idx, _)) => &output[idx + 1..],
        None => "",
    }
}

/// Drop the trailing `exit status N` line `go run` appends on failure
pub fn strip_exit_status(output: &str) -> &str {
    let body = output.trim_end_matches(['\n', '\r']);
    let (head, last) = match body.rfind('\n') {
        Some(idx) => (&output[..idx + 1], &body[idx + 1..]),
        None => ("", body),
    };
    if last.starts_with(EXIT_STATUS_MARKER) {
        head
    } else {
        output
    }
}

/// What a successful turn shows: new lines, without the final newline
pub fn visible_output(output: &str, offset: usize) -> &str {
    let fresh = slice_from(output, offset);
    fresh.strip_suffix('\n').unwrap_or(fresh)
}

/// What a failed run shows: the program's own new output.
///
/// Falls back to the exit-status line when the program printed nothing new.
pub fn runtime_failure_text(output: &str, offset: usize) -> String {
    let sliced = slice_from(strip_exit_status(output), offset);
    let fresh = sliced.strip_suffix('\n').unwrap_or(sliced);
    if !fresh.trim().is_empty() {
        return fresh.to_string();
    }
    output
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or_default()
        .trim()
        .to_string()
}
