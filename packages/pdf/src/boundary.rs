//! Record boundary detection.
//!
//! Police-log text has no structural markup, so records are delimited only
//! by the recurring anchor phrase. Each record spans from its anchor line
//! up to (not including) the next anchor line, or to the end of the
//! document.

use std::ops::Range;

/// Splits extracted page text into lines.
#[must_use]
pub fn split_lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}

/// Returns the index of every line containing `anchor`, in order.
///
/// The match is a literal, case-sensitive substring test anywhere in the
/// line, since the label and its value frequently share a line.
#[must_use]
pub fn record_starts(lines: &[&str], anchor: &str) -> Vec<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.contains(anchor))
        .map(|(i, _)| i)
        .collect()
}

/// Returns the half-open line range of every record.
#[must_use]
pub fn record_spans(lines: &[&str], anchor: &str) -> Vec<Range<usize>> {
    let starts = record_starts(lines, anchor);
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| start..starts.get(i + 1).copied().unwrap_or(lines.len()))
        .collect()
}
