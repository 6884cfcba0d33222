//! Field extraction for a single record span.
//!
//! Category and location are captions printed on the two lines above the
//! anchor. Every other field is found by scanning the span top to bottom
//! exactly once: each label is taken at its first occurrence, and summary
//! text accumulates from the `Summary:` label until the disposition label
//! or the end of the span.

use std::collections::BTreeSet;
use std::ops::Range;

use crime_log_report_models::{IncidentField, IncidentRecord};

use crate::template::CompiledTemplate;

/// Extracts one record from `lines[span]`.
///
/// Missing labels leave their field empty; they are never an error.
#[must_use]
pub fn extract_record(
    lines: &[&str],
    span: Range<usize>,
    template: &CompiledTemplate,
) -> IncidentRecord {
    let mut record = IncidentRecord::default();

    if span.start >= 2 {
        record.category = caption(lines[span.start - 2], template);
        record.location = caption(lines[span.start - 1], template);
    }

    let mut seen = BTreeSet::new();
    let mut fragments: Vec<&str> = Vec::new();
    let mut in_summary = false;

    for &line in &lines[span] {
        let starts_summary = !seen.contains(&IncidentField::Summary)
            && template.summary.as_ref().is_some_and(|rule| rule.matches(line));

        // Any disposition label ends a summary, even after the value was
        // already taken.
        if let Some(rule) = &template.disposition
            && (in_summary || starts_summary || !seen.contains(&IncidentField::Disposition))
            && rule.matches(line)
        {
            if !in_summary {
                let end = [template.summary.as_ref(), Some(rule)]
                    .into_iter()
                    .flatten()
                    .filter_map(|r| line.find(&r.label))
                    .min()
                    .unwrap_or(line.len());
                apply_rules(&mut record, &mut seen, &line[..end], template);
            }

            // A summary printed on the same line as the disposition keeps
            // only the text in between.
            if let Some(summary) = &template.summary
                && !seen.contains(&IncidentField::Summary)
                && let Some(at) = line.find(&rule.label)
                && summary.matches(&line[..at])
            {
                seen.insert(IncidentField::Summary);
                push_fragment(&mut fragments, summary.capture(&line[..at]));
            }
            if seen.insert(IncidentField::Disposition) {
                record.disposition = rule.capture(line).to_owned();
            }
            in_summary = false;
            continue;
        }

        if in_summary {
            if !template.is_anchor(line) {
                push_fragment(&mut fragments, line.trim());
            }
            continue;
        }

        if starts_summary
            && let Some(rule) = &template.summary
            && let Some(at) = line.find(&rule.label)
        {
            // Labels after `Summary:` belong to the summary text.
            apply_rules(&mut record, &mut seen, &line[..at], template);
            seen.insert(IncidentField::Summary);
            push_fragment(&mut fragments, rule.capture(line));
            in_summary = true;
            continue;
        }

        apply_rules(&mut record, &mut seen, line, template);
    }

    record.summary = fragments.join(" ");
    record
}

/// Captures every scalar field whose label appears in `text` and has not
/// been seen yet in this record.
fn apply_rules(
    record: &mut IncidentRecord,
    seen: &mut BTreeSet<IncidentField>,
    text: &str,
    template: &CompiledTemplate,
) {
    for rule in &template.rules {
        if !seen.contains(&rule.field) && rule.matches(text) {
            record.set(rule.field, rule.capture(text));
            seen.insert(rule.field);
        }
    }
}

/// Accepts a caption line as a category or location unless it is blank
/// or carries a noise marker.
fn caption(line: &str, template: &CompiledTemplate) -> String {
    let trimmed = line.trim();
    if trimmed.is_empty() || template.is_noise(trimmed) {
        String::new()
    } else {
        trimmed.to_owned()
    }
}

fn push_fragment<'a>(fragments: &mut Vec<&'a str>, fragment: &'a str) {
    if !fragment.is_empty() {
        fragments.push(fragment);
    }
}
