//! Report layout templates.
//!
//! A [`ReportTemplate`] describes how a police log lays out its incidents:
//! the anchor phrase that starts every record, the caption lines that must
//! not be mistaken for a category or location, and a table of
//! `label → value pattern` rules for the labeled fields. Keeping this as
//! data means a change in the source documents' wording is a TOML edit,
//! not a parser rewrite.

use std::path::Path;

use crime_log_report_models::IncidentField;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::PdfError;

/// Bundled template for the UCSD Police "Crime and Fire Log".
pub const UCSD_POLICE_TOML: &str = include_str!("../templates/ucsd_police.toml");

/// One labeled field: the literal label text and the pattern its value
/// must match immediately after the label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    /// Field populated by this rule.
    pub field: IncidentField,
    /// Literal, case-sensitive label text (e.g. `"Date Occurred"`).
    pub label: String,
    /// Regex for the value following the label.
    pub pattern: String,
}

impl FieldRule {
    fn new(field: IncidentField, label: &str, pattern: &str) -> Self {
        Self {
            field,
            label: label.to_owned(),
            pattern: pattern.to_owned(),
        }
    }
}

/// Layout description for one family of police-log documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTemplate {
    /// Phrase whose presence anywhere on a line starts a new record.
    pub anchor: String,
    /// Caption lines containing any of these are rejected as
    /// category/location candidates.
    pub noise_markers: Vec<String>,
    /// Labeled field rules.
    pub fields: Vec<FieldRule>,
}

impl Default for ReportTemplate {
    fn default() -> Self {
        const DATE: &str = r"\d{1,2}/\d{1,2}/\d{4}";
        const REST: &str = ".*";

        Self {
            anchor: "Date Reported".to_owned(),
            noise_markers: [
                "UCSD POLICE",
                "CRIME AND FIRE",
                "Date",
                "Incident",
                "Summary",
                "Disposition",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
            fields: vec![
                FieldRule::new(IncidentField::DateReported, "Date Reported", DATE),
                FieldRule::new(IncidentField::IncidentCase, "Incident/Case#", r"[\w\-]+"),
                FieldRule::new(IncidentField::DateOccurred, "Date Occurred", DATE),
                FieldRule::new(IncidentField::TimeOccurred, "Time Occurred", REST),
                FieldRule::new(IncidentField::Summary, "Summary:", REST),
                FieldRule::new(IncidentField::Disposition, "Disposition:", REST),
            ],
        }
    }
}

impl ReportTemplate {
    /// Parses a template from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::Template`] if the document is not a valid
    /// template.
    pub fn from_toml_str(s: &str) -> Result<Self, PdfError> {
        toml::from_str(s).map_err(|e| PdfError::Template(e.to_string()))
    }

    /// Loads a template from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::Io`] if the file cannot be read, or
    /// [`PdfError::Template`] if it is not a valid template.
    pub fn load(path: &Path) -> Result<Self, PdfError> {
        let text = std::fs::read_to_string(path)?;
        log::debug!("Loaded report template from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Compiles every rule's pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::Template`] if the anchor is empty, a rule targets
    /// a positional field (category or location), a field has more than one
    /// rule, or a pattern fails to compile.
    pub fn compile(&self) -> Result<CompiledTemplate, PdfError> {
        if self.anchor.trim().is_empty() {
            return Err(PdfError::Template("anchor must not be empty".to_owned()));
        }

        let mut rules = Vec::new();
        let mut summary = None;
        let mut disposition = None;

        for rule in &self.fields {
            let compiled = LabelRule::compile(rule)?;
            let slot = match rule.field {
                IncidentField::Category | IncidentField::Location => {
                    return Err(PdfError::Template(format!(
                        "{} is positional and cannot have a label rule",
                        rule.field
                    )));
                }
                IncidentField::Summary => &mut summary,
                IncidentField::Disposition => &mut disposition,
                _ => {
                    if rules.iter().any(|r: &LabelRule| r.field == rule.field) {
                        return Err(duplicate(rule.field));
                    }
                    rules.push(compiled);
                    continue;
                }
            };
            if slot.is_some() {
                return Err(duplicate(rule.field));
            }
            *slot = Some(compiled);
        }

        Ok(CompiledTemplate {
            anchor: self.anchor.clone(),
            noise_markers: self.noise_markers.clone(),
            rules,
            summary,
            disposition,
        })
    }
}

fn duplicate(field: IncidentField) -> PdfError {
    PdfError::Template(format!("{field} has more than one rule"))
}

/// A [`FieldRule`] with its value regex compiled.
#[derive(Debug, Clone)]
pub struct LabelRule {
    pub(crate) field: IncidentField,
    pub(crate) label: String,
    regex: Regex,
}

impl LabelRule {
    fn compile(rule: &FieldRule) -> Result<Self, PdfError> {
        if rule.label.is_empty() {
            return Err(PdfError::Template(format!("{} has an empty label", rule.field)));
        }
        let pattern = format!(r"{}\s*(?P<value>{})", regex::escape(&rule.label), rule.pattern);
        let regex = Regex::new(&pattern).map_err(|e| {
            PdfError::Template(format!("invalid pattern for {}: {e}", rule.field))
        })?;
        Ok(Self {
            field: rule.field,
            label: rule.label.clone(),
            regex,
        })
    }

    /// Returns `true` if `line` contains this rule's label.
    #[must_use]
    pub fn matches(&self, line: &str) -> bool {
        line.contains(&self.label)
    }

    /// Captures the trimmed value following the label, or an empty string
    /// when the label is present but the value does not match.
    #[must_use]
    pub fn capture<'a>(&self, line: &'a str) -> &'a str {
        self.regex
            .captures(line)
            .and_then(|caps| caps.name("value"))
            .map_or("", |m| m.as_str().trim())
    }
}

/// A [`ReportTemplate`] ready for parsing.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    pub(crate) anchor: String,
    noise_markers: Vec<String>,
    /// Single-line rules, in table order.
    pub(crate) rules: Vec<LabelRule>,
    pub(crate) summary: Option<LabelRule>,
    pub(crate) disposition: Option<LabelRule>,
}

impl Default for CompiledTemplate {
    fn default() -> Self {
        ReportTemplate::default()
            .compile()
            .unwrap_or_else(|_| unreachable!())
    }
}

impl CompiledTemplate {
    /// The anchor phrase.
    #[must_use]
    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    /// Returns `true` if `line` contains the anchor phrase.
    #[must_use]
    pub fn is_anchor(&self, line: &str) -> bool {
        line.contains(&self.anchor)
    }

    /// Returns `true` if `line` contains any noise marker.
    #[must_use]
    pub fn is_noise(&self, line: &str) -> bool {
        self.noise_markers.iter().any(|m| line.contains(m.as_str()))
    }
}
