//! Business-rule validation of inspection records.
//!
//! This is validation of the *data*, independent of any template: blocking
//! errors prevent document generation outright, warnings inform the user but
//! allow generation, notes are summary information. The assembler runs this
//! before touching any template bytes.
//!
//! The NR-15 annex rules encode regulatory policy: when an annex is marked
//! as applicable, its descriptive fields and at least one identified agent
//! become mandatory. Confirm these against the current NR-15 text before
//! relying on them in production.

use crate::model::{Inspection, Nr15Assessment};

/// Classified findings from validating one record.
///
/// `is_valid()` is true iff `errors` is empty; warnings and notes never
/// affect validity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Blocking errors. Generation must not proceed while non-empty.
    pub errors: Vec<String>,
    /// Findings the user should review; generation proceeds.
    pub warnings: Vec<String>,
    /// Informational notes (counts, tallies).
    pub notes: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Human-readable summary, grouped by severity.
    pub fn summary(&self) -> String {
        if self.errors.is_empty() && self.warnings.is_empty() && self.notes.is_empty() {
            return "All data is complete; the document can be generated.".to_string();
        }

        let mut out = String::new();
        if !self.errors.is_empty() {
            out.push_str("BLOCKING ERRORS (the document cannot be generated until these are fixed):\n");
            for e in &self.errors {
                out.push_str("  - ");
                out.push_str(e);
                out.push('\n');
            }
        }
        if !self.warnings.is_empty() {
            out.push_str("WARNINGS (the document can be generated, but review these):\n");
            for w in &self.warnings {
                out.push_str("  - ");
                out.push_str(w);
                out.push('\n');
            }
        }
        if !self.notes.is_empty() {
            out.push_str("NOTES:\n");
            for n in &self.notes {
                out.push_str("  - ");
                out.push_str(n);
                out.push('\n');
            }
        }
        out.trim_end().to_string()
    }
}

/// Validate an inspection record for document generation.
///
/// Collects every blocking error found, not just the first, so the caller
/// can show a complete actionable list. Pure and idempotent.
pub fn validate_inspection(inspection: &Inspection) -> ValidationReport {
    let mut report = ValidationReport::default();

    // Required identifying fields.
    if inspection.title.trim().is_empty() {
        report.errors.push("Inspection title has not been filled in".to_string());
    }
    if inspection.address.trim().is_empty() {
        report.errors.push("Inspection address has not been filled in".to_string());
    }
    if inspection.responsible.trim().is_empty() {
        report
            .errors
            .push("Person responsible for the inspection has not been filled in".to_string());
    }
    if inspection.survey_date.trim().is_empty() {
        report.errors.push("Survey date has not been filled in".to_string());
    }

    // Participants: at least one is mandatory.
    if inspection.participants.is_empty() {
        report.errors.push(
            "No participant has been registered. Add at least one participant to the inspection"
                .to_string(),
        );
    } else {
        let unsigned = inspection
            .participants
            .iter()
            .filter(|p| !p.is_signed())
            .count();
        if unsigned > 0 {
            report.warnings.push(format!(
                "{unsigned} participant(s) have not signed yet. The document can be generated, but consider collecting the signatures."
            ));
        }
        report
            .notes
            .push(format!("Total participants: {}", inspection.participants.len()));
    }

    // NR-15 annexes marked applicable must be complete.
    for assessment in &inspection.nr15_assessments {
        let (errors, warnings) = validate_annex(assessment);
        report.errors.extend(errors);
        report.warnings.extend(warnings);
    }
    if !inspection.nr15_assessments.is_empty() {
        let applies = count_applies(&inspection.nr15_assessments, Some(true));
        let not_applies = count_applies(&inspection.nr15_assessments, Some(false));
        let unevaluated = count_applies(&inspection.nr15_assessments, None);
        if applies > 0 {
            report.notes.push(format!("{applies} NR-15 annex(es) marked as applicable"));
        }
        if not_applies > 0 {
            report
                .notes
                .push(format!("{not_applies} NR-15 annex(es) marked as not applicable"));
        }
        if unevaluated > 0 {
            report
                .notes
                .push(format!("{unevaluated} NR-15 annex(es) not evaluated yet"));
        }
    }

    // Photos: captions are recommended, never required.
    if !inspection.photos.is_empty() {
        let uncaptioned = inspection
            .photos
            .iter()
            .filter(|p| p.caption.trim().is_empty())
            .count();
        if uncaptioned > 0 {
            report.warnings.push(format!(
                "{uncaptioned} photo(s) have no caption yet. Consider adding descriptive captions."
            ));
        }
        report.notes.push(format!("Total photos: {}", inspection.photos.len()));
    }

    report
}

/// Validate a single NR-15 annex assessment.
///
/// Only annexes marked `applies == Some(true)` are checked; not-applicable
/// and unevaluated annexes produce no findings.
pub fn validate_annex(assessment: &Nr15Assessment) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if assessment.applies != Some(true) {
        return (errors, warnings);
    }

    let annex = assessment.annex_number;
    if assessment.assessment_site.trim().is_empty() {
        errors.push(format!(
            "NR-15 annex {annex}: \"Assessment site\" is required when the annex is applicable"
        ));
    }
    if assessment.activities_described.trim().is_empty() {
        errors.push(format!(
            "NR-15 annex {annex}: \"Activities described\" is required when the annex is applicable"
        ));
    }
    if assessment.ppe_used.trim().is_empty() {
        errors.push(format!(
            "NR-15 annex {annex}: \"PPE in use\" is required when the annex is applicable"
        ));
    }

    let identified = assessment.identified_agents().count();
    if identified == 0 {
        errors.push(format!(
            "NR-15 annex {annex}: no agent was marked as identified. Mark at least one agent or set the annex to not applicable."
        ));
    }
    if identified > 0 && assessment.conclusion.trim().is_empty() {
        errors.push(format!(
            "NR-15 annex {annex}: \"Conclusion\" is required once agents have been identified"
        ));
    }

    let unmeasured = assessment
        .identified_agents()
        .filter(|a| a.measured_value.trim().is_empty())
        .count();
    if unmeasured > 0 {
        warnings.push(format!(
            "NR-15 annex {annex}: {unmeasured} identified agent(s) have no measured value. Consider adding the measurements."
        ));
    }
    let without_ppe_description = assessment
        .identified_agents()
        .filter(|a| a.ppe_description.trim().is_empty())
        .count();
    if identified > 0 && without_ppe_description > 0 {
        warnings.push(format!(
            "NR-15 annex {annex}: some identified agents have no PPE description"
        ));
    }

    (errors, warnings)
}

fn count_applies(assessments: &[Nr15Assessment], state: Option<bool>) -> usize {
    assessments.iter().filter(|a| a.applies == state).count()
}
