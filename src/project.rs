//! # Data Projector
//!
//! Maps an inspection record into the [`BindingContext`] the template
//! renderer consumes: scalar placeholders, derived/formatted fields, and
//! the participants / signatures / photos / annexes loops. Pure function,
//! no I/O; the stored record is never modified (dates stay ISO in the
//! record, only the projected copy is display-formatted).

use crate::binding::BindingContext;
use crate::image::ImageToken;
use crate::model::{Inspection, Nr15Assessment, Participant, Photo};
use crate::nr15;

/// Display form of a tri-state applicability flag.
pub fn applicability_label(applies: Option<bool>) -> &'static str {
    match applies {
        Some(true) => "Applies",
        Some(false) => "Does not apply",
        None => "Not evaluated",
    }
}

/// Format an ISO-8601 date (`YYYY-MM-DD`, optionally with a time suffix)
/// as `DD/MM/YYYY`. Unparseable input is returned unchanged rather than
/// dropped: a half-filled date is still more useful on paper than a blank.
pub fn format_display_date(iso: &str) -> String {
    let date_part = iso.split('T').next().unwrap_or(iso);
    let mut parts = date_part.splitn(3, '-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(y), Some(m), Some(d))
            if y.len() == 4
                && !m.is_empty()
                && !d.is_empty()
                && y.chars().all(|c| c.is_ascii_digit())
                && m.chars().all(|c| c.is_ascii_digit())
                && d.chars().all(|c| c.is_ascii_digit()) =>
        {
            format!("{:0>2}/{:0>2}/{y}", d, m)
        }
        _ => iso.to_string(),
    }
}

/// One participant per line, "Name (Role) - Company".
fn participants_summary(participants: &[Participant]) -> String {
    if participants.is_empty() {
        return "No participants added".to_string();
    }
    participants
        .iter()
        .map(|p| format!("{} ({}) - {}", p.name, p.role, p.company))
        .collect::<Vec<_>>()
        .join("\n")
}

fn or_default(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Build the binding context for a record.
///
/// `generated_on` is the ISO date of generation, supplied by the caller so
/// the projection itself stays clock-free.
pub fn project(inspection: &Inspection, generated_on: &str) -> BindingContext {
    let mut ctx = BindingContext::new();

    // Identifying scalars.
    ctx.set_scalar("title", &inspection.title);
    ctx.set_scalar("kind", &inspection.kind);
    ctx.set_scalar("address", &inspection.address);
    ctx.set_scalar("unit", &inspection.unit);
    ctx.set_scalar("responsible", &inspection.responsible);
    ctx.set_scalar("surveyDate", format_display_date(&inspection.survey_date));
    ctx.set_scalar("generationDate", format_display_date(generated_on));
    ctx.set_scalar("observations", or_default(&inspection.observations, "No observations"));

    // Status.
    ctx.set_scalar("status", inspection.status.label());
    ctx.set_scalar("statusText", inspection.status.description());

    // NR-15 free-text sections.
    ctx.set_scalar("sectorsEvaluated", or_default(&inspection.sectors_evaluated, "Not filled in"));
    ctx.set_scalar(
        "activitiesDescription",
        or_default(&inspection.activities_description, "Not filled in"),
    );
    ctx.set_scalar("epcsIdentified", or_default(&inspection.epcs_identified, "Not filled in"));
    ctx.set_scalar("nr15Observations", or_default(&inspection.nr15_observations, "No observations"));

    // Derived counts.
    ctx.set_scalar("participantCount", inspection.participants.len().to_string());
    ctx.set_scalar("photoCount", inspection.photos.len().to_string());
    let applies_count = inspection
        .nr15_assessments
        .iter()
        .filter(|a| a.applies == Some(true))
        .count();
    ctx.set_scalar("appliesCount", applies_count.to_string());

    // Flat participant listing for templates without loop support.
    ctx.set_scalar("participantsSummary", participants_summary(&inspection.participants));

    // Loops.
    ctx.set_list(
        "participants",
        inspection.participants.iter().map(project_participant).collect(),
    );
    ctx.set_list(
        "signatures",
        inspection
            .participants
            .iter()
            .filter(|p| p.is_signed())
            .map(project_participant)
            .collect(),
    );
    ctx.set_list("photos", inspection.photos.iter().map(project_photo).collect());
    ctx.set_list(
        "annexes",
        inspection.nr15_assessments.iter().map(project_annex).collect(),
    );

    ctx
}

fn project_participant(p: &Participant) -> BindingContext {
    let mut ctx = BindingContext::new();
    ctx.set_scalar("name", &p.name);
    ctx.set_scalar("role", &p.role);
    ctx.set_scalar("company", &p.company);
    ctx.set_scalar("email", &p.email);
    // Only a decodable signature becomes an image binding; an absent or
    // broken one leaves the key out entirely.
    if let Some(token) = p.signature.as_deref().and_then(ImageToken::normalize) {
        ctx.set_image("signature", token);
    }
    ctx
}

fn project_photo(photo: &Photo) -> BindingContext {
    let mut ctx = BindingContext::new();
    let caption = if photo.caption.trim().is_empty() {
        format!("Photo - {}", format_display_date(&photo.created_at))
    } else {
        photo.caption.clone()
    };
    ctx.set_scalar("caption", caption);
    ctx.set_scalar("takenAt", format_display_date(&photo.created_at));
    if let Some(token) = ImageToken::normalize(&photo.data_url) {
        ctx.set_image("image", token);
    }
    ctx
}

fn project_annex(assessment: &Nr15Assessment) -> BindingContext {
    let mut ctx = BindingContext::new();
    ctx.set_scalar("annexNumber", assessment.annex_number.to_string());
    ctx.set_scalar(
        "annexTitle",
        nr15::annex_title(assessment.annex_number).unwrap_or(""),
    );
    ctx.set_scalar("applicability", applicability_label(assessment.applies));
    ctx.set_scalar("assessmentSite", &assessment.assessment_site);
    ctx.set_scalar("activitiesDescribed", &assessment.activities_described);
    ctx.set_scalar("ppeUsed", &assessment.ppe_used);
    ctx.set_scalar("measurements", &assessment.measurements);
    ctx.set_scalar("exposureTime", &assessment.exposure_time);
    ctx.set_scalar("conclusion", &assessment.conclusion);
    ctx.set_scalar("observations", &assessment.observations);
    ctx.set_scalar(
        "identifiedAgentCount",
        assessment.identified_agents().count().to_string(),
    );
    ctx.set_list(
        "agents",
        assessment
            .agents
            .iter()
            .map(|agent| {
                let mut a = BindingContext::new();
                a.set_scalar("agentId", &agent.agent_id);
                a.set_scalar("identified", if agent.identified { "Yes" } else { "No" });
                a.set_scalar("measuredValue", &agent.measured_value);
                a.set_scalar(
                    "aboveLimit",
                    match agent.above_limit {
                        Some(true) => "Above limit",
                        Some(false) => "Within limit",
                        None => "Not measured",
                    },
                );
                a.set_scalar("ppeDescription", &agent.ppe_description);
                a.set_scalar("observations", &agent.observations);
                a
            })
            .collect(),
    );
    ctx
}
