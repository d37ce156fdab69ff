//! # Inspection Record Model
//!
//! The input representation for document generation. An inspection record is
//! owned by the host application's store and is read-only here: the whole
//! pipeline is a pure projection from this record to output bytes, and never
//! mutates it.
//!
//! The shape mirrors what the capture UI collects: identifying fields, a
//! participant roster (with optional canvas signatures), a photo gallery,
//! and NR-15 occupational-risk assessments with per-agent evaluations.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionStatus {
    #[default]
    Draft,
    InProgress,
    Completed,
}

impl InspectionStatus {
    /// Short uppercase label, as printed in the document footer.
    pub fn label(&self) -> &'static str {
        match self {
            InspectionStatus::Draft => "DRAFT",
            InspectionStatus::InProgress => "IN PROGRESS",
            InspectionStatus::Completed => "COMPLETED",
        }
    }

    /// Sentence form used in the document body.
    pub fn description(&self) -> &'static str {
        match self {
            InspectionStatus::Draft => "Inspection draft",
            InspectionStatus::InProgress => "Inspection in progress",
            InspectionStatus::Completed => "Inspection completed",
        }
    }
}

/// A person taking part in the inspection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Job role, e.g. "Engineer".
    pub role: String,
    /// Employer or organization.
    pub company: String,
    #[serde(default)]
    pub email: String,
    /// Captured signature as a base64 payload or data URL, if signed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Participant {
    pub fn is_signed(&self) -> bool {
        self.signature.as_deref().is_some_and(|s| !s.trim().is_empty())
    }
}

/// A photo captured during the inspection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    #[serde(default)]
    pub id: String,
    /// Image payload as a base64 string or data URL.
    pub data_url: String,
    #[serde(default)]
    pub caption: String,
    /// ISO-8601 capture timestamp.
    #[serde(default)]
    pub created_at: String,
    /// Optional field association, e.g. "nr15-annex-3".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Evaluation of one agent within an NR-15 annex.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentEvaluation {
    pub agent_id: String,
    /// Whether the agent was identified at the assessed site.
    #[serde(default)]
    pub identified: bool,
    #[serde(default)]
    pub measured_value: String,
    /// Above the tolerance limit: true/false, or `None` when not measured.
    #[serde(default)]
    pub above_limit: Option<bool>,
    #[serde(default)]
    pub ppe_provided: bool,
    #[serde(default)]
    pub ppe_worn: bool,
    #[serde(default)]
    pub ppe_description: String,
    #[serde(default)]
    pub observations: String,
}

/// Assessment of one NR-15 annex (occupational insalubrity category).
///
/// `applies` is tri-state: `Some(true)` the annex applies at this site,
/// `Some(false)` it does not, `None` it has not been evaluated yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nr15Assessment {
    pub annex_number: u32,
    #[serde(default)]
    pub applies: Option<bool>,
    #[serde(default)]
    pub agents: Vec<AgentEvaluation>,
    #[serde(default)]
    pub assessment_site: String,
    #[serde(default)]
    pub activities_described: String,
    #[serde(default)]
    pub ppe_used: String,
    #[serde(default)]
    pub measurements: String,
    #[serde(default)]
    pub exposure_time: String,
    #[serde(default)]
    pub conclusion: String,
    #[serde(default)]
    pub observations: String,
}

impl Nr15Assessment {
    /// Agents marked as identified at the site.
    pub fn identified_agents(&self) -> impl Iterator<Item = &AgentEvaluation> {
        self.agents.iter().filter(|a| a.identified)
    }
}

/// A complete field-inspection record, ready for document generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    #[serde(default)]
    pub id: String,
    pub title: String,
    /// Inspection kind, e.g. "Insalubrity survey".
    #[serde(default)]
    pub kind: String,
    pub address: String,
    /// Tower/unit within the site, when the site has more than one.
    #[serde(default)]
    pub unit: String,
    /// Person responsible for the inspection.
    pub responsible: String,
    /// ISO-8601 date of the survey visit.
    pub survey_date: String,
    #[serde(default)]
    pub observations: String,
    #[serde(default)]
    pub status: InspectionStatus,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    #[serde(default)]
    pub nr15_assessments: Vec<Nr15Assessment>,
    #[serde(default)]
    pub nr15_observations: String,
    #[serde(default)]
    pub sectors_evaluated: String,
    #[serde(default)]
    pub activities_description: String,
    #[serde(default)]
    pub epcs_identified: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Inspection {
    pub fn has_photos(&self) -> bool {
        !self.photos.is_empty()
    }

    pub fn has_signed_participant(&self) -> bool {
        self.participants.iter().any(Participant::is_signed)
    }
}
