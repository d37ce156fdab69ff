//! NR-15 annex catalog.
//!
//! Static reference data for the annexes of NR-15 (unhealthy activities and
//! operations): annex number, title, and whether the assessment is
//! quantitative or qualitative. The projector uses it to print annex titles;
//! the capture UI owns the full agent tables.

/// Assessment style an annex prescribes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnexKind {
    /// Measured against tolerance limits.
    Quantitative,
    /// Characterized by qualitative evaluation (handling, contact).
    Qualitative,
}

/// One catalog row.
#[derive(Debug, Clone, Copy)]
pub struct AnnexInfo {
    pub number: u32,
    pub title: &'static str,
    pub kind: AnnexKind,
}

pub const ANNEXES: &[AnnexInfo] = &[
    AnnexInfo { number: 1, title: "Tolerance limits for continuous or intermittent noise", kind: AnnexKind::Quantitative },
    AnnexInfo { number: 2, title: "Tolerance limits for impact noise", kind: AnnexKind::Quantitative },
    AnnexInfo { number: 3, title: "Tolerance limits for heat exposure", kind: AnnexKind::Quantitative },
    AnnexInfo { number: 5, title: "Ionizing radiation", kind: AnnexKind::Qualitative },
    AnnexInfo { number: 6, title: "Work under hyperbaric conditions", kind: AnnexKind::Qualitative },
    AnnexInfo { number: 7, title: "Non-ionizing radiation", kind: AnnexKind::Qualitative },
    AnnexInfo { number: 8, title: "Vibration", kind: AnnexKind::Quantitative },
    AnnexInfo { number: 9, title: "Cold", kind: AnnexKind::Qualitative },
    AnnexInfo { number: 10, title: "Humidity", kind: AnnexKind::Qualitative },
    AnnexInfo { number: 11, title: "Chemical agents with tolerance limits", kind: AnnexKind::Quantitative },
    AnnexInfo { number: 12, title: "Mineral dusts (asbestos)", kind: AnnexKind::Quantitative },
    AnnexInfo { number: 13, title: "Chemical agents (qualitative evaluation)", kind: AnnexKind::Qualitative },
    AnnexInfo { number: 14, title: "Biological agents", kind: AnnexKind::Qualitative },
];

/// Catalog title for an annex number, if known.
pub fn annex_title(number: u32) -> Option<&'static str> {
    ANNEXES.iter().find(|a| a.number == number).map(|a| a.title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_annexes() {
        assert_eq!(annex_title(3), Some("Tolerance limits for heat exposure"));
        // Annex 4 was revoked; it is not in the catalog.
        assert_eq!(annex_title(4), None);
    }
}
