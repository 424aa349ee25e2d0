//! The oracle's structured answer for one medication/food pair.
//!
//! Both `InteractionStatus` and `SeverityLevel` are supplied by the oracle
//! independently; neither is derived from the other.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Overall verdict tier, ordered from least to most concerning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InteractionStatus {
    Safe,
    Caution,
    Warning,
    Dangerous,
}

impl InteractionStatus {
    /// The wire spelling used by the oracle and the persisted history.
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionStatus::Safe => "Safe",
            InteractionStatus::Caution => "Caution",
            InteractionStatus::Warning => "Warning",
            InteractionStatus::Dangerous => "Dangerous",
        }
    }

    /// Every variant in severity order. Used to build the oracle response schema.
    pub fn all() -> [InteractionStatus; 4] {
        [
            InteractionStatus::Safe,
            InteractionStatus::Caution,
            InteractionStatus::Warning,
            InteractionStatus::Dangerous,
        ]
    }

    /// A short glyph a presentation layer can use in place of an icon.
    pub fn symbol(&self) -> &'static str {
        match self {
            InteractionStatus::Safe => "[ok]",
            InteractionStatus::Caution => "[~]",
            InteractionStatus::Warning => "[!]",
            InteractionStatus::Dangerous => "[!!]",
        }
    }
}

impl fmt::Display for InteractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clinical severity of the interaction, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeverityLevel {
    None,
    Minor,
    Moderate,
    Severe,
}

impl SeverityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityLevel::None => "None",
            SeverityLevel::Minor => "Minor",
            SeverityLevel::Moderate => "Moderate",
            SeverityLevel::Severe => "Severe",
        }
    }

    pub fn all() -> [SeverityLevel; 4] {
        [
            SeverityLevel::None,
            SeverityLevel::Minor,
            SeverityLevel::Moderate,
            SeverityLevel::Severe,
        ]
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete assessment as returned by the oracle.
///
/// Field names on the wire follow the oracle's JSON contract
/// (`interactionStatus`, `severityLevel`, ...), which is also the shape
/// embedded verbatim in every persisted history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentResult {
    #[serde(rename = "interactionStatus")]
    pub status: InteractionStatus,

    #[serde(rename = "severityLevel")]
    pub severity: SeverityLevel,

    /// Patient-facing explanation of what happens when the two are combined.
    #[serde(rename = "interactionDetails")]
    pub details: String,

    /// Actionable guidance: timing, alternatives, when to ask a professional.
    pub recommendations: String,

    /// Optional extra notes. Empty and `"none"` both mean "no notes".
    #[serde(rename = "additionalNotes", default)]
    pub notes: String,
}

impl AssessmentResult {
    /// The additional notes, or `None` when the oracle left them blank or
    /// wrote the literal `"none"` in any letter case.
    pub fn notes(&self) -> Option<&str> {
        let trimmed = self.notes.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(trimmed)
        }
    }
}
