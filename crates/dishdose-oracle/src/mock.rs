//! Offline oracle backed by a small hardcoded interaction table.
//!
//! All data here is fictional guidance for demos and tests. No external
//! system is contacted. Matching is case-insensitive substring matching on
//! both sides of the query; when several rows match, the most severe one
//! wins. Anything unmatched comes back `Safe` / `None`.

use async_trait::async_trait;
use tracing::debug;

use dishdose_contracts::{
    assessment::{AssessmentResult, InteractionStatus, SeverityLevel},
    error::OracleError,
};
use dishdose_core::traits::Oracle;

// ── Interaction table (mock) ──────────────────────────────────────────────────

struct Fixture {
    medications: &'static [&'static str],
    foods: &'static [&'static str],
    status: InteractionStatus,
    severity: SeverityLevel,
    details: &'static str,
    recommendations: &'static str,
    notes: &'static str,
}

const FIXTURES: &[Fixture] = &[
    Fixture {
        medications: &["warfarin", "coumadin"],
        foods: &["leafy green", "spinach", "kale", "broccoli", "greens"],
        status: InteractionStatus::Caution,
        severity: SeverityLevel::Moderate,
        details: "Leafy greens are rich in vitamin K, which counteracts the anticoagulant effect of warfarin.",
        recommendations: "Keep vitamin K intake consistent from day to day rather than avoiding greens. Tell your doctor before making large diet changes.",
        notes: "Your INR may need closer monitoring after diet changes.",
    },
    Fixture {
        medications: &["atorvastatin", "simvastatin", "lovastatin", "statin"],
        foods: &["grapefruit"],
        status: InteractionStatus::Warning,
        severity: SeverityLevel::Moderate,
        details: "Grapefruit blocks the enzyme that breaks down several statins, raising blood levels and the risk of muscle damage.",
        recommendations: "Avoid grapefruit and grapefruit juice, or ask your pharmacist about a statin that is not affected.",
        notes: "Report unexplained muscle pain or weakness to your doctor.",
    },
    Fixture {
        medications: &["lisinopril", "enalapril", "ramipril", "ace inhibitor"],
        foods: &["potassium", "banana", "salt substitute"],
        status: InteractionStatus::Caution,
        severity: SeverityLevel::Moderate,
        details: "ACE inhibitors reduce potassium excretion. Large amounts of potassium-rich food can raise blood potassium too far.",
        recommendations: "Eat potassium-rich foods in normal amounts and avoid potassium-based salt substitutes unless your doctor approves.",
        notes: "none",
    },
    Fixture {
        medications: &["metronidazole", "tinidazole"],
        foods: &["alcohol", "beer", "wine", "liquor"],
        status: InteractionStatus::Dangerous,
        severity: SeverityLevel::Severe,
        details: "Combining metronidazole with alcohol can cause a disulfiram-like reaction: flushing, vomiting, rapid heartbeat.",
        recommendations: "Do not drink alcohol during treatment and for at least 72 hours after the last dose.",
        notes: "Check labels of mouthwashes and syrups for hidden alcohol.",
    },
    Fixture {
        medications: &["tetracycline", "doxycycline", "ciprofloxacin"],
        foods: &["milk", "dairy", "cheese", "yogurt", "calcium"],
        status: InteractionStatus::Caution,
        severity: SeverityLevel::Minor,
        details: "Calcium binds to these antibiotics in the gut and reduces how much is absorbed.",
        recommendations: "Take the antibiotic at least 2 hours before or 6 hours after dairy products.",
        notes: "",
    },
    Fixture {
        medications: &["phenelzine", "tranylcypromine", "maoi"],
        foods: &["aged cheese", "cured meat", "tyramine"],
        status: InteractionStatus::Dangerous,
        severity: SeverityLevel::Severe,
        details: "MAO inhibitors prevent the breakdown of tyramine. Tyramine-rich foods can trigger a dangerous rise in blood pressure.",
        recommendations: "Avoid aged cheeses, cured meats, and other tyramine-rich foods while taking an MAOI and for two weeks after stopping.",
        notes: "Severe headache or chest pain after eating needs emergency care.",
    },
];

impl Fixture {
    fn matches(&self, medications: &str, food: &str) -> bool {
        self.medications.iter().any(|m| medications.contains(m))
            && self.foods.iter().any(|f| food.contains(f))
    }

    fn to_result(&self) -> AssessmentResult {
        AssessmentResult {
            status: self.status,
            severity: self.severity,
            details: self.details.to_string(),
            recommendations: self.recommendations.to_string(),
            notes: self.notes.to_string(),
        }
    }
}

fn no_known_interaction() -> AssessmentResult {
    AssessmentResult {
        status: InteractionStatus::Safe,
        severity: SeverityLevel::None,
        details: "No known interaction between these items was found in the offline table.".to_string(),
        recommendations: "Ask your pharmacist to confirm, since the offline table covers only a few common pairs.".to_string(),
        notes: "none".to_string(),
    }
}

// ── MockOracle ────────────────────────────────────────────────────────────────

/// Offline stand-in for the Gemini oracle.
#[derive(Debug, Clone, Default)]
pub struct MockOracle {
    failure: Option<OracleError>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// An oracle that answers every query with `error`.
    pub fn failing(error: OracleError) -> Self {
        Self {
            failure: Some(error),
        }
    }

    /// Look the pair up in the table without going through the async trait.
    pub fn lookup(medications: &str, food: &str) -> AssessmentResult {
        let medications = medications.to_lowercase();
        let food = food.to_lowercase();

        FIXTURES
            .iter()
            .filter(|f| f.matches(&medications, &food))
            .max_by_key(|f| (f.status, f.severity))
            .map(Fixture::to_result)
            .unwrap_or_else(no_known_interaction)
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn assess(&self, medications: &str, food: &str) -> Result<AssessmentResult, OracleError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        let result = Self::lookup(medications, food);
        debug!(status = %result.status, "mock oracle answered");
        Ok(result)
    }
}
