//! The prompt and response schemas sent to, and enforced on, the oracle.
//!
//! Two schemas live here. `request_schema` is the structured-output schema
//! in the Gemini dialect (upper-case type names, per-field descriptions);
//! the model is asked to follow it. `validation_schema` is a standard JSON
//! Schema applied to whatever actually comes back.

use serde_json::{json, Value};

use dishdose_contracts::assessment::{InteractionStatus, SeverityLevel};

/// Build the instruction text for one medication/food pair.
///
/// Both strings are embedded verbatim.
pub fn build_prompt(medications: &str, food: &str) -> String {
    format!(
        "You are a food-drug interaction advisor for the Dish & Dose application. \
Your job is to help people identify, understand, and manage interactions between \
their medications and the food or drink they consume.

Responsibilities:
1. Analyze the medication(s) and food/beverage given below.
2. Identify any food-drug interaction accurately.
3. Explain the interaction clearly, in patient-friendly language.
4. Give practical recommendations for safe use.
5. Assess the severity of the interaction.

Safety rules:
- Err on the side of caution and never minimize risk.
- Recommend consulting a healthcare professional for personalized advice.
- Say so when information is limited or uncertain.
- If the medication or food is not recognized, say so and recommend asking a pharmacist.

Query:
- Medication(s): {medications}
- Food/Beverage: {food}

Respond only with the structured JSON object described by the response schema. \
Do not wrap it in markdown.
"
    )
}

fn status_names() -> Vec<&'static str> {
    InteractionStatus::all().iter().map(|s| s.as_str()).collect()
}

fn severity_names() -> Vec<&'static str> {
    SeverityLevel::all().iter().map(|s| s.as_str()).collect()
}

/// The structured-output schema attached to the `generateContent` request.
pub fn request_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "interactionStatus": {
                "type": "STRING",
                "description": "Overall status of the interaction.",
                "enum": status_names(),
            },
            "severityLevel": {
                "type": "STRING",
                "description": "Severity of the interaction.",
                "enum": severity_names(),
            },
            "interactionDetails": {
                "type": "STRING",
                "description": "Patient-friendly explanation of what happens when the two are combined and why. One paragraph.",
            },
            "recommendations": {
                "type": "STRING",
                "description": "Actionable advice: timing, dietary alternatives, when to consult a professional.",
            },
            "additionalNotes": {
                "type": "STRING",
                "description": "Special considerations or related interactions. Empty or 'None' if not applicable.",
            },
        },
        "required": [
            "interactionStatus",
            "severityLevel",
            "interactionDetails",
            "recommendations",
            "additionalNotes",
        ],
    })
}

/// The JSON Schema every oracle answer must satisfy before it is trusted.
///
/// `additionalNotes` is optional here: its absence means "no notes".
pub fn validation_schema() -> Value {
    json!({
        "type": "object",
        "required": [
            "interactionStatus",
            "severityLevel",
            "interactionDetails",
            "recommendations",
        ],
        "properties": {
            "interactionStatus": { "type": "string", "enum": status_names() },
            "severityLevel": { "type": "string", "enum": severity_names() },
            "interactionDetails": { "type": "string" },
            "recommendations": { "type": "string" },
            "additionalNotes": { "type": "string" },
        },
    })
}
