//! The example pairs offered to first-time users.

/// A ready-made medication/food pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExampleQuery {
    pub medications: &'static str,
    pub food: &'static str,
}

pub static EXAMPLE_QUERIES: [ExampleQuery; 4] = [
    ExampleQuery { medications: "Warfarin", food: "Leafy greens" },
    ExampleQuery { medications: "Atorvastatin", food: "Grapefruit juice" },
    ExampleQuery { medications: "Lisinopril", food: "Potassium-rich foods" },
    ExampleQuery { medications: "Metronidazole", food: "Alcohol" },
];
