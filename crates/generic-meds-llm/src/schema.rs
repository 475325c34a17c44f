//! Response schema the backend is constrained to.

use serde_json::{json, Value};

/// Fields every response must declare.
pub const MEDICINE_REQUIRED_FIELDS: &[&str] = &[
    "brandName",
    "genericName",
    "publicName",
    "composition",
    "dosage",
    "timing",
    "brandPrice",
    "genericPrice",
    "availableAt",
];

/// OpenAPI-subset schema for `MedicineInfo`, in the form `generationConfig.responseSchema` expects.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "brandName": {
                "type": "STRING",
                "description": "The brand name of the medicine identified from the user query."
            },
            "genericName": {
                "type": "STRING",
                "description": "The active pharmaceutical ingredient or generic name of the medicine."
            },
            "publicName": {
                "type": "STRING",
                "description": "A commonly known brand name for the generic version of this medicine available in the Indian market."
            },
            "composition": {
                "type": "ARRAY",
                "description": "A list of all active ingredients and their respective strengths (e.g., '500mg').",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "ingredient": { "type": "STRING", "description": "Name of the active ingredient." },
                        "strength": { "type": "STRING", "description": "Strength of the ingredient." }
                    },
                    "required": ["ingredient", "strength"]
                }
            },
            "dosage": {
                "type": "STRING",
                "description": "General recommended dosage for an adult, e.g., 'One tablet twice a day'."
            },
            "timing": {
                "type": "STRING",
                "description": "Recommended timing for dosage, e.g., 'After meals'."
            },
            "brandPrice": {
                "type": "STRING",
                "description": "Estimated price for the brand name medicine in India, formatted as '₹XXX for Y units'."
            },
            "genericPrice": {
                "type": "STRING",
                "description": "Estimated price for the generic version in India, formatted as '₹XXX for Y units'."
            },
            "availableAt": {
                "type": "ARRAY",
                "description": "A list of 5 fictional but realistic-sounding medical stores in various major cities and states in India where the generic version could be found. At least one store must be located in Tripura.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING", "description": "Fictional name of the medical store." },
                        "city": { "type": "STRING", "description": "City where the store is located." },
                        "state": { "type": "STRING", "description": "State where the store is located." },
                        "address": { "type": "STRING", "description": "Fictional street address of the store." }
                    },
                    "required": ["name", "city", "state", "address"]
                }
            }
        },
        "required": MEDICINE_REQUIRED_FIELDS
    })
}
