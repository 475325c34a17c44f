//! Medicine details extraction from backend output.
//!
//! The backend reply is untrusted: it is parsed into an all-optional raw shape
//! first, and only turned into a [`MedicineInfo`] once the required fields are
//! confirmed present.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::query::Composition;

/// Extraction errors.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// A medical store stocking the generic version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
}

/// Structured details for one medicine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MedicineInfo {
    pub brand_name: String,
    pub generic_name: String,
    pub public_name: String,
    /// Order as returned by the backend
    pub composition: Vec<Composition>,
    pub dosage: String,
    pub timing: String,
    /// Pre-formatted, e.g. "₹30 for 15 tablets"
    pub brand_price: String,
    pub generic_price: String,
    pub available_at: Vec<Store>,
}

impl MedicineInfo {
    /// Identity used for de-duplication: brand and generic names both match.
    pub fn same_medicine(&self, other: &MedicineInfo) -> bool {
        self.brand_name == other.brand_name && self.generic_name == other.generic_name
    }

    /// Whether any listed store is in the given state (case-insensitive).
    pub fn has_store_in_state(&self, state: &str) -> bool {
        let state = state.trim().to_lowercase();
        self.available_at
            .iter()
            .any(|s| s.state.trim().to_lowercase() == state)
    }
}

/// Response exactly as received; nothing is trusted yet.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMedicineInfo {
    brand_name: Option<String>,
    generic_name: Option<String>,
    public_name: Option<String>,
    composition: Option<Vec<Composition>>,
    dosage: Option<String>,
    timing: Option<String>,
    brand_price: Option<String>,
    generic_price: Option<String>,
    available_at: Option<Vec<Store>>,
}

impl TryFrom<RawMedicineInfo> for MedicineInfo {
    type Error = ExtractionError;

    fn try_from(raw: RawMedicineInfo) -> Result<Self, Self::Error> {
        let generic_name = raw
            .generic_name
            .filter(|name| !name.trim().is_empty())
            .ok_or(ExtractionError::MissingField("genericName"))?;
        let composition = raw
            .composition
            .ok_or(ExtractionError::MissingField("composition"))?;

        Ok(MedicineInfo {
            brand_name: raw.brand_name.unwrap_or_default(),
            generic_name,
            public_name: raw.public_name.unwrap_or_default(),
            composition,
            dosage: raw.dosage.unwrap_or_default(),
            timing: raw.timing.unwrap_or_default(),
            brand_price: raw.brand_price.unwrap_or_default(),
            generic_price: raw.generic_price.unwrap_or_default(),
            available_at: raw.available_at.unwrap_or_default(),
        })
    }
}

/// Parse backend output into validated medicine details.
pub fn parse_medicine_output(text: &str) -> ExtractionResult<MedicineInfo> {
    // Tolerate prose or a code fence around the object
    let json_start = text.find('{').ok_or_else(|| {
        ExtractionError::InvalidFormat("No JSON object found in response".into())
    })?;
    let json_end = text.rfind('}').ok_or_else(|| {
        ExtractionError::InvalidFormat("No closing brace found in response".into())
    })?;
    if json_end < json_start {
        return Err(ExtractionError::InvalidFormat(
            "Closing brace precedes opening brace".into(),
        ));
    }

    let raw: RawMedicineInfo = serde_json::from_str(&text[json_start..=json_end])?;
    raw.try_into()
}
