//! Saved medicine entries.

use serde::{Deserialize, Serialize};

use super::{MedicineInfo, SearchDatabase};

/// A medicine the user saved, with the database it was found in.
///
/// Serializes as the medicine's own fields plus `database` and `savedAt`, so a
/// list written before those fields existed still loads (as `general`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedMedicine {
    #[serde(flatten)]
    pub medicine: MedicineInfo,
    /// Search context the medicine was found under
    #[serde(default)]
    pub database: SearchDatabase,
    /// When the entry was saved (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
}

impl SavedMedicine {
    /// Create a new entry stamped with the current time.
    pub fn new(medicine: MedicineInfo, database: SearchDatabase) -> Self {
        Self {
            medicine,
            database,
            saved_at: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// Same (brand name, generic name) as the given medicine.
    pub fn matches(&self, medicine: &MedicineInfo) -> bool {
        self.medicine.same_medicine(medicine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Composition;

    fn medicine() -> MedicineInfo {
        MedicineInfo {
            brand_name: "Crocin".into(),
            generic_name: "Paracetamol".into(),
            public_name: "Calpol".into(),
            composition: vec![Composition::new("Paracetamol", "500mg")],
            dosage: "One tablet".into(),
            timing: "After meals".into(),
            brand_price: "₹25".into(),
            generic_price: "₹10".into(),
            available_at: vec![],
        }
    }

    #[test]
    fn test_flattened_serialization() {
        let saved = SavedMedicine::new(medicine(), SearchDatabase::DavaIndia);
        let value = serde_json::to_value(&saved).unwrap();
        assert_eq!(value["brandName"], "Crocin");
        assert_eq!(value["database"], "dava");
        assert!(value["savedAt"].is_string());
    }

    #[test]
    fn test_plain_medicine_json_loads_as_general() {
        let json = serde_json::to_string(&medicine()).unwrap();
        let saved: SavedMedicine = serde_json::from_str(&json).unwrap();
        assert_eq!(saved.medicine, medicine());
        assert_eq!(saved.database, SearchDatabase::General);
        assert_eq!(saved.saved_at, None);
    }

    #[test]
    fn test_matches_identity() {
        let saved = SavedMedicine::new(medicine(), SearchDatabase::General);
        let mut other = medicine();
        other.generic_price = "₹12".into();
        assert!(saved.matches(&other));
        other.generic_name = "Acetaminophen".into();
        assert!(!saved.matches(&other));
    }
}
