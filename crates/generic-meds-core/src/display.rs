//! Display model for a medicine result.
//!
//! Front-ends render a [`MedicineView`]; they never inspect the search context
//! themselves. The vendor-scoped database changes the price panel and the store
//! section title, nothing else.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::{MedicineInfo, SearchDatabase, Store};
use generic_meds_llm::MANDATED_STATE;

/// Shown beneath every result.
pub const DISCLAIMER: &str = "This tool is powered by AI and is for informational purposes only. It is not a substitute for professional medical advice. Always consult with a qualified healthcare provider before making any decisions about your health or medications.";

/// Indian states offered by the store locator, with their capitals. Sorted by state.
pub const INDIAN_STATES: &[(&str, &str)] = &[
    ("Andhra Pradesh", "Amaravati"),
    ("Arunachal Pradesh", "Itanagar"),
    ("Assam", "Dispur"),
    ("Bihar", "Patna"),
    ("Chhattisgarh", "Raipur"),
    ("Goa", "Panaji"),
    ("Gujarat", "Gandhinagar"),
    ("Haryana", "Chandigarh"),
    ("Himachal Pradesh", "Shimla"),
    ("Jharkhand", "Ranchi"),
    ("Karnataka", "Bengaluru"),
    ("Kerala", "Thiruvananthapuram"),
    ("Madhya Pradesh", "Bhopal"),
    ("Maharashtra", "Mumbai"),
    ("Manipur", "Imphal"),
    ("Meghalaya", "Shillong"),
    ("Mizoram", "Aizawl"),
    ("Nagaland", "Kohima"),
    ("Odisha", "Bhubaneswar"),
    ("Punjab", "Chandigarh"),
    ("Rajasthan", "Jaipur"),
    ("Sikkim", "Gangtok"),
    ("Tamil Nadu", "Chennai"),
    ("Telangana", "Hyderabad"),
    ("Tripura", "Agartala"),
    ("Uttar Pradesh", "Lucknow"),
    ("Uttarakhand", "Dehradun"),
    ("West Bengal", "Kolkata"),
];

/// Capital city of a state, if it is a known Indian state.
pub fn state_capital(state: &str) -> Option<&'static str> {
    INDIAN_STATES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(state.trim()))
        .map(|(_, capital)| *capital)
}

/// Cities to offer for a state: every store city there plus the capital, sorted.
pub fn cities_for_state(stores: &[Store], state: &str) -> Vec<String> {
    if state.trim().is_empty() {
        return Vec::new();
    }
    let mut cities: BTreeSet<String> = stores
        .iter()
        .filter(|s| s.state == state)
        .map(|s| s.city.clone())
        .collect();
    if let Some(capital) = state_capital(state) {
        cities.insert(capital.to_string());
    }
    cities.into_iter().collect()
}

/// Stores matching the optional state and city filters.
pub fn filter_stores<'a>(
    stores: &'a [Store],
    state: Option<&str>,
    city: Option<&str>,
) -> Vec<&'a Store> {
    let state = state.filter(|s| !s.is_empty());
    let city = city.filter(|c| !c.is_empty());
    stores
        .iter()
        .filter(|store| state.map_or(true, |s| store.state == s))
        .filter(|store| city.map_or(true, |c| store.city == c))
        .collect()
}

/// Price section of a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PricePanel {
    /// Brand and generic price side by side
    Comparison {
        brand_price: String,
        generic_price: String,
    },
    /// Single price at the vendor chain
    Vendor { chain: String, price: String },
}

/// Everything a front-end needs to render one result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedicineView {
    pub brand_name: String,
    pub generic_name: String,
    /// Common generic brand, omitted when blank
    pub public_name: Option<String>,
    /// "Ingredient (strength)" per row
    pub composition_lines: Vec<String>,
    pub dosage: String,
    pub timing: String,
    pub price_title: String,
    pub price_panel: PricePanel,
    pub store_title: String,
    pub stores: Vec<Store>,
    /// Whether a store in the mandated state was listed (advisory only)
    pub mandated_state_present: bool,
}

impl MedicineView {
    pub fn new(medicine: &MedicineInfo, database: SearchDatabase) -> Self {
        let (price_title, price_panel, store_title) = match database.store_chain_name() {
            Some(chain) => (
                format!("Price at {} (Approx. in INR)", chain),
                PricePanel::Vendor {
                    chain: chain.to_string(),
                    price: medicine.generic_price.clone(),
                },
                format!("{} Store Availability", chain),
            ),
            None => (
                "Price Comparison (Approx. in INR)".to_string(),
                PricePanel::Comparison {
                    brand_price: medicine.brand_price.clone(),
                    generic_price: medicine.generic_price.clone(),
                },
                "Fictional Store Availability".to_string(),
            ),
        };

        let public_name = Some(medicine.public_name.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        Self {
            brand_name: medicine.brand_name.clone(),
            generic_name: medicine.generic_name.clone(),
            public_name,
            composition_lines: medicine
                .composition
                .iter()
                .map(|c| format!("{} ({})", c.ingredient, c.strength))
                .collect(),
            dosage: medicine.dosage.clone(),
            timing: medicine.timing.clone(),
            price_title,
            price_panel,
            store_title,
            stores: medicine.available_at.clone(),
            mandated_state_present: medicine.has_store_in_state(MANDATED_STATE),
        }
    }

    /// Stores after applying the locator filters.
    pub fn filtered_stores(&self, state: Option<&str>, city: Option<&str>) -> Vec<&Store> {
        filter_stores(&self.stores, state, city)
    }
}
