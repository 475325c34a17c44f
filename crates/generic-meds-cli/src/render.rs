//! Plain-text rendering of results and the saved list.

use std::fmt::Write;

use generic_meds_core::display::INDIAN_STATES;
use generic_meds_core::{MedicineView, PricePanel, SavedMedicines, DISCLAIMER};

/// Full result card, with stores narrowed by the locator filters.
pub fn render_view(view: &MedicineView, state: Option<&str>, city: Option<&str>) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", view.brand_name);
    let _ = writeln!(out, "Generic: {}", view.generic_name);
    if let Some(public_name) = &view.public_name {
        let _ = writeln!(out, "Also sold as: {}", public_name);
    }

    let _ = writeln!(out, "\nComposition");
    for line in &view.composition_lines {
        let _ = writeln!(out, "  - {}", line);
    }

    let _ = writeln!(out, "\nDosage: {}", view.dosage);
    let _ = writeln!(out, "Timing: {}", view.timing);

    let _ = writeln!(out, "\n{}", view.price_title);
    match &view.price_panel {
        PricePanel::Comparison {
            brand_price,
            generic_price,
        } => {
            let _ = writeln!(out, "  Brand:   {}", brand_price);
            let _ = writeln!(out, "  Generic: {}", generic_price);
        }
        PricePanel::Vendor { chain, price } => {
            let _ = writeln!(out, "  {}: {}", chain, price);
        }
    }

    let _ = writeln!(out, "\n{}", view.store_title);
    let stores = view.filtered_stores(state, city);
    if stores.is_empty() {
        let _ = writeln!(out, "  No stores match the selected location.");
    }
    for store in stores {
        let _ = writeln!(
            out,
            "  {} - {}, {}, {}",
            store.name, store.address, store.city, store.state
        );
    }

    let _ = writeln!(out, "\n{}", DISCLAIMER);
    out
}

/// Numbered saved list, 1-based.
pub fn render_saved_list(saved: &SavedMedicines) -> String {
    if saved.is_empty() {
        return "No saved medicines.\n".to_string();
    }
    let mut out = String::new();
    for (i, entry) in saved.items().iter().enumerate() {
        let _ = write!(
            out,
            "{:>3}. {} ({})",
            i + 1,
            entry.medicine.brand_name,
            entry.medicine.generic_name
        );
        if entry.database.is_vendor_scoped() {
            let _ = write!(out, " [{}]", entry.database.as_str());
        }
        out.push('\n');
    }
    out
}

pub fn render_states() -> String {
    INDIAN_STATES
        .iter()
        .map(|(state, capital)| format!("{} ({})\n", state, capital))
        .collect()
}
