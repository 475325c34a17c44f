//! Saved medicines list.
//!
//! The list is loaded once from its storage slot and rewritten in full after
//! every mutation. Storage problems never surface to the user: a missing or
//! unreadable slot loads as an empty list, and a failed write is logged and
//! otherwise ignored.

use tracing::{debug, warn};

use crate::db::{Database, DbResult, SAVED_MEDICINES_SLOT};
use crate::models::{MedicineInfo, SavedMedicine, SearchDatabase};

/// Ordered, de-duplicated list of saved medicines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavedMedicines {
    items: Vec<SavedMedicine>,
}

impl SavedMedicines {
    /// Load the list from storage, falling back to an empty list.
    pub fn load(db: &Database) -> Self {
        match db.read_json::<Vec<SavedMedicine>>(SAVED_MEDICINES_SLOT) {
            Ok(Some(items)) => {
                debug!("Loaded {} saved medicines", items.len());
                Self { items }
            }
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("Error reading saved medicines, starting empty: {}", e);
                Self::default()
            }
        }
    }

    /// Write the whole list to storage.
    pub fn persist(&self, db: &Database) -> DbResult<()> {
        db.write_json(SAVED_MEDICINES_SLOT, &self.items)
    }

    fn persist_or_log(&self, db: &Database) {
        if let Err(e) = self.persist(db) {
            warn!("Error writing saved medicines: {}", e);
        }
    }

    /// Append a medicine unless one with the same brand and generic name is saved.
    ///
    /// Returns `true` if the list changed.
    pub fn save(
        &mut self,
        db: &Database,
        medicine: MedicineInfo,
        database: SearchDatabase,
    ) -> bool {
        if self.contains(&medicine) {
            return false;
        }
        self.items.push(SavedMedicine::new(medicine, database));
        self.persist_or_log(db);
        true
    }

    /// Remove the entry at `index`. Out-of-range indices are ignored.
    pub fn remove(&mut self, db: &Database, index: usize) -> Option<SavedMedicine> {
        if index >= self.items.len() {
            debug!(
                "Ignoring removal of saved medicine {} (have {})",
                index,
                self.items.len()
            );
            return None;
        }
        let removed = self.items.remove(index);
        self.persist_or_log(db);
        Some(removed)
    }

    /// Empty the list.
    pub fn clear(&mut self, db: &Database) {
        self.items.clear();
        self.persist_or_log(db);
    }

    pub fn contains(&self, medicine: &MedicineInfo) -> bool {
        self.items.iter().any(|saved| saved.matches(medicine))
    }

    pub fn get(&self, index: usize) -> Option<&SavedMedicine> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[SavedMedicine] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Composition;

    fn medicine(brand: &str, generic: &str) -> MedicineInfo {
        MedicineInfo {
            brand_name: brand.into(),
            generic_name: generic.into(),
            public_name: String::new(),
            composition: vec![Composition::new(generic, "500mg")],
            dosage: "One tablet twice a day".into(),
            timing: "After meals".into(),
            brand_price: "₹40 for 10 tablets".into(),
            generic_price: "₹15 for 10 tablets".into(),
            available_at: vec![],
        }
    }

    #[test]
    fn test_load_empty_when_absent() {
        let db = Database::open_in_memory().unwrap();
        assert!(SavedMedicines::load(&db).is_empty());
    }

    #[test]
    fn test_load_empty_when_corrupt() {
        let db = Database::open_in_memory().unwrap();
        db.write_slot(SAVED_MEDICINES_SLOT, "{{definitely not json").unwrap();
        assert!(SavedMedicines::load(&db).is_empty());
    }

    #[test]
    fn test_save_deduplicates() {
        let db = Database::open_in_memory().unwrap();
        let mut saved = SavedMedicines::default();

        assert!(saved.save(&db, medicine("Crocin", "Paracetamol"), SearchDatabase::General));
        assert!(!saved.save(&db, medicine("Crocin", "Paracetamol"), SearchDatabase::DavaIndia));
        assert!(saved.save(&db, medicine("Dolo 650", "Paracetamol"), SearchDatabase::General));

        assert_eq!(saved.len(), 2);
        assert_eq!(saved.get(1).unwrap().medicine.brand_name, "Dolo 650");
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let db = Database::open_in_memory().unwrap();
        let mut saved = SavedMedicines::default();
        saved.save(&db, medicine("Crocin", "Paracetamol"), SearchDatabase::General);

        assert!(saved.remove(&db, 5).is_none());
        assert_eq!(saved.len(), 1);

        let removed = saved.remove(&db, 0).unwrap();
        assert_eq!(removed.medicine.brand_name, "Crocin");
        assert!(saved.is_empty());
    }

    #[test]
    fn test_every_mutation_persists() {
        let db = Database::open_in_memory().unwrap();
        let mut saved = SavedMedicines::default();

        saved.save(&db, medicine("Crocin", "Paracetamol"), SearchDatabase::General);
        saved.save(&db, medicine("Allegra", "Fexofenadine"), SearchDatabase::DavaIndia);
        assert_eq!(SavedMedicines::load(&db), saved);

        saved.remove(&db, 0);
        assert_eq!(SavedMedicines::load(&db).len(), 1);

        saved.clear(&db);
        assert!(SavedMedicines::load(&db).is_empty());
    }

    #[test]
    fn test_failed_writes_keep_list_usable() {
        let db = Database::open_in_memory().unwrap();
        db.conn().execute_batch("DROP TABLE kv_store").unwrap();
        let mut saved = SavedMedicines::load(&db);
        assert!(saved.is_empty());

        assert!(saved.save(&db, medicine("Crocin", "Paracetamol"), SearchDatabase::General));
        assert!(saved.save(&db, medicine("Allegra", "Fexofenadine"), SearchDatabase::General));
        assert_eq!(saved.len(), 2);

        let removed = saved.remove(&db, 0).unwrap();
        assert_eq!(removed.medicine.brand_name, "Crocin");
        assert_eq!(saved.len(), 1);

        saved.clear(&db);
        assert!(saved.is_empty());
        assert!(SavedMedicines::load(&db).is_empty());
    }

    #[test]
    fn test_reload_preserves_order_and_context() {
        let db = Database::open_in_memory().unwrap();
        let mut saved = SavedMedicines::default();
        saved.save(&db, medicine("B", "Two"), SearchDatabase::General);
        saved.save(&db, medicine("A", "One"), SearchDatabase::DavaIndia);

        let reloaded = SavedMedicines::load(&db);
        let brands: Vec<&str> = reloaded
            .items()
            .iter()
            .map(|s| s.medicine.brand_name.as_str())
            .collect();
        assert_eq!(brands, vec!["B", "A"]);
        assert_eq!(reloaded.get(1).unwrap().database, SearchDatabase::DavaIndia);
    }
}
