//! End-to-end session scenarios with a mock backend.

use generic_meds_core::db::Database;
use generic_meds_core::display::PricePanel;
use generic_meds_core::models::{Composition, SearchDatabase, SearchForm};
use generic_meds_core::session::{MedicineFinder, QueryState};
use generic_meds_llm::{MockBackend, DAVA_INSTRUCTION, GENERIC_FAILURE_MESSAGE};

const DOLO_JSON: &str = r#"{
    "brandName": "Dolo 650",
    "genericName": "Paracetamol",
    "publicName": "Calpol 650",
    "composition": [{"ingredient": "Paracetamol", "strength": "650mg"}],
    "dosage": "One tablet up to three times a day",
    "timing": "After meals",
    "brandPrice": "₹30 for 15 tablets",
    "genericPrice": "₹12 for 15 tablets",
    "availableAt": [
        {"name": "Lifeline Medicos", "city": "Agartala", "state": "Tripura", "address": "12 HGB Road"},
        {"name": "City Pharma", "city": "Pune", "state": "Maharashtra", "address": "4 FC Road"}
    ]
}"#;

const DAVA_JSON: &str = r#"{
    "brandName": "Dava Paracetamol 500",
    "genericName": "Paracetamol",
    "publicName": "Dava Paracetamol 500",
    "composition": [{"ingredient": "Paracetamol", "strength": "500mg"}],
    "dosage": "One tablet up to four times a day",
    "timing": "After meals",
    "brandPrice": "₹9 for 10 tablets",
    "genericPrice": "₹9 for 10 tablets",
    "availableAt": [
        {"name": "Dava India - Agartala", "city": "Agartala", "state": "Tripura", "address": "Akhaura Road"},
        {"name": "Dava India - Kolkata", "city": "Kolkata", "state": "West Bengal", "address": "Park Street"}
    ]
}"#;

fn finder(backend: MockBackend) -> MedicineFinder<MockBackend> {
    MedicineFinder::new(backend, Database::open_in_memory().unwrap())
}

#[tokio::test]
async fn test_name_search_general_shows_two_prices() {
    let mut finder = finder(MockBackend::replying(DOLO_JSON));
    let form = SearchForm {
        name: Some("Dolo 650".into()),
        database: SearchDatabase::General,
        ..Default::default()
    };
    finder.search(form).await.unwrap();

    let view = finder.current_view().expect("result view");
    match view.price_panel {
        PricePanel::Comparison {
            brand_price,
            generic_price,
        } => {
            assert_eq!(brand_price, "₹30 for 15 tablets");
            assert_eq!(generic_price, "₹12 for 15 tablets");
            assert_ne!(brand_price, generic_price);
        }
        other => panic!("expected comparison panel, got {:?}", other),
    }
    assert!(view.mandated_state_present);
}

#[tokio::test]
async fn test_composition_search_vendor_shows_single_price() {
    let backend = MockBackend::replying(DAVA_JSON);
    let mut finder = finder(backend);
    let form = SearchForm {
        composition: vec![Composition::new("Paracetamol", "500mg")],
        database: SearchDatabase::DavaIndia,
        ..Default::default()
    };
    finder.search(form).await.unwrap();

    let calls = finder.backend().calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].prompt.contains(DAVA_INSTRUCTION));
    assert!(calls[0].prompt.contains("Paracetamol 500mg"));

    let view = finder.current_view().expect("result view");
    assert_eq!(
        view.price_panel,
        PricePanel::Vendor {
            chain: "DAVA INDIA".into(),
            price: "₹9 for 10 tablets".into(),
        }
    );
    assert_eq!(view.store_title, "DAVA INDIA Store Availability");
    assert!(view.stores.iter().all(|s| s.name.starts_with("Dava India - ")));
}

#[tokio::test]
async fn test_missing_composition_shows_generic_failure() {
    let backend =
        MockBackend::replying(r#"{"brandName": "Dolo 650", "genericName": "Paracetamol"}"#);
    let mut finder = finder(backend);
    let form = SearchForm {
        name: Some("Dolo 650".into()),
        ..Default::default()
    };

    let state = finder.search(form).await.unwrap();
    assert_eq!(state, &QueryState::Failure(GENERIC_FAILURE_MESSAGE.to_string()));
    assert!(!finder.is_busy());
    assert!(finder.current_view().is_none());
}

#[tokio::test]
async fn test_corrupt_storage_at_startup_is_silent() {
    let db = Database::open_in_memory().unwrap();
    db.write_slot("savedMedicines", "not json at all").unwrap();

    let mut finder = MedicineFinder::new(MockBackend::replying(DOLO_JSON), db);
    assert!(finder.saved().is_empty());
    assert_eq!(finder.state(), &QueryState::Idle);

    let form = SearchForm {
        name: Some("Dolo 650".into()),
        ..Default::default()
    };
    finder.search(form).await.unwrap();
    assert!(finder.save_current());
    assert_eq!(finder.saved().len(), 1);
}

#[tokio::test]
async fn test_view_saved_skips_backend() {
    let mut finder = finder(MockBackend::replying(DOLO_JSON));
    let form = SearchForm {
        name: Some("Dolo 650".into()),
        ..Default::default()
    };
    finder.search(form).await.unwrap();
    finder.save_current();
    finder.reset();

    assert!(finder.view_saved(0));
    assert_eq!(finder.backend().call_count(), 1);
    assert_eq!(finder.current_view().unwrap().brand_name, "Dolo 650");
}
