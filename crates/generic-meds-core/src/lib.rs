//! Generic Medicine Finder Core Library
//!
//! Looks up a medicine's generic equivalent by brand name, composition or a
//! photo of the packaging, and keeps a saved list on the device.
//!
//! # Architecture
//!
//! ```text
//!  Search form ──► Prompt composer ──► Gemini (JSON schema) ──► Validation
//!                                                                   │
//!                                                     ┌─────────────▼─────────────┐
//!                                                     │  MedicineFinder session   │
//!                                                     │  Idle → Pending → Result  │
//!                                                     └─────────────┬─────────────┘
//!                                                                   │
//!                                        ┌──────────────────────────┼─────────────┐
//!                                        ▼                          ▼             ▼
//!                                   MedicineView              Saved list      Native UI
//!                                (prices, stores)          (SQLite slot)     (UniFFI)
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite-backed named slots
//! - [`models`]: Domain types (MedicineInfo, SavedMedicine, SearchForm, etc.)
//! - [`saved`]: Saved medicines list
//! - [`session`]: Query state machine and session controller
//! - [`display`]: Render model and store locator
//! - [`config`]: Layered settings
//! - [`logging`]: Subscriber setup

pub mod config;
pub mod db;
pub mod display;
pub mod logging;
pub mod models;
pub mod saved;
pub mod session;

// Re-export commonly used types
pub use config::{LoggingConfig, Settings};
pub use db::Database;
pub use display::{MedicineView, PricePanel, DISCLAIMER};
pub use models::{
    Composition, InlineImage, MedicineInfo, SavedMedicine, SearchDatabase, SearchForm, Store,
};
pub use saved::SavedMedicines;
pub use session::{FinderError, MedicineFinder, QueryState};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use generic_meds_llm::{get_medicine_info, GeminiClient};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum MedicineFinderError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Busy: {0}")]
    Busy(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<FinderError> for MedicineFinderError {
    fn from(e: FinderError) -> Self {
        match e {
            FinderError::Busy => {
                MedicineFinderError::Busy("A search is already in progress".into())
            }
            FinderError::Input(e) => MedicineFinderError::InvalidInput(e.user_message()),
            FinderError::Storage(e) => MedicineFinderError::StorageError(e.to_string()),
            FinderError::Backend(e) => MedicineFinderError::BackendError(e.to_string()),
        }
    }
}

impl From<db::DbError> for MedicineFinderError {
    fn from(e: db::DbError) -> Self {
        MedicineFinderError::StorageError(e.to_string())
    }
}

impl From<Box<figment::Error>> for MedicineFinderError {
    fn from(e: Box<figment::Error>) -> Self {
        MedicineFinderError::ConfigError(e.to_string())
    }
}

impl From<std::io::Error> for MedicineFinderError {
    fn from(e: std::io::Error) -> Self {
        MedicineFinderError::ConfigError(format!("Failed to start runtime: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open a finder using `generic-meds.toml` (or the given settings file) and the environment.
#[uniffi::export]
pub fn open_finder(
    settings_path: Option<String>,
) -> Result<Arc<MedicineFinderCore>, MedicineFinderError> {
    let settings = match settings_path {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    logging::init_with_config(&settings.logging);
    let finder = MedicineFinder::from_settings(&settings)?;
    MedicineFinderCore::wrap(finder)
}

/// Open a finder with an in-memory saved list (for testing).
#[uniffi::export]
pub fn open_finder_in_memory(
    api_key: String,
) -> Result<Arc<MedicineFinderCore>, MedicineFinderError> {
    let settings = Settings {
        api_key,
        ..Settings::default()
    };
    let backend = GeminiClient::new(settings.backend_config()).map_err(FinderError::from)?;
    let db = Database::open_in_memory()?;
    MedicineFinderCore::wrap(MedicineFinder::new(backend, db))
}

/// Indian states offered by the store locator, sorted.
#[uniffi::export]
pub fn indian_states() -> Vec<String> {
    display::INDIAN_STATES
        .iter()
        .map(|(state, _)| state.to_string())
        .collect()
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe session wrapper for FFI.
///
/// The session lock is not held while a query is in flight, so `state()`
/// reports `Pending` to other threads during a search.
#[derive(uniffi::Object)]
pub struct MedicineFinderCore {
    finder: Mutex<MedicineFinder<GeminiClient>>,
    runtime: tokio::runtime::Runtime,
}

impl MedicineFinderCore {
    fn wrap(finder: MedicineFinder<GeminiClient>) -> Result<Arc<Self>, MedicineFinderError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;
        Ok(Arc::new(Self {
            finder: Mutex::new(finder),
            runtime,
        }))
    }

    // A panic elsewhere must not leave the session stuck in Pending
    fn lock(&self) -> MutexGuard<'_, MedicineFinder<GeminiClient>> {
        self.finder.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Drive a future to completion on the owned runtime.
    ///
    /// A caller already inside a tokio runtime cannot block its own thread, so
    /// the future runs on a scoped helper thread instead.
    fn run_blocking<F>(&self, future: F) -> F::Output
    where
        F: Future + Send,
        F::Output: Send,
    {
        if tokio::runtime::Handle::try_current().is_err() {
            return self.runtime.block_on(future);
        }
        std::thread::scope(|scope| {
            match scope.spawn(|| self.runtime.block_on(future)).join() {
                Ok(output) => output,
                Err(panic) => std::panic::resume_unwind(panic),
            }
        })
    }
}

/// Abandons the session's pending search on drop unless disarmed.
struct AbandonOnDrop<'a> {
    core: &'a MedicineFinderCore,
    armed: bool,
}

impl<'a> AbandonOnDrop<'a> {
    fn new(core: &'a MedicineFinderCore) -> Self {
        Self { core, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AbandonOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.core.lock().abandon_search();
        }
    }
}

#[uniffi::export]
impl MedicineFinderCore {
    // =========================================================================
    // Search
    // =========================================================================

    /// Run a search and return the resulting state. Blocks until the backend answers.
    ///
    /// If the backend call unwinds, the session still leaves Pending.
    pub fn search(&self, form: FfiSearchForm) -> Result<FfiQueryState, MedicineFinderError> {
        let form = SearchForm::from(form);

        let (pending, backend) = {
            let mut finder = self.lock();
            match finder.begin_search(form) {
                Ok(pending) => (pending, finder.backend()),
                Err(FinderError::Input(_)) => return Ok(query_state(&finder)),
                Err(e) => return Err(e.into()),
            }
        };

        let guard = AbandonOnDrop::new(self);
        let result = self.run_blocking(get_medicine_info(backend.as_ref(), &pending.prompt));
        guard.disarm();

        let mut finder = self.lock();
        finder.complete_search(result);
        Ok(query_state(&finder))
    }

    /// Current query state.
    pub fn state(&self) -> FfiQueryState {
        query_state(&self.lock())
    }

    /// Clear the current result or error.
    pub fn reset(&self) {
        self.lock().reset();
    }

    /// Cities for the store locator's state filter, for the current result.
    pub fn cities_for_state(&self, state: String) -> Vec<String> {
        self.lock()
            .current_view()
            .map(|view| display::cities_for_state(&view.stores, &state))
            .unwrap_or_default()
    }

    /// Stores of the current result matching the locator filters.
    pub fn filtered_stores(&self, state: Option<String>, city: Option<String>) -> Vec<FfiStore> {
        self.lock()
            .current_view()
            .map(|view| {
                view.filtered_stores(state.as_deref(), city.as_deref())
                    .into_iter()
                    .cloned()
                    .map(FfiStore::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    // =========================================================================
    // Saved List
    // =========================================================================

    /// Save the current result. Returns false if nothing was added.
    pub fn save_current(&self) -> bool {
        self.lock().save_current()
    }

    /// Saved medicines, in the order they were saved.
    pub fn saved(&self) -> Vec<FfiSavedMedicine> {
        self.lock()
            .saved()
            .items()
            .iter()
            .enumerate()
            .map(|(index, entry)| FfiSavedMedicine {
                index: index as u32,
                brand_name: entry.medicine.brand_name.clone(),
                generic_name: entry.medicine.generic_name.clone(),
                database: entry.database.as_str().to_string(),
                saved_at: entry.saved_at.clone(),
            })
            .collect()
    }

    /// Remove a saved medicine. Out-of-range indices are ignored.
    pub fn remove_saved(&self, index: u32) -> bool {
        self.lock().remove_saved(index as usize)
    }

    pub fn clear_saved(&self) {
        self.lock().clear_saved();
    }

    /// Show a saved medicine as the current result.
    pub fn view_saved(&self, index: u32) -> FfiQueryState {
        let mut finder = self.lock();
        finder.view_saved(index as usize);
        query_state(&finder)
    }
}

fn query_state(finder: &MedicineFinder<GeminiClient>) -> FfiQueryState {
    match finder.state() {
        QueryState::Idle => FfiQueryState::Idle,
        QueryState::Pending => FfiQueryState::Pending,
        QueryState::Failure(message) => FfiQueryState::Failure {
            message: message.clone(),
        },
        QueryState::Success(_) => match finder.current_view() {
            Some(view) => FfiQueryState::Success {
                view: view.into(),
                saved: finder.is_current_saved(),
            },
            None => FfiQueryState::Idle,
        },
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe composition row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiComposition {
    pub ingredient: String,
    pub strength: String,
}

/// FFI-safe search form. Image bytes and MIME type travel together.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSearchForm {
    pub name: Option<String>,
    pub image_data: Option<Vec<u8>>,
    pub image_mime_type: Option<String>,
    pub composition: Vec<FfiComposition>,
    pub database: String,
}

impl From<FfiSearchForm> for SearchForm {
    fn from(form: FfiSearchForm) -> Self {
        let image = match (form.image_data, form.image_mime_type) {
            (Some(data), Some(mime_type)) if !data.is_empty() => {
                Some(InlineImage::new(data, mime_type))
            }
            _ => None,
        };
        SearchForm {
            name: form.name,
            image,
            composition: form
                .composition
                .into_iter()
                .map(|c| Composition::new(c.ingredient, c.strength))
                .collect(),
            database: SearchDatabase::parse(&form.database),
        }
    }
}

/// FFI-safe store.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStore {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
}

impl From<Store> for FfiStore {
    fn from(store: Store) -> Self {
        Self {
            name: store.name,
            city: store.city,
            state: store.state,
            address: store.address,
        }
    }
}

/// FFI-safe price section.
#[derive(Debug, Clone, uniffi::Enum)]
pub enum FfiPricePanel {
    Comparison {
        brand_price: String,
        generic_price: String,
    },
    Vendor {
        chain: String,
        price: String,
    },
}

impl From<PricePanel> for FfiPricePanel {
    fn from(panel: PricePanel) -> Self {
        match panel {
            PricePanel::Comparison {
                brand_price,
                generic_price,
            } => FfiPricePanel::Comparison {
                brand_price,
                generic_price,
            },
            PricePanel::Vendor { chain, price } => FfiPricePanel::Vendor { chain, price },
        }
    }
}

/// FFI-safe medicine view.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicineView {
    pub brand_name: String,
    pub generic_name: String,
    pub public_name: Option<String>,
    pub composition_lines: Vec<String>,
    pub dosage: String,
    pub timing: String,
    pub price_title: String,
    pub price_panel: FfiPricePanel,
    pub store_title: String,
    pub stores: Vec<FfiStore>,
    pub mandated_state_present: bool,
}

impl From<MedicineView> for FfiMedicineView {
    fn from(view: MedicineView) -> Self {
        Self {
            brand_name: view.brand_name,
            generic_name: view.generic_name,
            public_name: view.public_name,
            composition_lines: view.composition_lines,
            dosage: view.dosage,
            timing: view.timing,
            price_title: view.price_title,
            price_panel: view.price_panel.into(),
            store_title: view.store_title,
            stores: view.stores.into_iter().map(FfiStore::from).collect(),
            mandated_state_present: view.mandated_state_present,
        }
    }
}

/// FFI-safe saved list entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSavedMedicine {
    pub index: u32,
    pub brand_name: String,
    pub generic_name: String,
    pub database: String,
    pub saved_at: Option<String>,
}

/// FFI-safe query state.
#[derive(Debug, Clone, uniffi::Enum)]
pub enum FfiQueryState {
    Idle,
    Pending,
    Success { view: FfiMedicineView, saved: bool },
    Failure { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use generic_meds_llm::{BackendConfig, GENERIC_FAILURE_MESSAGE};

    #[test]
    fn test_ffi_form_conversion() {
        let form = SearchForm::from(FfiSearchForm {
            name: None,
            image_data: Some(vec![1, 2]),
            image_mime_type: Some("image/png".into()),
            composition: vec![FfiComposition {
                ingredient: "Paracetamol".into(),
                strength: "500mg".into(),
            }],
            database: "dava".into(),
        });
        assert_eq!(form.database, SearchDatabase::DavaIndia);
        assert_eq!(form.image.unwrap().mime_type, "image/png");
        assert_eq!(form.composition.len(), 1);
    }

    #[test]
    fn test_ffi_image_without_mime_is_dropped() {
        let form = SearchForm::from(FfiSearchForm {
            name: Some("Crocin".into()),
            image_data: Some(vec![1, 2]),
            image_mime_type: None,
            composition: vec![],
            database: "general".into(),
        });
        assert!(form.image.is_none());
    }

    #[test]
    fn test_in_memory_core_empty_search_fails() {
        let core = open_finder_in_memory("test-key".into()).unwrap();
        let state = core
            .search(FfiSearchForm {
                name: Some("  ".into()),
                image_data: None,
                image_mime_type: None,
                composition: vec![],
                database: "general".into(),
            })
            .unwrap();
        assert!(matches!(
            state,
            FfiQueryState::Failure { ref message } if message == "No valid input provided."
        ));
        assert!(matches!(core.state(), FfiQueryState::Failure { .. }));
    }

    #[test]
    fn test_in_memory_core_saved_list() {
        let core = open_finder_in_memory("test-key".into()).unwrap();
        assert!(core.saved().is_empty());
        assert!(!core.save_current());
        assert!(!core.remove_saved(7));
        assert!(matches!(core.view_saved(0), FfiQueryState::Idle));
        core.clear_saved();
        assert!(core.saved().is_empty());
    }

    fn name_form(name: &str) -> FfiSearchForm {
        FfiSearchForm {
            name: Some(name.into()),
            image_data: None,
            image_mime_type: None,
            composition: vec![],
            database: "general".into(),
        }
    }

    // Nothing listens on the discard port, so requests fail fast
    fn unreachable_core() -> Arc<MedicineFinderCore> {
        let mut config = BackendConfig::new("test-key");
        config.base_url = "http://127.0.0.1:9/v1beta".into();
        let backend = GeminiClient::new(config).unwrap();
        let db = Database::open_in_memory().unwrap();
        MedicineFinderCore::wrap(MedicineFinder::new(backend, db)).unwrap()
    }

    #[test]
    fn test_search_from_inside_runtime_completes() {
        let core = unreachable_core();
        let host = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let (first, second) = host.block_on(async {
            (core.search(name_form("Crocin")), core.search(name_form("Dolo 650")))
        });

        assert!(matches!(
            first,
            Ok(FfiQueryState::Failure { ref message }) if message == GENERIC_FAILURE_MESSAGE
        ));
        assert!(matches!(second, Ok(FfiQueryState::Failure { .. })));
        assert!(!matches!(core.state(), FfiQueryState::Pending));
    }

    #[test]
    fn test_unwinding_search_is_abandoned() {
        let core = unreachable_core();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let form = SearchForm::from(name_form("Crocin"));
            core.lock().begin_search(form).unwrap();
            let _guard = AbandonOnDrop::new(&core);
            panic!("backend call unwound");
        }));

        assert!(outcome.is_err());
        assert!(matches!(
            core.state(),
            FfiQueryState::Failure { ref message } if message == GENERIC_FAILURE_MESSAGE
        ));
        assert!(core.search(name_form("Dolo 650")).is_ok());
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let result = open_finder_in_memory(String::new());
        assert!(matches!(result, Err(MedicineFinderError::BackendError(_))));
    }

    #[test]
    fn test_indian_states() {
        let states = indian_states();
        assert_eq!(states.len(), 28);
        assert!(states.contains(&"Tripura".to_string()));
    }
}
