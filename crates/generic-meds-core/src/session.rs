//! Application state for one user session.
//!
//! [`MedicineFinder`] owns the current query state, the search context and the
//! saved list. Front-ends read it through accessors and change it only through
//! its operations.
//!
//! ```text
//!   Idle ──begin_search──► Pending ──complete_search──► Success | Failure
//!    ▲                                                       │
//!    └────────────── reset / next begin_search ──────────────┘
//! ```
//!
//! At most one query is in flight: `begin_search` is refused while Pending.
//! A query that never reaches `complete_search` (its future dropped, or the
//! caller unwinding) is abandoned: Pending becomes the generic `Failure`.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use generic_meds_llm::{
    compose_form, get_medicine_info, BackendError, ComposedPrompt, GeminiClient,
    GenerativeBackend, QueryError, QueryResult, GENERIC_FAILURE_MESSAGE,
};

use crate::config::Settings;
use crate::db::{Database, DbError};
use crate::display::MedicineView;
use crate::models::{MedicineInfo, SearchDatabase, SearchForm};
use crate::saved::SavedMedicines;

/// Session errors.
#[derive(Error, Debug)]
pub enum FinderError {
    #[error("A search is already in progress")]
    Busy,

    #[error(transparent)]
    Input(#[from] QueryError),

    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    #[error("Backend setup failed: {0}")]
    Backend(#[from] BackendError),
}

pub type FinderResult<T> = Result<T, FinderError>;

/// Where the current query stands.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum QueryState {
    /// Nothing shown yet
    #[default]
    Idle,
    /// Waiting on the backend; submit is disabled
    Pending,
    Success(MedicineInfo),
    /// User-facing error message
    Failure(String),
}

impl QueryState {
    pub fn is_busy(&self) -> bool {
        matches!(self, QueryState::Pending)
    }

    pub fn medicine(&self) -> Option<&MedicineInfo> {
        match self {
            QueryState::Success(medicine) => Some(medicine),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            QueryState::Failure(message) => Some(message),
            _ => None,
        }
    }

    /// Pending -> generic `Failure`. Returns whether a search was abandoned.
    fn abandon(&mut self) -> bool {
        if !self.is_busy() {
            return false;
        }
        warn!("Pending search abandoned before completing");
        *self = QueryState::Failure(GENERIC_FAILURE_MESSAGE.to_string());
        true
    }
}

/// Abandons the pending search on drop unless disarmed.
struct PendingGuard<'a> {
    state: &'a mut QueryState,
    armed: bool,
}

impl<'a> PendingGuard<'a> {
    fn new(state: &'a mut QueryState) -> Self {
        Self { state, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.abandon();
        }
    }
}

/// A search that has been accepted and is waiting on the backend.
#[derive(Debug, Clone)]
pub struct PendingSearch {
    pub prompt: ComposedPrompt,
    pub database: SearchDatabase,
}

/// Session controller: query state, search context and saved list.
pub struct MedicineFinder<B> {
    backend: Arc<B>,
    db: Database,
    saved: SavedMedicines,
    state: QueryState,
    context: SearchDatabase,
}

impl MedicineFinder<GeminiClient> {
    /// Open the configured database and build a Gemini client.
    pub fn from_settings(settings: &Settings) -> FinderResult<Self> {
        let backend = GeminiClient::new(settings.backend_config())?;
        let db = Database::open(&settings.database_path)?;
        Ok(Self::new(backend, db))
    }
}

impl<B: GenerativeBackend> MedicineFinder<B> {
    /// Create a session, loading the saved list from `db`.
    pub fn new(backend: B, db: Database) -> Self {
        let saved = SavedMedicines::load(&db);
        Self {
            backend: Arc::new(backend),
            db,
            saved,
            state: QueryState::Idle,
            context: SearchDatabase::General,
        }
    }

    /// Shared handle to the backend, for running a query outside the session lock.
    pub fn backend(&self) -> Arc<B> {
        Arc::clone(&self.backend)
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Database the current result should be displayed for.
    pub fn context(&self) -> SearchDatabase {
        self.context
    }

    pub fn saved(&self) -> &SavedMedicines {
        &self.saved
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    /// Accept a search and move to Pending.
    ///
    /// Clears the previous result or error. A form with no usable criterion ends
    /// in `Failure` right away and is returned as [`FinderError::Input`].
    pub fn begin_search(&mut self, form: SearchForm) -> FinderResult<PendingSearch> {
        if self.is_busy() {
            warn!("Search submitted while another is pending");
            return Err(FinderError::Busy);
        }

        let database = form.database;
        self.context = database;

        match compose_form(form) {
            Ok(prompt) => {
                debug!("Search pending (database={})", database.as_str());
                self.state = QueryState::Pending;
                Ok(PendingSearch { prompt, database })
            }
            Err(e) => {
                self.state = QueryState::Failure(e.user_message());
                Err(e.into())
            }
        }
    }

    /// Finish the pending search with the backend outcome.
    pub fn complete_search(&mut self, result: QueryResult<MedicineInfo>) -> &QueryState {
        if !self.is_busy() {
            warn!("Search completed with no search pending");
        }
        self.state = match result {
            Ok(medicine) => {
                info!(
                    "Found {} (generic: {})",
                    medicine.brand_name, medicine.generic_name
                );
                QueryState::Success(medicine)
            }
            Err(e) => QueryState::Failure(e.user_message()),
        };
        &self.state
    }

    /// Run a search to completion.
    ///
    /// Only [`FinderError::Busy`] is returned as an error; every other problem
    /// ends in a `Failure` state with a user-facing message.
    pub async fn search(&mut self, form: SearchForm) -> FinderResult<&QueryState> {
        let pending = match self.begin_search(form) {
            Ok(pending) => pending,
            Err(FinderError::Busy) => return Err(FinderError::Busy),
            Err(_) => return Ok(&self.state),
        };

        let backend = self.backend();
        let result = {
            let guard = PendingGuard::new(&mut self.state);
            let result = get_medicine_info(backend.as_ref(), &pending.prompt).await;
            guard.disarm();
            result
        };
        Ok(self.complete_search(result))
    }

    /// Give up on the pending search, if any, ending in the generic `Failure`.
    ///
    /// For callers that drive `begin_search`/`complete_search` themselves and
    /// can lose the backend call part way through.
    pub fn abandon_search(&mut self) -> bool {
        self.state.abandon()
    }

    /// Back to Idle, dropping any result or error.
    pub fn reset(&mut self) {
        if !self.is_busy() {
            self.state = QueryState::Idle;
        }
    }

    /// Save the current result. Returns `true` if the list changed.
    pub fn save_current(&mut self) -> bool {
        match &self.state {
            QueryState::Success(medicine) => {
                self.saved.save(&self.db, medicine.clone(), self.context)
            }
            _ => false,
        }
    }

    /// Whether the current result is already in the saved list.
    pub fn is_current_saved(&self) -> bool {
        self.state
            .medicine()
            .is_some_and(|medicine| self.saved.contains(medicine))
    }

    /// Remove a saved entry. Out-of-range indices are ignored.
    pub fn remove_saved(&mut self, index: usize) -> bool {
        self.saved.remove(&self.db, index).is_some()
    }

    pub fn clear_saved(&mut self) {
        self.saved.clear(&self.db);
    }

    /// Show a saved entry as the current result without querying the backend.
    ///
    /// Restores the database the entry was saved under. Ignored while a search
    /// is pending or if the index is out of range.
    pub fn view_saved(&mut self, index: usize) -> bool {
        if self.is_busy() {
            return false;
        }
        let Some(entry) = self.saved.get(index) else {
            return false;
        };
        self.context = entry.database;
        self.state = QueryState::Success(entry.medicine.clone());
        true
    }

    /// Display model for the current result.
    pub fn current_view(&self) -> Option<MedicineView> {
        self.state
            .medicine()
            .map(|medicine| MedicineView::new(medicine, self.context))
    }
}
