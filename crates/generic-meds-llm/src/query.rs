//! Search input types submitted from the search form.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Query errors.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("No valid input provided.")]
    NoInput,

    #[error("Unsupported image type: {0}")]
    UnsupportedImage(String),

    #[error("Failed to read image: {0}")]
    ImageRead(#[from] std::io::Error),

    #[error("Backend error: {0}")]
    Backend(#[from] crate::client::BackendError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] crate::extraction::ExtractionError),
}

pub type QueryResult<T> = Result<T, QueryError>;

/// Message shown to the user for every backend or response failure.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Failed to get information from the AI. Please check your input or try again later.";

impl QueryError {
    /// The message a user sees for this error.
    ///
    /// Transport, parse and shape failures all collapse into one generic message.
    pub fn user_message(&self) -> String {
        match self {
            QueryError::Backend(_) | QueryError::Extraction(_) => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}

/// An active ingredient and its strength (e.g. "Paracetamol", "500mg").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    pub ingredient: String,
    pub strength: String,
}

impl Composition {
    pub fn new(ingredient: impl Into<String>, strength: impl Into<String>) -> Self {
        Self {
            ingredient: ingredient.into(),
            strength: strength.into(),
        }
    }

    /// Both fields are filled in.
    pub fn is_complete(&self) -> bool {
        !self.ingredient.trim().is_empty() && !self.strength.trim().is_empty()
    }

    /// Parse "Paracetamol:500mg" form.
    pub fn parse(row: &str) -> Option<Self> {
        let (ingredient, strength) = row.split_once(':')?;
        let comp = Self::new(ingredient.trim(), strength.trim());
        comp.is_complete().then_some(comp)
    }
}

/// Image bytes sent inline with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl InlineImage {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    /// Read an image file, inferring the MIME type from its extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> QueryResult<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();
        let mime_type = mime_for_extension(&ext)
            .ok_or_else(|| QueryError::UnsupportedImage(path.display().to_string()))?;
        let data = std::fs::read(path)?;
        Ok(Self::new(data, mime_type))
    }
}

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Which catalogue the search is scoped to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchDatabase {
    /// Any brand, any store
    #[default]
    General,
    /// DAVA INDIA generic pharmacy chain only
    #[serde(rename = "dava")]
    DavaIndia,
}

impl SearchDatabase {
    /// Retail chain whose products and stores the vendor mode is limited to.
    pub const VENDOR_CHAIN: &'static str = "DAVA INDIA";

    /// Parse a selector value. Unrecognized values fall back to `General`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "general" | "" => SearchDatabase::General,
            "dava" | "dava india" | "dava_india" => SearchDatabase::DavaIndia,
            other => {
                tracing::warn!("Unknown search database {:?}, using general", other);
                SearchDatabase::General
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchDatabase::General => "general",
            SearchDatabase::DavaIndia => "dava",
        }
    }

    pub fn is_vendor_scoped(&self) -> bool {
        matches!(self, SearchDatabase::DavaIndia)
    }

    /// Store chain name shown in results, if the mode is vendor scoped.
    pub fn store_chain_name(&self) -> Option<&'static str> {
        self.is_vendor_scoped().then_some(Self::VENDOR_CHAIN)
    }
}

/// Exactly one search criterion.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchInput {
    Name(String),
    Image(InlineImage),
    /// Never empty.
    Composition(Vec<Composition>),
}

/// A validated search: one criterion plus the database selector.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub input: SearchInput,
    pub database: SearchDatabase,
}

impl SearchRequest {
    pub fn new(input: SearchInput, database: SearchDatabase) -> Self {
        Self { input, database }
    }

    pub fn by_name(name: impl Into<String>, database: SearchDatabase) -> Self {
        Self::new(SearchInput::Name(name.into()), database)
    }
}

/// Raw form submission. Any subset of the fields may be filled.
#[derive(Debug, Clone, Default)]
pub struct SearchForm {
    pub name: Option<String>,
    pub image: Option<InlineImage>,
    pub composition: Vec<Composition>,
    pub database: SearchDatabase,
}

impl SearchForm {
    /// Pick the criterion to search by.
    ///
    /// An image wins over a name, and a name over a composition. Blank names
    /// and incomplete composition rows are ignored.
    pub fn into_request(self) -> QueryResult<SearchRequest> {
        let database = self.database;

        if let Some(image) = self.image {
            return Ok(SearchRequest::new(SearchInput::Image(image), database));
        }

        if let Some(name) = self.name.filter(|n| !n.trim().is_empty()) {
            return Ok(SearchRequest::new(SearchInput::Name(name), database));
        }

        let rows: Vec<Composition> = self
            .composition
            .into_iter()
            .filter(Composition::is_complete)
            .collect();
        if !rows.is_empty() {
            return Ok(SearchRequest::new(SearchInput::Composition(rows), database));
        }

        Err(QueryError::NoInput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_form_is_input_error() {
        let result = SearchForm::default().into_request();
        assert!(matches!(result, Err(QueryError::NoInput)));
    }

    #[test]
    fn test_blank_name_is_ignored() {
        let form = SearchForm {
            name: Some("   ".into()),
            ..Default::default()
        };
        assert!(matches!(form.into_request(), Err(QueryError::NoInput)));
    }

    #[test]
    fn test_image_takes_priority() {
        let form = SearchForm {
            name: Some("Crocin".into()),
            image: Some(InlineImage::new(vec![1, 2, 3], "image/png")),
            ..Default::default()
        };
        let request = form.into_request().unwrap();
        assert!(matches!(request.input, SearchInput::Image(_)));
    }

    #[test]
    fn test_incomplete_composition_rows_dropped() {
        let form = SearchForm {
            composition: vec![
                Composition::new("Paracetamol", "500mg"),
                Composition::new("Caffeine", ""),
                Composition::new("", "30mg"),
            ],
            database: SearchDatabase::DavaIndia,
            ..Default::default()
        };
        let request = form.into_request().unwrap();
        assert_eq!(request.database, SearchDatabase::DavaIndia);
        match request.input {
            SearchInput::Composition(rows) => {
                assert_eq!(rows, vec![Composition::new("Paracetamol", "500mg")]);
            }
            other => panic!("expected composition, got {:?}", other),
        }
    }

    #[test]
    fn test_only_incomplete_rows_is_input_error() {
        let form = SearchForm {
            composition: vec![Composition::new("Paracetamol", " ")],
            ..Default::default()
        };
        assert!(matches!(form.into_request(), Err(QueryError::NoInput)));
    }

    #[test]
    fn test_database_parse() {
        assert_eq!(SearchDatabase::parse("general"), SearchDatabase::General);
        assert_eq!(SearchDatabase::parse("DAVA"), SearchDatabase::DavaIndia);
        assert_eq!(SearchDatabase::parse("unknown"), SearchDatabase::General);
        assert_eq!(SearchDatabase::DavaIndia.store_chain_name(), Some("DAVA INDIA"));
        assert_eq!(SearchDatabase::General.store_chain_name(), None);
    }

    #[test]
    fn test_database_serde_values() {
        assert_eq!(
            serde_json::to_string(&SearchDatabase::DavaIndia).unwrap(),
            "\"dava\""
        );
        let db: SearchDatabase = serde_json::from_str("\"general\"").unwrap();
        assert_eq!(db, SearchDatabase::General);
    }

    #[test]
    fn test_composition_parse() {
        assert_eq!(
            Composition::parse("Paracetamol: 500mg"),
            Some(Composition::new("Paracetamol", "500mg"))
        );
        assert_eq!(Composition::parse("Paracetamol"), None);
        assert_eq!(Composition::parse("Paracetamol:"), None);
    }

    #[test]
    fn test_mime_inference() {
        assert_eq!(mime_for_extension("jpg"), Some("image/jpeg"));
        assert_eq!(mime_for_extension("png"), Some("image/png"));
        assert_eq!(mime_for_extension("txt"), None);
    }

    #[test]
    fn test_user_message_for_input_error() {
        assert_eq!(QueryError::NoInput.user_message(), "No valid input provided.");
    }
}
