//! Prompts for generic medicine lookups.
//!
//! Each search criterion gets its own template. The vendor-scoped database
//! prepends a block of extra constraints ahead of whichever prompt was built.

use crate::query::{
    Composition, InlineImage, QueryResult, SearchForm, SearchInput, SearchRequest,
};

// Literal form, so the preamble can be built with concat!
macro_rules! mandated_state {
    () => {
        "Tripura"
    };
}

/// State that at least one suggested store must be located in.
pub const MANDATED_STATE: &str = mandated_state!();

/// Preamble sent ahead of every query.
pub const BASE_PROMPT: &str = concat!(
    "You are a helpful medical information assistant. Your goal is to provide details about a medicine based on user input. Provide its generic name, a publicly available brand name for the generic version in India, active ingredients with their strengths, common adult dosage, timing, and an estimated price comparison in INR (₹) for both the brand-name and generic versions. Also, suggest a list of 5 fictional medical stores in various cities and states in India where the generic medicine might be available. CRITICAL: Ensure at least one of these stores is located in the state of ",
    mandated_state!(),
    ". The user's query is as follows:"
);

/// Prompt used when the query is a photograph of the packaging.
pub const IMAGE_PROMPT: &str = "Analyze the provided image of the medicine packaging.";

/// Extra constraints for the DAVA INDIA database.
pub const DAVA_INSTRUCTION: &str = r#"
CRITICAL INSTRUCTION: The user wants to search the DAVA INDIA generic pharmacy database.
1.  Your primary goal is to find a medicine brand available at DAVA INDIA that matches the user's query.
2.  The 'brandName', 'publicName', and 'genericName' should reflect the product sold at DAVA INDIA.
3.  The 'brandPrice' and 'genericPrice' must be the specific price for that product at DAVA INDIA. If you cannot find a specific price, provide a realistic estimate and label it clearly. These two price fields should have the same value.
4.  The 'availableAt' list MUST ONLY contain fictional "Dava India - [City Name]" store locations across various cities in India."#;

/// Separator between the vendor block and the base query.
const VENDOR_CONTEXT_HEADER: &str = "\n\nUser Query Context:\n";

/// Prompt text plus the optional inline image.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPrompt {
    pub text: String,
    pub image: Option<InlineImage>,
}

/// Prompt for a brand-name search.
pub fn make_name_prompt(name: &str) -> String {
    format!(
        r#"The medicine name is: "{}". Find its generic equivalent and details."#,
        name
    )
}

/// Prompt for a composition search.
pub fn make_composition_prompt(composition: &[Composition]) -> String {
    let composition_list = composition
        .iter()
        .map(|c| format!("{} {}", c.ingredient, c.strength))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"A user has provided the following composition: {}. Your task is to:
1. Identify a common, publicly available medicine brand name in India that matches this exact composition.
2. For the medicine you identify, fill out the provided JSON schema.
- The 'brandName' in the schema should be the common brand you found.
- The 'genericName' should be the list of active ingredients (e.g., 'Paracetamol & Caffeine').
- The 'publicName' can be the same as the 'brandName' or another common alternative.
- The 'brandPrice' and 'genericPrice' in the schema should be treated as the same, representing the typical market price for this generic medicine."#,
        composition_list
    )
}

/// Build the prompt for a validated search request.
pub fn compose_prompt(request: &SearchRequest) -> ComposedPrompt {
    let (mut text, image) = match &request.input {
        SearchInput::Image(image) => (IMAGE_PROMPT.to_string(), Some(image.clone())),
        SearchInput::Name(name) => (make_name_prompt(name), None),
        SearchInput::Composition(rows) => (make_composition_prompt(rows), None),
    };

    if request.database.is_vendor_scoped() {
        text = format!("{}{}{}", DAVA_INSTRUCTION, VENDOR_CONTEXT_HEADER, text);
    }

    ComposedPrompt { text, image }
}

/// Validate a raw form and build its prompt.
pub fn compose_form(form: SearchForm) -> QueryResult<ComposedPrompt> {
    let request = form.into_request()?;
    Ok(compose_prompt(&request))
}

/// The complete text sent to the backend.
pub fn build_full_prompt(prompt: &ComposedPrompt) -> String {
    format!("{} {}", BASE_PROMPT, prompt.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{QueryError, SearchDatabase};

    fn composition_request(database: SearchDatabase) -> SearchRequest {
        SearchRequest::new(
            SearchInput::Composition(vec![
                Composition::new("Paracetamol", "500mg"),
                Composition::new("Caffeine", "30mg"),
            ]),
            database,
        )
    }

    #[test]
    fn test_preamble_names_mandated_state() {
        assert!(BASE_PROMPT.contains(&format!("located in the state of {}.", MANDATED_STATE)));
    }

    #[test]
    fn test_name_prompt() {
        let prompt = compose_prompt(&SearchRequest::by_name("Dolo 650", SearchDatabase::General));
        assert!(prompt.text.contains(r#""Dolo 650""#));
        assert!(prompt.image.is_none());
        assert!(!prompt.text.contains("DAVA INDIA"));
    }

    #[test]
    fn test_composition_prompt_joins_rows() {
        let prompt = compose_prompt(&composition_request(SearchDatabase::General));
        assert!(prompt.text.contains("Paracetamol 500mg, Caffeine 30mg"));
        assert!(prompt.text.contains("'genericName' should be the list of active ingredients"));
    }

    #[test]
    fn test_image_prompt_carries_image() {
        let image = InlineImage::new(vec![0xff, 0xd8], "image/jpeg");
        let request =
            SearchRequest::new(SearchInput::Image(image.clone()), SearchDatabase::General);
        let prompt = compose_prompt(&request);
        assert_eq!(prompt.text, IMAGE_PROMPT);
        assert_eq!(prompt.image, Some(image));
    }

    #[test]
    fn test_vendor_block_prepended() {
        let prompt = compose_prompt(&composition_request(SearchDatabase::DavaIndia));
        assert!(prompt.text.starts_with(DAVA_INSTRUCTION));
        let base_at = prompt.text.find("A user has provided").unwrap();
        let header_at = prompt.text.find("User Query Context:").unwrap();
        assert!(header_at < base_at);
    }

    #[test]
    fn test_full_prompt_has_preamble() {
        let prompt = compose_prompt(&SearchRequest::by_name("Crocin", SearchDatabase::General));
        let full = build_full_prompt(&prompt);
        assert!(full.starts_with(BASE_PROMPT));
        assert!(full.contains(MANDATED_STATE));
        assert!(full.ends_with(&prompt.text));
    }

    #[test]
    fn test_compose_empty_form_fails() {
        let result = compose_form(SearchForm::default());
        assert!(matches!(result, Err(QueryError::NoInput)));
    }
}
