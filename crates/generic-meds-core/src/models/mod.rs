//! Domain models for the generic medicine finder.

mod saved_medicine;

pub use generic_meds_llm::{
    Composition, InlineImage, MedicineInfo, SearchDatabase, SearchForm, SearchInput,
    SearchRequest, Store,
};
pub use saved_medicine::*;
