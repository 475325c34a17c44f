//! Prompt composition and generative backend client for generic medicine lookups.
//!
//! This crate turns a search (brand name, composition or packaging photo) into a
//! prompt for a Gemini model constrained to a fixed JSON schema, and validates the
//! reply before it becomes a [`MedicineInfo`].

pub mod client;
pub mod extraction;
pub mod mock;
pub mod prompts;
pub mod query;
pub mod schema;

pub use client::*;
pub use extraction::*;
pub use mock::MockBackend;
pub use prompts::*;
pub use query::*;
