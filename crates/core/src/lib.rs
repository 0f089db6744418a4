//! Shared types, errors and settings for the ConceptEV job tools.

pub mod error;
pub mod settings;
pub mod types;
