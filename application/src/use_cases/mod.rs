//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod analyze_document;
pub mod assemble_report;
pub mod clear_cache;
pub mod run_all_models;
pub mod run_case_analysis;
pub mod run_pipeline;
pub(crate) mod shared;
pub mod synthesize_defense;

#[cfg(test)]
pub(crate) mod test_support;
