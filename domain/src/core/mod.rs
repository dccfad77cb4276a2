//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: an Ollama model identifier and its path-safe token
//! - [`question::QuestionSet`]: the ordered questions asked of each document
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod model;
pub mod question;
