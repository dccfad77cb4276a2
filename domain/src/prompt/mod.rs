//! Prompt templates sent to the LLM backend.

pub mod template;

pub use template::PromptTemplate;
