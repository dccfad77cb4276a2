//! Ollama backend adapter
//!
//! Talks to a local Ollama server over its HTTP API.

pub mod gateway;
pub mod protocol;

pub use gateway::{OllamaGateway, base_url};
