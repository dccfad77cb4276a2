//! Ollama HTTP API message types

use serde::{Deserialize, Serialize};

/// Request body for `POST /api/generate`
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
}

/// Response body from `POST /api/generate` (non-streaming)
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}

/// Response body from `GET /api/tags`
#[derive(Debug, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
pub struct TagEntry {
    pub name: String,
}

/// Response body from `GET /api/version`
#[derive(Debug, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}
