//! Model value object representing an Ollama model identifier

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Model used when neither the command line nor the config file names one.
pub const DEFAULT_MODEL: &str = "mistral";

/// Number of hex characters of the identifier digest appended to a token
/// whose raw identifier had to be rewritten.
const TOKEN_DIGEST_LEN: usize = 8;

/// An LLM model identifier as understood by the backend (Value Object)
///
/// Identifiers are free-form (`mistral`, `llama3:8b`, `library/qwen2:7b`),
/// so they are never used directly in file names. Use [`Model::token`] for
/// anything that touches the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Model(String);

impl Model {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    /// Get the raw identifier sent to the backend
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path-safe token derived from the identifier.
    ///
    /// See [`sanitize_model_name`].
    pub fn token(&self) -> String {
        sanitize_model_name(&self.0)
    }

    /// Whether a name reported by the backend refers to this model.
    ///
    /// Ollama lists untagged models with an implicit `:latest` suffix, so
    /// `mistral` matches a listed `mistral:latest`.
    pub fn matches_listed(&self, listed: &str) -> bool {
        listed == self.0
            || (!self.0.contains(':')
                && listed.strip_suffix(":latest") == Some(self.0.as_str()))
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Model {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Turn a model identifier into a token usable in file and directory names.
///
/// Characters outside `[A-Za-z0-9._-]` become `_`. When anything had to be
/// replaced (or the identifier is empty), the first hex digits of the
/// identifier's SHA-256 are appended so that e.g. `a/b` and `a:b` stay
/// distinct. Identifiers that are already safe map to themselves.
pub fn sanitize_model_name(raw: &str) -> String {
    let mut rewritten = false;
    let mut token: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                rewritten = true;
                '_'
            }
        })
        .collect();

    if rewritten || token.is_empty() {
        let digest = Sha256::digest(raw.as_bytes());
        token.push('-');
        for byte in digest.iter().take(TOKEN_DIGEST_LEN / 2) {
            token.push_str(&format!("{:02x}", byte));
        }
    }

    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_identifier_unchanged() {
        assert_eq!(sanitize_model_name("mistral"), "mistral");
        assert_eq!(sanitize_model_name("llama3.1-8b_q4"), "llama3.1-8b_q4");
    }

    #[test]
    fn test_separator_identifier_sanitized() {
        let token = sanitize_model_name("provider/name:tag");
        assert!(token.starts_with("provider_name_tag-"));
        assert_eq!(token.len(), "provider_name_tag-".len() + TOKEN_DIGEST_LEN);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        );
    }

    #[test]
    fn test_sanitize_is_deterministic() {
        assert_eq!(
            sanitize_model_name("provider/name:tag"),
            sanitize_model_name("provider/name:tag")
        );
    }

    #[test]
    fn test_distinct_identifiers_do_not_collide() {
        let raw = ["a/b", "a:b", "a b", "a_b", "a\\b"];
        let tokens: std::collections::HashSet<_> =
            raw.iter().map(|r| sanitize_model_name(r)).collect();
        assert_eq!(tokens.len(), raw.len());
    }

    #[test]
    fn test_empty_identifier_gets_digest() {
        let token = sanitize_model_name("");
        assert_eq!(token.len(), 1 + TOKEN_DIGEST_LEN);
        assert!(token.starts_with('-'));
    }

    #[test]
    fn test_model_default_and_display() {
        let model = Model::default();
        assert_eq!(model.as_str(), "mistral");
        assert_eq!(model.to_string(), "mistral");
    }

    #[test]
    fn test_model_serde_is_plain_string() {
        let model: Model = "llama3:8b".parse().unwrap();
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, "\"llama3:8b\"");
        let back: Model = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn test_matches_listed() {
        let model = Model::new("mistral");
        assert!(model.matches_listed("mistral"));
        assert!(model.matches_listed("mistral:latest"));
        assert!(!model.matches_listed("mistral:7b"));

        let tagged = Model::new("llama3:8b");
        assert!(tagged.matches_listed("llama3:8b"));
        assert!(!tagged.matches_listed("llama3:8b:latest"));
    }
}
