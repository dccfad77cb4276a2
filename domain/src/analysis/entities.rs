//! Analysis records produced per document and per case.

use crate::core::error::DomainError;
use crate::core::model::Model;
use crate::core::question::QuestionSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One question and the answer recorded for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
    /// Failure reason when `answer` is a placeholder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QaPair {
    pub fn answered(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            error: None,
        }
    }

    /// A placeholder answer recording why the question could not be answered
    pub fn failed(question: impl Into<String>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            question: question.into(),
            answer: format!("[analysis failed: {}]", reason),
            error: Some(reason),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// All answers for one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub filename: String,
    pub answers: Vec<QaPair>,
}

impl DocumentRecord {
    pub fn new(filename: impl Into<String>, answers: Vec<QaPair>) -> Self {
        Self {
            filename: filename.into(),
            answers,
        }
    }

    /// Record for a document that could not be analyzed at all.
    ///
    /// Every question is present with a placeholder so the artifact keeps
    /// its shape.
    pub fn degraded(filename: impl Into<String>, questions: &QuestionSet, reason: &str) -> Self {
        Self {
            filename: filename.into(),
            answers: questions
                .iter()
                .map(|q| QaPair::failed(q.text(), reason))
                .collect(),
        }
    }

    pub fn failed_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_failed()).count()
    }

    /// True when no question received a real answer
    pub fn is_degraded(&self) -> bool {
        !self.answers.is_empty() && self.failed_count() == self.answers.len()
    }
}

/// Case-level analysis: the durable handoff between analysis and defense
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseAnalysisArtifact {
    pub model: Model,
    pub generated_at: DateTime<Utc>,
    pub documents: Vec<DocumentRecord>,
}

impl CaseAnalysisArtifact {
    pub fn new(model: Model, documents: Vec<DocumentRecord>) -> Self {
        Self {
            model,
            generated_at: Utc::now(),
            documents,
        }
    }

    pub fn answer_count(&self) -> usize {
        self.documents.iter().map(|d| d.answers.len()).sum()
    }

    pub fn failed_count(&self) -> usize {
        self.documents.iter().map(|d| d.failed_count()).sum()
    }

    pub fn to_json(&self) -> Result<String, DomainError> {
        serde_json::to_string_pretty(self).map_err(|e| DomainError::InvalidArtifact(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        serde_json::from_str(json).map_err(|e| DomainError::InvalidArtifact(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CaseAnalysisArtifact {
        CaseAnalysisArtifact::new(
            Model::new("m1"),
            vec![
                DocumentRecord::new(
                    "a.pdf",
                    vec![
                        QaPair::answered("Charges?", "Wire fraud."),
                        QaPair::failed("Deadlines?", "backend timed out"),
                    ],
                ),
                DocumentRecord::degraded("b.pdf", &QuestionSet::fallback(), "no text"),
            ],
        )
    }

    #[test]
    fn test_failed_pair_has_placeholder() {
        let pair = QaPair::failed("Q?", "connection refused");
        assert_eq!(pair.answer, "[analysis failed: connection refused]");
        assert!(pair.is_failed());
    }

    #[test]
    fn test_degraded_record_covers_every_question() {
        let record = DocumentRecord::degraded("b.pdf", &QuestionSet::fallback(), "no text");
        assert_eq!(record.answers.len(), 5);
        assert!(record.is_degraded());
    }

    #[test]
    fn test_counts() {
        let artifact = sample();
        assert_eq!(artifact.answer_count(), 7);
        assert_eq!(artifact.failed_count(), 6);
        assert!(!artifact.documents[0].is_degraded());
    }

    #[test]
    fn test_json_round_trip_is_exact() {
        let artifact = sample();
        let json = artifact.to_json().unwrap();
        let reloaded = CaseAnalysisArtifact::from_json(&json).unwrap();
        assert_eq!(reloaded, artifact);
        assert_eq!(reloaded.to_json().unwrap(), json);
    }

    #[test]
    fn test_answered_pair_omits_error_field() {
        let json = serde_json::to_string(&QaPair::answered("Q?", "A.")).unwrap();
        assert!(!json.contains("error"));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = CaseAnalysisArtifact::from_json("[1, 2").unwrap_err();
        assert!(matches!(err, DomainError::InvalidArtifact(_)));
    }
}
