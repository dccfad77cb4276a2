//! Defense materials synthesized from an analysis artifact.

use serde::{Deserialize, Serialize};

/// The three defense documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefenseKind {
    Strategy,
    ActionItems,
    Timeline,
}

impl DefenseKind {
    /// All kinds in generation order
    pub const ALL: [DefenseKind; 3] = [Self::Strategy, Self::ActionItems, Self::Timeline];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Strategy => "Defense Strategy",
            Self::ActionItems => "Action Items",
            Self::Timeline => "Case Timeline",
        }
    }

    /// File name inside `defense_materials/`
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Strategy => "defense_strategy.md",
            Self::ActionItems => "action_items.md",
            Self::Timeline => "case_timeline.md",
        }
    }

    /// Short label used in logs and progress output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strategy => "defense strategy",
            Self::ActionItems => "action items",
            Self::Timeline => "timeline",
        }
    }
}

impl std::fmt::Display for DefenseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generated defense document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefenseSection {
    pub kind: DefenseKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DefenseSection {
    pub fn generated(kind: DefenseKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            error: None,
        }
    }

    /// Placeholder for a section the backend could not produce
    pub fn failed(kind: DefenseKind, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            kind,
            content: format!("[{} generation failed: {}]", kind.title(), reason),
            error: Some(reason),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Full markdown document as written to disk
    pub fn to_markdown(&self) -> String {
        format!("# {}\n\n{}\n", self.kind.title(), self.content.trim_end())
    }
}

/// Strategy, action items and timeline for one (case, model) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefenseArtifact {
    pub strategy: DefenseSection,
    pub action_items: DefenseSection,
    pub timeline: DefenseSection,
}

impl DefenseArtifact {
    pub fn sections(&self) -> [&DefenseSection; 3] {
        [&self.strategy, &self.action_items, &self.timeline]
    }

    pub fn section(&self, kind: DefenseKind) -> &DefenseSection {
        match kind {
            DefenseKind::Strategy => &self.strategy,
            DefenseKind::ActionItems => &self.action_items,
            DefenseKind::Timeline => &self.timeline,
        }
    }

    pub fn failed_count(&self) -> usize {
        self.sections().iter().filter(|s| s.is_failed()).count()
    }
}
