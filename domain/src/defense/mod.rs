//! Defense materials: strategy, action items and timeline.

pub mod entities;

pub use entities::{DefenseArtifact, DefenseKind, DefenseSection};
