//! Adaptive difficulty and knowledge-state rules.
//!
//! Everything here is deterministic; the model-driven counterparts live in
//! [`crate::tutor`].

pub mod assessment;
pub mod catalog;
pub mod difficulty;
pub mod hierarchy;
pub mod profile;

pub use difficulty::{DifficultyLabel, LevelBand};
pub use profile::{ConceptKnowledge, KnowledgeProfile};
