//! # Colloquy Core
//!
//! Core types for a multi-expert debate session:
//! - [`Expert`]: immutable persona reference data and the built-in catalogue
//! - [`Argument`]: a node in the debate's claim/evidence graph
//! - [`Stage`]: one ordered unit of the debate timeline
//! - [`Debate`]: the full generated debate, validated at the boundary
//! - [`Evidence`]: citation records returned by evidence lookups
//!
//! ## Quick Start
//!
//! ```rust
//! use colloquy_core::{catalog, Roster};
//!
//! let experts = catalog();
//! let roster = Roster::new(experts[..3].to_vec()).unwrap();
//! assert_eq!(roster.len(), 3);
//! ```

pub mod argument;
pub mod debate;
pub mod evidence;
pub mod expert;
pub mod params;
pub mod stage;
pub mod takeaways;

pub use argument::{Argument, ArgumentId, ArgumentKind, ClaimKind, Relation};
pub use debate::{Debate, DebateFormat, DebateId, MalformedDebateError, ParseFormatError};
pub use evidence::{Evidence, EvidenceId, EvidenceKind, Relevance};
pub use expert::{
    catalog, relevance_score, relevant_experts, suggested_combinations, validate_roster_ids,
    Expert, ExpertId, InvalidRosterError, Roster, MAX_EXPERTS, MIN_EXPERTS,
};
pub use params::{DebateParameters, Emphasis, ParameterUpdate, TechnicalLevel};
pub use stage::{suggest_follow_ups, Stage, StageKind};
pub use takeaways::{
    ActionableConsideration, ConsensusLevel, KeyInsight, KnowledgeGap, RecommendedResource,
    Takeaways,
};
