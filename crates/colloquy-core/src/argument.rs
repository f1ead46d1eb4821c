//! Argument graph nodes

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::expert::ExpertId;

/// Identifier of an argument node
pub type ArgumentId = String;

/// Role an argument plays in the debate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentKind {
    /// Primary claim
    Claim,
    /// Argument backing another argument
    Supporting,
    /// Counter-argument
    Counter,
    /// Reply to a challenge or question
    Response,
    /// Evidence node
    Evidence,
}

/// Epistemic category of a claim, used to colour consensus points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimKind {
    Factual,
    Interpretive,
    Predictive,
    Normative,
}

/// Directed relationship between two graph nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Supports,
    Opposes,
    Evidence,
}

/// A node in the debate's claim/evidence graph.
///
/// Arguments are never edited in place: amendments are new nodes that point
/// back at the original through `supports` or `opposes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    /// Unique identifier
    pub id: ArgumentId,
    /// The argument text
    pub content: String,
    /// Role in the debate
    pub kind: ArgumentKind,
    /// Expert who made the argument (None for system-authored nodes)
    pub speaker_id: Option<ExpertId>,
    /// Argument strength (0.0 - 1.0)
    pub strength: f64,
    /// Cross-expert agreement (0.0 - 1.0)
    pub agreement_level: f64,
    /// Arguments this one supports
    #[serde(default)]
    pub supports: BTreeSet<ArgumentId>,
    /// Arguments this one opposes
    #[serde(default)]
    pub opposes: BTreeSet<ArgumentId>,
    /// Evidence nodes backing this argument
    #[serde(default)]
    pub evidence_ids: BTreeSet<ArgumentId>,
    /// Experts that endorse this argument
    #[serde(default)]
    pub supported_by: BTreeSet<ExpertId>,
    /// Experts that reject this argument
    #[serde(default)]
    pub opposed_by: BTreeSet<ExpertId>,
    /// Claim category, if classified
    #[serde(default)]
    pub claim_kind: Option<ClaimKind>,
}

impl Argument {
    /// Create an argument with neutral strength/agreement and no relations
    pub fn new(id: &str, kind: ArgumentKind, content: &str) -> Self {
        Self {
            id: id.to_string(),
            content: content.to_string(),
            kind,
            speaker_id: None,
            strength: 0.5,
            agreement_level: 0.5,
            supports: BTreeSet::new(),
            opposes: BTreeSet::new(),
            evidence_ids: BTreeSet::new(),
            supported_by: BTreeSet::new(),
            opposed_by: BTreeSet::new(),
            claim_kind: None,
        }
    }

    pub fn spoken_by(mut self, expert: &str) -> Self {
        self.speaker_id = Some(expert.to_string());
        self
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    pub fn with_agreement(mut self, agreement: f64) -> Self {
        self.agreement_level = agreement;
        self
    }

    pub fn supporting(mut self, id: &str) -> Self {
        self.supports.insert(id.to_string());
        self
    }

    pub fn opposing(mut self, id: &str) -> Self {
        self.opposes.insert(id.to_string());
        self
    }

    pub fn with_evidence(mut self, id: &str) -> Self {
        self.evidence_ids.insert(id.to_string());
        self
    }

    pub fn endorsed_by(mut self, experts: &[&str]) -> Self {
        self.supported_by.extend(experts.iter().map(|e| e.to_string()));
        self
    }

    pub fn rejected_by(mut self, experts: &[&str]) -> Self {
        self.opposed_by.extend(experts.iter().map(|e| e.to_string()));
        self
    }

    pub fn with_claim_kind(mut self, kind: ClaimKind) -> Self {
        self.claim_kind = Some(kind);
        self
    }

    /// Every outgoing edge of this node, tagged with its relation
    pub fn relations(&self) -> impl Iterator<Item = (Relation, &ArgumentId)> {
        self.supports
            .iter()
            .map(|id| (Relation::Supports, id))
            .chain(self.opposes.iter().map(|id| (Relation::Opposes, id)))
            .chain(self.evidence_ids.iter().map(|id| (Relation::Evidence, id)))
    }

    /// Experts named by this argument (speaker and endorsement lists)
    pub fn referenced_experts(&self) -> impl Iterator<Item = &ExpertId> {
        self.speaker_id
            .iter()
            .chain(self.supported_by.iter())
            .chain(self.opposed_by.iter())
    }

    pub fn is_evidence(&self) -> bool {
        self.kind == ArgumentKind::Evidence
    }
}
