//! Summarised debate takeaways

use serde::{Deserialize, Serialize};

use crate::argument::ArgumentId;
use crate::evidence::Relevance;
use crate::expert::ExpertId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusLevel {
    Low,
    Medium,
    High,
}

impl ConsensusLevel {
    /// Bucket an agreement score the same way the consensus map does
    pub fn from_agreement(agreement: f64) -> Self {
        if agreement > 0.7 {
            Self::High
        } else if agreement < 0.4 {
            Self::Low
        } else {
            Self::Medium
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyInsight {
    pub id: String,
    pub content: String,
    pub consensus_level: ConsensusLevel,
    pub experts: Vec<ExpertId>,
    /// Argument the insight was drawn from, if any
    pub source_argument: Option<ArgumentId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionableConsideration {
    pub id: String,
    pub content: String,
    pub difficulty: Relevance,
    pub impact: Relevance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGap {
    pub id: String,
    pub content: String,
    pub significance: Relevance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedResource {
    pub id: String,
    pub title: String,
    pub kind: String,
    pub relevance: Relevance,
}

/// Key insights, practical considerations, open questions and reading list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Takeaways {
    pub key_insights: Vec<KeyInsight>,
    pub actionable_considerations: Vec<ActionableConsideration>,
    pub knowledge_gaps: Vec<KnowledgeGap>,
    pub recommended_resources: Vec<RecommendedResource>,
}

impl Takeaways {
    /// Total number of items across all sections
    pub fn len(&self) -> usize {
        self.key_insights.len()
            + self.actionable_considerations.len()
            + self.knowledge_gaps.len()
            + self.recommended_resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
