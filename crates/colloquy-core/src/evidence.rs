//! Evidence records returned by evidence lookups

use serde::{Deserialize, Serialize};

/// Identifier of an evidence record
pub type EvidenceId = String;

/// Source category of a piece of evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Research,
    Statistic,
    ExpertOpinion,
    Historical,
    Anecdotal,
}

/// How closely a piece of evidence bears on its argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relevance {
    Low,
    Medium,
    High,
}

/// A citation backing an argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: EvidenceId,
    pub kind: EvidenceKind,
    pub title: String,
    #[serde(default)]
    pub authors: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
    pub source: String,
    #[serde(default)]
    pub url: Option<String>,
    pub summary: String,
    pub relevance: Relevance,
    /// Credibility (0.0 - 1.0)
    pub credibility_score: f64,
}

impl Evidence {
    /// Whether the record is worth surfacing first in the evidence panel
    pub fn is_strong(&self) -> bool {
        self.relevance == Relevance::High && self.credibility_score >= 0.8
    }
}
