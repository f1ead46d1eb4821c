//! Debate generation parameters

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Audience expertise the debate is pitched at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechnicalLevel {
    Beginner,
    #[default]
    Medium,
    Expert,
}

/// Angle the experts are asked to emphasise
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    Ethical,
    Practical,
    Theoretical,
    Historical,
}

/// Parameters steering debate generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateParameters {
    /// Depth versus breadth (0.0 = broad survey, 1.0 = deep dive)
    pub depth: f64,
    pub technical_level: TechnicalLevel,
    pub emphasis: BTreeSet<Emphasis>,
}

impl Default for DebateParameters {
    fn default() -> Self {
        Self {
            depth: 0.5,
            technical_level: TechnicalLevel::Medium,
            emphasis: [Emphasis::Ethical, Emphasis::Practical].into_iter().collect(),
        }
    }
}

/// A partial parameter update; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterUpdate {
    pub depth: Option<f64>,
    pub technical_level: Option<TechnicalLevel>,
    pub emphasis: Option<BTreeSet<Emphasis>>,
}

impl ParameterUpdate {
    pub fn depth(depth: f64) -> Self {
        Self {
            depth: Some(depth),
            ..Default::default()
        }
    }

    /// Shallow-merge into `params`, field by field
    pub fn apply_to(&self, params: &DebateParameters) -> DebateParameters {
        DebateParameters {
            depth: self.depth.unwrap_or(params.depth),
            technical_level: self.technical_level.unwrap_or(params.technical_level),
            emphasis: self
                .emphasis
                .clone()
                .unwrap_or_else(|| params.emphasis.clone()),
        }
    }
}
