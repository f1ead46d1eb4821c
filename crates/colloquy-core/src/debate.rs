//! Debates and their structural invariants
//!
//! A [`Debate`] arrives from a generation provider and is validated once at the
//! boundary with [`Debate::validate`]. After that it only grows: new arguments
//! and stages are appended through [`Debate::append_argument`] and
//! [`Debate::append_stage`], which check the same invariants for the new node.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::argument::{Argument, ArgumentId};
use crate::expert::{validate_roster_ids, ExpertId, InvalidRosterError};
use crate::stage::{Stage, StageKind};

/// Identifier of a debate
pub type DebateId = String;

/// Structural violations in a debate or in a node being appended to it
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedDebateError {
    #[error("Invalid roster: {0}")]
    Roster(#[from] InvalidRosterError),
    #[error("Argument stored under key {key} has id {id}")]
    KeyMismatch { key: ArgumentId, id: ArgumentId },
    #[error("Argument already exists: {0}")]
    DuplicateArgument(ArgumentId),
    #[error("Stage already exists: {0}")]
    DuplicateStage(String),
    #[error("Argument {0} references itself")]
    SelfReference(ArgumentId),
    #[error("Argument {from} references unknown argument {to}")]
    DanglingArgument { from: ArgumentId, to: ArgumentId },
    #[error("Stage {stage} references unknown argument {argument}")]
    DanglingStageArgument { stage: String, argument: ArgumentId },
    #[error("{owner} references expert {expert} who is not in the debate")]
    UnknownExpert { owner: String, expert: ExpertId },
    #[error("Argument {argument} has {field} = {value}, expected a value in [0, 1]")]
    OutOfRange {
        argument: ArgumentId,
        field: &'static str,
        value: f64,
    },
}

/// Error parsing a [`DebateFormat`] from text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown debate format: {0}")]
pub struct ParseFormatError(pub String);

/// Structure the debate follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebateFormat {
    /// Opening statements, open exchange, closings
    #[default]
    Standard,
    /// Motion for and against, with rebuttals
    Oxford,
    /// Question-led dialogue
    Socratic,
    /// Every expert answers each round in turn
    Roundtable,
}

impl DebateFormat {
    pub const ALL: [DebateFormat; 4] = [
        DebateFormat::Standard,
        DebateFormat::Oxford,
        DebateFormat::Socratic,
        DebateFormat::Roundtable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Oxford => "oxford",
            Self::Socratic => "socratic",
            Self::Roundtable => "roundtable",
        }
    }

    /// Ordered stage kinds a debate in this format produces
    pub fn stage_plan(&self) -> &'static [StageKind] {
        use StageKind::*;
        match self {
            Self::Standard => &[Introduction, Statement, Exchange, Closing, Summary],
            Self::Oxford => &[Introduction, Statement, Exchange, Exchange, Closing, Summary],
            Self::Socratic => &[Introduction, Exchange, Exchange, Exchange, Summary],
            Self::Roundtable => &[Introduction, Statement, Exchange, Summary],
        }
    }
}

impl fmt::Display for DebateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DebateFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DebateFormat::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseFormatError(s.to_string()))
    }
}

/// A generated debate: roster, ordered timeline and argument graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debate {
    pub id: DebateId,
    pub topic: String,
    pub format: DebateFormat,
    /// Participating experts in speaking order (2–4, unique)
    pub expert_ids: Vec<ExpertId>,
    /// Timeline; order is significant and fixed once generated
    pub stages: Vec<Stage>,
    /// Argument graph keyed by argument id
    pub arguments: BTreeMap<ArgumentId, Argument>,
}

impl Debate {
    /// Create an empty debate
    pub fn new(id: &str, topic: &str, format: DebateFormat, expert_ids: Vec<ExpertId>) -> Self {
        Self {
            id: id.to_string(),
            topic: topic.to_string(),
            format,
            expert_ids,
            stages: Vec::new(),
            arguments: BTreeMap::new(),
        }
    }

    /// Check every structural invariant of the debate
    pub fn validate(&self) -> Result<(), MalformedDebateError> {
        validate_roster_ids(self.expert_ids.iter().map(String::as_str))?;

        for (key, argument) in &self.arguments {
            if key != &argument.id {
                return Err(MalformedDebateError::KeyMismatch {
                    key: key.clone(),
                    id: argument.id.clone(),
                });
            }
            self.check_argument(argument)?;
        }

        let mut stage_ids = HashSet::new();
        for stage in &self.stages {
            if !stage_ids.insert(stage.id.as_str()) {
                return Err(MalformedDebateError::DuplicateStage(stage.id.clone()));
            }
            self.check_stage(stage)?;
        }

        Ok(())
    }

    /// Validate an argument that is about to be appended
    pub fn check_new_argument(&self, argument: &Argument) -> Result<(), MalformedDebateError> {
        if self.arguments.contains_key(&argument.id) {
            return Err(MalformedDebateError::DuplicateArgument(argument.id.clone()));
        }
        self.check_argument(argument)
    }

    /// Append a new argument after validating it against the graph
    pub fn append_argument(&mut self, argument: Argument) -> Result<(), MalformedDebateError> {
        self.check_new_argument(&argument)?;
        tracing::trace!(debate_id = %self.id, argument_id = %argument.id, "Appending argument");
        self.arguments.insert(argument.id.clone(), argument);
        Ok(())
    }

    /// Append a new stage to the end of the timeline
    pub fn append_stage(&mut self, stage: Stage) -> Result<(), MalformedDebateError> {
        if self.stages.iter().any(|s| s.id == stage.id) {
            return Err(MalformedDebateError::DuplicateStage(stage.id));
        }
        self.check_stage(&stage)?;
        self.stages.push(stage);
        Ok(())
    }

    pub fn argument(&self, id: &str) -> Option<&Argument> {
        self.arguments.get(id)
    }

    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    pub fn has_expert(&self, id: &str) -> bool {
        self.expert_ids.iter().any(|e| e == id)
    }

    /// Arguments spoken by the given expert
    pub fn arguments_by<'a>(&'a self, expert: &'a str) -> impl Iterator<Item = &'a Argument> {
        self.arguments
            .values()
            .filter(move |a| a.speaker_id.as_deref() == Some(expert))
    }

    fn check_argument(&self, argument: &Argument) -> Result<(), MalformedDebateError> {
        for (field, value) in [
            ("strength", argument.strength),
            ("agreement_level", argument.agreement_level),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(MalformedDebateError::OutOfRange {
                    argument: argument.id.clone(),
                    field,
                    value,
                });
            }
        }

        for (_, target) in argument.relations() {
            if target == &argument.id {
                return Err(MalformedDebateError::SelfReference(argument.id.clone()));
            }
            if !self.arguments.contains_key(target) {
                return Err(MalformedDebateError::DanglingArgument {
                    from: argument.id.clone(),
                    to: target.clone(),
                });
            }
        }

        if let Some(expert) = argument.referenced_experts().find(|e| !self.has_expert(e)) {
            return Err(MalformedDebateError::UnknownExpert {
                owner: format!("Argument {}", argument.id),
                expert: expert.clone(),
            });
        }

        Ok(())
    }

    fn check_stage(&self, stage: &Stage) -> Result<(), MalformedDebateError> {
        if let Some(speaker) = stage.speaker_id.as_ref().filter(|s| !self.has_expert(s)) {
            return Err(MalformedDebateError::UnknownExpert {
                owner: format!("Stage {}", stage.id),
                expert: speaker.clone(),
            });
        }
        if let Some(missing) = stage
            .argument_ids
            .iter()
            .find(|id| !self.arguments.contains_key(*id))
        {
            return Err(MalformedDebateError::DanglingStageArgument {
                stage: stage.id.clone(),
                argument: missing.clone(),
            });
        }
        Ok(())
    }
}
