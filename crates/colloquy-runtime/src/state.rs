//! Session state held by the debate container

use std::collections::BTreeMap;

use serde::Serialize;

use colloquy_core::{
    Argument, ArgumentId, Debate, DebateFormat, DebateParameters, Evidence, EvidenceId, Expert,
    Stage, Takeaways,
};
use colloquy_layout::ArgumentGraph;

/// Everything the debate browser shows, owned by one [`DebateSession`].
///
/// Only [`reduce`] produces new values of this type.
///
/// [`DebateSession`]: crate::DebateSession
/// [`reduce`]: crate::reduce
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DebateSessionState {
    pub current_debate: Option<Debate>,
    /// Roster cache; survives [`Action::Reset`](crate::Action::Reset)
    pub experts: Vec<Expert>,
    pub current_stage_index: usize,
    pub selected_argument_id: Option<ArgumentId>,
    pub evidence_panel_open: bool,
    pub selected_evidence_id: Option<EvidenceId>,
    pub format: DebateFormat,
    pub parameters: DebateParameters,
    pub loading: bool,
    pub error: Option<String>,
    /// Evidence records fetched so far, keyed by the argument they back
    pub evidence: BTreeMap<ArgumentId, Vec<Evidence>>,
    pub takeaways: Option<Takeaways>,
}

impl DebateSessionState {
    /// Initial state with the given session defaults
    pub fn new(format: DebateFormat, parameters: DebateParameters) -> Self {
        Self {
            format,
            parameters,
            ..Default::default()
        }
    }

    pub fn debate(&self) -> Option<&Debate> {
        self.current_debate.as_ref()
    }

    /// All arguments of the current debate, ordered by id
    pub fn arguments(&self) -> Vec<&Argument> {
        self.current_debate
            .iter()
            .flat_map(|d| d.arguments.values())
            .collect()
    }

    pub fn argument(&self, id: &str) -> Option<&Argument> {
        self.current_debate.as_ref()?.argument(id)
    }

    pub fn current_stage(&self) -> Option<&Stage> {
        self.current_debate.as_ref()?.stage(self.current_stage_index)
    }

    pub fn stage_count(&self) -> usize {
        self.current_debate.as_ref().map_or(0, |d| d.stages.len())
    }

    pub fn selected_argument(&self) -> Option<&Argument> {
        self.argument(self.selected_argument_id.as_deref()?)
    }

    /// Cached evidence for an argument
    pub fn evidence_for(&self, argument_id: &str) -> &[Evidence] {
        self.evidence.get(argument_id).map_or(&[], Vec::as_slice)
    }

    /// Evidence record by id, searched across every cached argument
    pub fn find_evidence(&self, evidence_id: &str) -> Option<&Evidence> {
        self.evidence
            .values()
            .flatten()
            .find(|e| e.id == evidence_id)
    }

    /// Visible subgraph of the current stage; empty without a debate
    pub fn stage_graph(&self) -> ArgumentGraph {
        match &self.current_debate {
            Some(debate) => ArgumentGraph::for_debate_stage(debate, self.current_stage_index),
            None => ArgumentGraph::default(),
        }
    }
}
