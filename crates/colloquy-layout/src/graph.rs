//! Visible argument subgraph for a stage

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use colloquy_core::{Argument, ArgumentId, ArgumentKind, Debate, ExpertId, Relation};

/// Labels longer than this are truncated with an ellipsis
const LABEL_MAX_CHARS: usize = 60;

/// Visual radius of a node: evidence is small and fixed, everything else
/// grows with argument strength.
pub fn node_radius(kind: ArgumentKind, strength: f64) -> f64 {
    match kind {
        ArgumentKind::Evidence => 10.0,
        _ => 20.0 + 10.0 * strength,
    }
}

fn label_for(content: &str) -> String {
    if content.chars().count() > LABEL_MAX_CHARS {
        let truncated: String = content.chars().take(LABEL_MAX_CHARS).collect();
        format!("{truncated}...")
    } else {
        content.to_string()
    }
}

/// A node of the visible subgraph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: ArgumentId,
    pub kind: ArgumentKind,
    pub label: String,
    pub strength: f64,
    pub radius: f64,
    /// True for the stage's own arguments, false for one-hop neighbours
    pub primary: bool,
    pub speaker_id: Option<ExpertId>,
}

/// A directed, relation-tagged edge of the visible subgraph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphLink {
    pub source: ArgumentId,
    pub target: ArgumentId,
    pub relation: Relation,
}

/// The arguments of one stage plus their direct neighbours
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArgumentGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl ArgumentGraph {
    /// Build the visible subgraph for a stage.
    ///
    /// Starts from the stage's primary arguments and adds the direct
    /// `supports`, `opposes` and evidence targets of each, one hop only.
    /// Ids that do not resolve in `arguments` are dropped together with
    /// any link touching them.
    pub fn for_stage(
        stage_argument_ids: &[ArgumentId],
        arguments: &BTreeMap<ArgumentId, Argument>,
    ) -> Self {
        let primary: HashSet<&str> = stage_argument_ids.iter().map(String::as_str).collect();
        let mut visible: Vec<&ArgumentId> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut links = Vec::new();

        for id in stage_argument_ids {
            if seen.insert(id.as_str()) {
                visible.push(id);
            }
            let Some(argument) = arguments.get(id) else {
                continue;
            };
            for (relation, target) in argument.relations() {
                if seen.insert(target.as_str()) {
                    visible.push(target);
                }
                links.push(GraphLink {
                    source: id.clone(),
                    target: target.clone(),
                    relation,
                });
            }
        }

        let nodes: Vec<GraphNode> = visible
            .into_iter()
            .filter_map(|id| arguments.get(id))
            .map(|arg| GraphNode {
                id: arg.id.clone(),
                kind: arg.kind,
                label: label_for(&arg.content),
                strength: arg.strength,
                radius: node_radius(arg.kind, arg.strength),
                primary: primary.contains(arg.id.as_str()),
                speaker_id: arg.speaker_id.clone(),
            })
            .collect();

        let present: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        links.retain(|l| present.contains(l.source.as_str()) && present.contains(l.target.as_str()));

        tracing::trace!(
            nodes = nodes.len(),
            links = links.len(),
            "Built stage argument graph"
        );

        Self { nodes, links }
    }

    /// Visible subgraph for the stage at `index`; empty when out of range
    pub fn for_debate_stage(debate: &Debate, index: usize) -> Self {
        match debate.stage(index) {
            Some(stage) => Self::for_stage(&stage.argument_ids, &debate.arguments),
            None => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
