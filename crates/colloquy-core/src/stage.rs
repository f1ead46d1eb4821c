//! Debate timeline stages

use serde::{Deserialize, Serialize};

use crate::argument::ArgumentId;
use crate::expert::ExpertId;

/// Narrative role of a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Introduction,
    Statement,
    Exchange,
    Closing,
    Summary,
}

impl StageKind {
    /// Short timeline label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Introduction => "Intro",
            Self::Statement => "Openings",
            Self::Exchange => "Discussion",
            Self::Closing => "Conclusions",
            Self::Summary => "Summary",
        }
    }
}

/// One ordered unit of the debate timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: String,
    pub kind: StageKind,
    /// Speaking expert (None for moderator stages)
    pub speaker_id: Option<ExpertId>,
    pub title: String,
    pub content: String,
    /// Primary arguments of this stage, in presentation order
    #[serde(default)]
    pub argument_ids: Vec<ArgumentId>,
}

impl Stage {
    pub fn new(id: &str, kind: StageKind, title: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            speaker_id: None,
            title: title.to_string(),
            content: String::new(),
            argument_ids: Vec::new(),
        }
    }
}

/// Up to three follow-up questions suited to the stage being viewed
pub fn suggest_follow_ups(stage: &Stage, topic: &str) -> Vec<String> {
    let mut suggestions = match stage.kind {
        StageKind::Statement => vec![
            format!("How does this view on {topic} address potential counterarguments?"),
            format!("What evidence exists to support this position on {topic}?"),
        ],
        StageKind::Exchange => vec![
            format!("How would you reconcile these different perspectives on {topic}?"),
            "What implications does this disagreement have for practical applications?".to_string(),
        ],
        StageKind::Closing => vec![
            format!("What remaining questions need to be addressed about {topic}?"),
            format!("How might these insights on {topic} be applied in real-world scenarios?"),
        ],
        StageKind::Introduction | StageKind::Summary => Vec::new(),
    };

    suggestions.push("Could you elaborate on the ethical implications of this perspective?".to_string());
    suggestions.push("How would this approach affect different stakeholders?".to_string());
    suggestions.truncate(3);
    suggestions
}
