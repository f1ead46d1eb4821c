//! Debate provider trait and common types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use colloquy_core::{
    Argument, ArgumentId, Debate, DebateFormat, DebateId, DebateParameters, Evidence, ExpertId,
    Takeaways,
};

/// Errors from debate providers
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("Generation failed: {0}")]
    Failed(String),
    #[error("Debate not found: {0}")]
    NotFound(DebateId),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Provider not available")]
    NotAvailable,
}

/// A request to generate a new debate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateRequest {
    pub topic: String,
    /// Participating experts in speaking order
    pub expert_ids: Vec<ExpertId>,
    pub format: DebateFormat,
    #[serde(default)]
    pub parameters: DebateParameters,
}

impl DebateRequest {
    /// Create a request with default parameters
    pub fn new(topic: &str, expert_ids: &[&str], format: DebateFormat) -> Self {
        Self {
            topic: topic.to_string(),
            expert_ids: expert_ids.iter().map(|e| e.to_string()).collect(),
            format,
            parameters: DebateParameters::default(),
        }
    }

    pub fn with_parameters(mut self, parameters: DebateParameters) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Answers to a follow-up question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpResponse {
    pub arguments: Vec<Argument>,
}

/// Expert reactions to a challenged assumption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeResponse {
    pub responses: Vec<Argument>,
}

/// Evidence found for an argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceResponse {
    pub argument_id: ArgumentId,
    pub evidence: Vec<Evidence>,
}

/// A strengthened restatement of an argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteelmanResponse {
    pub steelman: Argument,
    #[serde(default)]
    pub additional_evidence: Vec<Evidence>,
}

/// Expert reactions to a consideration the user introduced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsiderationResponse {
    pub responses: Vec<Argument>,
    /// How much the consideration bears on the topic (0.0 - 1.0)
    pub relevance: f64,
}

/// Trait for debate generation and interaction backends
#[async_trait]
pub trait DebateProvider: Send + Sync + std::fmt::Debug {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Check if the provider is available
    async fn is_available(&self) -> bool {
        true
    }

    /// Generate a new debate
    async fn generate_debate(&self, request: DebateRequest) -> Result<Debate, GenerationError>;

    /// Fetch a previously generated debate
    async fn get_debate(&self, debate_id: &str) -> Result<Debate, GenerationError>;

    /// Ask a question, optionally of one expert
    async fn ask_follow_up(
        &self,
        debate_id: &str,
        question: &str,
        target_expert: Option<&str>,
    ) -> Result<FollowUpResponse, GenerationError>;

    /// Challenge the assumption behind an argument
    async fn challenge_assumption(
        &self,
        debate_id: &str,
        argument_id: &str,
        challenge: &str,
    ) -> Result<ChallengeResponse, GenerationError>;

    /// Look up evidence for an argument
    async fn request_evidence(
        &self,
        debate_id: &str,
        argument_id: &str,
    ) -> Result<EvidenceResponse, GenerationError>;

    /// Produce the strongest version of an argument
    async fn generate_steelman(
        &self,
        debate_id: &str,
        argument_id: &str,
    ) -> Result<SteelmanResponse, GenerationError>;

    /// Introduce a new consideration into the debate
    async fn introduce_consideration(
        &self,
        debate_id: &str,
        consideration: &str,
    ) -> Result<ConsiderationResponse, GenerationError>;

    /// Summarise the debate into takeaways
    async fn generate_takeaways(&self, debate_id: &str) -> Result<Takeaways, GenerationError>;
}
