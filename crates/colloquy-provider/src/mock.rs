//! Mock debate provider for testing and offline use

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use colloquy_core::{
    ActionableConsideration, Argument, ArgumentKind, ClaimKind, ConsensusLevel, Debate,
    EvidenceKind, Evidence, ExpertId, KeyInsight, KnowledgeGap, RecommendedResource, Relevance,
    Stage, StageKind, Takeaways,
};

use crate::provider::{
    ChallengeResponse, ConsiderationResponse, DebateProvider, DebateRequest, EvidenceResponse,
    FollowUpResponse, GenerationError, SteelmanResponse,
};

/// How the mock answers
#[derive(Debug, Clone, PartialEq)]
enum Behavior {
    /// Well-formed canned content
    Scripted,
    /// Every call fails with this message
    Failing(String),
    /// Generated debates contain a dangling reference
    Malformed,
}

/// A mock provider that builds canned debates from the request.
///
/// Generated debates are kept so that interactions can refer back to their
/// experts and arguments.
#[derive(Debug)]
pub struct MockProvider {
    /// Name of this mock
    pub name: String,
    behavior: Behavior,
    /// Simulated latency
    latency: Duration,
    /// Source of unique ids for generated nodes
    counter: AtomicUsize,
    /// Number of provider calls served
    calls: AtomicUsize,
    debates: RwLock<HashMap<String, Debate>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Create a mock with 50 ms simulated latency
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            behavior: Behavior::Scripted,
            latency: Duration::from_millis(50),
            counter: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            debates: RwLock::new(HashMap::new()),
        }
    }

    /// Create a mock that answers immediately
    pub fn instant() -> Self {
        Self::new().with_latency(Duration::ZERO)
    }

    /// Create a mock whose every call fails
    pub fn failing(message: &str) -> Self {
        Self {
            name: "failing-mock".to_string(),
            behavior: Behavior::Failing(message.to_string()),
            ..Self::instant()
        }
    }

    /// Create a mock that generates debates violating graph invariants
    pub fn malformed() -> Self {
        Self {
            name: "malformed-mock".to_string(),
            behavior: Behavior::Malformed,
            ..Self::instant()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of calls served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", prefix, n)
    }

    /// Simulate latency and apply the failure behaviour
    async fn begin(&self, operation: &str) -> Result<(), GenerationError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(provider = %self.name, operation, "Mock provider call");
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match &self.behavior {
            Behavior::Failing(message) => Err(GenerationError::Failed(message.clone())),
            _ => Ok(()),
        }
    }

    async fn stored(&self, debate_id: &str) -> Result<Debate, GenerationError> {
        self.debates
            .read()
            .await
            .get(debate_id)
            .cloned()
            .ok_or_else(|| GenerationError::NotFound(debate_id.to_string()))
    }

    fn build_debate(&self, request: &DebateRequest) -> Result<Debate, GenerationError> {
        let debate_id = format!("debate-{}", uuid::Uuid::new_v4());
        let mut script = Script::new(&debate_id, request);
        for (round, kind) in request.format.stage_plan().iter().enumerate() {
            script.stage(round, *kind)?;
        }
        Ok(script.debate)
    }

    fn evidence_for(&self, argument_id: &str) -> Vec<Evidence> {
        vec![
            Evidence {
                id: self.next_id("ev"),
                kind: EvidenceKind::Research,
                title: "Example Research Study".to_string(),
                authors: Some("Smith et al.".to_string()),
                year: Some(2023),
                source: "Journal of Example Studies".to_string(),
                url: Some("https://example.com/research".to_string()),
                summary: format!("A controlled study bearing directly on argument {}", argument_id),
                relevance: Relevance::High,
                credibility_score: 0.87,
            },
            Evidence {
                id: self.next_id("ev"),
                kind: EvidenceKind::Statistic,
                title: "Survey Results".to_string(),
                authors: None,
                year: Some(2024),
                source: "Global Statistics Institute".to_string(),
                url: Some("https://example.com/statistics".to_string()),
                summary: "According to this survey, 72% of participants agreed".to_string(),
                relevance: Relevance::Medium,
                credibility_score: 0.79,
            },
        ]
    }
}

/// Builds a canned debate stage by stage
struct Script<'a> {
    request: &'a DebateRequest,
    debate: Debate,
    next: usize,
    /// Each expert's opening claim, by roster position
    claims: Vec<String>,
}

impl<'a> Script<'a> {
    fn new(debate_id: &str, request: &'a DebateRequest) -> Self {
        Self {
            request,
            debate: Debate::new(
                debate_id,
                &request.topic,
                request.format,
                request.expert_ids.clone(),
            ),
            next: 0,
            claims: Vec::new(),
        }
    }

    fn id(&mut self) -> String {
        self.next += 1;
        format!("arg-{}", self.next)
    }

    fn experts(&self) -> &[ExpertId] {
        &self.request.expert_ids
    }

    fn push(&mut self, argument: Argument) -> Result<String, GenerationError> {
        let id = argument.id.clone();
        self.debate
            .append_argument(argument)
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
        Ok(id)
    }

    /// One evidence-backed claim per expert
    fn opening_claims(&mut self, stage: &mut Stage, topic: &str) -> Result<(), GenerationError> {
        const KINDS: [ClaimKind; 4] = [
            ClaimKind::Normative,
            ClaimKind::Factual,
            ClaimKind::Predictive,
            ClaimKind::Interpretive,
        ];
        const AGREEMENT: [f64; 4] = [0.85, 0.75, 0.3, 0.55];
        let experts = self.experts().to_vec();
        for (i, expert) in experts.iter().enumerate() {
            let evidence_id = self.id();
            self.push(
                Argument::new(&evidence_id, ArgumentKind::Evidence, "Supporting study")
                    .with_strength(0.7),
            )?;

            let claim_id = self.id();
            let mut claim = Argument::new(
                &claim_id,
                ArgumentKind::Claim,
                &format!("Let's begin our discussion on {}. From my perspective...", topic),
            )
            .spoken_by(expert)
            .with_strength(0.6 + 0.1 * (i % 3) as f64)
            .with_agreement(AGREEMENT[i % 4])
            .with_evidence(&evidence_id)
            .with_claim_kind(KINDS[i % 4])
            .endorsed_by(&[expert.as_str()]);
            match (i, experts.get(1)) {
                // The first claim is shared with the second expert
                (0, Some(second)) => claim = claim.endorsed_by(&[second.as_str()]),
                (2, _) => claim = claim.rejected_by(&[experts[0].as_str()]),
                _ => {}
            }
            self.push(claim)?;
            self.claims.push(claim_id.clone());
            stage.argument_ids.push(claim_id);
        }
        Ok(())
    }

    fn stage(&mut self, round: usize, kind: StageKind) -> Result<(), GenerationError> {
        let topic = self.request.topic.clone();
        let mut stage = Stage::new(&format!("stage-{}", round + 1), kind, kind.label());

        match kind {
            StageKind::Introduction => {
                stage.content = format!(
                    "Welcome to this {} debate on \"{}\" with {} experts.",
                    self.request.format,
                    topic,
                    self.experts().len()
                );
            }
            StageKind::Statement => {
                self.opening_claims(&mut stage, &topic)?;
                stage.content = format!("Opening statements on {}", topic);
            }
            StageKind::Exchange => {
                // Question-led formats open straight into exchanges
                if self.claims.is_empty() {
                    self.opening_claims(&mut stage, &topic)?;
                }
                let experts = self.experts().to_vec();
                let n = experts.len();
                for (i, expert) in experts.iter().enumerate() {
                    let Some(target) = self.claims.get(i).cloned() else {
                        continue;
                    };
                    let critic = &experts[(i + 1 + round) % n];
                    let critic = if critic == expert { &experts[(i + 1) % n] } else { critic };

                    let counter_id = self.id();
                    self.push(
                        Argument::new(
                            &counter_id,
                            ArgumentKind::Counter,
                            "I'd approach that differently. Consider that...",
                        )
                        .spoken_by(critic)
                        .with_strength(0.55)
                        .with_agreement(0.25)
                        .opposing(&target)
                        .rejected_by(&[expert.as_str()]),
                    )?;

                    let reply_id = self.id();
                    self.push(
                        Argument::new(
                            &reply_id,
                            ArgumentKind::Response,
                            "I appreciate the challenge. Let me clarify...",
                        )
                        .spoken_by(expert)
                        .with_strength(0.5)
                        .supporting(&target)
                        .opposing(&counter_id),
                    )?;
                    stage.argument_ids.push(counter_id);
                    stage.argument_ids.push(reply_id);
                }
                stage.content = "The experts respond to one another".to_string();
            }
            StageKind::Closing => {
                let experts = self.experts().to_vec();
                for (i, expert) in experts.iter().enumerate() {
                    let mut closing = Argument::new(
                        &self.id(),
                        ArgumentKind::Response,
                        "In closing, the strongest case remains...",
                    )
                    .spoken_by(expert)
                    .with_strength(0.65);
                    if let Some(claim) = self.claims.get(i) {
                        closing = closing.supporting(claim);
                    }
                    stage.argument_ids.push(self.push(closing)?);
                }
                stage.content = "Closing statements".to_string();
            }
            StageKind::Summary => {
                let request = self.request;
                let everyone: Vec<&str> = request.expert_ids.iter().map(String::as_str).collect();
                let mut synthesis = Argument::new(
                    &self.id(),
                    ArgumentKind::Claim,
                    &format!("All experts agree that {} deserves careful attention", topic),
                )
                .with_strength(0.8)
                .with_agreement(0.9)
                .with_claim_kind(ClaimKind::Interpretive)
                .endorsed_by(&everyone);
                if let Some(first) = self.claims.first() {
                    synthesis = synthesis.supporting(first);
                }
                stage.argument_ids.push(self.push(synthesis)?);
                stage.content = format!("Summary of the debate on {}", topic);
            }
        }

        self.debate
            .append_stage(stage)
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl DebateProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_debate(&self, request: DebateRequest) -> Result<Debate, GenerationError> {
        self.begin("generate_debate").await?;
        tracing::info!(
            topic = %request.topic,
            format = %request.format,
            experts = ?request.expert_ids,
            "Generating debate"
        );

        let mut debate = self.build_debate(&request)?;
        if self.behavior == Behavior::Malformed {
            // Bypass append validation to emulate a broken backend
            let broken = Argument::new("dangling", ArgumentKind::Counter, "Refers to nothing")
                .opposing("missing-argument");
            debate.arguments.insert(broken.id.clone(), broken);
        }

        self.debates
            .write()
            .await
            .insert(debate.id.clone(), debate.clone());
        Ok(debate)
    }

    async fn get_debate(&self, debate_id: &str) -> Result<Debate, GenerationError> {
        self.begin("get_debate").await?;
        self.stored(debate_id).await
    }

    async fn ask_follow_up(
        &self,
        debate_id: &str,
        question: &str,
        target_expert: Option<&str>,
    ) -> Result<FollowUpResponse, GenerationError> {
        self.begin("ask_follow_up").await?;
        let debate = self.stored(debate_id).await?;

        let speakers: Vec<&ExpertId> = match target_expert {
            Some(target) => debate.expert_ids.iter().filter(|e| *e == target).collect(),
            None => debate.expert_ids.iter().take(2).collect(),
        };
        if speakers.is_empty() {
            return Err(GenerationError::InvalidResponse(format!(
                "Expert {} is not part of debate {}",
                target_expert.unwrap_or_default(),
                debate_id
            )));
        }

        let arguments = speakers
            .into_iter()
            .map(|expert| {
                let mut answer = Argument::new(
                    &self.next_id("followup"),
                    ArgumentKind::Response,
                    &format!("That's an interesting question about {}. My analysis suggests...", question),
                )
                .spoken_by(expert)
                .with_strength(0.6);
                if let Some(claim) = debate
                    .arguments_by(expert)
                    .find(|a| a.kind == ArgumentKind::Claim)
                {
                    answer = answer.supporting(&claim.id);
                }
                answer
            })
            .collect();

        Ok(FollowUpResponse { arguments })
    }

    async fn challenge_assumption(
        &self,
        debate_id: &str,
        argument_id: &str,
        challenge: &str,
    ) -> Result<ChallengeResponse, GenerationError> {
        self.begin("challenge_assumption").await?;
        let debate = self.stored(debate_id).await?;

        let defender = debate
            .argument(argument_id)
            .and_then(|a| a.speaker_id.clone())
            .or_else(|| debate.expert_ids.first().cloned())
            .ok_or_else(|| GenerationError::InvalidResponse("Debate has no experts".to_string()))?;
        let challenger = debate
            .expert_ids
            .iter()
            .find(|e| **e != defender)
            .cloned()
            .unwrap_or_else(|| defender.clone());

        let responses = vec![
            Argument::new(
                &self.next_id("challenge"),
                ArgumentKind::Response,
                &format!("I appreciate the challenge that {}. Let me clarify...", challenge),
            )
            .spoken_by(&defender)
            .with_strength(0.55)
            .supporting(argument_id),
            Argument::new(
                &self.next_id("challenge"),
                ArgumentKind::Counter,
                "The challenge exposes a real weakness in that assumption.",
            )
            .spoken_by(&challenger)
            .with_strength(0.6)
            .with_agreement(0.35)
            .opposing(argument_id)
            .rejected_by(&[defender.as_str()]),
        ];

        Ok(ChallengeResponse { responses })
    }

    async fn request_evidence(
        &self,
        debate_id: &str,
        argument_id: &str,
    ) -> Result<EvidenceResponse, GenerationError> {
        self.begin("request_evidence").await?;
        self.stored(debate_id).await?;
        Ok(EvidenceResponse {
            argument_id: argument_id.to_string(),
            evidence: self.evidence_for(argument_id),
        })
    }

    async fn generate_steelman(
        &self,
        debate_id: &str,
        argument_id: &str,
    ) -> Result<SteelmanResponse, GenerationError> {
        self.begin("generate_steelman").await?;
        let debate = self.stored(debate_id).await?;

        let original = debate.argument(argument_id);
        let strength = original.map(|a| (a.strength + 0.2).min(1.0)).unwrap_or(0.8);
        let mut steelman = Argument::new(
            &self.next_id("steelman"),
            ArgumentKind::Supporting,
            "A stronger version of the argument would be: the evidence suggests that...",
        )
        .with_strength(strength)
        .supporting(argument_id);
        if let Some(speaker) = original.and_then(|a| a.speaker_id.as_deref()) {
            steelman = steelman.spoken_by(speaker);
        }

        let mut additional_evidence = self.evidence_for(argument_id);
        additional_evidence.truncate(1);

        Ok(SteelmanResponse {
            steelman,
            additional_evidence,
        })
    }

    async fn introduce_consideration(
        &self,
        debate_id: &str,
        consideration: &str,
    ) -> Result<ConsiderationResponse, GenerationError> {
        self.begin("introduce_consideration").await?;
        let debate = self.stored(debate_id).await?;

        let mut responses = Vec::new();
        let mut experts = debate.expert_ids.iter();
        if let Some(first) = experts.next() {
            responses.push(
                Argument::new(
                    &self.next_id("consideration"),
                    ArgumentKind::Response,
                    &format!("{} is an important consideration. In my view...", consideration),
                )
                .spoken_by(first)
                .with_strength(0.6)
                .with_agreement(0.5),
            );
        }
        if let (Some(second), Some(first_id)) = (experts.next(), responses.first().map(|a| a.id.clone())) {
            responses.push(
                Argument::new(
                    &self.next_id("consideration"),
                    ArgumentKind::Counter,
                    "I'd approach that consideration differently. Consider that...",
                )
                .spoken_by(second)
                .with_strength(0.55)
                .with_agreement(0.3)
                .opposing(&first_id),
            );
        }

        let words = consideration.split_whitespace().count() as f64;
        let relevance = (0.5 + 0.05 * words).min(0.95);

        Ok(ConsiderationResponse {
            responses,
            relevance,
        })
    }

    async fn generate_takeaways(&self, debate_id: &str) -> Result<Takeaways, GenerationError> {
        self.begin("generate_takeaways").await?;
        let debate = self.stored(debate_id).await?;

        let key_insights = debate
            .arguments
            .values()
            .filter(|a| !a.is_evidence())
            .filter(|a| ConsensusLevel::from_agreement(a.agreement_level) != ConsensusLevel::Medium)
            .take(3)
            .enumerate()
            .map(|(i, a)| KeyInsight {
                id: format!("insight-{}", i + 1),
                content: a.content.clone(),
                consensus_level: ConsensusLevel::from_agreement(a.agreement_level),
                experts: if a.supported_by.is_empty() {
                    a.speaker_id.iter().cloned().collect()
                } else {
                    a.supported_by.iter().cloned().collect()
                },
                source_argument: Some(a.id.clone()),
            })
            .collect();

        Ok(Takeaways {
            key_insights,
            actionable_considerations: vec![
                ActionableConsideration {
                    id: "action-1".to_string(),
                    content: format!("Consider practical applications when approaching {}", debate.topic),
                    difficulty: Relevance::Medium,
                    impact: Relevance::High,
                },
                ActionableConsideration {
                    id: "action-2".to_string(),
                    content: "The debate suggests an incremental approach may be most effective".to_string(),
                    difficulty: Relevance::Low,
                    impact: Relevance::Medium,
                },
            ],
            knowledge_gaps: vec![
                KnowledgeGap {
                    id: "gap-1".to_string(),
                    content: format!("Further research is needed on {}", debate.topic),
                    significance: Relevance::High,
                },
                KnowledgeGap {
                    id: "gap-2".to_string(),
                    content: "Experts disagreed on key points due to insufficient data".to_string(),
                    significance: Relevance::Medium,
                },
            ],
            recommended_resources: vec![
                RecommendedResource {
                    id: "resource-1".to_string(),
                    title: format!("Foundational text on {}", debate.topic),
                    kind: "book".to_string(),
                    relevance: Relevance::High,
                },
                RecommendedResource {
                    id: "resource-2".to_string(),
                    title: "Opposing perspective on the central claim".to_string(),
                    kind: "video".to_string(),
                    relevance: Relevance::Medium,
                },
            ],
        })
    }
}
