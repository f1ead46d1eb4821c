//! Integration tests for the debate session container

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use proptest::prelude::*;

use colloquy_core::{
    Argument, ArgumentKind, Debate, DebateFormat, ParameterUpdate, Roster, Takeaways,
    TechnicalLevel,
};
use colloquy_layout::{ForceSimulation, SimulationStatus};
use colloquy_persist::{MemoryBackend, NoopSink, Preferences, PreferencesStore, StorageBackend};
use colloquy_provider::{
    ChallengeResponse, ConsiderationResponse, DebateProvider, DebateRequest, EvidenceResponse,
    FollowUpResponse, GenerationError, MockProvider, SteelmanResponse,
};
use colloquy_runtime::{
    reduce, spawn_layout_driver, Action, DebateSession, DebateSessionState, RuntimeConfig,
    SessionError,
};

const TOPIC: &str = "Should AI be regulated?";
const EXPERTS: [&str; 3] = ["technologist", "ethicist", "economist"];

async fn session_with(provider: MockProvider) -> DebateSession {
    DebateSession::new(Arc::new(provider), RuntimeConfig::default()).await
}

async fn loaded_session() -> DebateSession {
    let session = session_with(MockProvider::instant()).await;
    session
        .start_new_debate(TOPIC, &EXPERTS, DebateFormat::Standard)
        .await
        .unwrap();
    session
}

fn first_claim(state: &DebateSessionState) -> String {
    state
        .arguments()
        .into_iter()
        .find(|a| a.kind == ArgumentKind::Claim)
        .map(|a| a.id.clone())
        .unwrap()
}

/// Generates one debate, then fails; answers follow-ups with one good and
/// one dangling argument
#[derive(Debug)]
struct UnreliableProvider {
    inner: MockProvider,
    generations: AtomicUsize,
}

impl UnreliableProvider {
    fn new() -> Self {
        Self {
            inner: MockProvider::instant(),
            generations: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DebateProvider for UnreliableProvider {
    fn name(&self) -> &str {
        "unreliable"
    }

    async fn generate_debate(&self, request: DebateRequest) -> Result<Debate, GenerationError> {
        if self.generations.fetch_add(1, Ordering::SeqCst) > 0 {
            return Err(GenerationError::Failed("quota exhausted".to_string()));
        }
        self.inner.generate_debate(request).await
    }

    async fn get_debate(&self, debate_id: &str) -> Result<Debate, GenerationError> {
        self.inner.get_debate(debate_id).await
    }

    async fn ask_follow_up(
        &self,
        _debate_id: &str,
        _question: &str,
        _target_expert: Option<&str>,
    ) -> Result<FollowUpResponse, GenerationError> {
        Ok(FollowUpResponse {
            arguments: vec![
                Argument::new("answer-1", ArgumentKind::Response, "It depends").spoken_by("ethicist"),
                Argument::new("answer-2", ArgumentKind::Counter, "Not at all")
                    .spoken_by("economist")
                    .opposing("ghost"),
            ],
        })
    }

    async fn challenge_assumption(
        &self,
        debate_id: &str,
        argument_id: &str,
        challenge: &str,
    ) -> Result<ChallengeResponse, GenerationError> {
        self.inner
            .challenge_assumption(debate_id, argument_id, challenge)
            .await
    }

    async fn request_evidence(
        &self,
        debate_id: &str,
        argument_id: &str,
    ) -> Result<EvidenceResponse, GenerationError> {
        self.inner.request_evidence(debate_id, argument_id).await
    }

    async fn generate_steelman(
        &self,
        debate_id: &str,
        argument_id: &str,
    ) -> Result<SteelmanResponse, GenerationError> {
        self.inner.generate_steelman(debate_id, argument_id).await
    }

    async fn introduce_consideration(
        &self,
        debate_id: &str,
        consideration: &str,
    ) -> Result<ConsiderationResponse, GenerationError> {
        self.inner
            .introduce_consideration(debate_id, consideration)
            .await
    }

    async fn generate_takeaways(&self, debate_id: &str) -> Result<Takeaways, GenerationError> {
        self.inner.generate_takeaways(debate_id).await
    }
}

/// The regulation scenario produces a three-expert debate led by the first expert
#[tokio::test]
async fn test_start_new_debate_scenario() {
    let session = loaded_session().await;
    let state = session.snapshot();
    let debate = state.debate().unwrap();

    assert_eq!(debate.expert_ids.len(), 3);
    assert!(!debate.stages.is_empty());
    assert!(debate.arguments_by(EXPERTS[0]).next().is_some());
    assert_eq!(state.experts.len(), 3);
    assert_eq!(state.current_stage_index, 0);
    assert!(!state.loading);
    assert!(state.error.is_none());

    assert_eq!(session.analytics().session().debates_started, 1);
    assert_eq!(session.preferences().get().await.recent_topics, vec![TOPIC]);
}

/// Loading the same debate twice yields exactly its arguments both times
#[tokio::test]
async fn test_load_success_idempotent() {
    let session = loaded_session().await;
    let debate = session.snapshot().current_debate.unwrap();

    for _ in 0..2 {
        session
            .dispatch(Action::LoadDebateSuccess(debate.clone()))
            .unwrap();
        let state = session.snapshot();
        assert_eq!(state.current_debate.as_ref(), Some(&debate));
        assert_eq!(state.arguments().len(), debate.arguments.len());
    }
}

/// Switching arguments always closes the evidence panel
#[tokio::test]
async fn test_switching_argument_clears_evidence() {
    let session = loaded_session().await;
    let ids: Vec<String> = session
        .snapshot()
        .arguments()
        .iter()
        .map(|a| a.id.clone())
        .collect();

    session.select_argument(Some(ids[0].as_str())).unwrap();
    let evidence = session.request_evidence(&ids[0]).await.unwrap();
    session.select_evidence(Some(evidence[0].id.as_str())).unwrap();
    assert!(session.snapshot().evidence_panel_open);

    session.select_argument(Some(ids[1].as_str())).unwrap();
    let state = session.snapshot();
    assert!(!state.evidence_panel_open);
    assert!(state.selected_evidence_id.is_none());
    assert_eq!(state.evidence_for(&ids[0]).len(), evidence.len());
}

/// A dangling reference is rejected and only the error changes
#[tokio::test]
async fn test_add_argument_dangling_reference() {
    let session = loaded_session().await;
    let before = session.snapshot();

    let result = session.dispatch(Action::AddArgument(
        Argument::new("new", ArgumentKind::Response, "Orphan").supporting("nowhere"),
    ));
    assert!(matches!(result, Err(SessionError::Malformed(_))));

    let after = session.snapshot();
    assert!(after.error.is_some());
    assert_eq!(
        DebateSessionState {
            error: None,
            ..after
        },
        before
    );
}

/// Provider failure becomes an error state, never a panic
#[tokio::test]
async fn test_generation_failure_is_caught() {
    let session = session_with(MockProvider::failing("backend down")).await;
    let result = session
        .start_new_debate(TOPIC, &EXPERTS, DebateFormat::Standard)
        .await;

    assert_eq!(
        result,
        Err(SessionError::Generation(GenerationError::Failed(
            "backend down".to_string()
        )))
    );
    assert!(result.unwrap_err().is_retryable());
    let state = session.snapshot();
    assert!(!state.loading);
    assert!(state.current_debate.is_none());
    assert!(state.error.unwrap().contains("backend down"));
}

/// A generated debate that breaks graph invariants is refused
#[tokio::test]
async fn test_malformed_generation_rejected() {
    let session = session_with(MockProvider::malformed()).await;
    let result = session
        .start_new_debate(TOPIC, &EXPERTS, DebateFormat::Standard)
        .await;

    assert!(matches!(result, Err(SessionError::Malformed(_))));
    let state = session.snapshot();
    assert!(state.current_debate.is_none());
    assert!(!state.loading);
}

/// An invalid roster is rejected before the provider is called
#[tokio::test]
async fn test_invalid_roster_rejected_early() {
    let provider = Arc::new(MockProvider::instant());
    let session = DebateSession::new(provider.clone(), RuntimeConfig::default()).await;

    let result = session
        .start_new_debate(TOPIC, &["ethicist", "ethicist"], DebateFormat::Standard)
        .await;
    assert!(matches!(result, Err(SessionError::Roster(_))));
    assert_eq!(provider.calls(), 0);
}

/// A second concurrent generation is rejected without touching state
#[tokio::test]
async fn test_concurrent_generation_rejected() {
    let session = session_with(MockProvider::new().with_latency(Duration::from_millis(100))).await;

    let (first, second) = tokio::join!(
        session.start_new_debate(TOPIC, &EXPERTS, DebateFormat::Standard),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            session
                .start_new_debate("Is nuclear power safe?", &EXPERTS, DebateFormat::Oxford)
                .await
        }
    );

    assert!(first.is_ok());
    assert!(matches!(second, Err(SessionError::GenerationInFlight { .. })));
    let state = session.snapshot();
    assert_eq!(state.debate().unwrap().topic, TOPIC);
    assert!(state.error.is_none());

    // The slot is free again afterwards
    assert!(session
        .start_new_debate("Is nuclear power safe?", &EXPERTS, DebateFormat::Oxford)
        .await
        .is_ok());
}

/// Slow providers time out with the configured limit
#[tokio::test]
async fn test_request_timeout() {
    let config = RuntimeConfig {
        request_timeout: Duration::from_millis(20),
        ..Default::default()
    };
    let provider = MockProvider::new().with_latency(Duration::from_millis(500));
    let session = DebateSession::new(Arc::new(provider), config).await;

    let result = session
        .start_new_debate(TOPIC, &EXPERTS, DebateFormat::Standard)
        .await;
    assert_eq!(
        result,
        Err(SessionError::Generation(GenerationError::Timeout(
            Duration::from_millis(20)
        )))
    );
    assert!(!session.snapshot().loading);
}

/// A debate generated elsewhere can be loaded by id
#[tokio::test]
async fn test_load_debate_by_id() {
    let provider = Arc::new(MockProvider::instant());
    let debate = provider
        .generate_debate(colloquy_provider::DebateRequest::new(
            TOPIC,
            &EXPERTS,
            DebateFormat::Roundtable,
        ))
        .await
        .unwrap();

    let session = DebateSession::new(provider, RuntimeConfig::default()).await;
    session.load_debate(&debate.id).await.unwrap();
    let state = session.snapshot();
    assert_eq!(state.current_debate, Some(debate));
    assert_eq!(state.format, DebateFormat::Roundtable);
    assert_eq!(state.experts, Roster::from_catalog(&EXPERTS).unwrap().into_experts());

    let missing = session.load_debate("no-such-debate").await;
    assert!(matches!(
        missing,
        Err(SessionError::Generation(GenerationError::NotFound(_)))
    ));
    assert!(session.snapshot().current_debate.is_some());
}

/// Interactions grow the graph and select what they produce
#[tokio::test]
async fn test_interactions_append_arguments() {
    let session = loaded_session().await;
    let claim = first_claim(&session.snapshot());
    let before = session.snapshot().arguments().len();

    let answers = session
        .ask_follow_up("What about open-source models?", Some("ethicist"))
        .await
        .unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(
        session.snapshot().selected_argument_id.as_ref(),
        answers.last()
    );

    let responses = session
        .challenge_assumption(&claim, "regulation always stifles innovation")
        .await
        .unwrap();
    assert_eq!(responses.len(), 2);

    let steelman = session.generate_steelman(&claim).await.unwrap();
    assert!(session.snapshot().argument(&steelman).is_some());
    assert!(!session.snapshot().evidence_for(&claim).is_empty());

    let outcome = session
        .introduce_consideration("energy consumption of training runs")
        .await
        .unwrap();
    assert!(outcome.relevance > 0.0 && outcome.relevance <= 1.0);

    let state = session.snapshot();
    assert_eq!(
        state.arguments().len(),
        before + answers.len() + responses.len() + 1 + outcome.argument_ids.len()
    );
    assert!(state.debate().unwrap().validate().is_ok());

    let insights = session.complete_debate().unwrap();
    assert_eq!(insights.total_interactions, 4);
}

/// A failed interaction keeps the debate and reports inline
#[tokio::test]
async fn test_failed_interaction_keeps_debate() {
    let session = loaded_session().await;
    let debate = session.snapshot().current_debate;

    let result = session.ask_follow_up("Anyone?", Some("historian")).await;
    assert!(matches!(
        result,
        Err(SessionError::Generation(GenerationError::InvalidResponse(_)))
    ));
    let state = session.snapshot();
    assert_eq!(state.current_debate, debate);
    assert!(state.error.is_some());
    assert!(!state.loading);

    assert_eq!(
        session.challenge_assumption("missing", "why").await,
        Err(SessionError::UnknownArgument("missing".to_string()))
    );
}

/// Takeaways are stored and loading is cleared
#[tokio::test]
async fn test_generate_takeaways() {
    let session = loaded_session().await;
    let takeaways = session.generate_takeaways().await.unwrap();
    let state = session.snapshot();
    assert_eq!(state.takeaways.as_ref(), Some(&takeaways));
    assert!(!state.loading);
    assert!(!takeaways.is_empty());

    session.reset().unwrap();
    let state = session.snapshot();
    assert!(state.takeaways.is_none());
    assert!(state.current_debate.is_none());
    assert_eq!(state.experts.len(), 3);
}

/// Subscribers observe every transition
#[tokio::test]
async fn test_subscribers_notified() {
    let session = loaded_session().await;
    let mut rx = session.subscribe();
    rx.borrow_and_update();

    session.next_stage().unwrap();
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().current_stage_index, 1);

    session
        .update_parameters(ParameterUpdate::depth(0.9))
        .unwrap();
    assert_eq!(rx.borrow_and_update().parameters.depth, 0.9);
}

/// Stored preferences seed a new session
#[tokio::test]
async fn test_preferences_applied_on_construction() {
    let storage: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
    PreferencesStore::new(Arc::clone(&storage))
        .save(&Preferences {
            debate_format: DebateFormat::Oxford,
            technical_level: TechnicalLevel::Expert,
            ..Default::default()
        })
        .await
        .unwrap();

    let session = DebateSession::with_services(
        Arc::new(MockProvider::instant()),
        storage,
        Arc::new(NoopSink),
        RuntimeConfig::default(),
    )
    .await;
    let state = session.snapshot();
    assert_eq!(state.format, DebateFormat::Oxford);
    assert_eq!(state.parameters.technical_level, TechnicalLevel::Expert);
}

/// Broken storage never stops a session
#[tokio::test]
async fn test_disabled_storage_is_harmless() {
    let session = DebateSession::with_services(
        Arc::new(MockProvider::instant()),
        Arc::new(MemoryBackend::disabled()),
        Arc::new(NoopSink),
        RuntimeConfig::default(),
    )
    .await;
    session
        .start_new_debate(TOPIC, &EXPERTS, DebateFormat::Standard)
        .await
        .unwrap();
    assert!(session.snapshot().current_debate.is_some());
}

/// The stage graph animates to rest and honours drags
#[tokio::test]
async fn test_layout_driver_for_stage() {
    let session = loaded_session().await;
    session.select_stage(1).unwrap();
    let graph = session.snapshot().stage_graph();
    assert!(!graph.is_empty());

    let config = session.config().force_config();
    let driver = spawn_layout_driver(ForceSimulation::new(&graph, config), Duration::from_millis(1));
    let frame = driver.finish().await;
    assert_eq!(frame.nodes.len(), graph.nodes.len());
    assert_ne!(frame.status, SimulationStatus::Running);

    let driver = spawn_layout_driver(
        ForceSimulation::new(&graph, session.config().force_config()),
        Duration::from_millis(1),
    );
    let id = graph.nodes[0].id.clone();
    driver.drag(&id, 10.0, 20.0);
    let mut frames = driver.frames();
    let pinned = loop {
        frames.changed().await.unwrap();
        let frame = frames.borrow_and_update().clone();
        if frame.node(&id).is_some_and(|n| n.pinned) {
            break frame;
        }
    };
    let node = pinned.node(&id).unwrap();
    assert_eq!((node.x, node.y), (10.0, 20.0));

    driver.cancel();
    assert_eq!(driver.finish().await.status, SimulationStatus::Cancelled);
}

/// A rejected roster during a running generation leaves loading on
#[tokio::test]
async fn test_rejected_roster_keeps_loading() {
    let session = session_with(MockProvider::new().with_latency(Duration::from_millis(200))).await;

    let (first, (rejected, during)) = tokio::join!(
        session.start_new_debate(TOPIC, &EXPERTS, DebateFormat::Standard),
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let rejected = session
                .start_new_debate("Is nuclear power safe?", &["ethicist"], DebateFormat::Standard)
                .await;
            (rejected, session.snapshot())
        }
    );

    assert!(matches!(rejected, Err(SessionError::Roster(_))));
    assert!(during.loading);
    assert!(during.error.is_some());
    assert!(during.current_debate.is_none());

    assert!(first.is_ok());
    let state = session.snapshot();
    assert!(!state.loading);
    assert!(state.error.is_none());
}

/// Overlapping requests keep loading on until the last one finishes
#[tokio::test]
async fn test_loading_held_until_last_request() {
    let provider = Arc::new(MockProvider::new().with_latency(Duration::from_millis(100)));
    let session = DebateSession::new(provider.clone(), RuntimeConfig::default()).await;
    session
        .start_new_debate(TOPIC, &EXPERTS, DebateFormat::Standard)
        .await
        .unwrap();
    let stored = provider
        .generate_debate(DebateRequest::new(TOPIC, &EXPERTS, DebateFormat::Oxford))
        .await
        .unwrap();

    let (takeaways, loaded, between) = tokio::join!(
        session.generate_takeaways(),
        async {
            tokio::time::sleep(Duration::from_millis(40)).await;
            session.load_debate(&stored.id).await
        },
        async {
            // Takeaways are done, the load is still outstanding
            tokio::time::sleep(Duration::from_millis(120)).await;
            session.snapshot()
        }
    );

    assert!(takeaways.is_ok());
    assert!(loaded.is_ok());
    assert!(between.takeaways.is_some());
    assert!(between.loading);
    assert!(!session.snapshot().loading);
}

/// A response with one dangling argument adds nothing
#[tokio::test]
async fn test_partial_response_not_applied() {
    let session = DebateSession::new(Arc::new(UnreliableProvider::new()), RuntimeConfig::default()).await;
    session
        .start_new_debate(TOPIC, &EXPERTS, DebateFormat::Standard)
        .await
        .unwrap();
    let before = session.snapshot();

    let result = session.ask_follow_up("Who agrees?", None).await;
    assert!(matches!(result, Err(SessionError::Malformed(_))));

    let after = session.snapshot();
    assert_eq!(after.current_debate, before.current_debate);
    assert!(after.argument("answer-1").is_none());
    assert_eq!(after.selected_argument_id, before.selected_argument_id);
    assert!(after.error.is_some());
    assert_eq!(session.analytics().session().interaction_count, 0);
}

/// A failed generation keeps the roster and format of the current debate
#[tokio::test]
async fn test_failed_generation_keeps_roster() {
    let session = DebateSession::new(Arc::new(UnreliableProvider::new()), RuntimeConfig::default()).await;
    session
        .start_new_debate(TOPIC, &EXPERTS, DebateFormat::Standard)
        .await
        .unwrap();
    let before = session.snapshot();

    let result = session
        .start_new_debate("Is nuclear power safe?", &["historian", "scientist"], DebateFormat::Oxford)
        .await;
    assert!(matches!(result, Err(SessionError::Generation(GenerationError::Failed(_)))));

    let after = session.snapshot();
    assert_eq!(after.experts, before.experts);
    assert_eq!(after.format, DebateFormat::Standard);
    assert_eq!(after.current_debate, before.current_debate);
    assert!(!after.loading);
}

proptest! {
    /// Any two different selections leave the evidence panel closed
    #[test]
    fn prop_switch_selection_closes_panel(
        first in 0usize..4,
        second in 0usize..4,
        panel_open in any::<bool>(),
    ) {
        prop_assume!(first != second);
        let mut debate = colloquy_core::Debate::new(
            "d",
            TOPIC,
            DebateFormat::Standard,
            vec!["technologist".into(), "ethicist".into()],
        );
        for i in 0..4 {
            debate
                .append_argument(Argument::new(&format!("a{}", i), ArgumentKind::Claim, "claim"))
                .unwrap();
        }
        let state = reduce(&DebateSessionState::default(), Action::LoadDebateSuccess(debate)).unwrap();
        let state = reduce(&state, Action::SelectArgument(Some(format!("a{}", first)))).unwrap();
        let state = reduce(&state, Action::SelectEvidence(Some("ev".into()))).unwrap();
        let state = reduce(&state, Action::ToggleEvidencePanel(Some(panel_open))).unwrap();
        let state = reduce(&state, Action::SelectArgument(Some(format!("a{}", second)))).unwrap();

        prop_assert!(!state.evidence_panel_open);
        prop_assert!(state.selected_evidence_id.is_none());
    }
}
