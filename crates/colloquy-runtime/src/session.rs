//! The debate state container
//!
//! [`DebateSession`] owns the [`DebateSessionState`] and is the only thing
//! that transitions it. Consumers read snapshots or subscribe to a watch
//! channel. Provider calls are sequenced here: each one is bracketed by
//! loading actions, bounded by the configured timeout, and any failure is
//! turned into an error action plus a returned [`SessionError`]. Nothing a
//! provider does can escape as a panic or leave `loading` stuck on.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use tokio::sync::watch;

use colloquy_core::{
    catalog, Argument, ArgumentId, DebateFormat, DebateId, DebateParameters, Evidence, Expert,
    ParameterUpdate, Roster, Takeaways,
};
use colloquy_persist::{
    events, AnalyticsService, EventSink, InteractionKind, LearningInsights, MemoryBackend,
    Preferences, PreferencesStore, StorageBackend, TracingSink,
};
use colloquy_provider::{DebateProvider, DebateRequest, GenerationError};

use crate::config::RuntimeConfig;
use crate::error::SessionError;
use crate::reducer::{reduce, Action};
use crate::state::DebateSessionState;

/// Requests that may not run twice at once
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Generation {
    NewDebate,
    Load(DebateId),
    Takeaways,
}

impl Generation {
    fn describe(&self) -> String {
        match self {
            Self::NewDebate => "new debate".to_string(),
            Self::Load(id) => format!("debate {}", id),
            Self::Takeaways => "takeaways".to_string(),
        }
    }
}

/// Releases an in-flight slot when dropped, including on cancellation
struct InFlightGuard<'a> {
    slots: &'a Mutex<HashSet<Generation>>,
    key: Generation,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.slots.lock().remove(&self.key);
    }
}

/// Arguments a consideration produced, and how relevant it was judged
#[derive(Debug, Clone, PartialEq)]
pub struct ConsiderationOutcome {
    pub argument_ids: Vec<ArgumentId>,
    pub relevance: f64,
}

/// Single owner of a debate-viewing session
#[derive(Debug)]
pub struct DebateSession {
    config: RuntimeConfig,
    provider: Arc<dyn DebateProvider>,
    preferences: PreferencesStore<dyn StorageBackend>,
    analytics: AnalyticsService<dyn StorageBackend>,
    state: watch::Sender<DebateSessionState>,
    in_flight: Mutex<HashSet<Generation>>,
    started_at: Mutex<Option<Instant>>,
}

impl DebateSession {
    /// Create a session with in-memory storage and log-only analytics
    pub async fn new(provider: Arc<dyn DebateProvider>, config: RuntimeConfig) -> Self {
        Self::with_services(
            provider,
            Arc::new(MemoryBackend::new()),
            Arc::new(TracingSink),
            config,
        )
        .await
    }

    /// Create a session on explicit storage and analytics sink.
    ///
    /// Stored preferences seed the session's format and parameters.
    pub async fn with_services(
        provider: Arc<dyn DebateProvider>,
        storage: Arc<dyn StorageBackend>,
        sink: Arc<dyn EventSink>,
        config: RuntimeConfig,
    ) -> Self {
        let preferences = PreferencesStore::new(Arc::clone(&storage));
        let analytics = AnalyticsService::load(storage, sink).await;

        let prefs = preferences.record_visit().await;
        let initial = initial_state(&prefs);
        tracing::debug!(
            provider = provider.name(),
            format = %initial.format,
            "Debate session created"
        );

        let (state, _) = watch::channel(initial);
        Self {
            config,
            provider,
            preferences,
            analytics,
            state,
            in_flight: Mutex::new(HashSet::new()),
            started_at: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> DebateSessionState {
        self.state.borrow().clone()
    }

    /// Receiver notified after every dispatched action
    pub fn subscribe(&self) -> watch::Receiver<DebateSessionState> {
        self.state.subscribe()
    }

    pub fn preferences(&self) -> &PreferencesStore<dyn StorageBackend> {
        &self.preferences
    }

    pub fn analytics(&self) -> &AnalyticsService<dyn StorageBackend> {
        &self.analytics
    }

    /// Apply an action. A rejected action only records its error message.
    pub fn dispatch(&self, action: Action) -> Result<(), SessionError> {
        self.apply(action, false)
    }

    /// Apply the action that ends a request holding an in-flight slot.
    /// `loading` stays on while any other request is still outstanding.
    fn complete(&self, action: Action) -> Result<(), SessionError> {
        let others_pending = self.in_flight.lock().len() > 1;
        self.apply(action, others_pending)
    }

    fn apply(&self, action: Action, keep_loading: bool) -> Result<(), SessionError> {
        let name = action.name();
        let mut outcome = Ok(());
        self.state.send_modify(|state| match reduce(state, action) {
            Ok(mut next) => {
                next.loading |= keep_loading && state.loading;
                *state = next;
            }
            Err(e) => {
                state.error = Some(e.to_string());
                outcome = Err(e);
            }
        });
        match &outcome {
            Ok(()) => tracing::trace!(action = name, "Action applied"),
            Err(e) => tracing::debug!(action = name, error = %e, "Action rejected"),
        }
        outcome
    }

    fn active_debate_id(&self) -> Result<DebateId, SessionError> {
        self.state
            .borrow()
            .current_debate
            .as_ref()
            .map(|d| d.id.clone())
            .ok_or(SessionError::NoActiveDebate)
    }

    fn speaker_of(&self, argument_id: &str) -> Result<Option<String>, SessionError> {
        let state = self.state.borrow();
        state
            .argument(argument_id)
            .map(|a| a.speaker_id.clone())
            .ok_or_else(|| SessionError::UnknownArgument(argument_id.to_string()))
    }

    fn claim_slot(&self, key: Generation) -> Result<InFlightGuard<'_>, SessionError> {
        let mut slots = self.in_flight.lock();
        if !slots.insert(key.clone()) {
            tracing::warn!(request = %key.describe(), "Rejected concurrent generation");
            return Err(SessionError::GenerationInFlight {
                target: key.describe(),
            });
        }
        Ok(InFlightGuard {
            slots: &self.in_flight,
            key,
        })
    }

    async fn call<T>(
        &self,
        request: impl Future<Output = Result<T, GenerationError>>,
    ) -> Result<T, GenerationError> {
        let limit = self.config.request_timeout;
        tokio::time::timeout(limit, request)
            .await
            .unwrap_or(Err(GenerationError::Timeout(limit)))
    }

    /// Record an interaction failure and hand it back
    fn fail(&self, error: SessionError) -> SessionError {
        // InteractionError is never rejected
        let _ = self.dispatch(Action::InteractionError(error.to_string()));
        error
    }

    /// Generate a new debate and make it current
    pub async fn start_new_debate(
        &self,
        topic: &str,
        expert_ids: &[&str],
        format: DebateFormat,
    ) -> Result<DebateId, SessionError> {
        let roster = Roster::from_catalog(expert_ids).map_err(|e| self.fail(e.into()))?;
        let _slot = self.claim_slot(Generation::NewDebate)?;
        self.dispatch(Action::StartLoading)?;

        let request = DebateRequest::new(topic, expert_ids, format)
            .with_parameters(self.state.borrow().parameters.clone());
        tracing::info!(topic, format = %format, experts = expert_ids.len(), "Generating debate");

        let debate = match self.call(self.provider.generate_debate(request)).await {
            Ok(debate) => debate,
            Err(e) => {
                tracing::warn!(error = %e, "Debate generation failed");
                let _ = self.complete(Action::LoadDebateError(e.to_string()));
                return Err(e.into());
            }
        };

        let id = debate.id.clone();
        let ids = debate.expert_ids.clone();
        if let Err(e) = self.complete(Action::LoadDebateSuccess(debate)) {
            tracing::warn!(debate_id = %id, error = %e, "Generated debate rejected");
            let _ = self.complete(Action::LoadDebateError(e.to_string()));
            return Err(e);
        }
        self.dispatch(Action::SetExperts(roster.into_experts()))?;

        *self.started_at.lock() = Some(Instant::now());
        self.analytics.track_debate_start(topic, &ids, format);
        self.preferences.add_recent_topic(topic).await;
        tracing::info!(debate_id = %id, "Debate loaded");
        Ok(id)
    }

    /// Fetch an existing debate and make it current
    pub async fn load_debate(&self, debate_id: &str) -> Result<(), SessionError> {
        let _slot = self.claim_slot(Generation::Load(debate_id.to_string()))?;
        self.dispatch(Action::StartLoading)?;

        let debate = match self.call(self.provider.get_debate(debate_id)).await {
            Ok(debate) => debate,
            Err(e) => {
                tracing::warn!(debate_id, error = %e, "Debate load failed");
                let _ = self.complete(Action::LoadDebateError(e.to_string()));
                return Err(e.into());
            }
        };

        let topic = debate.topic.clone();
        let format = debate.format;
        let ids = debate.expert_ids.clone();
        if let Err(e) = self.complete(Action::LoadDebateSuccess(debate)) {
            let _ = self.complete(Action::LoadDebateError(e.to_string()));
            return Err(e);
        }

        let catalog = catalog();
        let roster: Option<Vec<Expert>> = ids
            .iter()
            .map(|id| catalog.iter().find(|e| &e.id == id).cloned())
            .collect();
        match roster {
            Some(roster) => self.dispatch(Action::SetExperts(roster))?,
            None => tracing::debug!(debate_id, "Debate experts are not in the catalogue"),
        }

        *self.started_at.lock() = Some(Instant::now());
        self.analytics.track_debate_start(&topic, &ids, format);
        Ok(())
    }

    /// Append provider-produced arguments as one transition
    fn add_arguments(&self, arguments: Vec<Argument>) -> Result<Vec<ArgumentId>, SessionError> {
        let added = arguments.iter().map(|a| a.id.clone()).collect();
        self.dispatch(Action::AddArguments(arguments))?;
        Ok(added)
    }

    /// Ask a question of one expert, or of the panel
    pub async fn ask_follow_up(
        &self,
        question: &str,
        target_expert: Option<&str>,
    ) -> Result<Vec<ArgumentId>, SessionError> {
        let debate_id = self.active_debate_id()?;
        let response = self
            .call(self.provider.ask_follow_up(&debate_id, question, target_expert))
            .await
            .map_err(|e| self.fail(e.into()))?;
        let added = self
            .add_arguments(response.arguments)
            .map_err(|e| self.fail(e))?;

        self.analytics.track_expert_interaction(
            &debate_id,
            target_expert.unwrap_or("all"),
            InteractionKind::Question,
        );
        Ok(added)
    }

    /// Challenge the assumption behind an argument
    pub async fn challenge_assumption(
        &self,
        argument_id: &str,
        challenge: &str,
    ) -> Result<Vec<ArgumentId>, SessionError> {
        let debate_id = self.active_debate_id()?;
        let speaker = self.speaker_of(argument_id)?;
        let response = self
            .call(self.provider.challenge_assumption(&debate_id, argument_id, challenge))
            .await
            .map_err(|e| self.fail(e.into()))?;
        let added = self
            .add_arguments(response.responses)
            .map_err(|e| self.fail(e))?;

        self.analytics.track_expert_interaction(
            &debate_id,
            speaker.as_deref().unwrap_or("all"),
            InteractionKind::Challenge,
        );
        Ok(added)
    }

    /// Fetch and cache evidence records for an argument
    pub async fn request_evidence(&self, argument_id: &str) -> Result<Vec<Evidence>, SessionError> {
        let debate_id = self.active_debate_id()?;
        let speaker = self.speaker_of(argument_id)?;
        let response = self
            .call(self.provider.request_evidence(&debate_id, argument_id))
            .await
            .map_err(|e| self.fail(e.into()))?;

        self.dispatch(Action::AttachEvidence {
            argument_id: argument_id.to_string(),
            evidence: response.evidence.clone(),
        })?;
        self.analytics.track_expert_interaction(
            &debate_id,
            speaker.as_deref().unwrap_or("all"),
            InteractionKind::Evidence,
        );
        Ok(response.evidence)
    }

    /// Add the strongest restatement of an argument; returns its id
    pub async fn generate_steelman(&self, argument_id: &str) -> Result<ArgumentId, SessionError> {
        let debate_id = self.active_debate_id()?;
        let speaker = self.speaker_of(argument_id)?;
        let response = self
            .call(self.provider.generate_steelman(&debate_id, argument_id))
            .await
            .map_err(|e| self.fail(e.into()))?;

        let id = response.steelman.id.clone();
        self.dispatch(Action::AddArgument(response.steelman))
            .map_err(|e| self.fail(e))?;
        if !response.additional_evidence.is_empty() {
            self.dispatch(Action::AttachEvidence {
                argument_id: argument_id.to_string(),
                evidence: response.additional_evidence,
            })?;
        }

        self.analytics.track_expert_interaction(
            &debate_id,
            speaker.as_deref().unwrap_or("all"),
            InteractionKind::Steelman,
        );
        Ok(id)
    }

    /// Put a new consideration to the panel
    pub async fn introduce_consideration(
        &self,
        consideration: &str,
    ) -> Result<ConsiderationOutcome, SessionError> {
        let debate_id = self.active_debate_id()?;
        let response = self
            .call(self.provider.introduce_consideration(&debate_id, consideration))
            .await
            .map_err(|e| self.fail(e.into()))?;
        let argument_ids = self
            .add_arguments(response.responses)
            .map_err(|e| self.fail(e))?;

        self.analytics
            .track_expert_interaction(&debate_id, "all", InteractionKind::Consideration);
        Ok(ConsiderationOutcome {
            argument_ids,
            relevance: response.relevance,
        })
    }

    /// Summarise the current debate
    pub async fn generate_takeaways(&self) -> Result<Takeaways, SessionError> {
        let debate_id = self.active_debate_id()?;
        let _slot = self.claim_slot(Generation::Takeaways)?;
        self.dispatch(Action::StartLoading)?;
        let takeaways = match self.call(self.provider.generate_takeaways(&debate_id)).await {
            Ok(takeaways) => takeaways,
            Err(e) => {
                let _ = self.complete(Action::LoadDebateError(e.to_string()));
                return Err(e.into());
            }
        };

        self.complete(Action::SetTakeaways(takeaways.clone()))?;
        self.analytics.track_custom(
            events::TAKEAWAY_GENERATED,
            payload(json!({ "debate_id": debate_id, "count": takeaways.len() })),
        );
        Ok(takeaways)
    }

    /// Select an argument, or clear the selection with `None`
    pub fn select_argument(&self, argument_id: Option<&str>) -> Result<(), SessionError> {
        self.dispatch(Action::SelectArgument(argument_id.map(str::to_string)))?;
        if let (Some(argument_id), Ok(debate_id)) = (argument_id, self.active_debate_id()) {
            self.analytics.track_custom(
                events::CONTENT_ENGAGEMENT,
                payload(json!({ "debate_id": debate_id, "argument_id": argument_id })),
            );
        }
        Ok(())
    }

    pub fn toggle_evidence_panel(&self, open: Option<bool>) -> Result<(), SessionError> {
        self.dispatch(Action::ToggleEvidencePanel(open))
    }

    /// Select an evidence record; opens the panel unless `None`
    pub fn select_evidence(&self, evidence_id: Option<&str>) -> Result<(), SessionError> {
        self.dispatch(Action::SelectEvidence(evidence_id.map(str::to_string)))?;
        let Some(evidence_id) = evidence_id else {
            return Ok(());
        };
        if let Ok(debate_id) = self.active_debate_id() {
            let source = self
                .state
                .borrow()
                .find_evidence(evidence_id)
                .map(|e| e.source.clone())
                .unwrap_or_default();
            self.analytics
                .track_citation_explored(&debate_id, evidence_id, &source);
        }
        Ok(())
    }

    /// Shallow-merge new generation parameters
    pub fn update_parameters(&self, update: ParameterUpdate) -> Result<(), SessionError> {
        self.dispatch(Action::UpdateParameters(update.clone()))?;
        if let Ok(debate_id) = self.active_debate_id() {
            let mut data = payload(json!({ "debate_id": debate_id }));
            if let Ok(Value::Object(changes)) = serde_json::to_value(&update) {
                data.extend(changes.into_iter().filter(|(_, v)| !v.is_null()));
            }
            self.analytics.track_custom(events::SETTINGS_CHANGED, data);
        }
        Ok(())
    }

    pub fn set_format(&self, format: DebateFormat) -> Result<(), SessionError> {
        self.dispatch(Action::SetFormat(format))
    }

    pub fn select_stage(&self, index: usize) -> Result<(), SessionError> {
        self.dispatch(Action::SelectStage(index))
    }

    pub fn next_stage(&self) -> Result<(), SessionError> {
        self.dispatch(Action::NextStage)
    }

    pub fn previous_stage(&self) -> Result<(), SessionError> {
        self.dispatch(Action::PreviousStage)
    }

    /// Return to the initial state, keeping the expert roster
    pub fn reset(&self) -> Result<(), SessionError> {
        *self.started_at.lock() = None;
        self.dispatch(Action::Reset)
    }

    /// Record that the user finished the current debate
    pub fn complete_debate(&self) -> Result<LearningInsights, SessionError> {
        let debate_id = self.active_debate_id()?;
        let duration = self
            .started_at
            .lock()
            .map(|t| t.elapsed().as_secs())
            .unwrap_or_default();
        let insights = self.analytics.learning_insights(&debate_id);
        self.analytics
            .track_debate_completion(&debate_id, duration, insights.total_interactions);
        Ok(insights)
    }
}

fn initial_state(prefs: &Preferences) -> DebateSessionState {
    DebateSessionState::new(
        prefs.debate_format,
        DebateParameters {
            technical_level: prefs.technical_level,
            emphasis: prefs.focus_areas.clone(),
            ..DebateParameters::default()
        },
    )
}

fn payload(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
