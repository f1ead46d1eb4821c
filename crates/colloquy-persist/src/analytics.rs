//! Session analytics
//!
//! [`AnalyticsService`] keeps per-session counters and a bounded event
//! history, forwards every event to an [`EventSink`], and persists its state
//! in the background. Analytics must never disturb a debate: every storage
//! failure is logged and otherwise ignored.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, VecDeque};
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::Mutex as WriteLock;
use uuid::Uuid;

use colloquy_core::{DebateFormat, DebateId, ExpertId};

use crate::backend::{StorageBackend, StorageExt};

/// Storage key for the session counters
pub const SESSION_KEY: &str = "colloquy:analytics_session";
/// Storage key for the event history
pub const HISTORY_KEY: &str = "colloquy:analytics_history";
/// Oldest events are dropped beyond this many
pub const HISTORY_LIMIT: usize = 1000;

/// Event names forwarded to the sink
pub mod events {
    pub const DEBATE_STARTED: &str = "debate_started";
    pub const QUESTION_ASKED: &str = "question_asked";
    pub const EXPERT_INTERACTION: &str = "expert_interaction";
    pub const CITATION_EXPLORED: &str = "citation_explored";
    pub const SETTINGS_CHANGED: &str = "settings_changed";
    pub const TAKEAWAY_GENERATED: &str = "takeaway_generated";
    pub const CONTENT_ENGAGEMENT: &str = "content_engagement";
    pub const DEBATE_COMPLETED: &str = "debate_completed";
}

/// External destination for analytics events
pub trait EventSink: Send + Sync + Debug {
    fn track_event(&self, name: &str, payload: Map<String, Value>);
}

/// Sink that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn track_event(&self, _name: &str, _payload: Map<String, Value>) {}
}

/// Sink that logs each event at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn track_event(&self, name: &str, payload: Map<String, Value>) {
        tracing::debug!(
            event = name,
            payload = %serde_json::Value::Object(payload),
            "Analytics event"
        );
    }
}

/// How the user engaged with an expert
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Question,
    Challenge,
    Evidence,
    Steelman,
    Consideration,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Challenge => "challenge",
            Self::Evidence => "evidence",
            Self::Steelman => "steelman",
            Self::Consideration => "consideration",
        }
    }
}

/// Counters for the current browser session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    pub interaction_count: u64,
    pub debates_started: u64,
    pub topics_explored: Vec<String>,
    pub expert_interactions: BTreeMap<ExpertId, u64>,
}

impl SessionData {
    pub fn new() -> Self {
        Self {
            session_id: format!("session_{}", Uuid::new_v4().simple()),
            start_time: Utc::now(),
            interaction_count: 0,
            debates_started: 0,
            topics_explored: Vec::new(),
            expert_interactions: BTreeMap::new(),
        }
    }
}

impl Default for SessionData {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened, with the fields each event carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventData {
    DebateStart {
        topic: String,
        expert_ids: Vec<ExpertId>,
        format: DebateFormat,
    },
    ExpertInteraction {
        debate_id: DebateId,
        expert_id: ExpertId,
        interaction: InteractionKind,
    },
    CitationExplored {
        debate_id: DebateId,
        citation_id: String,
        source: String,
    },
    DebateCompletion {
        debate_id: DebateId,
        duration_secs: u64,
        interactions: u64,
    },
}

impl EventData {
    fn sink_name(&self) -> &'static str {
        match self {
            Self::DebateStart { .. } => events::DEBATE_STARTED,
            Self::ExpertInteraction {
                interaction: InteractionKind::Question,
                ..
            } => events::QUESTION_ASKED,
            Self::ExpertInteraction { .. } => events::EXPERT_INTERACTION,
            Self::CitationExplored { .. } => events::CITATION_EXPLORED,
            Self::DebateCompletion { .. } => events::DEBATE_COMPLETED,
        }
    }

    fn debate_id(&self) -> Option<&str> {
        match self {
            Self::DebateStart { .. } => None,
            Self::ExpertInteraction { debate_id, .. }
            | Self::CitationExplored { debate_id, .. }
            | Self::DebateCompletion { debate_id, .. } => Some(debate_id),
        }
    }
}

/// One entry in the event history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    #[serde(flatten)]
    pub data: EventData,
    pub timestamp: DateTime<Utc>,
}

/// Dominant engagement pattern inferred from interaction counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningStyle {
    InquisitiveExplorer,
    CriticalThinker,
    EvidenceBasedAnalyzer,
    BalancedLearner,
}

impl LearningStyle {
    pub fn label(&self) -> &'static str {
        match self {
            Self::InquisitiveExplorer => "Inquisitive Explorer",
            Self::CriticalThinker => "Critical Thinker",
            Self::EvidenceBasedAnalyzer => "Evidence-Based Analyzer",
            Self::BalancedLearner => "Balanced Learner",
        }
    }

    fn from_top(kind: Option<InteractionKind>) -> Self {
        match kind {
            Some(InteractionKind::Question) => Self::InquisitiveExplorer,
            Some(InteractionKind::Challenge) => Self::CriticalThinker,
            Some(InteractionKind::Evidence) => Self::EvidenceBasedAnalyzer,
            _ => Self::BalancedLearner,
        }
    }
}

/// Summary of how the user engaged with one debate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningInsights {
    pub total_interactions: u64,
    pub expert_engagement: BTreeMap<ExpertId, u64>,
    pub interaction_types: BTreeMap<InteractionKind, u64>,
    pub most_used_interaction: Option<InteractionKind>,
    pub most_engaged_expert: Option<ExpertId>,
    pub learning_style: LearningStyle,
}

/// Key with the highest count; ties go to the smallest key
fn top_key<K: Clone + Ord>(counts: &BTreeMap<K, u64>) -> Option<K> {
    counts
        .iter()
        .fold(None::<(&K, u64)>, |best, (k, &n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((k, n)),
        })
        .map(|(k, _)| k.clone())
}

#[derive(Debug, Default)]
struct AnalyticsState {
    session: SessionData,
    history: VecDeque<AnalyticsEvent>,
    /// Bumped by every change, including clears
    version: u64,
}

/// Tracks user engagement across debates
#[derive(Debug)]
pub struct AnalyticsService<B: StorageBackend + ?Sized> {
    backend: Arc<B>,
    sink: Arc<dyn EventSink>,
    state: Mutex<AnalyticsState>,
    /// Version of the last snapshot written or cleared; serialises writers
    written: Arc<WriteLock<u64>>,
}

impl<B: StorageBackend + ?Sized + 'static> AnalyticsService<B> {
    /// Start a fresh session
    pub fn new(backend: Arc<B>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            backend,
            sink,
            state: Mutex::new(AnalyticsState::default()),
            written: Arc::new(WriteLock::new(0)),
        }
    }

    /// Resume the session and history stored in `backend`, if any
    pub async fn load(backend: Arc<B>, sink: Arc<dyn EventSink>) -> Self {
        let session = backend
            .get::<SessionData>(SESSION_KEY)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to load analytics session");
                None
            })
            .unwrap_or_default();
        let mut history: VecDeque<AnalyticsEvent> = backend
            .get::<Vec<AnalyticsEvent>>(HISTORY_KEY)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to load analytics history");
                None
            })
            .unwrap_or_default()
            .into();
        while history.len() > HISTORY_LIMIT {
            history.pop_front();
        }
        Self {
            backend,
            sink,
            state: Mutex::new(AnalyticsState {
                session,
                history,
                version: 0,
            }),
            written: Arc::new(WriteLock::new(0)),
        }
    }

    pub fn session(&self) -> SessionData {
        self.state.lock().session.clone()
    }

    pub fn history(&self) -> Vec<AnalyticsEvent> {
        self.state.lock().history.iter().cloned().collect()
    }

    pub fn track_debate_start(&self, topic: &str, expert_ids: &[ExpertId], format: DebateFormat) {
        self.record(
            EventData::DebateStart {
                topic: topic.to_string(),
                expert_ids: expert_ids.to_vec(),
                format,
            },
            |session| {
                session.debates_started += 1;
                if !session.topics_explored.iter().any(|t| t == topic) {
                    session.topics_explored.push(topic.to_string());
                }
            },
        );
    }

    pub fn track_expert_interaction(
        &self,
        debate_id: &str,
        expert_id: &str,
        interaction: InteractionKind,
    ) {
        self.record(
            EventData::ExpertInteraction {
                debate_id: debate_id.to_string(),
                expert_id: expert_id.to_string(),
                interaction,
            },
            |session| {
                session.interaction_count += 1;
                *session
                    .expert_interactions
                    .entry(expert_id.to_string())
                    .or_default() += 1;
            },
        );
    }

    pub fn track_citation_explored(&self, debate_id: &str, citation_id: &str, source: &str) {
        self.record(
            EventData::CitationExplored {
                debate_id: debate_id.to_string(),
                citation_id: citation_id.to_string(),
                source: source.to_string(),
            },
            |session| session.interaction_count += 1,
        );
    }

    pub fn track_debate_completion(&self, debate_id: &str, duration_secs: u64, interactions: u64) {
        self.record(
            EventData::DebateCompletion {
                debate_id: debate_id.to_string(),
                duration_secs,
                interactions,
            },
            |_| {},
        );
    }

    /// Forward a free-form event to the sink without recording it
    pub fn track_custom(&self, name: &str, payload: Map<String, Value>) {
        self.sink.track_event(name, payload);
    }

    fn record(&self, data: EventData, update: impl FnOnce(&mut SessionData)) {
        let name = data.sink_name();
        let payload = match serde_json::to_value(&data) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        {
            let mut state = self.state.lock();
            update(&mut state.session);
            state.history.push_back(AnalyticsEvent {
                data,
                timestamp: Utc::now(),
            });
            while state.history.len() > HISTORY_LIMIT {
                state.history.pop_front();
            }
            state.version += 1;
        }
        self.sink.track_event(name, payload);
        self.persist_in_background();
    }

    fn snapshot(&self) -> Snapshot {
        let state = self.state.lock();
        Snapshot {
            version: state.version,
            session: state.session.clone(),
            history: state.history.iter().cloned().collect(),
        }
    }

    fn persist_in_background(&self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let backend = Arc::clone(&self.backend);
        let written = Arc::clone(&self.written);
        let snapshot = self.snapshot();
        handle.spawn(async move {
            snapshot.store(backend.as_ref(), &written).await;
        });
    }

    /// Write the current state to storage and wait for it
    pub async fn flush(&self) {
        self.snapshot()
            .store(self.backend.as_ref(), &self.written)
            .await;
    }

    /// Engagement summary for one debate
    pub fn learning_insights(&self, debate_id: &str) -> LearningInsights {
        let state = self.state.lock();
        let mut expert_engagement = BTreeMap::new();
        let mut interaction_types = BTreeMap::new();
        let mut total_interactions = 0;

        for event in state.history.iter() {
            if event.data.debate_id() != Some(debate_id) {
                continue;
            }
            if let EventData::ExpertInteraction {
                expert_id,
                interaction,
                ..
            } = &event.data
            {
                total_interactions += 1;
                *expert_engagement.entry(expert_id.clone()).or_insert(0) += 1;
                *interaction_types.entry(*interaction).or_insert(0) += 1;
            }
        }

        let most_used_interaction = top_key(&interaction_types);
        LearningInsights {
            total_interactions,
            most_engaged_expert: top_key(&expert_engagement),
            learning_style: LearningStyle::from_top(most_used_interaction),
            most_used_interaction,
            expert_engagement,
            interaction_types,
        }
    }

    /// Drop history and start a new session
    ///
    /// Snapshots taken before the clear are never written afterwards.
    pub async fn clear(&self) {
        let version = {
            let mut state = self.state.lock();
            state.session = SessionData::new();
            state.history.clear();
            state.version += 1;
            state.version
        };

        let mut written = self.written.lock().await;
        if *written > version {
            // A newer snapshot already replaced the old data
            return;
        }
        for key in [SESSION_KEY, HISTORY_KEY] {
            if let Err(e) = self.backend.remove(key).await {
                tracing::warn!(key, error = %e, "Failed to clear analytics data");
            }
        }
        *written = version;
    }
}

/// State captured for one write
struct Snapshot {
    version: u64,
    session: SessionData,
    history: Vec<AnalyticsEvent>,
}

impl Snapshot {
    /// Write unless a newer snapshot (or a clear) already landed
    async fn store<B: StorageBackend + ?Sized>(self, backend: &B, written: &WriteLock<u64>) {
        let mut last = written.lock().await;
        if self.version <= *last {
            tracing::trace!(
                version = self.version,
                last = *last,
                "Skipping stale analytics snapshot"
            );
            return;
        }
        if let Err(e) = backend.put(SESSION_KEY, &self.session).await {
            tracing::warn!(error = %e, "Failed to persist analytics session");
        }
        if let Err(e) = backend.put(HISTORY_KEY, &self.history).await {
            tracing::warn!(error = %e, "Failed to persist analytics history");
        }
        *last = self.version;
    }
}
