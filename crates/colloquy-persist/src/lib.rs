//! # Colloquy Persistence
//!
//! Client-side persistence for debate sessions:
//! - [`StorageBackend`]: string-keyed JSON store, with [`MemoryBackend`] for
//!   tests and single-process use
//! - [`PreferencesStore`]: user preferences merged over defaults
//! - [`AnalyticsService`]: session counters, bounded event history and
//!   learning insights
//!
//! ```rust
//! use std::sync::Arc;
//! use colloquy_persist::{MemoryBackend, PreferencesStore};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = PreferencesStore::new(Arc::new(MemoryBackend::new()));
//! let topics = store.add_recent_topic("AI regulation").await;
//! assert_eq!(topics, vec!["AI regulation"]);
//! # }
//! ```

pub mod analytics;
pub mod backend;
pub mod error;
pub mod preferences;

pub use analytics::{
    events, AnalyticsEvent, AnalyticsService, EventData, EventSink, InteractionKind,
    LearningInsights, LearningStyle, NoopSink, SessionData, TracingSink, HISTORY_LIMIT,
};
pub use backend::{MemoryBackend, StorageBackend, StorageError, StorageExt};
pub use error::StorageAccessError;
pub use preferences::{
    AccessibilitySettings, AccessibilityUpdate, ColorMode, NotificationSettings, Preferences,
    PreferencesStore, TextSize, VisualizationStyle, VisualizationUpdate, PREFERENCES_KEY,
};
