//! User preferences
//!
//! Preferences are stored as one JSON object. Reads merge the stored object
//! over [`Preferences::default`] key by key, so fields added in later
//! versions pick up their defaults and a corrupt or unreadable store falls
//! back to defaults entirely.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

use colloquy_core::{DebateFormat, Emphasis, ExpertId, TechnicalLevel};

use crate::backend::{StorageBackend, StorageExt};
use crate::error::StorageAccessError;

/// Storage key for the preferences object
pub const PREFERENCES_KEY: &str = "colloquy:user_preferences";

const RECENT_TOPICS_LIMIT: usize = 10;
const FAVORITE_EXPERTS_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationStyle {
    #[default]
    Mindmap,
    Network,
    Timeline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    #[default]
    Light,
    Dark,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSize {
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessibilitySettings {
    pub high_contrast: bool,
    pub reduced_motion: bool,
    pub screen_reader_optimized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub new_features: bool,
    pub expert_updates: bool,
    pub saved_debate_reminders: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            new_features: true,
            expert_updates: true,
            saved_debate_reminders: false,
        }
    }
}

/// Everything the user has chosen to keep between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub debate_format: DebateFormat,
    pub expert_count: usize,
    pub technical_level: TechnicalLevel,
    pub focus_areas: BTreeSet<Emphasis>,
    pub visualization_style: VisualizationStyle,
    pub color_mode: ColorMode,
    pub text_size: TextSize,
    pub animation_enabled: bool,
    /// Most recent first
    pub recent_topics: Vec<String>,
    pub favorite_experts: Vec<ExpertId>,
    pub accessibility: AccessibilitySettings,
    pub notifications: NotificationSettings,
    /// Set on each visit; `None` until the first one is recorded
    pub last_seen: Option<DateTime<Utc>>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            debate_format: DebateFormat::Standard,
            expert_count: 3,
            technical_level: TechnicalLevel::Medium,
            focus_areas: [Emphasis::Ethical, Emphasis::Practical].into_iter().collect(),
            visualization_style: VisualizationStyle::Mindmap,
            color_mode: ColorMode::Light,
            text_size: TextSize::Medium,
            animation_enabled: true,
            recent_topics: Vec::new(),
            favorite_experts: Vec::new(),
            accessibility: AccessibilitySettings::default(),
            notifications: NotificationSettings::default(),
            last_seen: None,
        }
    }
}

impl Preferences {
    /// Overlay the top-level keys of a JSON object onto the defaults
    pub fn merged_with_defaults(overrides: Value) -> Result<Self, serde_json::Error> {
        Self::default().merged(overrides)
    }

    /// Overlay the top-level keys of a JSON object onto these preferences
    pub fn merged(&self, overrides: Value) -> Result<Self, serde_json::Error> {
        let mut base = serde_json::to_value(self)?;
        if let (Value::Object(base), Value::Object(overrides)) = (&mut base, overrides) {
            base.extend(overrides);
        }
        serde_json::from_value(base)
    }
}

/// Partial visualization update; `None` keeps the current value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisualizationUpdate {
    pub style: Option<VisualizationStyle>,
    pub animation_enabled: Option<bool>,
}

/// Partial accessibility update; `None` keeps the current value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessibilityUpdate {
    pub high_contrast: Option<bool>,
    pub reduced_motion: Option<bool>,
    pub screen_reader_optimized: Option<bool>,
}

/// Preferences persisted in a [`StorageBackend`].
///
/// Reads never fail: storage problems are logged and defaults returned.
/// Writes report failures so callers can surface them, but every
/// convenience operation swallows them after logging.
#[derive(Debug)]
pub struct PreferencesStore<B: StorageBackend + ?Sized> {
    backend: Arc<B>,
    key: String,
}

impl<B: StorageBackend + ?Sized> PreferencesStore<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            key: PREFERENCES_KEY.to_string(),
        }
    }

    /// Stored preferences merged over defaults, or an error if storage failed
    pub async fn try_get(&self) -> Result<Preferences, StorageAccessError> {
        let stored: Option<Value> = self.backend.get(&self.key).await?;
        match stored {
            None => Ok(Preferences::default()),
            Some(value) => {
                Preferences::merged_with_defaults(value).map_err(|e| StorageAccessError::InvalidValue {
                    key: self.key.clone(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Stored preferences merged over defaults; defaults if storage failed
    pub async fn get(&self) -> Preferences {
        self.try_get().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load preferences, using defaults");
            Preferences::default()
        })
    }

    /// Replace the stored preferences
    pub async fn save(&self, preferences: &Preferences) -> Result<(), StorageAccessError> {
        self.backend.put(&self.key, preferences).await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to save preferences");
            StorageAccessError::from(e)
        })
    }

    async fn save_quietly(&self, preferences: &Preferences) {
        // Already logged by `save`
        let _ = self.save(preferences).await;
    }

    /// Shallow-merge a JSON object into the current preferences and save
    pub async fn update(&self, patch: Value) -> Result<Preferences, StorageAccessError> {
        let updated = self
            .get()
            .await
            .merged(patch)
            .map_err(|e| StorageAccessError::InvalidValue {
                key: self.key.clone(),
                reason: e.to_string(),
            })?;
        self.save_quietly(&updated).await;
        Ok(updated)
    }

    /// Restore defaults
    pub async fn reset(&self) -> Preferences {
        let defaults = Preferences::default();
        self.save_quietly(&defaults).await;
        defaults
    }

    /// Move a topic to the front of the recent list
    pub async fn add_recent_topic(&self, topic: &str) -> Vec<String> {
        let mut prefs = self.get().await;
        prefs.recent_topics.retain(|t| t != topic);
        prefs.recent_topics.insert(0, topic.to_string());
        prefs.recent_topics.truncate(RECENT_TOPICS_LIMIT);
        self.save_quietly(&prefs).await;
        prefs.recent_topics
    }

    /// Add an expert to favourites, or remove it if already there
    pub async fn toggle_favorite_expert(&self, expert_id: &str) -> Vec<ExpertId> {
        let mut prefs = self.get().await;
        if prefs.favorite_experts.iter().any(|e| e == expert_id) {
            prefs.favorite_experts.retain(|e| e != expert_id);
        } else {
            prefs.favorite_experts.push(expert_id.to_string());
            prefs.favorite_experts.truncate(FAVORITE_EXPERTS_LIMIT);
        }
        self.save_quietly(&prefs).await;
        prefs.favorite_experts
    }

    pub async fn update_visualization(&self, update: VisualizationUpdate) -> Preferences {
        let mut prefs = self.get().await;
        if let Some(style) = update.style {
            prefs.visualization_style = style;
        }
        if let Some(enabled) = update.animation_enabled {
            prefs.animation_enabled = enabled;
        }
        self.save_quietly(&prefs).await;
        prefs
    }

    pub async fn update_accessibility(&self, update: AccessibilityUpdate) -> AccessibilitySettings {
        let mut prefs = self.get().await;
        let settings = &mut prefs.accessibility;
        if let Some(v) = update.high_contrast {
            settings.high_contrast = v;
        }
        if let Some(v) = update.reduced_motion {
            settings.reduced_motion = v;
        }
        if let Some(v) = update.screen_reader_optimized {
            settings.screen_reader_optimized = v;
        }
        let settings = *settings;
        self.save_quietly(&prefs).await;
        settings
    }

    /// Stamp `last_seen` with the current time
    pub async fn record_visit(&self) -> Preferences {
        let mut prefs = self.get().await;
        prefs.last_seen = Some(Utc::now());
        self.save_quietly(&prefs).await;
        prefs
    }

    pub async fn is_first_visit(&self) -> bool {
        self.get().await.last_seen.is_none()
    }

    /// Current preferences as pretty-printed JSON
    pub async fn export(&self) -> Result<String, StorageAccessError> {
        serde_json::to_string_pretty(&self.get().await).map_err(|e| StorageAccessError::InvalidValue {
            key: self.key.clone(),
            reason: e.to_string(),
        })
    }

    /// Merge imported JSON over defaults and save it
    pub async fn import(&self, json: &str) -> Result<Preferences, StorageAccessError> {
        let invalid = |e: serde_json::Error| StorageAccessError::InvalidValue {
            key: self.key.clone(),
            reason: e.to_string(),
        };
        let value: Value = serde_json::from_str(json).map_err(invalid)?;
        let prefs = Preferences::merged_with_defaults(value).map_err(invalid)?;
        self.save(&prefs).await?;
        Ok(prefs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use serde_json::json;

    fn store() -> PreferencesStore<MemoryBackend> {
        PreferencesStore::new(Arc::new(MemoryBackend::new()))
    }

    #[test]
    fn test_merge_keeps_unspecified_defaults() {
        let prefs = Preferences::merged_with_defaults(json!({
            "expert_count": 4,
            "color_mode": "dark",
            "unknown_future_field": true,
        }))
        .unwrap();
        assert_eq!(prefs.expert_count, 4);
        assert_eq!(prefs.color_mode, ColorMode::Dark);
        assert_eq!(prefs.text_size, TextSize::Medium);
        assert!(prefs.animation_enabled);
    }

    #[tokio::test]
    async fn test_defaults_when_empty() {
        let store = store();
        assert_eq!(store.get().await, Preferences::default());
        assert!(store.is_first_visit().await);
    }

    #[tokio::test]
    async fn test_recent_topics_deduplicated_and_capped() {
        let store = store();
        for i in 0..12 {
            store.add_recent_topic(&format!("topic {}", i)).await;
        }
        let topics = store.add_recent_topic("topic 5").await;
        assert_eq!(topics.len(), 10);
        assert_eq!(topics[0], "topic 5");
        assert_eq!(topics.iter().filter(|t| *t == "topic 5").count(), 1);
    }

    #[tokio::test]
    async fn test_toggle_favorite() {
        let store = store();
        assert_eq!(store.toggle_favorite_expert("ethicist").await, vec!["ethicist"]);
        assert!(store.toggle_favorite_expert("ethicist").await.is_empty());
    }

    #[tokio::test]
    async fn test_update_patch() {
        let store = store();
        let prefs = store.update(json!({ "debate_format": "oxford" })).await.unwrap();
        assert_eq!(prefs.debate_format, DebateFormat::Oxford);
        assert_eq!(store.get().await.debate_format, DebateFormat::Oxford);

        let err = store.update(json!({ "debate_format": "shouting" })).await;
        assert!(matches!(err, Err(StorageAccessError::InvalidValue { .. })));
    }

    #[tokio::test]
    async fn test_accessibility_partial_update() {
        let store = store();
        let settings = store
            .update_accessibility(AccessibilityUpdate {
                reduced_motion: Some(true),
                ..Default::default()
            })
            .await;
        assert!(settings.reduced_motion);
        assert!(!settings.high_contrast);
    }

    #[tokio::test]
    async fn test_record_visit() {
        let store = store();
        store.record_visit().await;
        assert!(!store.is_first_visit().await);
    }
}
