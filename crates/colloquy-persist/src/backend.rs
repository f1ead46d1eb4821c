//! Key/value storage backend

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use tokio::sync::RwLock;

/// Storage error types
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage quota of {limit} entries exceeded")]
    QuotaExceeded { limit: usize },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A string-keyed store of JSON values (object safe)
#[async_trait]
pub trait StorageBackend: Send + Sync + Debug {
    /// Get the backend name
    fn name(&self) -> &str;

    /// Check if backend is usable
    async fn is_healthy(&self) -> bool;

    /// Store a JSON value under a key, replacing any previous value
    async fn put_value(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError>;

    /// Get a JSON value by key
    async fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError>;

    /// Remove a key; returns whether it was present
    async fn remove(&self, key: &str) -> Result<bool, StorageError>;

    /// List all keys with prefix
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

/// Typed access on top of any [`StorageBackend`]
#[async_trait]
pub trait StorageExt {
    async fn put<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<(), StorageError>;
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError>;
}

#[async_trait]
impl<S: StorageBackend + ?Sized> StorageExt for S {
    async fn put<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json =
            serde_json::to_value(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.put_value(key, json).await
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        self.get_value(key)
            .await?
            .map(|json| {
                serde_json::from_value(json).map_err(|e| StorageError::Serialization(e.to_string()))
            })
            .transpose()
    }
}

/// Process-local storage backend.
///
/// Can be capped to a number of entries or disabled outright, which is how
/// tests reproduce a full or blocked browser store.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: RwLock<HashMap<String, serde_json::Value>>,
    limit: Option<usize>,
    disabled: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that refuses new keys beyond `limit` entries
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// A backend whose every operation fails
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.disabled {
            return Err(StorageError::Unavailable("storage is disabled".to_string()));
        }
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn is_healthy(&self) -> bool {
        !self.disabled
    }

    async fn put_value(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError> {
        self.check()?;
        let mut data = self.data.write().await;
        if let Some(limit) = self.limit {
            if !data.contains_key(key) && data.len() >= limit {
                return Err(StorageError::QuotaExceeded { limit });
            }
        }
        data.insert(key.to_string(), value);
        Ok(())
    }

    async fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        self.check()?;
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        self.check()?;
        Ok(self.data.write().await.remove(key).is_some())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.check()?;
        let mut keys: Vec<String> = self
            .data
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}
