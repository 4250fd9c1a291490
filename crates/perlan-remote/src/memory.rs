//! In-memory remote store for tests and offline demos.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use perlan_core::error::RemoteError;
use perlan_core::traits::{Document, RemoteStore};

/// Documents of one collection, in insertion order.
type Collection = Vec<(String, serde_json::Value)>;

/// A remote store held in process memory.
///
/// Documents keep their insertion order; replacing a document keeps its
/// position. `set_offline(true)` makes every call fail with a network error.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    collections: Mutex<HashMap<String, Collection>>,
    offline: AtomicBool,
    list_calls: AtomicU32,
    put_calls: AtomicU32,
    delete_calls: AtomicU32,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing (or regaining) the connection.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    pub fn list_calls(&self) -> u32 {
        self.list_calls.load(Ordering::Relaxed)
    }

    pub fn put_calls(&self) -> u32 {
        self.put_calls.load(Ordering::Relaxed)
    }

    pub fn delete_calls(&self) -> u32 {
        self.delete_calls.load(Ordering::Relaxed)
    }

    /// Document ids of a collection, in insertion order.
    pub fn ids(&self, collection: &str) -> Vec<String> {
        self.lock()
            .get(collection)
            .map(|docs| docs.iter().map(|(id, _)| id.clone()).collect())
            .unwrap_or_default()
    }

    pub fn get(&self, collection: &str, id: &str) -> Option<serde_json::Value> {
        self.lock()
            .get(collection)?
            .iter()
            .find(|(doc_id, _)| doc_id == id)
            .map(|(_, data)| data.clone())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Collection>> {
        self.collections.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_online(&self) -> Result<(), RemoteError> {
        if self.offline.load(Ordering::Relaxed) {
            return Err(RemoteError::NetworkError("memory remote is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list(&self, collection: &str) -> anyhow::Result<Vec<Document>> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);
        self.ensure_online()?;
        Ok(self
            .lock()
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn put(&self, collection: &str, id: &str, data: &serde_json::Value) -> anyhow::Result<()> {
        self.put_calls.fetch_add(1, Ordering::Relaxed);
        self.ensure_online()?;
        let mut collections = self.lock();
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|(doc_id, _)| doc_id == id) {
            Some((_, existing)) => *existing = data.clone(),
            None => docs.push((id.to_string(), data.clone())),
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<()> {
        self.delete_calls.fetch_add(1, Ordering::Relaxed);
        self.ensure_online()?;
        if let Some(docs) = self.lock().get_mut(collection) {
            docs.retain(|(doc_id, _)| doc_id != id);
        }
        Ok(())
    }
}
