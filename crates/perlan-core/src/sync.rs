//! Reconciles the content cache with the remote store.
//!
//! On start each entity kind goes `Uninitialized -> Syncing -> Synced`: an
//! empty remote collection is seeded from the bundled dataset, a populated
//! one replaces the local mirror. Remote failures leave the cache as it was.
//!
//! Local mutations are applied to the cache immediately and then written to
//! the remote in the background. Each kind has a gate that the initial sync
//! holds for its whole empty-check-then-seed-or-pull sequence; mutations take
//! the same gate, so a mutation can never be overwritten by a pull that was
//! already in flight. Remote writes for the same document are applied in
//! the order the mutations were made.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::background::{BackgroundWrites, FlushSummary};
use crate::cache::ContentCache;
use crate::entity::{decode_entities, Entity, EntityKind};
use crate::error::QuizError;
use crate::model::{CourseModule, Question};
use crate::traits::RemoteStore;

/// Sync lifecycle of one entity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncPhase {
    #[default]
    Uninitialized,
    Syncing,
    Synced,
}

/// What a sync of one kind did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No remote store is configured; the cache is used as-is.
    Offline,
    /// The remote was empty and now holds the bundled seed.
    Seeded { count: usize },
    /// The remote's documents replaced the local mirror.
    Pulled { count: usize, skipped: usize },
    /// The remote failed; the cache kept its previous contents.
    Degraded { reason: String },
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Offline => write!(f, "offline"),
            SyncOutcome::Seeded { count } => write!(f, "seeded {count}"),
            SyncOutcome::Pulled { count, skipped: 0 } => write!(f, "pulled {count}"),
            SyncOutcome::Pulled { count, skipped } => {
                write!(f, "pulled {count} (skipped {skipped} malformed)")
            }
            SyncOutcome::Degraded { reason } => write!(f, "using local cache ({reason})"),
        }
    }
}

/// Outcomes of a full startup sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub questions: SyncOutcome,
    pub modules: SyncOutcome,
}

impl SyncReport {
    pub fn outcome(&self, kind: EntityKind) -> &SyncOutcome {
        match kind {
            EntityKind::Questions => &self.questions,
            EntityKind::CourseModules => &self.modules,
        }
    }
}

/// Owns the sync gates and the write-through path.
pub struct SyncEngine {
    cache: Arc<ContentCache>,
    remote: Option<Arc<dyn RemoteStore>>,
    writes: Arc<BackgroundWrites>,
    questions: Mutex<SyncPhase>,
    modules: Mutex<SyncPhase>,
}

impl SyncEngine {
    pub fn new(cache: Arc<ContentCache>, remote: Option<Arc<dyn RemoteStore>>) -> Self {
        Self::with_writes(cache, remote, Arc::new(BackgroundWrites::new()))
    }

    /// Share a background write set with other components.
    pub fn with_writes(
        cache: Arc<ContentCache>,
        remote: Option<Arc<dyn RemoteStore>>,
        writes: Arc<BackgroundWrites>,
    ) -> Self {
        Self {
            cache,
            remote,
            writes,
            questions: Mutex::new(SyncPhase::Uninitialized),
            modules: Mutex::new(SyncPhase::Uninitialized),
        }
    }

    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    pub fn remote(&self) -> Option<&Arc<dyn RemoteStore>> {
        self.remote.as_ref()
    }

    pub fn writes(&self) -> &Arc<BackgroundWrites> {
        &self.writes
    }

    fn gate(&self, kind: EntityKind) -> &Mutex<SyncPhase> {
        match kind {
            EntityKind::Questions => &self.questions,
            EntityKind::CourseModules => &self.modules,
        }
    }

    /// Current phase of one kind. Waits while that kind is syncing.
    pub async fn phase(&self, kind: EntityKind) -> SyncPhase {
        *self.gate(kind).lock().await
    }

    /// Sync every entity kind concurrently.
    pub async fn sync_all(&self) -> SyncReport {
        let (questions, modules) = futures::join!(
            self.sync_kind::<Question>(),
            self.sync_kind::<CourseModule>()
        );
        SyncReport { questions, modules }
    }

    /// Sync one entity kind. Never fails; remote errors degrade to the cache.
    pub async fn sync_kind<E: Entity>(&self) -> SyncOutcome {
        let mut phase = self.gate(E::KIND).lock().await;

        let Some(remote) = self.remote.clone() else {
            *phase = SyncPhase::Synced;
            return SyncOutcome::Offline;
        };

        *phase = SyncPhase::Syncing;
        tracing::debug!("syncing {} with {}", E::KIND, remote.name());

        match self.pull::<E>(remote.as_ref()).await {
            Ok(outcome) => {
                *phase = SyncPhase::Synced;
                tracing::info!("{}: {outcome}", E::KIND);
                outcome
            }
            Err(e) => {
                *phase = SyncPhase::Uninitialized;
                tracing::warn!("{} sync abandoned, keeping local cache: {e}", E::KIND);
                SyncOutcome::Degraded {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn pull<E: Entity>(&self, remote: &dyn RemoteStore) -> Result<SyncOutcome, QuizError> {
        let collection = E::KIND.collection();
        let documents = remote
            .list(collection)
            .await
            .map_err(|e| QuizError::remote(&e))?;

        if documents.is_empty() {
            let seed = E::bundled(self.cache.seed()).to_vec();
            for entity in &seed {
                let data = serde_json::to_value(entity)?;
                remote
                    .put(collection, entity.id(), &data)
                    .await
                    .map_err(|e| QuizError::remote(&e))?;
            }
            self.cache.replace_all(&seed)?;
            return Ok(SyncOutcome::Seeded { count: seed.len() });
        }

        let values = documents
            .into_iter()
            .map(|doc| match doc.data {
                serde_json::Value::Object(mut map) => {
                    map.entry("id")
                        .or_insert_with(|| serde_json::Value::String(doc.id));
                    serde_json::Value::Object(map)
                }
                other => other,
            })
            .collect();
        let (entities, skipped) = decode_entities::<E>(values);
        self.cache.replace_all(&entities)?;
        Ok(SyncOutcome::Pulled {
            count: entities.len(),
            skipped: skipped.len(),
        })
    }

    // -----------------------------------------------------------------------
    // Write-through mutations
    // -----------------------------------------------------------------------

    /// Insert or replace an entity locally, then write it to the remote.
    pub async fn upsert<E: Entity>(&self, entity: E) -> Result<(), QuizError> {
        let _gate = self.gate(E::KIND).lock().await;
        let data = serde_json::to_value(&entity)?;
        let id = entity.id().to_string();
        self.cache.put(entity)?;

        if let Some(remote) = self.remote.clone() {
            let collection = E::KIND.collection();
            let key = format!("{collection}/{id}");
            self.writes.spawn_keyed(key.clone(), format!("put {key}"), async move {
                remote.put(collection, &id, &data).await
            });
        }
        Ok(())
    }

    /// Delete an entity locally, then delete it from the remote.
    ///
    /// Returns whether the entity was present locally. The remote delete is
    /// issued either way.
    pub async fn delete<E: Entity>(&self, id: &str) -> Result<bool, QuizError> {
        let _gate = self.gate(E::KIND).lock().await;
        let removed = self.cache.remove::<E>(id)?;

        if let Some(remote) = self.remote.clone() {
            let collection = E::KIND.collection();
            let id = id.to_string();
            let key = format!("{collection}/{id}");
            self.writes.spawn_keyed(key.clone(), format!("delete {key}"), async move {
                remote.delete(collection, &id).await
            });
        }
        Ok(removed)
    }

    pub async fn add_question(&self, question: Question) -> Result<(), QuizError> {
        self.upsert(question).await
    }

    pub async fn delete_question(&self, id: &str) -> Result<bool, QuizError> {
        self.delete::<Question>(id).await
    }

    pub async fn upsert_module(&self, module: CourseModule) -> Result<(), QuizError> {
        self.upsert(module).await
    }

    pub async fn delete_module(&self, id: &str) -> Result<bool, QuizError> {
        self.delete::<CourseModule>(id).await
    }

    /// Wait for outstanding remote writes.
    pub async fn flush(&self) -> FlushSummary {
        self.writes.flush().await
    }
}
