//! The content cache: a local, disposable mirror of questions and course
//! modules, plus the player records kept alongside them.
//!
//! Each entity kind lives under one versioned storage key as a JSON array.
//! The first read of a missing key seeds it from the bundled dataset and
//! persists the seed immediately, so later reads are stable.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::entity::{decode_entities, Entity, EntityKind};
use crate::error::QuizError;
use crate::model::{CourseModule, GameResult, PlayerStats, Question, UserProgress};
use crate::seed::SeedData;
use crate::storage::{LocalStore, PROGRESS_KEY, RESULTS_KEY, STATS_KEY};
use crate::traits::ContentRepository;

/// Local mirror of synchronized content.
pub struct ContentCache {
    store: Arc<dyn LocalStore>,
    seed: SeedData,
    /// Serializes read-modify-write cycles on the store.
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for ContentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCache")
            .field("seed_questions", &self.seed.questions.len())
            .field("seed_modules", &self.seed.modules.len())
            .finish_non_exhaustive()
    }
}

impl ContentCache {
    pub fn new(store: Arc<dyn LocalStore>, seed: SeedData) -> Self {
        Self {
            store,
            seed,
            write_lock: Mutex::new(()),
        }
    }

    /// A cache seeded from the bundled dataset.
    pub fn with_bundled_seed(store: Arc<dyn LocalStore>) -> Self {
        Self::new(store, SeedData::bundled())
    }

    pub fn seed(&self) -> &SeedData {
        &self.seed
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// All entities of one kind.
    pub fn get<E: Entity>(&self) -> Result<Vec<E>, QuizError> {
        let _guard = self.lock();
        self.load::<E>()
    }

    /// Insert or replace an entity by id.
    pub fn put<E: Entity>(&self, entity: E) -> Result<(), QuizError> {
        entity.check()?;
        let _guard = self.lock();
        let mut entities = self.load::<E>()?;
        match entities.iter_mut().find(|e| e.id() == entity.id()) {
            Some(existing) => *existing = entity,
            None => entities.push(entity),
        }
        self.persist(&entities)
    }

    /// Delete an entity by id. Returns whether anything was removed.
    pub fn remove<E: Entity>(&self, id: &str) -> Result<bool, QuizError> {
        let _guard = self.lock();
        let mut entities = self.load::<E>()?;
        let before = entities.len();
        entities.retain(|e| e.id() != id);
        if entities.len() == before {
            return Ok(false);
        }
        self.persist(&entities)?;
        Ok(true)
    }

    /// Overwrite the whole collection for a kind.
    pub fn replace_all<E: Entity>(&self, entities: &[E]) -> Result<(), QuizError> {
        let _guard = self.lock();
        self.persist(entities)
    }

    /// Drop every locally stored value. Content is reseeded on next read.
    pub fn clear(&self) -> Result<(), QuizError> {
        let _guard = self.lock();
        for kind in EntityKind::ALL {
            self.store.remove(kind.storage_key())?;
        }
        for key in [RESULTS_KEY, STATS_KEY, PROGRESS_KEY] {
            self.store.remove(key)?;
        }
        tracing::info!("local cache cleared");
        Ok(())
    }

    fn load<E: Entity>(&self) -> Result<Vec<E>, QuizError> {
        let key = E::KIND.storage_key();
        let values = match self.store.read(key)? {
            Some(raw) => match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(serde_json::Value::Array(values)) => Some(values),
                Ok(_) | Err(_) => {
                    tracing::warn!("stored {} under '{key}' is not a JSON array, reseeding", E::KIND);
                    None
                }
            },
            None => None,
        };

        match values {
            Some(values) => Ok(decode_entities::<E>(values).0),
            None => {
                let seed = E::bundled(&self.seed).to_vec();
                self.persist(&seed)?;
                tracing::debug!("seeded {} {} into '{key}'", seed.len(), E::KIND);
                Ok(seed)
            }
        }
    }

    fn persist<E: Entity>(&self, entities: &[E]) -> Result<(), QuizError> {
        let raw = serde_json::to_string(entities)?;
        self.store.write(E::KIND.storage_key(), &raw)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Player records
    // -----------------------------------------------------------------------

    /// Every recorded round, oldest first.
    pub fn results(&self) -> Result<Vec<GameResult>, QuizError> {
        self.read_record(RESULTS_KEY)
    }

    /// Append a completed round and fold it into the stats map under one
    /// lock. `update` receives the stored map and may change it.
    ///
    /// Fails with `Serialization`, writing nothing, if either stored record
    /// is unreadable.
    pub fn record_result<T>(
        &self,
        result: &GameResult,
        update: impl FnOnce(&mut HashMap<String, PlayerStats>) -> T,
    ) -> Result<T, QuizError> {
        let _guard = self.lock();
        let mut results: Vec<GameResult> = self.read_record_for_update(RESULTS_KEY)?;
        let mut stats: HashMap<String, PlayerStats> = self.read_record_for_update(STATS_KEY)?;
        let out = update(&mut stats);
        results.push(result.clone());
        self.write_record(RESULTS_KEY, &results)?;
        self.write_record(STATS_KEY, &stats)?;
        Ok(out)
    }

    pub fn stats_map(&self) -> Result<HashMap<String, PlayerStats>, QuizError> {
        self.read_record(STATS_KEY)
    }

    /// Store one player's learning progress.
    pub fn save_progress(&self, progress: &UserProgress) -> Result<(), QuizError> {
        let _guard = self.lock();
        let mut map: HashMap<String, UserProgress> = self.read_record_for_update(PROGRESS_KEY)?;
        map.insert(progress.username.clone(), progress.clone());
        self.write_record(PROGRESS_KEY, &map)
    }

    /// Missing or unreadable records start empty.
    fn read_record<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, QuizError> {
        let Some(raw) = self.store.read(key)? else {
            return Ok(T::default());
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!("ignoring unreadable '{key}': {e}");
                Ok(T::default())
            }
        }
    }

    /// Like `read_record`, but an unreadable record is an error so the
    /// caller never overwrites it.
    fn read_record_for_update<T: DeserializeOwned + Default>(
        &self,
        key: &str,
    ) -> Result<T, QuizError> {
        match self.store.read(key)? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                tracing::error!("refusing to overwrite unreadable '{key}': {e}");
                QuizError::Serialization(e)
            }),
            None => Ok(T::default()),
        }
    }

    fn write_record<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), QuizError> {
        let raw = serde_json::to_string(value)?;
        self.store.write(key, &raw)?;
        Ok(())
    }
}

impl ContentRepository for ContentCache {
    fn list_questions(&self) -> Result<Vec<Question>, QuizError> {
        self.get::<Question>()
    }

    fn list_course_modules(&self) -> Result<Vec<CourseModule>, QuizError> {
        self.get::<CourseModule>()
    }

    fn player_progress(&self, username: &str) -> Result<UserProgress, QuizError> {
        let mut map: HashMap<String, UserProgress> = self.read_record(PROGRESS_KEY)?;
        Ok(map
            .remove(username)
            .unwrap_or_else(|| UserProgress::new(username)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Difficulty};
    use crate::storage::{FileStore, MemoryStore};

    fn question(id: &str) -> Question {
        Question {
            id: id.into(),
            category: Category::Volcanoes,
            difficulty: Difficulty::Hard,
            text: format!("Question {id}?"),
            options: ["a".into(), "b".into(), "c".into()],
            correct_index: 2,
            fact: "fact".into(),
        }
    }

    fn cache_with(store: Arc<dyn LocalStore>) -> ContentCache {
        ContentCache::new(store, SeedData::new(vec![question("s1"), question("s2")], vec![]))
    }

    #[test]
    fn first_read_seeds_and_persists() {
        let store: Arc<dyn LocalStore> = Arc::new(MemoryStore::new());
        let cache = cache_with(store.clone());

        let questions = cache.get::<Question>().unwrap();
        assert_eq!(questions.len(), 2);

        let raw = store.read("perlan_questions_v2").unwrap().unwrap();
        let stored: Vec<Question> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, questions);
    }

    #[test]
    fn put_upserts_by_id() {
        let cache = cache_with(Arc::new(MemoryStore::new()));
        cache.put(question("new")).unwrap();
        let mut changed = question("s1");
        changed.text = "Changed?".into();
        cache.put(changed).unwrap();

        let questions = cache.get::<Question>().unwrap();
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[0].text, "Changed?");
        assert_eq!(questions[2].id, "new");
    }

    #[test]
    fn put_rejects_invalid_entity() {
        let cache = cache_with(Arc::new(MemoryStore::new()));
        let mut bad = question("bad");
        bad.correct_index = 9;
        assert!(matches!(
            cache.put(bad),
            Err(QuizError::MalformedEntity { .. })
        ));
    }

    #[test]
    fn remove_reports_whether_found() {
        let cache = cache_with(Arc::new(MemoryStore::new()));
        assert!(cache.remove::<Question>("s1").unwrap());
        assert!(!cache.remove::<Question>("s1").unwrap());
        assert_eq!(cache.get::<Question>().unwrap().len(), 1);
    }

    #[test]
    fn emptied_collection_is_not_reseeded() {
        let cache = cache_with(Arc::new(MemoryStore::new()));
        cache.replace_all::<Question>(&[]).unwrap();
        assert!(cache.get::<Question>().unwrap().is_empty());
    }

    #[test]
    fn non_array_blob_is_reseeded() {
        let store: Arc<dyn LocalStore> = Arc::new(MemoryStore::new());
        store.write("perlan_questions_v2", "{\"old\": true}").unwrap();
        let cache = cache_with(store);
        assert_eq!(cache.get::<Question>().unwrap().len(), 2);
    }

    #[test]
    fn malformed_elements_are_skipped() {
        let store: Arc<dyn LocalStore> = Arc::new(MemoryStore::new());
        let good = serde_json::to_value(question("ok")).unwrap();
        let raw = serde_json::to_string(&vec![good, serde_json::json!({"id": 4})]).unwrap();
        store.write("perlan_questions_v2", &raw).unwrap();
        let cache = cache_with(store);
        let questions = cache.get::<Question>().unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].id, "ok");
    }

    #[test]
    fn progress_defaults_and_saves() {
        let cache = cache_with(Arc::new(MemoryStore::new()));
        let mut progress = cache.player_progress("anna").unwrap();
        assert!(progress.completed_unit_ids.is_empty());

        progress.completed_unit_ids.push("u1".into());
        cache.save_progress(&progress).unwrap();
        assert!(cache.player_progress("anna").unwrap().is_complete("u1"));
        assert!(cache.player_progress("bjorn").unwrap().completed_unit_ids.is_empty());
    }

    #[test]
    fn unreadable_progress_is_not_overwritten() {
        let store: Arc<dyn LocalStore> = Arc::new(MemoryStore::new());
        store.write(PROGRESS_KEY, "{\"anna\": [").unwrap();
        let cache = cache_with(store.clone());

        assert!(cache.player_progress("anna").unwrap().completed_unit_ids.is_empty());
        assert!(matches!(
            cache.save_progress(&UserProgress::new("bjorn")),
            Err(QuizError::Serialization(_))
        ));
        assert_eq!(store.read(PROGRESS_KEY).unwrap().unwrap(), "{\"anna\": [");
    }

    #[test]
    fn clear_resets_to_seed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_with(Arc::new(FileStore::open(dir.path()).unwrap()));
        cache.put(question("extra")).unwrap();
        cache.save_progress(&UserProgress::new("anna")).unwrap();

        cache.clear().unwrap();
        assert_eq!(cache.get::<Question>().unwrap().len(), 2);
        assert!(cache.results().unwrap().is_empty());
    }
}
