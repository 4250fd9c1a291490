//! Wiring shared by every command that touches local data.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use perlan_core::background::BackgroundWrites;
use perlan_core::cache::ContentCache;
use perlan_core::results::{Recorder, RemoteResultsSink};
use perlan_core::storage::FileStore;
use perlan_core::sync::SyncEngine;
use perlan_core::traits::ResultsSink;
use perlan_remote::{create_remote, load_config_from, PerlanConfig};

pub struct App {
    pub config: PerlanConfig,
    pub sync: SyncEngine,
    pub recorder: Recorder,
}

impl App {
    /// Load the config and open the local cache under its `data_dir`.
    pub fn open(config_path: Option<&Path>) -> Result<Self> {
        let config = load_config_from(config_path)?;
        let store = FileStore::open(&config.data_dir).with_context(|| {
            format!("failed to open data directory: {}", config.data_dir.display())
        })?;
        let cache = Arc::new(ContentCache::with_bundled_seed(Arc::new(store)));

        let remote = config.remote.as_ref().map(create_remote).transpose()?;
        if let Some(remote) = &remote {
            tracing::debug!("using {} remote", remote.name());
        }

        let writes = Arc::new(BackgroundWrites::new());
        let sink = remote
            .clone()
            .map(|r| Arc::new(RemoteResultsSink::new(r)) as Arc<dyn ResultsSink>);
        let recorder = Recorder::new(cache.clone(), sink, writes.clone());
        let sync = SyncEngine::with_writes(cache, remote, writes);

        Ok(Self {
            config,
            sync,
            recorder,
        })
    }

    /// Open and run the startup sync.
    pub async fn open_synced(config_path: Option<&Path>) -> Result<Self> {
        let app = Self::open(config_path)?;
        app.sync.sync_all().await;
        Ok(app)
    }

    pub fn cache(&self) -> &ContentCache {
        self.sync.cache()
    }

    /// Wait for detached remote writes before the process exits.
    pub async fn finish(&self) {
        let summary = self.sync.flush().await;
        if summary.failed > 0 {
            tracing::warn!(
                "{} of {} remote writes failed; local data is kept",
                summary.failed,
                summary.failed + summary.succeeded
            );
        }
    }
}
