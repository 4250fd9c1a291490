//! JSON-file remote store for single-machine deployments.
//!
//! Each collection is one `<collection>.json` file holding an object that
//! maps document id to document data. Several processes on one machine can
//! share a directory as their "remote".

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use perlan_core::error::RemoteError;
use perlan_core::traits::{Document, RemoteStore};

type DocumentMap = serde_json::Map<String, serde_json::Value>;

/// A remote store backed by a directory of JSON files.
#[derive(Debug)]
pub struct FileRemote {
    dir: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileRemote {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, collection: &str) -> Result<PathBuf, RemoteError> {
        if collection.is_empty()
            || !collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(RemoteError::NotFound(format!("invalid collection '{collection}'")));
        }
        Ok(self.dir.join(format!("{collection}.json")))
    }

    async fn read(&self, collection: &str) -> anyhow::Result<DocumentMap> {
        let path = self.path(collection)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                RemoteError::ApiError {
                    status: 0,
                    message: format!("corrupt collection file {}: {e}", path.display()),
                }
                .into()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DocumentMap::new()),
            Err(e) => Err(RemoteError::NetworkError(format!("{}: {e}", path.display())).into()),
        }
    }

    async fn write(&self, collection: &str, docs: &DocumentMap) -> anyhow::Result<()> {
        let path = self.path(collection)?;
        let io_err = |e: std::io::Error| RemoteError::NetworkError(format!("{}: {e}", path.display()));
        tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;
        let temp = self.dir.join(format!(".{collection}.tmp"));
        let raw = serde_json::to_string_pretty(docs)?;
        tokio::fs::write(&temp, raw).await.map_err(io_err)?;
        tokio::fs::rename(&temp, &path).await.map_err(io_err)?;
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for FileRemote {
    fn name(&self) -> &str {
        "file"
    }

    async fn list(&self, collection: &str) -> anyhow::Result<Vec<Document>> {
        let docs = self.read(collection).await?;
        Ok(docs
            .into_iter()
            .map(|(id, data)| Document { id, data })
            .collect())
    }

    async fn put(&self, collection: &str, id: &str, data: &serde_json::Value) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut docs = self.read(collection).await?;
        docs.insert(id.to_string(), data.clone());
        self.write(collection, &docs).await
    }

    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut docs = self.read(collection).await?;
        if docs.remove(id).is_some() {
            self.write(collection, &docs).await?;
        }
        Ok(())
    }
}
