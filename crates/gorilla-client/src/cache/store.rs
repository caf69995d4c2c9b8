use std::io;
use std::path::{Path, PathBuf};

use gorilla_proto::validate_optional_install_item;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{CacheDocument, CacheStore};
use crate::error::{CacheError, ClientError};
use crate::paths;

/// JSON file cache with one writer at a time.
#[derive(Debug)]
pub struct JsonFileCacheStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl Default for JsonFileCacheStore {
    fn default() -> Self {
        Self::new(paths::cache_file_path())
    }
}

impl JsonFileCacheStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Option<CacheDocument>, CacheError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CacheError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let document: CacheDocument =
            serde_json::from_slice(&bytes).map_err(|source| CacheError::Decode {
                path: self.path.clone(),
                source,
            })?;
        Ok(Some(document))
    }
}

impl CacheStore for JsonFileCacheStore {
    async fn load(&self, cancel: &CancellationToken) -> Result<Option<CacheDocument>, ClientError> {
        if cancel.is_cancelled() {
            return Err(ClientError::Canceled);
        }

        let document = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ClientError::Canceled),
            result = self.read_document() => result,
        };

        match document {
            Ok(Some(document)) => {
                if let Some(err) = document
                    .items
                    .iter()
                    .find_map(|item| validate_optional_install_item(item).err())
                {
                    warn!(path = %self.path.display(), error = %err, "Ignoring invalid cache entry");
                    return Ok(None);
                }
                debug!(path = %self.path.display(), count = document.items.len(), "Loaded cache");
                Ok(Some(document))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                warn!(error = %err, "Ignoring unreadable cache");
                Ok(None)
            }
        }
    }

    async fn save(
        &self,
        document: &CacheDocument,
        cancel: &CancellationToken,
    ) -> Result<(), ClientError> {
        if cancel.is_cancelled() {
            return Err(ClientError::Canceled);
        }

        let bytes = serde_json::to_vec_pretty(document)
            .map_err(gorilla_proto::ProtocolError::Encode)?;

        let _guard = self.write_lock.lock().await;
        atomic_write(&self.path, &bytes)
            .await
            .map_err(|source| CacheError::Write {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), count = document.items.len(), "Saved cache");
        Ok(())
    }
}

/// Write to a sibling temp file, then rename over `path`.
///
/// A reader sees either the old document or the new one.
async fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    tokio::fs::create_dir_all(parent).await?;

    let temp_path = parent.join(format!(
        ".{}.tmp.{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("cache"),
        uuid::Uuid::new_v4().simple()
    ));

    {
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
    }

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        // Rename over an existing file can fail on Windows.
        if cfg!(windows) {
            tokio::fs::copy(&temp_path, path).await?;
            let _ = tokio::fs::remove_file(&temp_path).await;
        } else {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }
    }
    Ok(())
}
