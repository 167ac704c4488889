use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to prepare temporary directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write temporary audio {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to remove temporary audio {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Handle to a reference-audio file written for a single job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporaryAsset {
    path: PathBuf,
}

impl TemporaryAsset {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Store for uploaded reference audio.
///
/// `release` must be idempotent: releasing an asset whose file is already
/// gone (or was never written) succeeds.
#[async_trait]
pub trait TemporaryAudioStore: Send + Sync {
    /// Write `bytes` to a new, uniquely named file with the given extension
    async fn acquire(&self, bytes: &[u8], extension: &str) -> Result<TemporaryAsset, StorageError>;

    /// Delete the file behind `asset` if it still exists
    fn release(&self, asset: &TemporaryAsset) -> Result<(), StorageError>;
}

/// Filesystem-backed store rooted at a dedicated directory
pub struct FsTemporaryAudioStore {
    root: PathBuf,
}

impl FsTemporaryAudioStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn unique_path(&self, extension: &str) -> PathBuf {
        let name = format!(
            "reference_{}_{}.{}",
            Utc::now().format("%Y%m%d_%H%M%S%6f"),
            Uuid::new_v4().simple(),
            extension.trim_start_matches('.')
        );
        self.root.join(name)
    }
}

#[async_trait]
impl TemporaryAudioStore for FsTemporaryAudioStore {
    async fn acquire(&self, bytes: &[u8], extension: &str) -> Result<TemporaryAsset, StorageError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StorageError::CreateDir {
                path: self.root.clone(),
                source,
            })?;

        let path = self.unique_path(extension);

        let written = async {
            let mut file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await?;
            file.write_all(bytes).await?;
            file.flush().await
        }
        .await;

        if let Err(source) = written {
            // Do not leave a truncated file behind (disk full mid-write)
            let _ = std::fs::remove_file(&path);
            tracing::error!(path = %path.display(), error = %source, "Failed to write reference audio");
            return Err(StorageError::Write { path, source });
        }

        tracing::debug!(
            path = %path.display(),
            size_bytes = bytes.len(),
            "Reference audio stored"
        );

        Ok(TemporaryAsset { path })
    }

    fn release(&self, asset: &TemporaryAsset) -> Result<(), StorageError> {
        match std::fs::remove_file(&asset.path) {
            Ok(()) => {
                tracing::debug!(path = %asset.path.display(), "Reference audio removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Remove {
                path: asset.path.clone(),
                source,
            }),
        }
    }
}

/// Scope guard that releases its asset when dropped, so early `?` returns
/// and a dropped job future still clean up.
pub struct AssetGuard<'a> {
    store: &'a dyn TemporaryAudioStore,
    asset: Option<TemporaryAsset>,
}

impl<'a> AssetGuard<'a> {
    pub fn new(store: &'a dyn TemporaryAudioStore) -> Self {
        Self { store, asset: None }
    }

    pub fn hold(&mut self, asset: TemporaryAsset) {
        // Release a previously held asset before replacing it
        self.release();
        self.asset = Some(asset);
    }

    pub fn path(&self) -> Option<&Path> {
        self.asset.as_ref().map(|a| a.path())
    }

    /// Release now instead of at drop. Failures are logged, not returned:
    /// by the time a job cleans up, its outcome is already decided.
    pub fn release(&mut self) {
        if let Some(asset) = self.asset.take() {
            if let Err(e) = self.store.release(&asset) {
                tracing::warn!(error = %e, "Failed to release temporary audio");
            }
        }
    }
}

impl Drop for AssetGuard<'_> {
    fn drop(&mut self) {
        self.release();
    }
}
