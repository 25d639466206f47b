//! Raw artifact storage.
//!
//! Every stage persists what it fetched through [`RawStore`] so that runs
//! are resumable and enrichment can be repeated without re-scraping.
//! [`FsRawStore`] publishes each artifact with write-then-rename, so an
//! interrupted run never leaves a partial file at a final path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use gpfinder_core::{Postcode, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Addresses one raw artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    SearchPage { postcode: Postcode, page: u32 },
    Detail { id: String },
    Geocode { postcode: Postcode },
}

impl StoreKey {
    /// Relative path of the artifact under the store root.
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        match self {
            StoreKey::SearchPage { postcode, page } => PathBuf::from("search")
                .join(postcode.as_str())
                .join(format!("page-{page}.html")),
            StoreKey::Detail { id } => {
                PathBuf::from("details").join(format!("{}.json", sanitize(id)))
            }
            StoreKey::Geocode { postcode } => {
                PathBuf::from("geocode").join(format!("{}.json", postcode.as_str()))
            }
        }
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.relative_path().display())
    }
}

/// Keeps identifiers from escaping their directory.
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Key-value store for raw artifacts.
///
/// Implementations must tolerate concurrent `put`s of distinct keys.
#[async_trait]
pub trait RawStore: Send + Sync {
    async fn get(&self, key: &StoreKey) -> Result<Option<Vec<u8>>, StoreError>;
    async fn put(&self, key: &StoreKey, bytes: &[u8]) -> Result<(), StoreError>;
}

/// Filesystem-backed [`RawStore`] rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsRawStore {
    root: PathBuf,
}

impl FsRawStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &StoreKey) -> PathBuf {
        self.root.join(key.relative_path())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait]
impl RawStore for FsRawStore {
    async fn get(&self, key: &StoreKey) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    async fn put(&self, key: &StoreKey, bytes: &[u8]) -> Result<(), StoreError> {
        use tokio::io::AsyncWriteExt;

        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }

        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut file = tokio::fs::File::create(&tmp)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        file.write_all(bytes).await.map_err(|e| io_error(&tmp, e))?;
        file.sync_all().await.map_err(|e| io_error(&tmp, e))?;
        drop(file);

        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_error(&path, e))
    }
}

/// In-memory [`RawStore`], used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<StoreKey, Vec<u8>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RawStore for MemoryStore {
    async fn get(&self, key: &StoreKey) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &StoreKey, bytes: &[u8]) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(key.clone(), bytes.to_vec());
        Ok(())
    }
}

/// The unparsed pages fetched for one surgery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetailDocument {
    pub id: String,
    /// Contact details and opening times page.
    pub contact_html: String,
    /// Ratings and reviews page; `None` when it could not be fetched.
    pub reviews_html: Option<String>,
    /// Why `reviews_html` is missing.
    pub reviews_error: Option<String>,
    pub fetched_at: Timestamp,
}

/// A record that a detail fetch was attempted and failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tombstone {
    pub id: String,
    pub reason: String,
    pub failed_at: Timestamp,
}

/// What the detail store holds for an identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoredDetail {
    Document(RawDetailDocument),
    Tombstone(Tombstone),
}

impl StoredDetail {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            StoredDetail::Document(doc) => &doc.id,
            StoredDetail::Tombstone(t) => &t.id,
        }
    }

    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        matches!(self, StoredDetail::Tombstone(_))
    }
}

/// Reads the stored detail for `id`.
///
/// A stored file that does not decode is reported as absent so the next run
/// fetches it again.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the store cannot be read.
pub async fn load_detail(
    store: &dyn RawStore,
    id: &str,
) -> Result<Option<StoredDetail>, StoreError> {
    let key = StoreKey::Detail { id: id.to_owned() };
    let Some(bytes) = store.get(&key).await? else {
        return Ok(None);
    };
    match serde_json::from_slice::<StoredDetail>(&bytes) {
        Ok(detail) => Ok(Some(detail)),
        Err(e) => {
            tracing::warn!(id, key = %key, error = %e, "stored detail is corrupt; ignoring");
            Ok(None)
        }
    }
}

/// Persists a detail document or tombstone under its identifier.
///
/// # Errors
///
/// Returns [`StoreError`] if encoding or the write fails.
pub async fn save_detail(store: &dyn RawStore, detail: &StoredDetail) -> Result<(), StoreError> {
    let key = StoreKey::Detail {
        id: detail.id().to_owned(),
    };
    let bytes = serde_json::to_vec_pretty(detail).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.put(&key, &bytes).await
}
