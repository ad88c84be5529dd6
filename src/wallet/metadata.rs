//! Read-only access to user annotations of transactions.
//!
//! Comments and categories are owned by the presentation layer and keyed by transaction
//! hash. The wallet only looks them up to attach them to its transaction views.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// User annotation of a single transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionMetadata {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub comment: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
}

#[derive(Debug, Error)]
pub enum MetadataError {
	#[error("Metadata I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Metadata parse error: {0}")]
	Json(#[from] serde_json::Error),
}

/// Key-value store of transaction annotations
#[async_trait::async_trait]
pub trait MetadataStore: Send + Sync {
	async fn lookup(&self, hash: &str) -> Result<Option<TransactionMetadata>, MetadataError>;
}

/// Store kept entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
	entries: RwLock<HashMap<String, TransactionMetadata>>,
}

impl InMemoryMetadataStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn insert(&self, hash: &str, metadata: TransactionMetadata) {
		self.entries
			.write()
			.await
			.insert(hash.to_lowercase(), metadata);
	}
}

#[async_trait::async_trait]
impl MetadataStore for InMemoryMetadataStore {
	async fn lookup(&self, hash: &str) -> Result<Option<TransactionMetadata>, MetadataError> {
		Ok(self.entries.read().await.get(&hash.to_lowercase()).cloned())
	}
}

/// JSON file of `{ "<hash>": { "comment": .., "category": .. } }`, cached in memory.
///
/// The file is read on [`FileMetadataStore::open`] and again on every
/// [`FileMetadataStore::reload`]. A missing file is an empty store.
pub struct FileMetadataStore {
	path: PathBuf,
	entries: RwLock<HashMap<String, TransactionMetadata>>,
}

impl FileMetadataStore {
	pub async fn open(path: impl AsRef<Path>) -> Result<Self, MetadataError> {
		let path = path.as_ref().to_path_buf();
		let entries = Self::read_entries(&path).await?;
		info!(
			"Loaded {} transaction annotations from {:?}",
			entries.len(),
			path
		);
		Ok(Self {
			path,
			entries: RwLock::new(entries),
		})
	}

	/// Re-read the backing file.
	pub async fn reload(&self) -> Result<(), MetadataError> {
		let entries = Self::read_entries(&self.path).await?;
		debug!("Reloaded {} transaction annotations", entries.len());
		*self.entries.write().await = entries;
		Ok(())
	}

	async fn read_entries(path: &Path) -> Result<HashMap<String, TransactionMetadata>, MetadataError> {
		if !tokio::fs::try_exists(path).await? {
			return Ok(HashMap::new());
		}
		let contents = tokio::fs::read_to_string(path).await?;
		let entries: HashMap<String, TransactionMetadata> = serde_json::from_str(&contents)?;
		Ok(entries
			.into_iter()
			.map(|(hash, metadata)| (hash.to_lowercase(), metadata))
			.collect())
	}
}

#[async_trait::async_trait]
impl MetadataStore for FileMetadataStore {
	async fn lookup(&self, hash: &str) -> Result<Option<TransactionMetadata>, MetadataError> {
		Ok(self.entries.read().await.get(&hash.to_lowercase()).cloned())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn in_memory_lookup_ignores_hash_case() {
		let store = InMemoryMetadataStore::new();
		store
			.insert(
				"0xABC",
				TransactionMetadata {
					comment: Some("rent".to_string()),
					category: None,
				},
			)
			.await;

		let found = store.lookup("0xabc").await.expect("lookup");
		assert_eq!(found.and_then(|m| m.comment).as_deref(), Some("rent"));
		assert_eq!(store.lookup("0xdef").await.expect("lookup"), None);
	}

	#[tokio::test]
	async fn file_store_reads_and_reloads() {
		let dir = tempfile::tempdir().expect("tempdir");
		let path = dir.path().join("metadata.json");

		let store = FileMetadataStore::open(&path).await.expect("open");
		assert_eq!(store.lookup("0x01").await.expect("lookup"), None);

		tokio::fs::write(&path, r#"{ "0x01": { "comment": "coffee", "category": "food" } }"#)
			.await
			.expect("write");
		store.reload().await.expect("reload");

		let found = store.lookup("0x01").await.expect("lookup").expect("entry");
		assert_eq!(found.category.as_deref(), Some("food"));
	}

	#[tokio::test]
	async fn file_store_rejects_malformed_json() {
		let dir = tempfile::tempdir().expect("tempdir");
		let path = dir.path().join("metadata.json");
		std::fs::write(&path, "not json").expect("write");

		assert!(matches!(
			FileMetadataStore::open(&path).await,
			Err(MetadataError::Json(_))
		));
	}
}
