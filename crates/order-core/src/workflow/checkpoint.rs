//! Session checkpoint persistence.
//!
//! The workflow saves the full session state after every step so a later run
//! (or a `state`/`query` call) sees exactly what the last step produced.

use async_trait::async_trait;
use order_storage::{StorageError, StorageService};
use order_types::{OrderState, StorageKey};
use std::sync::Arc;

/// Save/load contract for session checkpoints.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
	/// Persists the state of a session, replacing any previous checkpoint.
	async fn save(&self, session_id: &str, state: &OrderState) -> Result<(), StorageError>;

	/// Loads the latest checkpoint of a session, if one exists.
	async fn load(&self, session_id: &str) -> Result<Option<OrderState>, StorageError>;

	/// Deletes the checkpoint of a session.
	async fn remove(&self, session_id: &str) -> Result<(), StorageError>;

	/// Removes expired checkpoints, returning how many were removed.
	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		Ok(0)
	}
}

/// Checkpoint store backed by the storage service.
pub struct StorageCheckpointStore {
	storage: Arc<StorageService>,
}

impl StorageCheckpointStore {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}
}

#[async_trait]
impl CheckpointStore for StorageCheckpointStore {
	async fn save(&self, session_id: &str, state: &OrderState) -> Result<(), StorageError> {
		self.storage
			.store(StorageKey::Checkpoints.as_str(), session_id, state)
			.await
	}

	async fn load(&self, session_id: &str) -> Result<Option<OrderState>, StorageError> {
		match self
			.storage
			.retrieve(StorageKey::Checkpoints.as_str(), session_id)
			.await
		{
			Ok(state) => Ok(Some(state)),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(e),
		}
	}

	async fn remove(&self, session_id: &str) -> Result<(), StorageError> {
		self.storage
			.remove(StorageKey::Checkpoints.as_str(), session_id)
			.await
	}

	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		self.storage.cleanup_expired().await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use order_storage::implementations::file::{FileStorage, TtlConfig};
	use order_storage::implementations::memory::MemoryStorage;
	use order_types::{AuditEntry, Order, OrderStatus};

	fn sample_state() -> OrderState {
		let mut state = OrderState::new(vec![Order::new(
			1,
			101,
			99.99,
			OrderStatus::Pending,
			"2025-07-18 10:00:00",
		)]);
		state.history.record(AuditEntry::Processed {
			timestamp: "2025-07-18 10:00:00".into(),
			order_id: 1,
			status: OrderStatus::Pending,
		});
		state
	}

	async fn exercise(store: &dyn CheckpointStore) {
		assert_eq!(store.load("s1").await.unwrap(), None);

		let state = sample_state();
		store.save("s1", &state).await.unwrap();
		assert_eq!(store.load("s1").await.unwrap(), Some(state));
		assert_eq!(store.load("s2").await.unwrap(), None);

		store.remove("s1").await.unwrap();
		assert_eq!(store.load("s1").await.unwrap(), None);
	}

	#[tokio::test]
	async fn test_memory_checkpoints() {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		exercise(&StorageCheckpointStore::new(storage)).await;
	}

	#[tokio::test]
	async fn test_file_checkpoints_keep_similar_sessions_apart() {
		let dir = tempfile::tempdir().unwrap();
		let backend = FileStorage::new(dir.path().to_path_buf(), TtlConfig::default());
		let store = StorageCheckpointStore::new(Arc::new(StorageService::new(Box::new(backend))));

		store.save("team/a", &sample_state()).await.unwrap();

		for other in ["team:a", "team_a", "team\\a"] {
			assert_eq!(store.load(other).await.unwrap(), None, "{other}");
		}
		assert_eq!(store.load("team/a").await.unwrap(), Some(sample_state()));
	}

	#[tokio::test]
	async fn test_file_checkpoints() {
		let dir = tempfile::tempdir().unwrap();
		let backend = FileStorage::new(dir.path().to_path_buf(), TtlConfig::default());
		let storage = Arc::new(StorageService::new(Box::new(backend)));
		exercise(&StorageCheckpointStore::new(storage)).await;
	}
}
