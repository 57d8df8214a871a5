//! File-based storage backend.
//!
//! Each key is stored as its own file under a base directory, prefixed with
//! a fixed-size header carrying the expiry time. Writes go through a
//! temporary file and a rename so a crashed write never leaves a torn
//! checkpoint behind.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use order_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, StorageKey, ValidationError,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;

const DEFAULT_STORAGE_PATH: &str = "./data/checkpoints";

fn unix_now() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or(0)
}

fn escape_key(key: &str) -> String {
	let mut escaped = String::with_capacity(key.len());
	for byte in key.bytes() {
		if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
			escaped.push(byte as char);
		} else {
			escaped.push_str(&format!("%{:02X}", byte));
		}
	}
	escaped
}

#[allow(clippy::doc_nested_refdefs)]
/// Fixed-size file header for TTL support.
///
/// Binary layout (64 bytes total):
/// - [0-3]: Magic bytes "ORDT"
/// - [4-5]: Version (u16, little-endian)
/// - [6-13]: Expiration timestamp (u64, little-endian, Unix seconds, 0 = never)
/// - [14-63]: Reserved
#[derive(Debug, Clone)]
struct FileHeader {
	version: u16,
	expires_at: u64,
}

impl FileHeader {
	const MAGIC: &'static [u8; 4] = b"ORDT";
	const VERSION: u16 = 1;
	const SIZE: usize = 64;

	/// Creates a new header with the given TTL; a zero TTL never expires.
	fn new(ttl: Duration) -> Self {
		let expires_at = if ttl.is_zero() {
			0
		} else {
			unix_now().saturating_add(ttl.as_secs())
		};

		Self {
			version: Self::VERSION,
			expires_at,
		}
	}

	fn serialize(&self) -> [u8; Self::SIZE] {
		let mut bytes = [0u8; Self::SIZE];
		bytes[0..4].copy_from_slice(Self::MAGIC);
		bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
		bytes[6..14].copy_from_slice(&self.expires_at.to_le_bytes());
		bytes
	}

	fn deserialize(bytes: &[u8]) -> Result<Self, StorageError> {
		if bytes.len() < Self::SIZE {
			return Err(StorageError::Backend("File too small for header".into()));
		}

		if &bytes[0..4] != Self::MAGIC {
			return Err(StorageError::Backend("Unrecognized file format".into()));
		}

		let version = u16::from_le_bytes([bytes[4], bytes[5]]);
		if version > Self::VERSION {
			return Err(StorageError::Backend(format!(
				"Unsupported file version: {}",
				version
			)));
		}

		let mut expires_bytes = [0u8; 8];
		expires_bytes.copy_from_slice(&bytes[6..14]);

		Ok(Self {
			version,
			expires_at: u64::from_le_bytes(expires_bytes),
		})
	}

	fn is_expired(&self) -> bool {
		self.expires_at != 0 && unix_now() >= self.expires_at
	}
}

/// TTL configuration per storage namespace.
#[derive(Debug, Clone, Default)]
pub struct TtlConfig {
	ttls: HashMap<StorageKey, Duration>,
}

impl TtlConfig {
	/// Reads `ttl_<namespace>` entries from the backend's TOML table.
	fn from_config(config: &toml::Value) -> Self {
		let mut ttls = HashMap::new();

		if let Some(table) = config.as_table() {
			for storage_key in StorageKey::all() {
				let config_key = format!("ttl_{}", storage_key.as_str());
				if let Some(seconds) = table.get(&config_key).and_then(|v| v.as_integer()) {
					ttls.insert(storage_key, Duration::from_secs(seconds.max(0) as u64));
				}
			}
		}

		Self { ttls }
	}

	fn get_ttl(&self, storage_key: StorageKey) -> Duration {
		self.ttls
			.get(&storage_key)
			.copied()
			.unwrap_or(Duration::ZERO)
	}
}

/// File-based storage implementation.
pub struct FileStorage {
	base_path: PathBuf,
	ttl_config: TtlConfig,
}

impl FileStorage {
	pub fn new(base_path: PathBuf, ttl_config: TtlConfig) -> Self {
		Self {
			base_path,
			ttl_config,
		}
	}

	/// Converts a storage key to a filesystem-safe file path.
	///
	/// Every byte outside `[A-Za-z0-9_-]` is percent-escaped, so distinct keys
	/// always map to distinct files.
	fn get_file_path(&self, key: &str) -> PathBuf {
		self.base_path.join(format!("{}.bin", escape_key(key)))
	}

	/// Gets the TTL for a key from its namespace ("checkpoints:abc" -> "checkpoints").
	fn get_ttl_for_key(&self, key: &str) -> Duration {
		let namespace = key.split(':').next().unwrap_or("");

		namespace
			.parse::<StorageKey>()
			.map(|sk| self.ttl_config.get_ttl(sk))
			.unwrap_or(Duration::ZERO)
	}

	async fn cleanup_expired_files(&self) -> Result<usize, StorageError> {
		let mut entries = match fs::read_dir(&self.base_path).await {
			Ok(entries) => entries,
			// Nothing has been written yet
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let mut removed = 0;
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new("bin")) {
				continue;
			}

			let data = match fs::read(&path).await {
				Ok(data) => data,
				Err(e) => {
					tracing::debug!("Skipping file {:?}: could not be read: {}", path, e);
					continue;
				},
			};

			match FileHeader::deserialize(&data) {
				Ok(header) if header.is_expired() => {
					if let Err(e) = fs::remove_file(&path).await {
						tracing::warn!("Failed to remove expired file {:?}: {}", path, e);
					} else {
						removed += 1;
					}
				},
				Ok(_) => {},
				Err(e) => tracing::debug!("Skipping file {:?}: {}", path, e),
			}
		}

		Ok(removed)
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.get_file_path(key);

		let data = match fs::read(&path).await {
			Ok(data) => data,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(StorageError::NotFound)
			},
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let header = FileHeader::deserialize(&data)?;
		if header.is_expired() {
			return Err(StorageError::NotFound);
		}

		Ok(data[FileHeader::SIZE..].to_vec())
	}

	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		let ttl = ttl.unwrap_or_else(|| self.get_ttl_for_key(key));
		let header = FileHeader::new(ttl);

		let mut file_data = Vec::with_capacity(FileHeader::SIZE + value.len());
		file_data.extend_from_slice(&header.serialize());
		file_data.extend_from_slice(&value);

		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, file_data)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		match fs::remove_file(&path).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		match self.get_bytes(key).await {
			Ok(_) => Ok(true),
			Err(StorageError::NotFound) => Ok(false),
			Err(e) => Err(e),
		}
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}

	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		self.cleanup_expired_files().await
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let mut optional_fields = vec![Field::new("storage_path", FieldType::String)
			.with_validator(|v| match v.as_str() {
				Some(path) if path.trim().is_empty() => Err("must not be empty".into()),
				_ => Ok(()),
			})];

		for storage_key in StorageKey::all() {
			optional_fields.push(Field::new(
				format!("ttl_{}", storage_key.as_str()),
				FieldType::Integer {
					min: Some(0),
					max: None,
				},
			));
		}

		Schema::new(vec![], optional_fields).validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for checkpoint files (default: "./data/checkpoints")
/// - `ttl_checkpoints`: TTL in seconds for checkpoints (default: 0, never expires)
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_STORAGE_PATH)
		.to_string();

	Ok(Box::new(FileStorage::new(
		PathBuf::from(storage_path),
		TtlConfig::from_config(config),
	)))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[tokio::test]
	async fn test_round_trip_and_delete() {
		let temp_dir = TempDir::new().unwrap();
		let storage = FileStorage::new(temp_dir.path().to_path_buf(), TtlConfig::default());

		let key = "checkpoints:session/1";
		storage
			.set_bytes(key, b"{\"orders\":[]}".to_vec(), None)
			.await
			.unwrap();

		assert!(temp_dir.path().join("checkpoints%3Asession%2F1.bin").exists());
		assert_eq!(
			storage.get_bytes(key).await.unwrap(),
			b"{\"orders\":[]}".to_vec()
		);
		assert!(storage.exists(key).await.unwrap());

		storage.delete(key).await.unwrap();
		assert!(!storage.exists(key).await.unwrap());
		// Deleting twice is fine
		storage.delete(key).await.unwrap();
	}

	#[tokio::test]
	async fn test_expired_entries_are_hidden_and_cleaned() {
		let temp_dir = TempDir::new().unwrap();
		let storage = FileStorage::new(temp_dir.path().to_path_buf(), TtlConfig::default());

		// Write a header that expired a long time ago
		let mut data = FileHeader {
			version: FileHeader::VERSION,
			expires_at: 1,
		}
		.serialize()
		.to_vec();
		data.extend_from_slice(b"stale");
		std::fs::write(temp_dir.path().join("checkpoints%3Aold.bin"), data).unwrap();

		storage
			.set_bytes("checkpoints:fresh", b"fresh".to_vec(), None)
			.await
			.unwrap();

		assert!(matches!(
			storage.get_bytes("checkpoints:old").await,
			Err(StorageError::NotFound)
		));
		assert_eq!(storage.cleanup_expired().await.unwrap(), 1);
		assert!(!temp_dir.path().join("checkpoints%3Aold.bin").exists());
		assert!(storage.exists("checkpoints:fresh").await.unwrap());
	}

	#[tokio::test]
	async fn test_similar_keys_do_not_share_files() {
		let temp_dir = TempDir::new().unwrap();
		let storage = FileStorage::new(temp_dir.path().to_path_buf(), TtlConfig::default());

		storage
			.set_bytes("checkpoints:a/b", b"first".to_vec(), None)
			.await
			.unwrap();

		for other in ["checkpoints:a:b", "checkpoints:a_b", "checkpoints:a\\b", "checkpoints:a%2Fb"] {
			assert!(
				matches!(storage.get_bytes(other).await, Err(StorageError::NotFound)),
				"{} must not alias checkpoints:a/b",
				other
			);
		}

		storage
			.set_bytes("checkpoints:a_b", b"second".to_vec(), None)
			.await
			.unwrap();
		assert_eq!(
			storage.get_bytes("checkpoints:a/b").await.unwrap(),
			b"first".to_vec()
		);
		assert_eq!(
			storage.get_bytes("checkpoints:a_b").await.unwrap(),
			b"second".to_vec()
		);
	}

	#[test]
	fn test_escape_key() {
		assert_eq!(escape_key("checkpoints:s-1_x"), "checkpoints%3As-1_x");
		assert_eq!(escape_key("a/b\\c.d%"), "a%2Fb%5Cc%2Ed%25");
	}

	#[tokio::test]
	async fn test_cleanup_without_directory() {
		let temp_dir = TempDir::new().unwrap();
		let storage = FileStorage::new(temp_dir.path().join("never-created"), TtlConfig::default());
		assert_eq!(storage.cleanup_expired().await.unwrap(), 0);
	}

	#[test]
	fn test_ttl_from_config() {
		let config: toml::Value = toml::from_str("ttl_checkpoints = 60").unwrap();
		let storage = FileStorage::new(PathBuf::from("."), TtlConfig::from_config(&config));

		assert_eq!(
			storage.get_ttl_for_key("checkpoints:abc"),
			Duration::from_secs(60)
		);
		assert_eq!(storage.get_ttl_for_key("other:abc"), Duration::ZERO);
	}

	#[test]
	fn test_schema_rejects_negative_ttl() {
		let config: toml::Value = toml::from_str("ttl_checkpoints = -5").unwrap();
		assert!(matches!(
			create_storage(&config),
			Err(StorageError::Configuration(_))
		));
	}

	#[test]
	fn test_header_rejects_foreign_files() {
		let mut bytes = [0u8; FileHeader::SIZE];
		bytes[0..4].copy_from_slice(b"OIFS");
		assert!(FileHeader::deserialize(&bytes).is_err());
		assert!(FileHeader::deserialize(b"short").is_err());
	}
}
