//! Builder for assembling an order workflow from configuration.
//!
//! Resolves the configured storage implementations through the storage
//! registry, picks the primary backend for checkpoints and wires the
//! transition engine to the configured clock.

use crate::clock::{Clock, SystemClock};
use crate::event_bus::EventBus;
use crate::transition::TransitionEngine;
use crate::workflow::{CheckpointStore, OrderWorkflow, StorageCheckpointStore};
use order_config::Config;
use order_storage::{StorageFactory, StorageInterface, StorageService};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during workflow construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Builder for constructing an [`OrderWorkflow`] with pluggable parts.
pub struct TrackerBuilder {
	config: Config,
	clock: Option<Arc<dyn Clock>>,
	checkpoints: Option<Arc<dyn CheckpointStore>>,
}

impl TrackerBuilder {
	pub fn new(config: Config) -> Self {
		Self {
			config,
			clock: None,
			checkpoints: None,
		}
	}

	/// Overrides the clock configured under `[workflow]`.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = Some(clock);
		self
	}

	/// Uses the given checkpoint store instead of the configured storage.
	pub fn with_checkpoints(mut self, checkpoints: Arc<dyn CheckpointStore>) -> Self {
		self.checkpoints = Some(checkpoints);
		self
	}

	pub fn build(self) -> Result<OrderWorkflow, BuilderError> {
		let checkpoints = match self.checkpoints {
			Some(checkpoints) => checkpoints,
			None => {
				let backend = build_storage(&self.config)?;
				Arc::new(StorageCheckpointStore::new(Arc::new(StorageService::new(
					backend,
				)))) as Arc<dyn CheckpointStore>
			},
		};

		let clock = self
			.clock
			.unwrap_or_else(|| Arc::new(SystemClock::new(self.config.workflow.clock)));

		tracing::info!(
			tracker_id = %self.config.tracker.id,
			clock = ?self.config.workflow.clock,
			"Built order workflow"
		);

		Ok(OrderWorkflow::new(
			checkpoints,
			TransitionEngine::new(clock),
			EventBus::new(self.config.tracker.event_capacity),
		))
	}
}

/// Creates the primary storage backend named in the configuration.
fn build_storage(config: &Config) -> Result<Box<dyn StorageInterface>, BuilderError> {
	let factories: HashMap<&str, StorageFactory> =
		order_storage::get_all_implementations().into_iter().collect();

	let mut storage_impls = HashMap::new();
	for (name, section) in &config.storage.implementations {
		let Some(factory) = factories.get(name.as_str()) else {
			tracing::warn!(component = "storage", implementation = %name, "Unknown implementation, skipping");
			continue;
		};
		match factory(section) {
			Ok(implementation) => {
				let is_primary = &config.storage.primary == name;
				tracing::info!(component = "storage", implementation = %name, enabled = %is_primary, "Loaded");
				storage_impls.insert(name.clone(), implementation);
			},
			Err(e) => {
				tracing::error!(
					component = "storage",
					implementation = %name,
					error = %e,
					"Failed to create storage implementation"
				);
				return Err(BuilderError::Config(format!(
					"Failed to create storage implementation '{}': {}",
					name, e
				)));
			},
		}
	}

	if storage_impls.is_empty() {
		return Err(BuilderError::Config(
			"No valid storage implementations available".into(),
		));
	}

	let primary = &config.storage.primary;
	storage_impls.remove(primary).ok_or_else(|| {
		BuilderError::MissingComponent(format!("Primary storage '{}' is not available", primary))
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::clock::FixedClock;
	use crate::validator::TIMESTAMP_FORMAT;
	use chrono::NaiveDateTime;
	use order_config::ConfigBuilder;
	use order_types::{Order, OrderStatus};

	fn fixed_clock() -> Arc<dyn Clock> {
		let at = NaiveDateTime::parse_from_str("2025-07-18 12:00:00", TIMESTAMP_FORMAT).unwrap();
		Arc::new(FixedClock(at))
	}

	fn file_section(path: &str) -> toml::Value {
		let mut section = toml::map::Map::new();
		section.insert("storage_path".into(), toml::Value::String(path.into()));
		toml::Value::Table(section)
	}

	#[tokio::test]
	async fn test_build_with_memory_storage() {
		let workflow = TrackerBuilder::new(ConfigBuilder::new().build())
			.with_clock(fixed_clock())
			.build()
			.unwrap();

		let state = workflow
			.submit_order(
				"s1",
				Order::new(1, 101, 99.99, OrderStatus::Pending, "2025-07-18 10:00:00"),
			)
			.await
			.unwrap();
		assert_eq!(
			state.history.last(),
			Some("2025-07-18 12:00:00: Invalid transition from pending to pending")
		);
	}

	#[tokio::test]
	async fn test_build_with_file_storage() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().display().to_string();
		let config = ConfigBuilder::new()
			.storage_primary("file")
			.storage_implementation("file", file_section(&path))
			.build();
		let workflow = TrackerBuilder::new(config).build().unwrap();

		workflow
			.submit_order(
				"s1",
				Order::new(1, 101, 5.0, OrderStatus::Cancelled, "2025-07-18 10:00:00"),
			)
			.await
			.unwrap();

		let reloaded = workflow.state("s1").await.unwrap().unwrap();
		assert_eq!(reloaded.history.len(), 1);
		assert!(std::fs::read_dir(dir.path()).unwrap().next().is_some());
	}

	#[test]
	fn test_unknown_implementations_are_skipped() {
		let config = ConfigBuilder::new()
			.storage_implementation("redis", toml::Value::Table(Default::default()))
			.build();
		assert!(TrackerBuilder::new(config).build().is_ok());
	}

	#[test]
	fn test_invalid_backend_section_fails() {
		let config = ConfigBuilder::new()
			.storage_primary("file")
			.storage_implementation("file", file_section(""))
			.build();
		assert!(matches!(
			TrackerBuilder::new(config).build(),
			Err(BuilderError::Config(_))
		));
	}

	#[test]
	fn test_primary_without_factory_is_missing() {
		let config = ConfigBuilder::new()
			.storage_primary("redis")
			.storage_implementation("redis", toml::Value::Table(Default::default()))
			.build();
		assert!(matches!(
			TrackerBuilder::new(config).build(),
			Err(BuilderError::MissingComponent(_))
		));
	}
}
