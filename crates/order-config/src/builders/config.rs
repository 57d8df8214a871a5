//! Configuration builder for creating test and development configurations.
//!
//! This module provides utilities for constructing Config instances with
//! sensible defaults, particularly useful for testing scenarios.

use crate::{ClockZone, Config, StorageConfig, TrackerConfig, WorkflowConfig};
use std::collections::HashMap;

/// Builder for creating `Config` instances with a fluent API.
///
/// Defaults to an in-memory primary storage, so the built config is valid
/// without touching the filesystem.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	tracker_id: String,
	event_capacity: usize,
	clock: ClockZone,
	storage_primary: String,
	storage_implementations: HashMap<String, toml::Value>,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	/// Creates a new `ConfigBuilder` with default values suitable for testing.
	pub fn new() -> Self {
		let mut storage_implementations = HashMap::new();
		storage_implementations.insert(
			"memory".to_string(),
			toml::Value::Table(toml::map::Map::new()),
		);

		Self {
			tracker_id: "test-tracker".to_string(),
			event_capacity: 64,
			clock: ClockZone::Utc,
			storage_primary: "memory".to_string(),
			storage_implementations,
		}
	}

	/// Sets the tracker ID.
	pub fn tracker_id(mut self, id: impl Into<String>) -> Self {
		self.tracker_id = id.into();
		self
	}

	/// Sets the workflow event channel capacity.
	pub fn event_capacity(mut self, capacity: usize) -> Self {
		self.event_capacity = capacity;
		self
	}

	pub fn clock(mut self, clock: ClockZone) -> Self {
		self.clock = clock;
		self
	}

	/// Sets the primary storage implementation.
	pub fn storage_primary(mut self, primary: impl Into<String>) -> Self {
		self.storage_primary = primary.into();
		self
	}

	/// Adds or replaces a storage implementation section.
	pub fn storage_implementation(mut self, name: impl Into<String>, config: toml::Value) -> Self {
		self.storage_implementations.insert(name.into(), config);
		self
	}

	/// Builds the `Config` with the configured values.
	pub fn build(self) -> Config {
		Config {
			tracker: TrackerConfig {
				id: self.tracker_id,
				event_capacity: self.event_capacity,
			},
			workflow: WorkflowConfig { clock: self.clock },
			storage: StorageConfig {
				primary: self.storage_primary,
				implementations: self.storage_implementations,
			},
		}
	}
}
