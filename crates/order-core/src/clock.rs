//! Wall-clock source for transition timestamps.

use crate::validator::TIMESTAMP_FORMAT;
use chrono::{Local, NaiveDateTime, Utc};
use order_config::ClockZone;

/// Source of the current time used to stamp transition history entries.
pub trait Clock: Send + Sync {
	fn now(&self) -> NaiveDateTime;

	/// The current time rendered in the history timestamp format.
	fn timestamp(&self) -> String {
		self.now().format(TIMESTAMP_FORMAT).to_string()
	}
}

/// Reads the host clock in the configured zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
	zone: ClockZone,
}

impl SystemClock {
	pub fn new(zone: ClockZone) -> Self {
		Self { zone }
	}
}

impl Clock for SystemClock {
	fn now(&self) -> NaiveDateTime {
		match self.zone {
			ClockZone::Local => Local::now().naive_local(),
			ClockZone::Utc => Utc::now().naive_utc(),
		}
	}
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
	fn now(&self) -> NaiveDateTime {
		self.0
	}
}
