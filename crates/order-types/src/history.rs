//! Append-only audit history for an order session.

use crate::OrderStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One processing outcome, rendered as a single line of the audit history.
///
/// Lines are meant for operators; nothing in the tracker parses them back.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditEntry {
	/// The latest order passed validation.
	Processed {
		timestamp: String,
		order_id: i64,
		status: OrderStatus,
	},
	/// The latest order failed validation.
	InvalidOrder { timestamp: String, order_id: String },
	/// The order carried a status outside the transition table.
	UnknownStatus { at: String, status: String },
	/// The status pair is not an allowed transition.
	InvalidTransition {
		at: String,
		from: OrderStatus,
		to: OrderStatus,
	},
	/// The transition was accepted.
	Updated {
		at: String,
		order_id: String,
		status: OrderStatus,
	},
}

impl fmt::Display for AuditEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AuditEntry::Processed {
				timestamp,
				order_id,
				status,
			} => write!(f, "{}: Processed order {} as {}", timestamp, order_id, status),
			AuditEntry::InvalidOrder {
				timestamp,
				order_id,
			} => write!(f, "{}: Invalid order {}", timestamp, order_id),
			AuditEntry::UnknownStatus { at, status } => {
				write!(f, "{}: Invalid status {}", at, status)
			},
			AuditEntry::InvalidTransition { at, from, to } => {
				write!(f, "{}: Invalid transition from {} to {}", at, from, to)
			},
			AuditEntry::Updated {
				at,
				order_id,
				status,
			} => write!(f, "{}: Updated order {} to {}", at, order_id, status),
		}
	}
}

/// Ordered audit trail of a session.
///
/// Entries can only be appended; there is no API to remove, reorder or edit
/// a line once recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryLog {
	entries: Vec<String>,
}

impl HistoryLog {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends the rendered entry.
	pub fn record(&mut self, entry: AuditEntry) {
		self.entries.push(entry.to_string());
	}

	pub fn entries(&self) -> &[String] {
		&self.entries
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.entries.iter().map(String::as_str)
	}

	pub fn last(&self) -> Option<&str> {
		self.entries.last().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
