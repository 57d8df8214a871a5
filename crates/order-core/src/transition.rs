//! Order status transition engine.
//!
//! Checks the latest order's status against a fixed transition table and
//! records the outcome in the session history, stamped with the engine's own
//! clock rather than the order's timestamp.

use crate::clock::Clock;
use crate::processing::StepOutcome;
use once_cell::sync::Lazy;
use order_types::{AuditEntry, OrderIssue, OrderState, OrderStatus, Recorded};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Static transition table - each status maps to its allowed next statuses
static TRANSITIONS: Lazy<HashMap<OrderStatus, HashSet<OrderStatus>>> = Lazy::new(|| {
	let mut m = HashMap::new();
	m.insert(
		OrderStatus::Pending,
		HashSet::from([OrderStatus::Shipped, OrderStatus::Cancelled]),
	);
	m.insert(OrderStatus::Shipped, HashSet::from([OrderStatus::Delivered]));
	m.insert(OrderStatus::Delivered, HashSet::new()); // terminal
	m.insert(OrderStatus::Cancelled, HashSet::new()); // terminal
	m
});

/// Read access to the fixed transition table.
pub struct TransitionTable;

impl TransitionTable {
	/// Statuses reachable from `from`, in declaration order.
	pub fn allowed(from: OrderStatus) -> Vec<OrderStatus> {
		match TRANSITIONS.get(&from) {
			Some(next) => OrderStatus::all().filter(|s| next.contains(s)).collect(),
			None => Vec::new(),
		}
	}

	/// Checks if a transition is in the table.
	pub fn permits(from: OrderStatus, to: OrderStatus) -> bool {
		TRANSITIONS
			.get(&from)
			.is_some_and(|next| next.contains(&to))
	}
}

/// Validates and records status changes of the latest order.
#[derive(Clone)]
pub struct TransitionEngine {
	clock: Arc<dyn Clock>,
}

impl TransitionEngine {
	pub fn new(clock: Arc<dyn Clock>) -> Self {
		Self { clock }
	}

	/// Checks the latest order's status transition and appends one history entry.
	///
	/// The proposed status is read from the same `status` field as the current
	/// one. Nothing can change the field between the two reads, so every call
	/// presents a self-transition, which the table never allows. Amending the
	/// order between workflow steps moves both reads together.
	pub fn update_status(&self, state: &mut OrderState) -> StepOutcome {
		let Some(order) = state.latest() else {
			tracing::debug!("No order to transition");
			return StepOutcome::NoOrder;
		};

		let order_id = order.order_id.to_string();
		let now = self.clock.timestamp();

		let current = match &order.status {
			Recorded::Typed(status) => *status,
			unknown => {
				let status = unknown.to_string();
				tracing::warn!(order_id = %order_id, status = %status, "Unknown order status");
				state.history.record(AuditEntry::UnknownStatus { at: now, status });
				return StepOutcome::Rejected {
					order_id,
					issue: OrderIssue::UnknownStatus,
				};
			},
		};

		// Same field read again; untyped statuses were already rejected above
		let proposed = state
			.latest()
			.and_then(|o| o.typed_status())
			.unwrap_or(current);

		if !TransitionTable::permits(current, proposed) {
			tracing::warn!(
				order_id = %order_id,
				from = %current,
				to = %proposed,
				"Invalid status transition"
			);
			state.history.record(AuditEntry::InvalidTransition {
				at: now,
				from: current,
				to: proposed,
			});
			return StepOutcome::Rejected {
				order_id,
				issue: OrderIssue::IllegalTransition,
			};
		}

		tracing::info!(order_id = %order_id, status = %proposed, "Updated order status");
		state.history.record(AuditEntry::Updated {
			at: now,
			order_id: order_id.clone(),
			status: proposed,
		});
		StepOutcome::Updated {
			order_id,
			status: proposed,
		}
	}
}
