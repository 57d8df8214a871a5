//! The processing step: validates the latest order and records the result.

use crate::validator::{order_defects, validate_order};
use order_types::{AuditEntry, OrderIssue, OrderState, OrderStatus};

/// What a workflow step did to the session.
///
/// The history entry is the authoritative record; the outcome only feeds
/// logging and events. `order_id` is the rendered id, malformed or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
	/// The processing step accepted the latest order.
	Processed { order_id: String, status: OrderStatus },
	/// The transition engine accepted the status.
	Updated { order_id: String, status: OrderStatus },
	/// The step recorded a failure and left the orders untouched.
	Rejected { order_id: String, issue: OrderIssue },
	/// The session holds no order; nothing was recorded.
	NoOrder,
}

/// Validates the latest order and appends exactly one history entry.
///
/// A valid order is recorded as processed under its own timestamp. An invalid
/// one is recorded with its timestamp field echoed verbatim, whatever it
/// holds. The order stays in the collection either way.
pub fn process_order(state: &mut OrderState) -> StepOutcome {
	let Some(order) = state.latest() else {
		tracing::debug!("No order to process");
		return StepOutcome::NoOrder;
	};

	let timestamp = order.timestamp.to_string();
	let order_id = order.order_id.to_string();

	let accepted = match (
		validate_order(order),
		order.order_id.as_typed(),
		order.typed_status(),
	) {
		(true, Some(&id), Some(status)) => Some((id, status)),
		_ => None,
	};

	match accepted {
		Some((id, status)) => {
			tracing::debug!(order_id = id, %status, "Processed order");
			state.history.record(AuditEntry::Processed {
				timestamp,
				order_id: id,
				status,
			});
			StepOutcome::Processed { order_id, status }
		},
		None => {
			let defects = order_defects(order)
				.iter()
				.map(ToString::to_string)
				.collect::<Vec<_>>()
				.join("; ");
			tracing::warn!(order_id = %order_id, defects = %defects, "Rejected malformed order");
			state.history.record(AuditEntry::InvalidOrder {
				timestamp,
				order_id: order_id.clone(),
			});
			StepOutcome::Rejected {
				order_id,
				issue: OrderIssue::MalformedOrder,
			}
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use order_types::{Order, Recorded};
	use serde_json::json;

	#[test]
	fn test_valid_order_is_processed() {
		let mut state = OrderState::new(vec![Order::new(
			1,
			101,
			99.99,
			OrderStatus::Pending,
			"2025-07-18 10:00:00",
		)]);
		let before = state.orders().to_vec();

		let outcome = process_order(&mut state);

		assert_eq!(
			outcome,
			StepOutcome::Processed {
				order_id: "1".into(),
				status: OrderStatus::Pending
			}
		);
		assert_eq!(
			state.history.entries(),
			["2025-07-18 10:00:00: Processed order 1 as pending".to_string()]
		);
		assert_eq!(state.orders(), before.as_slice());
	}

	#[test]
	fn test_invalid_order_echoes_raw_timestamp() {
		let mut state = OrderState::new(vec![Order {
			amount: Recorded::Typed(-1.0),
			timestamp: Recorded::Typed("not a time".into()),
			..Order::new(7, 1, 0.0, OrderStatus::Shipped, "")
		}]);
		let before = state.orders().to_vec();

		let outcome = process_order(&mut state);

		assert!(matches!(
			outcome,
			StepOutcome::Rejected {
				issue: OrderIssue::MalformedOrder,
				..
			}
		));
		assert_eq!(
			state.history.entries(),
			["not a time: Invalid order 7".to_string()]
		);
		assert_eq!(state.orders(), before.as_slice());
	}

	#[test]
	fn test_invalid_order_with_untyped_fields() {
		let order: Order = serde_json::from_value(json!({
			"order_id": "A-17",
			"customer_id": 5,
			"amount": 1.0,
			"status": "pending",
			"timestamp": 1721296800
		}))
		.unwrap();
		let mut state = OrderState::new(vec![order]);

		process_order(&mut state);

		assert_eq!(state.history.last(), Some("1721296800: Invalid order A-17"));
	}

	#[test]
	fn test_only_latest_order_is_processed() {
		let mut state = OrderState::new(vec![
			Order::new(0, 0, -1.0, OrderStatus::Pending, "bad"),
			Order::new(2, 102, 5.0, OrderStatus::Shipped, "2025-07-18 11:00:00"),
		]);

		process_order(&mut state);

		assert_eq!(state.history.len(), 1);
		assert_eq!(
			state.history.last(),
			Some("2025-07-18 11:00:00: Processed order 2 as shipped")
		);
	}

	#[test]
	fn test_empty_state_records_nothing() {
		let mut state = OrderState::default();
		assert_eq!(process_order(&mut state), StepOutcome::NoOrder);
		assert!(state.history.is_empty());
	}
}
