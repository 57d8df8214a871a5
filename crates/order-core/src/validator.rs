//! Structural and semantic validation of a single order record.
//!
//! Validation never fails loudly: a missing or wrongly typed field simply
//! makes the order invalid.

use chrono::NaiveDateTime;
use order_types::{Order, Recorded};
use std::fmt;

/// The only accepted timestamp encoding, `YYYY-MM-DD HH:MM:SS`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single failed validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDefect {
	OrderId,
	CustomerId,
	Amount,
	Status,
	Timestamp,
}

impl fmt::Display for OrderDefect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OrderDefect::OrderId => write!(f, "order_id must be a positive integer"),
			OrderDefect::CustomerId => write!(f, "customer_id must be a positive integer"),
			OrderDefect::Amount => write!(f, "amount must be a non-negative real number"),
			OrderDefect::Status => write!(f, "status must be one of pending, shipped, delivered, cancelled"),
			OrderDefect::Timestamp => write!(f, "timestamp must be formatted as YYYY-MM-DD HH:MM:SS"),
		}
	}
}

/// Lists every check the order fails, in field order.
pub fn order_defects(order: &Order) -> Vec<OrderDefect> {
	let mut defects = Vec::new();

	if !matches!(order.order_id, Recorded::Typed(id) if id > 0) {
		defects.push(OrderDefect::OrderId);
	}
	if !matches!(order.customer_id, Recorded::Typed(id) if id > 0) {
		defects.push(OrderDefect::CustomerId);
	}
	// NaN compares false and is rejected here
	if !matches!(order.amount, Recorded::Typed(amount) if amount >= 0.0) {
		defects.push(OrderDefect::Amount);
	}
	if order.status.as_typed().is_none() {
		defects.push(OrderDefect::Status);
	}
	if !order
		.timestamp
		.as_typed()
		.is_some_and(|raw| is_canonical_timestamp(raw))
	{
		defects.push(OrderDefect::Timestamp);
	}

	defects
}

/// Returns true when the order satisfies every field constraint.
pub fn validate_order(order: &Order) -> bool {
	order_defects(order).is_empty()
}

/// Checks the exact `YYYY-MM-DD HH:MM:SS` layout, then calendar validity.
///
/// chrono alone is lenient about whitespace and field widths, so the layout
/// is checked byte by byte first.
fn is_canonical_timestamp(raw: &str) -> bool {
	raw.len() == 19
		&& raw.bytes().enumerate().all(|(i, b)| match i {
			4 | 7 => b == b'-',
			10 => b == b' ',
			13 | 16 => b == b':',
			_ => b.is_ascii_digit(),
		}) && NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).is_ok()
}

#[cfg(test)]
mod tests {
	use super::*;
	use order_types::OrderStatus;
	use serde_json::json;

	fn valid() -> Order {
		Order::new(1, 101, 99.99, OrderStatus::Pending, "2025-07-18 10:00:00")
	}

	#[test]
	fn test_valid_order_passes() {
		assert!(validate_order(&valid()));
		assert!(validate_order(&Order {
			amount: Recorded::Typed(0.0),
			..valid()
		}));
		for status in OrderStatus::all() {
			assert!(validate_order(&Order {
				status: Recorded::Typed(status),
				..valid()
			}));
		}
	}

	#[test]
	fn test_each_violation_fails() {
		let cases = vec![
			(
				Order {
					order_id: Recorded::Typed(0),
					..valid()
				},
				OrderDefect::OrderId,
			),
			(
				Order {
					order_id: Recorded::Untyped(json!("1")),
					..valid()
				},
				OrderDefect::OrderId,
			),
			(
				Order {
					customer_id: Recorded::Typed(-3),
					..valid()
				},
				OrderDefect::CustomerId,
			),
			(
				Order {
					customer_id: Recorded::Missing,
					..valid()
				},
				OrderDefect::CustomerId,
			),
			(
				Order {
					amount: Recorded::Typed(-0.01),
					..valid()
				},
				OrderDefect::Amount,
			),
			(
				Order {
					amount: Recorded::Typed(f64::NAN),
					..valid()
				},
				OrderDefect::Amount,
			),
			(
				Order {
					status: Recorded::Untyped(json!("returned")),
					..valid()
				},
				OrderDefect::Status,
			),
			(
				Order {
					timestamp: Recorded::Typed("2025/07/18 10:00:00".into()),
					..valid()
				},
				OrderDefect::Timestamp,
			),
			(
				Order {
					timestamp: Recorded::Missing,
					..valid()
				},
				OrderDefect::Timestamp,
			),
		];

		for (order, defect) in cases {
			assert!(!validate_order(&order), "expected {:?} to fail", order);
			assert_eq!(order_defects(&order), vec![defect]);
		}
	}

	#[test]
	fn test_timestamp_must_match_layout_exactly() {
		for raw in [
			"2025-07-18T10:00:00",
			"2025-7-18 10:00:00",
			"2025-07-18  10:00:00",
			"2025-07-1810:00:00",
			"2025-07-18 10:00",
			"2025-07-18 10:00:00Z",
			" 2025-07-18 10:00:00",
			"2025-13-01 10:00:00",
			"2025-02-30 10:00:00",
			"2025-07-18 24:00:00",
		] {
			assert!(!is_canonical_timestamp(raw), "{raw} should be rejected");
		}
		assert!(is_canonical_timestamp("2024-02-29 23:59:59"));
	}

	#[test]
	fn test_fully_malformed_order_lists_every_defect() {
		let order: Order = serde_json::from_value(json!({ "amount": "free" })).unwrap();
		assert_eq!(
			order_defects(&order),
			vec![
				OrderDefect::OrderId,
				OrderDefect::CustomerId,
				OrderDefect::Amount,
				OrderDefect::Status,
				OrderDefect::Timestamp,
			]
		);
	}

	#[test]
	fn test_integer_amount_is_rejected() {
		let decode = |amount: serde_json::Value| -> Order {
			serde_json::from_value(json!({
				"order_id": 1,
				"customer_id": 101,
				"amount": amount,
				"status": "pending",
				"timestamp": "2025-07-18 10:00:00"
			}))
			.unwrap()
		};

		let order = decode(json!(100));
		assert!(!validate_order(&order));
		assert_eq!(order_defects(&order), vec![OrderDefect::Amount]);
		assert!(validate_order(&decode(json!(100.0))));
	}
}
