//! Order record types for the tracker.
//!
//! An order arrives as loosely shaped JSON from the caller. Every field is kept
//! in a [`Recorded`] wrapper so that a record with a missing or wrongly typed
//! field still decodes, stays in the session's collection, and is rejected by
//! every consumer that re-validates it.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A single order field as it was received.
///
/// `Typed` holds a value of the expected type. `Untyped` holds whatever JSON
/// arrived instead, so it can still be echoed into the audit history.
/// `Missing` marks a field that was absent from the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recorded<T> {
	/// The field carried a value of the expected type.
	Typed(T),
	/// The field carried some other JSON value.
	Untyped(serde_json::Value),
	/// The field was not present.
	Missing,
}

impl<T> Recorded<T> {
	/// Returns the typed value, if the field carried one.
	pub fn as_typed(&self) -> Option<&T> {
		match self {
			Recorded::Typed(value) => Some(value),
			_ => None,
		}
	}

	/// Returns true when the field was absent from the record.
	pub fn is_missing(&self) -> bool {
		matches!(self, Recorded::Missing)
	}
}

impl<T> Default for Recorded<T> {
	fn default() -> Self {
		Recorded::Missing
	}
}

impl<T> From<T> for Recorded<T> {
	fn from(value: T) -> Self {
		Recorded::Typed(value)
	}
}

impl<T: fmt::Display> fmt::Display for Recorded<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Recorded::Typed(value) => write!(f, "{}", value),
			// Strings are echoed without JSON quoting
			Recorded::Untyped(serde_json::Value::String(raw)) => write!(f, "{}", raw),
			Recorded::Untyped(raw) => write!(f, "{}", raw),
			Recorded::Missing => write!(f, "<missing>"),
		}
	}
}

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
	/// Order has been placed and awaits shipment.
	Pending,
	/// Order has left the warehouse.
	Shipped,
	/// Order reached the customer.
	Delivered,
	/// Order was cancelled before shipment.
	Cancelled,
}

impl OrderStatus {
	/// Returns every status in declaration order.
	pub fn all() -> impl Iterator<Item = Self> {
		[Self::Pending, Self::Shipped, Self::Delivered, Self::Cancelled].into_iter()
	}

	/// Check if this is a terminal status (no further transitions allowed).
	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::Delivered | Self::Cancelled)
	}

	/// Returns the lowercase wire name of the status.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Pending => "pending",
			Self::Shipped => "shipped",
			Self::Delivered => "delivered",
			Self::Cancelled => "cancelled",
		}
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned when a string names no known order status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown order status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for OrderStatus {
	type Err = ParseStatusError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"pending" => Ok(Self::Pending),
			"shipped" => Ok(Self::Shipped),
			"delivered" => Ok(Self::Delivered),
			"cancelled" => Ok(Self::Cancelled),
			_ => Err(ParseStatusError(s.to_string())),
		}
	}
}

/// A single purchase record.
///
/// Orders are never removed from a session once appended. Fields are public so
/// an external caller can amend the latest order between workflow steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
	/// Identity of the order within a session; must be a positive integer.
	#[serde(default, skip_serializing_if = "Recorded::is_missing")]
	pub order_id: Recorded<i64>,
	/// Customer that placed the order; must be a positive integer.
	#[serde(default, skip_serializing_if = "Recorded::is_missing")]
	pub customer_id: Recorded<i64>,
	/// Order total; must be a non-negative real number.
	#[serde(
		default,
		deserialize_with = "deserialize_amount",
		skip_serializing_if = "Recorded::is_missing"
	)]
	pub amount: Recorded<f64>,
	/// Current lifecycle status.
	#[serde(default, skip_serializing_if = "Recorded::is_missing")]
	pub status: Recorded<OrderStatus>,
	/// Creation time encoded as `YYYY-MM-DD HH:MM:SS`.
	#[serde(default, skip_serializing_if = "Recorded::is_missing")]
	pub timestamp: Recorded<String>,
}

/// Only JSON reals (`10.5`, `10.0`, `1e3`) are typed amounts; an integer
/// literal such as `10` is kept untyped.
fn deserialize_amount<'de, D>(deserializer: D) -> Result<Recorded<f64>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = serde_json::Value::deserialize(deserializer)?;
	let real = raw
		.as_number()
		.filter(|n| n.is_f64())
		.and_then(|n| n.as_f64());

	Ok(match real {
		Some(amount) => Recorded::Typed(amount),
		None => Recorded::Untyped(raw),
	})
}

impl Order {
	/// Creates an order whose fields all carry values of the expected type.
	pub fn new(
		order_id: i64,
		customer_id: i64,
		amount: f64,
		status: OrderStatus,
		timestamp: impl Into<String>,
	) -> Self {
		Self {
			order_id: Recorded::Typed(order_id),
			customer_id: Recorded::Typed(customer_id),
			amount: Recorded::Typed(amount),
			status: Recorded::Typed(status),
			timestamp: Recorded::Typed(timestamp.into()),
		}
	}

	/// Returns the typed status, if the record carries one.
	pub fn typed_status(&self) -> Option<OrderStatus> {
		self.status.as_typed().copied()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_status_string_conversion() {
		assert_eq!(OrderStatus::Shipped.to_string(), "shipped");
		assert_eq!(
			"cancelled".parse::<OrderStatus>().unwrap(),
			OrderStatus::Cancelled
		);
		assert!("Pending".parse::<OrderStatus>().is_err());
		assert!("returned".parse::<OrderStatus>().is_err());
	}

	#[test]
	fn test_status_terminal_check() {
		assert!(OrderStatus::Delivered.is_terminal());
		assert!(OrderStatus::Cancelled.is_terminal());
		assert!(!OrderStatus::Pending.is_terminal());
		assert!(!OrderStatus::Shipped.is_terminal());
	}

	#[test]
	fn test_well_formed_order_decodes_typed() {
		let order: Order = serde_json::from_value(json!({
			"order_id": 1,
			"customer_id": 101,
			"amount": 99.99,
			"status": "pending",
			"timestamp": "2025-07-18 10:00:00"
		}))
		.unwrap();

		assert_eq!(
			order,
			Order::new(1, 101, 99.99, OrderStatus::Pending, "2025-07-18 10:00:00")
		);
	}

	#[test]
	fn test_malformed_fields_are_retained() {
		let order: Order = serde_json::from_value(json!({
			"order_id": "abc",
			"amount": 10,
			"status": "returned",
			"timestamp": 20250718
		}))
		.unwrap();

		assert_eq!(order.order_id, Recorded::Untyped(json!("abc")));
		assert!(order.customer_id.is_missing());
		assert_eq!(order.amount, Recorded::Untyped(json!(10)));
		assert_eq!(order.status, Recorded::Untyped(json!("returned")));
		assert_eq!(order.timestamp, Recorded::Untyped(json!(20250718)));
		assert_eq!(order.typed_status(), None);
	}

	#[test]
	fn test_amount_requires_real_number() {
		let decode = |amount: serde_json::Value| -> Recorded<f64> {
			let order: Order = serde_json::from_value(json!({ "amount": amount })).unwrap();
			order.amount
		};

		assert_eq!(decode(json!(100)), Recorded::Untyped(json!(100)));
		assert_eq!(decode(json!(-3)), Recorded::Untyped(json!(-3)));
		assert_eq!(decode(json!("1.5")), Recorded::Untyped(json!("1.5")));
		assert_eq!(decode(json!(100.0)), Recorded::Typed(100.0));
		assert_eq!(decode(json!(0.5)), Recorded::Typed(0.5));
	}

	#[test]
	fn test_whole_amount_survives_reencoding() {
		let order = Order::new(1, 2, 100.0, OrderStatus::Pending, "2025-07-18 10:00:00");
		let text = serde_json::to_string(&order).unwrap();
		let decoded: Order = serde_json::from_str(&text).unwrap();
		assert_eq!(decoded.amount, Recorded::Typed(100.0));

		let literal: Order = serde_json::from_str(r#"{"amount": 1e2}"#).unwrap();
		assert_eq!(literal.amount, Recorded::Typed(100.0));
	}

	#[test]
	fn test_recorded_display_echoes_raw_value() {
		assert_eq!(Recorded::Typed(7i64).to_string(), "7");
		assert_eq!(Recorded::<i64>::Untyped(json!("x-1")).to_string(), "x-1");
		assert_eq!(Recorded::<i64>::Untyped(json!(1.5)).to_string(), "1.5");
		assert_eq!(Recorded::<i64>::Missing.to_string(), "<missing>");
	}

	#[test]
	fn test_missing_fields_are_not_serialized() {
		let order = Order {
			customer_id: Recorded::Missing,
			..Order::new(3, 1, 0.0, OrderStatus::Shipped, "2025-01-01 00:00:00")
		};
		let value = serde_json::to_value(&order).unwrap();
		assert!(value.get("customer_id").is_none());
		assert_eq!(value["status"], json!("shipped"));
	}
}
