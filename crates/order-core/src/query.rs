//! Read-only status queries over a session's orders.

use crate::validator::validate_order;
use order_types::{Order, OrderState, OrderStatus};

/// Returns the orders with the given status name that also pass validation.
///
/// An unrecognised status name yields an empty result rather than an error.
pub fn query_orders(state: &OrderState, status: &str) -> Vec<Order> {
	match status.parse::<OrderStatus>() {
		Ok(status) => query_orders_by(state, status),
		Err(e) => {
			tracing::debug!(error = %e, "Ignoring query for invalid status");
			Vec::new()
		},
	}
}

/// Returns the valid orders with the given status, in insertion order.
pub fn query_orders_by(state: &OrderState, status: OrderStatus) -> Vec<Order> {
	state
		.orders()
		.iter()
		.filter(|order| order.typed_status() == Some(status) && validate_order(order))
		.cloned()
		.collect()
}
