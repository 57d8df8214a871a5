//! Session state owned by a single workflow run.

use crate::{HistoryLog, Order};
use serde::{Deserialize, Serialize};

/// The order collection of a session together with its audit history.
///
/// Both sequences are append-only. Processing and transitions only ever look
/// at the most recently appended order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderState {
	#[serde(default)]
	orders: Vec<Order>,
	/// Audit trail of the session.
	#[serde(default)]
	pub history: HistoryLog,
}

impl OrderState {
	/// Creates a state holding the given orders and an empty history.
	pub fn new(orders: Vec<Order>) -> Self {
		Self {
			orders,
			history: HistoryLog::new(),
		}
	}

	pub fn orders(&self) -> &[Order] {
		&self.orders
	}

	/// The order the next workflow run will operate on.
	pub fn latest(&self) -> Option<&Order> {
		self.orders.last()
	}

	/// Mutable access to the latest order, for callers amending it between steps.
	pub fn latest_mut(&mut self) -> Option<&mut Order> {
		self.orders.last_mut()
	}

	pub fn push_order(&mut self, order: Order) {
		self.orders.push(order);
	}

	pub fn is_empty(&self) -> bool {
		self.orders.is_empty()
	}
}
