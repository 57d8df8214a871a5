//! Routing decision taken after the processing step.

use crate::validator::validate_order;
use order_types::{HaltReason, OrderState};

/// Where a workflow run goes after processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
	/// Run the transition engine, then end.
	Continue,
	/// End the run now.
	Halt(HaltReason),
}

/// Decides whether the latest order goes on to the transition engine.
///
/// Invalid and terminal orders halt; everything else continues.
pub fn route(state: &OrderState) -> Route {
	let Some(order) = state.latest() else {
		return Route::Halt(HaltReason::NoOrder);
	};

	if !validate_order(order) {
		return Route::Halt(HaltReason::InvalidOrder);
	}

	match order.typed_status() {
		Some(status) if status.is_terminal() => Route::Halt(HaltReason::TerminalStatus(status)),
		Some(_) => Route::Continue,
		// Unreachable for a validated order
		None => Route::Halt(HaltReason::InvalidOrder),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use order_types::{Order, OrderStatus, Recorded};

	fn state_with(order: Order) -> OrderState {
		OrderState::new(vec![order])
	}

	#[test]
	fn test_non_terminal_continues() {
		for status in [OrderStatus::Pending, OrderStatus::Shipped] {
			let state = state_with(Order::new(1, 1, 1.0, status, "2025-07-18 10:00:00"));
			assert_eq!(route(&state), Route::Continue);
		}
	}

	#[test]
	fn test_terminal_halts() {
		for status in [OrderStatus::Delivered, OrderStatus::Cancelled] {
			let state = state_with(Order::new(1, 1, 1.0, status, "2025-07-18 10:00:00"));
			assert_eq!(
				route(&state),
				Route::Halt(HaltReason::TerminalStatus(status))
			);
		}
	}

	#[test]
	fn test_invalid_halts_before_status_check() {
		let state = state_with(Order {
			customer_id: Recorded::Typed(0),
			..Order::new(1, 1, 1.0, OrderStatus::Delivered, "2025-07-18 10:00:00")
		});
		assert_eq!(route(&state), Route::Halt(HaltReason::InvalidOrder));
	}

	#[test]
	fn test_only_latest_order_matters() {
		let state = OrderState::new(vec![
			Order::new(1, 1, 1.0, OrderStatus::Delivered, "2025-07-18 10:00:00"),
			Order::new(2, 1, 1.0, OrderStatus::Pending, "2025-07-18 10:00:00"),
		]);
		assert_eq!(route(&state), Route::Continue);
	}

	#[test]
	fn test_empty_state_halts() {
		assert_eq!(
			route(&OrderState::default()),
			Route::Halt(HaltReason::NoOrder)
		);
	}
}
