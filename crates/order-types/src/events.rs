//! Event types published by the workflow runtime.
//!
//! Business failures never surface as errors. Each one is recorded in the
//! session history and announced here so operators can react to it.

use crate::OrderStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a non-fatal processing failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderIssue {
	/// The order failed at least one validation check.
	MalformedOrder,
	/// The order status is outside the transition table.
	UnknownStatus,
	/// The status pair is not an allowed transition.
	IllegalTransition,
}

impl fmt::Display for OrderIssue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OrderIssue::MalformedOrder => write!(f, "malformed_order"),
			OrderIssue::UnknownStatus => write!(f, "unknown_status"),
			OrderIssue::IllegalTransition => write!(f, "illegal_transition"),
		}
	}
}

/// Why the router stopped a run before the transition step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
	/// The session holds no order.
	NoOrder,
	/// The latest order failed validation.
	InvalidOrder,
	/// The latest order is delivered or cancelled.
	TerminalStatus(OrderStatus),
}

impl fmt::Display for HaltReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			HaltReason::NoOrder => write!(f, "no order"),
			HaltReason::InvalidOrder => write!(f, "invalid order"),
			HaltReason::TerminalStatus(status) => write!(f, "terminal status {}", status),
		}
	}
}

/// Steps of a workflow run, used to label checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
	ProcessOrder,
	UpdateStatus,
}

impl fmt::Display for WorkflowStep {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			WorkflowStep::ProcessOrder => write!(f, "process_order"),
			WorkflowStep::UpdateStatus => write!(f, "update_status"),
		}
	}
}

/// Events emitted while a session is being processed.
///
/// `order_id` carries the rendered id so malformed ids can be reported too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkflowEvent {
	/// The latest order passed validation.
	OrderProcessed {
		session_id: String,
		order_id: String,
		status: OrderStatus,
	},
	/// The latest order was rejected by the processing step.
	OrderRejected {
		session_id: String,
		order_id: String,
		issue: OrderIssue,
	},
	/// The transition engine accepted the status.
	StatusUpdated {
		session_id: String,
		order_id: String,
		status: OrderStatus,
	},
	/// The transition engine rejected the status.
	TransitionRejected {
		session_id: String,
		order_id: String,
		issue: OrderIssue,
	},
	/// The router ended the run after processing.
	Halted {
		session_id: String,
		reason: HaltReason,
	},
	/// The session state was persisted after a step.
	Checkpointed {
		session_id: String,
		step: WorkflowStep,
	},
}
