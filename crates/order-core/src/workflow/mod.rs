//! Workflow runtime hosting the processing graph.
//!
//! A run takes one session state through processing, routing and (when the
//! router continues) the transition engine, checkpointing after each step.
//! Runs for the same session are serialized; different sessions proceed
//! independently.

use crate::event_bus::EventBus;
use crate::processing::{process_order, StepOutcome};
use crate::query::query_orders;
use crate::router::{route, Route};
use crate::transition::TransitionEngine;
use dashmap::DashMap;
use order_storage::StorageError;
use order_types::{Order, OrderState, WorkflowEvent, WorkflowStep};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex, OwnedMutexGuard};
use tracing::instrument;

pub mod checkpoint;

pub use checkpoint::{CheckpointStore, StorageCheckpointStore};

/// Errors that can occur while running a workflow.
///
/// Rejected orders and transitions are not errors; they end up in the
/// session history.
#[derive(Debug, Error)]
pub enum WorkflowError {
	#[error("Cannot run a workflow on a state without orders")]
	EmptyState,
	#[error("Invalid session id: {0:?}")]
	InvalidSession(String),
	#[error("Checkpoint error: {0}")]
	Checkpoint(#[from] StorageError),
}

/// Runs order sessions and keeps their checkpoints.
pub struct OrderWorkflow {
	checkpoints: Arc<dyn CheckpointStore>,
	engine: TransitionEngine,
	event_bus: EventBus,
	/// Locks of sessions with a run in progress or waiting.
	sessions: DashMap<String, Arc<Mutex<()>>>,
}

impl OrderWorkflow {
	pub fn new(
		checkpoints: Arc<dyn CheckpointStore>,
		engine: TransitionEngine,
		event_bus: EventBus,
	) -> Self {
		Self {
			checkpoints,
			engine,
			event_bus,
			sessions: DashMap::new(),
		}
	}

	/// Starts a session from the given state, replacing any existing checkpoint.
	#[instrument(skip_all, fields(session_id = %session_id))]
	pub async fn invoke(
		&self,
		session_id: &str,
		state: OrderState,
	) -> Result<OrderState, WorkflowError> {
		check_session_id(session_id)?;
		if state.is_empty() {
			return Err(WorkflowError::EmptyState);
		}

		let _lease = self.lock_session(session_id).await;
		self.run(session_id, state).await
	}

	/// Appends an order to the session (starting it if needed) and runs it.
	#[instrument(skip_all, fields(session_id = %session_id))]
	pub async fn submit_order(
		&self,
		session_id: &str,
		order: Order,
	) -> Result<OrderState, WorkflowError> {
		check_session_id(session_id)?;

		let _lease = self.lock_session(session_id).await;

		let mut state = self.checkpoints.load(session_id).await?.unwrap_or_default();
		state.push_order(order);
		self.run(session_id, state).await
	}

	/// Returns the latest checkpoint of a session.
	pub async fn state(&self, session_id: &str) -> Result<Option<OrderState>, WorkflowError> {
		check_session_id(session_id)?;
		Ok(self.checkpoints.load(session_id).await?)
	}

	/// Queries the latest checkpoint of a session by status name.
	///
	/// Unknown sessions and unknown statuses both yield an empty result.
	pub async fn query(&self, session_id: &str, status: &str) -> Result<Vec<Order>, WorkflowError> {
		Ok(self
			.state(session_id)
			.await?
			.map(|state| query_orders(&state, status))
			.unwrap_or_default())
	}

	/// Deletes the checkpoint of a session.
	#[instrument(skip_all, fields(session_id = %session_id))]
	pub async fn discard(&self, session_id: &str) -> Result<(), WorkflowError> {
		check_session_id(session_id)?;

		let _lease = self.lock_session(session_id).await;

		self.checkpoints.remove(session_id).await?;
		tracing::info!("Discarded session");
		Ok(())
	}

	/// Removes expired checkpoints from the backing store.
	pub async fn cleanup_expired(&self) -> Result<usize, WorkflowError> {
		let removed = self.checkpoints.cleanup_expired().await?;
		if removed > 0 {
			tracing::info!(removed, "Removed expired checkpoints");
		}
		Ok(removed)
	}

	pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
		self.event_bus.subscribe()
	}

	async fn lock_session<'a>(&'a self, session_id: &'a str) -> SessionLease<'a> {
		let lock = Arc::clone(&self.sessions.entry(session_id.to_string()).or_default());
		SessionLease {
			sessions: &self.sessions,
			session_id,
			guard: Some(lock.lock_owned().await),
		}
	}

	async fn run(
		&self,
		session_id: &str,
		mut state: OrderState,
	) -> Result<OrderState, WorkflowError> {
		let outcome = process_order(&mut state);
		self.report(session_id, WorkflowStep::ProcessOrder, outcome);
		self.checkpoint(session_id, WorkflowStep::ProcessOrder, &state)
			.await?;

		if let Route::Halt(reason) = route(&state) {
			tracing::info!(%reason, "Workflow halted after processing");
			self.event_bus
				.publish(WorkflowEvent::Halted {
					session_id: session_id.to_string(),
					reason,
				})
				.ok();
			return Ok(state);
		}

		let outcome = self.engine.update_status(&mut state);
		self.report(session_id, WorkflowStep::UpdateStatus, outcome);
		self.checkpoint(session_id, WorkflowStep::UpdateStatus, &state)
			.await?;

		Ok(state)
	}

	async fn checkpoint(
		&self,
		session_id: &str,
		step: WorkflowStep,
		state: &OrderState,
	) -> Result<(), WorkflowError> {
		self.checkpoints.save(session_id, state).await?;
		tracing::debug!(%step, "Checkpointed session");
		self.event_bus
			.publish(WorkflowEvent::Checkpointed {
				session_id: session_id.to_string(),
				step,
			})
			.ok();
		Ok(())
	}

	fn report(&self, session_id: &str, step: WorkflowStep, outcome: StepOutcome) {
		let session_id = session_id.to_string();
		let event = match (step, outcome) {
			(_, StepOutcome::NoOrder) => return,
			(WorkflowStep::ProcessOrder, StepOutcome::Rejected { order_id, issue }) => {
				WorkflowEvent::OrderRejected {
					session_id,
					order_id,
					issue,
				}
			},
			(WorkflowStep::UpdateStatus, StepOutcome::Rejected { order_id, issue }) => {
				WorkflowEvent::TransitionRejected {
					session_id,
					order_id,
					issue,
				}
			},
			(_, StepOutcome::Processed { order_id, status }) => WorkflowEvent::OrderProcessed {
				session_id,
				order_id,
				status,
			},
			(_, StepOutcome::Updated { order_id, status }) => WorkflowEvent::StatusUpdated {
				session_id,
				order_id,
				status,
			},
		};
		self.event_bus.publish(event).ok();
	}
}

/// Exclusive hold on a session for the duration of one operation.
///
/// Dropping the lease releases the session and forgets its lock once no other
/// operation holds or awaits it.
struct SessionLease<'a> {
	sessions: &'a DashMap<String, Arc<Mutex<()>>>,
	session_id: &'a str,
	guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SessionLease<'_> {
	fn drop(&mut self) {
		drop(self.guard.take());
		// New handles are cloned under the same shard lock `remove_if` takes
		self.sessions
			.remove_if(self.session_id, |_, lock| Arc::strong_count(lock) == 1);
	}
}

fn check_session_id(session_id: &str) -> Result<(), WorkflowError> {
	if session_id.trim().is_empty() {
		return Err(WorkflowError::InvalidSession(session_id.to_string()));
	}
	Ok(())
}
