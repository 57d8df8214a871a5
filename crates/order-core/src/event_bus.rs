//! Broadcast channel for workflow events.

use order_types::WorkflowEvent;
use tokio::sync::broadcast;

/// Fan-out bus for [`WorkflowEvent`]s.
///
/// Publishing without subscribers fails with `SendError`; callers that do not
/// care whether anyone is listening discard the result.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<WorkflowEvent>,
}

impl EventBus {
	/// Creates a bus buffering up to `capacity` events per lagging subscriber.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity.max(1));
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
		self.sender.subscribe()
	}

	/// Sends an event, returning the number of subscribers that received it.
	pub fn publish(
		&self,
		event: WorkflowEvent,
	) -> Result<usize, broadcast::error::SendError<WorkflowEvent>> {
		self.sender.send(event)
	}
}
