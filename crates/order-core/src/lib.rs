//! Core order lifecycle logic.
//!
//! Validation, the processing step, the status transition engine, status
//! queries and the post-processing router are plain functions over an
//! [`order_types::OrderState`]. The [`workflow`] module hosts them as a
//! checkpointed, per-session runtime, and [`builder`] assembles that runtime
//! from configuration.

pub mod builder;
pub mod clock;
pub mod event_bus;
pub mod processing;
pub mod query;
pub mod router;
pub mod transition;
pub mod validator;
pub mod workflow;

pub use builder::{BuilderError, TrackerBuilder};
pub use clock::{Clock, FixedClock, SystemClock};
pub use event_bus::EventBus;
pub use processing::{process_order, StepOutcome};
pub use query::{query_orders, query_orders_by};
pub use router::{route, Route};
pub use transition::{TransitionEngine, TransitionTable};
pub use validator::{order_defects, validate_order, OrderDefect, TIMESTAMP_FORMAT};
pub use workflow::{CheckpointStore, OrderWorkflow, StorageCheckpointStore, WorkflowError};
