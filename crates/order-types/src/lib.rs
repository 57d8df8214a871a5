//! Common types for the order lifecycle tracker.
//!
//! This crate defines the order record, the session state and its audit
//! history, workflow events, and the shared configuration-validation types
//! used by the pluggable storage backends.

/// Workflow events and the failure taxonomy they carry.
pub mod events;
/// Append-only audit history and its entry formats.
pub mod history;
/// The order record and its status enum.
pub mod order;
/// Base trait for self-registering implementations.
pub mod registry;
/// Session state containing orders and history.
pub mod state;
/// Storage namespaces.
pub mod storage;
/// Configuration validation types for backend configuration sections.
pub mod validation;

pub use events::*;
pub use history::*;
pub use order::*;
pub use registry::*;
pub use state::*;
pub use storage::*;
pub use validation::*;
