//! AquaLog domain event bus and audit sink.
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`DomainEvent`] — the canonical event envelope, one per meaningful
//!   sample/parameter transition.
//! - [`AuditPersistence`] — background service that durably writes every
//!   event to the `audit_logs` table, fire-and-forget from the publisher's
//!   point of view.

pub mod bus;
pub mod persistence;

pub use bus::{DomainEvent, EventBus};
pub use persistence::AuditPersistence;
