//! Durable audit persistence service.
//!
//! [`AuditPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! broadcast channel and writes every received [`DomainEvent`] to the
//! `audit_logs` table. It runs as a long-lived background task and shuts
//! down gracefully when the bus sender is dropped. A write failure is
//! logged and skipped; publishers never depend on the sink's durability.

use tokio::sync::broadcast;

use aqualog_db::models::audit::CreateAuditLog;
use aqualog_db::repositories::AuditLogRepo;
use aqualog_db::DbPool;

use crate::bus::DomainEvent;

/// Background service that persists domain events to the audit log.
pub struct AuditPersistence;

impl AuditPersistence {
    /// Run the persistence loop.
    ///
    /// Subscribes via the provided `receiver` and persists every event it
    /// receives. The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](crate::bus::EventBus) is dropped).
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<DomainEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::persist(&pool, &event).await {
                        tracing::error!(
                            error = %e,
                            action = %event.action,
                            "Failed to persist audit event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Audit persistence lagged, some events were not persisted"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, audit persistence shutting down");
                    break;
                }
            }
        }
    }

    /// Write a single event to the `audit_logs` table.
    async fn persist(pool: &DbPool, event: &DomainEvent) -> Result<(), sqlx::Error> {
        let entry = CreateAuditLog {
            action_type: event.action.clone(),
            actor_user_id: event.actor_user_id,
            entity_type: event.entity_type.clone(),
            entity_id: event.entity_id.clone(),
            details_json: Some(event.details.clone()),
        };
        AuditLogRepo::insert(pool, &entry).await?;
        Ok(())
    }
}
