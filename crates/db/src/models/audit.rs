//! Audit log entity model and DTOs.
//!
//! Audit logs are append-only facts; rows have no `updated_at` and are
//! never modified after insert.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use aqualog_core::types::{DbId, Timestamp};

/// A single audit log entry. Immutable once created.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLog {
    pub id: DbId,
    pub action_type: String,
    pub actor_user_id: Option<DbId>,
    pub entity_type: Option<String>,
    /// Entity identifier in its natural form (sample code, parameter code).
    pub entity_id: Option<String>,
    pub details_json: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// DTO for inserting a new audit log entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAuditLog {
    pub action_type: String,
    pub actor_user_id: Option<DbId>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub details_json: Option<serde_json::Value>,
}

/// Filter parameters for querying audit logs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    pub action_type: Option<String>,
    pub actor_user_id: Option<DbId>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Paginated response for audit log queries.
#[derive(Debug, Clone, Serialize)]
pub struct AuditLogPage {
    pub items: Vec<AuditLog>,
    pub total: i64,
}
