//! Sample aggregate model and DTOs.
//!
//! A sample row embeds its parameter snapshots as an ordered JSONB array;
//! snapshots are written only as whole batches when a stage transition
//! fires, never piecemeal.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use aqualog_core::error::CoreError;
use aqualog_core::lifecycle::LifecycleStage;
use aqualog_core::snapshot::ParameterSnapshot;
use aqualog_core::types::{DbId, Timestamp};

/// A row from the `samples` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Sample {
    pub id: DbId,
    /// Human-readable unique id, monotonic by creation (`WQ-YYYYMMDD-NNNNNN`).
    pub sample_code: String,
    pub longitude: f64,
    pub latitude: f64,
    pub address: String,
    /// Opaque storage keys of photographic evidence.
    pub photo_refs: Json<Vec<String>>,
    pub lifecycle_stage: String,
    /// Ordered frozen parameter snapshots.
    pub parameters: Json<Vec<ParameterSnapshot>>,
    /// Worst-case verdict, or NULL until enough snapshots exist.
    pub overall_status: Option<String>,
    pub collected_by: DbId,
    pub collected_at: Timestamp,
    pub field_tested_by: Option<DbId>,
    pub field_tested_at: Option<Timestamp>,
    pub lab_tested_by: Option<DbId>,
    pub lab_tested_at: Option<Timestamp>,
    pub published_by: Option<DbId>,
    pub published_at: Option<Timestamp>,
    pub archived_by: Option<DbId>,
    pub archived_at: Option<Timestamp>,
    /// Soft-delete marker, kept in lock-step with the `archived` stage.
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Sample {
    /// Parse the stored lifecycle stage string.
    pub fn stage(&self) -> Result<LifecycleStage, CoreError> {
        LifecycleStage::parse(&self.lifecycle_stage).ok_or_else(|| {
            CoreError::Internal(format!(
                "sample '{}' has unknown lifecycle stage '{}'",
                self.sample_code, self.lifecycle_stage
            ))
        })
    }
}

/// DTO for registering a newly collected sample.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSample {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub photo_refs: Vec<String>,
    /// Collection time; defaults to now when omitted.
    pub collected_at: Option<Timestamp>,
}

/// Filter parameters for listing samples.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SampleQuery {
    pub stage: Option<String>,
    pub overall_status: Option<String>,
    /// Archived samples are excluded from listings unless set.
    #[serde(default)]
    pub include_archived: bool,
    pub collected_from: Option<Timestamp>,
    pub collected_to: Option<Timestamp>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Paginated response for sample queries.
#[derive(Debug, Clone, Serialize)]
pub struct SamplePage {
    pub items: Vec<Sample>,
    pub total: i64,
}
