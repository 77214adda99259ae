//! Repository for the `samples` table.
//!
//! Lifecycle transitions use the persisted stage as an optimistic
//! precondition: every transition UPDATE carries
//! `WHERE lifecycle_stage = <expected>`, so two concurrent submissions for
//! the same sample cannot both succeed. Zero rows affected means the
//! record moved under the caller's feet (or does not exist) and surfaces
//! as `None`.

use sqlx::types::Json;
use sqlx::PgPool;

use aqualog_core::lifecycle::LifecycleStage;
use aqualog_core::snapshot::ParameterSnapshot;
use aqualog_core::types::{DbId, Timestamp};

use crate::models::sample::{CreateSample, Sample, SamplePage, SampleQuery};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "\
    id, sample_code, longitude, latitude, address, photo_refs, \
    lifecycle_stage, parameters, overall_status, \
    collected_by, collected_at, field_tested_by, field_tested_at, \
    lab_tested_by, lab_tested_at, published_by, published_at, \
    archived_by, archived_at, deleted_at, created_at, updated_at";

/// Provides persistence operations for samples.
pub struct SampleRepo;

impl SampleRepo {
    /// Draw the next value from the sample-code sequence.
    pub async fn next_code_seq(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT nextval('sample_code_seq')")
            .fetch_one(pool)
            .await
    }

    /// Insert a newly collected sample in the initial lifecycle stage.
    pub async fn create(
        pool: &PgPool,
        sample_code: &str,
        input: &CreateSample,
        collected_by: DbId,
        collected_at: Timestamp,
    ) -> Result<Sample, sqlx::Error> {
        let query = format!(
            "INSERT INTO samples \
                (sample_code, longitude, latitude, address, photo_refs, \
                 lifecycle_stage, parameters, collected_by, collected_at) \
             VALUES ($1, $2, $3, $4, $5, $6, '[]'::jsonb, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Sample>(&query)
            .bind(sample_code)
            .bind(input.longitude)
            .bind(input.latitude)
            .bind(&input.address)
            .bind(Json(input.photo_refs.clone()))
            .bind(LifecycleStage::Collected.as_str())
            .bind(collected_by)
            .bind(collected_at)
            .fetch_one(pool)
            .await
    }

    /// Find a sample by its internal id. Archived samples are included —
    /// they remain retrievable, only listings exclude them by default.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Sample>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM samples WHERE id = $1");
        sqlx::query_as::<_, Sample>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a sample by its human-readable code.
    pub async fn find_by_code(
        pool: &PgPool,
        sample_code: &str,
    ) -> Result<Option<Sample>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM samples WHERE sample_code = $1");
        sqlx::query_as::<_, Sample>(&query)
            .bind(sample_code)
            .fetch_optional(pool)
            .await
    }

    /// List samples with filtering and pagination, newest collection first.
    pub async fn list(pool: &PgPool, params: &SampleQuery) -> Result<SamplePage, sqlx::Error> {
        let limit = params.limit.unwrap_or(50).clamp(1, 500);
        let offset = params.offset.unwrap_or(0).max(0);

        let (where_clause, bind_values, bind_idx) = build_sample_filter(params);

        let query = format!(
            "SELECT {COLUMNS} FROM samples {where_clause} \
             ORDER BY collected_at DESC, id DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );
        let q = bind_sample_values(sqlx::query_as::<_, Sample>(&query), &bind_values);
        let items = q.bind(limit).bind(offset).fetch_all(pool).await?;

        let count_query = format!("SELECT COUNT(*)::BIGINT FROM samples {where_clause}");
        let q = bind_sample_values_scalar(
            sqlx::query_scalar::<_, i64>(&count_query),
            &bind_values,
        );
        let total = q.fetch_one(pool).await?;

        Ok(SamplePage { items, total })
    }

    /// Record a stage's measurement results and advance the lifecycle.
    ///
    /// The whole merged snapshot set replaces the stored one atomically,
    /// the overall status is rewritten, and the appropriate stage stamp
    /// columns are set. Conditioned on the expected current stage.
    pub async fn record_stage_results(
        pool: &PgPool,
        id: DbId,
        expected: LifecycleStage,
        next: LifecycleStage,
        snapshots: &[ParameterSnapshot],
        overall_status: Option<&str>,
        actor: DbId,
    ) -> Result<Option<Sample>, sqlx::Error> {
        // The stamp columns differ per target stage; both variants share
        // the same bind layout.
        let stamp = match next {
            LifecycleStage::FieldTested => "field_tested_by = $6, field_tested_at = NOW()",
            LifecycleStage::LabTested => "lab_tested_by = $6, lab_tested_at = NOW()",
            _ => return Ok(None),
        };
        let query = format!(
            "UPDATE samples SET \
                lifecycle_stage = $3, \
                parameters = $4, \
                overall_status = $5, \
                {stamp}, \
                updated_at = NOW() \
             WHERE id = $1 AND lifecycle_stage = $2 AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Sample>(&query)
            .bind(id)
            .bind(expected.as_str())
            .bind(next.as_str())
            .bind(Json(snapshots.to_vec()))
            .bind(overall_status)
            .bind(actor)
            .fetch_optional(pool)
            .await
    }

    /// Publish a fully tested sample. Recomputes nothing.
    pub async fn publish(
        pool: &PgPool,
        id: DbId,
        expected: LifecycleStage,
        actor: DbId,
    ) -> Result<Option<Sample>, sqlx::Error> {
        let query = format!(
            "UPDATE samples SET \
                lifecycle_stage = $3, \
                published_by = $4, published_at = NOW(), \
                updated_at = NOW() \
             WHERE id = $1 AND lifecycle_stage = $2 AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Sample>(&query)
            .bind(id)
            .bind(expected.as_str())
            .bind(LifecycleStage::Published.as_str())
            .bind(actor)
            .fetch_optional(pool)
            .await
    }

    /// Archive a published sample: stage becomes `archived` and the
    /// soft-delete marker is set in the same statement. Snapshots are
    /// untouched.
    pub async fn archive(
        pool: &PgPool,
        id: DbId,
        expected: LifecycleStage,
        actor: DbId,
    ) -> Result<Option<Sample>, sqlx::Error> {
        let query = format!(
            "UPDATE samples SET \
                lifecycle_stage = $3, \
                archived_by = $4, archived_at = NOW(), \
                deleted_at = NOW(), \
                updated_at = NOW() \
             WHERE id = $1 AND lifecycle_stage = $2 AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Sample>(&query)
            .bind(id)
            .bind(expected.as_str())
            .bind(LifecycleStage::Archived.as_str())
            .bind(actor)
            .fetch_optional(pool)
            .await
    }

    /// Restore an archived sample back to `published` and clear the
    /// soft-delete marker.
    pub async fn restore(pool: &PgPool, id: DbId) -> Result<Option<Sample>, sqlx::Error> {
        let query = format!(
            "UPDATE samples SET \
                lifecycle_stage = $2, \
                deleted_at = NULL, \
                updated_at = NOW() \
             WHERE id = $1 AND lifecycle_stage = $3 AND deleted_at IS NOT NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Sample>(&query)
            .bind(id)
            .bind(LifecycleStage::Published.as_str())
            .bind(LifecycleStage::Archived.as_str())
            .fetch_optional(pool)
            .await
    }

}

// ---------------------------------------------------------------------------
// Internal helpers for dynamic query building
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built sample queries.
enum BindValue {
    Text(String),
    Timestamp(Timestamp),
}

/// Build a WHERE clause and bind values from `SampleQuery` parameters.
///
/// Returns `(where_clause, bind_values, next_bind_index)`.
fn build_sample_filter(params: &SampleQuery) -> (String, Vec<BindValue>, u32) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    if !params.include_archived {
        conditions.push("deleted_at IS NULL".to_string());
    }

    if let Some(ref stage) = params.stage {
        conditions.push(format!("lifecycle_stage = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(stage.clone()));
    }

    if let Some(ref status) = params.overall_status {
        conditions.push(format!("overall_status = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(status.clone()));
    }

    if let Some(from) = params.collected_from {
        conditions.push(format!("collected_at >= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(from));
    }

    if let Some(to) = params.collected_to {
        conditions.push(format!("collected_at <= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(to));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, bind_values, bind_idx)
}

/// Bind a slice of `BindValue` to a sqlx `QueryAs`.
fn bind_sample_values<'q, O>(
    mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}

/// Bind a slice of `BindValue` to a sqlx `QueryScalar`.
fn bind_sample_values_scalar<'q>(
    mut q: sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}
