//! Handlers for the `/samples` resource: registration, stage measurement
//! submission, and the publish/archive/restore lifecycle actions.
//!
//! Handlers stay thin: they load state, delegate every decision to
//! `aqualog-core`, persist through the repositories, and emit one audit
//! event per successful transition. The conditional UPDATEs in
//! `SampleRepo` (guarded by the expected lifecycle stage) serialize
//! concurrent submissions for the same sample.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use aqualog_core::audit::{action_for_transition, action_types};
use aqualog_core::error::CoreError;
use aqualog_core::lifecycle::{ensure_actor_allowed, LifecycleStage, TransitionTable};
use aqualog_core::parameter::{MeasurementStage, ParameterDefinition};
use aqualog_core::sample_id::format_sample_id;
use aqualog_core::submission::{submit_stage_results, MeasurementInput};
use aqualog_core::types::{DbId, Timestamp};
use aqualog_db::models::sample::{CreateSample, Sample, SampleQuery};
use aqualog_db::repositories::{ParameterRepo, SampleRepo};
use aqualog_events::DomainEvent;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireAnalyst, RequireCollector};
use crate::response::DataResponse;
use crate::state::AppState;

/// The lifecycle shape this deployment runs; the express single-testing
/// variant is expressible by swapping this table.
const LIFECYCLE: TransitionTable = TransitionTable::standard();

// ---------------------------------------------------------------------------
// Registration and retrieval
// ---------------------------------------------------------------------------

/// Request body for registering a newly collected sample.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSampleRequest {
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub address: String,
    #[serde(default)]
    pub photo_refs: Vec<String>,
    /// Collection time; defaults to now when omitted.
    pub collected_at: Option<Timestamp>,
}

/// POST /api/v1/samples
///
/// Register a sample collected in the field. The sample starts in the
/// `collected` stage with no measurements.
pub async fn create_sample(
    State(state): State<AppState>,
    RequireCollector(user): RequireCollector,
    Json(body): Json<CreateSampleRequest>,
) -> AppResult<impl IntoResponse> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let collected_at = body.collected_at.unwrap_or_else(chrono::Utc::now);
    let seq = SampleRepo::next_code_seq(&state.pool).await?;
    let sample_code = format_sample_id(collected_at.date_naive(), seq);

    let input = CreateSample {
        longitude: body.longitude,
        latitude: body.latitude,
        address: body.address.trim().to_string(),
        photo_refs: body.photo_refs,
        collected_at: Some(collected_at),
    };
    let sample =
        SampleRepo::create(&state.pool, &sample_code, &input, user.user_id, collected_at).await?;

    state.event_bus.publish(
        DomainEvent::new(action_types::SAMPLE_COLLECTED)
            .with_entity("sample", sample.sample_code.clone())
            .with_actor(user.user_id),
    );

    Ok(Json(DataResponse { data: sample }))
}

/// GET /api/v1/samples
///
/// List samples, newest collection first. Archived samples are excluded
/// unless `include_archived=true`.
pub async fn list_samples(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<SampleQuery>,
) -> AppResult<impl IntoResponse> {
    let page = SampleRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/samples/{id}
///
/// Fetch one sample, archived or not.
pub async fn get_sample(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let sample = load_sample(&state, id).await?;
    Ok(Json(DataResponse { data: sample }))
}

/// GET /api/v1/samples/by-code/{code}
///
/// Fetch one sample by its human-readable code.
pub async fn get_sample_by_code(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(code): Path<String>,
) -> AppResult<impl IntoResponse> {
    let sample = SampleRepo::find_by_code(&state.pool, &code)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Sample",
                id: code.clone(),
            })
        })?;
    Ok(Json(DataResponse { data: sample }))
}

// ---------------------------------------------------------------------------
// Stage measurement submission
// ---------------------------------------------------------------------------

/// Request body for a stage measurement batch.
#[derive(Debug, Deserialize)]
pub struct SubmitMeasurementsRequest {
    pub measurements: Vec<MeasurementInput>,
}

/// POST /api/v1/samples/{id}/field-results
///
/// Submit the on-site measurement batch. Must cover every active field
/// parameter; the whole batch is rejected atomically otherwise.
pub async fn submit_field_results(
    State(state): State<AppState>,
    RequireCollector(user): RequireCollector,
    Path(id): Path<DbId>,
    Json(body): Json<SubmitMeasurementsRequest>,
) -> AppResult<impl IntoResponse> {
    let sample = submit_results(
        &state,
        &user,
        id,
        MeasurementStage::Field,
        LifecycleStage::FieldTested,
        &body.measurements,
    )
    .await?;
    Ok(Json(DataResponse { data: sample }))
}

/// POST /api/v1/samples/{id}/lab-results
///
/// Submit the laboratory measurement batch; completes the sample's verdict.
pub async fn submit_lab_results(
    State(state): State<AppState>,
    RequireAnalyst(user): RequireAnalyst,
    Path(id): Path<DbId>,
    Json(body): Json<SubmitMeasurementsRequest>,
) -> AppResult<impl IntoResponse> {
    let sample = submit_results(
        &state,
        &user,
        id,
        MeasurementStage::Lab,
        LifecycleStage::LabTested,
        &body.measurements,
    )
    .await?;
    Ok(Json(DataResponse { data: sample }))
}

/// Shared submission flow for both measurement stages.
async fn submit_results(
    state: &AppState,
    user: &AuthUser,
    id: DbId,
    stage: MeasurementStage,
    target: LifecycleStage,
    measurements: &[MeasurementInput],
) -> AppResult<Sample> {
    let sample = load_sample(state, id).await?;
    let current = sample.stage()?;

    let definitions = load_stage_definitions(state, stage).await?;

    let outcome = submit_stage_results(
        &LIFECYCLE,
        current,
        target,
        &user.role,
        stage,
        &definitions,
        &sample.parameters.0,
        measurements,
    )?;

    let updated = SampleRepo::record_stage_results(
        &state.pool,
        id,
        current,
        outcome.next_stage,
        &outcome.snapshots,
        outcome.overall_status.map(|s| s.as_str()),
        user.user_id,
    )
    .await?
    .ok_or_else(concurrent_update)?;

    state.event_bus.publish(
        DomainEvent::new(action_for_transition(current, outcome.next_stage))
            .with_entity("sample", updated.sample_code.clone())
            .with_actor(user.user_id)
            .with_details(serde_json::json!({
                "stage": stage.as_str(),
                "parameter_count": measurements.len(),
                "overall_status": updated.overall_status,
            })),
    );

    Ok(updated)
}

// ---------------------------------------------------------------------------
// Publish / archive / restore
// ---------------------------------------------------------------------------

/// POST /api/v1/samples/{id}/publish
///
/// Release a fully tested sample. Recomputes nothing; the verdict was
/// fixed at the last test submission.
pub async fn publish_sample(
    State(state): State<AppState>,
    RequireAnalyst(user): RequireAnalyst,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let sample = load_sample(&state, id).await?;
    let current = sample.stage()?;
    LIFECYCLE.ensure_transition(current, LifecycleStage::Published)?;
    ensure_actor_allowed(&user.role, current, LifecycleStage::Published)?;

    let updated = SampleRepo::publish(&state.pool, id, current, user.user_id)
        .await?
        .ok_or_else(concurrent_update)?;

    publish_transition_event(&state, &user, &updated, current, LifecycleStage::Published);
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/samples/{id}/archive
///
/// Retire a published sample from default listings. Snapshots are kept.
pub async fn archive_sample(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let sample = load_sample(&state, id).await?;
    let current = sample.stage()?;
    LIFECYCLE.ensure_transition(current, LifecycleStage::Archived)?;
    ensure_actor_allowed(&user.role, current, LifecycleStage::Archived)?;

    let updated = SampleRepo::archive(&state.pool, id, current, user.user_id)
        .await?
        .ok_or_else(concurrent_update)?;

    publish_transition_event(&state, &user, &updated, current, LifecycleStage::Archived);
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/samples/{id}/restore
///
/// Return an archived sample to `published`.
pub async fn restore_sample(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let sample = load_sample(&state, id).await?;
    let current = sample.stage()?;
    LIFECYCLE.ensure_transition(current, LifecycleStage::Published)?;
    ensure_actor_allowed(&user.role, current, LifecycleStage::Published)?;

    let updated = SampleRepo::restore(&state.pool, id)
        .await?
        .ok_or_else(concurrent_update)?;

    publish_transition_event(&state, &user, &updated, current, LifecycleStage::Published);
    Ok(Json(DataResponse { data: updated }))
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Load a sample or fail with 404.
async fn load_sample(state: &AppState, id: DbId) -> AppResult<Sample> {
    SampleRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Sample",
                id: id.to_string(),
            })
        })
}

/// Load and convert the active parameter catalog for one stage.
async fn load_stage_definitions(
    state: &AppState,
    stage: MeasurementStage,
) -> AppResult<Vec<ParameterDefinition>> {
    let rows = ParameterRepo::list_by_stage(&state.pool, stage.as_str(), true).await?;
    let mut definitions = Vec::with_capacity(rows.len());
    for row in &rows {
        definitions.push(row.to_domain()?);
    }
    Ok(definitions)
}

/// The optimistic stage precondition failed: someone else moved the sample.
fn concurrent_update() -> AppError {
    AppError::Core(CoreError::Conflict(
        "Sample was modified concurrently; reload and retry".to_string(),
    ))
}

/// Emit the audit fact for a completed lifecycle action.
fn publish_transition_event(
    state: &AppState,
    user: &AuthUser,
    sample: &Sample,
    from: LifecycleStage,
    to: LifecycleStage,
) {
    state.event_bus.publish(
        DomainEvent::new(action_for_transition(from, to))
            .with_entity("sample", sample.sample_code.clone())
            .with_actor(user.user_id)
            .with_details(serde_json::json!({
                "overall_status": sample.overall_status,
            })),
    );
}
