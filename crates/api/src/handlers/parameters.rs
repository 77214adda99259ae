//! Handlers for the `/parameters` registry resource.
//!
//! Mutation is admin-gated and validated through the core definition
//! checks before anything touches the database. Deactivating a definition
//! never affects snapshots already frozen from it.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use aqualog_core::audit::action_types;
use aqualog_core::error::CoreError;
use aqualog_core::parameter::{
    normalize_code, validate_definition, LimitRange, MeasurementStage, ParameterDefinition,
    ParameterKind,
};
use aqualog_db::models::parameter::{
    CreateParameterDefinition, ParameterDefinitionRow, UpdateParameterDefinition,
};
use aqualog_db::repositories::ParameterRepo;
use aqualog_events::DomainEvent;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for the registry listing.
#[derive(Debug, Deserialize)]
pub struct ParameterListQuery {
    /// Optional stage filter (`field` or `lab`).
    pub stage: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

/// GET /api/v1/parameters
///
/// List the parameter catalog, optionally filtered by stage.
pub async fn list_parameters(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<ParameterListQuery>,
) -> AppResult<impl IntoResponse> {
    let active_only = !params.include_inactive;
    let rows = match params.stage.as_deref() {
        Some(stage) => {
            if MeasurementStage::parse(stage).is_none() {
                return Err(AppError::BadRequest(format!("Unknown stage: {stage}")));
            }
            ParameterRepo::list_by_stage(&state.pool, stage, active_only).await?
        }
        None => ParameterRepo::list(&state.pool, active_only).await?,
    };
    Ok(Json(DataResponse { data: rows }))
}

/// GET /api/v1/parameters/{code}
///
/// Fetch one definition by code (case-insensitive).
pub async fn get_parameter(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(code): Path<String>,
) -> AppResult<impl IntoResponse> {
    let code = normalize_code(&code);
    let row = find_parameter(&state, &code).await?;
    Ok(Json(DataResponse { data: row }))
}

/// POST /api/v1/parameters
///
/// Create a new definition. Admin only.
pub async fn create_parameter(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Json(mut body): Json<CreateParameterDefinition>,
) -> AppResult<impl IntoResponse> {
    body.code = normalize_code(&body.code);
    body.name = body.name.trim().to_string();
    body.unit = body.unit.trim().to_string();

    let kind = ParameterKind::parse(&body.kind)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown parameter kind: {}", body.kind)))?;
    let stage = MeasurementStage::parse(&body.stage)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown stage: {}", body.stage)))?;

    // Text parameters are informational and default out of aggregation.
    let affects_overall = body
        .affects_overall
        .unwrap_or(kind != ParameterKind::Text);

    let candidate = definition_from_create(&body, kind, stage, affects_overall);
    validate_definition(&candidate)?;

    let row = ParameterRepo::create(&state.pool, &body, affects_overall).await?;

    state.event_bus.publish(
        DomainEvent::new(action_types::PARAMETER_CREATED)
            .with_entity("parameter", row.code.clone())
            .with_actor(user.user_id),
    );

    Ok(Json(DataResponse { data: row }))
}

/// PUT /api/v1/parameters/{code}
///
/// Patch a definition. Kind and stage are immutable; the patched result is
/// re-validated as a whole before it is written.
pub async fn update_parameter(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(code): Path<String>,
    Json(body): Json<UpdateParameterDefinition>,
) -> AppResult<impl IntoResponse> {
    let code = normalize_code(&code);
    let existing = find_parameter(&state, &code).await?;

    // Validate the post-patch shape before touching the row.
    let mut candidate = existing.to_domain()?;
    apply_patch(&mut candidate, &body);
    validate_definition(&candidate)?;

    let row = ParameterRepo::update(&state.pool, &code, &body)
        .await?
        .ok_or_else(|| not_found(&code))?;

    state.event_bus.publish(
        DomainEvent::new(action_types::PARAMETER_UPDATED)
            .with_entity("parameter", row.code.clone())
            .with_actor(user.user_id),
    );

    Ok(Json(DataResponse { data: row }))
}

/// Request body for the activation toggle.
#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

/// PUT /api/v1/parameters/{code}/active
///
/// Activate or retire a definition. Existing snapshots keep their frozen
/// copy regardless.
pub async fn set_parameter_active(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(code): Path<String>,
    Json(body): Json<SetActiveRequest>,
) -> AppResult<impl IntoResponse> {
    let code = normalize_code(&code);
    let row = ParameterRepo::set_active(&state.pool, &code, body.is_active)
        .await?
        .ok_or_else(|| not_found(&code))?;

    state.event_bus.publish(
        DomainEvent::new(action_types::PARAMETER_UPDATED)
            .with_entity("parameter", row.code.clone())
            .with_actor(user.user_id)
            .with_details(serde_json::json!({ "is_active": body.is_active })),
    );

    Ok(Json(DataResponse { data: row }))
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn not_found(code: &str) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Parameter",
        id: code.to_string(),
    })
}

async fn find_parameter(state: &AppState, code: &str) -> AppResult<ParameterDefinitionRow> {
    ParameterRepo::find_by_code(&state.pool, code)
        .await?
        .ok_or_else(|| not_found(code))
}

/// Fold a nullable column pair into an optional limit range.
fn limit(min: Option<f64>, max: Option<f64>) -> Option<LimitRange> {
    if min.is_none() && max.is_none() {
        None
    } else {
        Some(LimitRange::new(min, max))
    }
}

/// Build a domain definition from a create DTO for pre-insert validation.
fn definition_from_create(
    body: &CreateParameterDefinition,
    kind: ParameterKind,
    stage: MeasurementStage,
    affects_overall: bool,
) -> ParameterDefinition {
    ParameterDefinition {
        id: 0,
        code: body.code.clone(),
        name: body.name.clone(),
        unit: body.unit.clone(),
        kind,
        stage,
        acceptable_limit: limit(body.acceptable_min, body.acceptable_max),
        permissible_limit: limit(body.permissible_min, body.permissible_max),
        physical_limit: limit(body.physical_min, body.physical_max),
        enum_evaluation: body.enum_evaluation.clone(),
        legacy_max_value: body.legacy_max_value,
        affects_overall,
        is_active: true,
    }
}

/// Apply an update DTO to a domain definition, mirroring the repository's
/// COALESCE patch semantics.
fn apply_patch(def: &mut ParameterDefinition, patch: &UpdateParameterDefinition) {
    if let Some(ref name) = patch.name {
        def.name = name.trim().to_string();
    }
    if let Some(ref unit) = patch.unit {
        def.unit = unit.trim().to_string();
    }
    let acceptable = limit(patch.acceptable_min, patch.acceptable_max);
    if acceptable.is_some() {
        def.acceptable_limit = merge_limits(def.acceptable_limit, acceptable);
    }
    let permissible = limit(patch.permissible_min, patch.permissible_max);
    if permissible.is_some() {
        def.permissible_limit = merge_limits(def.permissible_limit, permissible);
    }
    let physical = limit(patch.physical_min, patch.physical_max);
    if physical.is_some() {
        def.physical_limit = merge_limits(def.physical_limit, physical);
    }
    if let Some(ref mapping) = patch.enum_evaluation {
        def.enum_evaluation = Some(mapping.clone());
    }
    if let Some(legacy) = patch.legacy_max_value {
        def.legacy_max_value = Some(legacy);
    }
    if let Some(affects) = patch.affects_overall {
        def.affects_overall = affects;
    }
}

/// Per-bound COALESCE merge of a patched limit over an existing one.
fn merge_limits(existing: Option<LimitRange>, patch: Option<LimitRange>) -> Option<LimitRange> {
    match (existing, patch) {
        (Some(old), Some(new)) => Some(LimitRange::new(
            new.min.or(old.min),
            new.max.or(old.max),
        )),
        (None, new) => new,
        (old, None) => old,
    }
}
