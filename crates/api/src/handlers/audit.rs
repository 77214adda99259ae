//! Handlers for the `/audit` resource.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;

use aqualog_db::models::audit::AuditQuery;
use aqualog_db::repositories::AuditLogRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/audit
///
/// Query the audit trail with filtering and pagination. Admin only.
pub async fn query_audit_logs(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(params): Query<AuditQuery>,
) -> AppResult<impl IntoResponse> {
    let page = AuditLogRepo::query(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: page }))
}
