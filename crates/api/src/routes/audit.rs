//! Route definitions for the audit trail.

use axum::routing::get;
use axum::Router;

use crate::handlers::audit;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(audit::query_audit_logs))
}
