//! Route definitions, one module per resource.

pub mod audit;
pub mod auth;
pub mod health;
pub mod parameters;
pub mod samples;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                         login (public)
/// /auth/refresh                       refresh (public)
/// /auth/logout                        logout
///
/// /parameters                         list, create
/// /parameters/{code}                  get, update
/// /parameters/{code}/active           activate / retire (PUT)
///
/// /samples                            list, collect
/// /samples/{id}                       get
/// /samples/{id}/field-results         submit field batch (POST)
/// /samples/{id}/lab-results           submit lab batch (POST)
/// /samples/{id}/publish               publish (POST)
/// /samples/{id}/archive               archive (POST)
/// /samples/{id}/restore               restore (POST)
///
/// /audit                              audit trail query (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/parameters", parameters::router())
        .nest("/samples", samples::router())
        .nest("/audit", audit::router())
}
