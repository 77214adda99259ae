//! Route definitions for the sample workflow.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::samples;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(samples::list_samples).post(samples::create_sample),
        )
        .route("/{id}", get(samples::get_sample))
        .route("/by-code/{code}", get(samples::get_sample_by_code))
        .route("/{id}/field-results", post(samples::submit_field_results))
        .route("/{id}/lab-results", post(samples::submit_lab_results))
        .route("/{id}/publish", post(samples::publish_sample))
        .route("/{id}/archive", post(samples::archive_sample))
        .route("/{id}/restore", post(samples::restore_sample))
}
