//! Route definitions for the parameter registry.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::parameters;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(parameters::list_parameters).post(parameters::create_parameter),
        )
        .route(
            "/{code}",
            get(parameters::get_parameter).put(parameters::update_parameter),
        )
        .route("/{code}/active", put(parameters::set_parameter_active))
}
