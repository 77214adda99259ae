//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does
//! not meet the minimum requirement. Use these in route handlers to enforce
//! authorization at the type level. Transition-specific gating (which role
//! may move a sample along which edge) lives in
//! `aqualog_core::lifecycle::ensure_actor_allowed`; these extractors cover
//! the blanket cases.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use aqualog_core::error::CoreError;
use aqualog_core::roles::{ROLE_ADMIN, ROLE_ANALYST, ROLE_COLLECTOR};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `admin` role. Rejects with 403 Forbidden otherwise.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_ADMIN {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}

/// Requires `collector` or `admin` role. Rejects with 403 Forbidden otherwise.
pub struct RequireCollector(pub AuthUser);

impl FromRequestParts<AppState> for RequireCollector {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_ADMIN && user.role != ROLE_COLLECTOR {
            return Err(AppError::Core(CoreError::Forbidden(
                "Collector or Admin role required".into(),
            )));
        }
        Ok(RequireCollector(user))
    }
}

/// Requires `analyst` or `admin` role. Rejects with 403 Forbidden otherwise.
pub struct RequireAnalyst(pub AuthUser);

impl FromRequestParts<AppState> for RequireAnalyst {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_ADMIN && user.role != ROLE_ANALYST {
            return Err(AppError::Core(CoreError::Forbidden(
                "Analyst or Admin role required".into(),
            )));
        }
        Ok(RequireAnalyst(user))
    }
}
