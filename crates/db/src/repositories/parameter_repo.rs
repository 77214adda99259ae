//! Repository for the `parameter_definitions` table.

use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::parameter::{
    CreateParameterDefinition, ParameterDefinitionRow, UpdateParameterDefinition,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "\
    id, code, name, unit, kind, stage, \
    acceptable_min, acceptable_max, permissible_min, permissible_max, \
    physical_min, physical_max, enum_evaluation, legacy_max_value, \
    affects_overall, is_active, created_at, updated_at";

/// Provides CRUD operations for parameter definitions.
pub struct ParameterRepo;

impl ParameterRepo {
    /// Insert a new definition, returning the created row.
    ///
    /// The caller is responsible for normalizing and validating the input
    /// (see `aqualog_core::parameter`); `code` must already be uppercase.
    pub async fn create(
        pool: &PgPool,
        input: &CreateParameterDefinition,
        affects_overall: bool,
    ) -> Result<ParameterDefinitionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO parameter_definitions \
                (code, name, unit, kind, stage, \
                 acceptable_min, acceptable_max, permissible_min, permissible_max, \
                 physical_min, physical_max, enum_evaluation, legacy_max_value, \
                 affects_overall) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ParameterDefinitionRow>(&query)
            .bind(&input.code)
            .bind(&input.name)
            .bind(&input.unit)
            .bind(&input.kind)
            .bind(&input.stage)
            .bind(input.acceptable_min)
            .bind(input.acceptable_max)
            .bind(input.permissible_min)
            .bind(input.permissible_max)
            .bind(input.physical_min)
            .bind(input.physical_max)
            .bind(input.enum_evaluation.clone().map(Json))
            .bind(input.legacy_max_value)
            .bind(affects_overall)
            .fetch_one(pool)
            .await
    }

    /// Find a definition by its uppercase code.
    pub async fn find_by_code(
        pool: &PgPool,
        code: &str,
    ) -> Result<Option<ParameterDefinitionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM parameter_definitions WHERE code = $1");
        sqlx::query_as::<_, ParameterDefinitionRow>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    /// List definitions in catalog order (stage, then id).
    pub async fn list(
        pool: &PgPool,
        active_only: bool,
    ) -> Result<Vec<ParameterDefinitionRow>, sqlx::Error> {
        let query = if active_only {
            format!(
                "SELECT {COLUMNS} FROM parameter_definitions WHERE is_active ORDER BY stage, id"
            )
        } else {
            format!("SELECT {COLUMNS} FROM parameter_definitions ORDER BY stage, id")
        };
        sqlx::query_as::<_, ParameterDefinitionRow>(&query)
            .fetch_all(pool)
            .await
    }

    /// List definitions scoped to one measurement stage, in catalog order.
    pub async fn list_by_stage(
        pool: &PgPool,
        stage: &str,
        active_only: bool,
    ) -> Result<Vec<ParameterDefinitionRow>, sqlx::Error> {
        let query = if active_only {
            format!(
                "SELECT {COLUMNS} FROM parameter_definitions \
                 WHERE stage = $1 AND is_active ORDER BY id"
            )
        } else {
            format!("SELECT {COLUMNS} FROM parameter_definitions WHERE stage = $1 ORDER BY id")
        };
        sqlx::query_as::<_, ParameterDefinitionRow>(&query)
            .bind(stage)
            .fetch_all(pool)
            .await
    }

    /// Update a definition by code. Only non-`None` fields are applied;
    /// `kind` and `stage` are immutable by design.
    ///
    /// Returns `None` if no definition with the given code exists.
    pub async fn update(
        pool: &PgPool,
        code: &str,
        input: &UpdateParameterDefinition,
    ) -> Result<Option<ParameterDefinitionRow>, sqlx::Error> {
        let query = format!(
            "UPDATE parameter_definitions SET \
                name = COALESCE($2, name), \
                unit = COALESCE($3, unit), \
                acceptable_min = COALESCE($4, acceptable_min), \
                acceptable_max = COALESCE($5, acceptable_max), \
                permissible_min = COALESCE($6, permissible_min), \
                permissible_max = COALESCE($7, permissible_max), \
                physical_min = COALESCE($8, physical_min), \
                physical_max = COALESCE($9, physical_max), \
                enum_evaluation = COALESCE($10, enum_evaluation), \
                legacy_max_value = COALESCE($11, legacy_max_value), \
                affects_overall = COALESCE($12, affects_overall), \
                updated_at = NOW() \
             WHERE code = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ParameterDefinitionRow>(&query)
            .bind(code)
            .bind(&input.name)
            .bind(&input.unit)
            .bind(input.acceptable_min)
            .bind(input.acceptable_max)
            .bind(input.permissible_min)
            .bind(input.permissible_max)
            .bind(input.physical_min)
            .bind(input.physical_max)
            .bind(input.enum_evaluation.clone().map(Json))
            .bind(input.legacy_max_value)
            .bind(input.affects_overall)
            .fetch_optional(pool)
            .await
    }

    /// Toggle the active flag. Existing snapshots are unaffected — they
    /// carry their own frozen copy of the definition.
    pub async fn set_active(
        pool: &PgPool,
        code: &str,
        is_active: bool,
    ) -> Result<Option<ParameterDefinitionRow>, sqlx::Error> {
        let query = format!(
            "UPDATE parameter_definitions SET is_active = $2, updated_at = NOW() \
             WHERE code = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ParameterDefinitionRow>(&query)
            .bind(code)
            .bind(is_active)
            .fetch_optional(pool)
            .await
    }

}
