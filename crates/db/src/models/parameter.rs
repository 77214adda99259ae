//! Parameter definition entity model and DTOs.
//!
//! Limit pairs are stored as flat nullable numeric columns; the conversion
//! to the core domain type folds each pair into a `LimitRange`.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use aqualog_core::error::CoreError;
use aqualog_core::parameter::{
    EnumEvaluation, LimitRange, MeasurementStage, ParameterDefinition, ParameterKind,
};
use aqualog_core::types::{DbId, Timestamp};

/// A row from the `parameter_definitions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ParameterDefinitionRow {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub unit: String,
    pub kind: String,
    pub stage: String,
    pub acceptable_min: Option<f64>,
    pub acceptable_max: Option<f64>,
    pub permissible_min: Option<f64>,
    pub permissible_max: Option<f64>,
    pub physical_min: Option<f64>,
    pub physical_max: Option<f64>,
    pub enum_evaluation: Option<Json<EnumEvaluation>>,
    pub legacy_max_value: Option<f64>,
    pub affects_overall: bool,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fold a nullable column pair into an optional limit range.
fn limit(min: Option<f64>, max: Option<f64>) -> Option<LimitRange> {
    if min.is_none() && max.is_none() {
        None
    } else {
        Some(LimitRange::new(min, max))
    }
}

impl ParameterDefinitionRow {
    /// Convert the row into the core domain type.
    ///
    /// Fails with a [`CoreError::Configuration`] if the stored kind or
    /// stage string is unknown (schema CHECK constraints should prevent
    /// this; a failure means the row predates the current vocabulary).
    pub fn to_domain(&self) -> Result<ParameterDefinition, CoreError> {
        let kind = ParameterKind::parse(&self.kind).ok_or_else(|| {
            CoreError::Configuration(format!(
                "parameter '{}' has unknown kind '{}'",
                self.code, self.kind
            ))
        })?;
        let stage = MeasurementStage::parse(&self.stage).ok_or_else(|| {
            CoreError::Configuration(format!(
                "parameter '{}' has unknown stage '{}'",
                self.code, self.stage
            ))
        })?;

        Ok(ParameterDefinition {
            id: self.id,
            code: self.code.clone(),
            name: self.name.clone(),
            unit: self.unit.clone(),
            kind,
            stage,
            acceptable_limit: limit(self.acceptable_min, self.acceptable_max),
            permissible_limit: limit(self.permissible_min, self.permissible_max),
            physical_limit: limit(self.physical_min, self.physical_max),
            enum_evaluation: self.enum_evaluation.as_ref().map(|j| j.0.clone()),
            legacy_max_value: self.legacy_max_value,
            affects_overall: self.affects_overall,
            is_active: self.is_active,
        })
    }
}

/// DTO for creating a new parameter definition.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateParameterDefinition {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub unit: String,
    pub kind: String,
    pub stage: String,
    pub acceptable_min: Option<f64>,
    pub acceptable_max: Option<f64>,
    pub permissible_min: Option<f64>,
    pub permissible_max: Option<f64>,
    pub physical_min: Option<f64>,
    pub physical_max: Option<f64>,
    pub enum_evaluation: Option<EnumEvaluation>,
    pub legacy_max_value: Option<f64>,
    /// Defaults to `true` for non-text kinds at the API layer.
    pub affects_overall: Option<bool>,
}

/// DTO for updating an existing parameter definition.
///
/// All fields are optional; `kind` and `stage` are deliberately absent —
/// a definition's kind never changes once snapshots reference it.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateParameterDefinition {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub acceptable_min: Option<f64>,
    pub acceptable_max: Option<f64>,
    pub permissible_min: Option<f64>,
    pub permissible_max: Option<f64>,
    pub physical_min: Option<f64>,
    pub physical_max: Option<f64>,
    pub enum_evaluation: Option<EnumEvaluation>,
    pub legacy_max_value: Option<f64>,
    pub affects_overall: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqualog_core::parameter::EnumMapping;
    use aqualog_core::status::ParamStatus;

    fn row() -> ParameterDefinitionRow {
        ParameterDefinitionRow {
            id: 1,
            code: "PH".to_string(),
            name: "pH".to_string(),
            unit: "".to_string(),
            kind: "range".to_string(),
            stage: "field".to_string(),
            acceptable_min: Some(6.5),
            acceptable_max: Some(8.5),
            permissible_min: Some(6.5),
            permissible_max: Some(9.2),
            physical_min: Some(0.0),
            physical_max: Some(14.0),
            enum_evaluation: None,
            legacy_max_value: None,
            affects_overall: true,
            is_active: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn row_converts_to_domain() {
        let def = row().to_domain().unwrap();
        assert_eq!(def.kind, ParameterKind::Range);
        assert_eq!(def.stage, MeasurementStage::Field);
        assert_eq!(def.acceptable_limit, Some(LimitRange::new(Some(6.5), Some(8.5))));
    }

    #[test]
    fn absent_column_pair_folds_to_none() {
        let mut r = row();
        r.physical_min = None;
        r.physical_max = None;
        let def = r.to_domain().unwrap();
        assert_eq!(def.physical_limit, None);
    }

    #[test]
    fn half_open_pair_is_preserved() {
        let mut r = row();
        r.acceptable_min = None;
        let def = r.to_domain().unwrap();
        assert_eq!(def.acceptable_limit, Some(LimitRange::new(None, Some(8.5))));
    }

    #[test]
    fn unknown_kind_is_configuration_error() {
        let mut r = row();
        r.kind = "ratio".to_string();
        assert!(matches!(r.to_domain(), Err(CoreError::Configuration(_))));
    }

    #[test]
    fn enum_mapping_column_carries_through() {
        let mut r = row();
        r.kind = "enum".to_string();
        r.enum_evaluation = Some(Json(EnumEvaluation::new(vec![EnumMapping {
            value: "Clear".to_string(),
            status: ParamStatus::Acceptable,
        }])));
        let def = r.to_domain().unwrap();
        assert_eq!(
            def.enum_evaluation.unwrap().lookup("clear"),
            Some(ParamStatus::Acceptable)
        );
    }
}
