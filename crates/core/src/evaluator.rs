//! Single-value evaluation: validate a raw measured value against its
//! parameter definition and compute the verdict.
//!
//! Validation runs in a strict order and short-circuits on the first
//! failure for that value; later steps assume the earlier ones passed.
//! Batch-level error collection happens in [`crate::submission`].

use serde_json::Value;

use crate::error::CoreError;
use crate::parameter::{
    resolve_acceptable_max, resolve_permissible_max, ParameterDefinition, ParameterKind,
    MAX_TEXT_VALUE_LENGTH,
};
use crate::status::ParamStatus;

/// Evaluate one raw value against its definition.
///
/// Returns the computed verdict, or a [`CoreError::Validation`] /
/// [`CoreError::Configuration`] describing why the value cannot be scored.
pub fn evaluate(def: &ParameterDefinition, raw: &Value) -> Result<ParamStatus, CoreError> {
    // 1. Required: null and empty-string values are rejected for every kind.
    if is_missing(raw) {
        return Err(CoreError::Validation("a value is required".to_string()));
    }

    match def.kind {
        ParameterKind::Range | ParameterKind::Max => {
            // 2. Numeric parse, then physical sanity bounds.
            let value = parse_numeric(raw)?;
            if let Some(physical) = &def.physical_limit {
                if !physical.contains(value) {
                    return Err(CoreError::Validation(format!(
                        "{value} is outside the physical bounds {}",
                        describe_bounds(physical.min, physical.max)
                    )));
                }
            }
            Ok(match def.kind {
                ParameterKind::Range => score_range(def, value),
                _ => score_max(def, value),
            })
        }
        ParameterKind::Enum => {
            // 3. A missing mapping is a data-setup problem, never a pass.
            let mapping = def
                .enum_evaluation
                .as_ref()
                .filter(|m| !m.is_empty())
                .ok_or_else(|| {
                    CoreError::Configuration(format!(
                        "enum parameter '{}' has no verdict mapping configured",
                        def.code
                    ))
                })?;
            let text = coerce_text(raw)?;
            mapping.lookup(&text).ok_or_else(|| {
                CoreError::Validation(format!("'{}' is not an accepted value", text.trim()))
            })
        }
        ParameterKind::Text => {
            // 4. Informational text, bounded length.
            let text = coerce_text(raw)?;
            if text.chars().count() > MAX_TEXT_VALUE_LENGTH {
                return Err(CoreError::Validation(format!(
                    "text exceeds the maximum length of {MAX_TEXT_VALUE_LENGTH} characters"
                )));
            }
            Ok(ParamStatus::Acceptable)
        }
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Score a `range` value. The acceptable window only applies when both of
/// its bounds are configured; the permissible window honors open sides.
fn score_range(def: &ParameterDefinition, value: f64) -> ParamStatus {
    if let Some(acceptable) = &def.acceptable_limit {
        if acceptable.is_closed() && acceptable.contains(value) {
            return ParamStatus::Acceptable;
        }
    }
    if let Some(permissible) = &def.permissible_limit {
        if permissible.contains(value) {
            return ParamStatus::Permissible;
        }
    }
    ParamStatus::NotAcceptable
}

/// Score a `max` value against the resolved acceptable/permissible bounds.
///
/// A parameter with no configured upper bound at all is effectively
/// unconstrained and scores `acceptable`.
fn score_max(def: &ParameterDefinition, value: f64) -> ParamStatus {
    let Some(acceptable_max) = resolve_acceptable_max(def) else {
        return ParamStatus::Acceptable;
    };
    if value <= acceptable_max {
        return ParamStatus::Acceptable;
    }
    match resolve_permissible_max(def) {
        Some(permissible_max) if value <= permissible_max => ParamStatus::Permissible,
        _ => ParamStatus::NotAcceptable,
    }
}

// ---------------------------------------------------------------------------
// Input coercion
// ---------------------------------------------------------------------------

/// Whether the raw input counts as absent: JSON null or a blank string.
fn is_missing(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Parse a JSON number or numeric string as f64.
fn parse_numeric(raw: &Value) -> Result<f64, CoreError> {
    match raw {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| CoreError::Validation(format!("'{n}' is not a finite number"))),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            CoreError::Validation(format!("'{}' is not a number", s.trim()))
        }),
        other => Err(CoreError::Validation(format!(
            "expected a number, got {}",
            json_type_name(other)
        ))),
    }
}

/// Coerce a JSON string or number into text; other shapes are rejected.
fn coerce_text(raw: &Value) -> Result<String, CoreError> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(CoreError::Validation(format!(
            "expected text, got {}",
            json_type_name(other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn describe_bounds(min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("{min}..{max}"),
        (Some(min), None) => format!("{min}.."),
        (None, Some(max)) => format!("..{max}"),
        (None, None) => "..".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::{EnumEvaluation, EnumMapping, LimitRange, MeasurementStage};
    use assert_matches::assert_matches;
    use serde_json::json;

    fn def(kind: ParameterKind) -> ParameterDefinition {
        ParameterDefinition {
            id: 1,
            code: "PH".to_string(),
            name: "pH".to_string(),
            unit: "".to_string(),
            kind,
            stage: MeasurementStage::Field,
            acceptable_limit: None,
            permissible_limit: None,
            physical_limit: None,
            enum_evaluation: None,
            legacy_max_value: None,
            affects_overall: true,
            is_active: true,
        }
    }

    fn ph_def() -> ParameterDefinition {
        let mut d = def(ParameterKind::Range);
        d.acceptable_limit = Some(LimitRange::new(Some(6.5), Some(8.5)));
        d.permissible_limit = Some(LimitRange::new(Some(6.5), Some(9.2)));
        d.physical_limit = Some(LimitRange::new(Some(0.0), Some(14.0)));
        d
    }

    // -- validation order -----------------------------------------------------

    #[test]
    fn null_and_empty_values_rejected_first() {
        assert_matches!(evaluate(&ph_def(), &Value::Null), Err(CoreError::Validation(_)));
        assert_matches!(evaluate(&ph_def(), &json!("")), Err(CoreError::Validation(_)));
        assert_matches!(evaluate(&ph_def(), &json!("   ")), Err(CoreError::Validation(_)));
    }

    #[test]
    fn non_numeric_rejected_for_numeric_kinds() {
        let err = evaluate(&ph_def(), &json!("neutral")).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("not a number"));
        assert_matches!(
            evaluate(&ph_def(), &json!(true)),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn numeric_string_parses() {
        assert_eq!(evaluate(&ph_def(), &json!(" 7.2 ")).unwrap(), ParamStatus::Acceptable);
    }

    #[test]
    fn physical_bounds_are_validation_not_verdict() {
        let err = evaluate(&ph_def(), &json!(15.0)).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("physical bounds"));
        // Just inside the physical window still scores (as not_acceptable).
        assert_eq!(
            evaluate(&ph_def(), &json!(14.0)).unwrap(),
            ParamStatus::NotAcceptable
        );
    }

    // -- range scoring --------------------------------------------------------

    #[test]
    fn range_bounds_are_inclusive() {
        let d = ph_def();
        assert_eq!(evaluate(&d, &json!(6.5)).unwrap(), ParamStatus::Acceptable);
        assert_eq!(evaluate(&d, &json!(8.5)).unwrap(), ParamStatus::Acceptable);
        assert_eq!(evaluate(&d, &json!(9.2)).unwrap(), ParamStatus::Permissible);
        assert_eq!(evaluate(&d, &json!(9.3)).unwrap(), ParamStatus::NotAcceptable);
    }

    #[test]
    fn range_skips_open_acceptable_window() {
        let mut d = ph_def();
        // Only one acceptable bound set: the acceptable check is skipped.
        d.acceptable_limit = Some(LimitRange::new(Some(6.5), None));
        assert_eq!(evaluate(&d, &json!(7.0)).unwrap(), ParamStatus::Permissible);
    }

    #[test]
    fn range_without_any_window_is_not_acceptable() {
        let mut d = ph_def();
        d.acceptable_limit = None;
        d.permissible_limit = None;
        d.physical_limit = None;
        assert_eq!(evaluate(&d, &json!(7.0)).unwrap(), ParamStatus::NotAcceptable);
    }

    // -- max scoring ----------------------------------------------------------

    fn turbidity_def() -> ParameterDefinition {
        let mut d = def(ParameterKind::Max);
        d.code = "TURBIDITY".to_string();
        d.acceptable_limit = Some(LimitRange::new(None, Some(1.0)));
        d.permissible_limit = Some(LimitRange::new(None, Some(5.0)));
        d
    }

    #[test]
    fn max_at_bound_is_acceptable() {
        assert_eq!(
            evaluate(&turbidity_def(), &json!(1.0)).unwrap(),
            ParamStatus::Acceptable
        );
    }

    #[test]
    fn max_between_bounds_is_permissible() {
        assert_eq!(
            evaluate(&turbidity_def(), &json!(3.0)).unwrap(),
            ParamStatus::Permissible
        );
        assert_eq!(
            evaluate(&turbidity_def(), &json!(5.0)).unwrap(),
            ParamStatus::Permissible
        );
    }

    #[test]
    fn max_above_permissible_is_not_acceptable() {
        assert_eq!(
            evaluate(&turbidity_def(), &json!(5.1)).unwrap(),
            ParamStatus::NotAcceptable
        );
    }

    #[test]
    fn max_without_permissible_bound_fails_hard() {
        let mut d = turbidity_def();
        d.permissible_limit = None;
        assert_eq!(evaluate(&d, &json!(1.0)).unwrap(), ParamStatus::Acceptable);
        assert_eq!(
            evaluate(&d, &json!(1.001)).unwrap(),
            ParamStatus::NotAcceptable
        );
    }

    #[test]
    fn max_falls_back_to_legacy_value() {
        let mut d = def(ParameterKind::Max);
        d.legacy_max_value = Some(0.3);
        assert_eq!(evaluate(&d, &json!(0.3)).unwrap(), ParamStatus::Acceptable);
        assert_eq!(evaluate(&d, &json!(0.4)).unwrap(), ParamStatus::NotAcceptable);
    }

    #[test]
    fn unconstrained_max_is_acceptable() {
        let d = def(ParameterKind::Max);
        assert_eq!(
            evaluate(&d, &json!(99999.0)).unwrap(),
            ParamStatus::Acceptable
        );
    }

    // -- enum scoring ---------------------------------------------------------

    fn appearance_def() -> ParameterDefinition {
        let mut d = def(ParameterKind::Enum);
        d.code = "APPEARANCE".to_string();
        d.enum_evaluation = Some(EnumEvaluation::new(vec![
            EnumMapping {
                value: "Clear".to_string(),
                status: ParamStatus::Acceptable,
            },
            EnumMapping {
                value: "Slightly Turbid".to_string(),
                status: ParamStatus::Permissible,
            },
            EnumMapping {
                value: "Turbid".to_string(),
                status: ParamStatus::NotAcceptable,
            },
        ]));
        d
    }

    #[test]
    fn enum_lookup_is_case_insensitive() {
        assert_eq!(
            evaluate(&appearance_def(), &json!("clear")).unwrap(),
            ParamStatus::Acceptable
        );
        assert_eq!(
            evaluate(&appearance_def(), &json!("SLIGHTLY TURBID")).unwrap(),
            ParamStatus::Permissible
        );
    }

    #[test]
    fn unmapped_enum_value_is_validation_error_not_default() {
        let err = evaluate(&appearance_def(), &json!("milky")).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("not an accepted value"));
    }

    #[test]
    fn enum_without_mapping_is_configuration_error() {
        let mut d = appearance_def();
        d.enum_evaluation = None;
        assert_matches!(
            evaluate(&d, &json!("clear")),
            Err(CoreError::Configuration(_))
        );

        d.enum_evaluation = Some(EnumEvaluation::default());
        assert_matches!(
            evaluate(&d, &json!("clear")),
            Err(CoreError::Configuration(_))
        );
    }

    // -- text scoring ---------------------------------------------------------

    #[test]
    fn text_is_always_acceptable() {
        let d = def(ParameterKind::Text);
        assert_eq!(
            evaluate(&d, &json!("slight chlorine smell")).unwrap(),
            ParamStatus::Acceptable
        );
        // Numbers coerce to text.
        assert_eq!(evaluate(&d, &json!(42)).unwrap(), ParamStatus::Acceptable);
    }

    #[test]
    fn overlong_text_rejected() {
        let d = def(ParameterKind::Text);
        let long = "x".repeat(MAX_TEXT_VALUE_LENGTH + 1);
        let err = evaluate(&d, &json!(long)).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("maximum length"));

        let at_limit = "y".repeat(MAX_TEXT_VALUE_LENGTH);
        assert!(evaluate(&d, &json!(at_limit)).is_ok());
    }
}
