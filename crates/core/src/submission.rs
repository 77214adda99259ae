//! Atomic stage measurement batches.
//!
//! A submission covers exactly the active parameter set of one measurement
//! stage. Every value is validated before anything is produced: the result
//! is either a complete new snapshot set plus recomputed overall status, or
//! a [`CoreError::BatchValidation`] carrying every per-parameter issue.
//! Nothing partial ever leaves this module.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{CoreError, ValueIssue};
use crate::evaluator::evaluate;
use crate::lifecycle::{ensure_actor_allowed, LifecycleStage, TransitionTable};
use crate::overall::overall_status;
use crate::parameter::{normalize_code, MeasurementStage, ParameterDefinition};
use crate::snapshot::{merge_snapshots, ParameterSnapshot};
use crate::status::ParamStatus;

/// One submitted measurement: a parameter code and its raw value.
#[derive(Debug, Clone, Deserialize)]
pub struct MeasurementInput {
    pub code: String,
    pub value: Value,
}

/// Result of a successful stage submission.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    /// The full merged snapshot set (earlier stages followed by this one).
    pub snapshots: Vec<ParameterSnapshot>,
    /// Recomputed worst-case verdict over the merged set.
    pub overall_status: Option<ParamStatus>,
    /// The lifecycle stage the sample advances to.
    pub next_stage: LifecycleStage,
}

/// Validate and apply a stage measurement batch.
///
/// `definitions` is the parameter catalog scoped to `stage` (inactive rows
/// are ignored); the batch must cover it exactly — a missing required code,
/// an unknown or out-of-stage code, and a duplicated code are all batch
/// validation errors, and every failing value is reported, not just the
/// first.
pub fn submit_stage_results(
    table: &TransitionTable,
    current: LifecycleStage,
    target: LifecycleStage,
    actor_role: &str,
    stage: MeasurementStage,
    definitions: &[ParameterDefinition],
    existing: &[ParameterSnapshot],
    inputs: &[MeasurementInput],
) -> Result<StageOutcome, CoreError> {
    table.ensure_transition(current, target)?;
    ensure_actor_allowed(actor_role, current, target)?;

    let required: Vec<&ParameterDefinition> = definitions
        .iter()
        .filter(|d| d.is_active && d.stage == stage)
        .collect();

    let mut issues: Vec<ValueIssue> = Vec::new();
    // (definition index, value, status) for each accepted input.
    let mut accepted: Vec<(usize, Value, ParamStatus)> = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    for input in inputs {
        let code = normalize_code(&input.code);
        if seen.contains(&code) {
            issues.push(ValueIssue::new(&code, "submitted more than once"));
            continue;
        }
        seen.push(code.clone());

        match required.iter().position(|d| d.code == code) {
            Some(idx) => match evaluate(required[idx], &input.value) {
                Ok(status) => accepted.push((idx, input.value.clone(), status)),
                Err(CoreError::Validation(msg)) => issues.push(ValueIssue::new(&code, msg)),
                // Configuration problems abort immediately: they cannot be
                // fixed by resubmitting corrected input.
                Err(other) => return Err(other),
            },
            None => {
                issues.push(ValueIssue::new(
                    &code,
                    format!("not part of the {stage} stage parameter set"),
                ));
            }
        }
    }

    for def in &required {
        if !seen.contains(&def.code) {
            issues.push(ValueIssue::new(&def.code, "missing required parameter"));
        }
    }

    if !issues.is_empty() {
        return Err(CoreError::BatchValidation(issues));
    }

    // All values validated; freeze in catalog order so the stored order is
    // deterministic regardless of submission order.
    accepted.sort_by_key(|(idx, _, _)| *idx);
    let mut fresh = Vec::with_capacity(accepted.len());
    for (idx, value, status) in accepted {
        fresh.push(ParameterSnapshot::freeze(required[idx], value, Some(status)));
    }

    let snapshots = merge_snapshots(existing.to_vec(), fresh);
    // The sample-level verdict exists only once the final testing stage has
    // run; after a field-only submission it stays unset.
    let overall = if target.verdict_complete() {
        overall_status(&snapshots)
    } else {
        None
    };

    Ok(StageOutcome {
        snapshots,
        overall_status: overall,
        next_stage: target,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::{EnumEvaluation, EnumMapping, LimitRange, ParameterKind};
    use assert_matches::assert_matches;
    use serde_json::json;

    fn def(
        id: i64,
        code: &str,
        kind: ParameterKind,
        stage: MeasurementStage,
    ) -> ParameterDefinition {
        ParameterDefinition {
            id,
            code: code.to_string(),
            name: code.to_string(),
            unit: "mg/l".to_string(),
            kind,
            stage,
            acceptable_limit: None,
            permissible_limit: None,
            physical_limit: None,
            enum_evaluation: None,
            legacy_max_value: None,
            affects_overall: true,
            is_active: true,
        }
    }

    /// A five-parameter field catalog covering all four kinds.
    fn field_defs() -> Vec<ParameterDefinition> {
        let mut ph = def(1, "PH", ParameterKind::Range, MeasurementStage::Field);
        ph.acceptable_limit = Some(LimitRange::new(Some(6.5), Some(8.5)));
        ph.permissible_limit = Some(LimitRange::new(Some(6.5), Some(9.2)));
        ph.physical_limit = Some(LimitRange::new(Some(0.0), Some(14.0)));

        let mut turbidity = def(2, "TURBIDITY", ParameterKind::Max, MeasurementStage::Field);
        turbidity.acceptable_limit = Some(LimitRange::new(None, Some(1.0)));
        turbidity.permissible_limit = Some(LimitRange::new(None, Some(5.0)));

        let mut tds = def(3, "TDS", ParameterKind::Max, MeasurementStage::Field);
        tds.acceptable_limit = Some(LimitRange::new(None, Some(500.0)));
        tds.permissible_limit = Some(LimitRange::new(None, Some(2000.0)));

        let mut appearance = def(4, "APPEARANCE", ParameterKind::Enum, MeasurementStage::Field);
        appearance.enum_evaluation = Some(EnumEvaluation::new(vec![
            EnumMapping {
                value: "Clear".to_string(),
                status: ParamStatus::Acceptable,
            },
            EnumMapping {
                value: "Turbid".to_string(),
                status: ParamStatus::NotAcceptable,
            },
        ]));

        let mut remarks = def(5, "REMARKS", ParameterKind::Text, MeasurementStage::Field);
        remarks.affects_overall = false;

        vec![ph, turbidity, tds, appearance, remarks]
    }

    fn lab_defs() -> Vec<ParameterDefinition> {
        let mut th = def(6, "TH", ParameterKind::Max, MeasurementStage::Lab);
        th.acceptable_limit = Some(LimitRange::new(None, Some(200.0)));
        th.permissible_limit = Some(LimitRange::new(None, Some(600.0)));

        let mut coliform = def(7, "COLIFORM", ParameterKind::Enum, MeasurementStage::Lab);
        coliform.enum_evaluation = Some(EnumEvaluation::new(vec![
            EnumMapping {
                value: "Absent".to_string(),
                status: ParamStatus::Acceptable,
            },
            EnumMapping {
                value: "Present".to_string(),
                status: ParamStatus::NotAcceptable,
            },
        ]));

        vec![th, coliform]
    }

    fn field_inputs() -> Vec<MeasurementInput> {
        vec![
            MeasurementInput { code: "ph".to_string(), value: json!(7.2) },
            MeasurementInput { code: "TURBIDITY".to_string(), value: json!(0.8) },
            MeasurementInput { code: "TDS".to_string(), value: json!("450") },
            MeasurementInput { code: "APPEARANCE".to_string(), value: json!("clear") },
            MeasurementInput { code: "REMARKS".to_string(), value: json!("hand pump, morning draw") },
        ]
    }

    #[test]
    fn missing_required_parameter_rejects_whole_batch() {
        let table = TransitionTable::standard();
        let mut inputs = field_inputs();
        inputs.pop(); // drop REMARKS

        let err = submit_stage_results(
            &table,
            LifecycleStage::Collected,
            LifecycleStage::FieldTested,
            "collector",
            MeasurementStage::Field,
            &field_defs(),
            &[],
            &inputs,
        )
        .unwrap_err();

        assert_matches!(err, CoreError::BatchValidation(issues) => {
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].parameter, "REMARKS");
            assert!(issues[0].message.contains("missing"));
        });
    }

    #[test]
    fn all_issues_collected_not_just_the_first() {
        let table = TransitionTable::standard();
        let inputs = vec![
            MeasurementInput { code: "PH".to_string(), value: json!("acidic") },
            MeasurementInput { code: "TURBIDITY".to_string(), value: json!(0.5) },
            MeasurementInput { code: "TDS".to_string(), value: Value::Null },
            MeasurementInput { code: "APPEARANCE".to_string(), value: json!("milky") },
            MeasurementInput { code: "REMARKS".to_string(), value: json!("ok") },
            MeasurementInput { code: "NITRATE".to_string(), value: json!(10) },
        ];

        let err = submit_stage_results(
            &table,
            LifecycleStage::Collected,
            LifecycleStage::FieldTested,
            "collector",
            MeasurementStage::Field,
            &field_defs(),
            &[],
            &inputs,
        )
        .unwrap_err();

        assert_matches!(err, CoreError::BatchValidation(issues) => {
            let params: Vec<&str> = issues.iter().map(|i| i.parameter.as_str()).collect();
            assert!(params.contains(&"PH"));        // not a number
            assert!(params.contains(&"TDS"));       // required
            assert!(params.contains(&"APPEARANCE"));// unmapped enum value
            assert!(params.contains(&"NITRATE"));   // not in this stage
            assert_eq!(issues.len(), 4);
        });
    }

    #[test]
    fn duplicate_code_in_batch_rejected() {
        let table = TransitionTable::standard();
        let mut inputs = field_inputs();
        inputs.push(MeasurementInput {
            code: "PH".to_string(),
            value: json!(7.0),
        });

        let err = submit_stage_results(
            &table,
            LifecycleStage::Collected,
            LifecycleStage::FieldTested,
            "collector",
            MeasurementStage::Field,
            &field_defs(),
            &[],
            &inputs,
        )
        .unwrap_err();
        assert_matches!(err, CoreError::BatchValidation(issues) => {
            assert!(issues.iter().any(|i| i.parameter == "PH" && i.message.contains("more than once")));
        });
    }

    #[test]
    fn inactive_definitions_are_not_required() {
        let table = TransitionTable::standard();
        let mut defs = field_defs();
        defs[4].is_active = false; // REMARKS retired
        let mut inputs = field_inputs();
        inputs.pop();

        let outcome = submit_stage_results(
            &table,
            LifecycleStage::Collected,
            LifecycleStage::FieldTested,
            "collector",
            MeasurementStage::Field,
            &defs,
            &[],
            &inputs,
        )
        .unwrap();
        assert_eq!(outcome.snapshots.len(), 4);
    }

    #[test]
    fn illegal_transition_wins_over_value_errors() {
        let table = TransitionTable::standard();
        let err = submit_stage_results(
            &table,
            LifecycleStage::Published,
            LifecycleStage::FieldTested,
            "collector",
            MeasurementStage::Field,
            &field_defs(),
            &[],
            &[],
        )
        .unwrap_err();
        assert_matches!(err, CoreError::State { .. });
    }

    #[test]
    fn wrong_role_is_forbidden() {
        let table = TransitionTable::standard();
        let err = submit_stage_results(
            &table,
            LifecycleStage::Collected,
            LifecycleStage::FieldTested,
            "analyst",
            MeasurementStage::Field,
            &field_defs(),
            &[],
            &field_inputs(),
        )
        .unwrap_err();
        assert_matches!(err, CoreError::Forbidden(_));
    }

    #[test]
    fn snapshots_are_stored_in_catalog_order() {
        let table = TransitionTable::standard();
        let mut inputs = field_inputs();
        inputs.reverse();

        let outcome = submit_stage_results(
            &table,
            LifecycleStage::Collected,
            LifecycleStage::FieldTested,
            "collector",
            MeasurementStage::Field,
            &field_defs(),
            &[],
            &inputs,
        )
        .unwrap();
        let codes: Vec<&str> = outcome.snapshots.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, ["PH", "TURBIDITY", "TDS", "APPEARANCE", "REMARKS"]);
    }

    #[test]
    fn end_to_end_field_then_lab_scenario() {
        let table = TransitionTable::standard();

        // Field stage: all five parameters, all fine.
        let field = submit_stage_results(
            &table,
            LifecycleStage::Collected,
            LifecycleStage::FieldTested,
            "collector",
            MeasurementStage::Field,
            &field_defs(),
            &[],
            &field_inputs(),
        )
        .unwrap();
        assert_eq!(field.next_stage, LifecycleStage::FieldTested);
        assert_eq!(field.snapshots.len(), 5);
        // The verdict waits for the lab results.
        assert_eq!(field.overall_status, None);

        // Lab stage: coliform present — the sample fails.
        let lab_inputs = vec![
            MeasurementInput { code: "TH".to_string(), value: json!(150) },
            MeasurementInput { code: "COLIFORM".to_string(), value: json!("Present") },
        ];
        let lab = submit_stage_results(
            &table,
            field.next_stage,
            LifecycleStage::LabTested,
            "analyst",
            MeasurementStage::Lab,
            &lab_defs(),
            &field.snapshots,
            &lab_inputs,
        )
        .unwrap();

        assert_eq!(lab.next_stage, LifecycleStage::LabTested);
        assert_eq!(lab.snapshots.len(), 7); // field count + lab count
        assert_eq!(lab.overall_status, Some(ParamStatus::NotAcceptable));

        // Earlier stage order is preserved ahead of the lab batch.
        let codes: Vec<&str> = lab.snapshots.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(
            codes,
            ["PH", "TURBIDITY", "TDS", "APPEARANCE", "REMARKS", "TH", "COLIFORM"]
        );
    }

    #[test]
    fn failed_batch_produces_no_outcome_at_all() {
        let table = TransitionTable::standard();
        let existing_before = vec![];
        let result = submit_stage_results(
            &table,
            LifecycleStage::Collected,
            LifecycleStage::FieldTested,
            "collector",
            MeasurementStage::Field,
            &field_defs(),
            &existing_before,
            &[],
        );
        assert!(result.is_err());
        // The caller's prior snapshot set is untouched by construction: the
        // function borrows it and returns nothing on failure.
        assert!(existing_before.is_empty());
    }
}
