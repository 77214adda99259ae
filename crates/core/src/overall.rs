//! Sample-level verdict aggregation.

use crate::snapshot::ParameterSnapshot;
use crate::status::ParamStatus;

/// Reduce a snapshot set to the worst-case sample verdict.
///
/// - Empty input means nothing was measured yet: `None`.
/// - Only snapshots with `affects_overall` and a computed status count; if
///   none qualify, nothing disqualifying was measured: `Acceptable`.
/// - Otherwise any `not_acceptable` wins, then any `permissible`, then
///   `acceptable`.
///
/// Deterministic, order-independent, and idempotent; recompute it whenever
/// the snapshot set changes.
pub fn overall_status(snapshots: &[ParameterSnapshot]) -> Option<ParamStatus> {
    if snapshots.is_empty() {
        return None;
    }

    let worst = snapshots
        .iter()
        .filter(|s| s.affects_overall)
        .filter_map(|s| s.status)
        .max_by_key(|status| status.severity());

    Some(worst.unwrap_or(ParamStatus::Acceptable))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::{MeasurementStage, ParameterKind};
    use serde_json::json;

    fn snap(code: &str, status: Option<ParamStatus>, affects_overall: bool) -> ParameterSnapshot {
        ParameterSnapshot {
            definition_id: 1,
            code: code.to_string(),
            name: code.to_string(),
            unit: "".to_string(),
            kind: ParameterKind::Max,
            stage: MeasurementStage::Lab,
            acceptable_limit: None,
            permissible_limit: None,
            physical_limit: None,
            enum_evaluation: None,
            affects_overall,
            value: json!(1.0),
            status,
        }
    }

    #[test]
    fn empty_set_is_none() {
        assert_eq!(overall_status(&[]), None);
    }

    #[test]
    fn single_acceptable() {
        let snaps = [snap("PH", Some(ParamStatus::Acceptable), true)];
        assert_eq!(overall_status(&snaps), Some(ParamStatus::Acceptable));
    }

    #[test]
    fn permissible_outranks_acceptable() {
        let snaps = [
            snap("PH", Some(ParamStatus::Acceptable), true),
            snap("TDS", Some(ParamStatus::Permissible), true),
        ];
        assert_eq!(overall_status(&snaps), Some(ParamStatus::Permissible));
    }

    #[test]
    fn any_not_acceptable_dominates() {
        let snaps = [
            snap("PH", Some(ParamStatus::Acceptable), true),
            snap("TDS", Some(ParamStatus::Acceptable), true),
            snap("COLIFORM", Some(ParamStatus::NotAcceptable), true),
            snap("TH", Some(ParamStatus::Acceptable), true),
        ];
        assert_eq!(overall_status(&snaps), Some(ParamStatus::NotAcceptable));
    }

    #[test]
    fn result_is_order_independent() {
        let mut snaps = vec![
            snap("A", Some(ParamStatus::NotAcceptable), true),
            snap("B", Some(ParamStatus::Permissible), true),
            snap("C", Some(ParamStatus::Acceptable), true),
        ];
        let forward = overall_status(&snaps);
        snaps.reverse();
        assert_eq!(forward, overall_status(&snaps));
    }

    #[test]
    fn informational_snapshots_do_not_count() {
        // A bad verdict on a non-affecting parameter is ignored.
        let snaps = [
            snap("REMARKS", Some(ParamStatus::NotAcceptable), false),
            snap("PH", Some(ParamStatus::Acceptable), true),
        ];
        assert_eq!(overall_status(&snaps), Some(ParamStatus::Acceptable));
    }

    #[test]
    fn only_unscored_or_informational_means_acceptable() {
        let snaps = [
            snap("REMARKS", Some(ParamStatus::NotAcceptable), false),
            snap("PH", None, true),
        ];
        assert_eq!(overall_status(&snaps), Some(ParamStatus::Acceptable));
    }

    #[test]
    fn recomputation_is_idempotent() {
        let snaps = [
            snap("PH", Some(ParamStatus::Permissible), true),
            snap("TDS", Some(ParamStatus::Acceptable), true),
        ];
        let first = overall_status(&snaps);
        assert_eq!(first, overall_status(&snaps));
        assert_eq!(first, Some(ParamStatus::Permissible));
    }
}
