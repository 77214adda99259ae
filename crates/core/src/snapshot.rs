//! Immutable parameter snapshots.
//!
//! A snapshot combines a measured value, its computed verdict, and a frozen
//! copy of the definition content (limits, mapping, flags) at measurement
//! time. Editing or deactivating the source definition later never changes
//! a stored snapshot; historical results stay graded against the standard
//! that was in force when the measurement was taken.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::parameter::{
    EnumEvaluation, LimitRange, MeasurementStage, ParameterDefinition, ParameterKind,
};
use crate::status::ParamStatus;
use crate::types::DbId;

/// Frozen record of one measured parameter inside a sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    /// Originating definition row, kept for traceability only; none of the
    /// fields below follow it after creation.
    pub definition_id: DbId,
    pub code: String,
    pub name: String,
    pub unit: String,
    pub kind: ParameterKind,
    pub stage: MeasurementStage,
    pub acceptable_limit: Option<LimitRange>,
    pub permissible_limit: Option<LimitRange>,
    pub physical_limit: Option<LimitRange>,
    pub enum_evaluation: Option<EnumEvaluation>,
    pub affects_overall: bool,
    /// The raw measured input. Required; never null.
    pub value: Value,
    /// Computed verdict, or `None` when the snapshot was taken before
    /// scoring (e.g. a recorded-but-not-yet-evaluated field value).
    pub status: Option<ParamStatus>,
}

impl ParameterSnapshot {
    /// Freeze a definition together with a measured value and verdict.
    ///
    /// Every limit and mapping field is copied by value; the snapshot holds
    /// no reference back to the mutable definition.
    pub fn freeze(def: &ParameterDefinition, value: Value, status: Option<ParamStatus>) -> Self {
        Self {
            definition_id: def.id,
            code: def.code.clone(),
            name: def.name.clone(),
            unit: def.unit.clone(),
            kind: def.kind,
            stage: def.stage,
            acceptable_limit: def.acceptable_limit,
            permissible_limit: def.permissible_limit,
            physical_limit: def.physical_limit,
            enum_evaluation: def.enum_evaluation.clone(),
            affects_overall: def.affects_overall,
            value,
            status,
        }
    }
}

/// Merge a new stage's snapshots into a sample's existing set.
///
/// Entries from `existing` whose code reappears in `incoming` are dropped
/// (the new batch replaces them); everything else keeps its original
/// insertion order, followed by the incoming batch in its own order. The
/// result never contains two entries for the same code.
pub fn merge_snapshots(
    existing: Vec<ParameterSnapshot>,
    incoming: Vec<ParameterSnapshot>,
) -> Vec<ParameterSnapshot> {
    let mut merged: Vec<ParameterSnapshot> = existing
        .into_iter()
        .filter(|old| !incoming.iter().any(|new| new.code == old.code))
        .collect();
    merged.extend(incoming);
    merged
}
