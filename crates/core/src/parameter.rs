//! The measurable-parameter catalog model.
//!
//! A [`ParameterDefinition`] describes one water-quality characteristic:
//! how it is measured (kind + stage), the regulatory limits it is graded
//! against, and whether it participates in the sample-level verdict.
//! Definitions are mutable registry rows; at measurement time their content
//! is frozen into snapshots (see [`crate::snapshot`]) so later edits never
//! alter historical results.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::ParamStatus;
use crate::types::DbId;

/// Maximum accepted length for a TEXT parameter value, in characters.
pub const MAX_TEXT_VALUE_LENGTH: usize = 500;

// ---------------------------------------------------------------------------
// Kind and stage
// ---------------------------------------------------------------------------

/// Evaluation algorithm a parameter is graded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Graded against closed `[min, max]` windows.
    Range,
    /// Graded against an upper bound only.
    Max,
    /// Graded by matching the value against a configured verdict mapping.
    Enum,
    /// Free text, informational only.
    Text,
}

impl ParameterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterKind::Range => "range",
            ParameterKind::Max => "max",
            ParameterKind::Enum => "enum",
            ParameterKind::Text => "text",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "range" => Some(ParameterKind::Range),
            "max" => Some(ParameterKind::Max),
            "enum" => Some(ParameterKind::Enum),
            "text" => Some(ParameterKind::Text),
            _ => None,
        }
    }

    /// Whether values of this kind are parsed as floating-point numbers.
    pub fn is_numeric(self) -> bool {
        matches!(self, ParameterKind::Range | ParameterKind::Max)
    }
}

/// Collection phase a parameter is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementStage {
    /// Measured on-site at collection time.
    Field,
    /// Measured in the laboratory.
    Lab,
}

impl MeasurementStage {
    pub fn as_str(self) -> &'static str {
        match self {
            MeasurementStage::Field => "field",
            MeasurementStage::Lab => "lab",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "field" => Some(MeasurementStage::Field),
            "lab" => Some(MeasurementStage::Lab),
            _ => None,
        }
    }
}

impl std::fmt::Display for MeasurementStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// An inclusive numeric window. Either bound may be absent (unbounded side).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimitRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl LimitRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// Inclusive containment check; an absent bound never excludes.
    pub fn contains(&self, value: f64) -> bool {
        if let Some(min) = self.min {
            if value < min {
                return false;
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return false;
            }
        }
        true
    }

    /// Whether both bounds are present (a closed window).
    pub fn is_closed(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }
}

// ---------------------------------------------------------------------------
// Enum evaluation mapping
// ---------------------------------------------------------------------------

/// One accepted textual value and the verdict it maps to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumMapping {
    pub value: String,
    pub status: ParamStatus,
}

/// Ordered association list from accepted textual value to verdict.
///
/// Lookup trims the input and compares case-insensitively; the first match
/// wins. An explicit list is used instead of a map type so the lookup
/// semantics are defined here, not by a map implementation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnumEvaluation(pub Vec<EnumMapping>);

impl EnumEvaluation {
    pub fn new(entries: Vec<EnumMapping>) -> Self {
        Self(entries)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Case-insensitive lookup of a raw textual value.
    pub fn lookup(&self, raw: &str) -> Option<ParamStatus> {
        let needle = raw.trim();
        self.0
            .iter()
            .find(|entry| entry.value.trim().eq_ignore_ascii_case(needle))
            .map(|entry| entry.status)
    }
}

// ---------------------------------------------------------------------------
// Parameter definition
// ---------------------------------------------------------------------------

/// One row of the measurable-parameter catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub id: DbId,
    /// Unique uppercase identifier, e.g. `"PH"`, `"TDS"`.
    pub code: String,
    pub name: String,
    pub unit: String,
    pub kind: ParameterKind,
    pub stage: MeasurementStage,
    /// Window for an `acceptable` verdict.
    pub acceptable_limit: Option<LimitRange>,
    /// Relaxed window for a `permissible` verdict.
    pub permissible_limit: Option<LimitRange>,
    /// Hard sanity bounds; violating these is a validation error, not a
    /// quality verdict.
    pub physical_limit: Option<LimitRange>,
    /// Verdict mapping, required for `enum` kind.
    pub enum_evaluation: Option<EnumEvaluation>,
    /// Pre-structured-limits upper bound, still honored as a fallback for
    /// `max` kind when `acceptable_limit.max` is unset.
    pub legacy_max_value: Option<f64>,
    /// Whether this parameter participates in the sample-level verdict.
    pub affects_overall: bool,
    /// Inactive definitions cannot be used for new snapshots.
    pub is_active: bool,
}

/// Normalize a parameter code: trimmed and uppercased.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Resolve the effective acceptable upper bound for a `max` parameter.
///
/// Prefers the structured `acceptable_limit.max`, falling back to the
/// legacy single max value.
pub fn resolve_acceptable_max(def: &ParameterDefinition) -> Option<f64> {
    def.acceptable_limit
        .as_ref()
        .and_then(|l| l.max)
        .or(def.legacy_max_value)
}

/// Resolve the effective permissible upper bound for a `max` parameter.
pub fn resolve_permissible_max(def: &ParameterDefinition) -> Option<f64> {
    def.permissible_limit.as_ref().and_then(|l| l.max)
}

/// Validate a definition's internal consistency before it is stored.
///
/// Checks the kind/limit combinations that would make evaluation
/// nonsensical; plain field-shape validation happens at the API edge.
pub fn validate_definition(def: &ParameterDefinition) -> Result<(), CoreError> {
    if def.code.trim().is_empty() {
        return Err(CoreError::Validation(
            "Parameter code must not be empty".to_string(),
        ));
    }
    if def.code != normalize_code(&def.code) {
        return Err(CoreError::Validation(format!(
            "Parameter code '{}' must be uppercase with no surrounding whitespace",
            def.code
        )));
    }
    if def.name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Parameter name must not be empty".to_string(),
        ));
    }

    for (label, limit) in [
        ("acceptable_limit", &def.acceptable_limit),
        ("permissible_limit", &def.permissible_limit),
        ("physical_limit", &def.physical_limit),
    ] {
        if let Some(range) = limit {
            if let (Some(min), Some(max)) = (range.min, range.max) {
                if min > max {
                    return Err(CoreError::Validation(format!(
                        "{label} for '{}' has min {min} greater than max {max}",
                        def.code
                    )));
                }
            }
        }
    }

    match def.kind {
        ParameterKind::Enum => {
            let mapping_empty = !def
                .enum_evaluation
                .as_ref()
                .is_some_and(|m| !m.is_empty());
            if mapping_empty {
                return Err(CoreError::Configuration(format!(
                    "Enum parameter '{}' has no verdict mapping configured",
                    def.code
                )));
            }
        }
        ParameterKind::Text => {
            if def.affects_overall {
                return Err(CoreError::Validation(format!(
                    "Text parameter '{}' is informational and cannot affect the overall status",
                    def.code
                )));
            }
        }
        ParameterKind::Range | ParameterKind::Max => {}
    }

    Ok(())
}
