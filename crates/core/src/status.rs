//! Parameter and sample verdict values.
//!
//! These string forms are stored in the `samples.overall_status` column and
//! inside every frozen parameter snapshot, so they must stay stable.

use serde::{Deserialize, Serialize};

/// Verdict for a single measured parameter, or for a whole sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamStatus {
    /// Within the acceptable limit of the reference standard.
    Acceptable,
    /// Outside the acceptable limit but within the permissible relaxation.
    Permissible,
    /// Outside all regulatory limits.
    NotAcceptable,
}

impl ParamStatus {
    /// Stable storage/JSON string form.
    pub fn as_str(self) -> &'static str {
        match self {
            ParamStatus::Acceptable => "acceptable",
            ParamStatus::Permissible => "permissible",
            ParamStatus::NotAcceptable => "not_acceptable",
        }
    }

    /// Parse the stable string form. Returns `None` for unknown input.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "acceptable" => Some(ParamStatus::Acceptable),
            "permissible" => Some(ParamStatus::Permissible),
            "not_acceptable" => Some(ParamStatus::NotAcceptable),
            _ => None,
        }
    }

    /// Severity rank used by worst-case aggregation (higher is worse).
    pub fn severity(self) -> u8 {
        match self {
            ParamStatus::Acceptable => 0,
            ParamStatus::Permissible => 1,
            ParamStatus::NotAcceptable => 2,
        }
    }
}

impl std::fmt::Display for ParamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
