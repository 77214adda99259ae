//! Audit action constants and helpers.
//!
//! This module lives in `core` (zero internal deps) so both the API layer
//! and the event persistence service use the same action vocabulary. One
//! fact is emitted per meaningful transition; the sink is fire-and-forget.

use crate::lifecycle::LifecycleStage;

// ---------------------------------------------------------------------------
// Action type constants
// ---------------------------------------------------------------------------

/// Known action types for audit log entries.
pub mod action_types {
    pub const LOGIN: &str = "login";
    pub const LOGOUT: &str = "logout";
    pub const SAMPLE_COLLECTED: &str = "sample_collected";
    pub const SAMPLE_FIELD_TESTED: &str = "sample_field_tested";
    pub const SAMPLE_LAB_TESTED: &str = "sample_lab_tested";
    pub const SAMPLE_PUBLISHED: &str = "sample_published";
    pub const SAMPLE_ARCHIVED: &str = "sample_archived";
    pub const SAMPLE_RESTORED: &str = "sample_restored";
    pub const PARAMETER_CREATED: &str = "parameter_created";
    pub const PARAMETER_UPDATED: &str = "parameter_updated";
}

// ---------------------------------------------------------------------------
// Log category constants
// ---------------------------------------------------------------------------

/// Known log categories for filtering and retention grouping.
pub mod log_categories {
    pub const AUTHENTICATION: &str = "authentication";
    pub const OPERATIONS: &str = "operations";
    pub const CONFIGURATION: &str = "configuration";
}

/// Map an action type to its log category.
///
/// Unknown action types default to `"operations"`.
pub fn action_to_category(action_type: &str) -> &'static str {
    match action_type {
        action_types::LOGIN | action_types::LOGOUT => log_categories::AUTHENTICATION,
        action_types::PARAMETER_CREATED | action_types::PARAMETER_UPDATED => {
            log_categories::CONFIGURATION
        }
        _ => log_categories::OPERATIONS,
    }
}

/// The audit action recorded for a lifecycle transition edge.
///
/// Restore is distinguished from publish by its origin stage.
pub fn action_for_transition(from: LifecycleStage, to: LifecycleStage) -> &'static str {
    match (from, to) {
        (LifecycleStage::Archived, LifecycleStage::Published) => action_types::SAMPLE_RESTORED,
        (_, LifecycleStage::FieldTested) => action_types::SAMPLE_FIELD_TESTED,
        (_, LifecycleStage::LabTested) => action_types::SAMPLE_LAB_TESTED,
        (_, LifecycleStage::Published) => action_types::SAMPLE_PUBLISHED,
        (_, LifecycleStage::Archived) => action_types::SAMPLE_ARCHIVED,
        (_, LifecycleStage::Collected) => action_types::SAMPLE_COLLECTED,
    }
}
