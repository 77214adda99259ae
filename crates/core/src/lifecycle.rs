//! The sample lifecycle state machine.
//!
//! Transitions are data, not code: a [`TransitionTable`] maps each stage to
//! the stages reachable from it, so the full field+lab workflow and the
//! degenerate single-testing-stage workflow are two table values of the
//! same machine. Role gating for each edge lives here as well, keeping
//! "what can happen next, and by whom" in one place.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::roles::{ROLE_ADMIN, ROLE_ANALYST, ROLE_COLLECTOR};

/// Position of a sample in its collection-to-publication workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    /// Created in the field; no measurements recorded yet.
    Collected,
    /// On-site measurements recorded.
    FieldTested,
    /// Laboratory measurements recorded; verdict complete.
    LabTested,
    /// Result released; terminal success state.
    Published,
    /// Retired from default listings; restorable.
    Archived,
}

impl LifecycleStage {
    /// Stable storage string form (matches the `samples.lifecycle_stage`
    /// CHECK constraint).
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleStage::Collected => "collected",
            LifecycleStage::FieldTested => "field_tested",
            LifecycleStage::LabTested => "lab_tested",
            LifecycleStage::Published => "published",
            LifecycleStage::Archived => "archived",
        }
    }

    /// Parse the stable string form. Returns `None` for unknown input.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "collected" => Some(LifecycleStage::Collected),
            "field_tested" => Some(LifecycleStage::FieldTested),
            "lab_tested" => Some(LifecycleStage::LabTested),
            "published" => Some(LifecycleStage::Published),
            "archived" => Some(LifecycleStage::Archived),
            _ => None,
        }
    }

    /// Whether a sample in this stage has a complete verdict.
    ///
    /// The overall status is only meaningful once the final testing stage
    /// has run; a field-tested sample still awaits its lab results and
    /// carries no sample-level verdict.
    pub fn verdict_complete(self) -> bool {
        matches!(
            self,
            LifecycleStage::LabTested | LifecycleStage::Published | LifecycleStage::Archived
        )
    }
}

impl std::fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

type Edge = (LifecycleStage, &'static [LifecycleStage]);

/// The standard two-testing-stage workflow.
const STANDARD_EDGES: &[Edge] = &[
    (LifecycleStage::Collected, &[LifecycleStage::FieldTested]),
    (LifecycleStage::FieldTested, &[LifecycleStage::LabTested]),
    (LifecycleStage::LabTested, &[LifecycleStage::Published]),
    (LifecycleStage::Published, &[LifecycleStage::Archived]),
    // Restore is the only backward edge.
    (LifecycleStage::Archived, &[LifecycleStage::Published]),
];

/// Degenerate single-testing-stage workflow: field work is skipped and the
/// lab submission carries the whole measurement set.
const EXPRESS_EDGES: &[Edge] = &[
    (LifecycleStage::Collected, &[LifecycleStage::LabTested]),
    (LifecycleStage::LabTested, &[LifecycleStage::Published]),
    (LifecycleStage::Published, &[LifecycleStage::Archived]),
    (LifecycleStage::Archived, &[LifecycleStage::Published]),
];

/// A table of legal lifecycle transitions.
#[derive(Debug, Clone, Copy)]
pub struct TransitionTable {
    edges: &'static [Edge],
}

impl TransitionTable {
    /// Full workflow: collected → field_tested → lab_tested → published
    /// → archived, with archived → published as restore.
    pub const fn standard() -> Self {
        Self {
            edges: STANDARD_EDGES,
        }
    }

    /// Single-testing-stage workflow (no separate field submission).
    pub const fn express() -> Self {
        Self {
            edges: EXPRESS_EDGES,
        }
    }

    /// Stages reachable from `from`. Empty for unknown/terminal stages.
    pub fn allowed_from(&self, from: LifecycleStage) -> &'static [LifecycleStage] {
        self.edges
            .iter()
            .find(|(stage, _)| *stage == from)
            .map(|(_, next)| *next)
            .unwrap_or(&[])
    }

    pub fn can_transition(&self, from: LifecycleStage, to: LifecycleStage) -> bool {
        self.allowed_from(from).contains(&to)
    }

    /// Reject an illegal transition with a [`CoreError::State`] naming the
    /// current and requested stage.
    pub fn ensure_transition(
        &self,
        from: LifecycleStage,
        to: LifecycleStage,
    ) -> Result<(), CoreError> {
        if self.can_transition(from, to) {
            Ok(())
        } else {
            Err(CoreError::State {
                current: from.as_str().to_string(),
                requested: to.as_str().to_string(),
            })
        }
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::standard()
    }
}

// ---------------------------------------------------------------------------
// Role gating
// ---------------------------------------------------------------------------

/// Roles allowed to perform a given transition edge.
///
/// Field submissions belong to collectors, lab submissions and publication
/// to analysts, archive/restore to administrators. Admins may do anything.
pub fn allowed_roles(from: LifecycleStage, to: LifecycleStage) -> &'static [&'static str] {
    match (from, to) {
        (_, LifecycleStage::FieldTested) => &[ROLE_ADMIN, ROLE_COLLECTOR],
        (_, LifecycleStage::LabTested) => &[ROLE_ADMIN, ROLE_ANALYST],
        (LifecycleStage::LabTested, LifecycleStage::Published) => &[ROLE_ADMIN, ROLE_ANALYST],
        // Restore (archived → published) is an administrative action.
        (LifecycleStage::Archived, LifecycleStage::Published) => &[ROLE_ADMIN],
        (_, LifecycleStage::Archived) => &[ROLE_ADMIN],
        _ => &[ROLE_ADMIN],
    }
}

/// Reject an actor whose role may not perform the transition.
pub fn ensure_actor_allowed(
    role: &str,
    from: LifecycleStage,
    to: LifecycleStage,
) -> Result<(), CoreError> {
    let roles = allowed_roles(from, to);
    if roles.contains(&role) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Role '{role}' may not move a sample from '{from}' to '{to}'. Allowed roles: {}",
            roles.join(", ")
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn stage_string_forms_round_trip() {
        for stage in [
            LifecycleStage::Collected,
            LifecycleStage::FieldTested,
            LifecycleStage::LabTested,
            LifecycleStage::Published,
            LifecycleStage::Archived,
        ] {
            assert_eq!(LifecycleStage::parse(stage.as_str()), Some(stage));
        }
        assert_eq!(LifecycleStage::parse("testing"), None);
    }

    #[test]
    fn standard_forward_path() {
        let table = TransitionTable::standard();
        assert!(table.can_transition(LifecycleStage::Collected, LifecycleStage::FieldTested));
        assert!(table.can_transition(LifecycleStage::FieldTested, LifecycleStage::LabTested));
        assert!(table.can_transition(LifecycleStage::LabTested, LifecycleStage::Published));
        assert!(table.can_transition(LifecycleStage::Published, LifecycleStage::Archived));
    }

    #[test]
    fn restore_is_the_only_backward_edge() {
        let table = TransitionTable::standard();
        assert!(table.can_transition(LifecycleStage::Archived, LifecycleStage::Published));
        assert!(!table.can_transition(LifecycleStage::Published, LifecycleStage::LabTested));
        assert!(!table.can_transition(LifecycleStage::LabTested, LifecycleStage::FieldTested));
        assert!(!table.can_transition(LifecycleStage::FieldTested, LifecycleStage::Collected));
    }

    #[test]
    fn collected_cannot_skip_to_published() {
        let table = TransitionTable::standard();
        let err = table
            .ensure_transition(LifecycleStage::Collected, LifecycleStage::Published)
            .unwrap_err();
        assert_matches!(
            err,
            CoreError::State { current, requested }
                if current == "collected" && requested == "published"
        );
    }

    #[test]
    fn from_collected_only_field_tested_is_reachable() {
        let table = TransitionTable::standard();
        assert_eq!(
            table.allowed_from(LifecycleStage::Collected),
            &[LifecycleStage::FieldTested]
        );
    }

    #[test]
    fn express_table_skips_field_stage() {
        let table = TransitionTable::express();
        assert!(table.can_transition(LifecycleStage::Collected, LifecycleStage::LabTested));
        assert!(!table.can_transition(LifecycleStage::Collected, LifecycleStage::FieldTested));
        // The back half of the machine is unchanged.
        assert!(table.can_transition(LifecycleStage::Archived, LifecycleStage::Published));
    }

    #[test]
    fn collector_may_submit_field_but_not_lab() {
        assert!(ensure_actor_allowed(
            "collector",
            LifecycleStage::Collected,
            LifecycleStage::FieldTested
        )
        .is_ok());
        assert_matches!(
            ensure_actor_allowed(
                "collector",
                LifecycleStage::FieldTested,
                LifecycleStage::LabTested
            ),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn analyst_publishes_but_does_not_archive() {
        assert!(ensure_actor_allowed(
            "analyst",
            LifecycleStage::LabTested,
            LifecycleStage::Published
        )
        .is_ok());
        assert_matches!(
            ensure_actor_allowed(
                "analyst",
                LifecycleStage::Published,
                LifecycleStage::Archived
            ),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn restore_requires_admin() {
        assert!(ensure_actor_allowed(
            "admin",
            LifecycleStage::Archived,
            LifecycleStage::Published
        )
        .is_ok());
        assert_matches!(
            ensure_actor_allowed(
                "analyst",
                LifecycleStage::Archived,
                LifecycleStage::Published
            ),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn admin_may_perform_every_edge() {
        let table = TransitionTable::standard();
        for (from, targets) in [
            (LifecycleStage::Collected, table.allowed_from(LifecycleStage::Collected)),
            (LifecycleStage::FieldTested, table.allowed_from(LifecycleStage::FieldTested)),
            (LifecycleStage::LabTested, table.allowed_from(LifecycleStage::LabTested)),
            (LifecycleStage::Published, table.allowed_from(LifecycleStage::Published)),
            (LifecycleStage::Archived, table.allowed_from(LifecycleStage::Archived)),
        ] {
            for to in targets {
                assert!(ensure_actor_allowed("admin", from, *to).is_ok());
            }
        }
    }
}
