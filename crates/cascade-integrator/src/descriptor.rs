//! Per-level assignment table.
//!
//! One [`LevelDescriptor`] per level records which model, solver and
//! messenger apply there. Indices point into the integrator's
//! append-only pools. The table is written only during setup and by
//! the lifecycle state transitions.

use cascade_core::{Assignment, LevelNumber, LifecycleError, SetupError};

// ── LevelState ─────────────────────────────────────────────────────

/// Lifecycle position of one level.
///
/// States are ordered: every variant implies all earlier ones were
/// reached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LevelState {
    /// Nothing assigned yet.
    #[default]
    Unregistered,
    /// A model covers the level.
    ModelAssigned,
    /// A compatible solver covers the level.
    SolverAssigned,
    /// A messenger to the next coarser level is wired.
    MessengerWired,
    /// Patch data was allocated and populated.
    DataInitialized,
    /// The level has been advanced at least once since its last
    /// (re)initialization.
    Advancing,
}

// ── LevelDescriptor ────────────────────────────────────────────────

/// Which model, solver and messenger apply to one level.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelDescriptor {
    /// Index into the model pool.
    pub model_index: Option<usize>,
    /// Index into the solver pool.
    pub solver_index: Option<usize>,
    /// Key into the messenger map of the messenger to the next coarser level.
    pub messenger_name: Option<String>,
    /// Lifecycle position.
    pub state: LevelState,
}

// ── DescriptorTable ────────────────────────────────────────────────

/// Fixed-size table of [`LevelDescriptor`]s.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct DescriptorTable {
    levels: Vec<LevelDescriptor>,
}

impl DescriptorTable {
    pub(crate) fn new(level_count: usize) -> Self {
        Self {
            levels: vec![LevelDescriptor::default(); level_count],
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.levels.len()
    }

    pub(crate) fn get(&self, level: LevelNumber) -> Option<&LevelDescriptor> {
        self.levels.get(level)
    }

    /// Reject empty, inverted, or out-of-bounds ranges.
    pub(crate) fn check_range(
        &self,
        coarsest: LevelNumber,
        finest: LevelNumber,
    ) -> Result<(), SetupError> {
        if finest < coarsest || finest >= self.levels.len() {
            return Err(SetupError::InvalidLevelRange {
                coarsest,
                finest,
                level_count: self.levels.len(),
            });
        }
        Ok(())
    }

    /// First level in `[coarsest, finest]` that already has a model.
    pub(crate) fn first_assigned_model(
        &self,
        coarsest: LevelNumber,
        finest: LevelNumber,
    ) -> Option<LevelNumber> {
        (coarsest..=finest).find(|&l| self.levels[l].model_index.is_some())
    }

    pub(crate) fn stamp_model(&mut self, coarsest: LevelNumber, finest: LevelNumber, index: usize) {
        for d in &mut self.levels[coarsest..=finest] {
            d.model_index = Some(index);
            d.state = d.state.max(LevelState::ModelAssigned);
        }
    }

    pub(crate) fn stamp_solver(&mut self, coarsest: LevelNumber, finest: LevelNumber, index: usize) {
        for d in &mut self.levels[coarsest..=finest] {
            d.solver_index = Some(index);
            d.state = d.state.max(LevelState::SolverAssigned);
        }
    }

    pub(crate) fn stamp_messenger(&mut self, level: LevelNumber, name: String) {
        if let Some(d) = self.levels.get_mut(level) {
            d.messenger_name = Some(name);
            d.state = d.state.max(LevelState::MessengerWired);
        }
    }

    pub(crate) fn set_state(&mut self, level: LevelNumber, state: LevelState) {
        if let Some(d) = self.levels.get_mut(level) {
            d.state = state;
        }
    }

    pub(crate) fn state(&self, level: LevelNumber) -> Option<LevelState> {
        self.levels.get(level).map(|d| d.state)
    }

    // ── Lifecycle lookups ──────────────────────────────────────────

    pub(crate) fn model_index(&self, level: LevelNumber) -> Result<usize, LifecycleError> {
        self.levels
            .get(level)
            .and_then(|d| d.model_index)
            .ok_or(LifecycleError::MissingAssignment {
                level,
                kind: Assignment::Model,
            })
    }

    pub(crate) fn solver_index(&self, level: LevelNumber) -> Result<usize, LifecycleError> {
        self.levels
            .get(level)
            .and_then(|d| d.solver_index)
            .ok_or(LifecycleError::MissingAssignment {
                level,
                kind: Assignment::Solver,
            })
    }

    pub(crate) fn messenger_name(&self, level: LevelNumber) -> Result<&str, LifecycleError> {
        self.levels
            .get(level)
            .and_then(|d| d.messenger_name.as_deref())
            .ok_or(LifecycleError::MissingAssignment {
                level,
                kind: Assignment::Messenger,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_are_checked_against_level_count() {
        let t = DescriptorTable::new(3);
        assert!(t.check_range(0, 2).is_ok());
        assert!(t.check_range(1, 1).is_ok());
        assert!(matches!(
            t.check_range(2, 1),
            Err(SetupError::InvalidLevelRange { .. })
        ));
        assert!(matches!(
            t.check_range(0, 3),
            Err(SetupError::InvalidLevelRange { level_count: 3, .. })
        ));
    }

    #[test]
    fn stamping_advances_state_monotonically() {
        let mut t = DescriptorTable::new(2);
        t.stamp_model(0, 1, 0);
        t.stamp_solver(0, 0, 0);
        assert_eq!(t.state(0), Some(LevelState::SolverAssigned));
        assert_eq!(t.state(1), Some(LevelState::ModelAssigned));

        t.set_state(0, LevelState::DataInitialized);
        t.stamp_model(0, 0, 4);
        assert_eq!(t.state(0), Some(LevelState::DataInitialized));
    }

    #[test]
    fn first_assigned_model_finds_overlap() {
        let mut t = DescriptorTable::new(4);
        t.stamp_model(2, 3, 0);
        assert_eq!(t.first_assigned_model(0, 1), None);
        assert_eq!(t.first_assigned_model(1, 3), Some(2));
    }

    #[test]
    fn lookups_report_missing_assignment() {
        let mut t = DescriptorTable::new(2);
        t.stamp_model(0, 0, 0);
        assert_eq!(t.model_index(0), Ok(0));
        assert_eq!(
            t.model_index(1),
            Err(LifecycleError::MissingAssignment {
                level: 1,
                kind: Assignment::Model
            })
        );
        assert_eq!(
            t.messenger_name(0),
            Err(LifecycleError::MissingAssignment {
                level: 0,
                kind: Assignment::Messenger
            })
        );
        t.stamp_messenger(0, "A-A".into());
        assert_eq!(t.messenger_name(0), Ok("A-A"));
        assert!(t.solver_index(7).is_err());
    }
}
