//! Transport-layer collaborator traits.
//!
//! A [`ScheduleCompiler`] turns a [`RefineAlgorithm`] plus a
//! [`ScheduleRequest`] into an executable [`RefineSchedule`]. Executing
//! a schedule is a collective operation: every process must execute the
//! same schedules in the same order, and `fill_data` blocks until the
//! exchange completes.

use cascade_core::{LevelNumber, PatchHierarchy, ScheduleError};

use crate::algorithm::RefineAlgorithm;

/// What a schedule is compiled for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScheduleKind {
    /// Steady-state ghost fill from the level and its next coarser level.
    Ghost,
    /// Same-level initialization, cached per level.
    Init,
    /// Built and executed immediately when a level is (re)created.
    /// Data of a replaced level is never reused, so regrids fill from
    /// the coarser level only.
    Fresh,
}

/// Everything a compiler needs besides the registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleRequest<'a> {
    /// Name of the quantity the registration belongs to.
    pub quantity: &'a str,
    /// Destination level.
    pub level: LevelNumber,
    /// Level used as coarse source, `None` for same-level plans.
    pub coarser: Option<LevelNumber>,
    /// Purpose of the plan.
    pub kind: ScheduleKind,
}

/// A compiled, hierarchy-specific communication plan.
pub trait RefineSchedule: Send {
    /// Fill destination ghost regions at `time`.
    ///
    /// When the registration carries past and future sources the
    /// transport interpolates them to `time`.
    fn fill_data(&self, time: f64) -> Result<(), ScheduleError>;
}

/// Compiles registrations against the current hierarchy.
pub trait ScheduleCompiler: Send + Sync {
    /// Build a schedule for `algorithm` as described by `request`.
    fn compile(
        &self,
        algorithm: &RefineAlgorithm,
        hierarchy: &dyn PatchHierarchy,
        request: &ScheduleRequest<'_>,
    ) -> Result<Box<dyn RefineSchedule>, ScheduleError>;
}
