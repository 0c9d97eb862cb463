//! Callback surfaces the hierarchy driver invokes.
//!
//! The driver owns the hierarchy and decides when levels are created,
//! advanced, synchronized and regridded. It calls back into the
//! integrator through two traits:
//!
//! - [`TagAndInitStrategy`]: level creation and refinement tagging.
//! - [`TimeRefinementLevelStrategy`]: the subcycled time integration.
//!
//! All callbacks run on the driver's thread, one at a time.

use cascade_core::{LevelNumber, LifecycleError, PatchHierarchy, PatchLevel};

/// Level creation and tagging callbacks.
pub trait TagAndInitStrategy {
    /// Allocate (if `allocate_data`) and populate `level_number` at `time`.
    ///
    /// `old_level` is the level being replaced when regridding; its
    /// presence marks the call as a regrid.
    fn initialize_level_data(
        &mut self,
        hierarchy: &dyn PatchHierarchy,
        level_number: LevelNumber,
        time: f64,
        old_level: Option<&dyn PatchLevel>,
        allocate_data: bool,
    ) -> Result<(), LifecycleError>;

    /// React to a change of the levels `[coarsest, finest]`.
    fn reset_hierarchy_configuration(
        &mut self,
        hierarchy: &dyn PatchHierarchy,
        coarsest: LevelNumber,
        finest: LevelNumber,
    ) -> Result<(), LifecycleError>;

    /// Tag cells of `level_number` for refinement.
    fn apply_gradient_detector(
        &mut self,
        hierarchy: &dyn PatchHierarchy,
        level_number: LevelNumber,
        time: f64,
        initial_time: bool,
    );
}

/// Subcycled time-integration callbacks.
pub trait TimeRefinementLevelStrategy {
    /// Prepare per-level integration state.
    fn initialize_level_integrator(&mut self) -> Result<(), LifecycleError>;

    /// Timestep for `level` given the driver's proposal `dt`.
    fn get_level_dt(&self, level: &dyn PatchLevel, dt: f64, initial_time: bool) -> f64;

    /// Largest stable timestep of `finer_level_number` given the
    /// coarser timestep and the refinement ratio between the two.
    fn get_max_finer_level_dt(
        &self,
        finer_level_number: LevelNumber,
        coarse_dt: f64,
        ratio: &[i32],
    ) -> f64;

    /// Advance `level` from `current_time` to `new_time` and return the
    /// time reached.
    ///
    /// `first_step` and `last_step` mark the ends of a subcycle of the
    /// level within one step of its coarser level.
    #[allow(clippy::too_many_arguments)]
    fn advance_level(
        &mut self,
        level: &dyn PatchLevel,
        hierarchy: &dyn PatchHierarchy,
        current_time: f64,
        new_time: f64,
        first_step: bool,
        last_step: bool,
        regrid_advance: bool,
    ) -> Result<f64, LifecycleError>;

    /// Reconcile levels `[coarsest, finest]` after they reached `sync_time`.
    fn standard_level_synchronization(
        &mut self,
        hierarchy: &dyn PatchHierarchy,
        coarsest: LevelNumber,
        finest: LevelNumber,
        sync_time: f64,
        old_times: &[f64],
    ) -> Result<(), LifecycleError>;

    /// Reconcile levels created by the last regrid.
    fn synchronize_new_levels(
        &mut self,
        hierarchy: &dyn PatchHierarchy,
        coarsest: LevelNumber,
        finest: LevelNumber,
        sync_time: f64,
        initial_time: bool,
    ) -> Result<(), LifecycleError>;

    /// Promote `new_time` data of `level` to current.
    fn reset_time_dependent_data(
        &mut self,
        level: &dyn PatchLevel,
        new_time: f64,
        can_be_refined: bool,
    );

    /// Discard the results of an advance of `level`.
    fn reset_data_to_preadvance_state(&mut self, level: &dyn PatchLevel);

    /// Whether finer levels take several smaller steps per coarser step.
    fn using_refined_timestepping(&self) -> bool;
}
