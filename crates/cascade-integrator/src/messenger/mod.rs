//! Inter-level messengers.
//!
//! A [`Messenger`] moves data between a level and its next coarser
//! level for one (coarse model, fine model) pairing. The integrator owns
//! one instance per distinct pairing, obtained from a
//! [`MessengerFactory`], and shares it across every level with the same
//! pairing.
//!
//! Methods that build schedules take `&mut self` and are only called
//! while levels are set up or (re)initialized. Ghost fills take `&self`,
//! so solvers receive a `&dyn Messenger` during an advance.

mod info;
mod refining;
mod registration;

pub use info::{GhostQuantity, MessengerInfo};
pub use refining::{RefinerMessenger, RefinerMessengerFactory, TimeWindow};
pub use registration::register_quantities;

use cascade_core::{CollaboratorError, LevelNumber, Patch, PatchHierarchy, PatchLevel, Quantity};

use crate::model::PhysicalModel;

/// Data exchange between a level and its next coarser level.
pub trait Messenger: Send {
    /// Identity of the messenger, as produced by its factory.
    fn name(&self) -> &str;

    /// Allocate messenger-owned patch data on `patch`.
    fn allocate(&self, patch: &dyn Patch, time: f64) -> Result<(), CollaboratorError>;

    /// Register the quantities declared by the coarse side
    /// (`from_coarser`) and the fine side (`from_finer`).
    fn register_quantities(
        &mut self,
        from_coarser: MessengerInfo,
        from_finer: MessengerInfo,
    ) -> Result<(), CollaboratorError>;

    /// Build the schedules of `level_number` in its current geometry.
    fn register_level(
        &mut self,
        hierarchy: &dyn PatchHierarchy,
        level_number: LevelNumber,
    ) -> Result<(), CollaboratorError>;

    /// Align with the coarser level at the start of a subcycle.
    ///
    /// `current_time` is the level's own time, `coarser_new_time` the
    /// time the coarser level was last advanced to.
    fn first_step(
        &mut self,
        model: &dyn PhysicalModel,
        level: &dyn PatchLevel,
        hierarchy: &dyn PatchHierarchy,
        current_time: f64,
        coarser_new_time: f64,
    ) -> Result<(), CollaboratorError>;

    /// Prepare ghost data before every step of the level.
    fn prepare_step(
        &mut self,
        model: &dyn PhysicalModel,
        level: &dyn PatchLevel,
    ) -> Result<(), CollaboratorError>;

    /// Finish a subcycle.
    fn last_step(
        &mut self,
        model: &dyn PhysicalModel,
        level: &dyn PatchLevel,
    ) -> Result<(), CollaboratorError>;

    /// Reconcile fine results of `level` into the coarser representation.
    fn synchronize(&mut self, level: &dyn PatchLevel) -> Result<(), CollaboratorError>;

    /// Fill the ghost regions of `quantity` on `level_number` at `time`.
    fn fill_ghosts(
        &self,
        quantity: &dyn Quantity,
        level_number: LevelNumber,
        time: f64,
    ) -> Result<(), CollaboratorError>;

    /// Populate a newly created or regridded level from coarser data.
    fn initialize_level(
        &self,
        hierarchy: &dyn PatchHierarchy,
        level_number: LevelNumber,
        time: f64,
    ) -> Result<(), CollaboratorError>;
}

/// Builds messengers for model pairings.
pub trait MessengerFactory {
    /// Identity of the messenger serving `coarse` → `fine`, `None` if no
    /// messenger can. Must depend only on the two models.
    fn name(&self, coarse: &dyn PhysicalModel, fine: &dyn PhysicalModel) -> Option<String>;

    /// Create the messenger identified by `name`, first needed on
    /// `level_number`.
    fn create(
        &self,
        name: &str,
        coarse: &dyn PhysicalModel,
        fine: &dyn PhysicalModel,
        level_number: LevelNumber,
    ) -> Option<Box<dyn Messenger>>;
}
