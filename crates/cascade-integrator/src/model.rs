//! The [`PhysicalModel`] collaborator trait.

use cascade_core::{CollaboratorError, Patch, PatchLevel};

use crate::messenger::MessengerInfo;

/// A physical model: the state representation of one kind of physics
/// on the levels it covers.
///
/// One instance is shared by every level of its registered range.
pub trait PhysicalModel: Send + Sync {
    /// Model type name. Solvers and level initializers are matched on it.
    fn name(&self) -> &str;

    /// Allocate the model's patch data on `patch`.
    fn allocate(&self, patch: &dyn Patch, time: f64) -> Result<(), CollaboratorError>;

    /// Set initial conditions on a freshly created root level.
    fn initialize_level(&self, level: &dyn PatchLevel, time: f64) -> Result<(), CollaboratorError>;

    /// Declare the quantities this model exchanges with adjacent levels.
    fn fill_messenger_info(&self, info: &mut MessengerInfo);
}
