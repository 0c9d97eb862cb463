//! The [`Solver`] collaborator trait.

use cascade_core::{CollaboratorError, LevelNumber, Patch, PatchHierarchy};

use crate::messenger::{Messenger, MessengerInfo};
use crate::model::PhysicalModel;

/// Numerical update of one model on a level.
///
/// One instance is shared by every level of its registered range. The
/// messenger passed to [`advance_level`](Solver::advance_level) is
/// read-only: a solver can fill ghosts but not rebuild schedules.
pub trait Solver: Send + Sync {
    /// Solver name.
    fn name(&self) -> &str;

    /// Name of the model type this solver advances.
    fn model_name(&self) -> &str;

    /// Allocate solver-owned patch data on `patch`.
    fn allocate(
        &self,
        model: &dyn PhysicalModel,
        patch: &dyn Patch,
        time: f64,
    ) -> Result<(), CollaboratorError>;

    /// Register the resources this solver needs with `model`.
    fn register_resources(&self, model: &dyn PhysicalModel) -> Result<(), CollaboratorError>;

    /// Declare solver-owned quantities exchanged with adjacent levels.
    fn fill_messenger_info(&self, _info: &mut MessengerInfo) {}

    /// Advance `level_number` from `current_time` to `new_time`.
    #[allow(clippy::too_many_arguments)]
    fn advance_level(
        &self,
        hierarchy: &dyn PatchHierarchy,
        level_number: LevelNumber,
        model: &dyn PhysicalModel,
        messenger: &dyn Messenger,
        current_time: f64,
        new_time: f64,
    ) -> Result<(), CollaboratorError>;
}

/// Whether `solver` can advance `model`: the solver's declared model
/// name equals the model's name.
pub fn are_compatible(model: &dyn PhysicalModel, solver: &dyn Solver) -> bool {
    model.name() == solver.model_name()
}
