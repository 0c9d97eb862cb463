use cascade_core::CollaboratorError;
use tracing::debug;

use super::{Messenger, MessengerInfo};
use crate::model::PhysicalModel;
use crate::solver::Solver;

/// Wire the quantities of a (coarse, fine) model pairing into `messenger`.
///
/// The coarse model fills the "from coarser" record. The fine model and
/// the solver of the fine level fill the "from finer" record.
pub fn register_quantities(
    messenger: &mut dyn Messenger,
    coarse_model: &dyn PhysicalModel,
    fine_model: &dyn PhysicalModel,
    solver: &dyn Solver,
) -> Result<(), CollaboratorError> {
    let mut from_coarser = MessengerInfo::default();
    let mut from_finer = MessengerInfo::default();

    coarse_model.fill_messenger_info(&mut from_coarser);
    fine_model.fill_messenger_info(&mut from_finer);
    solver.fill_messenger_info(&mut from_finer);

    debug!(
        messenger = messenger.name(),
        coarse = coarse_model.name(),
        fine = fine_model.name(),
        ghosts = from_finer.ghost_quantities.len(),
        "registering quantities"
    );
    messenger.register_quantities(from_coarser, from_finer)
}
