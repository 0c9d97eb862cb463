use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use cascade_core::{
    CollaboratorError, LevelNumber, Patch, PatchHierarchy, PatchLevel, Quantity, ResourceLookup,
    VecFieldDescriptor,
};
use cascade_refine::{
    make_ghost_refiner, make_init_refiner, RefineOperator, RefinerPool, ScheduleCompiler,
    TimeInterpolateOperator,
};
use tracing::debug;

use super::{Messenger, MessengerFactory, MessengerInfo};
use crate::model::PhysicalModel;

// ── TimeWindow ─────────────────────────────────────────────────────

/// Coarse-level times bracketing the current subcycle of a fine level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeWindow {
    /// Fine-level time at the start of the subcycle.
    pub past: f64,
    /// Time the coarser level was advanced to.
    pub future: f64,
}

// ── RefinerMessenger ───────────────────────────────────────────────

/// A [`Messenger`] backed by two [`RefinerPool`]s: one for steady-state
/// ghost fills and one for populating new levels.
///
/// Coarsening is left to the transport. [`synchronize`] only checks
/// that the level was registered; the transport reads the quantities to
/// coarsen from [`sync_quantities`] and the interpolation bounds of the
/// current subcycle from [`time_window`].
///
/// [`synchronize`]: Messenger::synchronize
/// [`sync_quantities`]: RefinerMessenger::sync_quantities
/// [`time_window`]: RefinerMessenger::time_window
pub struct RefinerMessenger {
    name: String,
    resources: Arc<dyn ResourceLookup>,
    refine_op: Arc<dyn RefineOperator>,
    time_op: Arc<dyn TimeInterpolateOperator>,
    ghosts: RefinerPool,
    inits: RefinerPool,
    sync_quantities: Vec<VecFieldDescriptor>,
    registered_levels: BTreeSet<LevelNumber>,
    windows: BTreeMap<LevelNumber, TimeWindow>,
}

impl RefinerMessenger {
    /// A messenger with no registered quantity.
    pub fn new(
        name: impl Into<String>,
        compiler: Arc<dyn ScheduleCompiler>,
        resources: Arc<dyn ResourceLookup>,
        refine_op: Arc<dyn RefineOperator>,
        time_op: Arc<dyn TimeInterpolateOperator>,
    ) -> Self {
        Self {
            name: name.into(),
            resources,
            refine_op,
            time_op,
            ghosts: RefinerPool::new(Arc::clone(&compiler)),
            inits: RefinerPool::new(compiler),
            sync_quantities: Vec::new(),
            registered_levels: BTreeSet::new(),
            windows: BTreeMap::new(),
        }
    }

    /// Refiners of the steady-state ghost fills.
    pub fn ghost_pool(&self) -> &RefinerPool {
        &self.ghosts
    }

    /// Refiners used when a level is created.
    pub fn init_pool(&self) -> &RefinerPool {
        &self.inits
    }

    /// Whether `level_number` has been registered.
    pub fn is_level_registered(&self, level_number: LevelNumber) -> bool {
        self.registered_levels.contains(&level_number)
    }

    /// The subcycle window of `level_number`, between its first and
    /// last step.
    pub fn time_window(&self, level_number: LevelNumber) -> Option<TimeWindow> {
        self.windows.get(&level_number).copied()
    }

    /// Quantities coarsened at synchronization.
    pub fn sync_quantities(&self) -> &[VecFieldDescriptor] {
        &self.sync_quantities
    }

    fn require_registered(&self, level_number: LevelNumber) -> Result<(), CollaboratorError> {
        if self.is_level_registered(level_number) {
            Ok(())
        } else {
            Err(CollaboratorError::ExecutionFailed {
                reason: format!("{}: level {level_number} was never registered", self.name),
            })
        }
    }
}

impl Messenger for RefinerMessenger {
    fn name(&self) -> &str {
        &self.name
    }

    fn allocate(&self, _patch: &dyn Patch, _time: f64) -> Result<(), CollaboratorError> {
        Ok(())
    }

    fn register_quantities(
        &mut self,
        _from_coarser: MessengerInfo,
        from_finer: MessengerInfo,
    ) -> Result<(), CollaboratorError> {
        for q in &from_finer.ghost_quantities {
            let refiner = make_ghost_refiner(
                &q.ghost,
                &q.model,
                &q.old_model,
                self.resources.as_ref(),
                Arc::clone(&self.refine_op),
                Arc::clone(&self.time_op),
            );
            self.ghosts.add(refiner, q.model.name());
        }
        for q in &from_finer.init_quantities {
            let refiner =
                make_init_refiner(q, self.resources.as_ref(), Arc::clone(&self.refine_op));
            self.inits.add(refiner, q.name());
        }
        self.sync_quantities = from_finer.sync_quantities;

        debug!(
            messenger = %self.name,
            ghosts = self.ghosts.len(),
            inits = self.inits.len(),
            "quantities registered"
        );
        Ok(())
    }

    fn register_level(
        &mut self,
        hierarchy: &dyn PatchHierarchy,
        level_number: LevelNumber,
    ) -> Result<(), CollaboratorError> {
        self.ghosts.create_ghost_schedules(hierarchy, level_number)?;
        self.inits.create_init_schedules(hierarchy, level_number)?;
        self.registered_levels.insert(level_number);
        Ok(())
    }

    fn first_step(
        &mut self,
        _model: &dyn PhysicalModel,
        level: &dyn PatchLevel,
        _hierarchy: &dyn PatchHierarchy,
        current_time: f64,
        coarser_new_time: f64,
    ) -> Result<(), CollaboratorError> {
        let level_number = level.level_number();
        self.require_registered(level_number)?;
        self.windows.insert(
            level_number,
            TimeWindow {
                past: current_time,
                future: coarser_new_time,
            },
        );
        Ok(())
    }

    fn prepare_step(
        &mut self,
        _model: &dyn PhysicalModel,
        level: &dyn PatchLevel,
    ) -> Result<(), CollaboratorError> {
        self.require_registered(level.level_number())
    }

    fn last_step(
        &mut self,
        _model: &dyn PhysicalModel,
        level: &dyn PatchLevel,
    ) -> Result<(), CollaboratorError> {
        self.windows.remove(&level.level_number());
        Ok(())
    }

    fn synchronize(&mut self, level: &dyn PatchLevel) -> Result<(), CollaboratorError> {
        self.require_registered(level.level_number())?;
        debug!(
            messenger = %self.name,
            level = level.level_number(),
            quantities = self.sync_quantities.len(),
            "synchronizing to coarser level"
        );
        Ok(())
    }

    fn fill_ghosts(
        &self,
        quantity: &dyn Quantity,
        level_number: LevelNumber,
        time: f64,
    ) -> Result<(), CollaboratorError> {
        Ok(self
            .ghosts
            .fill_vec_field_ghosts(quantity, level_number, time)?)
    }

    fn initialize_level(
        &self,
        hierarchy: &dyn PatchHierarchy,
        level_number: LevelNumber,
        time: f64,
    ) -> Result<(), CollaboratorError> {
        Ok(self.inits.initialize(hierarchy, level_number, time)?)
    }
}

impl fmt::Debug for RefinerMessenger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefinerMessenger")
            .field("name", &self.name)
            .field("ghosts", &self.ghosts)
            .field("inits", &self.inits)
            .field("registered_levels", &self.registered_levels)
            .finish_non_exhaustive()
    }
}

// ── RefinerMessengerFactory ────────────────────────────────────────

/// Builds [`RefinerMessenger`]s for an explicit set of model pairings.
///
/// The messenger of the pairing `(coarse, fine)` is named
/// `"{coarse}-{fine}"`.
pub struct RefinerMessengerFactory {
    compiler: Arc<dyn ScheduleCompiler>,
    resources: Arc<dyn ResourceLookup>,
    refine_op: Arc<dyn RefineOperator>,
    time_op: Arc<dyn TimeInterpolateOperator>,
    pairs: Vec<(String, String)>,
}

impl RefinerMessengerFactory {
    /// A factory accepting no pairing yet.
    pub fn new(
        compiler: Arc<dyn ScheduleCompiler>,
        resources: Arc<dyn ResourceLookup>,
        refine_op: Arc<dyn RefineOperator>,
        time_op: Arc<dyn TimeInterpolateOperator>,
    ) -> Self {
        Self {
            compiler,
            resources,
            refine_op,
            time_op,
            pairs: Vec::new(),
        }
    }

    /// Accept the pairing of `coarse` model type with `fine` model type.
    pub fn with_pair(mut self, coarse: impl Into<String>, fine: impl Into<String>) -> Self {
        self.pairs.push((coarse.into(), fine.into()));
        self
    }

    fn accepts(&self, coarse: &str, fine: &str) -> bool {
        self.pairs.iter().any(|(c, f)| c == coarse && f == fine)
    }
}

impl MessengerFactory for RefinerMessengerFactory {
    fn name(&self, coarse: &dyn PhysicalModel, fine: &dyn PhysicalModel) -> Option<String> {
        self.accepts(coarse.name(), fine.name())
            .then(|| format!("{}-{}", coarse.name(), fine.name()))
    }

    fn create(
        &self,
        name: &str,
        coarse: &dyn PhysicalModel,
        fine: &dyn PhysicalModel,
        level_number: LevelNumber,
    ) -> Option<Box<dyn Messenger>> {
        let expected = self.name(coarse, fine)?;
        if expected != name {
            return None;
        }
        debug!(messenger = name, level = level_number, "creating messenger");
        Some(Box::new(RefinerMessenger::new(
            name,
            Arc::clone(&self.compiler),
            Arc::clone(&self.resources),
            Arc::clone(&self.refine_op),
            Arc::clone(&self.time_op),
        )))
    }
}

impl fmt::Debug for RefinerMessengerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefinerMessengerFactory")
            .field("pairs", &self.pairs)
            .finish_non_exhaustive()
    }
}
