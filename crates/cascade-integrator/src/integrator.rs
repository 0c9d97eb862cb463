//! [`MultiPhysicsIntegrator`]: per-level dispatch of models, solvers and
//! messengers.
//!
//! # Phases
//!
//! **Setup.** Models, then solvers, are registered over level ranges;
//! messengers are then resolved and wired for every level. Each call
//! validates everything before mutating, so a failed call leaves the
//! tables unchanged. A successful
//! [`register_and_setup_messengers`](MultiPhysicsIntegrator::register_and_setup_messengers)
//! closes setup.
//!
//! **Lifecycle.** The hierarchy driver invokes the
//! [`TagAndInitStrategy`] and [`TimeRefinementLevelStrategy`]
//! callbacks. Every callback resolves the level's model, solver and
//! messenger by index; the tables themselves are read-only from here on.

use std::sync::Arc;

use cascade_core::{Assignment, LevelNumber, LifecycleError, PatchHierarchy, PatchLevel, SetupError};
use indexmap::IndexMap;
use tracing::{debug, info, trace};

use crate::config::{ConfigError, IntegratorConfig};
use crate::descriptor::{DescriptorTable, LevelDescriptor, LevelState};
use crate::functors::{FunctorValue, SimFunctorParams, SimFunctors, FINE_DUMP, PRE_ADVANCE};
use crate::level_initializer::{LevelInitializer, LevelInitializerFactory};
use crate::messenger::{register_quantities, Messenger, MessengerFactory};
use crate::model::PhysicalModel;
use crate::solver::{are_compatible, Solver};
use crate::strategy::{TagAndInitStrategy, TimeRefinementLevelStrategy};

// Compile-time assertion: the integrator can move to the driver's thread.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<MultiPhysicsIntegrator>();
    }
};

fn same_instance<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

fn pooled<T: ?Sized>(
    pool: &[Arc<T>],
    index: usize,
    level: LevelNumber,
    kind: Assignment,
) -> Result<&T, LifecycleError> {
    pool.get(index)
        .map(|item| item.as_ref())
        .ok_or(LifecycleError::MissingAssignment { level, kind })
}

fn dump_fine_level(functors: &SimFunctors, level_number: LevelNumber, time: f64) {
    let Some(dump) = functors.get(PRE_ADVANCE, FINE_DUMP) else {
        return;
    };
    let mut params = SimFunctorParams::new();
    params.insert("level_nbr".to_string(), FunctorValue::Int(level_number as i64));
    params.insert("timestamp".to_string(), FunctorValue::Float(time));
    trace!(level = level_number, time, "fine dump");
    dump(&params);
}

// ── MultiPhysicsIntegrator ─────────────────────────────────────────

/// Coordinates models, solvers and messengers across the levels of an
/// adaptive hierarchy.
///
/// # Example
///
/// ```ignore
/// let mut integrator = MultiPhysicsIntegrator::new(
///     IntegratorConfig::new(3),
///     Box::new(StandardLevelInitializerFactory::new().with_model("Hybrid")),
///     SimFunctors::new(),
/// )?;
/// integrator.register_model(0, 2, hybrid_model)?;
/// integrator.register_and_init_solver(0, 2, hybrid_solver)?;
/// integrator.register_and_setup_messengers(&messenger_factory)?;
/// ```
pub struct MultiPhysicsIntegrator {
    config: IntegratorConfig,
    descriptors: DescriptorTable,
    models: Vec<Arc<dyn PhysicalModel>>,
    solvers: Vec<Arc<dyn Solver>>,
    messengers: IndexMap<String, Box<dyn Messenger>>,
    level_initializers: IndexMap<String, Box<dyn LevelInitializer>>,
    initializer_factory: Box<dyn LevelInitializerFactory>,
    functors: SimFunctors,
    new_times: Vec<Option<f64>>,
    setup_closed: bool,
}

impl MultiPhysicsIntegrator {
    /// Create an integrator for `config.level_count` levels.
    ///
    /// `initializer_factory` is asked for a level initializer each time
    /// a new model type is registered. `functors` holds the diagnostic
    /// callbacks invoked during level advances.
    pub fn new(
        config: IntegratorConfig,
        initializer_factory: Box<dyn LevelInitializerFactory>,
        functors: SimFunctors,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let level_count = config.level_count;
        Ok(Self {
            config,
            descriptors: DescriptorTable::new(level_count),
            models: Vec::new(),
            solvers: Vec::new(),
            messengers: IndexMap::new(),
            level_initializers: IndexMap::new(),
            initializer_factory,
            functors,
            new_times: vec![None; level_count],
            setup_closed: false,
        })
    }

    // ── Setup ──────────────────────────────────────────────────────

    fn ensure_open(&self, operation: &'static str) -> Result<(), SetupError> {
        if self.setup_closed {
            return Err(SetupError::SetupClosed { operation });
        }
        Ok(())
    }

    /// Assign `model` to the levels `[coarsest, finest]`.
    ///
    /// # Errors
    ///
    /// [`SetupError`] if the range is invalid, a level in it already has
    /// a model, this instance is already registered, the factory has no
    /// level initializer for the model type, or setup is closed.
    pub fn register_model(
        &mut self,
        coarsest: LevelNumber,
        finest: LevelNumber,
        model: Arc<dyn PhysicalModel>,
    ) -> Result<(), SetupError> {
        self.ensure_open("register_model")?;
        self.descriptors.check_range(coarsest, finest)?;
        if let Some(level) = self.descriptors.first_assigned_model(coarsest, finest) {
            return Err(SetupError::LevelRangeOccupied {
                coarsest,
                finest,
                level,
            });
        }
        if self.models.iter().any(|m| same_instance(m, &model)) {
            return Err(SetupError::DuplicateModel {
                name: model.name().to_string(),
            });
        }

        let name = model.name().to_string();
        if !self.level_initializers.contains_key(&name) {
            let initializer = self.initializer_factory.create(&name).ok_or_else(|| {
                SetupError::NoLevelInitializer {
                    model: name.clone(),
                }
            })?;
            self.level_initializers.insert(name.clone(), initializer);
        }

        self.models.push(model);
        self.descriptors
            .stamp_model(coarsest, finest, self.models.len() - 1);
        info!(model = %name, coarsest, finest, "model registered");
        Ok(())
    }

    /// Assign `solver` to the levels `[coarsest, finest]` and let it
    /// register its resources with the model of `coarsest`.
    ///
    /// # Errors
    ///
    /// [`SetupError::IncompatibleSolver`] if a level in the range has no
    /// model or a model the solver cannot advance. Other [`SetupError`]s
    /// for an invalid range, a duplicate instance, a closed setup, or a
    /// failed resource registration.
    pub fn register_and_init_solver(
        &mut self,
        coarsest: LevelNumber,
        finest: LevelNumber,
        solver: Arc<dyn Solver>,
    ) -> Result<(), SetupError> {
        self.ensure_open("register_and_init_solver")?;
        self.descriptors.check_range(coarsest, finest)?;
        if self.solvers.iter().any(|s| same_instance(s, &solver)) {
            return Err(SetupError::DuplicateSolver {
                name: solver.name().to_string(),
            });
        }

        for level in coarsest..=finest {
            let model = self.setup_model(level).ok();
            if !model.is_some_and(|m| are_compatible(m, solver.as_ref())) {
                return Err(SetupError::IncompatibleSolver {
                    solver: solver.name().to_string(),
                    model: model.map_or_else(|| "<none>".to_string(), |m| m.name().to_string()),
                    level,
                });
            }
        }

        let model = self.setup_model(coarsest)?;
        solver
            .register_resources(model)
            .map_err(|source| SetupError::Collaborator {
                name: solver.name().to_string(),
                source,
            })?;

        info!(solver = solver.name(), coarsest, finest, "solver registered");
        self.solvers.push(solver);
        self.descriptors
            .stamp_solver(coarsest, finest, self.solvers.len() - 1);
        Ok(())
    }

    /// Resolve, create and wire the messenger of every level.
    ///
    /// The messenger of level `l` serves the pairing (model of `l - 1`,
    /// model of `l`); the root pairs its model with itself. One
    /// messenger is created per distinct name the factory returns.
    /// Quantities are wired once per maximal run of consecutive levels
    /// sharing a messenger. Closes setup on success.
    ///
    /// # Errors
    ///
    /// [`SetupError::UnassignedLevel`] if a level lacks a model or a
    /// solver, [`SetupError::NoViableMessenger`] if the factory cannot
    /// serve a pairing, [`SetupError::Collaborator`] if wiring fails.
    /// The tables are unchanged on error.
    pub fn register_and_setup_messengers<F>(&mut self, factory: &F) -> Result<(), SetupError>
    where
        F: MessengerFactory + ?Sized,
    {
        self.ensure_open("register_and_setup_messengers")?;
        let level_count = self.descriptors.len();

        let mut names = Vec::with_capacity(level_count);
        for level in 0..level_count {
            let (coarse, fine) = self.setup_pair(level)?;
            self.setup_solver(level)?;
            let name = factory
                .name(coarse, fine)
                .ok_or_else(|| SetupError::NoViableMessenger {
                    coarse_model: coarse.name().to_string(),
                    fine_model: fine.name().to_string(),
                })?;
            names.push(name);
        }

        let mut messengers: IndexMap<String, Box<dyn Messenger>> = IndexMap::new();
        for (level, name) in names.iter().enumerate() {
            if messengers.contains_key(name) {
                continue;
            }
            let (coarse, fine) = self.setup_pair(level)?;
            let messenger = factory.create(name, coarse, fine, level).ok_or_else(|| {
                SetupError::NoViableMessenger {
                    coarse_model: coarse.name().to_string(),
                    fine_model: fine.name().to_string(),
                }
            })?;
            debug!(messenger = %name, level, "messenger created");
            messengers.insert(name.clone(), messenger);
        }

        let mut previous: Option<&str> = None;
        for (level, name) in names.iter().enumerate() {
            if previous == Some(name.as_str()) {
                continue;
            }
            previous = Some(name);

            let (coarse, fine) = self.setup_pair(level)?;
            let solver = self.setup_solver(level)?;
            let Some(messenger) = messengers.get_mut(name) else {
                continue;
            };
            register_quantities(messenger.as_mut(), coarse, fine, solver).map_err(|source| {
                SetupError::Collaborator {
                    name: name.clone(),
                    source,
                }
            })?;
            debug!(messenger = %name, level, "quantities wired");
        }

        for (level, name) in names.into_iter().enumerate() {
            self.descriptors.stamp_messenger(level, name);
        }
        info!(
            levels = level_count,
            messengers = messengers.len(),
            "messengers set up"
        );
        self.messengers = messengers;
        self.setup_closed = true;
        Ok(())
    }

    fn setup_model(&self, level: LevelNumber) -> Result<&dyn PhysicalModel, SetupError> {
        self.descriptors
            .get(level)
            .and_then(|d| d.model_index)
            .and_then(|i| self.models.get(i))
            .map(|m| m.as_ref())
            .ok_or(SetupError::UnassignedLevel {
                level,
                kind: Assignment::Model,
            })
    }

    fn setup_solver(&self, level: LevelNumber) -> Result<&dyn Solver, SetupError> {
        self.descriptors
            .get(level)
            .and_then(|d| d.solver_index)
            .and_then(|i| self.solvers.get(i))
            .map(|s| s.as_ref())
            .ok_or(SetupError::UnassignedLevel {
                level,
                kind: Assignment::Solver,
            })
    }

    /// (coarse, fine) models of the messenger of `level`.
    fn setup_pair(
        &self,
        level: LevelNumber,
    ) -> Result<(&dyn PhysicalModel, &dyn PhysicalModel), SetupError> {
        let coarse = self.setup_model(level.saturating_sub(1))?;
        let fine = self.setup_model(level)?;
        Ok((coarse, fine))
    }

    // ── Introspection ──────────────────────────────────────────────

    /// The configuration the integrator was built with.
    pub fn config(&self) -> &IntegratorConfig {
        &self.config
    }

    /// Number of levels the tables were sized for.
    pub fn level_count(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether messenger setup completed.
    pub fn is_setup_closed(&self) -> bool {
        self.setup_closed
    }

    /// Descriptor of `level`.
    pub fn level_descriptor(&self, level: LevelNumber) -> Option<&LevelDescriptor> {
        self.descriptors.get(level)
    }

    /// Lifecycle position of `level`.
    pub fn level_state(&self, level: LevelNumber) -> Option<LevelState> {
        self.descriptors.state(level)
    }

    /// Name of the model assigned to `level`.
    pub fn model_name(&self, level: LevelNumber) -> Option<&str> {
        self.setup_model(level).ok().map(|m| m.name())
    }

    /// Name of the solver assigned to `level`.
    pub fn solver_name(&self, level: LevelNumber) -> Option<&str> {
        self.setup_solver(level).ok().map(|s| s.name())
    }

    /// Name of the messenger between `level` and its next coarser level.
    pub fn messenger_name(&self, level: LevelNumber) -> Option<&str> {
        self.descriptors.messenger_name(level).ok()
    }

    /// The messenger registered under `name`.
    pub fn messenger(&self, name: &str) -> Option<&dyn Messenger> {
        self.messengers.get(name).map(|m| m.as_ref())
    }

    /// Number of distinct messengers.
    pub fn messenger_count(&self) -> usize {
        self.messengers.len()
    }

    /// Number of registered models.
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Number of registered solvers.
    pub fn solver_count(&self) -> usize {
        self.solvers.len()
    }

    /// Time `level` was last advanced to.
    pub fn last_new_time(&self, level: LevelNumber) -> Option<f64> {
        self.new_times.get(level).copied().flatten()
    }
}

impl std::fmt::Debug for MultiPhysicsIntegrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiPhysicsIntegrator")
            .field("config", &self.config)
            .field("descriptors", &self.descriptors)
            .field("messengers", &self.messengers.keys().collect::<Vec<_>>())
            .field("new_times", &self.new_times)
            .field("setup_closed", &self.setup_closed)
            .finish_non_exhaustive()
    }
}

// ── TagAndInitStrategy ─────────────────────────────────────────────

impl TagAndInitStrategy for MultiPhysicsIntegrator {
    fn initialize_level_data(
        &mut self,
        hierarchy: &dyn PatchHierarchy,
        level_number: LevelNumber,
        time: f64,
        old_level: Option<&dyn PatchLevel>,
        allocate_data: bool,
    ) -> Result<(), LifecycleError> {
        let model = pooled(
            &self.models,
            self.descriptors.model_index(level_number)?,
            level_number,
            Assignment::Model,
        )?;
        let solver = pooled(
            &self.solvers,
            self.descriptors.solver_index(level_number)?,
            level_number,
            Assignment::Solver,
        )?;
        let messenger = self
            .messengers
            .get_mut(self.descriptors.messenger_name(level_number)?)
            .ok_or(LifecycleError::MissingAssignment {
                level: level_number,
                kind: Assignment::Messenger,
            })?;
        let initializer = self.level_initializers.get_mut(model.name()).ok_or(
            LifecycleError::MissingAssignment {
                level: level_number,
                kind: Assignment::LevelInitializer,
            },
        )?;
        let level = hierarchy
            .level(level_number)
            .ok_or(LifecycleError::MissingLevel {
                level: level_number,
            })?;

        if allocate_data {
            for patch in level.patches() {
                model
                    .allocate(patch, time)
                    .map_err(|e| LifecycleError::collaborator(model.name(), e))?;
                solver
                    .allocate(model, patch, time)
                    .map_err(|e| LifecycleError::collaborator(solver.name(), e))?;
                messenger
                    .allocate(patch, time)
                    .map_err(|e| LifecycleError::collaborator(messenger.name(), e))?;
            }
        }

        messenger
            .register_level(hierarchy, level_number)
            .map_err(|e| LifecycleError::collaborator(messenger.name(), e))?;

        let is_regridding = old_level.is_some();
        initializer
            .initialize(
                hierarchy,
                level_number,
                old_level,
                model,
                messenger.as_ref(),
                time,
                is_regridding,
            )
            .map_err(|e| LifecycleError::collaborator(model.name(), e))?;

        self.descriptors
            .set_state(level_number, LevelState::DataInitialized);
        info!(level = level_number, time, is_regridding, "level data initialized");
        Ok(())
    }

    fn reset_hierarchy_configuration(
        &mut self,
        _hierarchy: &dyn PatchHierarchy,
        _coarsest: LevelNumber,
        _finest: LevelNumber,
    ) -> Result<(), LifecycleError> {
        Ok(())
    }

    fn apply_gradient_detector(
        &mut self,
        _hierarchy: &dyn PatchHierarchy,
        level_number: LevelNumber,
        time: f64,
        initial_time: bool,
    ) {
        trace!(level = level_number, time, initial_time, "gradient detector");
    }
}

// ── TimeRefinementLevelStrategy ────────────────────────────────────

impl TimeRefinementLevelStrategy for MultiPhysicsIntegrator {
    fn initialize_level_integrator(&mut self) -> Result<(), LifecycleError> {
        Ok(())
    }

    fn get_level_dt(&self, _level: &dyn PatchLevel, dt: f64, _initial_time: bool) -> f64 {
        dt
    }

    /// `coarse_dt / r² × finer_dt_safety`, `r` being the largest
    /// directional ratio.
    fn get_max_finer_level_dt(
        &self,
        _finer_level_number: LevelNumber,
        coarse_dt: f64,
        ratio: &[i32],
    ) -> f64 {
        let r = f64::from(ratio.iter().copied().max().unwrap_or(1).max(1));
        coarse_dt / (r * r) * self.config.finer_dt_safety
    }

    fn advance_level(
        &mut self,
        level: &dyn PatchLevel,
        hierarchy: &dyn PatchHierarchy,
        current_time: f64,
        new_time: f64,
        first_step: bool,
        last_step: bool,
        regrid_advance: bool,
    ) -> Result<f64, LifecycleError> {
        if regrid_advance {
            return Err(LifecycleError::UnsupportedOperation {
                operation: "advance_level with regrid_advance",
            });
        }
        let level_number = level.level_number();

        let solver = pooled(
            &self.solvers,
            self.descriptors.solver_index(level_number)?,
            level_number,
            Assignment::Solver,
        )?;
        let model = pooled(
            &self.models,
            self.descriptors.model_index(level_number)?,
            level_number,
            Assignment::Model,
        )?;
        let messenger = self
            .messengers
            .get_mut(self.descriptors.messenger_name(level_number)?)
            .ok_or(LifecycleError::MissingAssignment {
                level: level_number,
                kind: Assignment::Messenger,
            })?;
        if self
            .descriptors
            .state(level_number)
            .is_none_or(|s| s < LevelState::DataInitialized)
        {
            return Err(LifecycleError::LevelNotInitialized {
                level: level_number,
            });
        }

        let coarser_new_time = match level.next_coarser_level_number() {
            _ if !first_step => None,
            None => Some(new_time),
            Some(coarser) => Some(
                self.new_times
                    .get(coarser)
                    .copied()
                    .flatten()
                    .ok_or(LifecycleError::CoarserTimeUnknown {
                        level: level_number,
                        coarser,
                    })?,
            ),
        };

        if let Some(slot) = self.new_times.get_mut(level_number) {
            *slot = Some(new_time);
        }

        if let Some(coarser_time) = coarser_new_time {
            messenger
                .first_step(model, level, hierarchy, current_time, coarser_time)
                .map_err(|e| LifecycleError::collaborator(messenger.name(), e))?;
        }

        messenger
            .prepare_step(model, level)
            .map_err(|e| LifecycleError::collaborator(messenger.name(), e))?;

        let root_time = self.new_times.first().copied().flatten();
        if !first_step && level_number > 0 && root_time != Some(current_time) {
            dump_fine_level(&self.functors, level_number, current_time);
        }

        debug!(
            level = level_number,
            dt = new_time - current_time,
            first_step,
            last_step,
            "advancing level"
        );
        solver
            .advance_level(
                hierarchy,
                level_number,
                model,
                messenger.as_ref(),
                current_time,
                new_time,
            )
            .map_err(|e| LifecycleError::collaborator(solver.name(), e))?;

        if last_step {
            messenger
                .last_step(model, level)
                .map_err(|e| LifecycleError::collaborator(messenger.name(), e))?;
        }

        self.descriptors
            .set_state(level_number, LevelState::Advancing);
        Ok(new_time)
    }

    fn standard_level_synchronization(
        &mut self,
        hierarchy: &dyn PatchHierarchy,
        coarsest: LevelNumber,
        finest: LevelNumber,
        sync_time: f64,
        _old_times: &[f64],
    ) -> Result<(), LifecycleError> {
        let fine = hierarchy
            .level(finest)
            .ok_or(LifecycleError::MissingLevel { level: finest })?;
        let messenger = self
            .messengers
            .get_mut(self.descriptors.messenger_name(finest)?)
            .ok_or(LifecycleError::MissingAssignment {
                level: finest,
                kind: Assignment::Messenger,
            })?;
        debug!(coarsest, finest, sync_time, "synchronizing levels");
        messenger
            .synchronize(fine)
            .map_err(|e| LifecycleError::collaborator(messenger.name(), e))
    }

    fn synchronize_new_levels(
        &mut self,
        _hierarchy: &dyn PatchHierarchy,
        _coarsest: LevelNumber,
        _finest: LevelNumber,
        _sync_time: f64,
        _initial_time: bool,
    ) -> Result<(), LifecycleError> {
        Ok(())
    }

    fn reset_time_dependent_data(
        &mut self,
        _level: &dyn PatchLevel,
        _new_time: f64,
        _can_be_refined: bool,
    ) {
    }

    fn reset_data_to_preadvance_state(&mut self, _level: &dyn PatchLevel) {}

    fn using_refined_timestepping(&self) -> bool {
        true
    }
}
