//! Recording collaborators.
//!
//! Each fixture appends one entry per call to a shared [`CallLog`], in
//! the form `"{name}.{operation}({args})"`, so tests can assert on the
//! exact order in which the integrator drives its collaborators.
//!
//! - [`RecordingModel`], [`RecordingSolver`]: shared physics collaborators.
//! - [`RecordingMessenger`] and [`RecordingMessengerFactory`].
//! - [`RecordingLevelInitializer`] and its factory.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cascade_core::{
    CollaboratorError, LevelNumber, Patch, PatchHierarchy, PatchLevel, Quantity, VecFieldDescriptor,
};
use cascade_integrator::{
    LevelInitializer, LevelInitializerFactory, Messenger, MessengerFactory, MessengerInfo,
    PhysicalModel, Solver,
};

use crate::CallLog;

// ── Models and solvers ─────────────────────────────────────────────

/// A model that declares a fixed [`MessengerInfo`].
pub struct RecordingModel {
    pub name: String,
    pub info: MessengerInfo,
    log: CallLog,
}

impl RecordingModel {
    pub fn new(name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            info: MessengerInfo::default(),
            log: log.clone(),
        }
    }

    pub fn with_info(mut self, info: MessengerInfo) -> Self {
        self.info = info;
        self
    }
}

impl PhysicalModel for RecordingModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn allocate(&self, patch: &dyn Patch, time: f64) -> Result<(), CollaboratorError> {
        self.log
            .push(format!("{}.allocate({}, {time})", self.name, patch.id()));
        Ok(())
    }

    fn initialize_level(&self, level: &dyn PatchLevel, time: f64) -> Result<(), CollaboratorError> {
        self.log.push(format!(
            "{}.initialize_level({}, {time})",
            self.name,
            level.level_number()
        ));
        Ok(())
    }

    fn fill_messenger_info(&self, info: &mut MessengerInfo) {
        self.log.push(format!("{}.fill_messenger_info()", self.name));
        info.ghost_quantities
            .extend(self.info.ghost_quantities.iter().cloned());
        info.init_quantities
            .extend(self.info.init_quantities.iter().cloned());
        info.sync_quantities
            .extend(self.info.sync_quantities.iter().cloned());
    }
}

/// A solver that fills the ghosts of `ghost_fills` on every advance.
pub struct RecordingSolver {
    pub name: String,
    pub model_name: String,
    pub ghost_fills: Vec<VecFieldDescriptor>,
    log: CallLog,
    fail_resources: bool,
}

impl RecordingSolver {
    pub fn new(name: impl Into<String>, model_name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            model_name: model_name.into(),
            ghost_fills: Vec::new(),
            log: log.clone(),
            fail_resources: false,
        }
    }

    pub fn filling(mut self, quantity: VecFieldDescriptor) -> Self {
        self.ghost_fills.push(quantity);
        self
    }

    /// `register_resources` fails.
    pub fn failing_resources(mut self) -> Self {
        self.fail_resources = true;
        self
    }
}

impl Solver for RecordingSolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn allocate(
        &self,
        _model: &dyn PhysicalModel,
        patch: &dyn Patch,
        time: f64,
    ) -> Result<(), CollaboratorError> {
        self.log
            .push(format!("{}.allocate({}, {time})", self.name, patch.id()));
        Ok(())
    }

    fn register_resources(&self, model: &dyn PhysicalModel) -> Result<(), CollaboratorError> {
        self.log
            .push(format!("{}.register_resources({})", self.name, model.name()));
        if self.fail_resources {
            return Err(CollaboratorError::ExecutionFailed {
                reason: "resources unavailable".into(),
            });
        }
        Ok(())
    }

    fn advance_level(
        &self,
        _hierarchy: &dyn PatchHierarchy,
        level_number: LevelNumber,
        _model: &dyn PhysicalModel,
        messenger: &dyn Messenger,
        current_time: f64,
        new_time: f64,
    ) -> Result<(), CollaboratorError> {
        self.log.push(format!(
            "{}.advance_level({level_number}, {current_time}, {new_time})",
            self.name
        ));
        for quantity in &self.ghost_fills {
            messenger.fill_ghosts(quantity, level_number, new_time)?;
        }
        Ok(())
    }
}

// ── Messengers ─────────────────────────────────────────────────────

/// A messenger that only records its calls.
pub struct RecordingMessenger {
    pub name: String,
    log: CallLog,
}

impl RecordingMessenger {
    pub fn new(name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
        }
    }
}

impl Messenger for RecordingMessenger {
    fn name(&self) -> &str {
        &self.name
    }

    fn allocate(&self, patch: &dyn Patch, time: f64) -> Result<(), CollaboratorError> {
        self.log
            .push(format!("{}.allocate({}, {time})", self.name, patch.id()));
        Ok(())
    }

    fn register_quantities(
        &mut self,
        from_coarser: MessengerInfo,
        from_finer: MessengerInfo,
    ) -> Result<(), CollaboratorError> {
        self.log.push(format!(
            "{}.register_quantities({}, {})",
            self.name,
            from_coarser.ghost_quantities.len(),
            from_finer.ghost_quantities.len()
        ));
        Ok(())
    }

    fn register_level(
        &mut self,
        _hierarchy: &dyn PatchHierarchy,
        level_number: LevelNumber,
    ) -> Result<(), CollaboratorError> {
        self.log
            .push(format!("{}.register_level({level_number})", self.name));
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
        self.log.push(format!(
            "{}.first_step({}, {current_time}, {coarser_new_time})",
            self.name,
            level.level_number()
        ));
        Ok(())
    }

    fn prepare_step(
        &mut self,
        _model: &dyn PhysicalModel,
        level: &dyn PatchLevel,
    ) -> Result<(), CollaboratorError> {
        self.log.push(format!(
            "{}.prepare_step({})",
            self.name,
            level.level_number()
        ));
        Ok(())
    }

    fn last_step(
        &mut self,
        _model: &dyn PhysicalModel,
        level: &dyn PatchLevel,
    ) -> Result<(), CollaboratorError> {
        self.log
            .push(format!("{}.last_step({})", self.name, level.level_number()));
        Ok(())
    }

    fn synchronize(&mut self, level: &dyn PatchLevel) -> Result<(), CollaboratorError> {
        self.log.push(format!(
            "{}.synchronize({})",
            self.name,
            level.level_number()
        ));
        Ok(())
    }

    fn fill_ghosts(
        &self,
        quantity: &dyn Quantity,
        level_number: LevelNumber,
        time: f64,
    ) -> Result<(), CollaboratorError> {
        self.log.push(format!(
            "{}.fill_ghosts({}, {level_number}, {time})",
            self.name,
            quantity.name()
        ));
        Ok(())
    }

    fn initialize_level(
        &self,
        _hierarchy: &dyn PatchHierarchy,
        level_number: LevelNumber,
        time: f64,
    ) -> Result<(), CollaboratorError> {
        self.log.push(format!(
            "{}.initialize_level({level_number}, {time})",
            self.name
        ));
        Ok(())
    }
}

/// Names the messenger of a pairing `"{coarse}-{fine}"` and builds
/// [`RecordingMessenger`]s.
pub struct RecordingMessengerFactory {
    log: CallLog,
    refused: Vec<(String, String)>,
    created: AtomicUsize,
}

impl RecordingMessengerFactory {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            refused: Vec::new(),
            created: AtomicUsize::new(0),
        }
    }

    /// Return no messenger for the pairing `(coarse, fine)`.
    pub fn refusing(mut self, coarse: impl Into<String>, fine: impl Into<String>) -> Self {
        self.refused.push((coarse.into(), fine.into()));
        self
    }

    /// Number of messengers created so far.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}

impl MessengerFactory for RecordingMessengerFactory {
    fn name(&self, coarse: &dyn PhysicalModel, fine: &dyn PhysicalModel) -> Option<String> {
        let refused = self
            .refused
            .iter()
            .any(|(c, f)| c == coarse.name() && f == fine.name());
        (!refused).then(|| format!("{}-{}", coarse.name(), fine.name()))
    }

    fn create(
        &self,
        name: &str,
        _coarse: &dyn PhysicalModel,
        _fine: &dyn PhysicalModel,
        level_number: LevelNumber,
    ) -> Option<Box<dyn Messenger>> {
        self.created.fetch_add(1, Ordering::Relaxed);
        self.log
            .push(format!("factory.create({name}, {level_number})"));
        Some(Box::new(RecordingMessenger::new(name, &self.log)))
    }
}

// ── Level initializers ─────────────────────────────────────────────

/// A level initializer that only records its calls.
pub struct RecordingLevelInitializer {
    model_name: String,
    log: CallLog,
}

impl LevelInitializer for RecordingLevelInitializer {
    fn initialize(
        &mut self,
        _hierarchy: &dyn PatchHierarchy,
        level_number: LevelNumber,
        old_level: Option<&dyn PatchLevel>,
        _model: &dyn PhysicalModel,
        _messenger: &dyn Messenger,
        time: f64,
        is_regridding: bool,
    ) -> Result<(), CollaboratorError> {
        self.log.push(format!(
            "{}-initializer.initialize({level_number}, {time}, old={}, regrid={is_regridding})",
            self.model_name,
            old_level.is_some()
        ));
        Ok(())
    }
}

/// Creates a [`RecordingLevelInitializer`] for every model type except
/// those listed as unknown.
pub struct RecordingLevelInitializerFactory {
    log: CallLog,
    unknown: Vec<String>,
    created: Arc<AtomicUsize>,
}

impl RecordingLevelInitializerFactory {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            unknown: Vec::new(),
            created: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Return no initializer for `model_name`.
    pub fn without(mut self, model_name: impl Into<String>) -> Self {
        self.unknown.push(model_name.into());
        self
    }

    /// Shared counter of created initializers.
    pub fn created_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.created)
    }
}

impl LevelInitializerFactory for RecordingLevelInitializerFactory {
    fn create(&self, model_name: &str) -> Option<Box<dyn LevelInitializer>> {
        if self.unknown.iter().any(|n| n == model_name) {
            return None;
        }
        self.created.fetch_add(1, Ordering::Relaxed);
        Some(Box::new(RecordingLevelInitializer {
            model_name: model_name.to_string(),
            log: self.log.clone(),
        }))
    }
}
