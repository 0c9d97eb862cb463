//! First-time population of a level.
//!
//! A [`LevelInitializer`] fills a level that was just created: the root
//! level at start-up, a finer level added by the driver, or any level
//! rebuilt by a regrid. The integrator keeps one initializer per model
//! type, built by a [`LevelInitializerFactory`].

use cascade_core::{CollaboratorError, LevelNumber, PatchHierarchy, PatchLevel};
use tracing::debug;

use crate::messenger::Messenger;
use crate::model::PhysicalModel;

/// Populates newly created levels of one model type.
pub trait LevelInitializer: Send {
    /// Populate `level_number`.
    ///
    /// `old_level` is the level being replaced when regridding.
    #[allow(clippy::too_many_arguments)]
    fn initialize(
        &mut self,
        hierarchy: &dyn PatchHierarchy,
        level_number: LevelNumber,
        old_level: Option<&dyn PatchLevel>,
        model: &dyn PhysicalModel,
        messenger: &dyn Messenger,
        time: f64,
        is_regridding: bool,
    ) -> Result<(), CollaboratorError>;
}

/// Builds the [`LevelInitializer`] of a model type.
pub trait LevelInitializerFactory: Send {
    /// The initializer for `model_name`, `None` if the type is unknown.
    fn create(&self, model_name: &str) -> Option<Box<dyn LevelInitializer>>;
}

// ── Standard implementation ────────────────────────────────────────

/// Root level from the model's initial conditions, every other level
/// (and a regridded root) by refining coarser data through the
/// messenger.
#[derive(Debug, Default)]
pub struct StandardLevelInitializer {
    initialized: usize,
}

impl StandardLevelInitializer {
    /// A fresh initializer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of levels populated so far.
    pub fn initialized_count(&self) -> usize {
        self.initialized
    }
}

impl LevelInitializer for StandardLevelInitializer {
    fn initialize(
        &mut self,
        hierarchy: &dyn PatchHierarchy,
        level_number: LevelNumber,
        _old_level: Option<&dyn PatchLevel>,
        model: &dyn PhysicalModel,
        messenger: &dyn Messenger,
        time: f64,
        is_regridding: bool,
    ) -> Result<(), CollaboratorError> {
        if level_number == 0 && !is_regridding {
            let level = hierarchy.level(level_number).ok_or_else(|| {
                CollaboratorError::ExecutionFailed {
                    reason: format!("hierarchy has no level {level_number}"),
                }
            })?;
            model.initialize_level(level, time)?;
        } else {
            messenger.initialize_level(hierarchy, level_number, time)?;
        }
        self.initialized += 1;
        debug!(
            level = level_number,
            model = model.name(),
            is_regridding,
            "level populated"
        );
        Ok(())
    }
}

/// Builds a [`StandardLevelInitializer`] for each model type it knows.
#[derive(Clone, Debug, Default)]
pub struct StandardLevelInitializerFactory {
    model_names: Vec<String>,
}

impl StandardLevelInitializerFactory {
    /// A factory that knows no model type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `model_name`.
    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_names.push(model_name.into());
        self
    }
}

impl LevelInitializerFactory for StandardLevelInitializerFactory {
    fn create(&self, model_name: &str) -> Option<Box<dyn LevelInitializer>> {
        self.model_names
            .iter()
            .any(|n| n == model_name)
            .then(|| Box::new(StandardLevelInitializer::new()) as Box<dyn LevelInitializer>)
    }
}
