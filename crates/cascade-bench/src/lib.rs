//! Benchmark profiles and utilities for the Cascade integrator.
//!
//! - [`reference_profile`]: one hybrid model on every level, wired
//!   through refiner-pool messengers whose schedules do no work
//! - [`advance_hierarchy`]: one recursive subcycled step from a level
//!   down to the finest level
//! - [`field_names`], [`field_lookup`]: deterministic quantities

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::error::Error;
use std::sync::Arc;

use cascade_core::{
    CollaboratorError, LevelNumber, LifecycleError, Patch, PatchHierarchy, PatchLevel,
    ScheduleError, VecFieldDescriptor,
};
use cascade_integrator::{
    GhostQuantity, IntegratorConfig, Messenger, MessengerInfo, MultiPhysicsIntegrator,
    PhysicalModel, RefinerMessengerFactory, SimFunctors, Solver, StandardLevelInitializerFactory,
    TagAndInitStrategy, TimeRefinementLevelStrategy,
};
use cascade_refine::{
    LinearTimeInterpolate, RefineAlgorithm, RefineSchedule, ScheduleCompiler, ScheduleRequest,
};
use cascade_test_utils::{MapResourceLookup, MockHierarchy, NamedRefineOperator};

/// Refinement ratio between adjacent levels of every profile.
pub const RATIO: i32 = 2;

// ── Collaborators ──────────────────────────────────────────────────

/// Compiles schedules that complete immediately, leaving only the
/// integrator and pool overhead to measure.
#[derive(Debug, Default)]
pub struct NoopScheduleCompiler;

struct NoopSchedule;

impl RefineSchedule for NoopSchedule {
    fn fill_data(&self, _time: f64) -> Result<(), ScheduleError> {
        Ok(())
    }
}

impl ScheduleCompiler for NoopScheduleCompiler {
    fn compile(
        &self,
        _algorithm: &RefineAlgorithm,
        _hierarchy: &dyn PatchHierarchy,
        _request: &ScheduleRequest<'_>,
    ) -> Result<Box<dyn RefineSchedule>, ScheduleError> {
        Ok(Box::new(NoopSchedule))
    }
}

/// A model exchanging a fixed set of vector quantities.
pub struct BenchModel {
    fields: Vec<String>,
}

impl PhysicalModel for BenchModel {
    fn name(&self) -> &str {
        "Hybrid"
    }

    fn allocate(&self, _patch: &dyn Patch, _time: f64) -> Result<(), CollaboratorError> {
        Ok(())
    }

    fn initialize_level(
        &self,
        _level: &dyn PatchLevel,
        _time: f64,
    ) -> Result<(), CollaboratorError> {
        Ok(())
    }

    fn fill_messenger_info(&self, info: &mut MessengerInfo) {
        for f in &self.fields {
            info.ghost_quantities.push(GhostQuantity::from_model_name(f));
            info.init_quantities.push(VecFieldDescriptor::new(f));
            info.sync_quantities.push(VecFieldDescriptor::new(f));
        }
    }
}

/// A solver that fills the ghosts of every quantity once per advance.
pub struct BenchSolver {
    fields: Vec<VecFieldDescriptor>,
}

impl Solver for BenchSolver {
    fn name(&self) -> &str {
        "HybridSolver"
    }

    fn model_name(&self) -> &str {
        "Hybrid"
    }

    fn allocate(
        &self,
        _model: &dyn PhysicalModel,
        _patch: &dyn Patch,
        _time: f64,
    ) -> Result<(), CollaboratorError> {
        Ok(())
    }

    fn register_resources(&self, _model: &dyn PhysicalModel) -> Result<(), CollaboratorError> {
        Ok(())
    }

    fn advance_level(
        &self,
        _hierarchy: &dyn PatchHierarchy,
        level_number: LevelNumber,
        _model: &dyn PhysicalModel,
        messenger: &dyn Messenger,
        _current_time: f64,
        new_time: f64,
    ) -> Result<(), CollaboratorError> {
        for f in &self.fields {
            messenger.fill_ghosts(f, level_number, new_time)?;
        }
        Ok(())
    }
}

// ── Profiles ───────────────────────────────────────────────────────

/// `count` quantity names: `F0`, `F1`, ...
pub fn field_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("F{i}")).collect()
}

/// Resources for every component of every field and of its ghost and
/// old copies.
pub fn field_lookup(fields: &[String]) -> MapResourceLookup {
    let mut names = Vec::with_capacity(fields.len() * 3);
    for f in fields {
        names.push(f.clone());
        names.push(format!("{f}_ghost"));
        names.push(format!("{f}_old"));
    }
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    MapResourceLookup::with_vectors(&refs)
}

/// A fully initialized integrator and the hierarchy it runs on.
pub struct Profile {
    /// The integrator, with setup closed and every level initialized.
    pub integrator: MultiPhysicsIntegrator,
    /// Uniform hierarchy refined by [`RATIO`].
    pub hierarchy: MockHierarchy,
}

/// Build and initialize a profile of `level_count` levels with
/// `patches_per_level` patches each and `field_count` exchanged fields.
pub fn reference_profile(
    level_count: usize,
    patches_per_level: u32,
    field_count: usize,
) -> Result<Profile, Box<dyn Error>> {
    let fields = field_names(field_count);
    let factory = RefinerMessengerFactory::new(
        Arc::new(NoopScheduleCompiler),
        Arc::new(field_lookup(&fields)),
        Arc::new(NamedRefineOperator::new("conservative")),
        Arc::new(LinearTimeInterpolate),
    )
    .with_pair("Hybrid", "Hybrid");

    let mut integrator = MultiPhysicsIntegrator::new(
        IntegratorConfig::new(level_count),
        Box::new(StandardLevelInitializerFactory::new().with_model("Hybrid")),
        SimFunctors::new(),
    )?;
    let finest = level_count.saturating_sub(1);
    let solver = BenchSolver {
        fields: fields.iter().map(VecFieldDescriptor::new).collect(),
    };
    integrator.register_model(0, finest, Arc::new(BenchModel { fields }))?;
    integrator.register_and_init_solver(0, finest, Arc::new(solver))?;
    integrator.register_and_setup_messengers(&factory)?;

    let hierarchy = MockHierarchy::uniform(level_count, RATIO, patches_per_level);
    for level in 0..level_count {
        integrator.initialize_level_data(&hierarchy, level, 0.0, None, true)?;
    }
    Ok(Profile {
        integrator,
        hierarchy,
    })
}

// ── Subcycling ─────────────────────────────────────────────────────

/// Advance `level` from `time` by `dt`, then take [`RATIO`] substeps on
/// every finer level, recursively.
pub fn advance_hierarchy(
    profile: &mut Profile,
    level: LevelNumber,
    time: f64,
    dt: f64,
    first_step: bool,
    last_step: bool,
) -> Result<(), LifecycleError> {
    profile.integrator.advance_level(
        profile.hierarchy.mock_level(level),
        &profile.hierarchy,
        time,
        time + dt,
        first_step,
        last_step,
        false,
    )?;

    if level + 1 < profile.hierarchy.number_of_levels() {
        let fine_dt = dt / f64::from(RATIO);
        for step in 0..RATIO {
            let t = time + f64::from(step) * fine_dt;
            advance_hierarchy(profile, level + 1, t, fine_dt, step == 0, step == RATIO - 1)?;
        }
    }
    Ok(())
}

/// Synchronize every level pair from the finest upwards at `time`.
pub fn synchronize_hierarchy(profile: &mut Profile, time: f64) -> Result<(), LifecycleError> {
    let finest = profile.hierarchy.number_of_levels().saturating_sub(1);
    let old_times = vec![time; finest + 1];
    profile.integrator.standard_level_synchronization(
        &profile.hierarchy,
        0,
        finest,
        time,
        &old_times,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_profile_initializes_every_level() {
        let p = reference_profile(3, 2, 2).unwrap();
        assert_eq!(p.integrator.level_count(), 3);
        assert_eq!(p.integrator.messenger_count(), 1);
        assert!(p.integrator.is_setup_closed());
    }

    #[test]
    fn subcycled_step_reaches_the_same_time_on_every_level() {
        let mut p = reference_profile(3, 1, 1).unwrap();
        advance_hierarchy(&mut p, 0, 0.0, 1.0, true, true).unwrap();
        for level in 0..3 {
            assert_eq!(p.integrator.last_new_time(level), Some(1.0));
        }
        synchronize_hierarchy(&mut p, 1.0).unwrap();
    }

    #[test]
    fn field_names_are_deterministic() {
        assert_eq!(field_names(3), vec!["F0", "F1", "F2"]);
        let lookup = field_lookup(&field_names(1));
        assert!(cascade_core::ResourceLookup::id(&lookup, "F0_old_z").is_some());
    }
}
