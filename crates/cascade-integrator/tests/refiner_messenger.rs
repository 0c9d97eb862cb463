//! End-to-end tests of the integrator driving refiner-pool messengers.

use std::sync::Arc;

use cascade_core::{CollaboratorError, Component, LifecycleError, ScheduleError, VecFieldDescriptor};
use cascade_integrator::{
    GhostQuantity, IntegratorConfig, Messenger, MessengerInfo, MultiPhysicsIntegrator,
    RefinerMessenger, RefinerMessengerFactory, SimFunctors, StandardLevelInitializerFactory,
    TagAndInitStrategy, TimeRefinementLevelStrategy,
};
use cascade_refine::{LinearTimeInterpolate, ScheduleKind};
use cascade_test_utils::fixtures::{RecordingModel, RecordingSolver};
use cascade_test_utils::{
    CallLog, CountingScheduleCompiler, MapResourceLookup, MockHierarchy, NamedRefineOperator,
};

struct Scenario {
    integrator: MultiPhysicsIntegrator,
    compiler: CountingScheduleCompiler,
    hierarchy: MockHierarchy,
}

fn hybrid_info() -> MessengerInfo {
    MessengerInfo {
        ghost_quantities: vec![GhostQuantity::from_model_name("EM_B")],
        init_quantities: vec![VecFieldDescriptor::new("EM_B")],
        sync_quantities: vec![VecFieldDescriptor::new("EM_B")],
    }
}

fn scenario(lookup: MapResourceLookup, solver: RecordingSolver, log: &CallLog) -> Scenario {
    let compiler = CountingScheduleCompiler::new();
    let factory = RefinerMessengerFactory::new(
        Arc::new(compiler.clone()),
        Arc::new(lookup),
        Arc::new(NamedRefineOperator::new("conservative")),
        Arc::new(LinearTimeInterpolate),
    )
    .with_pair("Hybrid", "Hybrid");

    let mut integrator = MultiPhysicsIntegrator::new(
        IntegratorConfig::new(2),
        Box::new(StandardLevelInitializerFactory::new().with_model("Hybrid")),
        SimFunctors::new(),
    )
    .unwrap();
    integrator
        .register_model(
            0,
            1,
            Arc::new(RecordingModel::new("Hybrid", log).with_info(hybrid_info())),
        )
        .unwrap();
    integrator
        .register_and_init_solver(0, 1, Arc::new(solver))
        .unwrap();
    integrator.register_and_setup_messengers(&factory).unwrap();

    Scenario {
        integrator,
        compiler,
        hierarchy: MockHierarchy::uniform(2, 2, 2),
    }
}

fn full_lookup() -> MapResourceLookup {
    MapResourceLookup::with_vectors(&["EM_B", "EM_B_ghost", "EM_B_old"])
}

#[test]
fn level_initialization_compiles_ghost_and_init_schedules() {
    let log = CallLog::new();
    let mut s = scenario(
        full_lookup(),
        RecordingSolver::new("HybridSolver", "Hybrid", &log),
        &log,
    );
    s.integrator
        .initialize_level_data(&s.hierarchy, 0, 0.0, None, true)
        .unwrap();
    s.integrator
        .initialize_level_data(&s.hierarchy, 1, 0.0, None, true)
        .unwrap();

    let kinds: Vec<_> = s
        .compiler
        .compiles()
        .into_iter()
        .map(|c| (c.level, c.kind, c.coarser, c.components))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (0, ScheduleKind::Ghost, None, 3),
            (0, ScheduleKind::Init, None, 3),
            (1, ScheduleKind::Ghost, Some(0), 3),
            (1, ScheduleKind::Init, None, 3),
            (1, ScheduleKind::Fresh, Some(0), 3),
        ]
    );
    // root from initial conditions, level 1 from a fresh fill
    assert_eq!(
        log.matching("initialize_level"),
        vec!["Hybrid.initialize_level(0, 0)"]
    );
    let fills = s.compiler.fills();
    assert_eq!(fills.len(), 1);
    assert_eq!(fills[0].kind, ScheduleKind::Fresh);
}

#[test]
fn solver_ghost_fill_runs_cached_schedule_once() {
    let log = CallLog::new();
    let solver = RecordingSolver::new("HybridSolver", "Hybrid", &log)
        .filling(VecFieldDescriptor::new("EM_B"));
    let mut s = scenario(full_lookup(), solver, &log);
    for level in 0..2 {
        s.integrator
            .initialize_level_data(&s.hierarchy, level, 0.0, None, true)
            .unwrap();
    }
    let fills_before = s.compiler.fill_count();
    let compiles_before = s.compiler.compile_count();

    s.integrator
        .advance_level(s.hierarchy.mock_level(0), &s.hierarchy, 0.0, 1.0, true, true, false)
        .unwrap();
    s.integrator
        .advance_level(s.hierarchy.mock_level(1), &s.hierarchy, 0.0, 0.5, true, false, false)
        .unwrap();

    let fills = s.compiler.fills();
    let new: Vec<_> = fills[fills_before..]
        .iter()
        .map(|f| (f.quantity.as_str(), f.level, f.kind, f.time))
        .collect();
    assert_eq!(
        new,
        vec![
            ("EM_B", 0, ScheduleKind::Ghost, 1.0),
            ("EM_B", 1, ScheduleKind::Ghost, 0.5),
        ]
    );
    assert_eq!(s.compiler.compile_count(), compiles_before);

    let messenger = s.integrator.messenger("Hybrid-Hybrid").unwrap();
    assert_eq!(messenger.name(), "Hybrid-Hybrid");
}

#[test]
fn uninitialized_fine_level_cannot_advance() {
    let log = CallLog::new();
    let solver = RecordingSolver::new("HybridSolver", "Hybrid", &log)
        .filling(VecFieldDescriptor::new("EM_B"));
    let mut s = scenario(full_lookup(), solver, &log);
    s.integrator
        .initialize_level_data(&s.hierarchy, 0, 0.0, None, true)
        .unwrap();
    s.integrator
        .advance_level(s.hierarchy.mock_level(0), &s.hierarchy, 0.0, 1.0, true, true, false)
        .unwrap();

    let err = s
        .integrator
        .advance_level(s.hierarchy.mock_level(1), &s.hierarchy, 0.0, 0.5, true, false, false)
        .unwrap_err();
    assert_eq!(err, LifecycleError::LevelNotInitialized { level: 1 });
}

#[test]
fn unknown_quantity_fill_reports_missing_schedule() {
    let log = CallLog::new();
    let solver = RecordingSolver::new("HybridSolver", "Hybrid", &log)
        .filling(VecFieldDescriptor::new("EM_E"));
    let mut s = scenario(full_lookup(), solver, &log);
    s.integrator
        .initialize_level_data(&s.hierarchy, 0, 0.0, None, true)
        .unwrap();

    let err = s
        .integrator
        .advance_level(s.hierarchy.mock_level(0), &s.hierarchy, 0.0, 1.0, true, true, false)
        .unwrap_err();
    assert_eq!(
        err,
        LifecycleError::Collaborator {
            name: "HybridSolver".into(),
            source: CollaboratorError::Schedule(ScheduleError::MissingSchedule {
                quantity: "EM_E".into(),
                level: 0
            })
        }
    );
}

#[test]
fn only_x_resolves_registers_one_component() {
    let log = CallLog::new();
    let lookup = MapResourceLookup::with_names(&["EM_B_x", "EM_B_ghost_x", "EM_B_old_x"]);
    let mut s = scenario(
        lookup,
        RecordingSolver::new("HybridSolver", "Hybrid", &log),
        &log,
    );
    s.integrator
        .initialize_level_data(&s.hierarchy, 0, 0.0, None, true)
        .unwrap();

    assert!(s.compiler.compiles().iter().all(|c| c.components == 1));
}

#[test]
fn refiner_messenger_pools_follow_resolved_components() {
    let mut m = RefinerMessenger::new(
        "Hybrid-Hybrid",
        Arc::new(CountingScheduleCompiler::new()),
        Arc::new(MapResourceLookup::with_names(&[
            "EM_B_x",
            "EM_B_ghost_x",
            "EM_B_old_x",
        ])),
        Arc::new(NamedRefineOperator::new("conservative")),
        Arc::new(LinearTimeInterpolate),
    );
    m.register_quantities(MessengerInfo::default(), hybrid_info())
        .unwrap();

    let ghost = m.ghost_pool().refiner("EM_B").unwrap().algorithm();
    assert_eq!(ghost.len(), 1);
    assert!(ghost.item(Component::X).is_some());
    assert!(ghost.is_time_interpolated());
    let init = m.init_pool().refiner("EM_B").unwrap().algorithm();
    assert_eq!(init.len(), 1);
    assert!(!init.is_time_interpolated());
}

#[test]
fn synchronization_reaches_refiner_messenger() {
    let log = CallLog::new();
    let mut s = scenario(
        full_lookup(),
        RecordingSolver::new("HybridSolver", "Hybrid", &log),
        &log,
    );
    let err = s
        .integrator
        .standard_level_synchronization(&s.hierarchy, 0, 1, 1.0, &[0.0, 0.5])
        .unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Collaborator {
            source: CollaboratorError::ExecutionFailed { .. },
            ..
        }
    ));

    for level in 0..2 {
        s.integrator
            .initialize_level_data(&s.hierarchy, level, 0.0, None, true)
            .unwrap();
    }
    let fills = s.compiler.fill_count();
    s.integrator
        .standard_level_synchronization(&s.hierarchy, 0, 1, 1.0, &[0.0, 0.5])
        .unwrap();
    assert_eq!(s.compiler.fill_count(), fills);
}
