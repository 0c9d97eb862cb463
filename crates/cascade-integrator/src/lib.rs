//! Multi-physics, multi-level subcycling integrator.
//!
//! [`MultiPhysicsIntegrator`] decides which [`PhysicalModel`], [`Solver`]
//! and [`Messenger`] apply to each level of an adaptive hierarchy, and
//! implements the callbacks the hierarchy driver invokes to initialize,
//! advance and synchronize levels.
//!
//! # Setup order
//!
//! 1. [`register_model`](MultiPhysicsIntegrator::register_model) for
//!    every level range.
//! 2. [`register_and_init_solver`](MultiPhysicsIntegrator::register_and_init_solver)
//!    for every level range.
//! 3. [`register_and_setup_messengers`](MultiPhysicsIntegrator::register_and_setup_messengers)
//!    once. This closes setup.
//!
//! Only then may the driver call the [`TagAndInitStrategy`] and
//! [`TimeRefinementLevelStrategy`] hooks.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod descriptor;
pub mod functors;
pub mod integrator;
pub mod level_initializer;
pub mod messenger;
pub mod model;
pub mod solver;
pub mod strategy;

pub use config::{ConfigError, IntegratorConfig};
pub use descriptor::{LevelDescriptor, LevelState};
pub use functors::{FunctorValue, SimFunctor, SimFunctorParams, SimFunctors};
pub use integrator::MultiPhysicsIntegrator;
pub use level_initializer::{
    LevelInitializer, LevelInitializerFactory, StandardLevelInitializer,
    StandardLevelInitializerFactory,
};
pub use messenger::{
    register_quantities, GhostQuantity, Messenger, MessengerFactory, MessengerInfo,
    RefinerMessenger, RefinerMessengerFactory, TimeWindow,
};
pub use model::PhysicalModel;
pub use solver::{are_compatible, Solver};
pub use strategy::{TagAndInitStrategy, TimeRefinementLevelStrategy};
