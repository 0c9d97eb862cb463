//! Cascade: multi-physics, multi-level time integration for adaptive
//! mesh refinement.
//!
//! This is the top-level facade crate that re-exports the public API of
//! the Cascade sub-crates. For most users, adding `cascade` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use cascade::prelude::*;
//!
//! let integrator = MultiPhysicsIntegrator::new(
//!     IntegratorConfig::new(3),
//!     Box::new(StandardLevelInitializerFactory::new().with_model("Hybrid")),
//!     SimFunctors::new(),
//! )
//! .unwrap();
//!
//! assert_eq!(integrator.level_count(), 3);
//! assert_eq!(integrator.level_state(0), Some(LevelState::Unregistered));
//! assert!(!integrator.is_setup_closed());
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `cascade-core` | IDs, hierarchy traits, field descriptors, errors |
//! | [`refine`] | `cascade-refine` | Refine templates, schedule caches, refiner pools |
//! | [`integrator`] | `cascade-integrator` | Level table, collaborator traits, integrator |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, hierarchy traits and errors (`cascade-core`).
pub use cascade_core as types;

/// Refine templates and refiner pools (`cascade-refine`).
///
/// [`refine::RefinerPool`] owns the [`refine::QuantityRefiner`]s of one
/// messenger; schedules are compiled by a transport-supplied
/// [`refine::ScheduleCompiler`].
pub use cascade_refine as refine;

/// The multi-physics integrator and its collaborator traits
/// (`cascade-integrator`).
pub use cascade_integrator as integrator;

/// Common imports for typical Cascade usage.
///
/// ```rust
/// use cascade::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use cascade_core::{
        Component, LevelNumber, Patch, PatchHierarchy, PatchLevel, Quantity, ResourceLookup,
        VecFieldDescriptor,
    };

    // Errors
    pub use cascade_core::{CollaboratorError, LifecycleError, ScheduleError, SetupError};

    // Refinement
    pub use cascade_refine::{
        RefineOperator, RefinerPool, ScheduleCompiler, TimeInterpolateOperator,
    };

    // Integrator
    pub use cascade_integrator::{
        IntegratorConfig, LevelState, Messenger, MessengerFactory, MessengerInfo,
        MultiPhysicsIntegrator, PhysicalModel, SimFunctors, Solver,
        StandardLevelInitializerFactory, TagAndInitStrategy, TimeRefinementLevelStrategy,
    };
}
