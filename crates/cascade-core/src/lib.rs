//! Core types and collaborator traits for the Cascade AMR integrator.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the abstractions shared by the refine layer and the integrator:
//! identifiers and refinement ratios, the hierarchy
//! provider traits, vector-field descriptors, and the error enums.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod field;
pub mod hierarchy;
pub mod id;

pub use error::{Assignment, CollaboratorError, LifecycleError, ScheduleError, SetupError};
pub use field::{Component, Quantity, ResourceLookup, VecFieldDescriptor};
pub use hierarchy::{Patch, PatchHierarchy, PatchLevel};
pub use id::{IntVector, LevelNumber, PatchId, ResourceId};
