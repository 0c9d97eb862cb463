//! Refine templates, schedule caches and refiner pools.
//!
//! A [`RefineAlgorithm`] is the hierarchy-independent description of one
//! exchange: which resources are filled from which sources, with which
//! spatial and time operators. A [`QuantityRefiner`] pairs that template
//! with a per-level cache of compiled [`RefineSchedule`]s, and a
//! [`RefinerPool`] owns every refiner of one messenger.
//!
//! Compiling and executing schedules is delegated to a
//! [`ScheduleCompiler`] supplied by the transport layer.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod algorithm;
pub mod operator;
pub mod pool;
pub mod refiner;
pub mod schedule;

pub use algorithm::{make_ghost_refiner, make_init_refiner, RefineAlgorithm, RefineItem};
pub use operator::{LinearTimeInterpolate, RefineOperator, TimeInterpolateOperator};
pub use pool::RefinerPool;
pub use refiner::QuantityRefiner;
pub use schedule::{RefineSchedule, ScheduleCompiler, ScheduleKind, ScheduleRequest};
