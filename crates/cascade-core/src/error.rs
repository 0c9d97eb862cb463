//! Error types for the Cascade integrator.
//!
//! Organized by subsystem: setup (registration of models, solvers and
//! messengers), schedule (ghost-exchange plans), lifecycle (callbacks
//! from the hierarchy driver), and collaborator (failures reported by
//! model, solver, messenger and level-initializer implementations).
//!
//! Every error is fatal at detection. Nothing in the workspace retries.

use std::fmt;

use thiserror::Error;

use crate::id::LevelNumber;

/// Which per-level assignment a lookup expected to find.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Assignment {
    /// A physical model.
    Model,
    /// A solver.
    Solver,
    /// A messenger to the next coarser level.
    Messenger,
    /// A level initializer for the level's model.
    LevelInitializer,
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => write!(f, "model"),
            Self::Solver => write!(f, "solver"),
            Self::Messenger => write!(f, "messenger"),
            Self::LevelInitializer => write!(f, "level initializer"),
        }
    }
}

/// Errors raised while registering models, solvers and messengers.
///
/// Registration calls validate everything before mutating, so a failed
/// call leaves the integrator tables exactly as they were.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SetupError {
    /// The level range is empty, inverted, or reaches past the finest level.
    #[error("invalid level range [{coarsest}, {finest}] for a hierarchy of {level_count} levels")]
    InvalidLevelRange {
        /// Coarsest level of the requested range.
        coarsest: LevelNumber,
        /// Finest level of the requested range.
        finest: LevelNumber,
        /// Number of levels the integrator was built for.
        level_count: usize,
    },

    /// A level in the range already has a model.
    #[error("level {level} in range [{coarsest}, {finest}] already has a registered model")]
    LevelRangeOccupied {
        /// Coarsest level of the requested range.
        coarsest: LevelNumber,
        /// Finest level of the requested range.
        finest: LevelNumber,
        /// First level found with an existing model.
        level: LevelNumber,
    },

    /// The same model instance was registered twice.
    #[error("model '{name}' already registered")]
    DuplicateModel {
        /// Name of the model.
        name: String,
    },

    /// The same solver instance was registered twice.
    #[error("solver '{name}' already registered")]
    DuplicateSolver {
        /// Name of the solver.
        name: String,
    },

    /// The solver cannot advance the model assigned to a level of its range.
    #[error("{solver} is not compatible with model {model} on level {level}")]
    IncompatibleSolver {
        /// Name of the solver.
        solver: String,
        /// Name of the level's model, or `<none>` if no model is assigned.
        model: String,
        /// The offending level.
        level: LevelNumber,
    },

    /// The messenger factory has no messenger for a model pairing.
    #[error("no viable messenger for coarse model '{coarse_model}' and fine model '{fine_model}'")]
    NoViableMessenger {
        /// Model of the coarser level.
        coarse_model: String,
        /// Model of the finer level.
        fine_model: String,
    },

    /// The level-initializer factory does not know the model.
    #[error("no level initializer for model '{model}'")]
    NoLevelInitializer {
        /// Name of the model.
        model: String,
    },

    /// Messenger setup found a level without a model or solver.
    #[error("level {level} has no {kind} assigned")]
    UnassignedLevel {
        /// The level missing an assignment.
        level: LevelNumber,
        /// What is missing.
        kind: Assignment,
    },

    /// A registration call arrived after messengers were wired.
    #[error("{operation} called after setup was closed")]
    SetupClosed {
        /// The rejected registration call.
        operation: &'static str,
    },

    /// A collaborator failed while registering its resources or quantities.
    #[error("'{name}' failed during setup: {source}")]
    Collaborator {
        /// Name of the failing collaborator.
        name: String,
        /// The underlying failure.
        #[source]
        source: CollaboratorError,
    },
}

/// Errors from building or executing ghost-exchange schedules.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ScheduleError {
    /// A fill targeted a (quantity, level) with no compiled schedule.
    ///
    /// Signals a registration defect: `create_ghost_schedules` was never
    /// called for this level.
    #[error("no schedule for {quantity} on level {level}")]
    MissingSchedule {
        /// Name of the quantity.
        quantity: String,
        /// Level the fill targeted.
        level: LevelNumber,
    },

    /// The pool has no refiner registered under this name.
    #[error("no refiner registered for {quantity}")]
    UnknownQuantity {
        /// Name of the quantity.
        quantity: String,
    },

    /// The hierarchy has no such level.
    #[error("hierarchy has no level {level}")]
    MissingLevel {
        /// The requested level.
        level: LevelNumber,
    },

    /// The transport layer failed to compile or execute a schedule.
    #[error("transport failed: {reason}")]
    TransportFailed {
        /// Description of the failure.
        reason: String,
    },
}

/// Errors reported by model, solver, messenger and level-initializer
/// implementations.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CollaboratorError {
    /// The operation failed.
    #[error("execution failed: {reason}")]
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },

    /// A schedule operation inside the collaborator failed.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

/// Errors from the lifecycle callbacks the hierarchy driver invokes.
///
/// Any of these means the driver and the integrator disagree about the
/// hierarchy, or a collaborator failed mid-step.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum LifecycleError {
    /// A callback targeted a level with no assigned model, solver or messenger.
    #[error("no {kind} assigned to level {level}")]
    MissingAssignment {
        /// The level.
        level: LevelNumber,
        /// What is missing.
        kind: Assignment,
    },

    /// The requested operation is not supported.
    #[error("unsupported operation: {operation}")]
    UnsupportedOperation {
        /// Description of the rejected request.
        operation: &'static str,
    },

    /// `advance_level` was called before `initialize_level_data`.
    #[error("level {level} advanced before its data was initialized")]
    LevelNotInitialized {
        /// The level.
        level: LevelNumber,
    },

    /// The hierarchy has no such level.
    #[error("hierarchy has no level {level}")]
    MissingLevel {
        /// The requested level.
        level: LevelNumber,
    },

    /// A first subcycle step ran before the coarser level advanced.
    #[error("level {level} started a subcycle before level {coarser} recorded a new time")]
    CoarserTimeUnknown {
        /// The fine level.
        level: LevelNumber,
        /// Its next coarser level.
        coarser: LevelNumber,
    },

    /// A collaborator failed.
    #[error("'{name}' failed: {source}")]
    Collaborator {
        /// Name of the failing collaborator.
        name: String,
        /// The underlying failure.
        #[source]
        source: CollaboratorError,
    },
}

impl LifecycleError {
    /// Wrap a collaborator failure with the collaborator's name.
    pub fn collaborator(name: impl Into<String>, source: CollaboratorError) -> Self {
        Self::Collaborator {
            name: name.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn missing_schedule_names_quantity_and_level() {
        let e = ScheduleError::MissingSchedule {
            quantity: "EM_B".into(),
            level: 2,
        };
        assert_eq!(e.to_string(), "no schedule for EM_B on level 2");
    }

    #[test]
    fn collaborator_error_keeps_source_chain() {
        let inner = CollaboratorError::Schedule(ScheduleError::TransportFailed {
            reason: "peer lost".into(),
        });
        let e = LifecycleError::collaborator("HybridMessenger", inner.clone());
        assert_eq!(e.source().map(|s| s.to_string()), Some(inner.to_string()));
    }

    #[test]
    fn coarser_time_message_names_coarser_level() {
        let e = LifecycleError::CoarserTimeUnknown {
            level: 3,
            coarser: 2,
        };
        assert!(e.to_string().contains("level 2"));
    }
}
