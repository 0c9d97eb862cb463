//! Traits the hierarchy provider implements.
//!
//! The patch hierarchy (box geometry, domain decomposition, load
//! balancing) lives outside this workspace. The integrator and the
//! refine layer only see it through these three read-only views.

use crate::id::{IntVector, LevelNumber, PatchId};

/// A rectangular subregion of a level owned by this process.
pub trait Patch {
    /// Identifier of the patch within its level.
    fn id(&self) -> PatchId;
}

/// One refinement tier of the hierarchy, restricted to local patches.
pub trait PatchLevel {
    /// Index of this level in the hierarchy.
    fn level_number(&self) -> LevelNumber;

    /// Local patches of the level.
    fn patches(&self) -> Box<dyn Iterator<Item = &dyn Patch> + '_>;

    /// Refinement ratio between this level and the next coarser one.
    ///
    /// The root level reports a ratio of one in every direction.
    fn ratio_to_coarser(&self) -> IntVector;

    /// Index of the next coarser level, `None` on the root level.
    fn next_coarser_level_number(&self) -> Option<LevelNumber> {
        self.level_number().checked_sub(1)
    }

    /// Number of local patches.
    fn patch_count(&self) -> usize {
        self.patches().count()
    }
}

/// The adaptive-mesh hierarchy as seen by one process.
pub trait PatchHierarchy {
    /// Number of levels currently in the hierarchy.
    fn number_of_levels(&self) -> usize;

    /// The level at `level_number`, or `None` if it does not exist.
    fn level(&self, level_number: LevelNumber) -> Option<&dyn PatchLevel>;

    /// Index of the finest existing level, `None` if the hierarchy is empty.
    fn finest_level_number(&self) -> Option<LevelNumber> {
        self.number_of_levels().checked_sub(1)
    }
}
