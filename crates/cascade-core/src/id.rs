//! Strongly-typed identifiers and the [`IntVector`] refinement-ratio
//! alias.

use smallvec::SmallVec;
use std::fmt;

/// Index of a refinement level. Level 0 is the root (coarsest) level.
pub type LevelNumber = usize;

/// A per-direction integer vector of refinement ratios.
///
/// Uses `SmallVec<[i32; 3]>` so 1D, 2D and 3D hierarchies never touch
/// the heap.
pub type IntVector = SmallVec<[i32; 3]>;

/// Identifies a patch-data resource (one component of one quantity)
/// registered with the hierarchy's resource manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u32);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ResourceId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a patch within its level.
///
/// Patch ids are only unique per level and per process; the hierarchy
/// provider assigns them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatchId(pub u32);

impl fmt::Display for PatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PatchId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_as_bare_numbers() {
        assert_eq!(PatchId(7).to_string(), "7");
        assert_eq!(ResourceId::from(12).to_string(), "12");
    }

    #[test]
    fn ids_order_by_value() {
        assert!(PatchId(1) < PatchId(2));
        assert_eq!(ResourceId::from(3), ResourceId(3));
    }
}
