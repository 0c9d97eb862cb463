//! Test utilities and mock types for Cascade development.
//!
//! Provides an in-memory hierarchy ([`MockHierarchy`]), a shared
//! [`CallLog`], a map-backed [`ResourceLookup`], and a
//! [`CountingScheduleCompiler`] that records every compile and fill.
//! Recording models, solvers, messengers and level initializers live in
//! [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use cascade_core::{
    IntVector, LevelNumber, Patch, PatchHierarchy, PatchId, PatchLevel, ResourceId, ResourceLookup,
    ScheduleError,
};
use cascade_refine::{
    RefineAlgorithm, RefineOperator, RefineSchedule, ScheduleCompiler, ScheduleKind,
    ScheduleRequest,
};
use smallvec::smallvec;

// ── CallLog ────────────────────────────────────────────────────────

/// Ordered record of collaborator calls, shared by every fixture of a
/// test scenario.
#[derive(Clone, Debug, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.into());
    }

    /// Snapshot of all entries, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Entries containing `pattern`, oldest first.
    pub fn matching(&self, pattern: &str) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.contains(pattern))
            .collect()
    }

    /// Number of entries containing `pattern`.
    pub fn count(&self, pattern: &str) -> usize {
        self.matching(pattern).len()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

// ── Mock hierarchy ─────────────────────────────────────────────────

/// A patch with a fixed id.
#[derive(Clone, Debug)]
pub struct MockPatch {
    pub id: PatchId,
}

impl Patch for MockPatch {
    fn id(&self) -> PatchId {
        self.id
    }
}

/// A level holding a list of [`MockPatch`]es.
#[derive(Clone, Debug)]
pub struct MockLevel {
    pub number: LevelNumber,
    pub ratio: IntVector,
    pub patches: Vec<MockPatch>,
}

impl MockLevel {
    /// Level `number` with `patch_count` patches numbered from zero.
    pub fn new(number: LevelNumber, ratio: i32, patch_count: u32) -> Self {
        let patches = (0..patch_count).map(|p| MockPatch { id: PatchId(p) }).collect();
        let ratio = if number == 0 { 1 } else { ratio };
        Self {
            number,
            ratio: smallvec![ratio],
            patches,
        }
    }
}

impl PatchLevel for MockLevel {
    fn level_number(&self) -> LevelNumber {
        self.number
    }

    fn patches(&self) -> Box<dyn Iterator<Item = &dyn Patch> + '_> {
        Box::new(self.patches.iter().map(|p| p as &dyn Patch))
    }

    fn ratio_to_coarser(&self) -> IntVector {
        self.ratio.clone()
    }
}

/// A hierarchy of [`MockLevel`]s.
#[derive(Clone, Debug, Default)]
pub struct MockHierarchy {
    pub levels: Vec<MockLevel>,
}

impl MockHierarchy {
    /// `level_count` levels refined by `ratio`, each with
    /// `patches_per_level` patches.
    pub fn uniform(level_count: usize, ratio: i32, patches_per_level: u32) -> Self {
        Self {
            levels: (0..level_count)
                .map(|n| MockLevel::new(n, ratio, patches_per_level))
                .collect(),
        }
    }

    /// Level `n`, panicking if absent.
    pub fn mock_level(&self, n: LevelNumber) -> &MockLevel {
        &self.levels[n]
    }
}

impl PatchHierarchy for MockHierarchy {
    fn number_of_levels(&self) -> usize {
        self.levels.len()
    }

    fn level(&self, level_number: LevelNumber) -> Option<&dyn PatchLevel> {
        self.levels
            .get(level_number)
            .map(|l| l as &dyn PatchLevel)
    }
}

// ── Resources and operators ────────────────────────────────────────

/// [`ResourceLookup`] backed by a `HashMap`.
#[derive(Clone, Debug, Default)]
pub struct MapResourceLookup {
    ids: HashMap<String, ResourceId>,
}

impl MapResourceLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve each of `names`, numbered in the given order.
    pub fn with_names(names: &[&str]) -> Self {
        let mut lookup = Self::new();
        for name in names {
            lookup.insert(name);
        }
        lookup
    }

    /// Resolve the three components of every vector in `vectors`.
    pub fn with_vectors(vectors: &[&str]) -> Self {
        let mut lookup = Self::new();
        for v in vectors {
            for suffix in ["_x", "_y", "_z"] {
                lookup.insert(&format!("{v}{suffix}"));
            }
        }
        lookup
    }

    pub fn insert(&mut self, name: &str) -> ResourceId {
        let next = ResourceId(self.ids.len() as u32);
        *self.ids.entry(name.to_string()).or_insert(next)
    }
}

impl ResourceLookup for MapResourceLookup {
    fn id(&self, name: &str) -> Option<ResourceId> {
        self.ids.get(name).copied()
    }
}

/// A [`RefineOperator`] identified only by name.
#[derive(Clone, Debug)]
pub struct NamedRefineOperator(pub String);

impl NamedRefineOperator {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl RefineOperator for NamedRefineOperator {
    fn name(&self) -> &str {
        &self.0
    }
}

// ── CountingScheduleCompiler ───────────────────────────────────────

/// One [`ScheduleCompiler::compile`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct CompileRecord {
    pub quantity: String,
    pub level: LevelNumber,
    pub coarser: Option<LevelNumber>,
    pub kind: ScheduleKind,
    pub components: usize,
}

/// One [`RefineSchedule::fill_data`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct FillRecord {
    pub quantity: String,
    pub level: LevelNumber,
    pub kind: ScheduleKind,
    pub time: f64,
}

/// Compiler whose schedules only record their executions.
#[derive(Clone, Debug, Default)]
pub struct CountingScheduleCompiler {
    compiles: Arc<Mutex<Vec<CompileRecord>>>,
    fills: Arc<Mutex<Vec<FillRecord>>>,
    fail_quantity: Option<String>,
}

impl CountingScheduleCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiling for `quantity` fails with a transport error.
    pub fn failing_on(quantity: impl Into<String>) -> Self {
        Self {
            fail_quantity: Some(quantity.into()),
            ..Self::default()
        }
    }

    pub fn compiles(&self) -> Vec<CompileRecord> {
        self.compiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn fills(&self) -> Vec<FillRecord> {
        self.fills
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn compile_count(&self) -> usize {
        self.compiles().len()
    }

    pub fn fill_count(&self) -> usize {
        self.fills().len()
    }
}

struct CountingSchedule {
    quantity: String,
    level: LevelNumber,
    kind: ScheduleKind,
    fills: Arc<Mutex<Vec<FillRecord>>>,
}

impl RefineSchedule for CountingSchedule {
    fn fill_data(&self, time: f64) -> Result<(), ScheduleError> {
        self.fills
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(FillRecord {
                quantity: self.quantity.clone(),
                level: self.level,
                kind: self.kind,
                time,
            });
        Ok(())
    }
}

impl ScheduleCompiler for CountingScheduleCompiler {
    fn compile(
        &self,
        algorithm: &RefineAlgorithm,
        _hierarchy: &dyn PatchHierarchy,
        request: &ScheduleRequest<'_>,
    ) -> Result<Box<dyn RefineSchedule>, ScheduleError> {
        if self.fail_quantity.as_deref() == Some(request.quantity) {
            return Err(ScheduleError::TransportFailed {
                reason: format!("cannot compile {}", request.quantity),
            });
        }
        self.compiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CompileRecord {
                quantity: request.quantity.to_string(),
                level: request.level,
                coarser: request.coarser,
                kind: request.kind,
                components: algorithm.len(),
            });
        Ok(Box::new(CountingSchedule {
            quantity: request.quantity.to_string(),
            level: request.level,
            kind: request.kind,
            fills: Arc::clone(&self.fills),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_hierarchy_shape() {
        let h = MockHierarchy::uniform(3, 2, 4);
        assert_eq!(h.number_of_levels(), 3);
        assert_eq!(h.finest_level_number(), Some(2));
        let root = h.level(0).unwrap();
        assert_eq!(root.patch_count(), 4);
        assert_eq!(root.ratio_to_coarser().as_slice(), &[1]);
        assert_eq!(root.next_coarser_level_number(), None);
        assert_eq!(h.level(2).unwrap().ratio_to_coarser().as_slice(), &[2]);
        assert!(h.level(3).is_none());
    }

    #[test]
    fn lookup_numbers_names_in_order() {
        let l = MapResourceLookup::with_vectors(&["EM_B"]);
        assert_eq!(l.id("EM_B_x"), Some(ResourceId(0)));
        assert_eq!(l.id("EM_B_z"), Some(ResourceId(2)));
        assert_eq!(l.id("EM_E_x"), None);
    }

    #[test]
    fn call_log_is_shared_between_clones() {
        let log = CallLog::new();
        let other = log.clone();
        other.push("a.first");
        log.push("b.second");
        assert_eq!(log.entries(), vec!["a.first", "b.second"]);
        assert_eq!(log.count("second"), 1);
        log.clear();
        assert!(other.entries().is_empty());
    }
}
