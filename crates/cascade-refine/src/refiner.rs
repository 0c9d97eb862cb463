//! [`QuantityRefiner`]: a registration plus its per-level schedule cache.

use std::collections::BTreeMap;
use std::fmt;

use cascade_core::LevelNumber;

use crate::algorithm::RefineAlgorithm;
use crate::schedule::RefineSchedule;

/// Registration template of one quantity and the schedules compiled
/// from it, one per level.
///
/// The template is set once at setup. Schedules are added while levels
/// are initialized and replaced when a level is rebuilt after a regrid.
pub struct QuantityRefiner {
    algorithm: RefineAlgorithm,
    schedules: BTreeMap<LevelNumber, Box<dyn RefineSchedule>>,
}

impl QuantityRefiner {
    /// Wrap a registration with an empty schedule cache.
    pub fn new(algorithm: RefineAlgorithm) -> Self {
        Self {
            algorithm,
            schedules: BTreeMap::new(),
        }
    }

    /// The registration template.
    pub fn algorithm(&self) -> &RefineAlgorithm {
        &self.algorithm
    }

    /// The cached schedule for `level_number`, if one was compiled.
    pub fn find_schedule(&self, level_number: LevelNumber) -> Option<&dyn RefineSchedule> {
        self.schedules.get(&level_number).map(|s| s.as_ref())
    }

    /// Cache `schedule` for `level_number`, replacing any previous one.
    pub fn add(&mut self, schedule: Box<dyn RefineSchedule>, level_number: LevelNumber) {
        self.schedules.insert(level_number, schedule);
    }

    /// Levels with a cached schedule, coarsest first.
    pub fn scheduled_levels(&self) -> impl Iterator<Item = LevelNumber> + '_ {
        self.schedules.keys().copied()
    }
}

impl fmt::Debug for QuantityRefiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuantityRefiner")
            .field("algorithm", &self.algorithm)
            .field("scheduled_levels", &self.schedules.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_core::ScheduleError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Tagged(usize, Arc<AtomicUsize>);
    impl RefineSchedule for Tagged {
        fn fill_data(&self, _time: f64) -> Result<(), ScheduleError> {
            self.1.store(self.0, Ordering::Relaxed);
            Ok(())
        }
    }

    #[test]
    fn empty_cache_finds_nothing() {
        let refiner = QuantityRefiner::new(RefineAlgorithm::new());
        assert!(refiner.find_schedule(0).is_none());
        assert_eq!(refiner.scheduled_levels().count(), 0);
    }

    #[test]
    fn add_replaces_schedule_of_same_level() {
        let last = Arc::new(AtomicUsize::new(0));
        let mut refiner = QuantityRefiner::new(RefineAlgorithm::new());
        refiner.add(Box::new(Tagged(1, Arc::clone(&last))), 2);
        refiner.add(Box::new(Tagged(2, Arc::clone(&last))), 2);
        refiner.add(Box::new(Tagged(3, Arc::clone(&last))), 1);

        refiner.find_schedule(2).unwrap().fill_data(0.0).unwrap();
        assert_eq!(last.load(Ordering::Relaxed), 2);
        assert_eq!(refiner.scheduled_levels().collect::<Vec<_>>(), vec![1, 2]);
    }
}
