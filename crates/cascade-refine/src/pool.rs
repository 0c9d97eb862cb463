//! [`RefinerPool`]: the named refiners of one messenger.
//!
//! The pool builds schedules when a level is initialized and executes
//! them when a solver asks for ghost data. Building takes `&mut self`
//! and filling takes `&self`, so the per-level caches can only change
//! during level (re)initialization, never while a level advances.
//!
//! Refiners are kept in registration order. Schedule construction and
//! execution are collective across processes, so every process must walk
//! the refiners in the same order.

use std::sync::Arc;

use cascade_core::{LevelNumber, PatchHierarchy, Quantity, ScheduleError};
use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::refiner::QuantityRefiner;
use crate::schedule::{ScheduleCompiler, ScheduleKind, ScheduleRequest};

/// Named [`QuantityRefiner`]s sharing one schedule compiler.
pub struct RefinerPool {
    refiners: IndexMap<String, QuantityRefiner>,
    compiler: Arc<dyn ScheduleCompiler>,
}

impl RefinerPool {
    /// An empty pool compiling through `compiler`.
    pub fn new(compiler: Arc<dyn ScheduleCompiler>) -> Self {
        Self {
            refiners: IndexMap::new(),
            compiler,
        }
    }

    /// Register `refiner` under `quantity_name`.
    ///
    /// Registering a name twice replaces the earlier refiner, cached
    /// schedules included, but keeps its position in the walk order.
    pub fn add(&mut self, refiner: QuantityRefiner, quantity_name: impl Into<String>) {
        self.refiners.insert(quantity_name.into(), refiner);
    }

    /// Compile and cache ghost schedules of every quantity for
    /// `level_number`, sourcing from its next coarser level.
    pub fn create_ghost_schedules(
        &mut self,
        hierarchy: &dyn PatchHierarchy,
        level_number: LevelNumber,
    ) -> Result<(), ScheduleError> {
        let level = hierarchy
            .level(level_number)
            .ok_or(ScheduleError::MissingLevel {
                level: level_number,
            })?;
        let coarser = level.next_coarser_level_number();

        for (name, refiner) in self.refiners.iter_mut() {
            let request = ScheduleRequest {
                quantity: name,
                level: level_number,
                coarser,
                kind: ScheduleKind::Ghost,
            };
            let schedule = self
                .compiler
                .compile(refiner.algorithm(), hierarchy, &request)?;
            refiner.add(schedule, level_number);
        }
        debug!(
            level = level_number,
            quantities = self.refiners.len(),
            "ghost schedules created"
        );
        Ok(())
    }

    /// Compile and cache same-level initialization schedules of every
    /// quantity for `level_number`.
    pub fn create_init_schedules(
        &mut self,
        hierarchy: &dyn PatchHierarchy,
        level_number: LevelNumber,
    ) -> Result<(), ScheduleError> {
        if hierarchy.level(level_number).is_none() {
            return Err(ScheduleError::MissingLevel {
                level: level_number,
            });
        }

        for (name, refiner) in self.refiners.iter_mut() {
            let request = ScheduleRequest {
                quantity: name,
                level: level_number,
                coarser: None,
                kind: ScheduleKind::Init,
            };
            let schedule = self
                .compiler
                .compile(refiner.algorithm(), hierarchy, &request)?;
            refiner.add(schedule, level_number);
        }
        debug!(
            level = level_number,
            quantities = self.refiners.len(),
            "init schedules created"
        );
        Ok(())
    }

    /// Build a fresh schedule of every quantity for `level_number` and
    /// execute it at `time`.
    ///
    /// Used when a level is created, including after a regrid. The data
    /// of a replaced level is never reused. Nothing is cached.
    pub fn initialize(
        &self,
        hierarchy: &dyn PatchHierarchy,
        level_number: LevelNumber,
        time: f64,
    ) -> Result<(), ScheduleError> {
        let level = hierarchy
            .level(level_number)
            .ok_or(ScheduleError::MissingLevel {
                level: level_number,
            })?;
        let coarser = level.next_coarser_level_number();

        for (name, refiner) in &self.refiners {
            let request = ScheduleRequest {
                quantity: name,
                level: level_number,
                coarser,
                kind: ScheduleKind::Fresh,
            };
            let schedule = self
                .compiler
                .compile(refiner.algorithm(), hierarchy, &request)?;
            schedule.fill_data(time)?;
        }
        Ok(())
    }

    /// Fill the ghost regions of `quantity` on `level_number` at `time`.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::MissingSchedule`] if no schedule was created for
    /// this quantity and level. A missing schedule is a registration
    /// defect and is never skipped.
    pub fn fill_vec_field_ghosts<Q>(
        &self,
        quantity: &Q,
        level_number: LevelNumber,
        time: f64,
    ) -> Result<(), ScheduleError>
    where
        Q: Quantity + ?Sized,
    {
        let name = quantity.name();
        let schedule = self
            .refiners
            .get(name)
            .and_then(|r| r.find_schedule(level_number))
            .ok_or_else(|| ScheduleError::MissingSchedule {
                quantity: name.to_string(),
                level: level_number,
            })?;
        trace!(quantity = name, level = level_number, time, "filling ghosts");
        schedule.fill_data(time)
    }

    /// The refiner registered under `quantity_name`.
    pub fn refiner(&self, quantity_name: &str) -> Result<&QuantityRefiner, ScheduleError> {
        self.refiners
            .get(quantity_name)
            .ok_or_else(|| ScheduleError::UnknownQuantity {
                quantity: quantity_name.to_string(),
            })
    }

    /// Whether a schedule is cached for `(quantity_name, level_number)`.
    pub fn has_schedule(&self, quantity_name: &str, level_number: LevelNumber) -> bool {
        self.refiners
            .get(quantity_name)
            .is_some_and(|r| r.find_schedule(level_number).is_some())
    }

    /// Whether a refiner is registered under `quantity_name`.
    pub fn contains(&self, quantity_name: &str) -> bool {
        self.refiners.contains_key(quantity_name)
    }

    /// Registered quantity names in walk order.
    pub fn quantity_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.refiners.keys().map(String::as_str)
    }

    /// Number of registered quantities.
    pub fn len(&self) -> usize {
        self.refiners.len()
    }

    /// Whether no quantity is registered.
    pub fn is_empty(&self) -> bool {
        self.refiners.is_empty()
    }
}

impl std::fmt::Debug for RefinerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefinerPool")
            .field("refiners", &self.refiners)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::RefineAlgorithm;
    use crate::schedule::RefineSchedule;
    use cascade_core::{IntVector, Patch, PatchLevel, VecFieldDescriptor};
    use smallvec::smallvec;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<(String, ScheduleKind, LevelNumber, Option<LevelNumber>, f64)>>>;

    struct Level(LevelNumber);
    impl PatchLevel for Level {
        fn level_number(&self) -> LevelNumber {
            self.0
        }
        fn patches(&self) -> Box<dyn Iterator<Item = &dyn Patch> + '_> {
            Box::new(std::iter::empty())
        }
        fn ratio_to_coarser(&self) -> IntVector {
            smallvec![2]
        }
    }

    struct Hierarchy(Vec<Level>);
    impl Hierarchy {
        fn with_levels(n: usize) -> Self {
            Self((0..n).map(Level).collect())
        }
    }
    impl PatchHierarchy for Hierarchy {
        fn number_of_levels(&self) -> usize {
            self.0.len()
        }
        fn level(&self, n: LevelNumber) -> Option<&dyn PatchLevel> {
            self.0.get(n).map(|l| l as &dyn PatchLevel)
        }
    }

    struct Logged {
        quantity: String,
        kind: ScheduleKind,
        level: LevelNumber,
        coarser: Option<LevelNumber>,
        log: Log,
    }
    impl RefineSchedule for Logged {
        fn fill_data(&self, time: f64) -> Result<(), ScheduleError> {
            self.log.lock().unwrap().push((
                self.quantity.clone(),
                self.kind,
                self.level,
                self.coarser,
                time,
            ));
            Ok(())
        }
    }

    struct Compiler(Log);
    impl ScheduleCompiler for Compiler {
        fn compile(
            &self,
            _algorithm: &RefineAlgorithm,
            _hierarchy: &dyn PatchHierarchy,
            request: &ScheduleRequest<'_>,
        ) -> Result<Box<dyn RefineSchedule>, ScheduleError> {
            Ok(Box::new(Logged {
                quantity: request.quantity.to_string(),
                kind: request.kind,
                level: request.level,
                coarser: request.coarser,
                log: Arc::clone(&self.0),
            }))
        }
    }

    fn pool_with(names: &[&str]) -> (RefinerPool, Log) {
        let log: Log = Arc::default();
        let mut pool = RefinerPool::new(Arc::new(Compiler(Arc::clone(&log))));
        for n in names {
            pool.add(QuantityRefiner::new(RefineAlgorithm::new()), *n);
        }
        (pool, log)
    }

    #[test]
    fn fill_without_schedule_is_an_error() {
        let (pool, log) = pool_with(&["EM_B"]);
        let err = pool
            .fill_vec_field_ghosts(&VecFieldDescriptor::new("EM_B"), 1, 0.5)
            .unwrap_err();
        assert_eq!(
            err,
            ScheduleError::MissingSchedule {
                quantity: "EM_B".into(),
                level: 1
            }
        );
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn fill_unregistered_quantity_is_missing_schedule() {
        let (mut pool, _log) = pool_with(&["EM_B"]);
        pool.create_ghost_schedules(&Hierarchy::with_levels(2), 1)
            .unwrap();
        let err = pool
            .fill_vec_field_ghosts(&VecFieldDescriptor::new("EM_E"), 1, 0.5)
            .unwrap_err();
        assert!(matches!(err, ScheduleError::MissingSchedule { .. }));
    }

    #[test]
    fn ghost_schedule_fills_once_at_requested_time() {
        let (mut pool, log) = pool_with(&["EM_B", "EM_E"]);
        let hierarchy = Hierarchy::with_levels(3);
        pool.create_ghost_schedules(&hierarchy, 2).unwrap();
        assert!(log.lock().unwrap().is_empty());

        pool.fill_vec_field_ghosts(&VecFieldDescriptor::new("EM_B"), 2, 0.25)
            .unwrap();
        let log = log.lock().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(
            log[0],
            ("EM_B".to_string(), ScheduleKind::Ghost, 2, Some(1), 0.25)
        );
    }

    #[test]
    fn schedules_are_cached_per_level() {
        let (mut pool, _log) = pool_with(&["EM_B"]);
        let hierarchy = Hierarchy::with_levels(3);
        pool.create_ghost_schedules(&hierarchy, 1).unwrap();
        assert!(pool.has_schedule("EM_B", 1));
        assert!(!pool.has_schedule("EM_B", 2));
        assert!(pool
            .fill_vec_field_ghosts(&VecFieldDescriptor::new("EM_B"), 2, 0.0)
            .is_err());
    }

    #[test]
    fn init_schedules_have_no_coarser_source() {
        let (mut pool, log) = pool_with(&["EM_B"]);
        pool.create_init_schedules(&Hierarchy::with_levels(2), 1)
            .unwrap();
        pool.fill_vec_field_ghosts(&VecFieldDescriptor::new("EM_B"), 1, 1.0)
            .unwrap();
        let log = log.lock().unwrap();
        assert_eq!(log[0].1, ScheduleKind::Init);
        assert_eq!(log[0].3, None);
    }

    #[test]
    fn initialize_executes_every_quantity_in_registration_order_without_caching() {
        let (pool, log) = pool_with(&["EM_B", "EM_E", "Vi"]);
        pool.initialize(&Hierarchy::with_levels(2), 1, 3.0).unwrap();

        let names: Vec<_> = log.lock().unwrap().iter().map(|e| e.0.clone()).collect();
        assert_eq!(names, vec!["EM_B", "EM_E", "Vi"]);
        assert!(log
            .lock()
            .unwrap()
            .iter()
            .all(|e| e.1 == ScheduleKind::Fresh && e.4 == 3.0));
        assert!(!pool.has_schedule("EM_B", 1));
    }

    #[test]
    fn missing_level_rejected() {
        let (mut pool, _log) = pool_with(&["EM_B"]);
        let hierarchy = Hierarchy::with_levels(1);
        assert_eq!(
            pool.create_ghost_schedules(&hierarchy, 3),
            Err(ScheduleError::MissingLevel { level: 3 })
        );
        assert_eq!(
            pool.initialize(&hierarchy, 3, 0.0),
            Err(ScheduleError::MissingLevel { level: 3 })
        );
    }

    #[test]
    fn root_ghost_schedule_has_no_coarser_level() {
        let (mut pool, log) = pool_with(&["EM_B"]);
        pool.create_ghost_schedules(&Hierarchy::with_levels(1), 0)
            .unwrap();
        pool.fill_vec_field_ghosts(&VecFieldDescriptor::new("EM_B"), 0, 0.0)
            .unwrap();
        assert_eq!(log.lock().unwrap()[0].3, None);
    }

    #[test]
    fn re_adding_a_name_keeps_walk_order() {
        let (mut pool, _log) = pool_with(&["EM_B", "EM_E"]);
        pool.add(QuantityRefiner::new(RefineAlgorithm::new()), "EM_B");
        assert_eq!(pool.quantity_names().collect::<Vec<_>>(), vec!["EM_B", "EM_E"]);
        assert_eq!(pool.len(), 2);
        assert!(pool.refiner("Vi").is_err());
    }
}
