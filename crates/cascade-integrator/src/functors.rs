//! Diagnostic callbacks keyed by stage and name.
//!
//! The integrator invokes these at fixed points of a level advance. A
//! callback receives a small key/value record describing the point it
//! was invoked at.

use std::fmt;

use indexmap::IndexMap;

/// Stage invoked before a level advance.
pub const PRE_ADVANCE: &str = "pre_advance";

/// Callback dumping fine-level data in the middle of a coarse step.
pub const FINE_DUMP: &str = "fine_dump";

/// A value in a [`SimFunctorParams`] record.
#[derive(Clone, Debug, PartialEq)]
pub enum FunctorValue {
    /// An integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// A string.
    Text(String),
}

impl FunctorValue {
    /// The integer value, if this is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The float value, if this is one.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }
}

/// Parameters passed to a [`SimFunctor`].
pub type SimFunctorParams = IndexMap<String, FunctorValue>;

/// A diagnostic callback.
pub type SimFunctor = Box<dyn Fn(&SimFunctorParams) + Send + Sync>;

/// Callbacks grouped by stage, then by name.
#[derive(Default)]
pub struct SimFunctors {
    stages: IndexMap<String, IndexMap<String, SimFunctor>>,
}

impl SimFunctors {
    /// No callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `functor` as `name` in `stage`, replacing any previous one.
    pub fn insert(
        &mut self,
        stage: impl Into<String>,
        name: impl Into<String>,
        functor: SimFunctor,
    ) {
        self.stages
            .entry(stage.into())
            .or_default()
            .insert(name.into(), functor);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(
        mut self,
        stage: impl Into<String>,
        name: impl Into<String>,
        functor: SimFunctor,
    ) -> Self {
        self.insert(stage, name, functor);
        self
    }

    /// The callback `name` of `stage`.
    pub fn get(&self, stage: &str, name: &str) -> Option<&SimFunctor> {
        self.stages.get(stage).and_then(|s| s.get(name))
    }

    /// Whether `stage` has a callback `name`.
    pub fn contains(&self, stage: &str, name: &str) -> bool {
        self.get(stage, name).is_some()
    }
}

impl fmt::Debug for SimFunctors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (stage, functors) in &self.stages {
            map.entry(stage, &functors.keys().collect::<Vec<_>>());
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    #[test]
    fn registered_functor_is_callable() {
        let seen = Arc::new(AtomicI64::new(-1));
        let s = Arc::clone(&seen);
        let functors = SimFunctors::new().with(
            PRE_ADVANCE,
            FINE_DUMP,
            Box::new(move |p: &SimFunctorParams| {
                let level = p.get("level_nbr").and_then(FunctorValue::as_int);
                s.store(level.unwrap_or(-2), Ordering::Relaxed);
            }),
        );

        assert!(functors.contains(PRE_ADVANCE, FINE_DUMP));
        assert!(!functors.contains(PRE_ADVANCE, "other"));
        assert!(!functors.contains("post_advance", FINE_DUMP));

        let mut params = SimFunctorParams::new();
        params.insert("level_nbr".into(), FunctorValue::Int(2));
        functors.get(PRE_ADVANCE, FINE_DUMP).unwrap()(&params);
        assert_eq!(seen.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn value_accessors_match_variant() {
        assert_eq!(FunctorValue::Float(0.5).as_float(), Some(0.5));
        assert_eq!(FunctorValue::Float(0.5).as_int(), None);
        assert_eq!(FunctorValue::Text("x".into()).as_float(), None);
    }
}
