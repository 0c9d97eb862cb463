//! Refine registrations and the two registration builders.
//!
//! [`make_ghost_refiner`] registers a steady-state ghost exchange with
//! time interpolation between a past and a future source;
//! [`make_init_refiner`] registers a one-shot copy used to populate a
//! new level. Both walk the components in x, y, z order and skip any
//! component whose resources do not resolve.

use std::sync::Arc;

use cascade_core::{Component, ResourceId, ResourceLookup, VecFieldDescriptor};
use smallvec::SmallVec;

use crate::operator::{RefineOperator, TimeInterpolateOperator};
use crate::refiner::QuantityRefiner;

/// One registered component exchange.
#[derive(Clone, Debug)]
pub struct RefineItem {
    /// Component this item moves.
    pub component: Component,
    /// Resource whose ghost region is filled.
    pub destination: ResourceId,
    /// Source at the fill time.
    pub source: ResourceId,
    /// Source at the start of the coarser step, for time interpolation.
    pub past_source: Option<ResourceId>,
    /// Source at the end of the coarser step, for time interpolation.
    pub future_source: Option<ResourceId>,
    /// Spatial refinement from the coarser level.
    pub refine_op: Arc<dyn RefineOperator>,
    /// Time interpolation between `past_source` and `future_source`.
    pub time_op: Option<Arc<dyn TimeInterpolateOperator>>,
}

impl RefineItem {
    /// Whether this item interpolates in time.
    pub fn is_time_interpolated(&self) -> bool {
        self.time_op.is_some() && self.past_source.is_some() && self.future_source.is_some()
    }
}

/// Hierarchy-independent registration template of one quantity.
///
/// Holds at most one [`RefineItem`] per component. Immutable once the
/// owning [`QuantityRefiner`] is built.
#[derive(Clone, Debug, Default)]
pub struct RefineAlgorithm {
    items: SmallVec<[RefineItem; 3]>,
}

impl RefineAlgorithm {
    /// An empty registration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component exchange.
    pub fn register_refine(&mut self, item: RefineItem) {
        self.items.push(item);
    }

    /// Registered items, in registration order.
    pub fn items(&self) -> &[RefineItem] {
        &self.items
    }

    /// Number of registered components.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no component resolved.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any registered component interpolates in time.
    pub fn is_time_interpolated(&self) -> bool {
        self.items.iter().any(RefineItem::is_time_interpolated)
    }

    /// The registered item for `component`, if any.
    pub fn item(&self, component: Component) -> Option<&RefineItem> {
        self.items.iter().find(|i| i.component == component)
    }
}

/// Build the ghost-fill registration of a vector quantity.
///
/// For each component the ghost resource is the destination, the model
/// resource is both the same-time and the future-time source, and the
/// old-model resource is the past-time source.
pub fn make_ghost_refiner(
    ghost: &VecFieldDescriptor,
    model: &VecFieldDescriptor,
    old_model: &VecFieldDescriptor,
    resources: &dyn ResourceLookup,
    refine_op: Arc<dyn RefineOperator>,
    time_op: Arc<dyn TimeInterpolateOperator>,
) -> QuantityRefiner {
    let mut algorithm = RefineAlgorithm::new();

    for component in Component::ALL {
        let dest = resources.id(ghost.component_name(component));
        let src = resources.id(model.component_name(component));
        let old = resources.id(old_model.component_name(component));

        if let (Some(destination), Some(source), Some(past)) = (dest, src, old) {
            algorithm.register_refine(RefineItem {
                component,
                destination,
                source,
                past_source: Some(past),
                future_source: Some(source),
                refine_op: Arc::clone(&refine_op),
                time_op: Some(Arc::clone(&time_op)),
            });
        }
    }

    QuantityRefiner::new(algorithm)
}

/// Build the level-initialization registration of a vector quantity.
///
/// Each component resource is both source and destination; no time
/// interpolation.
pub fn make_init_refiner(
    name: &VecFieldDescriptor,
    resources: &dyn ResourceLookup,
    refine_op: Arc<dyn RefineOperator>,
) -> QuantityRefiner {
    let mut algorithm = RefineAlgorithm::new();

    for component in Component::ALL {
        if let Some(id) = resources.id(name.component_name(component)) {
            algorithm.register_refine(RefineItem {
                component,
                destination: id,
                source: id,
                past_source: None,
                future_source: None,
                refine_op: Arc::clone(&refine_op),
                time_op: None,
            });
        }
    }

    QuantityRefiner::new(algorithm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::LinearTimeInterpolate;
    use std::collections::HashMap;

    #[derive(Debug)]
    struct Conservative;
    impl RefineOperator for Conservative {
        fn name(&self) -> &str {
            "conservative"
        }
    }

    struct Lookup(HashMap<String, ResourceId>);
    impl Lookup {
        fn with(names: &[&str]) -> Self {
            Self(
                names
                    .iter()
                    .enumerate()
                    .map(|(i, n)| (n.to_string(), ResourceId(i as u32)))
                    .collect(),
            )
        }
    }
    impl ResourceLookup for Lookup {
        fn id(&self, name: &str) -> Option<ResourceId> {
            self.0.get(name).copied()
        }
    }

    fn descriptors() -> (VecFieldDescriptor, VecFieldDescriptor, VecFieldDescriptor) {
        (
            VecFieldDescriptor::new("EM_B_ghost"),
            VecFieldDescriptor::new("EM_B"),
            VecFieldDescriptor::new("EM_B_old"),
        )
    }

    #[test]
    fn ghost_refiner_binds_all_three_components() {
        let (ghost, model, old) = descriptors();
        let lookup = Lookup::with(&[
            "EM_B_ghost_x",
            "EM_B_ghost_y",
            "EM_B_ghost_z",
            "EM_B_x",
            "EM_B_y",
            "EM_B_z",
            "EM_B_old_x",
            "EM_B_old_y",
            "EM_B_old_z",
        ]);
        let refiner = make_ghost_refiner(
            &ghost,
            &model,
            &old,
            &lookup,
            Arc::new(Conservative),
            Arc::new(LinearTimeInterpolate),
        );
        let algo = refiner.algorithm();
        assert_eq!(algo.len(), 3);
        assert!(algo.is_time_interpolated());

        let y = algo.item(Component::Y).unwrap();
        assert_eq!(y.destination, lookup.id("EM_B_ghost_y").unwrap());
        assert_eq!(y.source, lookup.id("EM_B_y").unwrap());
        assert_eq!(y.future_source, Some(y.source));
        assert_eq!(y.past_source, lookup.id("EM_B_old_y"));
    }

    #[test]
    fn ghost_refiner_skips_unresolved_components() {
        let (ghost, model, old) = descriptors();
        let lookup = Lookup::with(&["EM_B_ghost_x", "EM_B_x", "EM_B_old_x", "EM_B_y"]);
        let refiner = make_ghost_refiner(
            &ghost,
            &model,
            &old,
            &lookup,
            Arc::new(Conservative),
            Arc::new(LinearTimeInterpolate),
        );
        let algo = refiner.algorithm();
        assert_eq!(algo.len(), 1);
        assert_eq!(algo.items()[0].component, Component::X);
    }

    #[test]
    fn init_refiner_uses_one_id_for_source_and_destination() {
        let lookup = Lookup::with(&["EM_E_x", "EM_E_z"]);
        let refiner =
            make_init_refiner(&VecFieldDescriptor::new("EM_E"), &lookup, Arc::new(Conservative));
        let algo = refiner.algorithm();
        assert_eq!(algo.len(), 2);
        assert!(!algo.is_time_interpolated());
        for item in algo.items() {
            assert_eq!(item.source, item.destination);
            assert!(item.time_op.is_none());
        }
        assert!(algo.item(Component::Y).is_none());
    }

    #[test]
    fn nothing_resolves_gives_empty_registration() {
        let refiner = make_init_refiner(
            &VecFieldDescriptor::new("EM_E"),
            &Lookup::with(&[]),
            Arc::new(Conservative),
        );
        assert!(refiner.algorithm().is_empty());
    }
}
