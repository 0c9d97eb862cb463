//! Vector-field descriptors and resource lookup.
//!
//! Quantities exchanged between levels are vector fields whose three
//! components live in separate patch-data resources. A
//! [`VecFieldDescriptor`] names those resources; a [`ResourceLookup`]
//! resolves the names to [`ResourceId`]s.

use crate::id::ResourceId;

/// A spatial component of a vector field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Component {
    /// The x component.
    X,
    /// The y component.
    Y,
    /// The z component.
    Z,
}

impl Component {
    /// All components in registration order.
    pub const ALL: [Component; 3] = [Component::X, Component::Y, Component::Z];

    /// Suffix appended to the vector name for this component.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::X => "_x",
            Self::Y => "_y",
            Self::Z => "_z",
        }
    }
}

/// Anything carrying the name a refiner pool indexes schedules by.
pub trait Quantity {
    /// The quantity name.
    fn name(&self) -> &str;
}

/// Names of a vector field and of its three component resources.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VecFieldDescriptor {
    /// Name of the vector quantity.
    pub name: String,
    /// Resource name of the x component.
    pub x_name: String,
    /// Resource name of the y component.
    pub y_name: String,
    /// Resource name of the z component.
    pub z_name: String,
}

impl VecFieldDescriptor {
    /// Descriptor whose component names are `{name}_x`, `{name}_y`, `{name}_z`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            x_name: format!("{name}{}", Component::X.suffix()),
            y_name: format!("{name}{}", Component::Y.suffix()),
            z_name: format!("{name}{}", Component::Z.suffix()),
            name,
        }
    }

    /// Resource name of one component.
    pub fn component_name(&self, component: Component) -> &str {
        match component {
            Component::X => &self.x_name,
            Component::Y => &self.y_name,
            Component::Z => &self.z_name,
        }
    }
}

impl Quantity for VecFieldDescriptor {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Resolves resource names to ids.
///
/// Returns `None` for names the resource manager does not know. Lower
/// dimensional runs typically register only some components, so a
/// missing name is not an error at this layer.
pub trait ResourceLookup: Send + Sync {
    /// Look up the id registered under `name`.
    fn id(&self, name: &str) -> Option<ResourceId>;
}
