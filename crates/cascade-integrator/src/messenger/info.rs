use cascade_core::VecFieldDescriptor;

/// Resources of one quantity whose ghosts are filled from the coarser
/// level with time interpolation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GhostQuantity {
    /// Destination of the ghost fill.
    pub ghost: VecFieldDescriptor,
    /// Current model state. Ghost schedules are keyed by its name.
    pub model: VecFieldDescriptor,
    /// Model state at the start of the coarser step.
    pub old_model: VecFieldDescriptor,
}

impl GhostQuantity {
    /// Ghost quantity whose ghost and old resources are named
    /// `{name}_ghost` and `{name}_old`.
    pub fn from_model_name(name: &str) -> Self {
        Self {
            ghost: VecFieldDescriptor::new(format!("{name}_ghost")),
            model: VecFieldDescriptor::new(name),
            old_model: VecFieldDescriptor::new(format!("{name}_old")),
        }
    }
}

/// Quantities a model or solver exchanges with adjacent levels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessengerInfo {
    /// Quantities with time-interpolated ghost fills.
    pub ghost_quantities: Vec<GhostQuantity>,
    /// Quantities refined from the coarser level when a level is created.
    pub init_quantities: Vec<VecFieldDescriptor>,
    /// Quantities coarsened into the coarser level at synchronization.
    pub sync_quantities: Vec<VecFieldDescriptor>,
}

impl MessengerInfo {
    /// Whether nothing was declared.
    pub fn is_empty(&self) -> bool {
        self.ghost_quantities.is_empty()
            && self.init_quantities.is_empty()
            && self.sync_quantities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_ghost_names() {
        let g = GhostQuantity::from_model_name("EM_B");
        assert_eq!(g.ghost.x_name, "EM_B_ghost_x");
        assert_eq!(g.model.z_name, "EM_B_z");
        assert_eq!(g.old_model.name, "EM_B_old");
    }

    #[test]
    fn default_info_is_empty() {
        let mut info = MessengerInfo::default();
        assert!(info.is_empty());
        info.sync_quantities.push(VecFieldDescriptor::new("EM_E"));
        assert!(!info.is_empty());
    }
}
