//! Integrator configuration and validation.
//!
//! [`IntegratorConfig`] is the constructor input of
//! [`MultiPhysicsIntegrator`](crate::MultiPhysicsIntegrator).
//! [`validate()`](IntegratorConfig::validate) checks it before any table
//! is allocated.

use thiserror::Error;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`IntegratorConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The hierarchy must have at least the root level.
    #[error("level_count must be at least 1")]
    NoLevels,
    /// `finer_dt_safety` is NaN, infinite, or outside `(0, 1]`.
    #[error("finer_dt_safety must be in (0, 1], got {value}")]
    InvalidDtSafety {
        /// The invalid value.
        value: f64,
    },
}

// ── IntegratorConfig ───────────────────────────────────────────────

/// Static configuration of a [`MultiPhysicsIntegrator`](crate::MultiPhysicsIntegrator).
#[derive(Clone, Debug, PartialEq)]
pub struct IntegratorConfig {
    /// Maximum number of levels the hierarchy may hold. Descriptor
    /// tables are sized to this once.
    pub level_count: usize,
    /// Multiplier applied to the diffusive finer-level dt bound
    /// `coarse_dt / ratio²`. Default: 0.4.
    pub finer_dt_safety: f64,
}

impl IntegratorConfig {
    /// Default safety margin on the finer-level dt.
    pub const DEFAULT_FINER_DT_SAFETY: f64 = 0.4;

    /// Configuration for `level_count` levels with default margins.
    pub fn new(level_count: usize) -> Self {
        Self {
            level_count,
            finer_dt_safety: Self::DEFAULT_FINER_DT_SAFETY,
        }
    }

    /// Check all invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.level_count == 0 {
            return Err(ConfigError::NoLevels);
        }
        let s = self.finer_dt_safety;
        if !s.is_finite() || s <= 0.0 || s > 1.0 {
            return Err(ConfigError::InvalidDtSafety { value: s });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let c = IntegratorConfig::new(3);
        assert_eq!(c.finer_dt_safety, 0.4);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn zero_levels_rejected() {
        assert_eq!(IntegratorConfig::new(0).validate(), Err(ConfigError::NoLevels));
    }

    #[test]
    fn bad_safety_factor_rejected() {
        for value in [0.0, -0.1, 1.5, f64::INFINITY] {
            let c = IntegratorConfig {
                finer_dt_safety: value,
                ..IntegratorConfig::new(2)
            };
            assert_eq!(c.validate(), Err(ConfigError::InvalidDtSafety { value }));
        }
        let nan = IntegratorConfig {
            finer_dt_safety: f64::NAN,
            ..IntegratorConfig::new(2)
        };
        assert!(matches!(
            nan.validate(),
            Err(ConfigError::InvalidDtSafety { .. })
        ));
    }

    #[test]
    fn safety_factor_of_one_accepted() {
        let c = IntegratorConfig {
            finer_dt_safety: 1.0,
            ..IntegratorConfig::new(1)
        };
        assert!(c.validate().is_ok());
    }
}
