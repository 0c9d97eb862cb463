//! Spatial-refinement and time-interpolation operator handles.
//!
//! The operators themselves act on patch data, which is outside this
//! crate. Registrations only carry them through to the transport layer,
//! which applies them while executing a schedule.

use std::fmt;

/// Spatially refines coarse data onto a finer level.
pub trait RefineOperator: Send + Sync + fmt::Debug {
    /// Operator name, used in logs and by transports to select kernels.
    fn name(&self) -> &str;
}

/// Interpolates between a past-time and a future-time source.
pub trait TimeInterpolateOperator: Send + Sync + fmt::Debug {
    /// Operator name.
    fn name(&self) -> &str;

    /// Weights `(past, future)` applied to the two sources to produce
    /// data at `target`, given the sources' times.
    fn weights(&self, past_time: f64, future_time: f64, target: f64) -> (f64, f64);
}

/// Linear interpolation in time.
///
/// A target outside `[past_time, future_time]` is clamped to the nearest
/// end. A degenerate interval uses the future source only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinearTimeInterpolate;

impl TimeInterpolateOperator for LinearTimeInterpolate {
    fn name(&self) -> &str {
        "linear_time_interpolate"
    }

    fn weights(&self, past_time: f64, future_time: f64, target: f64) -> (f64, f64) {
        let span = future_time - past_time;
        if span.abs() <= f64::EPSILON * future_time.abs().max(1.0) {
            return (0.0, 1.0);
        }
        let alpha = ((target - past_time) / span).clamp(0.0, 1.0);
        (1.0 - alpha, alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn midpoint_weights_are_even() {
        let (p, f) = LinearTimeInterpolate.weights(1.0, 2.0, 1.5);
        assert!((p - 0.5).abs() < 1e-12);
        assert!((f - 0.5).abs() < 1e-12);
    }

    #[test]
    fn endpoints_select_one_source() {
        assert_eq!(LinearTimeInterpolate.weights(0.0, 0.4, 0.0), (1.0, 0.0));
        assert_eq!(LinearTimeInterpolate.weights(0.0, 0.4, 0.4), (0.0, 1.0));
    }

    #[test]
    fn degenerate_interval_uses_future_source() {
        assert_eq!(LinearTimeInterpolate.weights(3.0, 3.0, 3.0), (0.0, 1.0));
    }

    #[test]
    fn out_of_range_target_is_clamped() {
        assert_eq!(LinearTimeInterpolate.weights(0.0, 1.0, 2.0), (0.0, 1.0));
        assert_eq!(LinearTimeInterpolate.weights(0.0, 1.0, -1.0), (1.0, 0.0));
    }

    proptest! {
        #[test]
        fn weights_sum_to_one(
            past in -100.0f64..100.0,
            span in 1e-3f64..10.0,
            frac in -0.5f64..1.5,
        ) {
            let future = past + span;
            let (p, f) = LinearTimeInterpolate.weights(past, future, past + frac * span);
            prop_assert!((p + f - 1.0).abs() < 1e-9);
            prop_assert!((0.0..=1.0).contains(&p));
        }
    }
}
