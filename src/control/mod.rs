//! Sliding-mode flight control laws.
//!
//! Every axis uses the same structure: a sliding surface `s = ė + λe` with `λ = -β`,
//! and a control law `-β·ė - α·sat(s/μ)` where `α = β - 1` and `sat` is the boundary-layer
//! saturation that replaces the discontinuous sign function.

use crate::{config::SlidingGains, constrain, AxisError};
use num_traits::Float;

mod attitude;
pub use attitude::AttitudeLoop;

mod command;
pub use command::CommandSynthesizer;

mod errors;
pub use errors::ErrorDynamics;

mod position;
pub use position::PositionLoop;

mod reference;
pub use reference::ReferenceAngleGenerator;

/// Linear boundary-layer saturation clamped to `[-1, 1]`.
pub fn sat<T: Float>(x: T) -> T {
    constrain(x, -T::one(), T::one())
}

/// The sliding-mode law of a single axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlidingSurface {
    beta: f64,
    mu: f64,
}

impl SlidingSurface {
    /// Create a surface from validated gains (`mu` must be strictly positive).
    pub fn new(gains: SlidingGains) -> Self {
        Self {
            beta: gains.beta,
            mu: gains.mu,
        }
    }

    /// The slope `λ = -β` of the sliding surface.
    pub fn lambda(&self) -> f64 {
        -self.beta
    }

    /// The switching gain `α = β - 1`.
    pub fn alpha(&self) -> f64 {
        self.beta - 1.
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Evaluate `s = ė + λe`.
    pub fn surface(&self, error: AxisError) -> f64 {
        error.rate + self.lambda() * error.value
    }

    /// The normalized switching term `sat(s/μ)`.
    pub fn switching(&self, error: AxisError) -> f64 {
        sat(self.surface(error) / self.mu)
    }

    /// The acceleration demanded on this axis to drive the surface to zero.
    pub fn control(&self, error: AxisError) -> f64 {
        -self.beta * error.rate - self.alpha() * self.switching(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn altitude() -> SlidingSurface {
        SlidingSurface::new(SlidingGains::new(-1.5994, 0.12))
    }

    #[test]
    fn sat_stays_in_unit_band() {
        for s in [-1e9, -3., -1., -0.4, 0., 0.4, 1., 3., 1e9] {
            let out = sat(s / 0.12);
            assert!((-1. ..=1.).contains(&out));
        }
        assert_eq!(sat(1e9_f64), 1.);
        assert_eq!(sat(-1e9_f64), -1.);
        assert_eq!(sat(0.5_f64), 0.5);
    }

    #[test]
    fn surface_is_attracting() {
        let surface = altitude();
        assert_relative_eq!(surface.lambda(), 1.5994);
        assert_relative_eq!(surface.alpha(), -2.5994);

        // Below the target: push up
        assert!(surface.control(AxisError::new(0.1, 0.)) > 0.);

        // Above the target: push down
        assert!(surface.control(AxisError::new(-0.1, 0.)) < 0.);

        // Falling behind the desired velocity: push up
        assert!(surface.control(AxisError::new(0., 0.05)) > 0.);
    }

    #[test]
    fn zero_error_gives_zero_control() {
        assert_eq!(altitude().control(AxisError::default()), 0.);
    }

    #[test]
    fn inside_boundary_layer_is_linear() {
        let surface = altitude();
        let error = AxisError::new(0.01, 0.);
        let s = surface.surface(error);
        assert!(s.abs() < surface.mu());
        assert_relative_eq!(surface.switching(error), s / 0.12);
    }

    #[test]
    fn outside_boundary_layer_saturates() {
        let surface = altitude();
        assert_eq!(surface.switching(AxisError::new(10., 0.)), 1.);
        assert_eq!(surface.switching(AxisError::new(-10., 0.)), -1.);
    }
}
