//! The boundary between raw odometry and the controller.

use crate::{filter::LowPassFilter, FilterParameters, StateEstimate};
use nalgebra::{UnitQuaternion, Vector3};

/// Raw pose and twist as published by the localization stack.
#[derive(Clone, Debug, PartialEq)]
pub struct Odometry {
    /// World frame position (m)
    pub position: Vector3<f64>,
    /// Body to world rotation
    pub orientation: UnitQuaternion<f64>,
    /// World frame linear velocity (m/s)
    pub velocity: Vector3<f64>,
    /// Body frame angular velocity (rad/s)
    pub angular_velocity: Vector3<f64>,
}

impl Default for Odometry {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
        }
    }
}

impl Odometry {
    /// Roll, pitch and yaw (rad) of the orientation.
    pub fn euler_angles(&self) -> Vector3<f64> {
        let (roll, pitch, yaw) = self.orientation.euler_angles();
        Vector3::new(roll, pitch, yaw)
    }
}

/// Turns odometry into the filtered state the control loops consume.
pub trait Estimator {
    fn estimate(&mut self, odometry: &Odometry) -> StateEstimate;
}

impl<T> Estimator for &mut T
where
    T: Estimator + ?Sized,
{
    fn estimate(&mut self, odometry: &Odometry) -> StateEstimate {
        (&mut **self).estimate(odometry)
    }
}

/// An [`Estimator`] smoothing the measured velocities with first-order low-pass filters.
/// Position and attitude are passed through untouched.
#[derive(Clone, Debug)]
pub struct LowPassEstimator {
    velocity: LowPassFilter,
    angular_velocity: LowPassFilter,
}

impl LowPassEstimator {
    /// Create an estimator for odometry arriving at `sample_hz`.
    pub fn new(filter: &FilterParameters, sample_hz: f64) -> Self {
        Self {
            velocity: LowPassFilter::with_sample_rate_and_cutoff(
                sample_hz,
                filter.velocity_cutoff_hz,
            ),
            angular_velocity: LowPassFilter::with_sample_rate_and_cutoff(
                sample_hz,
                filter.angular_velocity_cutoff_hz,
            ),
        }
    }

    pub fn reset(&mut self) {
        self.velocity.reset();
        self.angular_velocity.reset();
    }
}

impl Estimator for LowPassEstimator {
    fn estimate(&mut self, odometry: &Odometry) -> StateEstimate {
        StateEstimate {
            position: odometry.position,
            attitude: odometry.euler_angles(),
            velocity: self.velocity.apply(odometry.velocity),
            angular_velocity: self.angular_velocity.apply(odometry.angular_velocity),
        }
    }
}
