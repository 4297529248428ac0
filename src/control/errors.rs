use crate::{wrap_pi, AttitudeError, PositionError, StateEstimate, TrajectoryPoint};
use nalgebra::Vector3;

/// Tracking errors between the desired and estimated state.
#[derive(Clone, Copy, Debug, Default)]
pub struct ErrorDynamics;

impl ErrorDynamics {
    /// Calculate the position and velocity errors (desired - estimated) in the world frame.
    /// The desired velocity is the trajectory's feed-forward velocity.
    pub fn position_errors(trajectory: &TrajectoryPoint, estimate: &StateEstimate) -> PositionError {
        PositionError::from_vectors(
            trajectory.position - estimate.position,
            trajectory.velocity - estimate.velocity,
        )
    }

    /// Calculate the attitude and angular rate errors from the desired roll, pitch and yaw
    /// and the desired yaw rate.
    ///
    /// Angle errors are wrapped into `(-PI, PI]` so a heading change never takes the long way round.
    /// The estimated body rates are converted to euler angle rates before differencing.
    pub fn attitude_errors(
        desired: Vector3<f64>,
        desired_yaw_rate: f64,
        estimate: &StateEstimate,
    ) -> AttitudeError {
        let angle = (desired - estimate.attitude).map(wrap_pi);

        let euler_rate = ang_vel_to_euler_rate(estimate.attitude, estimate.angular_velocity)
            .unwrap_or(estimate.angular_velocity);
        let rate = Vector3::new(0., 0., desired_yaw_rate) - euler_rate;

        AttitudeError::from_vectors(angle, rate)
    }
}

// Convert a body frame angular velocity vector to a 321-intrinsic euler angle derivative.
// Returns `None` if the vehicle is pitched 90 degrees up or down
fn ang_vel_to_euler_rate(euler_rad: Vector3<f64>, ang_vel_rads: Vector3<f64>) -> Option<Vector3<f64>> {
    let (sin_phi, cos_phi) = euler_rad.x.sin_cos();
    let (sin_theta, cos_theta) = euler_rad.y.sin_cos();

    // The euler angles are discontinuous when pitched all the way up or down
    if cos_theta.abs() < f64::EPSILON {
        return None;
    }

    let tan_theta = sin_theta / cos_theta;
    Some(Vector3::new(
        ang_vel_rads.x + sin_phi * tan_theta * ang_vel_rads.y + cos_phi * tan_theta * ang_vel_rads.z,
        cos_phi * ang_vel_rads.y - sin_phi * ang_vel_rads.z,
        (sin_phi / cos_theta) * ang_vel_rads.y + (cos_phi / cos_theta) * ang_vel_rads.z,
    ))
}
