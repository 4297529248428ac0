use super::SlidingSurface;
use crate::{ControllerParameters, ControllerState, VehicleParameters};
use nalgebra::Vector3;

/// Inner sliding-mode loop on roll, pitch and yaw producing the torque references.
#[derive(Clone, Debug, PartialEq)]
pub struct AttitudeLoop {
    pub phi: SlidingSurface,
    pub theta: SlidingSurface,
    pub psi: SlidingSurface,
    /// Moments of inertia I_x, I_y, I_z (kg*m^2)
    pub moi: Vector3<f64>,
}

impl AttitudeLoop {
    pub fn new(controller: &ControllerParameters, vehicle: &VehicleParameters) -> Self {
        Self {
            phi: SlidingSurface::new(controller.phi()),
            theta: SlidingSurface::new(controller.theta()),
            psi: SlidingSurface::new(controller.psi()),
            moi: vehicle.inertia,
        }
    }

    /// Update the roll, pitch and yaw torque references (in N*m) from the current attitude errors
    /// and the body frame angular velocity.
    pub fn update(&self, state: &mut ControllerState, body_rate: Vector3<f64>) {
        let error = state.attitude_error;

        let angular_accel = Vector3::new(
            self.phi.control(error.phi),
            self.theta.control(error.theta),
            self.psi.control(error.psi),
        );

        state.torque = self.moi.component_mul(&angular_accel) - self.gyroscopic(body_rate);
    }

    /// The inertial cross-coupling `(I_y - I_z)·q·r, (I_z - I_x)·p·r, (I_x - I_y)·p·q`
    /// accelerating the rigid body on its own.
    pub fn gyroscopic(&self, body_rate: Vector3<f64>) -> Vector3<f64> {
        let (ix, iy, iz) = (self.moi.x, self.moi.y, self.moi.z);
        let (p, q, r) = (body_rate.x, body_rate.y, body_rate.z);

        Vector3::new((iy - iz) * q * r, (iz - ix) * p * r, (ix - iy) * p * q)
    }
}
