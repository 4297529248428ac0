use super::SlidingSurface;
use crate::{constrain, ControllerParameters, ControllerState, VehicleParameters};
use nalgebra::{Vector2, Vector3};

/// Outer sliding-mode loop on x, y and z producing the virtual forces and the thrust reference.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionLoop {
    pub x: SlidingSurface,
    pub y: SlidingSurface,
    pub z: SlidingSurface,
    pub mass: f64,
    pub gravity: f64,
    pub max_thrust: f64,
    /// Altitude integral gain (1/s)
    pub k_i: f64,
    /// Anti-windup clamp of the altitude integral (m*s)
    pub integral_max: f64,
}

impl PositionLoop {
    pub fn new(controller: &ControllerParameters, vehicle: &VehicleParameters) -> Self {
        Self {
            x: SlidingSurface::new(controller.x()),
            y: SlidingSurface::new(controller.y()),
            z: SlidingSurface::new(controller.z()),
            mass: vehicle.mass,
            gravity: vehicle.gravity,
            max_thrust: vehicle.max_thrust(),
            k_i: controller.k_i_z,
            integral_max: controller.e_z_sum_max,
        }
    }

    /// Update the force and thrust references from the current position errors.
    ///
    /// `acceleration_ff` is the trajectory's desired acceleration and `dt` the time (in seconds)
    /// since the last update.
    pub fn update(&self, state: &mut ControllerState, acceleration_ff: Vector3<f64>, dt: f64) {
        let error = state.position_error;

        // 1. Integrate the altitude error, clamped to prevent wind-up
        state.altitude_integral = constrain(
            state.altitude_integral + error.z.value * dt,
            -self.integral_max,
            self.integral_max,
        );

        // 2. Calculate the horizontal virtual forces
        state.force = self.mass
            * Vector2::new(
                acceleration_ff.x + self.x.control(error.x),
                acceleration_ff.y + self.y.control(error.y),
            );

        // 3. Calculate the vertical thrust error without gravity compensation
        state.thrust_error = self.mass * (acceleration_ff.z + self.z.control(error.z));

        // 4. Add gravity and the integral term, then take the magnitude of the total force vector
        let vertical = self.mass * (self.gravity + self.k_i * state.altitude_integral)
            + state.thrust_error;
        state.thrust = Vector3::new(state.force.x, state.force.y, vertical)
            .norm()
            .min(self.max_thrust);
    }
}
