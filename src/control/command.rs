use crate::{CommandLimits, Config, ControllerState, TrajectoryPoint, VelocityCommand};
use nalgebra::Vector3;

/// Lower bound of `cos(φ)·cos(θ)` when projecting the thrust onto the vertical axis.
const MIN_TILT_COSINE: f64 = 0.1;

/// Maps the force and torque references to a velocity command for the autopilot.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandSynthesizer {
    pub limits: CommandLimits,
    pub mass: f64,
    pub moi: Vector3<f64>,
    /// Surface slopes λ_φ, λ_θ, λ_ψ of the attitude loop (1/s)
    pub lambda_attitude: Vector3<f64>,
    /// Surface slope λ_z of the altitude loop (1/s)
    pub lambda_z: f64,
    /// Altitude integral gain (1/s)
    pub k_i: f64,
    /// Attitude loop period (s)
    pub attitude_period: f64,
    /// Position loop period (s)
    pub position_period: f64,
}

impl CommandSynthesizer {
    pub fn new(config: &Config) -> Self {
        let gains = &config.controller;
        Self {
            limits: config.limits.clone(),
            mass: config.vehicle.mass,
            moi: config.vehicle.inertia,
            lambda_attitude: -Vector3::new(gains.beta_phi, gains.beta_theta, gains.beta_psi),
            lambda_z: -gains.beta_z,
            k_i: gains.k_i_z,
            attitude_period: config.rates.attitude_period(),
            position_period: config.rates.position_period(),
        }
    }

    /// Calculate the velocity command from the current references.
    ///
    /// Returns the clamped command and whether any component reached its limit before clamping.
    pub fn synthesize(
        &self,
        state: &ControllerState,
        trajectory: &TrajectoryPoint,
        attitude: Vector3<f64>,
    ) -> (VelocityCommand, bool) {
        let tau = self.attitude_period;
        let attitude_error = state.attitude_error.angle();

        // 1. Turn the torque references into angular accelerations
        let angular_accel = state.torque.component_div(&self.moi);

        // 2. Rates that close the attitude errors along their sliding surfaces,
        //    plus the rate the torque builds up over one attitude period
        let rate = self.lambda_attitude.component_mul(&attitude_error) + angular_accel * tau;

        // 3. Tilt the reference angles by the correction that rate makes before the next
        //    reference update and normalize by the maximum tilt
        let roll = state.reference_roll + rate.x * self.position_period;
        let pitch = state.reference_pitch + rate.y * self.position_period;

        let horizontal = self.limits.max_horizontal_velocity / self.limits.max_tilt;
        let forward = horizontal * pitch;
        let lateral = -horizontal * roll;

        // 4. Close the altitude error, project the thrust error onto the vertical axis
        //    and add the altitude integral
        let tilt = (attitude.x.cos() * attitude.y.cos()).max(MIN_TILT_COSINE);
        let vertical = trajectory.velocity.z
            + self.lambda_z * state.position_error.z.value
            + state.thrust_error * self.position_period / (self.mass * tilt)
            + self.k_i * state.altitude_integral;

        let yaw_rate = trajectory.yaw_rate + rate.z;

        let (forward, forward_sat) = limit(forward, self.limits.max_horizontal_velocity);
        let (lateral, lateral_sat) = limit(lateral, self.limits.max_horizontal_velocity);
        let (vertical, vertical_sat) = limit(vertical, self.limits.max_vertical_velocity);
        let (yaw_rate, yaw_sat) = limit(yaw_rate, self.limits.max_yaw_rate);

        let command = VelocityCommand {
            linear: Vector3::new(forward, lateral, vertical),
            yaw_rate,
        };
        (command, forward_sat || lateral_sat || vertical_sat || yaw_sat)
    }
}

fn limit(value: f64, max: f64) -> (f64, bool) {
    (crate::constrain(value, -max, max), value.abs() >= max)
}
