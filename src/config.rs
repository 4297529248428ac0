//! Controller, vehicle, filter and safety parameters.
//!
//! Every parameter struct deserializes with `#[serde(default)]`, so a partial document only
//! overrides the fields it names. Defaults are the Parrot Bebop 2 values.
//! Parameters are validated once by [`Config::validate`] and are read-only afterwards.

use crate::ConfigError;
use core::f64::consts::FRAC_PI_2;
use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Sliding-mode gains for a single axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlidingGains {
    /// Stability gain (negative by convention).
    pub beta: f64,
    /// Boundary-layer width (strictly positive).
    pub mu: f64,
}

impl SlidingGains {
    pub const fn new(beta: f64, mu: f64) -> Self {
        Self { beta, mu }
    }
}

/// Sliding-mode gains of the position and attitude loops.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerParameters {
    pub beta_xy: Vector2<f64>,
    pub beta_z: f64,

    pub beta_phi: f64,
    pub beta_theta: f64,
    pub beta_psi: f64,

    pub mu_xy: Vector2<f64>,
    pub mu_z: f64,

    pub mu_phi: f64,
    pub mu_theta: f64,
    pub mu_psi: f64,

    /// Altitude integral gain (1/s)
    pub k_i_z: f64,

    /// Anti-windup clamp of the altitude integral (m*s)
    pub e_z_sum_max: f64,
}

impl Default for ControllerParameters {
    fn default() -> Self {
        Self {
            beta_xy: Vector2::new(-1.3351, -1.1307),
            beta_z: -1.5994,
            beta_phi: -2.2616,
            beta_theta: -2.7457,
            beta_psi: -1.8249,
            mu_xy: Vector2::new(0.08, 0.03),
            mu_z: 0.12,
            mu_phi: 0.09,
            mu_theta: 0.26,
            mu_psi: 0.04,
            k_i_z: 0.3,
            e_z_sum_max: 1.,
        }
    }
}

impl ControllerParameters {
    pub fn x(&self) -> SlidingGains {
        SlidingGains::new(self.beta_xy.x, self.mu_xy.x)
    }

    pub fn y(&self) -> SlidingGains {
        SlidingGains::new(self.beta_xy.y, self.mu_xy.y)
    }

    pub fn z(&self) -> SlidingGains {
        SlidingGains::new(self.beta_z, self.mu_z)
    }

    pub fn phi(&self) -> SlidingGains {
        SlidingGains::new(self.beta_phi, self.mu_phi)
    }

    pub fn theta(&self) -> SlidingGains {
        SlidingGains::new(self.beta_theta, self.mu_theta)
    }

    pub fn psi(&self) -> SlidingGains {
        SlidingGains::new(self.beta_psi, self.mu_psi)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        negative("beta_x", self.beta_xy.x)?;
        negative("beta_y", self.beta_xy.y)?;
        negative("beta_z", self.beta_z)?;
        negative("beta_phi", self.beta_phi)?;
        negative("beta_theta", self.beta_theta)?;
        negative("beta_psi", self.beta_psi)?;

        positive("mu_x", self.mu_xy.x)?;
        positive("mu_y", self.mu_xy.y)?;
        positive("mu_z", self.mu_z)?;
        positive("mu_phi", self.mu_phi)?;
        positive("mu_theta", self.mu_theta)?;
        positive("mu_psi", self.mu_psi)?;

        non_negative("k_i_z", self.k_i_z)?;
        non_negative("e_z_sum_max", self.e_z_sum_max)
    }
}

/// Physical constants of the vehicle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleParameters {
    /// Mass (kg)
    pub mass: f64,
    /// Gravity (m/s^2)
    pub gravity: f64,
    /// Arm length (m)
    pub arm_length: f64,
    /// Rotor thrust coefficient b_f (N*s^2/rad^2)
    pub thrust_coefficient: f64,
    /// Rotor drag moment coefficient b_m
    pub moment_coefficient: f64,
    /// Principal moments of inertia I_x, I_y, I_z (kg*m^2)
    pub inertia: Vector3<f64>,
    /// Maximum rotor angular velocity (rad/s)
    pub max_rotor_velocity: f64,
}

impl Default for VehicleParameters {
    fn default() -> Self {
        Self {
            mass: 0.5,
            gravity: 9.81,
            arm_length: 0.12905,
            thrust_coefficient: 8.54858e-6,
            moment_coefficient: 0.016,
            inertia: Vector3::new(0.00389, 0.00389, 0.0078),
            max_rotor_velocity: 1475.,
        }
    }
}

impl VehicleParameters {
    /// The collective thrust (in Newtons) of four rotors spinning at full speed.
    pub fn max_thrust(&self) -> f64 {
        4. * self.thrust_coefficient * self.max_rotor_velocity.powi(2)
    }

    /// The weight (in Newtons) of the vehicle.
    pub fn weight(&self) -> f64 {
        self.mass * self.gravity
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("mass", self.mass)?;
        positive("gravity", self.gravity)?;
        non_negative("arm_length", self.arm_length)?;
        positive("thrust_coefficient", self.thrust_coefficient)?;
        non_negative("moment_coefficient", self.moment_coefficient)?;
        positive("inertia_x", self.inertia.x)?;
        positive("inertia_y", self.inertia.y)?;
        positive("inertia_z", self.inertia.z)?;
        positive("max_rotor_velocity", self.max_rotor_velocity)?;

        if self.max_thrust() <= self.weight() {
            return Err(ConfigError::OutOfRange {
                name: "max_thrust",
                value: self.max_thrust(),
                min: self.weight(),
                max: f64::INFINITY,
            });
        }
        Ok(())
    }
}

/// Tuning consumed by the state estimator only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParameters {
    /// Low-pass cutoff for the linear velocity (hz), 0 disables filtering
    pub velocity_cutoff_hz: f64,
    /// Low-pass cutoff for the angular velocity (hz), 0 disables filtering
    pub angular_velocity_cutoff_hz: f64,
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self {
            velocity_cutoff_hz: 20.,
            angular_velocity_cutoff_hz: 40.,
        }
    }
}

impl FilterParameters {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("velocity_cutoff_hz", self.velocity_cutoff_hz)?;
        non_negative("angular_velocity_cutoff_hz", self.angular_velocity_cutoff_hz)
    }
}

/// Vehicle-safe limits applied to every emitted velocity command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandLimits {
    /// Horizontal velocity limit (m/s)
    pub max_horizontal_velocity: f64,
    /// Vertical velocity limit (m/s)
    pub max_vertical_velocity: f64,
    /// Yaw rate limit (rad/s)
    pub max_yaw_rate: f64,
    /// Maximum tilt of the reference angles (rad)
    pub max_tilt: f64,
}

impl Default for CommandLimits {
    fn default() -> Self {
        Self {
            max_horizontal_velocity: 1.,
            max_vertical_velocity: 1.,
            max_yaw_rate: 1.7,
            max_tilt: 0.35,
        }
    }
}

impl CommandLimits {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("max_horizontal_velocity", self.max_horizontal_velocity)?;
        positive("max_vertical_velocity", self.max_vertical_velocity)?;
        positive("max_yaw_rate", self.max_yaw_rate)?;
        positive("max_tilt", self.max_tilt)?;

        if self.max_tilt >= FRAC_PI_2 {
            return Err(ConfigError::OutOfRange {
                name: "max_tilt",
                value: self.max_tilt,
                min: 0.,
                max: FRAC_PI_2,
            });
        }
        Ok(())
    }
}

/// Fault detection thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyParameters {
    /// Maximum age of the state estimate (s)
    pub estimate_timeout: f64,
    /// Maximum time the command may stay pinned at its limits (s)
    pub saturation_timeout: f64,
    /// Geofence half-widths around the origin (m)
    pub max_position: Vector3<f64>,
}

impl Default for SafetyParameters {
    fn default() -> Self {
        Self {
            estimate_timeout: 0.5,
            saturation_timeout: 1.,
            max_position: Vector3::new(10., 10., 5.),
        }
    }
}

impl SafetyParameters {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("estimate_timeout", self.estimate_timeout)?;
        positive("saturation_timeout", self.saturation_timeout)?;
        positive("max_position_x", self.max_position.x)?;
        positive("max_position_y", self.max_position.y)?;
        positive("max_position_z", self.max_position.z)
    }
}

/// Frequencies (in hz) of the scheduler loop and its three tasks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateParameters {
    pub loop_rate_hz: i16,
    pub attitude_hz: f32,
    pub position_hz: f32,
    pub land_monitor_hz: f32,
}

impl Default for RateParameters {
    fn default() -> Self {
        Self {
            loop_rate_hz: 500,
            attitude_hz: 500.,
            position_hz: 100.,
            land_monitor_hz: 10.,
        }
    }
}

impl RateParameters {
    /// The scheduler loop period in seconds.
    pub fn loop_period(&self) -> f64 {
        1. / self.loop_rate_hz as f64
    }

    pub fn attitude_period(&self) -> f64 {
        1. / self.attitude_hz as f64
    }

    pub fn position_period(&self) -> f64 {
        1. / self.position_hz as f64
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("loop_rate_hz", self.loop_rate_hz as f64)?;
        positive("attitude_hz", self.attitude_hz as f64)?;
        positive("position_hz", self.position_hz as f64)?;
        positive("land_monitor_hz", self.land_monitor_hz as f64)?;

        if self.attitude_hz <= self.position_hz {
            return Err(ConfigError::RateOrder {
                attitude: self.attitude_hz,
                position: self.position_hz,
            });
        }
        Ok(())
    }
}

/// The complete configuration loaded once at startup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub controller: ControllerParameters,
    pub vehicle: VehicleParameters,
    pub filter: FilterParameters,
    pub limits: CommandLimits,
    pub safety: SafetyParameters,
    pub rates: RateParameters,
}

impl Config {
    /// Parse and validate a YAML configuration document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.controller.validate()?;
        self.vehicle.validate()?;
        self.filter.validate()?;
        self.limits.validate()?;
        self.safety.validate()?;
        self.rates.validate()
    }
}

fn finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { name, value })
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(name, value)?;
    if value > 0. {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

fn negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(name, value)?;
    if value < 0. {
        Ok(())
    } else {
        Err(ConfigError::WrongSign { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(name, value)?;
    if value >= 0. {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min: 0.,
            max: f64::INFINITY,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn zero_boundary_layer_is_rejected() {
        let mut config = Config::default();
        config.controller.mu_z = 0.;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { name: "mu_z", .. })
        ));
    }

    #[test]
    fn zero_mass_is_rejected() {
        let mut config = Config::default();
        config.vehicle.mass = 0.;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { name: "mass", .. })
        ));
    }

    #[test]
    fn positive_beta_is_rejected() {
        let mut config = Config::default();
        config.controller.beta_xy.y = 1.1307;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::WrongSign { name: "beta_y", .. })
        ));
    }

    #[test]
    fn nan_gain_is_rejected() {
        let mut config = Config::default();
        config.controller.mu_psi = f64::NAN;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite { name: "mu_psi", .. })
        ));
    }

    #[test]
    fn vertical_tilt_is_rejected() {
        let mut config = Config::default();
        config.limits.max_tilt = FRAC_PI_2;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { name: "max_tilt", .. })
        ));
    }

    #[test]
    fn attitude_slower_than_position_is_rejected() {
        let mut config = Config::default();
        config.rates.attitude_hz = 50.;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::RateOrder { .. })
        ));
    }

    #[test]
    fn attitude_at_position_rate_is_rejected() {
        let mut config = Config::default();
        config.rates.attitude_hz = 100.;
        config.rates.position_hz = 100.;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::RateOrder { .. })
        ));

        config.rates.attitude_hz = 101.;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn underpowered_vehicle_is_rejected() {
        let mut config = Config::default();
        config.vehicle.mass = 10.;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { name: "max_thrust", .. })
        ));
    }

    #[test]
    fn yaml_overrides_only_named_fields() {
        let config = Config::from_yaml(
            "
controller:
  beta_xy: [-1.0, -2.0]
  mu_z: 0.2
vehicle:
  mass: 0.6
rates:
  position_hz: 50.0
",
        )
        .unwrap();

        assert_eq!(config.controller.beta_xy, Vector2::new(-1., -2.));
        assert_eq!(config.controller.mu_z, 0.2);
        assert_eq!(config.controller.beta_z, -1.5994);
        assert_eq!(config.vehicle.mass, 0.6);
        assert_eq!(config.vehicle.gravity, 9.81);
        assert_eq!(config.rates.position_hz, 50.);
        assert_eq!(config.limits, CommandLimits::default());
    }

    #[test]
    fn yaml_with_invalid_value_is_rejected() {
        let result = Config::from_yaml("controller:\n  mu_z: 0.0\n");
        assert!(matches!(result, Err(ConfigError::NonPositive { .. })));
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        let result = Config::from_yaml("controller: [1, 2");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn gains_are_grouped_per_axis() {
        let params = ControllerParameters::default();
        assert_eq!(params.x(), SlidingGains::new(-1.3351, 0.08));
        assert_eq!(params.y(), SlidingGains::new(-1.1307, 0.03));
        assert_eq!(params.z(), SlidingGains::new(-1.5994, 0.12));
        assert_eq!(params.psi(), SlidingGains::new(-1.8249, 0.04));
    }
}
