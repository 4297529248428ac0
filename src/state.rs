use nalgebra::{Vector2, Vector3};

/// A desired waypoint of the trajectory in the world frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrajectoryPoint {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub acceleration: Vector3<f64>,
    /// Desired heading (rad)
    pub yaw: f64,
    /// Desired heading rate (rad/s)
    pub yaw_rate: f64,
}

impl TrajectoryPoint {
    /// Hold a position with a fixed heading.
    pub fn hover(position: Vector3<f64>, yaw: f64) -> Self {
        Self {
            position,
            yaw,
            ..Self::default()
        }
    }
}

/// The filtered pose and twist produced by the state estimator.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateEstimate {
    /// World frame position (m)
    pub position: Vector3<f64>,
    /// Roll, pitch and yaw (rad)
    pub attitude: Vector3<f64>,
    /// World frame linear velocity (m/s)
    pub velocity: Vector3<f64>,
    /// Body frame angular velocity p, q, r (rad/s)
    pub angular_velocity: Vector3<f64>,
}

impl StateEstimate {
    /// A vehicle standing still at `position` facing `yaw`.
    pub fn at_rest(position: Vector3<f64>, yaw: f64) -> Self {
        Self {
            position,
            attitude: Vector3::new(0., 0., yaw),
            ..Self::default()
        }
    }

    pub fn is_finite(&self) -> bool {
        [
            self.position,
            self.attitude,
            self.velocity,
            self.angular_velocity,
        ]
        .iter()
        .all(|v| v.iter().all(|n| n.is_finite()))
    }
}

/// The error `e` and its derivative `ė` on one axis.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AxisError {
    pub value: f64,
    pub rate: f64,
}

impl AxisError {
    pub fn new(value: f64, rate: f64) -> Self {
        Self { value, rate }
    }
}

/// Position and linear velocity errors (desired - estimated) in the world frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PositionError {
    pub x: AxisError,
    pub y: AxisError,
    pub z: AxisError,
}

impl PositionError {
    pub fn from_vectors(position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        Self {
            x: AxisError::new(position.x, velocity.x),
            y: AxisError::new(position.y, velocity.y),
            z: AxisError::new(position.z, velocity.z),
        }
    }

    /// The position errors e_x, e_y, e_z.
    pub fn position(&self) -> Vector3<f64> {
        Vector3::new(self.x.value, self.y.value, self.z.value)
    }

    /// The velocity errors ė_x, ė_y, ė_z.
    pub fn velocity(&self) -> Vector3<f64> {
        Vector3::new(self.x.rate, self.y.rate, self.z.rate)
    }
}

/// Attitude and angular rate errors (desired - estimated), angles wrapped into `(-PI, PI]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AttitudeError {
    pub phi: AxisError,
    pub theta: AxisError,
    pub psi: AxisError,
}

impl AttitudeError {
    pub fn from_vectors(angle: Vector3<f64>, rate: Vector3<f64>) -> Self {
        Self {
            phi: AxisError::new(angle.x, rate.x),
            theta: AxisError::new(angle.y, rate.y),
            psi: AxisError::new(angle.z, rate.z),
        }
    }

    /// The angle errors e_φ, e_θ, e_ψ.
    pub fn angle(&self) -> Vector3<f64> {
        Vector3::new(self.phi.value, self.theta.value, self.psi.value)
    }

    /// The angular rate errors ė_φ, ė_θ, ė_ψ.
    pub fn rate(&self) -> Vector3<f64> {
        Vector3::new(self.phi.rate, self.theta.rate, self.psi.rate)
    }
}

/// Velocity setpoint accepted by the autopilot.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VelocityCommand {
    /// Body-frame forward, lateral and world vertical velocity (m/s)
    pub linear: Vector3<f64>,
    /// Yaw rate (rad/s)
    pub yaw_rate: f64,
}

impl VelocityCommand {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.linear == Vector3::zeros() && self.yaw_rate == 0.
    }
}

/// Mutable state of the controller, owned by a single [`Controller`](crate::Controller).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControllerState {
    pub position_error: PositionError,
    pub attitude_error: AttitudeError,

    /// Virtual horizontal forces u_x, u_y (N)
    pub force: Vector2<f64>,
    /// Total thrust reference u_T (N)
    pub thrust: f64,
    /// Thrust error term u_Terr before gravity compensation and saturation (N)
    pub thrust_error: f64,
    /// Torque references u_φ, u_θ, u_ψ (N*m)
    pub torque: Vector3<f64>,

    /// Reference roll φ_r and pitch θ_r (rad)
    pub reference_roll: f64,
    pub reference_pitch: f64,

    /// Altitude integral accumulator e_z_sum (m*s)
    pub altitude_integral: f64,

    /// Last emitted velocity command
    pub command: VelocityCommand,

    pub active: bool,
    pub emergency: bool,
}

impl ControllerState {
    /// Reset to the safe baseline: zero references and command, integral cleared.
    /// The `active` and `emergency` flags are left to the caller.
    pub fn reset(&mut self) {
        *self = Self {
            active: self.active,
            emergency: self.emergency,
            ..Self::default()
        };
    }
}
