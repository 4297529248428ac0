//! # smc-flight
//! A cascaded sliding-mode position controller for quadrotors that emit velocity setpoints
//! to an onboard autopilot.
//!
//! # Components
//! [`control`] contains the error dynamics, the outer position loop, the inner attitude loop,
//! the reference angle inversion coupling them, and the velocity command synthesis.
//!
//! [`emergency`] contains the fail-stop state machine driving `Normal -> Emergency -> Landing -> Terminated`.
//!
//! [`scheduler`] contains the multi-rate scheduler that runs the attitude, position and land-monitor
//! tasks at their own frequencies.
//!
//! [`Controller`] owns the [`ControllerState`] and glues everything together.
//! (see [`controller_tasks`] for the task table and [`host::run`] for a tokio event loop driving it)
//!
//! # Example
//! ```
//! use smc_flight::{Builder, Config, Signal, StateEstimate, TrajectoryPoint};
//! use nalgebra::Vector3;
//!
//! let mut controller = Builder::new(Config::default(), Vec::<Signal>::new()).build().unwrap();
//!
//! controller.set_trajectory_point(TrajectoryPoint::hover(Vector3::new(0., 0., 1.), 0.));
//! controller.set_odom(StateEstimate::at_rest(Vector3::new(0., 0., 0.9), 0.));
//!
//! controller.position_update(0.01);
//! controller.attitude_update(0.002);
//!
//! let command = controller.calculate_command_signals();
//! assert!(command.linear.z > 0.);
//! ```

use num_traits::{float::FloatConst, Float};

pub mod config;
pub use config::{
    CommandLimits, Config, ControllerParameters, FilterParameters, RateParameters,
    SafetyParameters, SlidingGains, VehicleParameters,
};

pub mod control;

pub mod controller;
pub use controller::{
    attitude_task, controller_tasks, land_monitor_task, position_task, Builder, Controller,
};

pub mod emergency;
pub use emergency::{EmergencyStateMachine, FlightState};

pub mod error;
pub use error::{ConfigError, EstimationFault, Fault};

pub mod estimator;
pub use estimator::{Estimator, LowPassEstimator, Odometry};

mod filter;

pub mod hal;
pub use hal::{ChannelSink, CommandSink, Signal};

pub mod host;

pub mod scheduler;
pub use scheduler::Scheduler;

pub mod state;
pub use state::{
    AttitudeError, AxisError, ControllerState, PositionError, StateEstimate, TrajectoryPoint,
    VelocityCommand,
};

/// Constrain `amt` between `low` and `high`.
/// A NaN input returns the midpoint so it can never leak into an actuator command.
pub fn constrain<T: Float>(amt: T, low: T, high: T) -> T {
    if amt.is_nan() {
        return (low + high) / (T::one() + T::one());
    }

    if amt < low {
        return low;
    }

    if amt > high {
        return high;
    }

    amt
}

/// Wrap an angle (in radians) into `(-PI, PI]`.
pub fn wrap_pi<T: Float + FloatConst>(angle: T) -> T {
    let two_pi = T::PI() + T::PI();
    let wrapped = angle % two_pi;

    if wrapped > T::PI() {
        wrapped - two_pi
    } else if wrapped <= -T::PI() {
        wrapped + two_pi
    } else {
        wrapped
    }
}
