use nalgebra::Vector3;
use thiserror::Error;

/// A configuration fault detected while loading parameters.
/// The controller refuses to start when any parameter is rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be strictly positive (got {value})")]
    NonPositive { name: &'static str, value: f64 },
    #[error("{name} must be finite (got {value})")]
    NonFinite { name: &'static str, value: f64 },
    #[error("{name} must lie in [{min}, {max}] (got {value})")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{name} must be negative to keep the sliding surface attracting (got {value})")]
    WrongSign { name: &'static str, value: f64 },
    #[error("attitude rate ({attitude} hz) must be faster than the position rate ({position} hz)")]
    RateOrder { attitude: f32, position: f32 },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Reasons the state estimate can no longer be trusted.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum EstimationFault {
    #[error("state estimate is stale ({age:.3} s old)")]
    Stale { age: f64 },
    #[error("state estimate contains non-finite values")]
    NonFinite,
    #[error("state estimate position {position:?} is outside the geofence")]
    OutOfBounds { position: Vector3<f64> },
}

/// A fault that moves the controller out of normal operation.
///
/// Faults never escape the control functions as errors,
/// they are handed to the [`EmergencyStateMachine`](crate::EmergencyStateMachine) instead.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Fault {
    #[error("estimation fault: {0}")]
    Estimation(#[from] EstimationFault),
    #[error("command saturated for {duration:.3} s")]
    Saturation { duration: f64 },
    #[error("external fault: {0}")]
    External(String),
}
