//! Fail-stop supervision of the controller.
//!
//! The flight state only ever moves forward:
//! `Normal -> Emergency -> Landing -> Terminated`.
//! Once out of `Normal` the controller stops producing motion commands, asks the autopilot to land
//! and finally resets it after touchdown is confirmed.

use crate::{CommandSink, EstimationFault, Fault, SafetyParameters, StateEstimate};
use log::{info, warn};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum FlightState {
    #[default]
    Normal,
    Emergency,
    Landing,
    Terminated,
}

/// Tracks the health of the inputs and drives the [`FlightState`].
#[derive(Clone, Debug)]
pub struct EmergencyStateMachine {
    state: FlightState,
    safety: SafetyParameters,
    /// Time since the last valid estimate, `None` before the first one
    estimate_age: Option<f64>,
    /// Consecutive time the velocity command spent at a limit
    saturated_for: f64,
    pending: Option<Fault>,
    cause: Option<Fault>,
}

impl EmergencyStateMachine {
    pub fn new(safety: SafetyParameters) -> Self {
        Self {
            state: FlightState::Normal,
            safety,
            estimate_age: None,
            saturated_for: 0.,
            pending: None,
            cause: None,
        }
    }

    pub fn state(&self) -> FlightState {
        self.state
    }

    /// The fault that ended normal operation.
    pub fn cause(&self) -> Option<&Fault> {
        self.cause.as_ref()
    }

    /// Check a new estimate before it is handed to the control loops.
    ///
    /// A rejected estimate is remembered and reported on the next [`monitor`](Self::monitor).
    pub fn check_estimate(&mut self, estimate: &StateEstimate) -> Result<(), EstimationFault> {
        let result = if !estimate.is_finite() {
            Err(EstimationFault::NonFinite)
        } else if estimate
            .position
            .iter()
            .zip(self.safety.max_position.iter())
            .any(|(p, max)| p.abs() > *max)
        {
            Err(EstimationFault::OutOfBounds {
                position: estimate.position,
            })
        } else {
            Ok(())
        };

        match &result {
            Ok(()) => self.estimate_age = Some(0.),
            Err(fault) => {
                if self.pending.is_none() {
                    self.pending = Some(fault.clone().into());
                }
            }
        }
        result
    }

    /// Accumulate the time the velocity command spends saturated.
    pub fn track_saturation(&mut self, saturated: bool, dt: f64) {
        if saturated {
            self.saturated_for += dt;
        } else {
            self.saturated_for = 0.;
        }
    }

    /// Queue a fault raised outside the controller.
    pub fn signal_fault(&mut self, reason: impl Into<String>) {
        if self.pending.is_none() {
            self.pending = Some(Fault::External(reason.into()));
        }
    }

    /// Advance the monitor by `dt` seconds.
    ///
    /// In `Normal` this looks for a fault and returns `true` when it switched to `Emergency`.
    /// In `Emergency` it issues the land directive.
    pub fn monitor<S: CommandSink>(&mut self, dt: f64, sink: &mut S) -> bool {
        match self.state {
            FlightState::Normal => match self.detect(dt) {
                Some(fault) => self.trigger(fault),
                None => false,
            },
            FlightState::Emergency => {
                self.land(sink);
                false
            }
            FlightState::Landing | FlightState::Terminated => false,
        }
    }

    /// Enter `Emergency` because of `fault`.
    /// Returns `false` if normal operation had already ended.
    pub fn trigger(&mut self, fault: Fault) -> bool {
        if self.state != FlightState::Normal {
            return false;
        }

        warn!("Emergency: {}", fault);
        self.cause = Some(fault);
        self.state = FlightState::Emergency;
        true
    }

    /// Ask the autopilot to land.
    /// The land signal is sent once, on the `Emergency -> Landing` transition.
    pub fn land<S: CommandSink>(&mut self, sink: &mut S) -> bool {
        if self.state != FlightState::Emergency {
            if self.state == FlightState::Normal {
                warn!("Ignoring land request during normal operation");
            }
            return false;
        }

        info!("Landing");
        sink.land();
        self.state = FlightState::Landing;
        true
    }

    /// Touchdown confirmed: reset the autopilot and stop for good.
    pub fn confirm_landed<S: CommandSink>(&mut self, sink: &mut S) -> bool {
        if self.state != FlightState::Landing {
            warn!("Ignoring landing confirmation in {:?}", self.state);
            return false;
        }

        info!("Landed, resetting autopilot");
        sink.reset();
        self.state = FlightState::Terminated;
        true
    }

    fn detect(&mut self, dt: f64) -> Option<Fault> {
        if let Some(fault) = self.pending.take() {
            return Some(fault);
        }

        if let Some(age) = self.estimate_age.as_mut() {
            *age += dt;
            if *age > self.safety.estimate_timeout {
                return Some(EstimationFault::Stale { age: *age }.into());
            }
        }

        if self.saturated_for > self.safety.saturation_timeout {
            return Some(Fault::Saturation {
                duration: self.saturated_for,
            });
        }

        None
    }
}
