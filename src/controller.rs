use crate::{
    control::{AttitudeLoop, CommandSynthesizer, ErrorDynamics, PositionLoop, ReferenceAngleGenerator},
    scheduler::{Error, Event, Task},
    CommandSink, Config, ControllerState, EmergencyStateMachine, FlightState, RateParameters,
    StateEstimate, TrajectoryPoint, VelocityCommand,
};
use log::{debug, info, trace, warn};
use nalgebra::Vector3;

mod builder;
pub use builder::Builder;

/// A cascaded sliding-mode position controller emitting velocity setpoints.
///
/// The controller is the single owner of the [`ControllerState`].
/// Inputs overwrite the cached estimate and trajectory point, and the three update methods
/// are meant to be called from the [`Scheduler`](crate::Scheduler) (see [`controller_tasks`]).
pub struct Controller<S> {
    config: Config,
    position_loop: PositionLoop,
    attitude_loop: AttitudeLoop,
    reference: ReferenceAngleGenerator,
    synthesizer: CommandSynthesizer,
    emergency: EmergencyStateMachine,
    state: ControllerState,
    estimate: Option<StateEstimate>,
    trajectory: TrajectoryPoint,
    saturated: bool,
    sink: S,
}

impl<S: CommandSink> Controller<S> {
    /// Create a controller from an already validated configuration.
    fn new(config: Config, sink: S) -> Self {
        Self {
            position_loop: PositionLoop::new(&config.controller, &config.vehicle),
            attitude_loop: AttitudeLoop::new(&config.controller, &config.vehicle),
            reference: ReferenceAngleGenerator::new(config.limits.max_tilt),
            synthesizer: CommandSynthesizer::new(&config),
            emergency: EmergencyStateMachine::new(config.safety.clone()),
            state: ControllerState::default(),
            estimate: None,
            trajectory: TrajectoryPoint::default(),
            saturated: false,
            sink,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn flight_state(&self) -> FlightState {
        self.emergency.state()
    }

    pub fn emergency(&self) -> &EmergencyStateMachine {
        &self.emergency
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn is_terminated(&self) -> bool {
        self.flight_state() == FlightState::Terminated
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Overwrite the cached state estimate.
    ///
    /// Estimates that are non-finite or outside the geofence are dropped
    /// and reported to the emergency state machine.
    pub fn set_odom(&mut self, estimate: StateEstimate) {
        if self.is_terminated() {
            return;
        }

        if let Err(fault) = self.emergency.check_estimate(&estimate) {
            warn!("Rejected state estimate: {}", fault);
            return;
        }

        if self.estimate.is_none() && self.flight_state() == FlightState::Normal {
            debug!("First state estimate received, controller active");
            self.state.active = true;
        }
        self.estimate = Some(estimate);
    }

    /// Overwrite the cached trajectory point.
    pub fn set_trajectory_point(&mut self, trajectory: TrajectoryPoint) {
        trace!("Trajectory point {:?}", trajectory);
        self.trajectory = trajectory;
    }

    /// Run one pass of the outer loop: position errors, force and thrust references
    /// and the reference roll and pitch.
    pub fn position_update(&mut self, dt: f64) {
        let estimate = match self.running_estimate() {
            Some(estimate) => estimate,
            None => return,
        };

        self.state.position_error = ErrorDynamics::position_errors(&self.trajectory, &estimate);
        self.position_loop
            .update(&mut self.state, self.trajectory.acceleration, dt);

        let (roll, pitch) =
            self.reference
                .reference_angles(self.state.force, self.state.thrust, self.trajectory.yaw);
        self.state.reference_roll = roll;
        self.state.reference_pitch = pitch;

        trace!(
            "Position update: force {:?}, thrust {:.3}, reference ({:.3}, {:.3})",
            self.state.force,
            self.state.thrust,
            roll,
            pitch
        );
    }

    /// Run one pass of the inner loop and emit the resulting velocity command.
    pub fn attitude_update(&mut self, dt: f64) {
        let estimate = match self.running_estimate() {
            Some(estimate) => estimate,
            None => return,
        };

        let desired = Vector3::new(
            self.state.reference_roll,
            self.state.reference_pitch,
            self.trajectory.yaw,
        );
        self.state.attitude_error =
            ErrorDynamics::attitude_errors(desired, self.trajectory.yaw_rate, &estimate);
        self.attitude_loop
            .update(&mut self.state, estimate.angular_velocity);

        let (command, saturated) =
            self.synthesizer
                .synthesize(&self.state, &self.trajectory, estimate.attitude);
        if saturated && !self.saturated {
            debug!("Velocity command saturated: {:?}", command);
        }

        self.saturated = saturated;
        self.state.command = command;
        self.emergency.track_saturation(saturated, dt);
        self.sink.velocity(command);
    }

    /// Calculate the velocity command from the latest references without emitting it.
    ///
    /// Returns the zero command unless the controller is active and in normal operation.
    pub fn calculate_command_signals(&self) -> VelocityCommand {
        match self.running_estimate() {
            Some(estimate) => {
                let (command, _) =
                    self.synthesizer
                        .synthesize(&self.state, &self.trajectory, estimate.attitude);
                command
            }
            None => VelocityCommand::zero(),
        }
    }

    /// Run one pass of the fault monitor.
    pub fn land_monitor(&mut self, dt: f64) {
        if self.emergency.monitor(dt, &mut self.sink) {
            self.stop();
        }
    }

    /// Queue a fault raised outside the controller, handled on the next monitor pass.
    pub fn signal_fault(&mut self, reason: impl Into<String>) {
        self.emergency.signal_fault(reason);
    }

    /// Ask the autopilot to land right away instead of waiting for the next monitor pass.
    pub fn land(&mut self) -> bool {
        self.emergency.land(&mut self.sink)
    }

    /// Confirm touchdown, resetting the autopilot and terminating the controller.
    pub fn confirm_landed(&mut self) -> bool {
        let landed = self.emergency.confirm_landed(&mut self.sink);
        if landed {
            info!("Controller terminated");
        }
        landed
    }

    // Safe-stop on entering emergency: drop every reference and hold still
    fn stop(&mut self) {
        self.state.reset();
        self.state.active = false;
        self.state.emergency = true;
        self.saturated = false;
        self.sink.velocity(VelocityCommand::zero());
    }

    fn running_estimate(&self) -> Option<StateEstimate> {
        if !self.state.active || self.flight_state() != FlightState::Normal {
            return None;
        }
        self.estimate.clone()
    }
}

pub fn attitude_task<S: CommandSink>(event: Event<'_, Controller<S>>) -> Result<(), Error> {
    event.state.attitude_update(event.dt);
    Ok(())
}

pub fn position_task<S: CommandSink>(event: Event<'_, Controller<S>>) -> Result<(), Error> {
    event.state.position_update(event.dt);
    Ok(())
}

pub fn land_monitor_task<S: CommandSink>(event: Event<'_, Controller<S>>) -> Result<(), Error> {
    event.state.land_monitor(event.dt);
    Ok(())
}

/// The attitude, position and land-monitor tasks at their configured rates.
pub fn controller_tasks<S: CommandSink>(rates: &RateParameters) -> [Task<Controller<S>>; 3] {
    [
        Task::new(attitude_task::<S>).with_hz(rates.attitude_hz),
        Task::new(position_task::<S>).with_hz(rates.position_hz),
        Task::new(land_monitor_task::<S>).with_hz(rates.land_monitor_hz),
    ]
}
