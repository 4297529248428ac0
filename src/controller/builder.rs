use super::Controller;
use crate::{
    CommandLimits, CommandSink, ConfigError, Config, ControllerParameters, RateParameters,
    SafetyParameters, VehicleParameters,
};
use log::info;

/// Builder for a [`Controller`], validating the configuration before anything runs.
pub struct Builder<S> {
    config: Config,
    sink: S,
}

impl<S: CommandSink> Builder<S> {
    pub fn new(config: Config, sink: S) -> Self {
        Self { config, sink }
    }

    pub fn controller(mut self, controller: ControllerParameters) -> Self {
        self.config.controller = controller;
        self
    }

    pub fn vehicle(mut self, vehicle: VehicleParameters) -> Self {
        self.config.vehicle = vehicle;
        self
    }

    pub fn limits(mut self, limits: CommandLimits) -> Self {
        self.config.limits = limits;
        self
    }

    pub fn safety(mut self, safety: SafetyParameters) -> Self {
        self.config.safety = safety;
        self
    }

    pub fn rates(mut self, rates: RateParameters) -> Self {
        self.config.rates = rates;
        self
    }

    /// Validate the configuration and create the controller.
    /// The controller stays inactive until it receives its first state estimate.
    pub fn build(self) -> Result<Controller<S>, ConfigError> {
        self.config.validate()?;

        info!(
            "Controller ready: mass {} kg, max thrust {:.2} N, loop rate {} hz",
            self.config.vehicle.mass,
            self.config.vehicle.max_thrust(),
            self.config.rates.loop_rate_hz
        );
        Ok(Controller::new(self.config, self.sink))
    }
}
