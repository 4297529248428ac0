//! A tokio event loop hosting the controller.
//!
//! Incoming odometry, trajectory points and operator events are handled between scheduler ticks,
//! so the three control tasks never run concurrently with an input update.

use crate::{
    controller_tasks, scheduler::Error, CommandSink, Controller, Estimator, Odometry, Scheduler,
    TrajectoryPoint,
};
use embedded_time::{clock, rate::Fraction, Clock};
use log::{debug, info};
use std::time::Duration;
use tokio::{
    select,
    sync::mpsc::UnboundedReceiver,
    time::{self, Instant, MissedTickBehavior},
};

/// A microsecond [`Clock`] counting from its creation.
/// The tick count wraps after roughly 71 minutes.
#[derive(Clone, Copy, Debug)]
pub struct HostClock {
    start: Instant,
}

impl HostClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for HostClock {
    type T = u32;

    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

    fn try_now(&self) -> Result<embedded_time::Instant<Self>, clock::Error> {
        let micros = self.start.elapsed().as_micros() as u32;
        Ok(embedded_time::Instant::new(micros))
    }
}

/// Out-of-band events for the controller.
#[derive(Clone, Debug, PartialEq)]
pub enum HostEvent {
    /// A fault detected outside the controller
    Fault(String),
    /// Land now
    Land,
    /// Touchdown confirmed
    Landed,
    Shutdown,
}

/// The channels feeding the controller.
pub struct Inputs {
    pub odometry: UnboundedReceiver<Odometry>,
    pub trajectory: UnboundedReceiver<TrajectoryPoint>,
    pub events: UnboundedReceiver<HostEvent>,
}

/// Run the controller until it terminates, a shutdown is requested or the event channel closes.
pub async fn run<S, E>(
    controller: &mut Controller<S>,
    mut estimator: E,
    mut inputs: Inputs,
) -> Result<(), Error>
where
    S: CommandSink,
    E: Estimator,
{
    let rates = controller.config().rates.clone();
    let mut tasks = controller_tasks(&rates);
    let mut scheduler = Scheduler::new(&mut tasks, HostClock::new(), rates.loop_rate_hz);

    let mut interval = time::interval(Duration::from_secs_f64(rates.loop_period()));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Control loop running at {} hz", rates.loop_rate_hz);

    loop {
        select! {
            _ = interval.tick() => scheduler.run(controller)?,
            Some(odometry) = inputs.odometry.recv() => {
                controller.set_odom(estimator.estimate(&odometry));
            }
            Some(point) = inputs.trajectory.recv() => controller.set_trajectory_point(point),
            event = inputs.events.recv() => match event {
                Some(HostEvent::Fault(reason)) => controller.signal_fault(reason),
                Some(HostEvent::Land) => {
                    controller.land();
                }
                Some(HostEvent::Landed) => {
                    controller.confirm_landed();
                }
                Some(HostEvent::Shutdown) | None => {
                    info!("Shutting down in {:?}", controller.flight_state());
                    break;
                }
            },
        }

        if controller.is_terminated() {
            debug!("Control loop stopped after {} ticks", scheduler.tick_counter());
            break;
        }
    }

    Ok(())
}
