use crate::VelocityCommand;

mod channel;
pub use channel::ChannelSink;

/// A message leaving the controller for the autopilot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Signal {
    /// Velocity setpoint
    Velocity(VelocityCommand),
    /// Land in place
    Land,
    /// Disarm and reset the autopilot after touchdown
    Reset,
}

/// The outgoing message bus.
///
/// Sends are fire-and-forget: an implementation must never block the control loops
/// and drops (and logs) anything it cannot deliver.
pub trait CommandSink {
    fn send(&mut self, signal: Signal);

    fn velocity(&mut self, command: VelocityCommand) {
        self.send(Signal::Velocity(command))
    }

    fn land(&mut self) {
        self.send(Signal::Land)
    }

    fn reset(&mut self) {
        self.send(Signal::Reset)
    }
}

impl<T> CommandSink for &mut T
where
    T: CommandSink + ?Sized,
{
    fn send(&mut self, signal: Signal) {
        (&mut **self).send(signal)
    }
}

/// Records every signal, useful for logging a flight or inspecting the output in tests.
impl CommandSink for Vec<Signal> {
    fn send(&mut self, signal: Signal) {
        self.push(signal);
    }
}
