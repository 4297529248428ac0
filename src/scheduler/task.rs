use super::Error;
use embedded_time::duration::Microseconds;

/// An event containing the current time, elapsed time, and state for a task.
pub struct Event<'a, T> {
    /// The state shared by every task of the scheduler.
    pub state: &'a mut T,

    /// The current time in microseconds.
    pub now: Microseconds<u32>,

    /// The time available to run this task (in microseconds).
    pub available: Microseconds<u32>,

    /// The time since this task last ran (in seconds).
    pub dt: f64,
}

type TaskFn<T, E> = fn(Event<'_, T>) -> Result<(), E>;

/// A task to run at a specific frequency.
pub struct Task<T, E = Error> {
    /// The function to run.
    pub f: TaskFn<T, E>,

    /// The desired frequency (in hz) to run the task.
    pub hz: f32,

    /// The max time for this task (in microseconds).
    pub max_time_micros: u16,

    /// Determines if this task should be run every time the scheduler loops.
    pub is_high_priority: bool,

    /// The last tick this task was ran.
    pub last_run: u16,
}

impl<T, E> Task<T, E> {
    /// Create a new task from the function to run.
    pub fn new(f: TaskFn<T, E>) -> Self {
        Self {
            f,
            hz: 0.,
            max_time_micros: 0,
            is_high_priority: false,
            last_run: 0,
        }
    }

    /// Create a new high priority task from the function to run.
    pub fn high_priority(f: TaskFn<T, E>) -> Self {
        Self::new(f).with_high_priority(true)
    }

    /// Builder method to set `hz` and return `self`
    pub fn with_hz(mut self, hz: f32) -> Self {
        self.hz = hz;
        self
    }

    /// Builder method to set `max_time_micros` and return `self`
    pub fn with_max_time(mut self, micros: u16) -> Self {
        self.max_time_micros = micros;
        self
    }

    /// Builder method to set `is_high_priority` and return `self`
    pub fn with_high_priority(mut self, is_high_priority: bool) -> Self {
        self.is_high_priority = is_high_priority;
        self
    }

    /// Calculate the desired ticks between each run of the task.
    pub fn ticks(&self, loop_rate_hz: i16) -> u16 {
        // A 0hz task, or one faster than the loop, runs at the rate of the scheduler loop
        if self.hz <= 0. {
            return 1;
        }
        (loop_rate_hz as f32 / self.hz).round().max(1.) as u16
    }

    /// If this task is ready returns the ticks elapsed since the last run.
    /// Otherwise this returns `None`.
    pub fn ready(&self, current_tick: u16, ticks: u16) -> Option<u16> {
        let elapsed = current_tick.wrapping_sub(self.last_run);
        if elapsed >= ticks {
            Some(elapsed)
        } else {
            None
        }
    }

    /// Run this task at the current tick.
    pub fn run(&mut self, event: Event<'_, T>, tick: u16) -> Result<(), E> {
        (self.f)(event)?;

        // Record the tick counter when we ran
        // This determines when we next run the event
        self.last_run = tick;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: Event<'_, ()>) -> Result<(), Error> {
        Ok(())
    }

    #[test]
    fn ticks_between_runs() {
        assert_eq!(Task::new(noop).ticks(500), 1);
        assert_eq!(Task::new(noop).with_hz(500.).ticks(500), 1);
        assert_eq!(Task::new(noop).with_hz(100.).ticks(500), 5);
        assert_eq!(Task::new(noop).with_hz(10.).ticks(500), 50);
        assert_eq!(Task::new(noop).with_hz(1000.).ticks(500), 1);
    }

    #[test]
    fn ready_survives_tick_wrap() {
        let mut task = Task::new(noop).with_hz(100.);
        task.last_run = u16::MAX - 2;

        assert_eq!(task.ready(u16::MAX, 5), None);
        assert_eq!(task.ready(2, 5), Some(5));
    }
}
