//! Multi-rate task scheduler.
//!
//! Every call to [`Scheduler::run`] is one tick of the main loop.
//! Tasks are scheduled in multiples of that tick, so a 100hz task in a 500hz loop runs every fifth tick.
//! Tasks run one after another on the caller's thread which makes the scheduler the only writer
//! of the shared state.

use embedded_time::{duration::Microseconds, Clock};
use log::warn;

mod error;
pub use error::Error;

mod task;
pub use task::{Event, Task};

pub struct Scheduler<'a, C, T, E = Error> {
    tasks: &'a mut [Task<T, E>],
    clock: C,
    tick_counter: u16,
    loop_rate_hz: i16,
    loop_period_us: u32,
    max_task_slowdown: u16,
    // counters to handle dynamically adjusting extra loop time to
    // cope with low CPU conditions
    task_not_achieved: u32,
    task_all_achieved: u32,
    extra_loop_us: u32,
}

impl<'a, C, T, E> Scheduler<'a, C, T, E>
where
    C: Clock<T = u32>,
    E: From<Error>,
{
    pub fn new(tasks: &'a mut [Task<T, E>], clock: C, loop_rate_hz: i16) -> Self {
        Self {
            tasks,
            clock,
            tick_counter: 0,
            loop_rate_hz,
            loop_period_us: 1_000_000 / loop_rate_hz.max(1) as u32,
            max_task_slowdown: 4,
            task_not_achieved: 0,
            task_all_achieved: 0,
            extra_loop_us: 0,
        }
    }

    pub fn tick_counter(&self) -> u16 {
        self.tick_counter
    }

    /// The main loop period in seconds.
    pub fn loop_period(&self) -> f64 {
        self.loop_period_us as f64 * 1e-6
    }

    /// Run one tick of the main loop, running every task that is due.
    pub fn run(&mut self, state: &mut T) -> Result<(), E> {
        let sample_time_us = self.micros_since_epoch()?.0;

        self.tick_counter = self.tick_counter.wrapping_add(1);

        let now = self.micros_since_epoch()?;

        // get remaining time available for this loop
        // and add in extra loop time determined by not achieving scheduler tasks
        let loop_tick_us = now.0.wrapping_sub(sample_time_us);
        let time_available = self.loop_period_us.saturating_sub(loop_tick_us) + self.extra_loop_us;

        self.run_tasks(state, now, time_available)?;

        if self.task_not_achieved > 0 {
            // add some extra time to the budget
            self.extra_loop_us = (self.extra_loop_us + 100).min(5000);
            self.task_not_achieved = 0;
            self.task_all_achieved = 0;
        } else if self.extra_loop_us > 0 {
            self.task_all_achieved += 1;
            if self.task_all_achieved > 50 {
                // 50 loops without a slow task, slowly lower the extra loop time
                self.task_all_achieved = 0;
                self.extra_loop_us = self.extra_loop_us.saturating_sub(50);
            }
        }

        Ok(())
    }

    fn run_tasks(
        &mut self,
        state: &mut T,
        now: Microseconds<u32>,
        time_available: u32,
    ) -> Result<(), E> {
        let loop_period = self.loop_period();

        for task in self.tasks.iter_mut() {
            let elapsed = if task.is_high_priority {
                self.tick_counter.wrapping_sub(task.last_run)
            } else {
                let ticks = task.ticks(self.loop_rate_hz);
                let elapsed = match task.ready(self.tick_counter, ticks) {
                    Some(elapsed) => elapsed,
                    // this task is not yet scheduled to run again
                    None => continue,
                };

                if elapsed >= ticks.saturating_mul(self.max_task_slowdown) {
                    // we are going beyond the maximum slowdown factor for a
                    // task. This will trigger increasing the time budget
                    self.task_not_achieved += 1;
                    warn!(
                        "Task at {} hz is late: {} ticks since last run (expected {})",
                        task.hz, elapsed, ticks
                    );
                }

                if task.max_time_micros as u32 > time_available {
                    // not enough time to run this task, maybe another task will fit
                    continue;
                }
                elapsed
            };

            let event = Event {
                state: &mut *state,
                now,
                available: Microseconds::new(time_available),
                dt: elapsed as f64 * loop_period,
            };
            task.run(event, self.tick_counter)?;
        }

        Ok(())
    }

    fn micros_since_epoch(&mut self) -> Result<Microseconds<u32>, Error> {
        let instant = self.clock.try_now()?;
        Microseconds::try_from(instant.duration_since_epoch()).map_err(Into::into)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use embedded_time::{clock, rate::Fraction, Instant};
    use std::{cell::Cell, rc::Rc};

    /// A clock that only moves when told to.
    #[derive(Clone, Debug, Default)]
    pub(crate) struct MockClock {
        micros: Rc<Cell<u32>>,
    }

    impl MockClock {
        pub(crate) fn advance(&self, micros: u32) {
            self.micros.set(self.micros.get() + micros);
        }
    }

    impl Clock for MockClock {
        type T = u32;

        const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

        fn try_now(&self) -> Result<Instant<Self>, clock::Error> {
            Ok(Instant::new(self.micros.get()))
        }
    }

    #[derive(Default)]
    struct Runs {
        fast: Vec<f64>,
        slow: Vec<f64>,
        rare: Vec<f64>,
    }

    fn fast(event: Event<'_, Runs>) -> Result<(), Error> {
        event.state.fast.push(event.dt);
        Ok(())
    }

    fn slow(event: Event<'_, Runs>) -> Result<(), Error> {
        event.state.slow.push(event.dt);
        Ok(())
    }

    fn rare(event: Event<'_, Runs>) -> Result<(), Error> {
        event.state.rare.push(event.dt);
        Ok(())
    }

    #[test]
    fn tasks_run_at_their_rates() {
        let clock = MockClock::default();
        let mut tasks = [
            Task::high_priority(fast).with_hz(500.),
            Task::new(slow).with_hz(100.),
            Task::new(rare).with_hz(10.),
        ];
        let mut scheduler = Scheduler::new(&mut tasks, clock.clone(), 500);
        let mut runs = Runs::default();

        for _ in 0..100 {
            scheduler.run(&mut runs).unwrap();
            clock.advance(2000);
        }

        assert_eq!(runs.fast.len(), 100);
        assert_eq!(runs.slow.len(), 20);
        assert_eq!(runs.rare.len(), 2);

        assert_relative_eq!(runs.fast[10], 0.002);
        assert_relative_eq!(runs.slow[3], 0.01);
        assert_relative_eq!(runs.rare[1], 0.1);
    }

    #[test]
    fn over_budget_tasks_are_skipped() {
        let clock = MockClock::default();
        let mut tasks = [
            Task::high_priority(fast),
            Task::new(slow).with_hz(100.).with_max_time(10_000),
        ];
        let mut scheduler = Scheduler::new(&mut tasks, clock.clone(), 500);
        let mut runs = Runs::default();

        for _ in 0..200 {
            scheduler.run(&mut runs).unwrap();
            clock.advance(2000);
        }

        assert_eq!(runs.fast.len(), 200);
        assert!(runs.slow.is_empty());
    }
}
