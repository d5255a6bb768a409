//! Cooperative multi-rate scheduler.
//!
//! A fixed set of independently clocked tasks is multiplexed on the control
//! loop with elapsed-time checks. Each call to [`Scheduler::due`] fires every
//! task whose interval has elapsed, in priority order: network service first
//! (keeps the broker session alive with minimal jitter), then input poll,
//! then sensor poll.

use dhtnode_domain::time::{self, Tick};

/// A task multiplexed on the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    NetworkService,
    InputPoll,
    SensorPoll,
}

/// Per-task timer compared with wraparound-safe arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleTimer {
    last_fire: Tick,
    interval: Tick,
}

impl ScheduleTimer {
    /// Create a timer that first fires `interval` ticks after `start`.
    #[must_use]
    pub fn new(interval: Tick, start: Tick) -> Self {
        Self {
            last_fire: start,
            interval,
        }
    }

    #[must_use]
    pub fn is_due(&self, now: Tick) -> bool {
        time::has_elapsed(now, self.last_fire, self.interval)
    }

    /// Fire the timer if it is due; returns whether it fired.
    pub fn try_fire(&mut self, now: Tick) -> bool {
        if self.is_due(now) {
            self.last_fire = now;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn last_fire(&self) -> Tick {
        self.last_fire
    }

    #[must_use]
    pub fn interval(&self) -> Tick {
        self.interval
    }
}

/// Task intervals, in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleIntervals {
    pub network: Tick,
    /// `None` when no digital input is configured.
    pub input: Option<Tick>,
    pub sensor: Tick,
}

/// The scheduler owning every task timer.
#[derive(Debug, Clone)]
pub struct Scheduler {
    network: ScheduleTimer,
    input: Option<ScheduleTimer>,
    sensor: ScheduleTimer,
}

impl Scheduler {
    #[must_use]
    pub fn new(intervals: ScheduleIntervals, start: Tick) -> Self {
        Self {
            network: ScheduleTimer::new(intervals.network, start),
            input: intervals
                .input
                .map(|interval| ScheduleTimer::new(interval, start)),
            sensor: ScheduleTimer::new(intervals.sensor, start),
        }
    }

    /// Fire and return every due task, in priority order.
    pub fn due(&mut self, now: Tick) -> Vec<Task> {
        let mut tasks = Vec::with_capacity(3);
        if self.network.try_fire(now) {
            tasks.push(Task::NetworkService);
        }
        if self.input.as_mut().is_some_and(|t| t.try_fire(now)) {
            tasks.push(Task::InputPoll);
        }
        if self.sensor.try_fire(now) {
            tasks.push(Task::SensorPoll);
        }
        tasks
    }
}
