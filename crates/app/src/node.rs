//! The node control loop.
//!
//! One cooperative loop owns every piece of mutable state. Each iteration
//! reads the clock, asks the [`Scheduler`] which tasks are due and runs them
//! in priority order. The only suspension point besides the idle pause is the
//! reconnect backoff inside [`SessionManager`].

use std::time::Duration;

use dhtnode_domain::time::Tick;

use crate::ports::{Broker, ClimateSensor, Clock, DigitalInput, StatusIndicator};
use crate::sampler::{DigitalInputPoller, SensorSampler};
use crate::scheduler::{Scheduler, Task};
use crate::services::session::SessionManager;

/// A fully wired sensor node.
pub struct Node<B, S, I, L> {
    scheduler: Scheduler,
    sampler: SensorSampler<S>,
    input: Option<DigitalInputPoller<I>>,
    session: SessionManager<B>,
    indicator: L,
}

impl<B, S, I, L> Node<B, S, I, L>
where
    B: Broker,
    S: ClimateSensor,
    I: DigitalInput,
    L: StatusIndicator,
{
    #[must_use]
    pub fn new(
        scheduler: Scheduler,
        sampler: SensorSampler<S>,
        input: Option<DigitalInputPoller<I>>,
        session: SessionManager<B>,
        indicator: L,
    ) -> Self {
        Self {
            scheduler,
            sampler,
            input,
            session,
            indicator,
        }
    }

    #[must_use]
    pub fn session(&self) -> &SessionManager<B> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionManager<B> {
        &mut self.session
    }

    #[must_use]
    pub fn indicator(&self) -> &L {
        &self.indicator
    }

    /// Run every task due at `now`; returns the tasks that ran.
    pub async fn tick(&mut self, now: Tick) -> Vec<Task> {
        let tasks = self.scheduler.due(now);
        for task in &tasks {
            match task {
                Task::NetworkService => self.session.service().await,
                Task::InputPoll => self.poll_input(now).await,
                Task::SensorPoll => self.poll_sensor(now).await,
            }
        }
        tasks
    }

    /// Drive the loop forever.
    pub async fn run<C: Clock>(&mut self, clock: &C, idle: Duration) {
        tracing::info!(idle = ?idle, "control loop started");
        loop {
            let now = clock.now();
            self.tick(now).await;
            tokio::time::sleep(idle).await;
        }
    }

    async fn poll_input(&mut self, now: Tick) {
        let Some(poller) = self.input.as_mut() else {
            return;
        };
        if let Some(reading) = poller.poll(now) {
            self.session.handle_readings(&[reading]).await;
        }
    }

    async fn poll_sensor(&mut self, now: Tick) {
        if let Err(err) = self.indicator.flash().await {
            tracing::debug!(%err, "status indicator flash failed");
        }
        if let Some(readings) = self.sampler.sample(now) {
            self.session.handle_readings(&readings).await;
        }
    }
}
