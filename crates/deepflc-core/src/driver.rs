// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Deep-FLC.

//! Real-time tick driver.
//!
//! A tokio task owns one [`Simulation`] and steps it once per period while
//! running. Control goes through a [`DriverHandle`]; every tick is published
//! on an unbounded channel. Commands are drained before ticks, so a command
//! sent between two ticks is always visible to the second one.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use deepflc_types::{ConfigError, MembershipDefs, MembershipSpec, OperatingMode, Term, Variable};

use crate::rules::RuleBase;
use crate::simulation_engine::{Simulation, SimulationSnapshot, StepOutcome};

/// Membership definitions shared between the driver and its controllers
pub type SharedMembership = Arc<RwLock<MembershipDefs>>;

pub fn shared_membership(defs: MembershipDefs) -> SharedMembership {
    Arc::new(RwLock::new(defs))
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("tick driver is no longer running")]
    Closed,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Driver state as seen by a controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverSnapshot {
    pub running: bool,
    pub simulation: SimulationSnapshot,
}

#[derive(Debug)]
pub enum DriverCommand {
    Start,
    Pause,
    /// Reset the simulation and stop ticking
    Reset,
    SetMode(OperatingMode),
    SetLoad(f64),
    Snapshot(oneshot::Sender<DriverSnapshot>),
    Shutdown,
}

/// Clonable control surface of a running driver
#[derive(Clone)]
pub struct DriverHandle {
    commands: mpsc::UnboundedSender<DriverCommand>,
    membership: SharedMembership,
}

impl std::fmt::Debug for DriverHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverHandle").finish_non_exhaustive()
    }
}

impl DriverHandle {
    fn send(&self, command: DriverCommand) -> DriverResult<()> {
        self.commands.send(command).map_err(|_| DriverError::Closed)
    }

    pub fn start(&self) -> DriverResult<()> {
        self.send(DriverCommand::Start)
    }

    pub fn pause(&self) -> DriverResult<()> {
        self.send(DriverCommand::Pause)
    }

    pub fn reset(&self) -> DriverResult<()> {
        self.send(DriverCommand::Reset)
    }

    pub fn set_mode(&self, mode: OperatingMode) -> DriverResult<()> {
        self.send(DriverCommand::SetMode(mode))
    }

    pub fn set_load(&self, load: f64) -> DriverResult<()> {
        self.send(DriverCommand::SetLoad(load))
    }

    pub fn shutdown(&self) -> DriverResult<()> {
        self.send(DriverCommand::Shutdown)
    }

    /// Replace one membership shape.
    ///
    /// The write lock excludes a tick in progress, so the edit lands between
    /// two ticks and the next inference reads it.
    pub fn set_membership(
        &self,
        variable: Variable,
        term: Term,
        points: (f64, f64, f64),
    ) -> DriverResult<()> {
        let spec = MembershipSpec::new(points.0, points.1, points.2).inspect_err(|e| {
            warn!("Rejected membership edit for {variable}/{term}: {e}");
        })?;

        self.membership
            .write()
            .set(variable, term, spec)
            .inspect_err(|e| warn!("Rejected membership edit for {variable}/{term}: {e}"))?;

        info!("Membership {variable}/{term} set to {:?}", spec.points());
        Ok(())
    }

    pub fn membership(&self) -> MembershipDefs {
        self.membership.read().clone()
    }

    pub async fn snapshot(&self) -> DriverResult<DriverSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(DriverCommand::Snapshot(reply_tx))?;
        reply_rx.await.map_err(|_| DriverError::Closed)
    }
}

#[derive(Debug)]
pub struct TickDriver {
    simulation: Simulation,
    membership: SharedMembership,
    rules: Arc<RuleBase>,
    period: Duration,
    running: bool,
    commands: mpsc::UnboundedReceiver<DriverCommand>,
    events: mpsc::UnboundedSender<StepOutcome>,
}

impl TickDriver {
    /// Spawn the driver task, initially paused.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        simulation: Simulation,
        membership: SharedMembership,
        rules: Arc<RuleBase>,
        period: Duration,
    ) -> (DriverHandle, mpsc::UnboundedReceiver<StepOutcome>) {
        let (handle, events, _task) = Self::spawn_with_task(simulation, membership, rules, period);
        (handle, events)
    }

    /// Like [`TickDriver::spawn`], also returning the task for joining
    pub fn spawn_with_task(
        simulation: Simulation,
        membership: SharedMembership,
        rules: Arc<RuleBase>,
        period: Duration,
    ) -> (
        DriverHandle,
        mpsc::UnboundedReceiver<StepOutcome>,
        JoinHandle<Simulation>,
    ) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let driver = Self {
            simulation,
            membership: Arc::clone(&membership),
            rules,
            period: period.max(Duration::from_millis(1)),
            running: false,
            commands: command_rx,
            events: event_tx,
        };
        let task = tokio::spawn(driver.run());

        let handle = DriverHandle {
            commands: command_tx,
            membership,
        };
        (handle, event_rx, task)
    }

    async fn run(mut self) -> Simulation {
        let mut ticker = time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Tick driver started, period {:?}", self.period);

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => {
                    let Some(command) = command else {
                        info!("All driver handles dropped");
                        break;
                    };
                    if !self.apply(command, &mut ticker) {
                        break;
                    }
                }
                () = self.events.closed() => {
                    info!("Tick listener gone");
                    break;
                }
                _ = ticker.tick(), if self.running => {
                    let outcome = {
                        let defs = self.membership.read();
                        self.simulation.step(&defs, &self.rules)
                    };
                    if self.events.send(outcome).is_err() {
                        break;
                    }
                }
            }
        }

        info!(
            "Tick driver stopped at tick {}",
            self.simulation.state().time
        );
        self.simulation
    }

    /// Returns false when the driver should stop
    fn apply(&mut self, command: DriverCommand, ticker: &mut time::Interval) -> bool {
        match command {
            DriverCommand::Start => {
                if !self.running {
                    // First tick one full period after start
                    ticker.reset();
                    self.running = true;
                    info!("Simulation started");
                }
            }
            DriverCommand::Pause => {
                if self.running {
                    self.running = false;
                    info!("Simulation paused");
                }
            }
            DriverCommand::Reset => {
                self.running = false;
                self.simulation.reset();
            }
            DriverCommand::SetMode(mode) => self.simulation.set_mode(mode),
            DriverCommand::SetLoad(load) => {
                self.simulation.set_load(load);
                debug!("Load set to {}", self.simulation.state().load);
            }
            DriverCommand::Snapshot(reply) => {
                let snapshot = DriverSnapshot {
                    running: self.running,
                    simulation: self.simulation.snapshot(),
                };
                // Requester may have given up
                let _ = reply.send(snapshot);
            }
            DriverCommand::Shutdown => {
                info!("Tick driver shutdown requested");
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_default() -> (DriverHandle, mpsc::UnboundedReceiver<StepOutcome>) {
        TickDriver::spawn(
            Simulation::default(),
            shared_membership(MembershipDefs::default()),
            Arc::new(RuleBase::default()),
            Duration::from_secs(1),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_paused() {
        let (handle, mut events) = spawn_default();

        let waited = time::timeout(Duration::from_secs(5), events.recv()).await;
        assert!(waited.is_err());

        let snapshot = handle.snapshot().await.unwrap();
        assert!(!snapshot.running);
        assert_eq!(snapshot.simulation.state.time, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_period() {
        let (handle, mut events) = spawn_default();
        let started = time::Instant::now();
        handle.start().unwrap();

        let first = events.recv().await.unwrap();
        assert_eq!(first.point.time, 1);
        assert!(started.elapsed() >= Duration::from_secs(1));

        let second = events.recv().await.unwrap();
        assert_eq!(second.point.time, 2);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_ticks() {
        let (handle, mut events) = spawn_default();
        handle.start().unwrap();
        events.recv().await.unwrap();

        handle.pause().unwrap();
        let waited = time::timeout(Duration::from_secs(10), events.recv()).await;
        assert!(waited.is_err());

        let snapshot = handle.snapshot().await.unwrap();
        assert!(!snapshot.running);
        assert_eq!(snapshot.simulation.state.time, 1);
        assert_eq!(snapshot.simulation.series.len(), 1);

        handle.start().unwrap();
        assert_eq!(events.recv().await.unwrap().point.time, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_and_stops() {
        let (handle, mut events) = spawn_default();
        handle.set_mode(OperatingMode::Deep).unwrap();
        handle.start().unwrap();
        for _ in 0..3 {
            events.recv().await.unwrap();
        }

        handle.reset().unwrap();
        let snapshot = handle.snapshot().await.unwrap();

        assert!(!snapshot.running);
        assert_eq!(snapshot.simulation.state.time, 0);
        assert_eq!(snapshot.simulation.state.soc, 50.0);
        assert_eq!(snapshot.simulation.state.mode, OperatingMode::Deep);
        assert!(snapshot.simulation.series.is_empty());
        assert!(snapshot.simulation.energy.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_applies_to_next_tick() {
        let (handle, mut events) = spawn_default();
        handle.set_load(90.0).unwrap();
        handle.start().unwrap();

        let outcome = events.recv().await.unwrap();
        assert_eq!(outcome.effective.load, 90.0);
        assert_eq!(outcome.point.load, 90.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_finite_load_keeps_previous() {
        let (handle, mut events) = spawn_default();
        handle.set_load(80.0).unwrap();
        handle.set_load(f64::NAN).unwrap();
        handle.start().unwrap();

        let outcome = events.recv().await.unwrap();
        assert_eq!(outcome.point.load, 80.0);
        assert!((0.0..=100.0).contains(&outcome.point.temperature));
    }

    #[tokio::test(start_paused = true)]
    async fn test_membership_edit_visible_next_tick() {
        let (handle, mut events) = spawn_default();

        // Widen SOC Low so it overlaps Medium at 50
        handle
            .set_membership(Variable::Soc, Term::Low, (0.0, 0.0, 100.0))
            .unwrap();
        handle.start().unwrap();

        let outcome = events.recv().await.unwrap();
        assert_eq!(outcome.point.cp, 37.5);
        assert_eq!(outcome.point.gp, 62.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_membership_edit_is_rejected() {
        let (handle, _events) = spawn_default();
        let before = handle.membership();

        let err = handle
            .set_membership(Variable::Soc, Term::Medium, (70.0, 60.0, 80.0))
            .unwrap_err();
        assert!(matches!(
            err,
            DriverError::Config(ConfigError::InvalidMembership { .. })
        ));

        let err = handle
            .set_membership(Variable::Soh, Term::Low, (0.0, 10.0, 20.0))
            .unwrap_err();
        assert!(matches!(
            err,
            DriverError::Config(ConfigError::UnknownTerm { .. })
        ));

        assert_eq!(handle.membership(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_closes_events() {
        let (handle, mut events, task) = TickDriver::spawn_with_task(
            Simulation::default(),
            shared_membership(MembershipDefs::default()),
            Arc::new(RuleBase::default()),
            Duration::from_millis(500),
        );
        handle.start().unwrap();
        events.recv().await.unwrap();

        handle.shutdown().unwrap();
        assert!(events.recv().await.is_none());

        let simulation = task.await.unwrap();
        assert_eq!(simulation.state().time, 1);
        assert!(matches!(handle.start(), Err(DriverError::Closed)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_listener_stops_driver() {
        let (handle, events, task) = TickDriver::spawn_with_task(
            Simulation::default(),
            shared_membership(MembershipDefs::default()),
            Arc::new(RuleBase::default()),
            Duration::from_secs(1),
        );
        drop(events);

        task.await.unwrap();
        assert!(matches!(handle.snapshot().await, Err(DriverError::Closed)));
    }
}
