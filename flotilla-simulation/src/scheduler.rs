use crate::engine::{Simulation, TickOutcome};
use crossbeam_channel::{bounded, select, tick, Receiver, Sender, TryRecvError};
use log::{debug, error, info, warn};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("tick interval must be non-zero")]
    ZeroInterval,

    #[error("failed to spawn the engine thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("the engine thread panicked")]
    EnginePanicked,
}

/// Timing and result of one tick, as observed by the engine thread.
#[derive(Debug)]
pub struct TickReport {
    pub outcome: TickOutcome,
    pub duration: Duration,
}

/// Drives a [`Simulation`] on a fixed cadence from a dedicated thread.
pub struct Scheduler {
    interval: Duration,
    max_ticks: Option<u64>,
    reports: Option<Sender<TickReport>>,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_ticks: None,
            reports: None,
        }
    }

    /// Stop on our own after `ticks` ticks. Zero stops right after the initial publish.
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    /// Send a [`TickReport`] after every tick. Reports are dropped if the
    /// receiver has gone away.
    pub fn with_reports(mut self, reports: Sender<TickReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    /// Moves the simulation onto the engine thread, starts it and begins ticking.
    ///
    /// The first tick fires one interval after the initial publish.
    pub fn spawn(self, mut simulation: Simulation) -> Result<RunningSimulation, SchedulerError> {
        if self.interval.is_zero() {
            return Err(SchedulerError::ZeroInterval);
        }

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let Scheduler { interval, max_ticks, reports } = self;

        let handle = thread::Builder::new()
            .name("flotilla-engine".to_string())
            .spawn(move || {
                simulation.start();
                run_loop(&mut simulation, interval, max_ticks, stop_rx, reports.as_ref());
                if let Err(e) = simulation.stop() {
                    warn!("Error while tearing down the simulation: {}", e);
                }
                simulation
            })?;

        info!("Engine thread started, ticking every {:?}", interval);
        Ok(RunningSimulation {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }
}

fn run_loop(
    simulation: &mut Simulation,
    interval: Duration,
    max_ticks: Option<u64>,
    stop_rx: Receiver<()>,
    reports: Option<&Sender<TickReport>>,
) {
    if max_ticks == Some(0) {
        debug!("Tick limit is zero; stopping after the initial publish");
        return;
    }

    let ticker = tick(interval);
    let mut completed = 0u64;

    loop {
        select! {
            recv(stop_rx) -> _ => break,
            recv(ticker) -> _ => {
                // A stop requested while this tick was becoming due wins.
                match stop_rx.try_recv() {
                    Ok(()) | Err(TryRecvError::Disconnected) => break,
                    Err(TryRecvError::Empty) => {}
                }

                let started = Instant::now();
                let outcome = match simulation.tick() {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!("Tick rejected: {}", e);
                        break;
                    }
                };
                let duration = started.elapsed();

                if duration > interval {
                    warn!("Tick {} took {:?}, longer than the {:?} interval", outcome.tick, duration, interval);
                }

                if let Some(reports) = reports {
                    let _ = reports.send(TickReport { outcome, duration });
                }

                completed += 1;
                if max_ticks.map_or(false, |max| completed >= max) {
                    debug!("Reached the configured {} ticks", completed);
                    break;
                }
            }
        }
    }
}

/// Handle to a simulation ticking on the engine thread.
///
/// Dropping the handle stops the engine the same way [`RunningSimulation::stop`] does.
pub struct RunningSimulation {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<Simulation>>,
}

impl RunningSimulation {
    /// True once the engine thread has exited (e.g. after `max_ticks`).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Halts the cadence and waits for the engine thread to tear down.
    ///
    /// When this returns no further tick runs and the sink has been closed.
    pub fn stop(mut self) -> Result<Simulation, SchedulerError> {
        self.shutdown()
    }

    /// Waits for the engine to stop on its own (`max_ticks`), without signalling it.
    pub fn join(mut self) -> Result<Simulation, SchedulerError> {
        let handle = self.handle.take().ok_or(SchedulerError::EnginePanicked)?;
        let simulation = handle.join().map_err(|_| SchedulerError::EnginePanicked)?;
        self.stop_tx = None;
        Ok(simulation)
    }

    fn shutdown(&mut self) -> Result<Simulation, SchedulerError> {
        if let Some(stop_tx) = self.stop_tx.take() {
            // Full buffer or a gone receiver both mean the engine is already stopping.
            let _ = stop_tx.try_send(());
        }
        let handle = self.handle.take().ok_or(SchedulerError::EnginePanicked)?;
        let simulation = handle.join().map_err(|_| SchedulerError::EnginePanicked)?;
        info!("Engine thread stopped after {} ticks", simulation.ticks());
        Ok(simulation)
    }
}

impl Drop for RunningSimulation {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(e) = self.shutdown() {
                error!("Engine shutdown on drop failed: {}", e);
            }
        }
    }
}
