use crate::motion::MotionStrategy;
use flotilla_core::{
    Coordinate, FeatureSink, Fleet, LineFeature, PathRetention, PointFeature, RandomSource, SinkError, Vessel,
    VesselId,
};
use log::{debug, info, warn};
use thiserror::Error;

/// Why one vessel's update failed on one tick. Other vessels are unaffected.
#[derive(Error, Debug)]
pub enum TickError {
    #[error("planned position ({lon}, {lat}) is not finite")]
    NonFinitePosition { lon: f64, lat: f64 },

    #[error("point emission failed: {0}")]
    PointSink(#[source] SinkError),

    #[error("line emission failed: {0}")]
    LineSink(#[source] SinkError),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("the simulation has not been started")]
    NotRunning,

    #[error("failed to close the feature sink: {0}")]
    Close(#[from] SinkError),
}

#[derive(Debug)]
pub struct VesselFailure {
    pub vessel: VesselId,
    pub error: TickError,
}

/// What happened during one tick (or the initial publish, reported as tick 0).
#[derive(Debug, Default)]
pub struct TickOutcome {
    pub tick: u64,
    pub moved: usize,
    pub failures: Vec<VesselFailure>,
}

impl TickOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
}

/// Immutable per-run parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSettings {
    pub step: f64,
    pub strategy: MotionStrategy,
    pub retention: PathRetention,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            step: 0.01,
            strategy: MotionStrategy::default(),
            retention: PathRetention::UNBOUNDED,
        }
    }
}

/// The fleet together with everything needed to advance and publish it.
pub struct Simulation {
    fleet: Fleet,
    settings: SimulationSettings,
    rng: Box<dyn RandomSource>,
    sink: Box<dyn FeatureSink>,
    tick: u64,
    state: EngineState,
}

impl Simulation {
    pub fn new(
        fleet: Fleet,
        settings: SimulationSettings,
        rng: Box<dyn RandomSource>,
        sink: Box<dyn FeatureSink>,
    ) -> Self {
        Self {
            fleet,
            settings,
            rng,
            sink,
            tick: 0,
            state: EngineState::Idle,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Number of ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Moves to `Running` and publishes every vessel's current state, so the
    /// renderer has a point (and an empty line) before the first tick.
    pub fn start(&mut self) -> TickOutcome {
        if self.state == EngineState::Running {
            debug!("start() called on a running simulation; ignoring");
            return TickOutcome { tick: self.tick, ..Default::default() };
        }

        info!("Starting simulation with {} vessels at tick {}", self.fleet.len(), self.tick);
        self.state = EngineState::Running;

        let mut outcome = TickOutcome { tick: self.tick, ..Default::default() };
        let Self { fleet, sink, .. } = self;
        for vessel in fleet.iter() {
            publish(&mut **sink, vessel, &mut outcome.failures);
        }
        report_failures(&outcome);
        outcome
    }

    /// Advances every vessel once and republishes its geometry.
    ///
    /// A vessel whose planned position is not finite keeps its previous state
    /// and is not republished; a sink failure is recorded and the remaining
    /// vessels still tick.
    pub fn tick(&mut self) -> Result<TickOutcome, EngineError> {
        if self.state != EngineState::Running {
            return Err(EngineError::NotRunning);
        }

        self.tick += 1;
        let tick = self.tick;
        let mut outcome = TickOutcome { tick, ..Default::default() };

        let Self { fleet, settings, rng, sink, .. } = self;
        for vessel in fleet.iter_mut() {
            let planned = settings.strategy.plan(vessel, settings.step, &mut **rng);
            if !planned.is_finite() {
                outcome.failures.push(VesselFailure {
                    vessel: vessel.id(),
                    error: TickError::NonFinitePosition {
                        lon: planned.position.lon,
                        lat: planned.position.lat,
                    },
                });
                continue;
            }

            vessel.set_heading(planned.heading);
            vessel.advance_to(planned.position, tick, &settings.retention);
            outcome.moved += 1;

            publish(&mut **sink, vessel, &mut outcome.failures);
        }

        debug!("Tick {} moved {}/{} vessels", tick, outcome.moved, fleet.len());
        report_failures(&outcome);
        Ok(outcome)
    }

    /// Returns to `Idle` and closes the sink.
    pub fn stop(&mut self) -> Result<(), EngineError> {
        if self.state == EngineState::Idle {
            return Ok(());
        }
        self.state = EngineState::Idle;
        info!("Stopping simulation after {} ticks", self.tick);
        self.sink.close()?;
        Ok(())
    }

    /// Current position of every vessel, in roster order.
    pub fn positions(&self) -> Vec<(VesselId, Coordinate)> {
        self.fleet.iter().map(|v| (v.id(), v.position())).collect()
    }
}

fn publish(sink: &mut dyn FeatureSink, vessel: &Vessel, failures: &mut Vec<VesselFailure>) {
    if let Err(e) = sink.upsert_point(vessel.id(), &PointFeature::of(vessel)) {
        failures.push(VesselFailure { vessel: vessel.id(), error: TickError::PointSink(e) });
    }
    if let Err(e) = sink.upsert_line(vessel.id(), &LineFeature::of(vessel)) {
        failures.push(VesselFailure { vessel: vessel.id(), error: TickError::LineSink(e) });
    }
}

fn report_failures(outcome: &TickOutcome) {
    for failure in &outcome.failures {
        warn!("Tick {}: vessel {}: {}", outcome.tick, failure.vessel, failure.error);
    }
}
