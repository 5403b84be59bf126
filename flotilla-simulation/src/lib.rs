//! Vessel kinematics, the tick engine and the thread that drives it.

pub mod engine;
pub mod motion;
pub mod scheduler;

pub use engine::{
    EngineError, EngineState, Simulation, SimulationSettings, TickError, TickOutcome, VesselFailure,
};
pub use motion::{MotionStrategy, Move};
pub use scheduler::{RunningSimulation, Scheduler, SchedulerError, TickReport};
