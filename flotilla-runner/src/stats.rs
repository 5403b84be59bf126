use flotilla_simulation::TickReport;
use hdrhistogram::{CreationError, Histogram};
use log::{info, warn};
use std::time::Duration;

/// Tick durations are tracked in microseconds, up to one minute.
const MAX_TRACKED_MICROS: u64 = 60_000_000;

/// Running tally of tick timings and vessel failures.
pub struct TickStats {
    durations: Histogram<u64>,
    ticks: u64,
    failures: u64,
}

impl TickStats {
    pub fn new() -> Result<Self, CreationError> {
        Ok(Self {
            durations: Histogram::new_with_bounds(1, MAX_TRACKED_MICROS, 3)?,
            ticks: 0,
            failures: 0,
        })
    }

    pub fn record(&mut self, report: &TickReport) {
        self.ticks += 1;
        self.failures += report.outcome.failures.len() as u64;

        let micros = (report.duration.as_micros() as u64).clamp(1, MAX_TRACKED_MICROS);
        if let Err(e) = self.durations.record(micros) {
            warn!("Could not record tick duration: {}", e);
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn quantile(&self, q: f64) -> Duration {
        Duration::from_micros(self.durations.value_at_quantile(q))
    }

    pub fn max(&self) -> Duration {
        Duration::from_micros(self.durations.max())
    }

    pub fn log_summary(&self) {
        if self.ticks == 0 {
            info!("No ticks completed");
            return;
        }
        info!(
            "{} ticks, {} vessel failures; tick time p50 {:?}, p99 {:?}, max {:?}",
            self.ticks,
            self.failures,
            self.quantile(0.5),
            self.quantile(0.99),
            self.max()
        );
    }
}
