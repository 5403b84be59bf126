use flotilla_core::{Coordinate, RandomSource, Vessel};
use glam::DVec2;

/// How a vessel's next position is derived each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionStrategy {
    /// Nudge the persisted heading by up to `max_turn` radians either way,
    /// then move one step along it.
    HeadingBased { max_turn: f64 },
    /// Ignore heading; offset each axis by an independent fraction of a step.
    IndependentAxisRandom,
}

impl Default for MotionStrategy {
    fn default() -> Self {
        MotionStrategy::HeadingBased { max_turn: 0.1 }
    }
}

/// A planned move that has not yet been applied to the vessel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Move {
    pub heading: f64,
    pub displacement: DVec2,
    pub position: Coordinate,
}

impl Move {
    pub fn is_finite(&self) -> bool {
        self.heading.is_finite() && self.position.is_finite()
    }
}

impl MotionStrategy {
    /// Plans the vessel's next move. `step` is scaled by the vessel's speed factor.
    pub fn plan(&self, vessel: &Vessel, step: f64, rng: &mut dyn RandomSource) -> Move {
        let magnitude = step * vessel.speed_factor();

        let (heading, displacement) = match *self {
            MotionStrategy::HeadingBased { max_turn } => {
                let heading = vessel.heading() + rng.sample(-max_turn..max_turn);
                (heading, DVec2::from_angle(heading) * magnitude)
            }
            MotionStrategy::IndependentAxisRandom => {
                let offset = DVec2::new(rng.sample(0.0..1.0), rng.sample(0.0..1.0));
                (vessel.heading(), offset * magnitude)
            }
        };

        let start = vessel.position();
        Move {
            heading,
            displacement,
            position: Coordinate::new(start.lon + displacement.x, start.lat + displacement.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flotilla_core::{FixedSource, RngSource, VesselId};
    use std::f64::consts::FRAC_PI_2;

    fn vessel(heading: f64, speed_factor: f64) -> Vessel {
        Vessel::new(VesselId(1), "Vessel 1", Coordinate::new(-74.006, 40.713), heading, speed_factor)
    }

    #[test]
    fn zero_perturbation_moves_along_heading() {
        let strategy = MotionStrategy::HeadingBased { max_turn: 0.1 };
        let planned = strategy.plan(&vessel(0.0, 1.0), 0.01, &mut FixedSource(0.0));

        assert_eq!(planned.heading, 0.0);
        assert!((planned.position.lon - (-73.996)).abs() < 1e-9);
        assert!((planned.position.lat - 40.713).abs() < 1e-12);
    }

    #[test]
    fn heading_based_matches_cos_sin_integration() {
        let strategy = MotionStrategy::HeadingBased { max_turn: 0.1 };
        let v = vessel(1.1, 1.0);
        let planned = strategy.plan(&v, 0.01, &mut FixedSource(0.0));

        let expected_lon = v.position().lon + 0.01 * 1.1f64.cos();
        let expected_lat = v.position().lat + 0.01 * 1.1f64.sin();
        assert!((planned.position.lon - expected_lon).abs() < 1e-12);
        assert!((planned.position.lat - expected_lat).abs() < 1e-12);
    }

    #[test]
    fn perturbation_shifts_heading() {
        let strategy = MotionStrategy::HeadingBased { max_turn: 0.1 };
        let planned = strategy.plan(&vessel(FRAC_PI_2, 1.0), 0.01, &mut FixedSource(0.05));
        assert_eq!(planned.heading, FRAC_PI_2 + 0.05);
    }

    #[test]
    fn random_perturbation_stays_within_bound() {
        let strategy = MotionStrategy::HeadingBased { max_turn: 0.1 };
        let mut rng = RngSource::seeded(11);
        let v = vessel(2.0, 1.0);
        for _ in 0..500 {
            let planned = strategy.plan(&v, 0.01, &mut rng);
            let delta = planned.heading - 2.0;
            assert!(delta.abs() <= 0.1 + 1e-12, "delta {delta} out of bound");
            assert!((planned.displacement.length() - 0.01).abs() < 1e-12);
        }
    }

    #[test]
    fn double_speed_doubles_displacement() {
        let strategy = MotionStrategy::HeadingBased { max_turn: 0.1 };
        let slow = strategy.plan(&vessel(0.7, 1.0), 0.01, &mut FixedSource(0.03));
        let fast = strategy.plan(&vessel(0.7, 2.0), 0.01, &mut FixedSource(0.03));
        assert_eq!(fast.displacement, slow.displacement * 2.0);
    }

    #[test]
    fn independent_axis_keeps_heading_and_moves_forward() {
        let strategy = MotionStrategy::IndependentAxisRandom;
        let v = vessel(1.0, 1.0);
        let planned = strategy.plan(&v, 0.01, &mut FixedSource(0.5));

        assert_eq!(planned.heading, 1.0);
        assert_eq!(planned.displacement, DVec2::new(0.005, 0.005));

        let mut rng = RngSource::seeded(5);
        for _ in 0..100 {
            let planned = strategy.plan(&v, 0.01, &mut rng);
            assert!(planned.displacement.x >= 0.0 && planned.displacement.x < 0.01);
            assert!(planned.displacement.y >= 0.0 && planned.displacement.y < 0.01);
        }
    }

    #[test]
    fn overflowing_step_is_flagged_non_finite() {
        let strategy = MotionStrategy::HeadingBased { max_turn: 0.0 };
        let planned = strategy.plan(&vessel(0.0, f64::MAX), f64::MAX, &mut FixedSource(0.0));
        assert!(!planned.is_finite());
    }
}
