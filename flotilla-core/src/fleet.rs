use crate::entity::{Coordinate, Vessel, VesselId};
use crate::random::RandomSource;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f64::consts::TAU;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum FleetError {
    #[error("duplicate vessel id {0}")]
    DuplicateId(VesselId),

    #[error("vessel {id} has a non-finite start position ({lon}, {lat})")]
    NonFinitePosition { id: VesselId, lon: f64, lat: f64 },

    #[error("vessel {id} has an invalid speed factor {factor}; expected a finite value > 0")]
    InvalidSpeedFactor { id: VesselId, factor: f64 },

    #[error("vessel {id} has a non-finite heading {heading}")]
    NonFiniteHeading { id: VesselId, heading: f64 },
}

fn default_speed_factor() -> f64 { 1.0 }

/// One roster entry: how a vessel starts out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselSeed {
    pub id: VesselId,
    pub name: String,
    pub position: Coordinate,
    #[serde(default = "default_speed_factor")]
    pub speed_factor: f64,
    /// Pins the starting heading (radians). Drawn from `[0, 2π)` when absent.
    #[serde(default)]
    pub heading: Option<f64>,
}

impl VesselSeed {
    pub fn new(id: u32, name: impl Into<String>, position: Coordinate) -> Self {
        Self {
            id: VesselId(id),
            name: name.into(),
            position,
            speed_factor: default_speed_factor(),
            heading: None,
        }
    }

    pub fn with_speed_factor(mut self, speed_factor: f64) -> Self {
        self.speed_factor = speed_factor;
        self
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    fn validate(&self) -> Result<(), FleetError> {
        if !self.position.is_finite() {
            return Err(FleetError::NonFinitePosition {
                id: self.id,
                lon: self.position.lon,
                lat: self.position.lat,
            });
        }
        if !self.speed_factor.is_finite() || self.speed_factor <= 0.0 {
            return Err(FleetError::InvalidSpeedFactor { id: self.id, factor: self.speed_factor });
        }
        if let Some(heading) = self.heading {
            if !heading.is_finite() {
                return Err(FleetError::NonFiniteHeading { id: self.id, heading });
            }
        }
        Ok(())
    }
}

/// Checks a roster for duplicate ids and non-finite or out-of-range values.
pub fn validate_roster(seeds: &[VesselSeed]) -> Result<(), FleetError> {
    let mut seen = HashSet::with_capacity(seeds.len());
    for seed in seeds {
        seed.validate()?;
        if !seen.insert(seed.id) {
            return Err(FleetError::DuplicateId(seed.id));
        }
    }
    Ok(())
}

/// Owns every vessel in the simulation, in roster order.
#[derive(Debug, Clone, Default)]
pub struct Fleet {
    vessels: Vec<Vessel>,
}

impl Fleet {
    /// Builds the fleet from a roster, validating every seed before any vessel
    /// is created.
    pub fn initialize<R>(seeds: &[VesselSeed], headings: &mut R) -> Result<Self, FleetError>
    where
        R: RandomSource + ?Sized,
    {
        validate_roster(seeds)?;

        let vessels = seeds
            .iter()
            .map(|seed| {
                let heading = seed.heading.unwrap_or_else(|| headings.sample(0.0..TAU));
                debug!("Seeding vessel {} '{}' at {:?}, heading {:.3}", seed.id, seed.name, seed.position, heading);
                Vessel::new(seed.id, seed.name.clone(), seed.position, heading, seed.speed_factor)
            })
            .collect();

        Ok(Self { vessels })
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }

    pub fn get(&self, id: VesselId) -> Option<&Vessel> {
        self.vessels.iter().find(|v| v.id() == id)
    }

    pub fn get_mut(&mut self, id: VesselId) -> Option<&mut Vessel> {
        self.vessels.iter_mut().find(|v| v.id() == id)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Vessel> + '_ {
        self.vessels.iter()
    }

    pub fn iter_mut(&mut self) -> impl ExactSizeIterator<Item = &mut Vessel> + '_ {
        self.vessels.iter_mut()
    }

    /// Visits every vessel in roster order.
    pub fn for_each_mut<F: FnMut(&mut Vessel)>(&mut self, f: F) {
        self.vessels.iter_mut().for_each(f);
    }
}
