use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Stable identifier of a vessel. Assigned by the roster, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VesselId(pub u32);

impl VesselId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for VesselId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Longitude/latitude pair. Serializes as a GeoJSON position `[lon, lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }

    /// Euclidean distance in coordinate units (not metres).
    pub fn distance(&self, other: &Coordinate) -> f64 {
        (self.lon - other.lon).hypot(self.lat - other.lat)
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.lon, c.lat]
    }
}

/// A path point stamped with the tick it was recorded on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub position: Coordinate,
    pub tick: u64,
}

/// How much history a vessel keeps. `None` on both axes means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PathRetention {
    #[serde(default)]
    pub max_points: Option<usize>,
    #[serde(default)]
    pub max_age_ticks: Option<u64>,
}

impl PathRetention {
    pub const UNBOUNDED: PathRetention = PathRetention { max_points: None, max_age_ticks: None };

    pub fn is_unbounded(&self) -> bool {
        self.max_points.is_none() && self.max_age_ticks.is_none()
    }
}

/// A simulated vessel: identity, kinematic state and travelled path.
#[derive(Debug, Clone)]
pub struct Vessel {
    id: VesselId,
    name: String,
    position: Coordinate,
    heading: f64,
    speed_factor: f64,
    path: VecDeque<TrackPoint>,
}

impl Vessel {
    /// Creates a vessel whose path holds exactly its starting position (tick 0).
    pub fn new(id: VesselId, name: impl Into<String>, position: Coordinate, heading: f64, speed_factor: f64) -> Self {
        let mut path = VecDeque::new();
        path.push_back(TrackPoint { position, tick: 0 });
        Self {
            id,
            name: name.into(),
            position,
            heading,
            speed_factor,
            path,
        }
    }

    pub fn id(&self) -> VesselId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Coordinate {
        self.position
    }

    /// Heading in radians, counter-clockwise from east.
    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn set_heading(&mut self, heading: f64) {
        self.heading = heading;
    }

    pub fn speed_factor(&self) -> f64 {
        self.speed_factor
    }

    pub fn path_len(&self) -> usize {
        self.path.len()
    }

    /// Path positions in chronological order.
    pub fn path(&self) -> impl ExactSizeIterator<Item = Coordinate> + '_ {
        self.path.iter().map(|point| point.position)
    }

    pub fn track(&self) -> impl ExactSizeIterator<Item = &TrackPoint> + '_ {
        self.path.iter()
    }

    /// Moves the vessel and records the new position on its path.
    ///
    /// The new position always becomes the last path point; retention only
    /// ever drops from the front.
    pub fn advance_to(&mut self, position: Coordinate, tick: u64, retention: &PathRetention) {
        self.position = position;
        self.path.push_back(TrackPoint { position, tick });
        self.apply_retention(tick, retention);
    }

    fn apply_retention(&mut self, tick: u64, retention: &PathRetention) {
        if let Some(max_points) = retention.max_points {
            let keep = max_points.max(1);
            while self.path.len() > keep {
                self.path.pop_front();
            }
        }

        if let Some(max_age) = retention.max_age_ticks {
            let oldest_allowed = tick.saturating_sub(max_age);
            while self.path.len() > 1 && self.path.front().map_or(false, |p| p.tick < oldest_allowed) {
                self.path.pop_front();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vessel() -> Vessel {
        Vessel::new(VesselId(7), "Seven", Coordinate::new(1.0, 2.0), 0.0, 1.0)
    }

    #[test]
    fn new_vessel_path_holds_seed_position() {
        let v = vessel();
        assert_eq!(v.path_len(), 1);
        assert_eq!(v.path().next(), Some(Coordinate::new(1.0, 2.0)));
    }

    #[test]
    fn advance_appends_and_updates_position() {
        let mut v = vessel();
        v.advance_to(Coordinate::new(1.5, 2.5), 1, &PathRetention::UNBOUNDED);
        v.advance_to(Coordinate::new(2.0, 3.0), 2, &PathRetention::UNBOUNDED);

        assert_eq!(v.position(), Coordinate::new(2.0, 3.0));
        let path: Vec<_> = v.path().collect();
        assert_eq!(path, vec![
            Coordinate::new(1.0, 2.0),
            Coordinate::new(1.5, 2.5),
            Coordinate::new(2.0, 3.0),
        ]);
    }

    #[test]
    fn max_points_drops_oldest_first() {
        let mut v = vessel();
        let retention = PathRetention { max_points: Some(2), max_age_ticks: None };
        for tick in 1..=5 {
            v.advance_to(Coordinate::new(tick as f64, 0.0), tick, &retention);
        }
        let path: Vec<_> = v.path().collect();
        assert_eq!(path, vec![Coordinate::new(4.0, 0.0), Coordinate::new(5.0, 0.0)]);
    }

    #[test]
    fn max_age_keeps_recent_ticks_and_newest_point() {
        let mut v = vessel();
        let retention = PathRetention { max_points: None, max_age_ticks: Some(2) };
        for tick in 1..=6 {
            v.advance_to(Coordinate::new(tick as f64, 0.0), tick, &retention);
        }
        let ticks: Vec<u64> = v.track().map(|p| p.tick).collect();
        assert_eq!(ticks, vec![4, 5, 6]);

        let zero_age = PathRetention { max_points: None, max_age_ticks: Some(0) };
        v.advance_to(Coordinate::new(9.0, 9.0), 7, &zero_age);
        assert_eq!(v.path_len(), 1);
        assert_eq!(v.path().last(), Some(v.position()));
    }

    #[test]
    fn coordinate_serializes_as_position_array() {
        let json = serde_json::to_string(&Coordinate::new(-74.0, 40.5)).unwrap();
        assert_eq!(json, "[-74.0,40.5]");
        let back: Coordinate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Coordinate::new(-74.0, 40.5));
    }
}
