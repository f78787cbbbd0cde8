///! ISS tracker data types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting values outside [-90, 90] / [-180, 180]
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, String> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(format!("latitude {} out of range", latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(format!("longitude {} out of range", longitude));
        }
        Ok(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = if self.latitude >= 0.0 { 'N' } else { 'S' };
        let ew = if self.longitude >= 0.0 { 'E' } else { 'W' };
        write!(
            f,
            "{:.4}°{} {:.4}°{}",
            self.latitude.abs(),
            ns,
            self.longitude.abs(),
            ew
        )
    }
}

/// One entry of the astronauts payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewMember {
    pub name: String,
    pub craft: String,
}

/// Crew names grouped by craft.
///
/// Crafts keep the order in which they first appear in the payload,
/// names keep their input order within a craft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrewRoster {
    crafts: Vec<(String, Vec<String>)>,
}

impl CrewRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `name` to the list of `craft`, creating the list on first use
    pub fn add(&mut self, craft: &str, name: &str) {
        match self.crafts.iter_mut().find(|(c, _)| c == craft) {
            Some((_, names)) => names.push(name.to_string()),
            None => self
                .crafts
                .push((craft.to_string(), vec![name.to_string()])),
        }
    }

    /// Iterate over `(craft, names)` pairs
    pub fn crafts(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.crafts
            .iter()
            .map(|(craft, names)| (craft.as_str(), names.as_slice()))
    }

    pub fn members(&self, craft: &str) -> Option<&[String]> {
        self.crafts
            .iter()
            .find(|(c, _)| c == craft)
            .map(|(_, names)| names.as_slice())
    }

    /// Number of crafts
    pub fn len(&self) -> usize {
        self.crafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crafts.is_empty()
    }

    /// Number of people across all crafts
    pub fn total(&self) -> usize {
        self.crafts.iter().map(|(_, names)| names.len()).sum()
    }
}

impl<'a> FromIterator<&'a CrewMember> for CrewRoster {
    fn from_iter<I: IntoIterator<Item = &'a CrewMember>>(iter: I) -> Self {
        let mut roster = CrewRoster::new();
        for member in iter {
            roster.add(&member.craft, &member.name);
        }
        roster
    }
}

/// Whether the ISS is above water or land
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationClassification {
    Land,
    Ocean,
}

impl fmt::Display for LocationClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationClassification::Land => write!(f, "land"),
            LocationClassification::Ocean => write!(f, "ocean"),
        }
    }
}

/// Classification together with the address it was derived from
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    pub classification: LocationClassification,
    pub address: Option<String>,
}

/// Everything the renderer needs for one image
#[derive(Debug, Clone)]
pub struct Scene {
    pub coordinate: Coordinate,
    pub classification: LocationClassification,
    pub address: Option<String>,
    pub roster: CrewRoster,
    pub captured_on: NaiveDate,
}

/// The written image
#[derive(Debug, Clone)]
pub struct RenderedScene {
    pub path: PathBuf,
    pub classification: LocationClassification,
    pub width: u32,
    pub height: u32,
    pub bytes: u64,
}
