//! Pollutant concentration to AQI conversion.
//!
//! Everything in this module is pure: sub-index interpolation over the EPA
//! breakpoint tables, aggregation of sub-indices into a single AQI and
//! classification of an AQI into one of six categories. Callers supply raw
//! concentrations (or an already computed AQI) and get values back; nothing
//! here performs I/O or holds state.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod advice;
pub mod breakpoints;
pub mod category;
pub mod trend;

pub use category::{AqiCategory, Classification, Color, classify};

/// Sub-index per pollutant for one observation.
pub type SubIndices = BTreeMap<Pollutant, f64>;

#[derive(Debug, Error, PartialEq)]
pub enum AqiError {
    #[error("unknown pollutant: {0:?}")]
    UnknownPollutant(String),
    #[error("{pollutant} cannot be expressed in {unit}")]
    UnitMismatch { pollutant: Pollutant, unit: Unit },
    #[error("insufficient data: no pollutant sub-index available")]
    InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Pollutant {
    #[serde(rename = "pm2_5")]
    Pm25,
    #[serde(rename = "pm10")]
    Pm10,
    #[serde(rename = "o3")]
    O3,
    #[serde(rename = "no2")]
    No2,
    #[serde(rename = "so2")]
    So2,
    #[serde(rename = "co")]
    Co,
}

impl Pollutant {
    pub const ALL: [Pollutant; 6] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::O3,
        Pollutant::No2,
        Pollutant::So2,
        Pollutant::Co,
    ];

    /// Unit the breakpoint table for this pollutant is defined in.
    pub fn canonical_unit(self) -> Unit {
        match self {
            Pollutant::Pm25 | Pollutant::Pm10 => Unit::MicrogramsPerCubicMeter,
            Pollutant::O3 | Pollutant::No2 | Pollutant::So2 | Pollutant::Co => Unit::Ppm,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Pollutant::Pm25 => "PM2.5",
            Pollutant::Pm10 => "PM10",
            Pollutant::O3 => "O3",
            Pollutant::No2 => "NO2",
            Pollutant::So2 => "SO2",
            Pollutant::Co => "CO",
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Pollutant {
    type Err = AqiError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "pm2.5" | "pm2_5" | "pm25" => Ok(Pollutant::Pm25),
            "pm10" => Ok(Pollutant::Pm10),
            "o3" => Ok(Pollutant::O3),
            "no2" => Ok(Pollutant::No2),
            "so2" => Ok(Pollutant::So2),
            "co" => Ok(Pollutant::Co),
            _ => Err(AqiError::UnknownPollutant(tag.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    #[serde(rename = "ug/m3")]
    MicrogramsPerCubicMeter,
    #[serde(rename = "ppb")]
    Ppb,
    #[serde(rename = "ppm")]
    Ppm,
}

impl Unit {
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::MicrogramsPerCubicMeter => "µg/m³",
            Unit::Ppb => "ppb",
            Unit::Ppm => "ppm",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(unit: &str) -> Result<Self, Self::Err> {
        match unit.trim().to_ascii_lowercase().as_str() {
            "ug/m3" | "µg/m³" | "ugm3" => Ok(Unit::MicrogramsPerCubicMeter),
            "ppb" => Ok(Unit::Ppb),
            "ppm" => Ok(Unit::Ppm),
            other => Err(format!("unknown unit: {other}")),
        }
    }
}

/// A raw pollutant measurement in the unit it was reported in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Concentration {
    pub pollutant: Pollutant,
    pub value: f64,
    pub unit: Unit,
}

impl Concentration {
    pub fn new(pollutant: Pollutant, value: f64, unit: Unit) -> Self {
        Self {
            pollutant,
            value,
            unit,
        }
    }

    /// A concentration already expressed in the pollutant's canonical unit.
    pub fn canonical(pollutant: Pollutant, value: f64) -> Self {
        Self::new(pollutant, value, pollutant.canonical_unit())
    }

    pub fn ppb(pollutant: Pollutant, value: f64) -> Self {
        Self::new(pollutant, value, Unit::Ppb)
    }

    /// Value converted to the unit of the pollutant's breakpoint table.
    pub fn canonical_value(&self) -> Result<f64, AqiError> {
        let target = self.pollutant.canonical_unit();
        match (self.unit, target) {
            (from, to) if from == to => Ok(self.value),
            (Unit::Ppb, Unit::Ppm) => Ok(self.value / 1000.0),
            (unit, _) => Err(AqiError::UnitMismatch {
                pollutant: self.pollutant,
                unit,
            }),
        }
    }

    pub fn sub_index(&self) -> Result<f64, AqiError> {
        Ok(sub_index(self.pollutant, self.canonical_value()?))
    }
}

/// Sub-index of `concentration`, given in the pollutant's canonical unit.
///
/// Defined over the whole real line: values past the last band extrapolate
/// its line upward, values below zero extrapolate the first band backward.
pub fn sub_index(pollutant: Pollutant, concentration: f64) -> f64 {
    breakpoints::table(pollutant).sub_index(concentration)
}

/// Sub-indices for every concentration of one observation.
///
/// A pollutant reported twice keeps its last value.
pub fn sub_indices(concentrations: &[Concentration]) -> Result<SubIndices, AqiError> {
    let mut indices = SubIndices::new();
    for concentration in concentrations {
        indices.insert(concentration.pollutant, concentration.sub_index()?);
    }
    Ok(indices)
}

fn worst(sub_indices: &SubIndices) -> Option<(Pollutant, f64)> {
    sub_indices
        .iter()
        .filter(|(_, value)| !value.is_nan())
        .fold(None, |acc, (&pollutant, &value)| match acc {
            Some((_, best)) if best >= value => acc,
            _ => Some((pollutant, value)),
        })
}

/// Pollutant driving the aggregate. Ties go to the first in [`Pollutant::ALL`] order.
pub fn dominant(sub_indices: &SubIndices) -> Option<Pollutant> {
    worst(sub_indices).map(|(pollutant, _)| pollutant)
}

/// Overall AQI: the highest sub-index, rounded to the nearest integer.
pub fn aggregate(sub_indices: &SubIndices) -> Result<i32, AqiError> {
    let (_, value) = worst(sub_indices).ok_or(AqiError::InsufficientData)?;
    Ok(value.round() as i32)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AqiResult {
    pub sub_indices: SubIndices,
    pub aqi: i32,
    pub dominant: Pollutant,
    pub classification: Classification,
}

/// Sub-indices, aggregate and classification for one observation.
pub fn compute(concentrations: &[Concentration]) -> Result<AqiResult, AqiError> {
    let sub_indices = sub_indices(concentrations)?;
    let (dominant, _) = worst(&sub_indices).ok_or(AqiError::InsufficientData)?;
    let aqi = aggregate(&sub_indices)?;
    Ok(AqiResult {
        classification: classify(aqi),
        sub_indices,
        aqi,
        dominant,
    })
}
