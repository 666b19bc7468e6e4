use crate::aqi::{Concentration, Pollutant};
use crate::error::AppError;
use crate::provider::{PollutantProvider, ProviderPayload};
use crate::state::Location;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;

/// Demonstration data for dashboards without an upstream feed.
#[derive(Debug)]
pub struct SimulatedProvider<R: Rng> {
    rng: R,
}

impl SimulatedProvider<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> SimulatedProvider<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    fn sample(&mut self, pollutant: Pollutant) -> Concentration {
        let value = self.rng.gen_range(range(pollutant));
        match pollutant {
            Pollutant::Pm25 | Pollutant::Pm10 => Concentration::canonical(pollutant, value),
            _ => Concentration::ppb(pollutant, value),
        }
    }
}

// µg/m³ for particulates, ppb for gases
fn range(pollutant: Pollutant) -> Range<f64> {
    match pollutant {
        Pollutant::Pm25 => 5.0..180.0,
        Pollutant::Pm10 => 10.0..300.0,
        Pollutant::O3 => 10.0..120.0,
        Pollutant::No2 => 5.0..150.0,
        Pollutant::So2 => 1.0..60.0,
        Pollutant::Co => 200.0..9000.0,
    }
}

impl<R: Rng> PollutantProvider for SimulatedProvider<R> {
    fn name(&self) -> &str {
        "simulated"
    }

    fn fetch(&mut self, _location: &Location) -> Result<ProviderPayload, AppError> {
        let concentrations = Pollutant::ALL.iter().map(|p| self.sample(*p)).collect();
        Ok(ProviderPayload::Concentrations(concentrations))
    }
}
