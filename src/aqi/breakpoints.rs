//! EPA breakpoint tables.
//!
//! Concentration bounds follow the EPA technical assistance document
//! (https://document.airnow.gov/technical-assistance-document-for-the-reporting-of-daily-air-quailty.pdf),
//! written in contiguous form: each band starts where the previous one ends,
//! so every published breakpoint reproduces its index exactly.

use crate::aqi::Pollutant;

const BAND_COUNT: usize = 7;

/// Upper index bound of each band, shared by every pollutant.
const INDEX_UPPER: [f64; BAND_COUNT] = [50.0, 100.0, 150.0, 200.0, 300.0, 400.0, 500.0];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub c_lo: f64,
    pub c_hi: f64,
    pub i_lo: f64,
    pub i_hi: f64,
}

impl Band {
    const fn new(c_lo: f64, c_hi: f64, i_lo: f64, i_hi: f64) -> Self {
        Self {
            c_lo,
            c_hi,
            i_lo,
            i_hi,
        }
    }

    /// Linear interpolation of `concentration` along this band's line.
    pub fn interpolate(&self, concentration: f64) -> f64 {
        ((concentration - self.c_lo) / (self.c_hi - self.c_lo)) * (self.i_hi - self.i_lo)
            + self.i_lo
    }
}

#[derive(Debug)]
pub struct BreakpointTable {
    pub pollutant: Pollutant,
    pub bands: [Band; BAND_COUNT],
}

impl BreakpointTable {
    /// Builds contiguous bands from the upper concentration bound of each band.
    const fn contiguous(pollutant: Pollutant, upper: [f64; BAND_COUNT]) -> Self {
        let mut bands = [Band::new(0.0, 0.0, 0.0, 0.0); BAND_COUNT];
        let mut c_lo = 0.0;
        let mut i_lo = 0.0;
        let mut i = 0;
        while i < BAND_COUNT {
            bands[i] = Band::new(c_lo, upper[i], i_lo, INDEX_UPPER[i]);
            c_lo = upper[i];
            i_lo = INDEX_UPPER[i];
            i += 1;
        }
        Self { pollutant, bands }
    }

    /// First band whose upper bound is at least `concentration`, else the last.
    pub fn band_for(&self, concentration: f64) -> &Band {
        self.bands
            .iter()
            .find(|band| concentration <= band.c_hi)
            .unwrap_or(&self.bands[BAND_COUNT - 1])
    }

    pub fn sub_index(&self, concentration: f64) -> f64 {
        self.band_for(concentration).interpolate(concentration)
    }
}

// µg/m³, 24-hour
pub static PM25: BreakpointTable = BreakpointTable::contiguous(
    Pollutant::Pm25,
    [12.0, 35.4, 55.4, 150.4, 250.4, 350.4, 500.4],
);

// µg/m³, 24-hour
pub static PM10: BreakpointTable = BreakpointTable::contiguous(
    Pollutant::Pm10,
    [54.0, 154.0, 254.0, 354.0, 424.0, 504.0, 604.0],
);

// ppm, 8-hour up to 0.200 then 1-hour
pub static O3: BreakpointTable = BreakpointTable::contiguous(
    Pollutant::O3,
    [0.054, 0.070, 0.085, 0.105, 0.200, 0.404, 0.504],
);

// ppm, 1-hour
pub static NO2: BreakpointTable = BreakpointTable::contiguous(
    Pollutant::No2,
    [0.053, 0.100, 0.360, 0.649, 1.249, 1.649, 2.049],
);

// ppm, 1-hour
pub static SO2: BreakpointTable = BreakpointTable::contiguous(
    Pollutant::So2,
    [0.035, 0.075, 0.185, 0.304, 0.604, 0.804, 1.004],
);

// ppm, 8-hour
pub static CO: BreakpointTable = BreakpointTable::contiguous(
    Pollutant::Co,
    [4.4, 9.4, 12.4, 15.4, 30.4, 40.4, 50.4],
);

pub fn table(pollutant: Pollutant) -> &'static BreakpointTable {
    match pollutant {
        Pollutant::Pm25 => &PM25,
        Pollutant::Pm10 => &PM10,
        Pollutant::O3 => &O3,
        Pollutant::No2 => &NO2,
        Pollutant::So2 => &SO2,
        Pollutant::Co => &CO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_contiguous_and_increasing() {
        for pollutant in Pollutant::ALL {
            let table = table(pollutant);
            assert_eq!(table.pollutant, pollutant);
            for pair in table.bands.windows(2) {
                assert_eq!(pair[0].c_hi, pair[1].c_lo, "{pollutant}");
                assert_eq!(pair[0].i_hi, pair[1].i_lo, "{pollutant}");
            }
            for band in &table.bands {
                assert!(band.c_hi > band.c_lo, "{pollutant}");
                assert!(band.i_hi > band.i_lo, "{pollutant}");
            }
        }
    }

    #[test]
    fn band_edges_reproduce_exactly() {
        for pollutant in Pollutant::ALL {
            let table = table(pollutant);
            for band in &table.bands {
                assert_eq!(table.sub_index(band.c_lo), band.i_lo, "{pollutant} lo");
                assert_eq!(table.sub_index(band.c_hi), band.i_hi, "{pollutant} hi");
            }
        }
    }

    #[test]
    fn boundary_prefers_lower_band() {
        let band = PM25.band_for(12.0);

        assert_eq!(band.c_lo, 0.0);
        assert_eq!(band.c_hi, 12.0);
    }

    #[test]
    fn midpoints_match_airnow_calculator() {
        // PM2.5 23.7 sits halfway through the 12.0..35.4 band
        assert!((PM25.sub_index(23.7) - 75.0).abs() < 1e-9);
        // CO 6.9 ppm is halfway through 4.4..9.4
        assert!((CO.sub_index(6.9) - 75.0).abs() < 1e-9);
        // PM10 204 sits halfway through 154..254
        assert!((PM10.sub_index(204.0) - 125.0).abs() < 1e-9);
    }
}
