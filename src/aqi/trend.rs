use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    #[serde(rename = "up")]
    Rising,
    #[serde(rename = "down")]
    Falling,
    #[serde(rename = "stable")]
    Stable,
}

/// Direction indicator for a pollutant, derived from its recent history.
///
/// `history` holds consecutive sub-index values, oldest first.
pub trait TrendSource: Send + Sync + std::fmt::Debug {
    fn trend(&self, history: &[f64]) -> Trend;
}

/// Least-squares slope over the history; small slopes read as stable.
#[derive(Debug, Clone, Copy)]
pub struct SlopeTrend {
    /// Sub-index change per sample treated as flat.
    pub tolerance: f64,
}

impl Default for SlopeTrend {
    fn default() -> Self {
        Self { tolerance: 0.5 }
    }
}

impl SlopeTrend {
    pub fn slope(history: &[f64]) -> Option<f64> {
        let points: Vec<(f64, f64)> = history
            .iter()
            .enumerate()
            .filter(|(_, value)| value.is_finite())
            .map(|(index, value)| (index as f64, *value))
            .collect();
        if points.len() < 2 {
            return None;
        }

        let n = points.len() as f64;
        let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (x, y) in &points {
            numerator += (x - mean_x) * (y - mean_y);
            denominator += (x - mean_x) * (x - mean_x);
        }
        Some(numerator / denominator)
    }
}

impl TrendSource for SlopeTrend {
    fn trend(&self, history: &[f64]) -> Trend {
        match Self::slope(history) {
            Some(slope) if slope > self.tolerance => Trend::Rising,
            Some(slope) if slope < -self.tolerance => Trend::Falling,
            _ => Trend::Stable,
        }
    }
}

/// Uniformly random indicator that ignores the history.
///
/// Non-deterministic and purely decorative; never feed its output into
/// anything that is computed or tested for exact values.
#[derive(Debug, Default, Clone, Copy)]
pub struct DecorativeTrend;

impl TrendSource for DecorativeTrend {
    fn trend(&self, _history: &[f64]) -> Trend {
        match rand::thread_rng().gen_range(0..3) {
            0 => Trend::Falling,
            1 => Trend::Stable,
            _ => Trend::Rising,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rising_history_is_rising() {
        let trend = SlopeTrend::default().trend(&[40.0, 45.0, 52.0, 60.0]);

        assert_eq!(trend, Trend::Rising);
    }

    #[test]
    fn falling_history_is_falling() {
        let trend = SlopeTrend::default().trend(&[120.0, 110.0, 90.0]);

        assert_eq!(trend, Trend::Falling);
    }

    #[test]
    fn flat_or_short_history_is_stable() {
        let source = SlopeTrend::default();

        assert_eq!(source.trend(&[]), Trend::Stable);
        assert_eq!(source.trend(&[80.0]), Trend::Stable);
        assert_eq!(source.trend(&[80.0, 80.2, 79.9, 80.1]), Trend::Stable);
    }

    #[test]
    fn slope_skips_non_finite_samples() {
        let slope = SlopeTrend::slope(&[10.0, f64::NAN, 30.0]).expect("two finite samples");

        assert!((slope - 10.0).abs() < 1e-9);
    }

    #[test]
    fn decorative_trend_returns_a_valid_variant() {
        let trend = DecorativeTrend.trend(&[1.0, 2.0]);

        assert!(matches!(
            trend,
            Trend::Rising | Trend::Falling | Trend::Stable
        ));
    }
}
