use crate::aqi::{Classification, classify};
use crate::state::Prediction;
use serde::Serialize;
use time::{Date, Duration, Weekday};

pub const FORECAST_DAYS: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    /// ISO date, `YYYY-MM-DD`.
    pub date: String,
    pub day: &'static str,
    pub label: String,
    pub aqi: i32,
    pub is_today: bool,
    pub classification: Classification,
}

/// Today plus six days.
///
/// `predictions` are the upcoming predictions for the location. Each day
/// takes the prediction dated that day; a day without one carries the last
/// prediction forward, and with no prediction at all the current AQI is
/// repeated.
pub fn build_forecast(current_aqi: i32, predictions: &[Prediction], today: Date) -> Vec<ForecastPoint> {
    let mut points = Vec::with_capacity(FORECAST_DAYS);
    points.push(point(today, "Today".to_string(), current_aqi, true));

    let mut carried = predictions
        .iter()
        .filter(|p| p.date <= today)
        .max_by_key(|p| p.date);
    for offset in 1..FORECAST_DAYS {
        let date = today.saturating_add(Duration::days(offset as i64));
        if let Some(prediction) = predictions.iter().find(|p| p.date == date) {
            carried = Some(prediction);
        }
        let aqi = carried.map_or(current_aqi, |p| p.predicted_aqi);
        let label = if offset == 1 {
            "Tomorrow".to_string()
        } else {
            short_weekday(date.weekday()).to_string()
        };
        points.push(point(date, label, aqi, false));
    }

    points
}

/// Mean predicted AQI, or the current AQI when nothing is predicted.
pub fn average_prediction(current_aqi: i32, predictions: &[Prediction]) -> i32 {
    if predictions.is_empty() {
        return current_aqi;
    }
    let sum: i64 = predictions.iter().map(|p| i64::from(p.predicted_aqi)).sum();
    (sum as f64 / predictions.len() as f64).round() as i32
}

fn point(date: Date, label: String, aqi: i32, is_today: bool) -> ForecastPoint {
    ForecastPoint {
        date: date.to_string(),
        day: short_weekday(date.weekday()),
        label,
        aqi,
        is_today,
        classification: classify(aqi),
    }
}

fn short_weekday(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Monday => "Mon",
        Weekday::Tuesday => "Tue",
        Weekday::Wednesday => "Wed",
        Weekday::Thursday => "Thu",
        Weekday::Friday => "Fri",
        Weekday::Saturday => "Sat",
        Weekday::Sunday => "Sun",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aqi::AqiCategory;
    use time::Month;

    // a Monday
    fn today() -> Result<Date, time::error::ComponentRange> {
        Date::from_calendar_date(2026, Month::March, 9)
    }

    fn predictions(today: Date, aqis: &[i32]) -> Vec<Prediction> {
        aqis.iter()
            .enumerate()
            .map(|(offset, aqi)| Prediction {
                location_id: 1,
                date: today.saturating_add(Duration::days(offset as i64)),
                predicted_aqi: *aqi,
                confidence: Some(0.8),
            })
            .collect()
    }

    #[test]
    fn seven_points_with_today_and_tomorrow_labels() -> Result<(), time::error::ComponentRange> {
        let today = today()?;

        let points = build_forecast(90, &predictions(today, &[95, 100, 110, 120, 130, 140, 150]), today);

        assert_eq!(points.len(), FORECAST_DAYS);
        assert_eq!(points[0].label, "Today");
        assert_eq!(points[0].aqi, 90);
        assert!(points[0].is_today);
        assert_eq!(points[0].date, "2026-03-09");
        assert_eq!(points[1].label, "Tomorrow");
        assert_eq!(points[1].aqi, 100);
        assert_eq!(points[2].label, "Wed");
        assert_eq!(points[6].label, "Sun");
        assert_eq!(points[6].aqi, 150);
        assert_eq!(points[6].classification.category, AqiCategory::Unhealthy);
        Ok(())
    }

    #[test]
    fn predictions_starting_tomorrow_line_up_with_their_dates() -> Result<(), time::error::ComponentRange> {
        let today = today()?;
        let upcoming: Vec<Prediction> = predictions(today, &[0, 110, 120, 130, 140, 150, 160])
            .into_iter()
            .skip(1)
            .collect();

        let points = build_forecast(90, &upcoming, today);

        let days: Vec<(&str, i32)> = points.iter().map(|p| (p.date.as_str(), p.aqi)).collect();
        assert_eq!(
            days,
            vec![
                ("2026-03-09", 90),
                ("2026-03-10", 110),
                ("2026-03-11", 120),
                ("2026-03-12", 130),
                ("2026-03-13", 140),
                ("2026-03-14", 150),
                ("2026-03-15", 160),
            ]
        );
        Ok(())
    }

    #[test]
    fn gap_in_predictions_carries_previous_day() -> Result<(), time::error::ComponentRange> {
        let today = today()?;
        let mut upcoming = predictions(today, &[0, 110, 0, 0, 140]);
        upcoming.retain(|p| p.predicted_aqi != 0);

        let points = build_forecast(90, &upcoming, today);

        let aqis: Vec<i32> = points.iter().map(|p| p.aqi).collect();
        assert_eq!(aqis, vec![90, 110, 110, 110, 140, 140, 140]);
        Ok(())
    }

    #[test]
    fn last_prediction_carries_forward() -> Result<(), time::error::ComponentRange> {
        let today = today()?;

        let points = build_forecast(60, &predictions(today, &[70, 80, 120]), today);

        let aqis: Vec<i32> = points.iter().map(|p| p.aqi).collect();
        assert_eq!(aqis, vec![60, 80, 120, 120, 120, 120, 120]);
        Ok(())
    }

    #[test]
    fn single_prediction_fills_every_future_day() -> Result<(), time::error::ComponentRange> {
        let today = today()?;

        let points = build_forecast(60, &predictions(today, &[75]), today);

        assert!(points[1..].iter().all(|p| p.aqi == 75));
        Ok(())
    }

    #[test]
    fn no_predictions_repeats_current_aqi() -> Result<(), time::error::ComponentRange> {
        let today = today()?;

        let points = build_forecast(42, &[], today);

        assert!(points.iter().all(|p| p.aqi == 42));
        assert_eq!(points[3].date, "2026-03-12");
        Ok(())
    }

    #[test]
    fn average_rounds_and_falls_back() -> Result<(), time::error::ComponentRange> {
        let today = today()?;

        assert_eq!(average_prediction(50, &predictions(today, &[100, 101])), 101);
        assert_eq!(average_prediction(50, &[]), 50);
        Ok(())
    }
}
