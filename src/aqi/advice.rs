//! Canned health recommendations per AQI category.

use crate::aqi::AqiCategory;

pub const SENSITIVE_GROUPS: [&str; 5] = [
    "Children",
    "Elderly",
    "Asthma patients",
    "Heart disease",
    "Active outdoors",
];

const GOOD: [&str; 3] = [
    "Perfect conditions for outdoor activities",
    "All groups can enjoy normal outdoor activities",
    "Windows can remain open for ventilation",
];

const MODERATE: [&str; 3] = [
    "Outdoor activities are generally acceptable",
    "Sensitive individuals should limit prolonged outdoor exertion",
    "People with respiratory conditions should monitor symptoms",
];

const SENSITIVE: [&str; 3] = [
    "Sensitive groups should reduce prolonged outdoor activities",
    "Children and elderly should take breaks during outdoor activities",
    "Consider keeping windows closed",
];

const UNHEALTHY: [&str; 3] = [
    "Limit outdoor activities",
    "Everyone should avoid prolonged outdoor exertion",
    "Keep windows closed and use air purifiers",
];

pub fn advice(category: AqiCategory) -> &'static [&'static str] {
    match category {
        AqiCategory::Good => &GOOD,
        AqiCategory::Moderate => &MODERATE,
        AqiCategory::UnhealthyForSensitiveGroups => &SENSITIVE,
        AqiCategory::Unhealthy | AqiCategory::VeryUnhealthy | AqiCategory::Hazardous => {
            &UNHEALTHY
        }
    }
}
