//! Keyword-matching assistant replies.

const RULES: [(&[&str], &str); 3] = [
    (
        &["aqi", "air"],
        "Current AQI shows recent readings; check the dashboard for details.",
    ),
    (
        &["tips", "health"],
        "Avoid prolonged outdoor exertion when AQI is high; use masks if needed.",
    ),
    (
        &["forecast", "prediction"],
        "The predictions chart shows a 7-day forecast of AQI.",
    ),
];

const FALLBACK: &str = "I'm not sure. Try asking about 'AQI', 'health', or 'tips'.";

/// First matching rule wins; matching is case-insensitive substring search.
pub fn reply(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map_or(FALLBACK, |(_, answer)| *answer)
}
