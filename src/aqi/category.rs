use serde::Serialize;

/// EPA display colors for the six AQI categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Green,
    Yellow,
    Orange,
    Red,
    Purple,
    Maroon,
}

impl Color {
    pub fn hex(self) -> &'static str {
        match self {
            Color::Green => "#00e400",
            Color::Yellow => "#ffff00",
            Color::Orange => "#ff7e00",
            Color::Red => "#ff0000",
            Color::Purple => "#8f3f97",
            Color::Maroon => "#7e0023",
        }
    }
}

/// AQI categories, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AqiCategory {
    #[serde(rename = "Good")]
    Good,
    #[serde(rename = "Moderate")]
    Moderate,
    #[serde(rename = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitiveGroups,
    #[serde(rename = "Unhealthy")]
    Unhealthy,
    #[serde(rename = "Very Unhealthy")]
    VeryUnhealthy,
    #[serde(rename = "Hazardous")]
    Hazardous,
}

impl AqiCategory {
    pub const ALL: [AqiCategory; 6] = [
        AqiCategory::Good,
        AqiCategory::Moderate,
        AqiCategory::UnhealthyForSensitiveGroups,
        AqiCategory::Unhealthy,
        AqiCategory::VeryUnhealthy,
        AqiCategory::Hazardous,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AqiCategory::Good => {
                "Air quality is satisfactory, and air pollution poses little or no risk"
            }
            AqiCategory::Moderate => "Air quality is acceptable for most people",
            AqiCategory::UnhealthyForSensitiveGroups => {
                "Members of sensitive groups may experience health effects"
            }
            AqiCategory::Unhealthy => "Everyone may begin to experience health effects",
            AqiCategory::VeryUnhealthy => {
                "Health alert: everyone may experience more serious health effects"
            }
            AqiCategory::Hazardous => "Health warnings of emergency conditions",
        }
    }

    /// Rank used for color-coding, 0 (Good) to 5 (Hazardous).
    pub fn severity(self) -> u8 {
        self as u8
    }

    pub fn color(self) -> Color {
        match self {
            AqiCategory::Good => Color::Green,
            AqiCategory::Moderate => Color::Yellow,
            AqiCategory::UnhealthyForSensitiveGroups => Color::Orange,
            AqiCategory::Unhealthy => Color::Red,
            AqiCategory::VeryUnhealthy => Color::Purple,
            AqiCategory::Hazardous => Color::Maroon,
        }
    }

    /// Category for `aqi`; negative values fall into Good.
    pub fn from_aqi(aqi: i32) -> Self {
        match aqi {
            i32::MIN..=50 => AqiCategory::Good,
            51..=100 => AqiCategory::Moderate,
            101..=150 => AqiCategory::UnhealthyForSensitiveGroups,
            151..=200 => AqiCategory::Unhealthy,
            201..=300 => AqiCategory::VeryUnhealthy,
            _ => AqiCategory::Hazardous,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub aqi: i32,
    pub category: AqiCategory,
    pub description: &'static str,
    pub severity: u8,
    pub color: &'static str,
}

/// Classification badge for an AQI value, however it was produced.
pub fn classify(aqi: i32) -> Classification {
    let category = AqiCategory::from_aqi(aqi);
    Classification {
        aqi,
        category,
        description: category.description(),
        severity: category.severity(),
        color: category.color().hex(),
    }
}
