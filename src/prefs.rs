//! User preferences persisted in a string key-value store.

use crate::config::DEFAULT_ALERT_THRESHOLD_AQI;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

pub const THEME_KEY: &str = "airaware_theme";
pub const THRESHOLD_KEY: &str = "airaware_notification_threshold";
pub const USER_KEY: &str = "airaware_user";
pub const SAVED_LOCATIONS_KEY: &str = "airaware_saved_locations";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

#[derive(Debug, Default, Clone)]
pub struct MemoryKeyValueStore {
    entries: HashMap<String, String>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Profile {
    /// First letters of the first two name words, uppercased.
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub theme: Theme,
    pub alert_threshold: i32,
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(default)]
    pub saved_locations: Vec<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            alert_threshold: DEFAULT_ALERT_THRESHOLD_AQI,
            profile: None,
            saved_locations: Vec::new(),
        }
    }
}

impl Preferences {
    /// Unreadable entries fall back to their defaults.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let defaults = Self::default();

        let theme = match store.get(THEME_KEY) {
            Some(raw) => Theme::parse(&raw).unwrap_or_else(|| {
                warn!(key = THEME_KEY, value = %raw, "Ignoring unreadable preference");
                defaults.theme
            }),
            None => defaults.theme,
        };

        let alert_threshold = match store.get(THRESHOLD_KEY) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(key = THRESHOLD_KEY, value = %raw, "Ignoring unreadable preference");
                defaults.alert_threshold
            }),
            None => defaults.alert_threshold,
        };

        Self {
            theme,
            alert_threshold,
            profile: load_json(store, USER_KEY),
            saved_locations: load_json(store, SAVED_LOCATIONS_KEY).unwrap_or_default(),
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), AppError> {
        if !(0..=500).contains(&self.alert_threshold) {
            return Err(AppError::Preferences(format!(
                "alert threshold {} outside 0..=500",
                self.alert_threshold
            )));
        }
        store.set(THEME_KEY, self.theme.as_str().to_string());
        store.set(THRESHOLD_KEY, self.alert_threshold.to_string());
        match &self.profile {
            Some(profile) => store.set(USER_KEY, to_json(profile)?),
            None => store.remove(USER_KEY),
        }
        if self.saved_locations.is_empty() {
            store.remove(SAVED_LOCATIONS_KEY);
        } else {
            store.set(SAVED_LOCATIONS_KEY, to_json(&self.saved_locations)?);
        }
        Ok(())
    }
}

fn load_json<T: for<'de> Deserialize<'de>>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, error = %err, "Ignoring unreadable preference");
            None
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value).map_err(|err| AppError::Preferences(err.to_string()))
}
