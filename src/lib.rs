pub mod api;
pub mod aqi;
pub mod chat;
pub mod config;
pub mod error;
pub mod forecast;
pub mod http;
pub mod ml;
pub mod prefs;
pub mod provider;
pub mod refresh;
pub mod state;
pub mod store;
