use serde::Deserialize;
use std::env;
use voyage_shared::{Masked, MultiRoomPolicy};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub record_store: RecordStoreConfig,
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    #[serde(default)]
    pub booking: BookingRules,
    #[serde(default)]
    pub layout: LayoutConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

/// PostgREST endpoint of the record store.
#[derive(Debug, Deserialize, Clone)]
pub struct RecordStoreConfig {
    pub url: String,
    pub api_key: Masked<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingRules {
    #[serde(default)]
    pub multi_room_policy: MultiRoomPolicy,
    /// How long a cabin claim may be held while a reservation is written
    #[serde(default = "default_claim_seconds")]
    pub room_claim_seconds: u64,
    /// Restrict bookable cabins to the sailing's own ship
    #[serde(default)]
    pub ship_scoped_rooms: bool,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            multi_room_policy: MultiRoomPolicy::default(),
            room_claim_seconds: default_claim_seconds(),
            ship_scoped_rooms: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LayoutConfig {
    #[serde(default = "default_page_capacity")]
    pub page_capacity: usize,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_capacity: default_page_capacity(),
            currency_symbol: default_currency_symbol(),
            title: default_title(),
        }
    }
}

fn default_timeout_seconds() -> u64 { 30 }
fn default_claim_seconds() -> u64 { 30 }
fn default_page_capacity() -> usize { 16 }
fn default_currency_symbol() -> String { "৳".to_string() }
fn default_title() -> String { "Cabin Layout".to_string() }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides are optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `VOYAGE__RECORD_STORE__API_KEY=...`
            .add_source(config::Environment::with_prefix("VOYAGE").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn from_toml(raw: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
